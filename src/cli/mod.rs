//! Command line interface for the release pipeline.

mod args;
mod output;

pub use args::Args;
pub use output::OutputManager;

use crate::context::BuildContext;
use crate::error::Result;
use crate::github::GitHubClient;
use crate::pipeline;
use crate::process::StreamingRunner;

/// Main CLI entry point: resolve the context and run the pipeline
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    let output = OutputManager::new(args.verbose, args.quiet);

    let mut ctx = BuildContext::from_env()?;
    if let Some(root) = args.root {
        ctx.root_dir = root;
    }
    if args.skip_deploy {
        ctx.can_release = false;
    }
    let ctx = ctx;

    output.verbose(&format!(
        "resolved: os={} root={} release_build={} can_release={}",
        ctx.os,
        ctx.root_dir.display(),
        ctx.release_build,
        ctx.can_release
    ));

    let runner = StreamingRunner;
    let host = GitHubClient::new(&ctx.github)?;

    pipeline::run(&ctx, &runner, &host, &output).await?;
    Ok(0)
}

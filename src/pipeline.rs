//! The four-stage build/release pipeline.
//!
//! Control flows strictly top to bottom; the first stage failure aborts
//! the whole run. The libsodium install location travels as a stage
//! result, so the build stage cannot start without one.

use crate::cli::OutputManager;
use crate::context::BuildContext;
use crate::error::Result;
use crate::github::{self, DeployOutcome, ReleaseHost};
use crate::process::CommandRunner;
use crate::{artifact, cargo, sodium};

/// Run dependency fetch, build, packaging, and deployment in order
pub async fn run(
    ctx: &BuildContext,
    runner: &dyn CommandRunner,
    host: &dyn ReleaseHost,
    output: &OutputManager,
) -> Result<DeployOutcome> {
    let install = sodium::fetch_and_build(ctx, runner, output).await?;
    cargo::build_and_test(ctx, &install, runner, output)?;
    let asset = artifact::consolidate(ctx, runner, output).await?;
    github::deploy(ctx, &asset, host, output).await
}

//! Main build routine: cargo build and test against static libsodium.

use crate::cli::OutputManager;
use crate::context::BuildContext;
use crate::error::Result;
use crate::process::{CommandRunner, CommandSpec};
use crate::sodium::SodiumInstall;

/// Build and self-test the passthesalt crate
///
/// Points cargo's libsodium-sys link step at the private install via
/// `SODIUM_LIB_DIR`/`SODIUM_STATIC` and runs the build/test pair for the
/// selected mode. Child output streams to stderr as it is produced.
pub fn build_and_test(
    ctx: &BuildContext,
    sodium: &SodiumInstall,
    runner: &dyn CommandRunner,
    output: &OutputManager,
) -> Result<()> {
    output.section("Main Build Routine");

    let commands: &[&[&str]] = if ctx.release_build {
        output.println("Doing a RELEASE build...");
        &[&["build", "--release"], &["test", "--release"]]
    } else {
        output.println("Doing a DEBUG (normal) build...");
        &[&["build"], &["test"]]
    };

    let lib_dir = sodium.lib_dir.display().to_string();
    for args in commands {
        runner.run(
            &CommandSpec::new("cargo")
                .args(args.iter().copied())
                .current_dir(&ctx.root_dir)
                .env("SODIUM_LIB_DIR", &lib_dir)
                .env("SODIUM_STATIC", "yes"),
        )?;
    }

    Ok(())
}

//! Command line argument parsing.
//!
//! The tool is driven almost entirely by the CI environment; the flags
//! here only override what resolution produced.

use clap::Parser;
use std::path::PathBuf;

/// CI build/release pipeline for passthesalt
#[derive(Parser, Debug)]
#[command(
    name = "passthesalt_release",
    version,
    about = "Build passthesalt against static libsodium and publish release assets",
    long_about = "Fetches and compiles the pinned libsodium release, builds and tests \
the passthesalt crate against it, zips the produced binary, and uploads it to the \
GitHub release for the current tag.

Configuration comes from the CI environment (Travis CI or AppVeyor variables); \
outside CI the tool runs a debug build in the current directory."
)]
pub struct Args {
    /// Override the resolved working root
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Never contact the release API, even on an eligible build
    #[arg(long)]
    pub skip_deploy: bool,

    /// Show verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress progress output (errors still print)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

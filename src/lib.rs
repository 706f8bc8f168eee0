//! # passthesalt_release
//!
//! CI build/release pipeline for the passthesalt binary.
//!
//! A single sequential pipeline with four stages, each depending on the
//! success of the previous:
//!
//! 1. **Environment resolution**: CI host variables (Travis CI or
//!    AppVeyor) become an immutable [`BuildContext`].
//! 2. **Dependency fetch**: the pinned libsodium source release is
//!    downloaded, integrity-checked, extracted, and compiled into a
//!    private install prefix.
//! 3. **Main build**: `cargo build`/`cargo test` run against the
//!    static libsodium install.
//! 4. **Artifact publication**: the binary is version-checked, zipped,
//!    and (on permitted release builds) uploaded to the GitHub release
//!    for the tag.
//!
//! External processes and the release API sit behind the
//! [`CommandRunner`] and [`ReleaseHost`] traits so the orchestration
//! logic is testable without a CI worker.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod artifact;
pub mod cargo;
pub mod cli;
pub mod context;
pub mod error;
pub mod github;
pub mod pipeline;
pub mod process;
pub mod sodium;

pub use artifact::ReleaseAsset;
pub use cli::Args;
pub use context::{BuildContext, GitHubConfig, TargetOs};
pub use error::{ReleaseError, Result};
pub use github::{DeployOutcome, GitHubClient, ReleaseHost};
pub use process::{CommandRunner, CommandSpec, StreamingRunner};
pub use sodium::SodiumInstall;

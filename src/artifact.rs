//! Artifact consolidation: locate, verify, and zip the built binary.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cli::OutputManager;
use crate::context::BuildContext;
use crate::error::{ArtifactError, Result};
use crate::process::{CommandRunner, CommandSpec};

/// Version output must open with this literal, e.g. `passthesalt v1.2.3`
const VERSION_PREFIX: &str = "passthesalt ";

/// The packaged artifact, handed to the deployer
#[derive(Debug, Clone)]
pub struct ReleaseAsset {
    /// Binary that went into the archive
    pub binary: PathBuf,
    /// Archive file name, `passthesalt-<tag|debug>-<os>.zip`
    pub file_name: String,
    /// Full path of the written archive
    pub archive: PathBuf,
}

/// Locate the built binary, verify its version, and zip it
pub async fn consolidate(
    ctx: &BuildContext,
    runner: &dyn CommandRunner,
    output: &OutputManager,
) -> Result<ReleaseAsset> {
    output.section("Artifact Consolidation Routine");

    let binary = binary_path(ctx);

    if ctx.release_build {
        output.println("Verifying built binary version and expected release version.");
        let reported = runner.capture_stdout(
            &CommandSpec::new(binary.display().to_string()).arg("--version"),
        )?;
        let expected = ctx.release_version.as_deref().unwrap_or_default();
        verify_reported_version(&reported, expected)?;
    }

    let file_name = archive_name(ctx);

    if !binary.is_file() {
        return Err(ArtifactError::MissingBinary { path: binary }.into());
    }

    output.println(&format!("Zipping binary to {}", file_name));
    let archive = ctx.path(&file_name);
    write_zip(&binary, &archive).await?;

    Ok(ReleaseAsset {
        binary,
        file_name,
        archive,
    })
}

/// Expected binary location for the selected mode and OS
fn binary_path(ctx: &BuildContext) -> PathBuf {
    let mode = if ctx.release_build { "release" } else { "debug" };
    ctx.path("target")
        .join(mode)
        .join(format!("passthesalt{}", ctx.os.exe_suffix()))
}

/// Archive name per mode: tag for releases, `debug` otherwise
pub fn archive_name(ctx: &BuildContext) -> String {
    match ctx.release_version.as_deref().filter(|_| ctx.release_build) {
        Some(version) => format!("passthesalt-{}-{}.zip", version, ctx.os),
        None => format!("passthesalt-debug-{}.zip", ctx.os),
    }
}

/// Check the binary's self-reported version against the release tag
fn verify_reported_version(reported: &str, expected: &str) -> Result<()> {
    let trimmed = reported.trim();
    let binary_version = trimmed
        .strip_prefix(VERSION_PREFIX)
        .ok_or_else(|| ArtifactError::MalformedVersionOutput {
            output: trimmed.to_string(),
        })?
        .trim();

    if binary_version != expected {
        return Err(ArtifactError::VersionDiscrepancy {
            binary_version: binary_version.to_string(),
            expected: expected.to_string(),
        }
        .into());
    }

    Ok(())
}

/// Write a single-entry zip, flattening the binary to its base name
async fn write_zip(binary: &Path, archive: &Path) -> Result<()> {
    let binary = binary.to_path_buf();
    let archive = archive.to_path_buf();

    tokio::task::spawn_blocking(move || -> std::result::Result<(), ArtifactError> {
        let entry_name = binary
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ArtifactError::ZipFailed {
                path: archive.clone(),
                reason: "binary has no UTF-8 base name".to_string(),
            })?
            .to_string();

        let data = std::fs::read(&binary).map_err(|e| ArtifactError::ZipFailed {
            path: archive.clone(),
            reason: e.to_string(),
        })?;

        let file = std::fs::File::create(&archive).map_err(|e| ArtifactError::ZipFailed {
            path: archive.clone(),
            reason: e.to_string(),
        })?;

        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .unix_permissions(0o755);

        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file(entry_name, options)
            .map_err(|e| ArtifactError::ZipFailed {
                path: archive.clone(),
                reason: e.to_string(),
            })?;
        writer.write_all(&data).map_err(|e| ArtifactError::ZipFailed {
            path: archive.clone(),
            reason: e.to_string(),
        })?;
        writer.finish().map_err(|e| ArtifactError::ZipFailed {
            path: archive.clone(),
            reason: e.to_string(),
        })?;

        Ok(())
    })
    .await
    .map_err(std::io::Error::other)??;

    Ok(())
}

//! Release deployment to the GitHub Releases API.
//!
//! Looks up (or creates) the release record for the target tag and
//! uploads the zipped binary as an asset. Builds without release
//! permission skip the whole routine without touching the network.

mod api;

pub use api::{GitHubClient, NewRelease, ReleaseHost, ReleaseRecord, build_upload_url};

use bytes::Bytes;

use crate::artifact::ReleaseAsset;
use crate::cli::OutputManager;
use crate::context::BuildContext;
use crate::error::Result;

/// What the deployer did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployOutcome {
    /// Build not eligible for deployment; no API traffic happened
    Skipped,
    /// Asset uploaded to the tag's release record
    Uploaded,
}

/// Upload the packaged artifact to the repository's releases
///
/// No-op (with a notice) unless the build both may release and is a
/// release build. The eligibility checks precede any use of `host`, so
/// the skip path is guaranteed to perform zero API calls.
pub async fn deploy(
    ctx: &BuildContext,
    asset: &ReleaseAsset,
    host: &dyn ReleaseHost,
    output: &OutputManager,
) -> Result<DeployOutcome> {
    output.section("Release Deployment Routine");

    if !ctx.can_release {
        output.println("This is not a build that can be released. Skipping release deployment.");
        return Ok(DeployOutcome::Skipped);
    }
    if !ctx.release_build {
        output.println("This is not a release build. Skipping release deployment.");
        return Ok(DeployOutcome::Skipped);
    }

    let tag = ctx.release_version.as_deref().unwrap_or_default();
    let release = find_or_create_release(tag, host, output).await?;

    output.println("Reading data for file to upload...");
    let content = tokio::fs::read(&asset.archive).await?;

    output.println("Uploading release asset...");
    host.upload_asset(&release, &asset.file_name, Bytes::from(content))
        .await?;

    output.success("Release asset upload successful.");
    Ok(DeployOutcome::Uploaded)
}

/// Idempotent lookup-or-create for the tag's release record
///
/// Tries the latest-release shortcut first, then scans the full list;
/// only creates a draft when neither finds the tag, so an existing
/// record is never duplicated.
async fn find_or_create_release(
    tag: &str,
    host: &dyn ReleaseHost,
    output: &OutputManager,
) -> Result<ReleaseRecord> {
    output.println("Checking for existing GitHub Release in latest...");
    if let Some(latest) = host.latest_release().await?
        && latest.tag_name == tag
    {
        output.println("Found existing GitHub Release.");
        return Ok(latest);
    }

    output.println("Checking for existing GitHub Release across all releases...");
    if let Some(release) = host
        .list_releases()
        .await?
        .into_iter()
        .find(|release| release.tag_name == tag)
    {
        output.println("Found existing GitHub Release.");
        return Ok(release);
    }

    output.println("Existing GitHub Release not found. Creating new one...");
    host.create_release(&NewRelease::draft_placeholder(tag)).await
}

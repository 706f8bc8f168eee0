//! Pinned libsodium acquisition and build.
//!
//! Downloads the pinned source release into `<root>/libsodium/`, checks
//! its size-bounded SHA-256 digest, extracts it, and drives the upstream
//! configure/make sequence into a private install prefix. Stale files
//! from earlier runs are removed first, so retries are idempotent; the
//! working directory is not safe for concurrent pipeline runs.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

use crate::cli::OutputManager;
use crate::context::BuildContext;
use crate::error::{FetchError, Result};
use crate::process::{CommandRunner, CommandSpec};

const DOWNLOAD_BASE: &str = "https://download.libsodium.org/libsodium/releases";

/// Location of the compiled, installed libsodium
///
/// Returned by the fetch stage and taken as input by the build stage,
/// so a build cannot start without a populated library path.
#[derive(Debug, Clone)]
pub struct SodiumInstall {
    /// Directory containing the static library
    pub lib_dir: PathBuf,
}

/// Download URL for a pinned libsodium version
pub fn tarball_url(version: &str) -> String {
    format!("{}/libsodium-{}.tar.gz", DOWNLOAD_BASE, version)
}

/// Fetch, verify, extract, and build libsodium
pub async fn fetch_and_build(
    ctx: &BuildContext,
    runner: &dyn CommandRunner,
    output: &OutputManager,
) -> Result<SodiumInstall> {
    output.section("Dependency (libsodium) Build");

    let work_dir = ctx.path("libsodium");
    tokio::fs::create_dir_all(&work_dir).await?;

    let tarball = work_dir.join("sodium.tar.gz");
    if tokio::fs::try_exists(&tarball).await? {
        output.println("Removing old libsodium sources...");
        tokio::fs::remove_file(&tarball).await?;
    }

    output.progress("Retrieving libsodium sources...");
    download(&tarball_url(ctx.sodium.version), &tarball).await?;

    output.progress("Checking libsodium source integrity...");
    verify_integrity(&tarball, ctx.sodium.tar_expected_size, ctx.sodium.tar_sha256).await?;

    let source_dir = work_dir.join(format!("libsodium-{}", ctx.sodium.version));
    if tokio::fs::try_exists(&source_dir).await? {
        output.println("Removing old libsodium extracted sources...");
        tokio::fs::remove_dir_all(&source_dir).await?;
    }

    output.progress("Extracting libsodium sources...");
    extract_tarball(&tarball, &work_dir).await?;

    output.progress("Beginning libsodium build...");
    build_from_source(&source_dir, &work_dir, runner)?;

    Ok(SodiumInstall {
        lib_dir: install_lib_dir(&work_dir),
    })
}

/// Install prefix mirrors a standard Unix layout under the work dir
fn install_lib_dir(work_dir: &Path) -> PathBuf {
    work_dir.join("usr").join("local").join("lib")
}

async fn download(url: &str, dest: &Path) -> Result<()> {
    log::info!("downloading {}", url);

    let response = reqwest::get(url).await?;
    if !response.status().is_success() {
        return Err(FetchError::DownloadFailed {
            url: url.to_string(),
            status: response.status().as_u16(),
        }
        .into());
    }

    let bytes = response.bytes().await?;
    tokio::fs::write(dest, &bytes).await?;
    Ok(())
}

/// Hash at most `expected_size + 1` bytes of the saved tarball
///
/// A truncated or padded download hashes to a different digest, so the
/// size check rides along with the content check.
async fn verify_integrity(path: &Path, expected_size: u64, expected_sha256: &str) -> Result<()> {
    let file = tokio::fs::File::open(path).await?;
    let mut data = Vec::with_capacity(expected_size as usize + 1);
    file.take(expected_size + 1).read_to_end(&mut data).await?;

    let digest = tokio::task::spawn_blocking(move || {
        let mut hasher = Sha256::new();
        hasher.update(&data);
        hex::encode(hasher.finalize())
    })
    .await
    .map_err(std::io::Error::other)?;

    if digest.eq_ignore_ascii_case(expected_sha256) {
        Ok(())
    } else {
        Err(FetchError::IntegrityMismatch {
            name: "libsodium".to_string(),
            expected: expected_sha256.to_string(),
            actual: digest,
        }
        .into())
    }
}

async fn extract_tarball(archive: &Path, dest: &Path) -> Result<()> {
    let archive = archive.to_path_buf();
    let dest = dest.to_path_buf();

    tokio::task::spawn_blocking(move || -> std::result::Result<(), FetchError> {
        let file = std::fs::File::open(&archive).map_err(|e| FetchError::ExtractionFailed {
            archive: archive.clone(),
            reason: e.to_string(),
        })?;
        let mut tar = tar::Archive::new(flate2::read::GzDecoder::new(file));
        tar.unpack(&dest).map_err(|e| FetchError::ExtractionFailed {
            archive: archive.clone(),
            reason: e.to_string(),
        })?;
        Ok(())
    })
    .await
    .map_err(std::io::Error::other)??;

    Ok(())
}

/// Drive the upstream configure/make/check/install sequence
fn build_from_source(
    source_dir: &Path,
    destdir: &Path,
    runner: &dyn CommandRunner,
) -> Result<()> {
    runner.run(&CommandSpec::new("./configure").current_dir(source_dir))?;
    runner.run(&CommandSpec::new("make").current_dir(source_dir))?;
    runner.run(&CommandSpec::new("make").arg("check").current_dir(source_dir))?;
    runner.run(
        &CommandSpec::new("make")
            .arg(format!("DESTDIR={}", destdir.display()))
            .arg("install")
            .current_dir(source_dir),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::RecordingRunner;

    #[test]
    fn tarball_url_pins_version() {
        assert_eq!(
            tarball_url("1.0.10"),
            "https://download.libsodium.org/libsodium/releases/libsodium-1.0.10.tar.gz"
        );
    }

    #[test]
    fn install_lib_dir_mirrors_unix_layout() {
        let lib = install_lib_dir(Path::new("/root/libsodium"));
        assert_eq!(lib, PathBuf::from("/root/libsodium/usr/local/lib"));
    }

    #[test]
    fn build_sequence_is_configure_make_check_install() {
        let runner = RecordingRunner::default();
        build_from_source(Path::new("/src/libsodium-1.0.10"), Path::new("/src"), &runner).unwrap();
        assert_eq!(
            runner.displays(),
            vec![
                "./configure",
                "make",
                "make check",
                "make DESTDIR=/src install",
            ]
        );
        for call in runner.calls.borrow().iter() {
            assert_eq!(call.cwd.as_deref(), Some(Path::new("/src/libsodium-1.0.10")));
        }
    }

    #[test]
    fn build_failure_carries_command_and_status() {
        let runner = RecordingRunner::default();
        *runner.fail_prefix.borrow_mut() = Some(("make check".to_string(), 2));
        let err = build_from_source(Path::new("/s"), Path::new("/d"), &runner).unwrap_err();
        assert!(err.to_string().contains("make check"));
        assert!(err.to_string().contains('2'));
    }

    #[tokio::test]
    async fn integrity_accepts_pinned_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sodium.tar.gz");
        let data = b"not really a tarball";
        tokio::fs::write(&path, data).await.unwrap();

        let digest = hex::encode(Sha256::digest(data));
        verify_integrity(&path, data.len() as u64, &digest)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn integrity_rejects_wrong_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sodium.tar.gz");
        tokio::fs::write(&path, b"tampered bytes").await.unwrap();

        let err = verify_integrity(&path, 14, &"0".repeat(64)).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::ReleaseError::Fetch(FetchError::IntegrityMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn integrity_rejects_oversized_file() {
        // Only expected_size + 1 bytes are hashed; an appended byte must
        // change the digest even though the prefix matches.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sodium.tar.gz");
        let good = b"expected content";
        let digest = hex::encode(Sha256::digest(good));

        let mut padded = good.to_vec();
        padded.push(b'!');
        tokio::fs::write(&path, &padded).await.unwrap();

        let err = verify_integrity(&path, good.len() as u64, &digest)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::ReleaseError::Fetch(FetchError::IntegrityMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn extracts_gzipped_tar() {
        use flate2::{Compression, write::GzEncoder};
        use std::io::Write as _;

        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("sodium.tar.gz");

        let mut tar_bytes = Vec::new();
        {
            let mut builder = tar::Builder::new(&mut tar_bytes);
            let mut header = tar::Header::new_gnu();
            header.set_path("libsodium-1.0.10/configure").unwrap();
            header.set_size(2);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append(&header, &b"#!"[..]).unwrap();
            builder.finish().unwrap();
        }
        let mut gz = GzEncoder::new(Vec::new(), Compression::default());
        gz.write_all(&tar_bytes).unwrap();
        std::fs::write(&archive, gz.finish().unwrap()).unwrap();

        extract_tarball(&archive, dir.path()).await.unwrap();
        assert!(dir.path().join("libsodium-1.0.10/configure").is_file());
    }
}

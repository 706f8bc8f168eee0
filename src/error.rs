//! Error types for the build/release pipeline.
//!
//! Every stage-local failure maps to a category-specific error enum so
//! callers can discriminate without string matching. All categories fold
//! into [`ReleaseError`] for propagation to the top level.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all pipeline operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Environment/configuration resolution errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Dependency download and integrity errors
    #[error("Dependency fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// External process invocation errors
    #[error("Subprocess error: {0}")]
    Subprocess(#[from] SubprocessError),

    /// Artifact packaging errors
    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// GitHub Releases API errors
    #[error("GitHub API error: {0}")]
    Api(#[from] ApiError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Environment resolution errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// CI host reported an OS this tool does not build for
    #[error("Unrecognized operating system identifier: '{value}'")]
    UnrecognizedOs {
        /// The offending identifier value
        value: String,
    },

    /// Local fallback could not map the host OS
    #[error("Unsupported host operating system: '{os}'")]
    UnsupportedHost {
        /// Value of std::env::consts::OS
        os: String,
    },

    /// Release deployment requested without a usable credential
    #[error(
        "Release deployment requires a GitHub API token. Set SEC_GH_API_KEY in the CI environment."
    )]
    MissingToken,
}

/// Dependency fetch errors
#[derive(Error, Debug)]
pub enum FetchError {
    /// Downloaded tarball does not hash to the pinned digest
    #[error("Integrity verification for {name} sources failed: expected {expected}, got {actual}")]
    IntegrityMismatch {
        /// Dependency name
        name: String,
        /// Pinned SHA-256 hex digest
        expected: String,
        /// Observed SHA-256 hex digest
        actual: String,
    },

    /// Server answered the download request with a non-success status
    #[error("Download of {url} failed with HTTP status {status}")]
    DownloadFailed {
        /// Source URL
        url: String,
        /// Observed HTTP status code
        status: u16,
    },

    /// Tarball could not be unpacked
    #[error("Failed to extract {archive}: {reason}")]
    ExtractionFailed {
        /// Archive path
        archive: PathBuf,
        /// Reason for the error
        reason: String,
    },
}

/// External process errors
#[derive(Error, Debug)]
pub enum SubprocessError {
    /// Child exited with a non-zero status
    #[error("Invocation of '{command}' exited with non-zero status {status}")]
    NonZeroExit {
        /// The command line that failed
        command: String,
        /// Exit status code (-1 when terminated by signal)
        status: i32,
    },

    /// Child could not be spawned at all
    #[error("Failed to spawn '{command}': {reason}")]
    SpawnFailed {
        /// The command line that failed
        command: String,
        /// Reason for the error
        reason: String,
    },

    /// Child stdout was not valid UTF-8 where text was expected
    #[error("Output of '{command}' was not valid UTF-8")]
    InvalidOutput {
        /// The command line that produced the output
        command: String,
    },
}

/// Artifact packaging errors
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// Expected binary is not on disk
    #[error("Failed to find binary: {path}")]
    MissingBinary {
        /// Path where the binary was expected
        path: PathBuf,
    },

    /// Binary's --version output did not carry the expected prefix
    #[error("Unexpected output from release binary: '{output}'")]
    MalformedVersionOutput {
        /// What the binary printed
        output: String,
    },

    /// Binary reports a version other than the release tag
    #[error(
        "Discrepancy between version from binary ({binary_version}) and expected version for release ({expected})"
    )]
    VersionDiscrepancy {
        /// Version the binary printed
        binary_version: String,
        /// Tag the release is being cut for
        expected: String,
    },

    /// Zip archive could not be written
    #[error("Failed to write archive {path}: {reason}")]
    ZipFailed {
        /// Target archive path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },
}

/// GitHub Releases API errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// API answered with a status the tool does not handle
    #[error("Unexpected HTTP response from GitHub API: {status} for {context}")]
    UnexpectedStatus {
        /// Observed HTTP status code
        status: u16,
        /// Which request was being made
        context: String,
    },

    /// Response JSON is missing a field the tool relies on
    #[error("Unexpected JSON response from GitHub API: {reason}")]
    MalformedResponse {
        /// Reason for the error
        reason: String,
    },

    /// Asset upload did not come back 201 Created
    #[error("Failed to upload release asset. GitHub API responded: {status}")]
    UploadRejected {
        /// Observed HTTP status code
        status: u16,
    },

    /// Transport failed mid-upload
    #[error(
        "Failed to upload release asset. Either a connection problem was encountered or the GitHub API rejected it (possibly duplicate filename?)."
    )]
    UploadInterrupted,
}

impl ReleaseError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReleaseError::Config(ConfigError::MissingToken) => vec![
                "Add SEC_GH_API_KEY as an encrypted CI variable".to_string(),
                "Verify the token has the repo scope for release uploads".to_string(),
            ],
            ReleaseError::Fetch(FetchError::IntegrityMismatch { name, .. }) => vec![
                format!("Delete the {} working directory and re-run", name),
                "Verify the pinned version and digest against the upstream release page"
                    .to_string(),
            ],
            ReleaseError::Subprocess(SubprocessError::SpawnFailed { command, .. }) => {
                vec![format!("Ensure '{}' is installed and on PATH", command)]
            }
            ReleaseError::Api(ApiError::UploadInterrupted) => vec![
                "Check whether an asset with the same filename already exists on the release"
                    .to_string(),
                "Re-run the pipeline once connectivity is restored".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_rejected_message_carries_status() {
        let err = ReleaseError::Api(ApiError::UploadRejected { status: 422 });
        assert!(err.to_string().contains("422"));
    }

    #[test]
    fn non_zero_exit_message_names_command() {
        let err = SubprocessError::NonZeroExit {
            command: "make check".to_string(),
            status: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("make check"));
        assert!(msg.contains('2'));
    }
}

//! Build environment resolution.
//!
//! Inspects the environment variables set by the supported CI hosts
//! (Travis CI, AppVeyor) and produces an immutable [`BuildContext`] that
//! the rest of the pipeline borrows. No filesystem or network work
//! happens here.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// Snapshot of process environment variables
pub type EnvVars = BTreeMap<String, String>;

/// Target operating system for the build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOs {
    /// Linux (Travis CI workers, local fallback)
    Linux,
    /// macOS (Travis CI `osx` workers)
    MacOs,
    /// Windows (AppVeyor workers)
    Windows,
}

impl TargetOs {
    /// Identifier used in artifact names
    pub fn as_str(self) -> &'static str {
        match self {
            TargetOs::Linux => "linux",
            TargetOs::MacOs => "macos",
            TargetOs::Windows => "windows",
        }
    }

    /// Executable suffix for this OS
    pub fn exe_suffix(self) -> &'static str {
        match self {
            TargetOs::Windows => ".exe",
            _ => "",
        }
    }
}

impl std::fmt::Display for TargetOs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// GitHub repository coordinates and release credential
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Release API token, absent on non-release builds
    pub token: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            owner: "icasdri".to_string(),
            repo: "passthesalt".to_string(),
            token: None,
        }
    }
}

/// Pinned libsodium release the pipeline builds against
#[derive(Debug, Clone)]
pub struct SodiumPin {
    /// Upstream version string
    pub version: &'static str,
    /// Exact tarball size in bytes
    pub tar_expected_size: u64,
    /// SHA-256 hex digest of the tarball
    pub tar_sha256: &'static str,
}

/// The libsodium release passthesalt links against
pub const SODIUM_PIN: SodiumPin = SodiumPin {
    version: "1.0.10",
    tar_expected_size: 1_827_211,
    tar_sha256: "71b786a96dd03693672b0ca3eb77f4fb08430df307051c0d45df5353d22bc4be",
};

/// Resolved build configuration
///
/// Constructed once at startup and threaded by reference into each stage.
/// Immutable thereafter; stage results (such as the libsodium install
/// location) travel as explicit return values instead of mutating this.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Target operating system
    pub os: TargetOs,
    /// Root working directory of the checkout
    pub root_dir: PathBuf,
    /// Whether this build was triggered by a tag
    pub release_build: bool,
    /// The tag being released, when `release_build` is set
    pub release_version: Option<String>,
    /// Whether this worker is permitted to upload release assets
    pub can_release: bool,
    /// Release API coordinates
    pub github: GitHubConfig,
    /// Pinned native dependency
    pub sodium: SodiumPin,
}

impl BuildContext {
    /// Resolve the context from the live process environment
    pub fn from_env() -> Result<Self> {
        let vars: EnvVars = std::env::vars().collect();
        let cwd = std::env::current_dir()?;
        Self::resolve(&vars, cwd)
    }

    /// Resolve the context from an environment snapshot
    ///
    /// Pure with respect to the snapshot, which keeps host-convention
    /// branching unit-testable with synthetic environments.
    pub fn resolve(vars: &EnvVars, cwd: PathBuf) -> Result<Self> {
        if vars.contains_key("TRAVIS") {
            Self::resolve_travis(vars, cwd)
        } else if vars.contains_key("APPVEYOR") {
            Self::resolve_appveyor(vars, cwd)
        } else {
            Self::resolve_local(cwd)
        }
    }

    fn resolve_travis(vars: &EnvVars, cwd: PathBuf) -> Result<Self> {
        let os = match vars.get("TRAVIS_OS_NAME").map(String::as_str) {
            None | Some("linux") => TargetOs::Linux,
            Some("osx") => TargetOs::MacOs,
            Some(other) => {
                return Err(ConfigError::UnrecognizedOs {
                    value: other.to_string(),
                }
                .into());
            }
        };

        let root_dir = vars
            .get("TRAVIS_BUILD_DIR")
            .map(PathBuf::from)
            .unwrap_or(cwd);

        let release_version = vars
            .get("TRAVIS_TAG")
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .map(str::to_string);

        Ok(Self {
            os,
            root_dir,
            release_build: release_version.is_some(),
            release_version,
            can_release: parse_flag(vars.get("CAN_RELEASE")),
            github: GitHubConfig {
                token: vars.get("SEC_GH_API_KEY").cloned(),
                ..GitHubConfig::default()
            },
            sodium: SODIUM_PIN,
        })
    }

    fn resolve_appveyor(vars: &EnvVars, cwd: PathBuf) -> Result<Self> {
        let root_dir = vars
            .get("APPVEYOR_BUILD_FOLDER")
            .map(PathBuf::from)
            .unwrap_or(cwd);

        let tagged = vars.get("APPVEYOR_REPO_TAG").map(String::as_str) == Some("true");
        let release_version = vars
            .get("APPVEYOR_REPO_TAG_NAME")
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .map(str::to_string);

        Ok(Self {
            os: TargetOs::Windows,
            root_dir,
            release_build: tagged && release_version.is_some(),
            release_version,
            can_release: parse_flag(vars.get("CAN_RELEASE")),
            github: GitHubConfig {
                token: vars.get("SEC_GH_API_KEY").cloned(),
                ..GitHubConfig::default()
            },
            sodium: SODIUM_PIN,
        })
    }

    /// Manual/local invocation: debug build in the current directory
    fn resolve_local(cwd: PathBuf) -> Result<Self> {
        let os = match std::env::consts::OS {
            "linux" => TargetOs::Linux,
            "macos" => TargetOs::MacOs,
            "windows" => TargetOs::Windows,
            other => {
                return Err(ConfigError::UnsupportedHost {
                    os: other.to_string(),
                }
                .into());
            }
        };

        Ok(Self {
            os,
            root_dir: cwd,
            release_build: false,
            release_version: None,
            can_release: false,
            github: GitHubConfig::default(),
            sodium: SODIUM_PIN,
        })
    }

    /// Resolve a path relative to the working root
    pub fn path(&self, target: impl AsRef<Path>) -> PathBuf {
        self.root_dir.join(target)
    }
}

/// Permission flags must be opted into explicitly. `"false"` in the CI
/// config denies, unlike a bare is-the-variable-set check.
fn parse_flag(value: Option<&String>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("true") | Some("1") | Some("yes")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> EnvVars {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn travis_linux_release() {
        let vars = env(&[
            ("TRAVIS", "true"),
            ("TRAVIS_OS_NAME", "linux"),
            ("TRAVIS_BUILD_DIR", "/home/travis/build/icasdri/passthesalt"),
            ("TRAVIS_TAG", "v1.2.3"),
            ("CAN_RELEASE", "true"),
            ("SEC_GH_API_KEY", "tok123"),
        ]);
        let ctx = BuildContext::resolve(&vars, PathBuf::from("/tmp")).unwrap();
        assert_eq!(ctx.os, TargetOs::Linux);
        assert_eq!(
            ctx.root_dir,
            PathBuf::from("/home/travis/build/icasdri/passthesalt")
        );
        assert!(ctx.release_build);
        assert_eq!(ctx.release_version.as_deref(), Some("v1.2.3"));
        assert!(ctx.can_release);
        assert_eq!(ctx.github.token.as_deref(), Some("tok123"));
    }

    #[test]
    fn travis_osx_maps_to_macos() {
        let vars = env(&[("TRAVIS", "true"), ("TRAVIS_OS_NAME", "osx")]);
        let ctx = BuildContext::resolve(&vars, PathBuf::from("/tmp")).unwrap();
        assert_eq!(ctx.os, TargetOs::MacOs);
    }

    #[test]
    fn travis_unknown_os_is_config_error() {
        let vars = env(&[("TRAVIS", "true"), ("TRAVIS_OS_NAME", "solaris")]);
        let err = BuildContext::resolve(&vars, PathBuf::from("/tmp")).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ReleaseError::Config(ConfigError::UnrecognizedOs { ref value })
                if value == "solaris"
        ));
    }

    #[test]
    fn travis_blank_tag_is_not_a_release() {
        let vars = env(&[("TRAVIS", "true"), ("TRAVIS_TAG", "   ")]);
        let ctx = BuildContext::resolve(&vars, PathBuf::from("/tmp")).unwrap();
        assert!(!ctx.release_build);
        assert_eq!(ctx.release_version, None);
    }

    #[test]
    fn travis_os_name_defaults_to_linux() {
        let vars = env(&[("TRAVIS", "true")]);
        let ctx = BuildContext::resolve(&vars, PathBuf::from("/tmp")).unwrap();
        assert_eq!(ctx.os, TargetOs::Linux);
    }

    #[test]
    fn appveyor_tagged_release() {
        let vars = env(&[
            ("APPVEYOR", "True"),
            ("APPVEYOR_BUILD_FOLDER", "C:\\projects\\passthesalt"),
            ("APPVEYOR_REPO_TAG", "true"),
            ("APPVEYOR_REPO_TAG_NAME", "v0.3.0"),
        ]);
        let ctx = BuildContext::resolve(&vars, PathBuf::from("/tmp")).unwrap();
        assert_eq!(ctx.os, TargetOs::Windows);
        assert!(ctx.release_build);
        assert_eq!(ctx.release_version.as_deref(), Some("v0.3.0"));
        assert!(!ctx.can_release);
    }

    #[test]
    fn appveyor_untagged_build() {
        let vars = env(&[("APPVEYOR", "True"), ("APPVEYOR_REPO_TAG", "false")]);
        let ctx = BuildContext::resolve(&vars, PathBuf::from("/tmp")).unwrap();
        assert!(!ctx.release_build);
    }

    #[test]
    fn local_fallback_is_non_release_in_cwd() {
        let ctx = BuildContext::resolve(&env(&[]), PathBuf::from("/work")).unwrap();
        assert_eq!(ctx.root_dir, PathBuf::from("/work"));
        assert!(!ctx.release_build);
        assert!(!ctx.can_release);
        assert_eq!(ctx.github.token, None);
    }

    #[test]
    fn can_release_rejects_false_string() {
        let vars = env(&[("TRAVIS", "true"), ("CAN_RELEASE", "false")]);
        let ctx = BuildContext::resolve(&vars, PathBuf::from("/tmp")).unwrap();
        assert!(!ctx.can_release);
    }

    #[test]
    fn can_release_accepts_yes_and_one() {
        for v in ["yes", "1", "TRUE"] {
            let vars = env(&[("TRAVIS", "true"), ("CAN_RELEASE", v)]);
            let ctx = BuildContext::resolve(&vars, PathBuf::from("/tmp")).unwrap();
            assert!(ctx.can_release, "value {:?} should grant permission", v);
        }
    }

    #[test]
    fn exe_suffix_only_on_windows() {
        assert_eq!(TargetOs::Windows.exe_suffix(), ".exe");
        assert_eq!(TargetOs::Linux.exe_suffix(), "");
        assert_eq!(TargetOs::MacOs.exe_suffix(), "");
    }
}

//! GitHub Releases API client.
//!
//! Thin reqwest wrapper over the four endpoints the deployer needs:
//! latest release, release list, release creation, and asset upload.
//! Authentication uses the `access_token` query parameter throughout.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::context::GitHubConfig;
use crate::error::{ApiError, ConfigError, Result};

const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("passthesalt_release/", env!("CARGO_PKG_VERSION"));

/// A release record as returned by the API
///
/// Never owned by this tool; queried or created, then mined for its
/// upload endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseRecord {
    /// Release ID
    #[serde(default)]
    pub id: u64,
    /// Tag the release is attached to
    #[serde(default)]
    pub tag_name: String,
    /// Whether the release is still a maintainer-only draft
    #[serde(default)]
    pub draft: bool,
    /// Templated asset upload URL
    #[serde(default)]
    pub upload_url: Option<String>,
    /// Display title
    #[serde(default)]
    pub name: Option<String>,
}

/// Body for release creation
#[derive(Debug, Clone, Serialize)]
pub struct NewRelease {
    /// Tag to attach the release to
    pub tag_name: String,
    /// Display title
    pub name: String,
    /// Release notes body
    pub body: String,
    /// Create as draft
    pub draft: bool,
}

impl NewRelease {
    /// The fixed placeholder draft created while CI builds are in flight
    pub fn draft_placeholder(tag: &str) -> Self {
        Self {
            tag_name: tag.to_string(),
            name: "Pending Release".to_string(),
            body: "Please wait while release builds finish and artifacts are uploaded. \
                   This release will be available soon."
                .to_string(),
            draft: true,
        }
    }
}

/// The release-host operations the deployer depends on
///
/// Production talks to GitHub through [`GitHubClient`]; tests inject a
/// recording fake.
#[async_trait]
pub trait ReleaseHost {
    /// The latest published release, `None` when the API answers 404
    async fn latest_release(&self) -> Result<Option<ReleaseRecord>>;

    /// All release records for the repository
    async fn list_releases(&self) -> Result<Vec<ReleaseRecord>>;

    /// Create a release record
    async fn create_release(&self, release: &NewRelease) -> Result<ReleaseRecord>;

    /// Upload an asset to the record's upload endpoint; 201 is success
    async fn upload_asset(
        &self,
        release: &ReleaseRecord,
        file_name: &str,
        content: Bytes,
    ) -> Result<()>;
}

/// Production release host backed by the GitHub REST API
#[derive(Debug)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    owner: String,
    repo: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Build a client for the configured repository
    ///
    /// Succeeds without a token; individual calls fail with a
    /// configuration error when one is required, so ineligible builds
    /// never need a credential.
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            api_base: DEFAULT_API_BASE.to_string(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            token: config.token.clone(),
        })
    }

    fn token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| ConfigError::MissingToken.into())
    }

    fn repo_url(&self, rest: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.owner, self.repo, rest
        )
    }
}

#[async_trait]
impl ReleaseHost for GitHubClient {
    async fn latest_release(&self) -> Result<Option<ReleaseRecord>> {
        let response = self
            .http
            .get(self.repo_url("releases/latest"))
            .query(&[("access_token", self.token()?)])
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(ApiError::UnexpectedStatus {
                status: status.as_u16(),
                context: "releases/latest".to_string(),
            }
            .into()),
        }
    }

    async fn list_releases(&self) -> Result<Vec<ReleaseRecord>> {
        let response = self
            .http
            .get(self.repo_url("releases"))
            .query(&[("access_token", self.token()?)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::UnexpectedStatus {
                status: response.status().as_u16(),
                context: "releases".to_string(),
            }
            .into());
        }

        Ok(response.json().await?)
    }

    async fn create_release(&self, release: &NewRelease) -> Result<ReleaseRecord> {
        let response = self
            .http
            .post(self.repo_url("releases"))
            .query(&[("access_token", self.token()?)])
            .json(release)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::UnexpectedStatus {
                status: response.status().as_u16(),
                context: "create release".to_string(),
            }
            .into());
        }

        Ok(response.json().await?)
    }

    async fn upload_asset(
        &self,
        release: &ReleaseRecord,
        file_name: &str,
        content: Bytes,
    ) -> Result<()> {
        let template = release
            .upload_url
            .as_deref()
            .ok_or_else(|| ApiError::MalformedResponse {
                reason: "no upload_url in returned object".to_string(),
            })?;
        let url = build_upload_url(template, file_name, self.token()?)?;

        // A reset here is ambiguous: network fault or duplicate-filename
        // rejection by the API.
        let response = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/zip")
            .body(content)
            .send()
            .await
            .map_err(|_| ApiError::UploadInterrupted)?;

        match response.status() {
            StatusCode::CREATED => Ok(()),
            status => Err(ApiError::UploadRejected {
                status: status.as_u16(),
            }
            .into()),
        }
    }
}

/// Turn a templated upload URL into a concrete upload endpoint
///
/// Strips the `{?name,label}` template suffix, then appends the asset
/// filename and credential as query parameters.
pub fn build_upload_url(template: &str, file_name: &str, token: &str) -> Result<Url> {
    let base = match template.rfind('{') {
        Some(idx) => &template[..idx],
        None => template,
    };

    let mut url = Url::parse(base).map_err(|e| ApiError::MalformedResponse {
        reason: format!("bad upload_url '{}': {}", template, e),
    })?;
    url.query_pairs_mut()
        .append_pair("name", file_name)
        .append_pair("access_token", token);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_url_strips_template_and_appends_query() {
        let url = build_upload_url(
            "https://uploads.github.com/repos/icasdri/passthesalt/releases/1/assets{?name,label}",
            "passthesalt-v1.2.3-linux.zip",
            "tok123",
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://uploads.github.com/repos/icasdri/passthesalt/releases/1/assets\
             ?name=passthesalt-v1.2.3-linux.zip&access_token=tok123"
        );
    }

    #[test]
    fn upload_url_without_template_is_used_verbatim() {
        let url = build_upload_url("https://uploads.example/assets", "a.zip", "t").unwrap();
        assert_eq!(url.as_str(), "https://uploads.example/assets?name=a.zip&access_token=t");
    }

    #[test]
    fn garbage_upload_url_is_a_malformed_response() {
        let err = build_upload_url("not a url {", "a.zip", "t").unwrap_err();
        assert!(matches!(
            err,
            crate::error::ReleaseError::Api(ApiError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn release_record_deserializes_from_api_shape() {
        let record: ReleaseRecord = serde_json::from_str(
            r#"{
                "id": 42,
                "tag_name": "v1.2.3",
                "draft": true,
                "upload_url": "https://uploads.github.com/x/assets{?name,label}",
                "name": "Pending Release",
                "assets": []
            }"#,
        )
        .unwrap();
        assert_eq!(record.id, 42);
        assert_eq!(record.tag_name, "v1.2.3");
        assert!(record.draft);
    }

    #[test]
    fn draft_placeholder_is_a_draft_with_fixed_title() {
        let draft = NewRelease::draft_placeholder("v2.0.0");
        assert!(draft.draft);
        assert_eq!(draft.tag_name, "v2.0.0");
        assert_eq!(draft.name, "Pending Release");
    }

    #[test]
    fn client_without_token_refuses_to_authenticate() {
        let client = GitHubClient::new(&GitHubConfig::default()).unwrap();
        assert!(client.token().is_err());
    }
}

//! Blob store for rendered cards, backed by the GitHub Contents API.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use utoipa::ToSchema;

/// Folder every card is written to and listed from.
pub const STORE_FOLDER: &str = "public";

const GITHUB_API: &str = "https://api.github.com";
const GITHUB_RAW: &str = "https://raw.githubusercontent.com";
const STORE_USER_AGENT: &str = "ficha-server/0.1";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("store is not configured: {0}")]
    NotConfigured(String),
    #[error("GITHUB_REPO must look like 'owner/repository', got '{0}'")]
    InvalidRepository(String),
    #[error("request to store failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store answered {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Credentials and location of the GitHub repository used as blob store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubConfig {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl GithubConfig {
    /// Build from an `owner/repository` string.
    pub fn new(token: &str, repository: &str, branch: &str) -> Result<Self, StorageError> {
        match repository.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(Self {
                    token: token.to_string(),
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    branch: branch.to_string(),
                })
            }
            _ => Err(StorageError::InvalidRepository(repository.to_string())),
        }
    }

    /// Reads `GITHUB_TOKEN`, `GITHUB_REPO` and `GITHUB_BRANCH` (default `main`).
    pub fn from_env() -> Result<Self, StorageError> {
        let token = env::var("GITHUB_TOKEN")
            .map_err(|_| StorageError::NotConfigured("GITHUB_TOKEN is not set".to_string()))?;
        let repository = env::var("GITHUB_REPO")
            .map_err(|_| StorageError::NotConfigured("GITHUB_REPO is not set".to_string()))?;
        let branch = env::var("GITHUB_BRANCH").unwrap_or_else(|_| "main".to_string());
        Self::new(&token, &repository, &branch)
    }

    /// Public raw URL of `public/<filename>` on the configured branch.
    pub fn raw_url(&self, filename: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}/{}",
            GITHUB_RAW, self.owner, self.repo, self.branch, STORE_FOLDER, filename
        )
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            GITHUB_API, self.owner, self.repo, path
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FolderContent {
    pub name: String,
    pub is_file: bool,
    pub size: Option<u64>,
}

#[async_trait]
pub trait ObjectStorage {
    /// Store `file_data` as `filename` and return its public URL.
    async fn upload_file(&self, filename: &str, file_data: &[u8]) -> Result<String, StorageError>;

    /// Fetch the bytes behind a public URL.
    async fn download_file(&self, url: &str) -> Result<Vec<u8>, StorageError>;

    async fn list_folder_contents(&self, folder_name: &str) -> Result<Vec<FolderContent>, StorageError>;

    fn get_asset_url(&self, filename: &str) -> Result<String, StorageError>;
}

/// Entry of a GitHub directory listing.
#[derive(Debug, Deserialize)]
struct GithubEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    size: Option<u64>,
}

#[derive(Debug, Serialize)]
struct PutContents<'a> {
    message: String,
    content: String,
    branch: &'a str,
}

pub struct GithubStorage {
    config: Option<GithubConfig>,
    client: reqwest::Client,
}

impl GithubStorage {
    /// A store without configuration is still usable: every call reports
    /// [`StorageError::NotConfigured`].
    pub fn new(config: Option<GithubConfig>, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn config(&self) -> Result<&GithubConfig, StorageError> {
        self.config.as_ref().ok_or_else(|| {
            StorageError::NotConfigured("GITHUB_TOKEN or GITHUB_REPO is not set".to_string())
        })
    }

    fn authorized(&self, builder: reqwest::RequestBuilder, config: &GithubConfig) -> reqwest::RequestBuilder {
        builder
            .header(AUTHORIZATION, format!("token {}", config.token))
            .header(USER_AGENT, STORE_USER_AGENT)
            .header(ACCEPT, "application/vnd.github+json")
    }
}

/// `<dni>_<token>_<suffix>.png` becomes `feat: Ficha generada para DNI <dni> (<token>)`.
pub fn commit_message(filename: &str) -> String {
    let mut parts = filename.split('_');
    let dni = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default();
    format!("feat: Ficha generada para DNI {} ({})", dni, token)
}

async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StorageError::Status { status, body })
}

#[async_trait]
impl ObjectStorage for GithubStorage {
    async fn upload_file(&self, filename: &str, file_data: &[u8]) -> Result<String, StorageError> {
        let config = self.config()?;
        let path = format!("{}/{}", STORE_FOLDER, filename);
        log::info!(
            "Uploading {} ({} bytes) to {}/{}",
            path,
            file_data.len(),
            config.owner,
            config.repo
        );

        let body = PutContents {
            message: commit_message(filename),
            content: STANDARD.encode(file_data),
            branch: &config.branch,
        };
        let request = self.client.put(config.contents_url(&path)).json(&body);
        let response = self.authorized(request, config).send().await?;
        error_for_status(response).await?;

        let url = config.raw_url(filename);
        log::debug!("Uploaded {} to {}", filename, url);
        Ok(url)
    }

    async fn download_file(&self, url: &str) -> Result<Vec<u8>, StorageError> {
        log::debug!("Downloading {}", url);
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, STORE_USER_AGENT)
            .send()
            .await?;
        let response = error_for_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn list_folder_contents(&self, folder_name: &str) -> Result<Vec<FolderContent>, StorageError> {
        let config = self.config()?;
        let request = self.client.get(config.contents_url(folder_name));
        let response = self.authorized(request, config).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            log::warn!(
                "Folder '{}' not found in {}/{}; treating it as empty",
                folder_name,
                config.owner,
                config.repo
            );
            return Ok(Vec::new());
        }

        let entries: Vec<GithubEntry> = error_for_status(response).await?.json().await?;
        Ok(entries
            .into_iter()
            .map(|entry| FolderContent {
                is_file: entry.kind == "file",
                name: entry.name,
                size: entry.size,
            })
            .collect())
    }

    fn get_asset_url(&self, filename: &str) -> Result<String, StorageError> {
        Ok(self.config()?.raw_url(filename))
    }
}

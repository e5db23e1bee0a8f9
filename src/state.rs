//! Process-wide state shared by every request.

use std::sync::Arc;

use crate::card::{AssetFetcher, FontSet, HttpAssetFetcher};
use crate::config::AppConfig;
use crate::storage::{GithubStorage, ObjectStorage};
use crate::upstream::{HttpRecordLookup, RecordLookup};

const CLIENT_USER_AGENT: &str = "ficha-server/0.1";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn ObjectStorage + Send + Sync>,
    pub lookup: Arc<dyn RecordLookup + Send + Sync>,
    pub assets: Arc<dyn AssetFetcher>,
    pub fonts: FontSet,
}

impl AppState {
    /// Wire the HTTP-backed collaborators, all sharing one client.
    pub fn new(config: AppConfig, fonts: FontSet) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .pool_idle_timeout(std::time::Duration::from_secs(900))
            .user_agent(CLIENT_USER_AGENT)
            .build()?;

        let storage = Arc::new(GithubStorage::new(config.store.clone(), http_client.clone()));
        let lookup = Arc::new(HttpRecordLookup::new(
            http_client.clone(),
            config.upstream_base_url.clone(),
        ));
        let assets = Arc::new(HttpAssetFetcher::new(http_client));

        Ok(Self::new_with_parts(config, storage, lookup, assets, fonts))
    }

    pub fn new_with_parts(
        config: AppConfig,
        storage: Arc<dyn ObjectStorage + Send + Sync>,
        lookup: Arc<dyn RecordLookup + Send + Sync>,
        assets: Arc<dyn AssetFetcher>,
        fonts: FontSet,
    ) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            lookup,
            assets,
            fonts,
        }
    }
}

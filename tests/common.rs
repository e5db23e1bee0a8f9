#![allow(dead_code)]

use actix_web::web;
use async_trait::async_trait;
use ficha_server::card::{AssetFetcher, FetchError, FontSet, GlyphSource};
use ficha_server::storage::{FolderContent, ObjectStorage, StorageError};
use ficha_server::upstream::{RecordLookup, UpstreamError, UpstreamPayload, UpstreamUrls};
use ficha_server::{AppConfig, AppState};
use image::{Rgba, RgbaImage};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const DNI: &str = "44556677";
pub const PUBLIC_BASE: &str = "https://ficha.test";
pub const BLOB_BASE: &str = "https://blobs.test/public";

pub const PERSONAL_BLOCK: &str = "\
DNI : 44556677
APELLIDOS : QUISPE ROJAS
NOMBRES : ANA LUCIA
GENERO : FEMENINO
FECHA NACIMIENTO : 12/03/1990
DIRECCION : AV. LOS INCAS 123
DISTRITO : LIMA
";

/// Every glyph advances half the pixel size; nothing is drawn.
pub struct FixedAdvance;

impl GlyphSource for FixedAdvance {
    fn text_width(&self, px: f32, text: &str) -> f32 {
        text.chars().count() as f32 * px / 2.0
    }

    fn draw_text(&self, _: &mut RgbaImage, _: f32, _: i32, _: i32, _: Rgba<u8>, _: &str) {}
}

pub fn fixed_fonts() -> FontSet {
    FontSet::new(Arc::new(FixedAdvance), Arc::new(FixedAdvance))
}

/// In-memory store that records uploads in order.
pub struct MockStorage {
    uploads: Mutex<Vec<(String, Vec<u8>)>>,
    listing: Vec<FolderContent>,
    blobs: HashMap<String, Vec<u8>>,
    fail_uploads: bool,
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            listing: Vec::new(),
            blobs: HashMap::new(),
            fail_uploads: false,
        }
    }

    pub fn with_files(names: &[&str]) -> Self {
        Self {
            listing: names
                .iter()
                .map(|name| FolderContent {
                    name: name.to_string(),
                    is_file: true,
                    size: Some(1024),
                })
                .collect(),
            ..Self::new()
        }
    }

    pub fn with_blob(url: &str, bytes: &[u8]) -> Self {
        let mut storage = Self::new();
        storage.blobs.insert(url.to_string(), bytes.to_vec());
        storage
    }

    pub fn failing() -> Self {
        Self {
            fail_uploads: true,
            ..Self::new()
        }
    }

    pub async fn uploaded_names(&self) -> Vec<String> {
        self.uploads
            .lock()
            .await
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[async_trait]
impl ObjectStorage for MockStorage {
    async fn upload_file(&self, filename: &str, file_data: &[u8]) -> Result<String, StorageError> {
        if self.fail_uploads {
            return Err(StorageError::NotConfigured("GITHUB_TOKEN or GITHUB_REPO is not set".to_string()));
        }
        self.uploads
            .lock()
            .await
            .push((filename.to_string(), file_data.to_vec()));
        Ok(format!("{}/{}", BLOB_BASE, filename))
    }

    async fn download_file(&self, url: &str) -> Result<Vec<u8>, StorageError> {
        self.blobs.get(url).cloned().ok_or(StorageError::Status {
            status: reqwest::StatusCode::NOT_FOUND,
            body: "missing".to_string(),
        })
    }

    async fn list_folder_contents(&self, _folder_name: &str) -> Result<Vec<FolderContent>, StorageError> {
        Ok(self.listing.clone())
    }

    fn get_asset_url(&self, filename: &str) -> Result<String, StorageError> {
        Ok(format!("{}/{}", BLOB_BASE, filename))
    }
}

/// Lookup that answers with a fixed payload and counts calls.
pub struct MockLookup {
    payload: Option<UpstreamPayload>,
    calls: AtomicUsize,
}

impl MockLookup {
    pub fn found(message: &str) -> Self {
        Self {
            payload: Some(UpstreamPayload {
                status: "ok".to_string(),
                message: Some(message.to_string()),
                urls: Some(UpstreamUrls {
                    image: Some("https://cdn.test/foto.jpg".to_string()),
                }),
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn not_found(message: Option<&str>) -> Self {
        Self {
            payload: Some(UpstreamPayload {
                status: "error".to_string(),
                message: message.map(str::to_string),
                urls: None,
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            payload: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordLookup for MockLookup {
    async fn lookup(&self, _dni: &str) -> Result<UpstreamPayload, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payload
            .clone()
            .ok_or(UpstreamError::Status(reqwest::StatusCode::BAD_GATEWAY))
    }
}

/// Fetcher with no network: every icon and photo is skipped.
pub struct OfflineFetcher;

#[async_trait]
impl AssetFetcher for OfflineFetcher {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
        Err(FetchError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE))
    }
}

pub fn test_state(storage: Arc<MockStorage>, lookup: Arc<MockLookup>) -> web::Data<AppState> {
    let config = AppConfig {
        public_base_url: PUBLIC_BASE.to_string(),
        ..AppConfig::default()
    };
    web::Data::new(AppState::new_with_parts(
        config,
        storage,
        lookup,
        Arc::new(OfflineFetcher),
        fixed_fonts(),
    ))
}

pub fn companies_block(n: usize) -> String {
    (0..n)
        .map(|i| {
            format!(
                "DNI : {DNI}\nRUC : 20{i:09}\nRAZON SOCIAL : EMPRESA {i} S.A.C.\nCARGO : GERENTE\nDESDE : 2020-01-01\n"
            )
        })
        .collect()
}

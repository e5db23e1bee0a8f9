//! Generation pipeline: cache lookup, upstream query, rendering, upload.

use actix_web::web;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use uuid::Uuid;

use crate::card::{build_card_set, parse_record, CardAssets, CardError, CardSet, ParseError};
use crate::state::AppState;
use crate::storage::{ObjectStorage, StorageError, STORE_FOLDER};
use crate::upstream::UpstreamError;

pub const NOT_FOUND_MESSAGE: &str = "No se encontró información para el DNI ingresado.";
const PRIMARY_SUFFIX: &str = "PERSONALES";

#[derive(Debug, Error)]
pub enum FichaError {
    #[error("{0}")]
    NotFound(String),
    #[error("malformed lookup payload: {0}")]
    Malformed(#[from] ParseError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("rendering failed: {0}")]
    Render(#[from] CardError),
    #[error("upload failed: {0}")]
    Storage(#[from] StorageError),
    #[error("rendering task failed: {0}")]
    Blocking(String),
    #[error("invalid public base URL '{0}'")]
    InvalidBaseUrl(String),
}

/// What `/generar-ficha` answers with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ficha {
    pub message: String,
    /// `(response key, proxy URL)` in render order.
    pub urls: Vec<(String, String)>,
}

/// Serve a cached primary card when one exists, otherwise query, render and
/// upload a fresh card set.
pub async fn generate(state: &AppState, dni: &str) -> Result<Ficha, FichaError> {
    if let Some(cached) = find_cached(state.storage.as_ref(), dni).await {
        log::info!("Serving cached card for DNI {}: {}", dni, cached);
        let url = proxy_url(&state.config.public_base_url, &cached)?;
        return Ok(Ficha {
            message: format!("DNI : {}\nESTADO : RESULTADO PRINCIPAL ENCONTRADO EN CACHÉ.", dni),
            urls: vec![(url_key(1, PRIMARY_SUFFIX), url)],
        });
    }

    let payload = state.lookup.lookup(dni).await?;
    if !payload.is_found() {
        let message = payload
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| NOT_FOUND_MESSAGE.to_string());
        return Err(FichaError::NotFound(message));
    }

    let photo_url = payload.photo_url();
    let record = parse_record(payload.message.as_deref().unwrap_or_default())?.with_photo(photo_url);
    let assets = CardAssets::resolve(state.assets.as_ref(), record.photo_url.as_deref()).await;

    let message = format!(
        "DNI : {}\nAPELLIDOS : {}\nNOMBRES : {}\nESTADO : ",
        dni,
        record.personal.apellidos.as_deref().unwrap_or("-"),
        record.personal.nombres.as_deref().unwrap_or("-"),
    );

    let cards = render(state, dni, record, assets).await?;
    let urls = upload(state, dni, &cards).await?;

    let status = if urls.len() == 1 {
        "FICHA GENERADA CON ÉXITO."
    } else {
        "MÚLTIPLES FICHAS GENERADAS CON ÉXITO."
    };
    Ok(Ficha {
        message: message + status,
        urls,
    })
}

/// Rendering is CPU-bound, so it runs on the blocking pool.
async fn render(
    state: &AppState,
    dni: &str,
    record: crate::card::Record,
    assets: CardAssets,
) -> Result<CardSet, FichaError> {
    let fonts = state.fonts.clone();
    let id = dni.to_string();
    let set = web::block(move || {
        let mut rng = StdRng::from_entropy();
        build_card_set(&id, &record, &assets, &fonts, &mut rng)
    })
    .await
    .map_err(|e| FichaError::Blocking(e.to_string()))??;
    Ok(set)
}

async fn upload(state: &AppState, dni: &str, cards: &CardSet) -> Result<Vec<(String, String)>, FichaError> {
    let token = Uuid::new_v4().simple().to_string();
    let mut urls = Vec::with_capacity(cards.len());

    for card in &cards.cards {
        let suffix = card.suffix();
        let filename = card_filename(dni, &token, &suffix);
        let blob_url = state.storage.upload_file(&filename, &card.png).await?;
        urls.push((
            url_key(cards.len(), &suffix),
            proxy_url(&state.config.public_base_url, &blob_url)?,
        ));
    }
    Ok(urls)
}

/// URL of a stored primary card for `dni`, if any. Store failures count as a miss.
pub async fn find_cached(storage: &(dyn ObjectStorage + Send + Sync), dni: &str) -> Option<String> {
    let entries = match storage.list_folder_contents(STORE_FOLDER).await {
        Ok(entries) => entries,
        Err(StorageError::NotConfigured(reason)) => {
            log::error!("Skipping cache lookup, store is not configured: {}", reason);
            return None;
        }
        Err(e) => {
            log::error!("Cache lookup failed for DNI {}: {}", dni, e);
            return None;
        }
    };

    let hit = entries
        .into_iter()
        .find(|entry| entry.is_file && is_primary_card(&entry.name, dni))?;
    match storage.get_asset_url(&hit.name) {
        Ok(url) => Some(url),
        Err(e) => {
            log::error!("Cached card {} has no public URL: {}", hit.name, e);
            None
        }
    }
}

/// DNIs end up in store paths, so only ASCII letters and digits pass.
pub fn is_valid_dni(dni: &str) -> bool {
    !dni.is_empty() && dni.chars().all(|c| c.is_ascii_alphanumeric())
}

/// `<dni>_<token>_<suffix>.png`
pub fn card_filename(dni: &str, token: &str, suffix: &str) -> String {
    format!("{}_{}_{}.png", dni, token, suffix)
}

/// Matches `<dni>_<token>_PERSONALES.png` only.
pub fn is_primary_card(name: &str, dni: &str) -> bool {
    name.strip_prefix(dni)
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|rest| rest.strip_suffix(&format!("_{}.png", PRIMARY_SUFFIX)))
        .is_some_and(|token| !token.is_empty() && !token.contains('_'))
}

/// `FILE` when a single card is returned, `FILE_<suffix>` otherwise.
pub fn url_key(total: usize, suffix: &str) -> String {
    if total == 1 {
        "FILE".to_string()
    } else {
        format!("FILE_{}", suffix)
    }
}

/// `<public_base>/descargar-ficha?url=<encoded blob url>`
pub fn proxy_url(public_base: &str, blob_url: &str) -> Result<String, FichaError> {
    let endpoint = format!("{}/descargar-ficha", public_base.trim_end_matches('/'));
    reqwest::Url::parse_with_params(&endpoint, &[("url", blob_url)])
        .map(String::from)
        .map_err(|_| FichaError::InvalidBaseUrl(public_base.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dni_must_be_alphanumeric() {
        assert!(is_valid_dni("44556677"));
        assert!(is_valid_dni("X1234567"));
        for dni in ["", "../other", "../../../../x", "1?ref=evil#", "4455 6677", "4455_6677", "44556677ñ"] {
            assert!(!is_valid_dni(dni), "{dni}");
        }
    }

    #[test]
    fn test_card_filename_layout() {
        assert_eq!(
            card_filename("44556677", "0f3c", "PAGE_2"),
            "44556677_0f3c_PAGE_2.png"
        );
    }

    #[test]
    fn test_primary_card_match_is_exact() {
        assert!(is_primary_card("44556677_0f3c9a_PERSONALES.png", "44556677"));
        assert!(!is_primary_card("44556677_0f3c9a_SUELDOS.png", "44556677"));
        assert!(!is_primary_card("445566770_0f3c9a_PERSONALES.png", "44556677"));
        assert!(!is_primary_card("44556677__PERSONALES.png", "44556677"));
        assert!(!is_primary_card("x44556677_0f3c9a_PERSONALES.png", "44556677"));
    }

    #[test]
    fn test_url_key_depends_on_card_count() {
        assert_eq!(url_key(1, "PERSONALES"), "FILE");
        assert_eq!(url_key(3, "SUELDOS"), "FILE_SUELDOS");
    }

    #[test]
    fn test_proxy_url_encodes_blob_url() {
        let url = proxy_url(
            "https://ficha.example.com/",
            "https://raw.githubusercontent.com/o/r/main/public/1_a_PERSONALES.png",
        )
        .unwrap();
        assert_eq!(
            url,
            "https://ficha.example.com/descargar-ficha?url=https%3A%2F%2Fraw.githubusercontent.com%2Fo%2Fr%2Fmain%2Fpublic%2F1_a_PERSONALES.png"
        );
    }

    #[test]
    fn test_proxy_url_rejects_bad_base() {
        assert!(matches!(
            proxy_url("not a url", "https://x/y.png"),
            Err(FichaError::InvalidBaseUrl(_))
        ));
    }
}

//! Optional images placed on the personal card.
//!
//! Every asset is fetched or built independently. A failure is logged and the
//! slot stays empty; the card is rendered without it.

use async_trait::async_trait;
use image::{ImageBuffer, Rgba, RgbaImage};
use qrcode::{Color, QrCode};
use thiserror::Error;

/// Header icon shown at the top of the personal card.
pub const ICON_URL: &str = "https://www.socialcreator.com/srv/imgs/gen/79554_icohome.png";

/// Promotional link encoded in the QR code.
pub const QR_TARGET_URL: &str = "https://www.socialcreator.com/consultapeapk#apps";

const QR_MODULE_PX: u32 = 8;
const QR_QUIET_ZONE: u32 = 4;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("could not build QR code: {0}")]
    Qr(String),
}

/// Downloads raw asset bytes.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

pub struct HttpAssetFetcher {
    client: reqwest::Client,
}

impl HttpAssetFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        log::debug!("Fetching asset {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Decoded images for one personal card. Empty slots are skipped at render time.
#[derive(Debug, Clone, Default)]
pub struct CardAssets {
    pub icon: Option<RgbaImage>,
    pub photo: Option<RgbaImage>,
    pub qr: Option<RgbaImage>,
}

impl CardAssets {
    pub async fn resolve(fetcher: &dyn AssetFetcher, photo_url: Option<&str>) -> Self {
        let icon = skip_on_error("header icon", load_image(fetcher, ICON_URL).await);
        let photo = match photo_url {
            Some(url) => skip_on_error("photo", load_image(fetcher, url).await),
            None => None,
        };
        let qr = skip_on_error("QR code", qr_image(QR_TARGET_URL));
        Self { icon, photo, qr }
    }
}

async fn load_image(fetcher: &dyn AssetFetcher, url: &str) -> Result<RgbaImage, FetchError> {
    let bytes = fetcher.fetch(url).await?;
    Ok(image::load_from_memory(&bytes)?.to_rgba8())
}

fn skip_on_error(what: &str, result: Result<RgbaImage, FetchError>) -> Option<RgbaImage> {
    match result {
        Ok(img) => Some(img),
        Err(e) => {
            log::warn!("Skipping {}: {}", what, e);
            None
        }
    }
}

/// Black-on-white QR code with a quiet zone.
pub fn qr_image(data: &str) -> Result<RgbaImage, FetchError> {
    let code = QrCode::new(data.as_bytes()).map_err(|e| FetchError::Qr(e.to_string()))?;
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = (modules + 2 * QR_QUIET_ZONE) * QR_MODULE_PX;

    Ok(ImageBuffer::from_fn(side, side, |x, y| {
        let mx = (x / QR_MODULE_PX).checked_sub(QR_QUIET_ZONE);
        let my = (y / QR_MODULE_PX).checked_sub(QR_QUIET_ZONE);
        let dark = match (mx, my) {
            (Some(mx), Some(my)) if mx < modules && my < modules => {
                colors[(my * modules + mx) as usize] == Color::Dark
            }
            _ => false,
        };
        if dark {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;

    struct StaticFetcher {
        png: Option<Vec<u8>>,
    }

    #[async_trait]
    impl AssetFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            self.png
                .clone()
                .ok_or(FetchError::Status(reqwest::StatusCode::NOT_FOUND))
        }
    }

    fn tiny_png() -> Vec<u8> {
        let img = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[tokio::test]
    async fn test_failed_fetches_leave_slots_empty() {
        let fetcher = StaticFetcher { png: None };
        let assets = CardAssets::resolve(&fetcher, Some("https://example.com/foto.jpg")).await;
        assert!(assets.icon.is_none());
        assert!(assets.photo.is_none());
        assert!(assets.qr.is_some());
    }

    #[tokio::test]
    async fn test_undecodable_bytes_are_skipped() {
        let fetcher = StaticFetcher {
            png: Some(b"not an image".to_vec()),
        };
        let assets = CardAssets::resolve(&fetcher, None).await;
        assert!(assets.icon.is_none());
    }

    #[tokio::test]
    async fn test_decoded_images_fill_slots() {
        let fetcher = StaticFetcher {
            png: Some(tiny_png()),
        };
        let assets = CardAssets::resolve(&fetcher, Some("https://example.com/foto.png")).await;
        assert_eq!(assets.icon.as_ref().map(|i| i.dimensions()), Some((3, 2)));
        assert!(assets.photo.is_some());
    }

    #[tokio::test]
    async fn test_missing_photo_url_skips_photo() {
        let fetcher = StaticFetcher {
            png: Some(tiny_png()),
        };
        let assets = CardAssets::resolve(&fetcher, None).await;
        assert!(assets.photo.is_none());
        assert!(assets.icon.is_some());
    }

    #[test]
    fn test_qr_image_has_quiet_zone() {
        let qr = qr_image(QR_TARGET_URL).unwrap();
        assert_eq!(qr.width(), qr.height());
        assert_eq!(*qr.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        // Finder pattern corner.
        let edge = QR_QUIET_ZONE * QR_MODULE_PX;
        assert_eq!(*qr.get_pixel(edge, edge), Rgba([0, 0, 0, 255]));
    }
}

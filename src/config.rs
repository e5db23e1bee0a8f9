use anyhow::Context;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::storage::GithubConfig;

const DEFAULT_PUBLIC_BASE_URL: &str = "https://info-total-pe.fly.dev";
const DEFAULT_UPSTREAM_URL: &str = "https://web-production-75681.up.railway.app/seeker";

/// Settings read once at startup and shared read-only by every request.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Base of the proxy links handed to clients.
    pub public_base_url: String,
    pub upstream_base_url: String,
    /// `None` when the GitHub credentials are missing or invalid.
    pub store: Option<GithubConfig>,
    pub font_dir: PathBuf,
    pub http_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            upstream_base_url: DEFAULT_UPSTREAM_URL.to_string(),
            store: None,
            font_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static/fonts")),
            http_timeout: Duration::from_secs(15),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let port = match env::var("PORT") {
            Ok(port) => port
                .parse()
                .with_context(|| format!("PORT must be a port number, got '{}'", port))?,
            Err(_) => defaults.port,
        };

        let http_timeout = match env::var("HTTP_TIMEOUT_SECS") {
            Ok(secs) => Duration::from_secs(
                secs.parse()
                    .with_context(|| format!("HTTP_TIMEOUT_SECS must be whole seconds, got '{}'", secs))?,
            ),
            Err(_) => defaults.http_timeout,
        };

        let public_base_url = env::var("API_BASE_URL").unwrap_or_else(|_| {
            log::warn!(
                "API_BASE_URL is not set, download links will use {}",
                DEFAULT_PUBLIC_BASE_URL
            );
            defaults.public_base_url.clone()
        });

        let store = match GithubConfig::from_env() {
            Ok(store) => Some(store),
            Err(e) => {
                log::warn!("GitHub store disabled: {}", e);
                None
            }
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            upstream_base_url: env::var("UPSTREAM_URL").unwrap_or(defaults.upstream_base_url),
            store,
            font_dir: env::var("FONT_DIR").map(PathBuf::from).unwrap_or(defaults.font_dir),
            http_timeout,
        })
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.bind_address(), ("0.0.0.0".to_string(), 3000));
        assert_eq!(config.http_timeout, Duration::from_secs(15));
        assert!(config.store.is_none());
        assert!(config.font_dir.ends_with("static/fonts"));
    }
}

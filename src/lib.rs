use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{http::header, web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod card;
pub mod config;
pub mod ficha;
pub mod search;
pub mod state;
pub mod storage;
pub mod upstream;

pub use crate::config::AppConfig;
pub use crate::state::AppState;

use crate::card::FontSet;
use crate::ficha::models::DniFields;

/// JSON error body. `fields` accompanies not-found answers and `detalle`
/// carries the underlying cause of internal errors.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<DniFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detalle: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: &str) -> Self {
        Self {
            error: error.to_string(),
            fields: None,
            detalle: None,
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new(message)
    }

    pub fn not_found(message: &str, dni: &str) -> Self {
        Self {
            fields: Some(DniFields {
                dni: dni.to_string(),
            }),
            ..Self::new(message)
        }
    }

    pub fn internal_error(message: &str, detalle: &str) -> Self {
        Self {
            detalle: Some(detalle.to_string()),
            ..Self::new(message)
        }
    }
}

pub async fn run() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    #[derive(OpenApi)]
    #[openapi(
        paths(
            crate::ficha::handlers::generar_ficha,
            crate::ficha::handlers::descargar_ficha,
            crate::search::buscar_por_nombre,
            crate::search::buscar_por_padres,
            crate::search::buscar_por_edad
        ),
        components(
            schemas(
                ficha::models::FichaResponse,
                ficha::models::DniFields,
                search::SearchNotImplemented,
                storage::FolderContent,
                ErrorResponse,
            )
        ),
        tags(
            (name = "Ficha", description = "DNI card generation and download."),
            (name = "Search", description = "Reverse searches, not supported by the lookup API.")
        )
    )]
    struct ApiDoc;

    dotenvy::dotenv().ok();
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let fonts = match FontSet::load(&config.font_dir) {
        Ok(fonts) => fonts,
        Err(e) => {
            log::error!(
                "Failed to load card fonts. Set FONT_DIR to a folder with DejaVuSans.ttf and DejaVuSans-Bold.ttf. Error: {}",
                e
            );
            std::process::exit(1);
        }
    };

    let bind_address = config.bind_address();
    let app_state = match AppState::new(config, fonts) {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let prometheus = PrometheusMetricsBuilder::new("ficha_server")
        .endpoint("/metrics")
        .build()
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    log::info!(
        "Starting server at http://{}:{} (public base {})",
        bind_address.0,
        bind_address.1,
        app_state.config.public_base_url
    );

    HttpServer::new(move || {
        let app_state = app_state.clone();
        let prometheus = prometheus.clone();
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "OPTIONS"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .expose_headers(vec![header::CONTENT_DISPOSITION])
            .max_age(3600);

        App::new()
            .wrap(Compress::default())
            .wrap(prometheus)
            .wrap(cors)
            .app_data(app_state)
            .configure(ficha::config)
            .configure(search::config)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind(bind_address)?
    .run()
    .await
}

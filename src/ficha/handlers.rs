use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse, Responder};
use log::{debug, error, info, warn};
use sanitize_filename::sanitize;

use crate::ficha::models::{DescargarFichaQuery, FichaResponse, GenerarFichaQuery};
use crate::ficha::service::{self, FichaError, NOT_FOUND_MESSAGE};
use crate::state::AppState;
use crate::ErrorResponse;

const DEFAULT_DOWNLOAD_NAME: &str = "ficha.png";

#[utoipa::path(
    tag = "Ficha",
    get,
    path = "/generar-ficha",
    params(
        ("dni" = String, Query, description = "DNI to look up")
    ),
    responses(
        (status = 200, description = "Cards generated or served from cache", body = FichaResponse),
        (status = 400, description = "Missing or malformed DNI", body = ErrorResponse),
        (status = 404, description = "No record for this DNI", body = ErrorResponse),
        (status = 500, description = "Lookup, rendering or upload failed", body = ErrorResponse)
    )
)]
pub async fn generar_ficha(
    query: web::Query<GenerarFichaQuery>,
    state: web::Data<AppState>,
) -> impl Responder {
    let dni = match query.dni.as_deref().map(str::trim) {
        Some(dni) if !dni.is_empty() => dni.to_string(),
        _ => {
            warn!("generar_ficha called without DNI");
            return HttpResponse::BadRequest()
                .json(ErrorResponse::bad_request("Falta el parámetro DNI"));
        }
    };
    if !service::is_valid_dni(&dni) {
        warn!("generar_ficha rejected DNI {:?}", dni);
        return HttpResponse::BadRequest().json(ErrorResponse::bad_request(
            "El DNI solo puede contener letras y números",
        ));
    }
    info!("Executing generar_ficha handler for DNI {}", dni);

    match service::generate(&state, &dni).await {
        Ok(ficha) => {
            info!("Returning {} card link(s) for DNI {}", ficha.urls.len(), dni);
            HttpResponse::Ok().json(FichaResponse::new(&dni, ficha.message, ficha.urls))
        }
        Err(FichaError::NotFound(message)) => {
            info!("No record for DNI {}: {}", dni, message);
            HttpResponse::NotFound().json(ErrorResponse::not_found(&message, &dni))
        }
        Err(FichaError::Malformed(e)) => {
            warn!("Unusable lookup payload for DNI {}: {}", dni, e);
            HttpResponse::NotFound().json(ErrorResponse::not_found(NOT_FOUND_MESSAGE, &dni))
        }
        Err(e) => {
            error!("Failed to generate cards for DNI {}: {}", dni, e);
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error(
                "Error al generar las fichas o subir a GitHub",
                &e.to_string(),
            ))
        }
    }
}

#[utoipa::path(
    tag = "Ficha",
    get,
    path = "/descargar-ficha",
    params(
        ("url" = String, Query, description = "Encoded URL of a stored card")
    ),
    responses(
        (status = 200, description = "Card image as PNG attachment"),
        (status = 400, description = "Missing url"),
        (status = 500, description = "Download failed")
    )
)]
pub async fn descargar_ficha(
    query: web::Query<DescargarFichaQuery>,
    state: web::Data<AppState>,
) -> impl Responder {
    let url = match query.url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => {
            return HttpResponse::BadRequest().body("Falta el parámetro 'url' de la imagen.");
        }
    };
    info!("Executing descargar_ficha handler for {}", url);

    match state.storage.download_file(&url).await {
        Ok(bytes) => {
            let filename = download_name(&url);
            debug!("Serving {} ({} bytes)", filename, bytes.len());
            HttpResponse::Ok()
                .content_type("image/png")
                .insert_header(ContentDisposition {
                    disposition: DispositionType::Attachment,
                    parameters: vec![DispositionParam::Filename(filename)],
                })
                .body(bytes)
        }
        Err(e) => {
            error!("Failed to download {}: {}", url, e);
            HttpResponse::InternalServerError().body("Error al procesar la descarga del archivo.")
        }
    }
}

/// Last path segment of `url`, stripped of query and made safe for a header.
pub fn download_name(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let name = sanitize(path.rsplit('/').next().unwrap_or_default());
    if name.is_empty() {
        DEFAULT_DOWNLOAD_NAME.to_string()
    } else {
        name
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/generar-ficha", web::get().to(generar_ficha))
        .route("/descargar-ficha", web::get().to(descargar_ficha));
}

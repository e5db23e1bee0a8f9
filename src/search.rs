//! Reverse searches. The lookup API only answers by DNI, so these validate
//! their parameters and answer 501.

use actix_web::{web, HttpResponse, Responder};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::ErrorResponse;

const NOT_IMPLEMENTED: &str = "Búsqueda Avanzada No Implementada";
const DNI_ONLY: &str =
    "La API externa que utiliza esta aplicación solo soporta la consulta por número de DNI.";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SearchNotImplemented {
    pub error: String,
    pub message: String,
    /// Echo of the parameters that were sent.
    #[schema(value_type = Object)]
    pub solicitado: Value,
}

impl SearchNotImplemented {
    fn new(reason: &str, solicitado: Value) -> Self {
        Self {
            error: NOT_IMPLEMENTED.to_string(),
            message: format!("{} {}", DNI_ONLY, reason),
            solicitado,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub nombres: Option<String>,
    pub apellidos: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ParentsQuery {
    #[serde(rename = "nomPadre")]
    pub nom_padre: Option<String>,
    #[serde(rename = "nomMadre")]
    pub nom_madre: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AgeQuery {
    pub edad: Option<String>,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

#[utoipa::path(
    tag = "Search",
    get,
    path = "/buscar-por-nombre",
    params(
        ("nombres" = String, Query, description = "Given names"),
        ("apellidos" = String, Query, description = "Surnames")
    ),
    responses(
        (status = 400, description = "Missing parameters", body = ErrorResponse),
        (status = 501, description = "Only DNI lookups are supported", body = SearchNotImplemented)
    )
)]
pub async fn buscar_por_nombre(query: web::Query<NameQuery>) -> impl Responder {
    info!("Executing buscar_por_nombre handler");
    if !present(&query.nombres) || !present(&query.apellidos) {
        return HttpResponse::BadRequest().json(ErrorResponse::bad_request(
            "Faltan parámetros: 'nombres' y 'apellidos' son requeridos para esta consulta.",
        ));
    }
    HttpResponse::NotImplemented().json(SearchNotImplemented::new(
        "No es posible realizar búsquedas inversas por nombres y apellidos.",
        json!({ "nombres": query.nombres, "apellidos": query.apellidos }),
    ))
}

#[utoipa::path(
    tag = "Search",
    get,
    path = "/buscar-por-padres",
    params(
        ("nomPadre" = Option<String>, Query, description = "Father's name"),
        ("nomMadre" = Option<String>, Query, description = "Mother's name")
    ),
    responses(
        (status = 400, description = "Missing parameters", body = ErrorResponse),
        (status = 501, description = "Only DNI lookups are supported", body = SearchNotImplemented)
    )
)]
pub async fn buscar_por_padres(query: web::Query<ParentsQuery>) -> impl Responder {
    info!("Executing buscar_por_padres handler");
    if !present(&query.nom_padre) && !present(&query.nom_madre) {
        return HttpResponse::BadRequest().json(ErrorResponse::bad_request(
            "Faltan parámetros: Se requiere al menos 'nomPadre' o 'nomMadre' para esta consulta.",
        ));
    }
    HttpResponse::NotImplemented().json(SearchNotImplemented::new(
        "No es posible realizar búsquedas por nombres de padres.",
        json!({ "nomPadre": query.nom_padre, "nomMadre": query.nom_madre }),
    ))
}

#[utoipa::path(
    tag = "Search",
    get,
    path = "/buscar-por-edad",
    params(
        ("edad" = String, Query, description = "Age")
    ),
    responses(
        (status = 400, description = "Missing parameters", body = ErrorResponse),
        (status = 501, description = "Only DNI lookups are supported", body = SearchNotImplemented)
    )
)]
pub async fn buscar_por_edad(query: web::Query<AgeQuery>) -> impl Responder {
    info!("Executing buscar_por_edad handler");
    if !present(&query.edad) {
        return HttpResponse::BadRequest().json(ErrorResponse::bad_request(
            "Falta el parámetro 'edad' para esta consulta.",
        ));
    }
    HttpResponse::NotImplemented().json(SearchNotImplemented::new(
        "No es posible realizar búsquedas por edad.",
        json!({ "edad": query.edad }),
    ))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/buscar-por-nombre", web::get().to(buscar_por_nombre))
        .route("/buscar-por-padres", web::get().to(buscar_por_padres))
        .route("/buscar-por-edad", web::get().to(buscar_por_edad));
}

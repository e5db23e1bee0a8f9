use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

pub const BOT_NAME: &str = "Consulta pe";
pub const BOT_CHAT_ID: i64 = 7658983973;

#[derive(Debug, Deserialize)]
pub struct GenerarFichaQuery {
    pub dni: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DescargarFichaQuery {
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DniFields {
    #[schema(example = "44556677")]
    pub dni: String,
}

/// Body returned by `/generar-ficha` on success.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FichaResponse {
    #[schema(example = "Consulta pe")]
    pub bot: String,
    pub chat_id: i64,
    pub date: String,
    pub fields: DniFields,
    pub from_id: i64,
    #[schema(example = "DNI : 44556677\nESTADO : RESULTADO PRINCIPAL ENCONTRADO EN CACHÉ.")]
    pub message: String,
    pub parts_received: usize,
    /// `FILE` for a single card, `FILE_<SUFFIX>` per card otherwise, in render order.
    #[schema(value_type = Object)]
    pub urls: Map<String, Value>,
}

impl FichaResponse {
    pub fn new(dni: &str, message: String, urls: Vec<(String, String)>) -> Self {
        Self {
            bot: BOT_NAME.to_string(),
            chat_id: BOT_CHAT_ID,
            date: chrono::Utc::now().to_rfc3339(),
            fields: DniFields {
                dni: dni.to_string(),
            },
            from_id: BOT_CHAT_ID,
            message,
            parts_received: urls.len(),
            urls: urls
                .into_iter()
                .map(|(key, url)| (key, Value::String(url)))
                .collect(),
        }
    }
}

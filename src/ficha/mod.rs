//! Ficha module - the DNI card endpoints.
//!
//! - `handlers` - `/generar-ficha` and `/descargar-ficha`
//! - `models` - query and response bodies
//! - `service` - cache lookup, rendering and upload behind the handlers

pub mod handlers;
pub mod models;
pub mod service;

pub use handlers::config;

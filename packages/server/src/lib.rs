pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;

use std::time::Duration;

use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as ScalarServable};

use crate::config::CorsConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inventory Registration API",
        version = "1.0.0",
        description = "Register named items with an optional photo, then list, fetch, update, or delete them"
    ),
    paths(
        handlers::inventory::register_item,
        handlers::inventory::list_items,
        handlers::inventory::get_item,
        handlers::inventory::update_item,
        handlers::inventory::replace_photo,
        handlers::inventory::delete_item,
        handlers::inventory::download_photo,
    ),
    tags(
        (name = "Inventory", description = "Item registration, photos, and lookup"),
    ),
)]
struct ApiDoc;

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let cors = cors_layer(&state.config.server.cors);

    routes::routes()
        .with_state(state)
        .layer(cors)
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
}

fn cors_layer(cfg: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cfg
        .allow_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(cfg.max_age))
}

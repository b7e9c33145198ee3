use axum::{Router, routing::get};

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/inventory",
            get(handlers::inventory::list_items).post(handlers::inventory::register_item),
        )
        .route(
            "/inventory/{id}",
            get(handlers::inventory::get_item)
                .put(handlers::inventory::update_item)
                .delete(handlers::inventory::delete_item),
        )
        .route(
            "/inventory/{id}/photo",
            get(handlers::inventory::download_photo).put(handlers::inventory::replace_photo),
        )
        // Upload routes share the router; a GET body is never this large anyway.
        .layer(handlers::inventory::photo_upload_body_limit())
}

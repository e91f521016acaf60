//! Route configuration.

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::handlers::{self, areas, auth, hdevices, hpackets, hprojects, husers};
use crate::state::AppState;

/// Creates every API route, mounted under the configured base path.
///
/// # Routes
///
/// ## Outside the base path
/// - `GET /health` - Health check
///
/// ## Authentication
/// - `POST /authentication/login` - Form login, returns a token
///
/// ## Projects
/// - `POST /hprojects`, `PUT /hprojects` - Create, update
/// - `GET /hprojects?delta=&page=` - Paginated list
/// - `GET /hprojects/all` - Full list
/// - `GET /hprojects/all/cards` - Summary cards
/// - `GET /hprojects/{id}`, `DELETE /hprojects/{id}` - Read, delete
/// - `GET /hprojects/{id}/tree` - Packets of every device
/// - `GET /hprojects/{id}/areas` - Areas
/// - `PUT /hprojects/{id}/owner/{user_id}` - Change owner
///
/// ## Prerequisites
/// - `POST /hdevices`, `GET /hdevices/{id}`
/// - `POST /hpackets`, `GET /hpackets/{id}`, `POST /hpackets/{id}/fields`
/// - `POST /husers`, `GET /husers/{id}`
/// - `POST /areas`, `GET /areas/{id}`, `POST /areas/{id}/devices`
pub fn create_routes(state: AppState) -> Router {
    let api = Router::new()
        .route("/authentication/login", post(auth::login_handler))
        // Projects
        .route(
            "/hprojects",
            get(hprojects::find_all_paginated_handler)
                .post(hprojects::create_handler)
                .put(hprojects::update_handler),
        )
        .route("/hprojects/all", get(hprojects::find_all_handler))
        .route("/hprojects/all/cards", get(hprojects::cards_handler))
        .route(
            "/hprojects/{id}",
            get(hprojects::find_handler).delete(hprojects::delete_handler),
        )
        .route("/hprojects/{id}/tree", get(hprojects::tree_handler))
        .route("/hprojects/{id}/areas", get(hprojects::areas_handler))
        .route(
            "/hprojects/{id}/owner/{user_id}",
            put(hprojects::update_owner_handler),
        )
        // Devices
        .route("/hdevices", post(hdevices::create_handler))
        .route("/hdevices/{id}", get(hdevices::find_handler))
        // Packets
        .route("/hpackets", post(hpackets::create_handler))
        .route("/hpackets/{id}", get(hpackets::find_handler))
        .route("/hpackets/{id}/fields", post(hpackets::add_field_handler))
        // Users
        .route("/husers", post(husers::create_handler))
        .route("/husers/{id}", get(husers::find_handler))
        // Areas
        .route("/areas", post(areas::create_handler))
        .route("/areas/{id}", get(areas::find_handler))
        .route("/areas/{id}/devices", post(areas::add_device_handler));

    let base_path = state.config().normalized_base_path().to_string();
    let router = Router::new().route("/health", get(handlers::health::health_handler));
    let router = if base_path.is_empty() {
        router.merge(api)
    } else {
        router.nest(&base_path, api)
    };

    router.with_state(state)
}

pub mod api;
pub mod botfill;
pub mod config;
pub mod error;
pub mod registry;
pub mod state;
pub mod store;
pub mod ws;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;

use config::ServerConfig;
use state::AppState;

/// Build the Axum router and application state from a config.
pub fn build_app(config: ServerConfig) -> (Router<()>, AppState) {
    let state = AppState::new(config);

    let api_routes = Router::new()
        .route(
            "/rooms",
            post(api::create_room).get(api::list_public_rooms),
        )
        .route("/rooms/join", post(api::join_room))
        .route("/rooms/{code}", get(api::get_room));

    let app = Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .with_state(state.clone());

    (app, state)
}

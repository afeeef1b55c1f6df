use axum::http::Method;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all ladder endpoints.
pub fn build_router(state: AppState) -> Router {
    let allow_any_origin = state.config.allow_any_origin;
    let router = Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route(
            "/v1/players",
            get(handler::list_players).post(handler::add_player),
        )
        .route("/v1/players/:id", delete(handler::remove_player))
        .route(
            "/v1/matches",
            get(handler::list_matches).post(handler::record_match),
        )
        .route("/v1/matches/:id/invalidate", post(handler::invalidate_match))
        .route("/v1/transactions", get(handler::list_transactions))
        .route("/api/players", get(handler::list_players_envelope))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if allow_any_origin {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers(Any),
        )
    } else {
        router
    }
}

pub mod protocol;
pub mod rest;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::web::state::AppState;

pub use rest::ApiDoc;

/// Builds the API router, one route per user action.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(rest::get_state_handler))
        .route("/plans", post(rest::generate_handler))
        .route("/plans/stop", post(rest::stop_handler))
        .route("/plans/active", post(rest::select_plan_handler))
        .route("/plans/like", post(rest::toggle_like_handler))
        .route("/plans/regenerate", post(rest::regenerate_handler))
        .route("/plans/hotel", post(rest::select_hotel_handler))
        .route("/images", get(rest::list_images_handler))
        .route("/history", get(rest::list_history_handler))
        .route("/history/{id}/restore", post(rest::restore_history_handler))
        .route(
            "/chat",
            get(rest::get_chat_handler).post(rest::send_chat_handler),
        )
        .with_state(app_state)
}

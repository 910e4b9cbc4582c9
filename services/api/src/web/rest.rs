//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.
//!
//! Generation endpoints only start work: they answer `202 Accepted` at once and
//! the client follows progress and results through `GET /state`. Generation
//! failures never become HTTP errors; they show up in the state's `error` field.

use crate::planner::GenerationOutcome;
use crate::web::protocol::{
    ChatPost, ChatView, HistoryView, HotelSelection, ImagesView, LikeToggle, SelectPlan,
    StateView, StopResponse, TripForm,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Local;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        get_state_handler,
        generate_handler,
        stop_handler,
        select_plan_handler,
        toggle_like_handler,
        regenerate_handler,
        select_hotel_handler,
        list_images_handler,
        list_history_handler,
        restore_history_handler,
        get_chat_handler,
        send_chat_handler,
    ),
    components(
        schemas(
            TripForm, SelectPlan, LikeToggle, HotelSelection, ChatPost,
            StateView, StopResponse, ImagesView, HistoryView, ChatView
        )
    ),
    tags(
        (name = "Travel Planner API", description = "API endpoints for the AI travel itinerary planner.")
    )
)]
pub struct ApiDoc;

async fn state_view(state: &AppState) -> StateView {
    StateView::new(
        state.orchestrator.session().await,
        state.orchestrator.progress(),
    )
}

//=========================================================================================
// Plan Handlers
//=========================================================================================

/// Read the current planner state: form, plans, progress, phase and messages.
#[utoipa::path(
    get,
    path = "/state",
    responses((status = 200, description = "Current planner state", body = StateView))
)]
pub async fn get_state_handler(State(state): State<Arc<AppState>>) -> Json<StateView> {
    Json(state_view(&state).await)
}

/// Submit the search form and start a full generation.
///
/// Any generation still running is superseded.
#[utoipa::path(
    post,
    path = "/plans",
    request_body = TripForm,
    responses(
        (status = 202, description = "Generation started"),
        (status = 400, description = "Origin or destination missing")
    )
)]
pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    Json(form): Json<TripForm>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let inputs = form.into_inputs(Local::now().date_naive());
    if !inputs.is_routable() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Origin and destination are required".to_string(),
        ));
    }

    let orchestrator = state.orchestrator.clone();
    tokio::spawn(async move {
        let outcome = orchestrator.generate(inputs).await;
        info!("Full generation ended: {:?}", outcome);
    });
    Ok(StatusCode::ACCEPTED)
}

/// Stop the running generation and any image backfill.
#[utoipa::path(
    post,
    path = "/plans/stop",
    responses((status = 200, description = "Whether anything was running", body = StopResponse))
)]
pub async fn stop_handler(State(state): State<Arc<AppState>>) -> Json<StopResponse> {
    let stopped = state.orchestrator.stop().await;
    Json(StopResponse { stopped })
}

/// Switch the active plan tab. An out-of-range index changes nothing.
#[utoipa::path(
    post,
    path = "/plans/active",
    request_body = SelectPlan,
    responses((status = 200, description = "Updated planner state", body = StateView))
)]
pub async fn select_plan_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SelectPlan>,
) -> Json<StateView> {
    if !state.orchestrator.select_plan(body.index).await {
        warn!("Ignoring selection of missing plan {}.", body.index);
    }
    Json(state_view(&state).await)
}

/// Like or unlike one activity of the active plan.
#[utoipa::path(
    post,
    path = "/plans/like",
    request_body = LikeToggle,
    responses((status = 200, description = "Updated planner state", body = StateView))
)]
pub async fn toggle_like_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LikeToggle>,
) -> Json<StateView> {
    state
        .orchestrator
        .toggle_like(body.day_index, body.activity_index)
        .await;
    Json(state_view(&state).await)
}

/// Regenerate the active plan, keeping the liked activities.
#[utoipa::path(
    post,
    path = "/plans/regenerate",
    responses(
        (status = 202, description = "Regeneration started"),
        (status = 409, description = "There is no plan to regenerate")
    )
)]
pub async fn regenerate_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    require_active_plan(&state).await?;

    let orchestrator = state.orchestrator.clone();
    tokio::spawn(async move {
        let outcome = orchestrator.regenerate().await;
        info!("Regeneration ended: {:?}", outcome);
    });
    Ok(StatusCode::ACCEPTED)
}

/// Pin a hotel and regenerate the active plan's routes around it.
#[utoipa::path(
    post,
    path = "/plans/hotel",
    request_body = HotelSelection,
    responses(
        (status = 202, description = "Regeneration started"),
        (status = 400, description = "Hotel name missing"),
        (status = 409, description = "There is no plan to regenerate")
    )
)]
pub async fn select_hotel_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<HotelSelection>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let hotel_name = body.hotel_name.trim().to_string();
    if hotel_name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Hotel name is required".to_string()));
    }
    require_active_plan(&state).await?;

    let orchestrator = state.orchestrator.clone();
    tokio::spawn(async move {
        let outcome = orchestrator.select_hotel(&hotel_name).await;
        if outcome != GenerationOutcome::Completed {
            warn!("Hotel selection of '{}' ended: {:?}", hotel_name, outcome);
        }
    });
    Ok(StatusCode::ACCEPTED)
}

async fn require_active_plan(state: &AppState) -> Result<(), (StatusCode, String)> {
    if state.orchestrator.session().await.plans.active_plan().is_none() {
        return Err((StatusCode::CONFLICT, "There is no plan to regenerate".to_string()));
    }
    Ok(())
}

/// Read the generated images, keyed by place name.
#[utoipa::path(
    get,
    path = "/images",
    responses((status = 200, description = "Image cache", body = ImagesView))
)]
pub async fn list_images_handler(State(state): State<Arc<AppState>>) -> Json<ImagesView> {
    Json(ImagesView {
        images: state.orchestrator.images().snapshot().await,
    })
}

//=========================================================================================
// History Handlers
//=========================================================================================

/// List past full generations, most recent first.
#[utoipa::path(
    get,
    path = "/history",
    responses((status = 200, description = "Saved history", body = HistoryView))
)]
pub async fn list_history_handler(State(state): State<Arc<AppState>>) -> Json<HistoryView> {
    Json(HistoryView {
        items: state.orchestrator.history().list().await,
    })
}

/// Restore a history entry into the form and results view.
#[utoipa::path(
    post,
    path = "/history/{id}/restore",
    params(("id" = String, Path, description = "The history item ID.")),
    responses(
        (status = 200, description = "Restored planner state", body = StateView),
        (status = 404, description = "No such history item")
    )
)]
pub async fn restore_history_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StateView>, (StatusCode, String)> {
    if !state.orchestrator.restore(&id).await {
        return Err((StatusCode::NOT_FOUND, format!("History item {} not found", id)));
    }
    Ok(Json(state_view(&state).await))
}

//=========================================================================================
// Chat Handlers
//=========================================================================================

/// Open the chat, greeting the user if the conversation is new.
#[utoipa::path(
    get,
    path = "/chat",
    responses((status = 200, description = "Chat log", body = ChatView))
)]
pub async fn get_chat_handler(State(state): State<Arc<AppState>>) -> Json<ChatView> {
    Json(ChatView {
        messages: state.chat.open().await,
    })
}

/// Send a chat message about the active plan and wait for the reply.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatPost,
    responses(
        (status = 200, description = "Chat log including the reply", body = ChatView),
        (status = 400, description = "Empty message"),
        (status = 409, description = "A reply is still pending")
    )
)]
pub async fn send_chat_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatPost>,
) -> Result<Json<ChatView>, (StatusCode, String)> {
    if body.message.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Message is empty".to_string()));
    }

    let context = state.chat_context().await;
    if state.chat.send(&body.message, context).await.is_none() {
        return Err((StatusCode::CONFLICT, "A reply is still pending".to_string()));
    }
    Ok(Json(ChatView {
        messages: state.chat.messages().await,
    }))
}

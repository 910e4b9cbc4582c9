//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::planner::{ChatContext, ChatSession, GenerationOrchestrator};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<GenerationOrchestrator>,
    pub chat: Arc<ChatSession>,
}

impl AppState {
    /// The chat context as of now: the form's language, the active plan and its start date.
    pub async fn chat_context(&self) -> ChatContext {
        let session = self.orchestrator.session().await;
        ChatContext {
            language: session.inputs.language,
            plan: session.plans.active_plan().cloned(),
            start_date: session.inputs.start_date,
        }
    }
}

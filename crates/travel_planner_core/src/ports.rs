//! crates/travel_planner_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the AI generator and of the storage medium.

use async_trait::async_trait;
use crate::domain::TravelPlan;
use crate::request::{ChatRequest, GenerationRequest, RegenerationRequest};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., network, parsing).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// The outcome of a best-effort write. Persistence never fails an action;
/// a write that did not land is reported as `Degraded`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persisted {
    Saved,
    Degraded(String),
}

impl Persisted {
    pub fn is_saved(&self) -> bool {
        matches!(self, Persisted::Saved)
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait PlanGenerationService: Send + Sync {
    /// Generates one plan per requested transportation mode.
    ///
    /// The result is keyed by `transportation_mode`, not by position. A malformed
    /// generator response degrades to an empty list rather than an error.
    async fn generate_full_plan(&self, request: &GenerationRequest) -> PortResult<Vec<TravelPlan>>;

    /// Regenerates a single plan, keeping the liked activities verbatim.
    async fn regenerate_plan(&self, request: &RegenerationRequest) -> PortResult<TravelPlan>;
}

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    /// Generates an inline-encoded image for the given English prompt.
    /// `Ok(None)` means no image is available, which is not a failure.
    async fn generate_image(&self, query: &str) -> PortResult<Option<String>>;
}

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Sends one message. The request carries the full prior history since no
    /// conversation state is kept between calls.
    async fn send_chat_message(&self, request: &ChatRequest) -> PortResult<String>;
}

#[async_trait]
pub trait DurableStorage: Send + Sync {
    /// Reads the blob stored under `key`, or `None` if nothing was ever saved.
    async fn load(&self, key: &str) -> PortResult<Option<String>>;

    /// Replaces the blob stored under `key`.
    async fn save(&self, key: &str, value: &str) -> PortResult<()>;
}

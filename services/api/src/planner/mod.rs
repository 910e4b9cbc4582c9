//! services/api/src/planner/mod.rs
//!
//! The planning runtime: the generation state machine and everything it
//! schedules around the generator ports.

pub mod backfill;
pub mod chat;
pub mod history;
pub mod orchestrator;
pub mod progress;
pub mod retry;

#[cfg(test)]
pub mod testing;

pub use backfill::{BackfillReport, BackfillSettings, ImageCache};
pub use chat::{ChatContext, ChatSession};
pub use history::HistoryStore;
pub use orchestrator::{
    GenerationOrchestrator, GenerationOutcome, OrchestratorSettings, Phase, PlannerSession,
};
pub use progress::ProgressSimulator;
pub use retry::RetryPolicy;

pub mod dates;
pub mod domain;
pub mod plan_state;
pub mod ports;
pub mod request;

pub use dates::TripSchedule;
pub use domain::{
    Accommodation, Activity, ChatMessage, ChatRole, DailyPlan, HistoryItem, Language,
    PackingTips, TravelPlan, TripInputs,
};
pub use plan_state::PlanState;
pub use ports::{
    ChatService, DurableStorage, ImageGenerationService, Persisted, PlanGenerationService,
    PortError, PortResult,
};
pub use request::{ChatRequest, GenerationRequest, PlanRequestBuilder, RegenerationRequest};

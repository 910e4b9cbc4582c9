//! In-memory port implementations shared by the planner tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use travel_planner_core::domain::{
    Accommodation, Activity, DailyPlan, TravelPlan, TripInputs,
};
use travel_planner_core::ports::{
    ChatService, DurableStorage, ImageGenerationService, PlanGenerationService, PortError,
    PortResult,
};
use travel_planner_core::request::{ChatRequest, GenerationRequest, RegenerationRequest};

pub fn plan_with_places(mode: &str, days: &[&[&str]]) -> TravelPlan {
    TravelPlan {
        transportation_mode: mode.to_string(),
        origin: "Tokyo".into(),
        destination: "Kyoto".into(),
        duration_in_days: days.len() as u32,
        plan: days
            .iter()
            .enumerate()
            .map(|(i, places)| DailyPlan {
                day: i as u32 + 1,
                theme: format!("Day {}", i + 1),
                activities: places
                    .iter()
                    .enumerate()
                    .map(|(j, place)| Activity {
                        time: format!("{:02}:00", 9 + j * 2),
                        place_name: place.to_string(),
                        image_query: format!("{place}-query"),
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            })
            .collect(),
        accommodations: Some(vec![Accommodation {
            name: "Hotel Kyoto".into(),
            ..Default::default()
        }]),
        ..Default::default()
    }
}

pub fn trip(destination: &str) -> TripInputs {
    TripInputs {
        origin: "Tokyo".into(),
        destination: destination.into(),
        nights: 2,
        start_date: Some("2024-05-01".into()),
        ..Default::default()
    }
}

//=========================================================================================
// Plans
//=========================================================================================

#[derive(Default)]
pub struct MockPlans {
    delays: Mutex<HashMap<String, Duration>>,
    failing: AtomicBool,
    pub full_requests: Mutex<Vec<GenerationRequest>>,
    pub regen_requests: Mutex<Vec<RegenerationRequest>>,
}

impl MockPlans {
    /// Delays every response for `destination`.
    pub fn delay(self, destination: &str, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(destination.to_string(), delay);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    async fn pause_for(&self, destination: &str) {
        let delay = self.delays.lock().unwrap().get(destination).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check(&self) -> PortResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(PortError::Unexpected("generator unavailable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PlanGenerationService for MockPlans {
    async fn generate_full_plan(&self, request: &GenerationRequest) -> PortResult<Vec<TravelPlan>> {
        self.full_requests.lock().unwrap().push(request.clone());
        self.pause_for(&request.destination).await;
        self.check()?;

        let destination = request.destination.as_str();
        let station = format!("{destination} Station");
        let museum = format!("{destination} Museum");
        let mut plan = plan_with_places("Train", &[&[station.as_str(), museum.as_str()]]);
        plan.destination = destination.to_string();
        Ok(vec![plan])
    }

    async fn regenerate_plan(&self, request: &RegenerationRequest) -> PortResult<TravelPlan> {
        self.regen_requests.lock().unwrap().push(request.clone());
        self.pause_for(&request.current_plan.destination).await;
        self.check()?;

        let mut plan = request.current_plan.clone();
        plan.transportation_mode = format!("{} (regenerated)", plan.transportation_mode);
        for activity in plan.plan.iter_mut().flat_map(|day| day.activities.iter_mut()) {
            if !activity.is_liked() {
                activity.place_name = format!("{} v2", activity.place_name);
            }
        }
        if let Some(hotel) = &request.pinned_hotel {
            plan.accommodations = Some(vec![Accommodation {
                name: hotel.clone(),
                ..Default::default()
            }]);
        }
        Ok(plan)
    }
}

//=========================================================================================
// Images
//=========================================================================================

#[derive(Default)]
pub struct MockImages {
    queries: Mutex<Vec<String>>,
    failing: HashSet<String>,
    cancel_on: Option<(String, CancellationToken)>,
}

impl MockImages {
    pub fn failing(mut self, query: &str) -> Self {
        self.failing.insert(query.to_string());
        self
    }

    /// Cancels `token` when `query` is requested.
    pub fn cancel_on(mut self, query: &str, token: CancellationToken) -> Self {
        self.cancel_on = Some((query.to_string(), token));
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageGenerationService for MockImages {
    async fn generate_image(&self, query: &str) -> PortResult<Option<String>> {
        self.queries.lock().unwrap().push(query.to_string());
        if let Some((trigger, token)) = &self.cancel_on {
            if trigger == query {
                token.cancel();
            }
        }
        if self.failing.contains(query) {
            return Err(PortError::Unexpected("quota exceeded".into()));
        }
        Ok(Some(format!("image:{query}")))
    }
}

//=========================================================================================
// Chat
//=========================================================================================

#[derive(Default)]
pub struct MockChat {
    failing: AtomicBool,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl MockChat {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChatService for MockChat {
    async fn send_chat_message(&self, request: &ChatRequest) -> PortResult<String> {
        self.requests.lock().unwrap().push(request.clone());
        if self.failing.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("chat unavailable".into()));
        }
        Ok(format!("re: {}", request.message))
    }
}

//=========================================================================================
// Storage
//=========================================================================================

#[derive(Default)]
pub struct MemoryStorage {
    blobs: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
}

impl MemoryStorage {
    pub fn with_blob(key: &str, value: &str) -> Self {
        let storage = Self::default();
        storage.blobs.lock().unwrap().insert(key.to_string(), value.to_string());
        storage
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn blob(&self, key: &str) -> Option<String> {
        self.blobs.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl DurableStorage for MemoryStorage {
    async fn load(&self, key: &str) -> PortResult<Option<String>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("storage offline".into()));
        }
        Ok(self.blobs.lock().unwrap().get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> PortResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("storage offline".into()));
        }
        self.blobs.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

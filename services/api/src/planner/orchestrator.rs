//! services/api/src/planner/orchestrator.rs
//!
//! Drives every generate, regenerate, hotel-select and restore operation
//! against the planner session.
//!
//! At most one primary operation is in flight. Starting a new one cancels the
//! previous operation's token, and a cancelled operation never touches the
//! session again: its result, success or failure, is dropped. Image backfill
//! runs in the background under the token of the operation that started it.

use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use travel_planner_core::dates::{date_after_days, TripSchedule};
use travel_planner_core::domain::{HistoryItem, TravelPlan, TripInputs};
use travel_planner_core::plan_state::{order_by_requested_modes, PlanState};
use travel_planner_core::ports::{ImageGenerationService, PlanGenerationService, PortResult};
use travel_planner_core::request::{PlanRequestBuilder, RegenerationRequest};

use crate::planner::backfill::{backfill_images, BackfillReport, BackfillSettings, ImageCache};
use crate::planner::history::HistoryStore;
use crate::planner::progress::{ProgressSimulator, PROGRESS_TICK};

pub const GENERATION_ERROR_MESSAGE: &str = "Sorry, something went wrong. Please try again.";
pub const STOPPED_NOTICE: &str = "Generation stopped by user.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    pub progress_tick: Duration,
    /// How long 100% stays on screen before results are revealed.
    pub completion_dwell: Duration,
    pub backfill: BackfillSettings,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            progress_tick: PROGRESS_TICK,
            completion_dwell: Duration::from_millis(800),
            backfill: BackfillSettings::default(),
        }
    }
}

//=========================================================================================
// Session State
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Requesting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Generate,
    Regenerate,
    SelectHotel,
    Restore,
}

/// How an operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    Completed,
    /// Stopped by the user or superseded by a newer operation.
    Cancelled,
    Failed,
    /// Nothing to do: no route for a full generate, or no plan to regenerate.
    Rejected,
}

/// Everything the results view renders, owned by the orchestrator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerSession {
    pub inputs: TripInputs,
    pub end_date: Option<String>,
    pub plans: PlanState,
    pub phase: Phase,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub search_collapsed: bool,
}

impl PlannerSession {
    pub fn new(today: NaiveDate) -> Self {
        let schedule = TripSchedule::default_from(today);
        Self {
            inputs: TripInputs {
                nights: schedule.nights,
                start_date: Some(schedule.start_date),
                ..Default::default()
            },
            end_date: Some(schedule.end_date),
            plans: PlanState::default(),
            phase: Phase::Idle,
            error: None,
            notice: None,
            search_collapsed: false,
        }
    }
}

struct Ticket {
    id: u64,
    kind: OperationKind,
    token: CancellationToken,
}

#[derive(Default)]
struct Operations {
    primary: Option<(u64, CancellationToken)>,
    background: Option<CancellationToken>,
    next_id: u64,
}

//=========================================================================================
// The Orchestrator
//=========================================================================================

pub struct GenerationOrchestrator {
    plan_service: Arc<dyn PlanGenerationService>,
    image_service: Arc<dyn ImageGenerationService>,
    history: Arc<HistoryStore>,
    session: Mutex<PlannerSession>,
    images: ImageCache,
    progress: ProgressSimulator,
    operations: Mutex<Operations>,
    backfill: Mutex<Option<JoinHandle<BackfillReport>>>,
    settings: OrchestratorSettings,
}

impl GenerationOrchestrator {
    pub fn new(
        plan_service: Arc<dyn PlanGenerationService>,
        image_service: Arc<dyn ImageGenerationService>,
        history: Arc<HistoryStore>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            plan_service,
            image_service,
            history,
            session: Mutex::new(PlannerSession::new(Local::now().date_naive())),
            images: ImageCache::default(),
            progress: ProgressSimulator::new(settings.progress_tick),
            operations: Mutex::new(Operations::default()),
            backfill: Mutex::new(None),
            settings,
        }
    }

    pub async fn session(&self) -> PlannerSession {
        self.session.lock().await.clone()
    }

    pub fn progress(&self) -> f64 {
        self.progress.value()
    }

    pub fn images(&self) -> &ImageCache {
        &self.images
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    //-------------------------------------------------------------------------------------
    // User Actions
    //-------------------------------------------------------------------------------------

    /// Generates a fresh set of plans from the search form.
    pub async fn generate(&self, inputs: TripInputs) -> GenerationOutcome {
        if !inputs.is_routable() {
            warn!("Generate ignored: origin and destination are required.");
            return GenerationOutcome::Rejected;
        }

        let ticket = self.begin(OperationKind::Generate).await;
        info!(
            "Operation {}: generating plans for {} -> {}.",
            ticket.id, inputs.origin, inputs.destination
        );
        {
            let mut session = self.session.lock().await;
            if !self.is_current(&ticket).await {
                return GenerationOutcome::Cancelled;
            }
            session.end_date = inputs
                .start_date
                .as_deref()
                .and_then(|start| date_after_days(start, inputs.nights.max(1)));
            session.inputs = inputs.clone();
            session.error = None;
            session.notice = None;
            session.plans.clear();
            session.search_collapsed = true;
            session.phase = Phase::Requesting;
        }
        self.start_progress(&ticket).await;

        let request = PlanRequestBuilder::build(&inputs);
        let result = self
            .plan_service
            .generate_full_plan(&request)
            .await
            .map(|plans| order_by_requested_modes(plans, &inputs.requested_modes()));

        let plans = match self
            .settle(&ticket, result, |session, plans: Vec<TravelPlan>| {
                session.plans.replace_all(plans.clone());
                plans
            })
            .await
        {
            Ok(plans) => plans,
            Err(outcome) => return outcome,
        };

        self.history
            .append(HistoryItem::new(inputs, plans.clone()))
            .await;
        self.spawn_backfill(plans, ticket.token).await;
        GenerationOutcome::Completed
    }

    /// Regenerates the active plan around its liked activities.
    pub async fn regenerate(&self) -> GenerationOutcome {
        self.regenerate_active(None).await
    }

    /// Regenerates the active plan with its accommodation pinned to `hotel_name`.
    pub async fn select_hotel(&self, hotel_name: &str) -> GenerationOutcome {
        self.regenerate_active(Some(hotel_name.to_string())).await
    }

    /// Stops the in-flight operation and any background image backfill.
    ///
    /// Returns `false` when nothing was running.
    pub async fn stop(&self) -> bool {
        let (primary, background) = {
            let mut operations = self.operations.lock().await;
            let primary = operations.primary.take();
            let background = operations.background.take();
            if primary.is_none() && background.is_none() {
                return false;
            }
            self.progress.stop().await;
            (primary, background)
        };
        if let Some((id, token)) = &primary {
            info!("Operation {} stopped by user.", id);
            token.cancel();
        }
        if let Some(token) = &background {
            token.cancel();
        }

        let mut session = self.session.lock().await;
        session.phase = Phase::Idle;
        session.notice = Some(STOPPED_NOTICE.to_string());
        true
    }

    /// Flips the like flag of one activity of the active plan. Never calls out.
    pub async fn toggle_like(&self, day_index: usize, activity_index: usize) -> bool {
        self.session
            .lock()
            .await
            .plans
            .toggle_like(day_index, activity_index)
    }

    pub async fn select_plan(&self, index: usize) -> bool {
        self.session.lock().await.plans.select(index)
    }

    /// Restores a history entry into the form and results view.
    ///
    /// Supersedes any in-flight operation, then backfills images for places
    /// that are not cached yet.
    pub async fn restore(&self, history_id: &str) -> bool {
        let Some(item) = self.history.get(history_id).await else {
            return false;
        };

        let ticket = self.begin(OperationKind::Restore).await;
        let day_count = item.plans.first().map(|plan| plan.plan.len()).unwrap_or(0);
        let schedule = TripSchedule::restored(&item.inputs, day_count, Local::now().date_naive());
        {
            let mut session = self.session.lock().await;
            if !self.is_current(&ticket).await {
                return false;
            }
            session.inputs = item.inputs.clone();
            session.inputs.start_date = Some(schedule.start_date);
            session.inputs.nights = schedule.nights;
            session.end_date = Some(schedule.end_date);
            session.plans.replace_all(item.plans.clone());
            session.search_collapsed = true;
            session.phase = Phase::Idle;
            session.error = None;
            session.notice = None;
        }
        info!("Operation {}: restored history item {}.", ticket.id, item.id);
        self.finish(&ticket).await;
        self.spawn_backfill(item.plans, ticket.token).await;
        true
    }

    /// Waits for the most recently started image backfill to end.
    pub async fn wait_for_backfill(&self) -> Option<BackfillReport> {
        let handle = self.backfill.lock().await.take()?;
        handle.await.ok()
    }

    //-------------------------------------------------------------------------------------
    // Operation Lifecycle
    //-------------------------------------------------------------------------------------

    async fn regenerate_active(&self, pinned_hotel: Option<String>) -> GenerationOutcome {
        let kind = if pinned_hotel.is_some() {
            OperationKind::SelectHotel
        } else {
            OperationKind::Regenerate
        };

        let (request, index) = {
            let session = self.session.lock().await;
            let Some(plan) = session.plans.active_plan() else {
                return GenerationOutcome::Rejected;
            };
            let request = RegenerationRequest {
                current_plan: plan.clone(),
                liked_places: session.plans.liked_activity_labels(),
                wishlist_places: session.inputs.wishlist_places.clone(),
                interests: session.inputs.interests.clone(),
                language: session.inputs.language,
                pinned_hotel,
            };
            (request, session.plans.active_index())
        };

        let ticket = self.begin(kind).await;
        info!(
            "Operation {}: {:?} plan {} keeping {} liked activities.",
            ticket.id,
            kind,
            index,
            request.liked_places.len()
        );
        {
            let mut session = self.session.lock().await;
            if !self.is_current(&ticket).await {
                return GenerationOutcome::Cancelled;
            }
            session.error = None;
            session.notice = None;
            session.phase = Phase::Requesting;
        }
        self.start_progress(&ticket).await;

        let result = self.plan_service.regenerate_plan(&request).await;
        let plans = match self
            .settle(&ticket, result, |session, plan: TravelPlan| {
                session.plans.replace_at(index, plan.clone());
                vec![plan]
            })
            .await
        {
            Ok(plans) => plans,
            Err(outcome) => return outcome,
        };

        self.spawn_backfill(plans, ticket.token).await;
        GenerationOutcome::Completed
    }

    /// Registers a new primary operation, cancelling the previous one and any
    /// background backfill.
    async fn begin(&self, kind: OperationKind) -> Ticket {
        let mut operations = self.operations.lock().await;
        if let Some((id, token)) = operations.primary.take() {
            info!("Operation {} superseded.", id);
            token.cancel();
        }
        if let Some(token) = operations.background.take() {
            token.cancel();
        }

        operations.next_id += 1;
        let token = CancellationToken::new();
        operations.primary = Some((operations.next_id, token.clone()));
        Ticket {
            id: operations.next_id,
            kind,
            token,
        }
    }

    fn owns(operations: &Operations, ticket: &Ticket) -> bool {
        !ticket.token.is_cancelled()
            && matches!(&operations.primary, Some((id, _)) if *id == ticket.id)
    }

    async fn is_current(&self, ticket: &Ticket) -> bool {
        Self::owns(&*self.operations.lock().await, ticket)
    }

    // The progress simulation belongs to the current operation. Every change to it
    // happens under the operations lock, so a superseded operation cannot reset,
    // complete or stop its successor's simulation.

    async fn start_progress(&self, ticket: &Ticket) {
        let operations = self.operations.lock().await;
        if Self::owns(&operations, ticket) {
            self.progress.start().await;
        }
    }

    async fn complete_progress(&self, ticket: &Ticket) -> bool {
        let operations = self.operations.lock().await;
        if !Self::owns(&operations, ticket) {
            return false;
        }
        self.progress.complete().await;
        true
    }

    /// Retires the operation and stops the progress simulation, if it is still current.
    async fn finish(&self, ticket: &Ticket) {
        let mut operations = self.operations.lock().await;
        if matches!(&operations.primary, Some((id, _)) if *id == ticket.id) {
            operations.primary = None;
            self.progress.stop().await;
        }
    }

    /// Acts on the generator's answer.
    ///
    /// A failure is recorded as the generic error. A success shows 100%, waits
    /// out the dwell and then commits through `commit`, which returns the plans
    /// to backfill. A cancelled operation changes nothing.
    async fn settle<T>(
        &self,
        ticket: &Ticket,
        result: PortResult<T>,
        commit: impl FnOnce(&mut PlannerSession, T) -> Vec<TravelPlan>,
    ) -> Result<Vec<TravelPlan>, GenerationOutcome> {
        let value = match result {
            Ok(value) => value,
            Err(e) => {
                {
                    let mut session = self.session.lock().await;
                    if !self.is_current(ticket).await {
                        info!("Operation {} failure discarded after cancellation: {}", ticket.id, e);
                        return Err(GenerationOutcome::Cancelled);
                    }
                    error!("Operation {} ({:?}) failed: {}", ticket.id, ticket.kind, e);
                    session.error = Some(GENERATION_ERROR_MESSAGE.to_string());
                    if ticket.kind == OperationKind::Generate {
                        session.search_collapsed = false;
                    }
                    session.phase = Phase::Idle;
                }
                self.finish(ticket).await;
                return Err(GenerationOutcome::Failed);
            }
        };

        if !self.complete_progress(ticket).await {
            info!("Operation {} result discarded after cancellation.", ticket.id);
            return Err(GenerationOutcome::Cancelled);
        }
        tokio::time::sleep(self.settings.completion_dwell).await;

        let committed = {
            let mut session = self.session.lock().await;
            if !self.is_current(ticket).await {
                info!("Operation {} cancelled before commit.", ticket.id);
                return Err(GenerationOutcome::Cancelled);
            }
            let committed = commit(&mut session, value);
            session.phase = Phase::Idle;
            committed
        };
        self.finish(ticket).await;
        info!("Operation {} committed {} plan(s).", ticket.id, committed.len());
        Ok(committed)
    }

    async fn spawn_backfill(&self, plans: Vec<TravelPlan>, token: CancellationToken) {
        {
            let mut operations = self.operations.lock().await;
            if token.is_cancelled() {
                return;
            }
            operations.background = Some(token.clone());
        }

        let handle = tokio::spawn(backfill_images(
            self.image_service.clone(),
            plans,
            self.images.clone(),
            token,
            self.settings.backfill.clone(),
        ));
        *self.backfill.lock().await = Some(handle);
    }
}

//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between the browser client and the API server.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use travel_planner_core::dates::{day_label, TripSchedule};
use travel_planner_core::domain::{ChatMessage, HistoryItem, Language, TravelPlan, TripInputs};
use utoipa::ToSchema;

use crate::planner::{Phase, PlannerSession};

/// Nights used when the form carries no start date to count from.
const DEFAULT_NIGHTS: u32 = 2;

//=========================================================================================
// Payloads Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// The search form.
#[derive(Deserialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct TripForm {
    pub origin: String,
    pub destination: String,
    /// `YYYY-MM-DD`. When absent the trip is assumed to start tomorrow.
    pub start_date: Option<String>,
    /// `YYYY-MM-DD`. Moved to the day after `start_date` when not after it.
    pub end_date: Option<String>,
    /// Only read when `start_date` is absent.
    pub nights: Option<u32>,
    pub budget: String,
    /// Comma-separated transportation modes, e.g. `"Train, Plane"`.
    pub transportation: String,
    pub departure_time: String,
    pub wishlist_places: String,
    pub interests: String,
    pub is_pack_light: bool,
    /// One of `ja`, `en`, `ko`, `fr`.
    pub language: String,
}

impl TripForm {
    /// Resolves the form into trip inputs, reconciling the dates into a night count.
    pub fn into_inputs(self, today: NaiveDate) -> TripInputs {
        let start = self
            .start_date
            .as_deref()
            .map(str::trim)
            .filter(|start| !start.is_empty());
        let (start_date, nights) = match start {
            Some(start) => {
                let schedule = TripSchedule::reconcile(start, self.end_date.as_deref(), today);
                (Some(schedule.start_date), schedule.nights)
            }
            None => (None, self.nights.unwrap_or(DEFAULT_NIGHTS).max(1)),
        };

        TripInputs {
            origin: self.origin,
            destination: self.destination,
            nights,
            budget: self.budget,
            transportation: self.transportation,
            departure_time: self.departure_time,
            wishlist_places: self.wishlist_places,
            interests: self.interests,
            is_pack_light: self.is_pack_light,
            start_date,
            language: Language::from_code(&self.language),
        }
    }
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectPlan {
    pub index: usize,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggle {
    pub day_index: usize,
    pub activity_index: usize,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HotelSelection {
    pub hotel_name: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct ChatPost {
    pub message: String,
}

//=========================================================================================
// Payloads Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Everything the results view renders.
#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StateView {
    #[schema(value_type = Object)]
    pub inputs: TripInputs,
    pub end_date: Option<String>,
    #[schema(value_type = Vec<Object>)]
    pub plans: Vec<TravelPlan>,
    pub active_index: usize,
    #[schema(value_type = String, example = "idle")]
    pub phase: Phase,
    /// 0 to 100.
    pub progress: f64,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub search_collapsed: bool,
    /// Calendar label per day of the active plan, e.g. `May 2 (Thu)`.
    pub day_labels: Vec<Option<String>>,
    /// Whether the traveller sleeps at the destination after each day of the active plan.
    pub stay_nights: Vec<bool>,
}

impl StateView {
    pub fn new(session: PlannerSession, progress: f64) -> Self {
        let (day_labels, stay_nights) = match session.plans.active_plan() {
            Some(plan) => plan
                .plan
                .iter()
                .map(|day| {
                    (
                        day_label(session.inputs.start_date.as_deref(), day.day),
                        plan.is_stay_night(day.day),
                    )
                })
                .unzip(),
            None => (Vec::new(), Vec::new()),
        };

        Self {
            active_index: session.plans.active_index(),
            plans: session.plans.plans().to_vec(),
            inputs: session.inputs,
            end_date: session.end_date,
            phase: session.phase,
            progress,
            error: session.error,
            notice: session.notice,
            search_collapsed: session.search_collapsed,
            day_labels,
            stay_nights,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct StopResponse {
    pub stopped: bool,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ImagesView {
    /// Place name to inline `data:` URL.
    pub images: HashMap<String, String>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct HistoryView {
    #[schema(value_type = Vec<Object>)]
    pub items: Vec<HistoryItem>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ChatView {
    #[schema(value_type = Vec<Object>)]
    pub messages: Vec<ChatMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::testing::plan_with_places;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 20).unwrap()
    }

    #[test]
    fn form_reconciles_dates_and_language() {
        let form = TripForm {
            origin: "Tokyo".into(),
            destination: "Kyoto".into(),
            start_date: Some("2024-05-03".into()),
            end_date: Some("2024-05-01".into()),
            language: "ko".into(),
            ..Default::default()
        };

        let inputs = form.into_inputs(today());

        assert_eq!(inputs.start_date.as_deref(), Some("2024-05-03"));
        assert_eq!(inputs.nights, 1);
        assert_eq!(inputs.language, Language::Ko);
    }

    #[test]
    fn form_without_start_keeps_night_count() {
        let form = TripForm {
            start_date: Some("  ".into()),
            nights: Some(4),
            ..Default::default()
        };

        let inputs = form.into_inputs(today());

        assert_eq!(inputs.start_date, None);
        assert_eq!(inputs.nights, 4);
        assert_eq!(inputs.language, Language::Ja);
    }

    #[test]
    fn view_labels_days_of_active_plan() {
        let mut session = PlannerSession::new(today());
        session.inputs.start_date = Some("2024-05-01".into());
        let mut plan = plan_with_places("Train", &[&["A"], &["B"], &["C"]]);
        plan.duration_in_days = 3;
        session.plans.replace_all(vec![plan]);

        let view = StateView::new(session, 42.0);

        assert_eq!(
            view.day_labels,
            vec![
                Some("May 1 (Wed)".to_string()),
                Some("May 2 (Thu)".to_string()),
                Some("May 3 (Fri)".to_string()),
            ]
        );
        assert_eq!(view.stay_nights, vec![true, true, false]);
        assert_eq!(view.progress, 42.0);
    }
}

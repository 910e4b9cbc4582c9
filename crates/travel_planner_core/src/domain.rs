//! crates/travel_planner_core/src/domain.rs
//!
//! Defines the core data structures for the application: itineraries, the
//! inputs they were generated from, history entries and chat turns.
//!
//! Field names serialize in camelCase because the same shapes travel over the
//! generator boundary and into the persisted JSON blobs.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One proposed itinerary for a single transportation mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelPlan {
    #[serde(default)]
    pub transportation_mode: String,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub duration_in_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_transportation_details: Option<String>,
    /// Days in day order. Not guaranteed to match `duration_in_days`.
    #[serde(default)]
    pub plan: Vec<DailyPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_estimated_cost: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accommodations: Option<Vec<Accommodation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packing_tips: Option<PackingTips>,
}

impl TravelPlan {
    /// The number of days to reason about when the declared duration is missing.
    pub fn effective_duration(&self) -> u32 {
        if self.duration_in_days > 0 {
            self.duration_in_days
        } else {
            self.plan.len() as u32
        }
    }

    /// Every day except the last one ends with a night at the accommodation.
    pub fn is_stay_night(&self, day: u32) -> bool {
        day < self.effective_duration()
    }

    pub fn has_likes(&self) -> bool {
        self.activities().any(|activity| activity.is_liked())
    }

    /// Iterates over every activity in day-then-time order.
    pub fn activities(&self) -> impl Iterator<Item = &Activity> {
        self.plan.iter().flat_map(|day| day.activities.iter())
    }
}

/// A single day of a plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPlan {
    #[serde(default)]
    pub day: u32,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_estimated_cost: Option<String>,
}

/// A single scheduled stop.
///
/// `place_name` doubles as the key into the generated-image cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub activity_duration: String,
    #[serde(default)]
    pub place_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transportation_cost: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_departure_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_arrival_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_departure_station: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_arrival_station: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_restaurants: Option<Vec<String>>,
    /// The only field mutated after creation, and only by the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_liked: Option<bool>,
}

impl Activity {
    pub fn is_liked(&self) -> bool {
        self.is_liked.unwrap_or(false)
    }

    /// The label a liked activity is handed to the generator with.
    pub fn liked_label(&self) -> String {
        format!("{} ({})", self.place_name, self.time)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accommodation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub estimated_price: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackingTips {
    #[serde(default)]
    pub luggage_type: String,
    #[serde(default)]
    pub clothing: String,
    #[serde(default)]
    pub essentials: Vec<String>,
    /// Items the hotel provides, so they are left out of the packing list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amenities_provided: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparations: Option<Vec<String>>,
}

/// Output language for every generated text except image prompts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ja,
    En,
    Ko,
    Fr,
}

impl Language {
    /// Parses a language code, falling back to Japanese for anything unknown.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Language::En,
            "ko" => Language::Ko,
            "fr" => Language::Fr,
            _ => Language::Ja,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::Ja => "Japanese",
            Language::En => "English",
            Language::Ko => "Korean",
            Language::Fr => "French",
        }
    }
}

/// Everything the user typed into the search form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripInputs {
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
    /// Zero means the value was never recorded.
    #[serde(default)]
    pub nights: u32,
    #[serde(default)]
    pub budget: String,
    /// Comma-separated list of transportation modes.
    #[serde(default)]
    pub transportation: String,
    #[serde(default)]
    pub departure_time: String,
    #[serde(default)]
    pub wishlist_places: String,
    #[serde(default)]
    pub interests: String,
    #[serde(default)]
    pub is_pack_light: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default)]
    pub language: Language,
}

impl TripInputs {
    /// A plan can only be requested once both ends of the trip are known.
    pub fn is_routable(&self) -> bool {
        !self.origin.trim().is_empty() && !self.destination.trim().is_empty()
    }

    /// The requested transportation modes, in the order the user listed them.
    pub fn requested_modes(&self) -> Vec<String> {
        self.transportation
            .split([',', '、'])
            .map(str::trim)
            .filter(|mode| !mode.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// A record of one completed full generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub inputs: TripInputs,
    #[serde(default)]
    pub plans: Vec<TravelPlan>,
}

impl HistoryItem {
    pub fn new(inputs: TripInputs, plans: Vec<TravelPlan>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            timestamp: Utc::now().timestamp_millis(),
            inputs,
            plans,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One turn of the travel-assistant conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_tolerates_missing_fields() {
        let plan: TravelPlan = serde_json::from_str(
            r#"{"transportationMode":"Shinkansen","plan":[{"day":1,"activities":[{"placeName":"Shrine"}]}]}"#,
        )
        .unwrap();

        assert_eq!(plan.transportation_mode, "Shinkansen");
        assert_eq!(plan.duration_in_days, 0);
        assert_eq!(plan.effective_duration(), 1);
        assert_eq!(plan.plan[0].activities[0].place_name, "Shrine");
        assert!(!plan.plan[0].activities[0].is_liked());
    }

    #[test]
    fn liked_flag_serializes_in_camel_case() {
        let activity = Activity {
            place_name: "Cafe".into(),
            time: "11:00".into(),
            is_liked: Some(true),
            ..Default::default()
        };
        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["isLiked"], true);
        assert_eq!(json["placeName"], "Cafe");
        assert_eq!(activity.liked_label(), "Cafe (11:00)");
    }

    #[test]
    fn stay_nights_exclude_last_day() {
        let plan = TravelPlan {
            duration_in_days: 3,
            ..Default::default()
        };
        assert!(plan.is_stay_night(1));
        assert!(plan.is_stay_night(2));
        assert!(!plan.is_stay_night(3));
    }

    #[test]
    fn requested_modes_split_on_commas() {
        let inputs = TripInputs {
            transportation: "Shinkansen, Plane,,Bus".into(),
            ..Default::default()
        };
        assert_eq!(inputs.requested_modes(), vec!["Shinkansen", "Plane", "Bus"]);
    }

    #[test]
    fn unknown_language_defaults_to_japanese() {
        assert_eq!(Language::from_code("de"), Language::Ja);
        assert_eq!(Language::from_code("EN"), Language::En);
    }

    #[test]
    fn history_item_without_nights_deserializes() {
        let item: HistoryItem = serde_json::from_str(
            r#"{"id":"1","timestamp":0,"inputs":{"origin":"Tokyo","destination":"Kyoto"},"plans":[]}"#,
        )
        .unwrap();
        assert_eq!(item.inputs.nights, 0);
        assert_eq!(item.inputs.start_date, None);
    }
}

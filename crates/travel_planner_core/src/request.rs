//! crates/travel_planner_core/src/request.rs
//!
//! Builds the requests handed to the generator and renders them into the
//! natural-language prompts the generator understands. Everything here is pure.

use chrono::NaiveDateTime;
use crate::domain::{ChatMessage, Language, TravelPlan, TripInputs};

//=========================================================================================
// Full Generation
//=========================================================================================

/// A normalized full-generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub origin: String,
    pub destination: String,
    pub nights: u32,
    pub transportation: String,
    pub budget: String,
    pub wishlist_places: String,
    pub departure_time: String,
    pub interests: String,
    pub language: Language,
    pub is_pack_light: bool,
    pub start_date: Option<String>,
}

/// Assembles a generation request from the raw form fields.
///
/// The caller guarantees that origin and destination are present.
pub struct PlanRequestBuilder;

impl PlanRequestBuilder {
    pub fn build(inputs: &TripInputs) -> GenerationRequest {
        let start_date = inputs
            .start_date
            .as_deref()
            .map(str::trim)
            .filter(|date| !date.is_empty())
            .map(str::to_string);

        GenerationRequest {
            origin: inputs.origin.trim().to_string(),
            destination: inputs.destination.trim().to_string(),
            nights: inputs.nights.max(1),
            transportation: inputs.transportation.trim().to_string(),
            budget: inputs.budget.trim().to_string(),
            wishlist_places: inputs.wishlist_places.trim().to_string(),
            departure_time: inputs.departure_time.trim().to_string(),
            interests: inputs.interests.trim().to_string(),
            language: inputs.language,
            is_pack_light: inputs.is_pack_light,
            start_date,
        }
    }
}

impl GenerationRequest {
    /// Pins the generator to the exact start date and leaves season and weekday
    /// reasoning to it.
    pub fn date_instruction(&self) -> String {
        match &self.start_date {
            Some(date) => format!(
                "Trip Start Date: {date}. Consider the season, weather, and day of the week (e.g., weekday vs weekend crowds, opening hours) for that specific date."
            ),
            None => "Assume the trip starts tomorrow.".to_string(),
        }
    }

    fn pack_light_instruction(&self) -> &'static str {
        if self.is_pack_light {
            "User prefers to travel LIGHT. Suggest minimal luggage (e.g. backpack). Assume hotels provide standard amenities (towels, pajamas, toiletries, hairdryer) and exclude them from the packing list to save space."
        } else {
            "Consider standard hotel amenities (towels, toiletries) to avoid overpacking."
        }
    }

    pub fn prompt(&self) -> String {
        let lang = self.language.name();
        let start = self.start_date.as_deref().unwrap_or("Tomorrow");
        let transportation = or_default(&self.transportation, "Any");
        let budget = or_default(&self.budget, "Any");
        let departure = or_default(&self.departure_time, "Morning");
        let wishlist = or_default(&self.wishlist_places, "None (Recommend)");
        let interests = or_default(&self.interests, "None");

        format!(
            r#"You are a professional travel planner.
Create the best travel plan based on the following conditions.

**OUTPUT IN {lang}. ALL TEXT MUST BE IN {lang} (except imageQuery which must be English).**

**Important: If multiple transportation modes ({modes}) are selected, create multiple plans, one for each mode.**

Conditions:
- Origin: {origin}
- Destination: {destination}
- Trip Start Date: {start}
- Duration: {nights} nights, {days} days
- Transportation: {transportation}
- Budget: {budget}
- Departure Time: {departure}
- Must-visit places: {wishlist}
- Interests: {interests}
- Accommodation: Suggest 5 operating hotels.

【Crucial: Time Consistency】
1. **No Overlaps**: Previous Activity Start + Duration + Travel Time = Next Arrival. Strictly enforce this.
2. **Real Timetables**: Use EXACT times (e.g., 09:58 dep, 12:13 arr) based on real schedules, not rounded numbers like 10:00.
3. **Transfer Time**: Allow realistic time for transfers (e.g., 15 mins).

【Transport Accuracy】
- Specific Names: Use "Nozomi 22" instead of just "Shinkansen".
- Direction: Include "Bound for X".
- Route Logic: No impossible direct routes.

【Content】
- {date_instruction}
- Prioritize user's wishlist and interests.
- Image prompts must be vivid, descriptive English including season/weather matching the date.
- Suggest 5 specific real restaurants for meals.
- **Packing Tips**: {pack_light} Provide practical advice on luggage and clothing quantity based on duration and expected weather for this season. Explicitly list standard amenities (towels, toothbrush, pajamas, etc.) provided by hotels in 'amenitiesProvided'.
- **Preparations**: List specific actions the user should take BEFORE leaving home (e.g. buying tickets, checking weather, downloading maps).

Output in JSON format."#,
            modes = self.transportation,
            origin = self.origin,
            destination = self.destination,
            nights = self.nights,
            days = self.nights + 1,
            date_instruction = self.date_instruction(),
            pack_light = self.pack_light_instruction(),
        )
    }
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

//=========================================================================================
// Partial Regeneration
//=========================================================================================

/// A request to regenerate one plan around the activities the user liked.
#[derive(Debug, Clone, PartialEq)]
pub struct RegenerationRequest {
    pub current_plan: TravelPlan,
    /// Liked activities as `"<place> (<time>)"`, in day-then-activity order.
    pub liked_places: Vec<String>,
    pub wishlist_places: String,
    pub interests: String,
    pub language: Language,
    pub pinned_hotel: Option<String>,
}

impl RegenerationRequest {
    pub fn prompt(&self) -> String {
        let plan = &self.current_plan;
        let liked = serde_json::to_string(&self.liked_places).unwrap_or_else(|_| "[]".to_string());
        let hotel = match &self.pinned_hotel {
            Some(name) => format!(
                r#"
**PRIORITY**:
User selected hotel "{name}".
1. Fix accommodation to this hotel.
2. Re-calculate routes so daily travel ends at/starts from this hotel.
"#
            ),
            None => String::new(),
        };

        format!(
            r#"You are a travel planner. Regenerate the plan based on feedback.

**OUTPUT IN {lang}.**

Original Plan:
- Origin: {origin}
- Destination: {destination}
- Duration: {duration} nights
- Mode: {mode}

Feedback:
1. **Keep Liked Spots**: Keep these places and their time slots: {liked}
2. **Replace Others**: Remove unliked spots and replace with NEW suggestions.
3. **Priorities**:
   - Wishlist: {wishlist}
   - Interests: {interests}
   Include these if missing.
{hotel}
【Time Consistency】
- Ensure strict chronological order.
- Use real timetables for transport.
- Specify activityDuration.

【Content】
- Regenerate packing tips if necessary. Ensure amenitiesProvided and preparations are populated.

Output in JSON format (Single TravelPlan object)."#,
            lang = self.language.name(),
            origin = plan.origin,
            destination = plan.destination,
            duration = plan.duration_in_days,
            mode = plan.transportation_mode,
            wishlist = self.wishlist_places,
            interests = self.interests,
        )
    }
}

//=========================================================================================
// Images
//=========================================================================================

/// Wraps an activity's image query in the fixed photographic template.
pub fn image_prompt(query: &str) -> String {
    format!(
        "A high-quality, realistic travel photography of {query}. Scenery only, no people. Professional shot, 8k resolution, cinematic lighting, beautiful composition, highly detailed, photorealistic."
    )
}

//=========================================================================================
// Chat
//=========================================================================================

/// One chat call. The generator keeps no session, so `history` is resent in full.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub history: Vec<ChatMessage>,
    pub message: String,
    pub language: Language,
    pub plan_context: Option<TravelPlan>,
    pub plan_start_date: Option<String>,
}

impl ChatRequest {
    /// Renders the system instruction, stamping the real current date and time.
    pub fn system_instruction(&self, now: NaiveDateTime) -> String {
        let mut instruction = format!(
            "You are a helpful travel assistant. Answer in {}.\n**Current Real-World Date & Time**: {}\n",
            self.language.name(),
            now.format("%A, %B %-d, %Y %H:%M"),
        );

        instruction.push_str(
            "\n【Response Style】\n- Use **bullet points**.\n- Be concise and short.\n- Conclusion first.\n- Avoid long text.\n",
        );

        if let Some(plan) = &self.plan_context {
            instruction.push_str(&format!(
                "\nCurrent Plan Context:\n- Origin: {} -> {}\n- Days: {}\n- Transport: {}\n",
                plan.origin, plan.destination, plan.duration_in_days, plan.transportation_mode
            ));
            if let Some(start) = &self.plan_start_date {
                instruction.push_str(&format!("- Trip Start Date: {start}\n"));
            }
            let details = serde_json::to_string(&plan.plan).unwrap_or_default();
            instruction.push_str(&format!("- Details: {details}"));
        }

        instruction
    }
}

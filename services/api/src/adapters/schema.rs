//! services/api/src/adapters/schema.rs
//!
//! JSON schemas handed to the generator so its output parses into the domain model.

use serde_json::{json, Value};

/// Schema of one `TravelPlan`.
pub fn travel_plan_schema() -> Value {
    let string = |description: &str| json!({ "type": "string", "description": description });
    let strings = |description: &str| {
        json!({ "type": "array", "items": { "type": "string" }, "description": description })
    };

    let activity = json!({
        "type": "object",
        "properties": {
            "time": string("Start time (e.g. 10:30)."),
            "activityDuration": string("Duration of stay (e.g. 1 hour)."),
            "placeName": string("Name of the place."),
            "description": string("Description of the place/activity."),
            "imageQuery": string(
                "English image generation prompt for this location. MUST include specific details like season, weather and time of day to create a realistic atmosphere."
            ),
            "estimatedCost": string("Estimated cost for this activity (excluding transport)."),
            "suggestedRestaurants": strings("List of 5 recommended restaurants nearby if this is a meal time."),
            "transportDetails": string("Transport details to this location (e.g. line name, train name)."),
            "travelDuration": string("Travel duration including transfer time."),
            "transportationCost": string("Cost of transport to this location."),
            "transportDepartureTime": string("Precise departure time based on real timetables (e.g. 09:58)."),
            "transportArrivalTime": string("Precise arrival time based on real timetables (e.g. 12:16)."),
            "transportDepartureStation": string("Departure station/stop name."),
            "transportArrivalStation": string("Arrival station/stop name."),
            "transportDirection": string("Direction of train/bus (e.g. for Shinjuku)."),
        },
        "required": ["time", "activityDuration", "placeName", "description", "imageQuery"],
    });

    json!({
        "type": "object",
        "properties": {
            "transportationMode": string("Mode of transportation for this plan."),
            "origin": string("Origin city."),
            "destination": string("Destination city/country."),
            "durationInDays": { "type": "integer", "description": "Total duration in days." },
            "mainTransportationDetails": string("Details about main transportation from origin to destination."),
            "totalEstimatedCost": string("Total estimated cost."),
            "plan": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "day": { "type": "integer", "description": "Day number." },
                        "theme": string("Theme of the day."),
                        "dailyEstimatedCost": string("Daily estimated cost."),
                        "activities": { "type": "array", "items": activity },
                    },
                    "required": ["day", "theme", "activities"],
                },
            },
            "accommodations": {
                "type": "array",
                "description": "List of 5 recommended accommodations.",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": string("Hotel name."),
                        "description": string("Hotel description."),
                        "estimatedPrice": string("Price per night."),
                    },
                    "required": ["name", "description", "estimatedPrice"],
                },
            },
            "packingTips": {
                "type": "object",
                "properties": {
                    "luggageType": string("Recommended luggage type (e.g. Small Suitcase, Backpack) based on transport."),
                    "clothing": string("Recommended clothing based on season and days."),
                    "essentials": strings("3-5 essential items to bring."),
                    "amenitiesProvided": strings("3-5 standard amenities likely provided by the hotel that do not need to be packed."),
                    "preparations": strings("3-5 specific pre-trip to-do items."),
                },
                "required": ["luggageType", "clothing", "essentials", "amenitiesProvided", "preparations"],
            },
        },
        "required": [
            "transportationMode", "origin", "destination", "durationInDays",
            "plan", "totalEstimatedCost", "accommodations", "packingTips"
        ],
    })
}

/// Schema of a full generation. Structured output needs an object at the
/// root, so the plan list is wrapped in `{ "plans": [...] }`.
pub fn travel_plans_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "plans": {
                "type": "array",
                "items": travel_plan_schema(),
                "description": "List of travel plans based on different transportation modes.",
            },
        },
        "required": ["plans"],
    })
}

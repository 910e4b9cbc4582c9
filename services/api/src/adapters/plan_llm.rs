//! services/api/src/adapters/plan_llm.rs
//!
//! This module contains the adapter for the plan-generating LLM.
//! It implements the `PlanGenerationService` port from the `core` crate
//! against Gemini's OpenAI-compatible chat endpoint, using structured output.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{info, warn};
use travel_planner_core::{
    domain::TravelPlan,
    ports::{PlanGenerationService, PortError, PortResult},
    request::{GenerationRequest, RegenerationRequest},
};

use crate::adapters::schema::{travel_plan_schema, travel_plans_schema};

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$").expect("code fence pattern is valid")
});

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `PlanGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct GeminiPlanAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl GeminiPlanAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Sends one prompt constrained by `schema` and returns the raw reply text.
    async fn complete_json(&self, prompt: String, name: &str, schema: Value) -> PortResult<String> {
        let messages = vec![ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?,
        )];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .response_format(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    name: name.to_string(),
                    description: None,
                    schema: Some(schema),
                    strict: None,
                },
            })
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

//=========================================================================================
// `PlanGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl PlanGenerationService for GeminiPlanAdapter {
    async fn generate_full_plan(&self, request: &GenerationRequest) -> PortResult<Vec<TravelPlan>> {
        let text = self
            .complete_json(request.prompt(), "travel_plans", travel_plans_schema())
            .await?;
        let plans = parse_plans(&text);
        info!("Generator returned {} plan(s).", plans.len());
        Ok(plans)
    }

    async fn regenerate_plan(&self, request: &RegenerationRequest) -> PortResult<TravelPlan> {
        let text = self
            .complete_json(request.prompt(), "travel_plan", travel_plan_schema())
            .await?;
        parse_plan(&text)
    }
}

//=========================================================================================
// Response Parsing
//=========================================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum PlansPayload {
    List(Vec<TravelPlan>),
    Wrapped { plans: Vec<TravelPlan> },
}

fn strip_code_fences(text: &str) -> &str {
    match CODE_FENCE.captures(text).and_then(|captures| captures.get(1)) {
        Some(inner) => inner.as_str(),
        None => text.trim(),
    }
}

/// Parses a full-generation reply. Anything unusable degrades to no plans.
fn parse_plans(text: &str) -> Vec<TravelPlan> {
    let body = strip_code_fences(text);
    if body.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<PlansPayload>(body) {
        Ok(PlansPayload::List(plans)) | Ok(PlansPayload::Wrapped { plans }) => plans,
        Err(e) => {
            warn!("Discarding malformed plan list: {}", e);
            Vec::new()
        }
    }
}

/// Parses a regeneration reply, which must hold exactly one plan.
fn parse_plan(text: &str) -> PortResult<TravelPlan> {
    let body = strip_code_fences(text);
    if body.is_empty() {
        return Err(PortError::Unexpected("Generator returned no plan".to_string()));
    }
    serde_json::from_str(body)
        .map_err(|e| PortError::Unexpected(format!("Malformed regenerated plan: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"{"transportationMode":"Train","origin":"Tokyo","destination":"Kyoto","durationInDays":2,
        "plan":[{"day":1,"theme":"Temples","activities":[{"time":"09:00","placeName":"Kinkaku-ji","imageQuery":"golden pavilion"}]}]}"#;

    #[test]
    fn accepts_bare_array() {
        let plans = parse_plans(&format!("[{PLAN}]"));
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].plan[0].activities[0].place_name, "Kinkaku-ji");
        assert_eq!(plans[0].accommodations, None);
    }

    #[test]
    fn accepts_wrapped_and_fenced_reply() {
        let text = format!("```json\n{{\"plans\": [{PLAN}, {PLAN}]}}\n```");
        assert_eq!(parse_plans(&text).len(), 2);
    }

    #[test]
    fn malformed_or_empty_reply_yields_no_plans() {
        assert!(parse_plans("").is_empty());
        assert!(parse_plans("Sorry, I cannot help with that.").is_empty());
        assert!(parse_plans("{\"plans\": 3}").is_empty());
    }

    #[test]
    fn regeneration_requires_a_plan() {
        assert_eq!(parse_plan(PLAN).unwrap().transportation_mode, "Train");
        assert!(parse_plan("```\n```").is_err());
        assert!(parse_plan("not json").is_err());
    }
}

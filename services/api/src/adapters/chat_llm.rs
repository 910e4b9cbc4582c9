//! services/api/src/adapters/chat_llm.rs
//!
//! This module contains the adapter for the travel-assistant chat LLM.
//! It implements the `ChatService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use chrono::Local;
use travel_planner_core::{
    domain::{ChatMessage, ChatRole},
    ports::{ChatService, PortError, PortResult},
    request::ChatRequest,
};

/// Reply used when the model answers with no text.
pub const EMPTY_CHAT_REPLY: &str = "Error generating response.";

#[derive(Clone)]
pub struct GeminiChatAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl GeminiChatAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

fn to_request_message(message: &ChatMessage) -> PortResult<ChatCompletionRequestMessage> {
    let converted = match message.role {
        ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(message.text.clone())
            .build()
            .map(ChatCompletionRequestMessage::User),
        ChatRole::Model => ChatCompletionRequestAssistantMessageArgs::default()
            .content(message.text.clone())
            .build()
            .map(ChatCompletionRequestMessage::Assistant),
    };
    converted.map_err(|e| PortError::Unexpected(e.to_string()))
}

#[async_trait]
impl ChatService for GeminiChatAdapter {
    /// Sends the whole conversation plus the new message and returns the reply text.
    async fn send_chat_message(&self, request: &ChatRequest) -> PortResult<String> {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system_instruction(Local::now().naive_local()))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?,
        ));
        for message in &request.history {
            messages.push(to_request_message(message)?);
        }
        messages.push(to_request_message(&ChatMessage::user(request.message.clone()))?);

        let completion = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(completion)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let reply = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| EMPTY_CHAT_REPLY.to_string());
        Ok(reply)
    }
}

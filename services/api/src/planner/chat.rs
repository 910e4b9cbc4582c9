//! services/api/src/planner/chat.rs
//!
//! The travel-assistant conversation: a persisted message log and the send action.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use travel_planner_core::domain::{ChatMessage, Language, TravelPlan};
use travel_planner_core::ports::{ChatService, DurableStorage, Persisted};
use travel_planner_core::request::ChatRequest;

pub const CHAT_LOG_KEY: &str = "ai_tour_chat_messages";
pub const CHAT_WELCOME: &str =
    "Hi! I'm your travel assistant. Ask me anything about your trip or the current plan.";
pub const CHAT_ERROR_REPLY: &str = "Sorry, something went wrong. Please try again.";

/// What the conversation is about at the time a message is sent.
#[derive(Debug, Clone, Default)]
pub struct ChatContext {
    pub language: Language,
    pub plan: Option<TravelPlan>,
    pub start_date: Option<String>,
}

pub struct ChatSession {
    service: Arc<dyn ChatService>,
    storage: Arc<dyn DurableStorage>,
    messages: Mutex<Vec<ChatMessage>>,
    // Held for the duration of one exchange; a second send while held is ignored.
    in_flight: Mutex<()>,
}

impl ChatSession {
    /// Loads the stored conversation. Missing or unreadable data starts empty.
    pub async fn load(service: Arc<dyn ChatService>, storage: Arc<dyn DurableStorage>) -> Self {
        let messages = match storage.load(CHAT_LOG_KEY).await {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!("Stored chat log is corrupt, starting empty: {}", e);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to load chat log, starting empty: {}", e);
                Vec::new()
            }
        };

        Self {
            service,
            storage,
            messages: Mutex::new(messages),
            in_flight: Mutex::new(()),
        }
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.messages.lock().await.clone()
    }

    /// Greets the user when the conversation is opened for the first time.
    pub async fn open(&self) -> Vec<ChatMessage> {
        let mut messages = self.messages.lock().await;
        if messages.is_empty() {
            messages.push(ChatMessage::model(CHAT_WELCOME));
            self.persist(&messages).await;
        }
        messages.clone()
    }

    /// Sends one user message and records the reply.
    ///
    /// Returns `None` without doing anything for a blank message or while
    /// another message is still being answered. A failed call is answered with
    /// a generic error reply.
    pub async fn send(&self, message: &str, context: ChatContext) -> Option<ChatMessage> {
        let message = message.trim();
        if message.is_empty() {
            return None;
        }
        let Ok(_exchange) = self.in_flight.try_lock() else {
            info!("Chat message ignored while a reply is pending.");
            return None;
        };

        let history = {
            let mut messages = self.messages.lock().await;
            let history = messages.clone();
            messages.push(ChatMessage::user(message));
            self.persist(&messages).await;
            history
        };

        let request = ChatRequest {
            history,
            message: message.to_string(),
            language: context.language,
            plan_context: context.plan,
            plan_start_date: context.start_date,
        };
        let reply = match self.service.send_chat_message(&request).await {
            Ok(text) => ChatMessage::model(text),
            Err(e) => {
                error!("Chat error: {}", e);
                ChatMessage::model(CHAT_ERROR_REPLY)
            }
        };

        let mut messages = self.messages.lock().await;
        messages.push(reply.clone());
        self.persist(&messages).await;
        Some(reply)
    }

    async fn persist(&self, messages: &[ChatMessage]) -> Persisted {
        let result = match serde_json::to_string(messages) {
            Ok(json) => self.storage.save(CHAT_LOG_KEY, &json).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match result {
            Ok(()) => Persisted::Saved,
            Err(reason) => {
                error!("Failed to save chat log: {}", reason);
                Persisted::Degraded(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::testing::{plan_with_places, MemoryStorage, MockChat};
    use travel_planner_core::domain::ChatRole;

    async fn session() -> (ChatSession, Arc<MockChat>, Arc<MemoryStorage>) {
        let chat = Arc::new(MockChat::default());
        let storage = Arc::new(MemoryStorage::default());
        let session = ChatSession::load(chat.clone(), storage.clone()).await;
        (session, chat, storage)
    }

    #[tokio::test]
    async fn resends_full_history_each_call() {
        let (session, chat, _) = session().await;
        session.open().await;

        session.send("Best ramen?", ChatContext::default()).await.unwrap();
        let reply = session.send("And sushi?", ChatContext::default()).await.unwrap();

        assert_eq!(reply.text, "re: And sushi?");
        let requests = chat.requests.lock().unwrap();
        assert_eq!(requests[0].history.len(), 1);
        assert_eq!(requests[1].history.len(), 3);
        assert_eq!(requests[1].history[1], ChatMessage::user("Best ramen?"));
        assert_eq!(session.messages().await.len(), 5);
    }

    #[tokio::test]
    async fn plan_context_is_forwarded() {
        let (session, chat, _) = session().await;
        let context = ChatContext {
            language: Language::En,
            plan: Some(plan_with_places("Train", &[&["Shrine"]])),
            start_date: Some("2024-05-01".into()),
        };

        session.send("What to wear?", context).await;

        let requests = chat.requests.lock().unwrap();
        assert_eq!(requests[0].language, Language::En);
        assert_eq!(requests[0].plan_start_date.as_deref(), Some("2024-05-01"));
        assert!(requests[0].plan_context.is_some());
    }

    #[tokio::test]
    async fn failure_becomes_an_error_reply() {
        let (session, chat, _) = session().await;
        chat.set_failing(true);

        let reply = session.send("Hello", ChatContext::default()).await.unwrap();

        assert_eq!(reply, ChatMessage::model(CHAT_ERROR_REPLY));
        assert_eq!(session.messages().await[0].role, ChatRole::User);
    }

    #[tokio::test]
    async fn blank_messages_are_ignored() {
        let (session, chat, _) = session().await;
        assert!(session.send("   ", ChatContext::default()).await.is_none());
        assert!(chat.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn log_survives_reload() {
        let (session, chat, storage) = session().await;
        session.open().await;
        session.send("Hello", ChatContext::default()).await;

        let reloaded = ChatSession::load(chat, storage).await;
        assert_eq!(reloaded.messages().await, session.messages().await);
        assert_eq!(reloaded.open().await.len(), 3);
    }
}

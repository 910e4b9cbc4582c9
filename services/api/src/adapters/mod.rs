pub mod chat_llm;
pub mod image_llm;
pub mod plan_llm;
pub mod schema;
pub mod storage;

pub use chat_llm::GeminiChatAdapter;
pub use image_llm::GeminiImageAdapter;
pub use plan_llm::GeminiPlanAdapter;
pub use storage::JsonFileStorage;

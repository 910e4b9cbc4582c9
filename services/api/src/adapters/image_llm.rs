//! services/api/src/adapters/image_llm.rs
//!
//! Implements `ImageGenerationService` with the image endpoint of the
//! OpenAI-compatible API. Images come back base64-encoded and are handed on
//! as inline data URLs.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::images::{CreateImageRequestArgs, Image, ImageModel, ImageResponseFormat},
    Client,
};
use async_trait::async_trait;
use tracing::debug;
use travel_planner_core::{
    ports::{ImageGenerationService, PortError, PortResult},
    request::image_prompt,
};

#[derive(Clone)]
pub struct GeminiImageAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl GeminiImageAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl ImageGenerationService for GeminiImageAdapter {
    async fn generate_image(&self, query: &str) -> PortResult<Option<String>> {
        let request = CreateImageRequestArgs::default()
            .model(ImageModel::Other(self.model.clone()))
            .prompt(image_prompt(query))
            .n(1)
            .response_format(ImageResponseFormat::B64Json)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .images()
            .generate(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let image = response.data.first().and_then(|image| match image.as_ref() {
            Image::B64Json { b64_json, .. } => Some(data_url(b64_json)),
            Image::Url { .. } => None,
        });
        if image.is_none() {
            debug!("Image endpoint returned no inline image for '{}'.", query);
        }
        Ok(image)
    }
}

fn data_url(b64: &str) -> String {
    format!("data:image/png;base64,{b64}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_payload_as_png_data_url() {
        assert_eq!(data_url("iVBORw0"), "data:image/png;base64,iVBORw0");
    }
}

//! HTTP client for an OpenAI-compatible API.

use std::time::Duration;

use async_trait::async_trait;
use framesmith_core::text_generation::{TextGenerationError, TextGenerator, ToolSegment};

use crate::config::LlmConfig;
use crate::wire::{
    ChatRequest, ChatResponse, CodeToolRequest, CodeToolResponse, ContainerResponse,
    CreateContainerRequest,
};

/// Text-generation client for a single API endpoint.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    code_model: String,
}

impl OpenAiClient {
    /// Build a client from configuration.
    pub fn new(config: &LlmConfig) -> Result<Self, TextGenerationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(transport)?;
        Ok(Self::with_client(client, config))
    }

    /// Build a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &LlmConfig) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            code_model: config.code_model.clone(),
        }
    }

    /// Allocate a sandbox container for one code-tool request.
    async fn create_container(&self) -> Result<String, TextGenerationError> {
        let body = CreateContainerRequest {
            name: format!("framesmith-{}", uuid::Uuid::new_v4()),
        };
        let response = self
            .client
            .post(format!("{}/containers", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        let container: ContainerResponse = Self::parse_response(response).await?;
        Ok(container.id)
    }

    /// Release a container. Failures are logged and otherwise ignored.
    async fn delete_container(&self, container_id: &str) {
        let result = self
            .client
            .delete(format!("{}/containers/{container_id}", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(container_id, "Code execution container deleted");
            }
            Ok(response) => {
                tracing::warn!(
                    container_id,
                    status = response.status().as_u16(),
                    "Failed to delete code execution container",
                );
            }
            Err(e) => {
                tracing::warn!(container_id, error = %e, "Failed to delete code execution container");
            }
        }
    }

    async fn request_code_tool(
        &self,
        system: &str,
        user: &str,
        container_id: &str,
    ) -> Result<Vec<ToolSegment>, TextGenerationError> {
        let body = CodeToolRequest::new(&self.code_model, system, user, container_id);
        let response = self
            .client
            .post(format!("{}/responses", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        let parsed: CodeToolResponse = Self::parse_response(response).await?;
        let segments = parsed.into_segments();
        if segments.is_empty() {
            return Err(TextGenerationError::EmptyResponse);
        }
        Ok(segments)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code, turning any other
    /// status into [`TextGenerationError::Api`] carrying the body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, TextGenerationError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(TextGenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, TextGenerationError> {
        let response = Self::ensure_success(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| TextGenerationError::Decode(e.to_string()))
    }
}

fn transport(e: reqwest::Error) -> TextGenerationError {
    TextGenerationError::Transport(e.to_string())
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, TextGenerationError> {
        let body = ChatRequest::new(&self.model, system, user);
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        let parsed: ChatResponse = Self::parse_response(response).await?;
        parsed.into_text().ok_or(TextGenerationError::EmptyResponse)
    }

    async fn complete_with_code_tool(
        &self,
        system: &str,
        user: &str,
    ) -> Result<Vec<ToolSegment>, TextGenerationError> {
        let container_id = self.create_container().await?;
        tracing::debug!(container_id = %container_id, "Code execution container created");

        let result = self.request_code_tool(system, user, &container_id).await;
        self.delete_container(&container_id).await;
        result
    }
}

use std::time::Duration;

use async_trait::async_trait;
use framesmith_core::render::{RenderError, RenderOutcome, RenderRequest, Renderer};
use framesmith_core::render_params::{frame_dimensions, quality_for_resolution};
use serde::Serialize;

use crate::config::RendererConfig;

/// HTTP client for a renderer instance.
pub struct RenderApi {
    client: reqwest::Client,
    api_url: String,
}

/// Body of `POST /render`.
#[derive(Debug, Serialize)]
pub struct RenderBody<'a> {
    pub code: &'a str,
    pub scene_name: &'a str,
    pub upload_target: &'a str,
    pub resolution: &'a str,
    pub aspect_ratio: &'a str,
    pub duration: u32,
    pub style: &'a str,
    /// Quality flag passed to the renderer CLI, e.g. `-qh`.
    pub quality: &'static str,
    pub width: u32,
    pub height: u32,
}

impl<'a> RenderBody<'a> {
    pub fn from_request(request: &'a RenderRequest) -> Self {
        let (width, height) = frame_dimensions(&request.resolution, &request.aspect_ratio);
        Self {
            code: &request.code,
            scene_name: &request.scene_name,
            upload_target: &request.upload_target,
            resolution: &request.resolution,
            aspect_ratio: &request.aspect_ratio,
            duration: request.duration_secs,
            style: &request.style,
            quality: quality_for_resolution(&request.resolution).flag(),
            width,
            height,
        }
    }
}

impl RenderApi {
    pub fn new(config: &RendererConfig) -> Result<Self, RenderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RenderError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, config.url.clone()))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self { client, api_url }
    }

    // ---- private helpers ----

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, RenderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(RenderError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RenderError> {
        let response = Self::ensure_success(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| RenderError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Renderer for RenderApi {
    async fn render(&self, request: RenderRequest) -> Result<RenderOutcome, RenderError> {
        let body = RenderBody::from_request(&request);
        tracing::debug!(
            scene_name = %request.scene_name,
            quality = body.quality,
            width = body.width,
            height = body.height,
            "Submitting scene to renderer",
        );

        let response = self
            .client
            .post(format!("{}/render", self.api_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| RenderError::Transport(e.to_string()))?;

        Self::parse_response(response).await
    }
}

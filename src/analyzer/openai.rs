//! OpenAI Chat Completions（Vision）連携
//!
//! `response_format: json_object` を指定してJSONオブジェクトのみを返させる

use super::{ensure_success, http_client, ImagePayload, VisionCapability};
use async_trait::async_trait;
use serde_json::json;
use shop_lens_common::{ExtractionError, EXTRACTION_USER_PROMPT};
use std::time::Duration;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiVision {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: String,
}

impl OpenAiVision {
    pub fn new(api_key: String, model: String, max_tokens: u32, timeout: Duration) -> Result<Self, ExtractionError> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            model,
            max_tokens,
            base_url: OPENAI_API_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn request_body(&self, image: &ImagePayload, instruction: &str) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": instruction },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": EXTRACTION_USER_PROMPT },
                        { "type": "image_url", "image_url": { "url": image.data_url() } }
                    ]
                }
            ],
            "response_format": { "type": "json_object" },
            "max_tokens": self.max_tokens
        })
    }
}

#[async_trait]
impl VisionCapability for OpenAiVision {
    fn name(&self) -> &str {
        "openai"
    }

    async fn describe(&self, image: &ImagePayload, instruction: &str) -> Result<String, ExtractionError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(image, instruction))
            .send()
            .await
            .map_err(|e| ExtractionError::Capability(format!("OpenAI API呼び出しエラー: {}", e)))?;

        let payload = ensure_success(response).await?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ExtractionError::Parse("OpenAIレスポンスにcontentがありません".into()))
    }
}

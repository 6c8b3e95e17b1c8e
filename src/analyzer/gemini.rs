//! Gemini generateContent 連携

use super::{ensure_success, http_client, ImagePayload, VisionCapability};
use async_trait::async_trait;
use serde_json::json;
use shop_lens_common::{ExtractionError, EXTRACTION_USER_PROMPT};
use std::time::Duration;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiVision {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: String,
}

impl GeminiVision {
    pub fn new(api_key: String, model: String, max_tokens: u32, timeout: Duration) -> Result<Self, ExtractionError> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key,
            model,
            max_tokens,
            base_url: GEMINI_API_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn request_body(&self, image: &ImagePayload, instruction: &str) -> serde_json::Value {
        json!({
            "contents": [
                {
                    "parts": [
                        { "text": format!("{}\n\n{}", instruction, EXTRACTION_USER_PROMPT) },
                        { "inline_data": { "mime_type": image.mime_type, "data": image.to_base64() } }
                    ]
                }
            ],
            "generationConfig": {
                "temperature": 0.1,
                "responseMimeType": "application/json",
                "maxOutputTokens": self.max_tokens
            }
        })
    }
}

#[async_trait]
impl VisionCapability for GeminiVision {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn describe(&self, image: &ImagePayload, instruction: &str) -> Result<String, ExtractionError> {
        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, self.model))
            .query(&[("key", self.api_key.as_str())])
            .json(&self.request_body(image, instruction))
            .send()
            .await
            .map_err(|e| ExtractionError::Capability(format!("Gemini API呼び出しエラー: {}", e)))?;

        let payload = ensure_success(response).await?;

        payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ExtractionError::Parse("Geminiレスポンスにtextがありません".into()))
    }
}

//! 画像属性の抽出
//!
//! Vision APIに画像を渡し、レスポンスを VisualAttributes に変換する。
//! API呼び出しは `VisionCapability` トレイトの裏に隠し、
//! OpenAI / Gemini / Claude CLI を切り替えられるようにする。

pub mod cache;
mod claude_cli;
mod gemini;
mod openai;

pub use cache::CacheFile;
pub use claude_cli::ClaudeCliVision;
pub use gemini::GeminiVision;
pub use openai::OpenAiVision;

use crate::ai_provider::AiProvider;
use crate::config::Config;
use async_trait::async_trait;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use shop_lens_common::{build_extraction_prompt, parse_attributes_response, ExtractionError, VisualAttributes};
use std::time::Duration;

/// Vision APIに渡す画像
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }

    /// `data:image/jpeg;base64,...` 形式
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// 画像内容のSHA-256（キャッシュキー）
    pub fn content_hash(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }
}

/// 画像を構造化テキストで説明する外部機能
#[async_trait]
pub trait VisionCapability: Send + Sync {
    /// ログ表示用の名前
    fn name(&self) -> &str;

    /// 指示文に従って画像を説明し、生のテキストを返す
    async fn describe(&self, image: &ImagePayload, instruction: &str) -> Result<String, ExtractionError>;
}

/// 属性抽出器
pub struct AttributeExtractor {
    capability: Box<dyn VisionCapability>,
}

impl AttributeExtractor {
    pub fn new(capability: Box<dyn VisionCapability>) -> Self {
        Self { capability }
    }

    pub fn capability_name(&self) -> &str {
        self.capability.name()
    }

    /// 画像から視覚属性を抽出
    ///
    /// API呼び出しの失敗・JSONとして読めないレスポンスは `ExtractionError`。
    /// 欠落フィールドは既定値で補完する。
    pub async fn extract(&self, image: &ImagePayload) -> Result<VisualAttributes, ExtractionError> {
        let instruction = build_extraction_prompt();
        let response = self.capability.describe(image, &instruction).await?;
        tracing::debug!(
            file = %image.file_name,
            provider = self.capability.name(),
            chars = response.len(),
            "Vision APIレスポンス受信"
        );

        parse_attributes_response(&response)
    }

    /// キャッシュを参照してから抽出（成功した結果のみ保存）
    pub async fn extract_cached(
        &self,
        image: &ImagePayload,
        cache: &mut CacheFile,
    ) -> Result<VisualAttributes, ExtractionError> {
        let hash = image.content_hash();
        if let Some(cached) = cache.get(&hash) {
            tracing::debug!(file = %image.file_name, "キャッシュヒット");
            return Ok(cached.clone());
        }

        let attributes = self.extract(image).await?;
        cache.insert(
            hash,
            image.file_name.clone(),
            self.capability.name().to_string(),
            attributes.clone(),
        );
        Ok(attributes)
    }
}

/// 設定からVisionプロバイダを構築
pub fn build_capability(config: &Config) -> crate::error::Result<Box<dyn VisionCapability>> {
    let timeout = Duration::from_secs(config.timeout_seconds);
    let model = config.model().to_string();

    let capability: Box<dyn VisionCapability> = match config.provider {
        AiProvider::OpenAi => {
            let mut vision = OpenAiVision::new(config.get_api_key()?, model, config.max_tokens, timeout)?;
            if let Some(base_url) = &config.base_url {
                vision = vision.with_base_url(base_url);
            }
            Box::new(vision)
        }
        AiProvider::Gemini => {
            let mut vision = GeminiVision::new(config.get_api_key()?, model, config.max_tokens, timeout)?;
            if let Some(base_url) = &config.base_url {
                vision = vision.with_base_url(base_url);
            }
            Box::new(vision)
        }
        AiProvider::Claude => Box::new(ClaudeCliVision::new(model, timeout)),
    };

    Ok(capability)
}

/// HTTPクライアントを構築（タイムアウトは設定値）
fn http_client(timeout: Duration) -> Result<reqwest::Client, ExtractionError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ExtractionError::Capability(format!("HTTPクライアント初期化エラー: {}", e)))
}

/// 成功以外のHTTPステータスをエラーに変換
async fn ensure_success(response: reqwest::Response) -> Result<serde_json::Value, ExtractionError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let preview: String = body.chars().take(300).collect();
        return Err(ExtractionError::Capability(format!("HTTP {}: {}", status, preview)));
    }

    response
        .json()
        .await
        .map_err(|e| ExtractionError::Capability(format!("レスポンス読み込みエラー: {}", e)))
}

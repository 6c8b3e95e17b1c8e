use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    #[value(name = "openai")]
    OpenAi,
    Gemini,
    Claude,
}

impl AiProvider {
    pub fn name(&self) -> &'static str {
        match self {
            AiProvider::OpenAi => "openai",
            AiProvider::Gemini => "gemini",
            AiProvider::Claude => "claude",
        }
    }

    /// 設定でモデル未指定のときに使うモデル
    pub fn default_model(&self) -> &'static str {
        match self {
            AiProvider::OpenAi => "gpt-4o",
            AiProvider::Gemini => "gemini-2.0-flash",
            AiProvider::Claude => "sonnet",
        }
    }

    /// APIキーの環境変数（CLI経由のプロバイダは不要）
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            AiProvider::OpenAi => Some("OPENAI_API_KEY"),
            AiProvider::Gemini => Some("GEMINI_API_KEY"),
            AiProvider::Claude => None,
        }
    }
}

impl std::fmt::Display for AiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

use crate::ai_provider::AiProvider;
use crate::error::{Result, ShopLensError};
use serde::{Deserialize, Serialize};
use shop_lens_common::{Matcher, RankingLimits, ScoringWeights, DEFAULT_MAX_TOKENS};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub provider: AiProvider,
    /// プロバイダ名 → APIキー（環境変数が優先）
    pub api_keys: BTreeMap<String, String>,
    /// 未指定ならプロバイダの既定モデル
    pub model: Option<String>,
    /// APIのベースURL（テスト・プロキシ用）
    pub base_url: Option<String>,
    pub max_tokens: u32,
    /// 長辺の最大ピクセル数（0で縮小しない）
    pub max_image_size: u32,
    pub timeout_seconds: u64,
    pub weights: ScoringWeights,
    pub limits: RankingLimits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: AiProvider::default(),
            api_keys: BTreeMap::new(),
            model: None,
            base_url: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            max_image_size: 1568,
            timeout_seconds: 120,
            weights: ScoringWeights::default(),
            limits: RankingLimits::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_json::from_str::<Config>(&content)?
        } else {
            Self::default()
        };

        config.weights.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ShopLensError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("shop-lens").join("config.json"))
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn get_api_key(&self) -> Result<String> {
        let Some(env_name) = self.provider.api_key_env() else {
            return Ok(String::new());
        };

        // 環境変数を優先
        if let Ok(key) = std::env::var(env_name) {
            if !key.trim().is_empty() {
                return Ok(key);
            }
        }

        self.api_keys
            .get(self.provider.name())
            .filter(|key| !key.trim().is_empty())
            .cloned()
            .ok_or(ShopLensError::MissingApiKey(env_name))
    }

    /// 指定プロバイダのキーとして保存
    pub fn set_api_key(&mut self, provider: AiProvider, key: String) -> Result<()> {
        self.api_keys.insert(provider.name().to_string(), key);
        self.save()
    }

    pub fn matcher(&self) -> Matcher {
        Matcher::new(self.weights.clone(), self.limits.clone())
    }
}

use shop_lens_common::{ExtractionError, InvalidWeights};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShopLensError {
    #[error("画像解析に失敗しました（しばらくしてから再試行してください）: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。`shop-lens config --set-api-key YOUR_KEY` または環境変数 {0} で設定してください")]
    MissingApiKey(&'static str),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("カタログ読み込みエラー: {0}")]
    CatalogLoad(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),
}

impl From<InvalidWeights> for ShopLensError {
    fn from(err: InvalidWeights) -> Self {
        ShopLensError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShopLensError>;

//! エラー型定義

use thiserror::Error;

/// 属性抽出エラー
///
/// 抽出処理で発生し得る唯一のエラー。
/// フィールド欠落はエラーにせず既定値で補完する。
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Vision APIの呼び出し自体が失敗（通信・認証・クォータ等）
    #[error("Vision capability error: {0}")]
    Capability(String),

    /// レスポンスからJSONオブジェクトを取り出せない
    #[error("Extraction parse error: {0}")]
    Parse(String),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, ExtractionError>;

//! 画像検索の型定義
//!
//! CLIと検索パイプラインで共有される型:
//! - VisualAttributes: 属性抽出の出力
//! - CatalogItem / CatalogEntry: 照合対象の商品
//! - ScoredCandidate: ランキング中のスコア付き候補

use serde::{Deserialize, Serialize};

/// 画像から抽出した視覚属性
///
/// リストは空、文字列は空文字が既定値。照合側にnullが渡ることはない。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualAttributes {
    pub objects: Vec<String>,
    pub colors: Vec<String>,
    pub materials: Vec<String>,
    pub categories: Vec<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
}

impl VisualAttributes {
    /// 照合に使える情報が一つもないか
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
            && self.colors.is_empty()
            && self.materials.is_empty()
            && self.categories.is_empty()
            && self.description.trim().is_empty()
            && self.brand.as_deref().map_or(true, |b| b.trim().is_empty())
    }

    /// あいまい照合用のクエリ文字列
    ///
    /// 説明文 + 物体 + カテゴリ + 色 + 素材 をスペース区切りで連結
    pub fn fuzzy_query(&self) -> String {
        std::iter::once(self.description.as_str())
            .chain(self.objects.iter().map(String::as_str))
            .chain(self.categories.iter().map(String::as_str))
            .chain(self.colors.iter().map(String::as_str))
            .chain(self.materials.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// 照合対象として読まれる商品のテキスト項目
///
/// 呼び出し側の商品レコードをコピーせずにランキングするためのトレイト
pub trait CatalogItem {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn category(&self) -> Option<&str>;

    /// 名前・説明・カテゴリを連結して小文字化したテキスト
    fn product_text(&self) -> String {
        [self.name(), self.description(), self.category().unwrap_or("")]
            .join(" ")
            .to_lowercase()
    }
}

/// 最小限の商品エントリ
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogEntry {
    pub name: String,
    pub description: String,
    pub category: Option<String>,
}

impl CatalogEntry {
    pub fn new(name: &str, description: &str, category: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            category: category.map(str::to_string),
        }
    }
}

impl CatalogItem for CatalogEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

/// スコア付き候補（ランキング中のみ存在）
#[derive(Debug, Clone)]
pub struct ScoredCandidate<'a, T> {
    pub product: &'a T,
    /// カタログ内の位置
    pub index: usize,
    pub score: u32,
    /// 監査ログ用の加点理由
    pub reasons: Vec<String>,
}

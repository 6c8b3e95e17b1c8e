//! 商品カタログ
//!
//! 検索対象は販売可能な商品のみ。最終更新が新しい順に並べて返す。
//! ファイル形式は JSON（商品の配列）と Excel（先頭シートのヘッダ行付き表）。

mod excel;
pub mod price;

use crate::error::{Result, ShopLensError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shop_lens_common::CatalogItem;
use std::path::{Path, PathBuf};

/// 販売状態
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    #[default]
    Available,
    Unavailable,
}

impl std::str::FromStr for Availability {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "available" | "true" | "yes" | "1" => Ok(Availability::Available),
            "unavailable" | "false" | "no" | "0" => Ok(Availability::Unavailable),
            _ => Err(format!("Unknown availability: {}", s)),
        }
    }
}

/// 商品レコード
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    /// 価格（AED、文字列で保持）
    #[serde(default)]
    pub price: String,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub image_url: Option<String>,

    #[serde(default)]
    pub is_available: Availability,

    /// 在庫数（未設定は無制限）
    #[serde(default)]
    pub stock_quantity: Option<String>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn is_searchable(&self) -> bool {
        self.is_available == Availability::Available
    }
}

impl CatalogItem for Product {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }
}

/// 販売可能な商品を供給するストア
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn available_products(&self) -> Result<Vec<Product>>;
}

/// 販売可能な商品だけを最終更新の新しい順に並べる（更新日時なしは末尾）
pub fn select_available(products: Vec<Product>) -> Vec<Product> {
    let mut available: Vec<Product> = products.into_iter().filter(Product::is_searchable).collect();
    available.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    available
}

/// メモリ上のカタログ
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    products: Vec<Product>,
}

impl MemoryCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn available_products(&self) -> Result<Vec<Product>> {
        Ok(select_available(self.products.clone()))
    }
}

/// ファイルから読むカタログ（.json / .xlsx）
#[derive(Debug, Clone)]
pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 全商品を読み込む（販売状態で絞り込まない）
    pub fn load_all(&self) -> Result<Vec<Product>> {
        if !self.path.exists() {
            return Err(ShopLensError::FileNotFound(self.path.display().to_string()));
        }

        let extension = self
            .path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "json" => {
                let content = std::fs::read_to_string(&self.path)?;
                serde_json::from_str(&content)
                    .map_err(|e| ShopLensError::CatalogLoad(format!("{}: {}", self.path.display(), e)))
            }
            "xlsx" | "xlsm" | "xls" | "ods" => excel::read_products(&self.path),
            other => Err(ShopLensError::CatalogLoad(format!(
                "対応していないカタログ形式です: .{}",
                other
            ))),
        }
    }
}

#[async_trait]
impl CatalogStore for FileCatalog {
    async fn available_products(&self) -> Result<Vec<Product>> {
        let products = self.load_all()?;
        let total = products.len();
        let available = select_available(products);
        tracing::debug!(
            path = %self.path.display(),
            total,
            available = available.len(),
            "カタログ読み込み"
        );
        Ok(available)
    }
}

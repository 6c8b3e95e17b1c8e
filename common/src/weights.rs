//! スコアリングの重みと絞り込み条件
//!
//! 既定値は現行の検索挙動そのもの。設定ファイルで上書きできるが、
//! シグナル間の優先順位を崩す値は `validate` で拒否する。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 重みテーブルが不正
#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid scoring weights: {0}")]
pub struct InvalidWeights(pub String);

/// シグナルごとの加点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringWeights {
    /// 物体1件あたり
    pub object: u32,
    /// カテゴリ1件あたり
    pub category: u32,
    /// 色1件あたり
    pub color: u32,
    /// 素材1件あたり
    pub material: u32,
    /// ブランド一致（1回のみ）
    pub brand: u32,
    /// あいまい照合の最大加点
    pub fuzzy_max: u32,
    /// あいまい照合で受理する正規化距離の上限
    pub fuzzy_threshold: f64,
    /// 小規模カタログ救済の加点
    pub small_catalog_fallback: u32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            object: 40,
            category: 30,
            color: 20,
            material: 15,
            brand: 50,
            fuzzy_max: 30,
            fuzzy_threshold: 0.7,
            small_catalog_fallback: 10,
        }
    }
}

impl ScoringWeights {
    /// 優先順位と値域をチェック
    ///
    /// 物体 > カテゴリ >= あいまい最大 > 色 > 素材 > 0、ブランド > カテゴリ
    pub fn validate(&self) -> Result<(), InvalidWeights> {
        let checks = [
            (self.object > self.category, "object must outweigh category"),
            (self.brand > self.category, "brand must outweigh category"),
            (self.category >= self.fuzzy_max, "category must not be below fuzzyMax"),
            (self.fuzzy_max > self.color, "fuzzyMax must outweigh color"),
            (self.color > self.material, "color must outweigh material"),
            (self.material > 0, "material must be positive"),
            (
                self.fuzzy_threshold > 0.0 && self.fuzzy_threshold <= 1.0,
                "fuzzyThreshold must be in (0, 1]",
            ),
        ];

        match checks.iter().find(|(ok, _)| !ok) {
            Some((_, message)) => Err(InvalidWeights((*message).to_string())),
            None => Ok(()),
        }
    }
}

/// 絞り込み・件数の条件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RankingLimits {
    /// 返す最大件数
    pub max_results: usize,
    /// このスコアを超えた候補のみ残す
    pub min_score: u32,
    /// この件数以下のカタログでは0点の商品に救済点を与える
    pub fallback_catalog_size: usize,
    /// この件数以下のカタログでは全商品を残す
    pub include_all_catalog_size: usize,
}

impl Default for RankingLimits {
    fn default() -> Self {
        Self {
            max_results: 8,
            min_score: 5,
            fallback_catalog_size: 5,
            include_all_catalog_size: 3,
        }
    }
}

//! 画像属性と商品カタログの照合
//!
//! 独立したシグナル関数の列で各商品を採点し、合計点で並べ替える。
//! シグナルを増やすときは `SIGNALS` に関数を追加する。
//!
//! ## 処理フロー
//! 1. シグナルごとの加点を合計
//! 2. 0点かつ小規模カタログなら救済点
//! 3. 閾値で絞り込み（極小カタログは全件残す）
//! 4. スコア降順で安定ソートし上位N件

use crate::fuzzy::fuzzy_match;
use crate::types::{CatalogItem, ScoredCandidate, VisualAttributes};
use crate::weights::{RankingLimits, ScoringWeights};

/// シグナル関数に渡す採点コンテキスト
pub struct SignalContext<'a> {
    pub attributes: &'a VisualAttributes,
    /// 名前・説明・カテゴリを連結して小文字化したテキスト
    pub product_text: &'a str,
    /// 商品カテゴリ（小文字）
    pub category: Option<&'a str>,
    pub weights: &'a ScoringWeights,
}

/// シグナルの加点と理由
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalHit {
    pub points: u32,
    pub reason: String,
}

/// 採点シグナル
pub type Signal = fn(&SignalContext<'_>) -> Option<SignalHit>;

/// 適用順のシグナル一覧
pub const SIGNALS: &[Signal] = &[
    object_signal,
    category_signal,
    color_signal,
    material_signal,
    brand_signal,
    fuzzy_signal,
];

/// 物体名の一致（1件ごとに加点）
pub fn object_signal(ctx: &SignalContext<'_>) -> Option<SignalHit> {
    per_term_hit(
        &ctx.attributes.objects,
        ctx.weights.object,
        "Matches objects",
        |term| ctx.product_text.contains(term),
    )
}

/// カテゴリの一致（商品テキストまたは商品カテゴリに含まれる）
pub fn category_signal(ctx: &SignalContext<'_>) -> Option<SignalHit> {
    per_term_hit(
        &ctx.attributes.categories,
        ctx.weights.category,
        "Matches categories",
        |term| {
            ctx.product_text.contains(term)
                || ctx.category.is_some_and(|category| category.contains(term))
        },
    )
}

/// 色の一致
pub fn color_signal(ctx: &SignalContext<'_>) -> Option<SignalHit> {
    per_term_hit(
        &ctx.attributes.colors,
        ctx.weights.color,
        "Matches colors",
        |term| ctx.product_text.contains(term),
    )
}

/// 素材の一致
pub fn material_signal(ctx: &SignalContext<'_>) -> Option<SignalHit> {
    per_term_hit(
        &ctx.attributes.materials,
        ctx.weights.material,
        "Matches materials",
        |term| ctx.product_text.contains(term),
    )
}

/// ブランドの一致（出現回数に関係なく1回分）
pub fn brand_signal(ctx: &SignalContext<'_>) -> Option<SignalHit> {
    let brand = ctx.attributes.brand.as_deref()?.trim();
    if brand.is_empty() || !ctx.product_text.contains(&brand.to_lowercase()) {
        return None;
    }
    Some(SignalHit {
        points: ctx.weights.brand,
        reason: format!("Brand match: {}", brand),
    })
}

/// 属性全体と商品テキストのあいまい照合
pub fn fuzzy_signal(ctx: &SignalContext<'_>) -> Option<SignalHit> {
    let query = ctx.attributes.fuzzy_query();
    let found = fuzzy_match(&query, ctx.product_text, ctx.weights.fuzzy_threshold)?;
    let points = (found.similarity() * f64::from(ctx.weights.fuzzy_max)).round() as u32;
    if points == 0 {
        return None;
    }
    Some(SignalHit {
        points,
        reason: format!(
            "Text similarity match ({}% similar)",
            (found.similarity() * 100.0).round() as u32
        ),
    })
}

/// 一致した語の数 × 重み
fn per_term_hit<F>(terms: &[String], weight: u32, label: &str, matches: F) -> Option<SignalHit>
where
    F: Fn(&str) -> bool,
{
    let matched: Vec<&str> = terms
        .iter()
        .map(|t| t.as_str())
        .filter(|t| !t.trim().is_empty())
        .filter(|t| matches(&t.to_lowercase()))
        .collect();

    if matched.is_empty() {
        return None;
    }

    Some(SignalHit {
        points: u32::try_from(matched.len()).unwrap_or(u32::MAX).saturating_mul(weight),
        reason: format!("{}: {}", label, matched.join(", ")),
    })
}

/// 照合器
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    weights: ScoringWeights,
    limits: RankingLimits,
}

impl Matcher {
    pub fn new(weights: ScoringWeights, limits: RankingLimits) -> Self {
        Self { weights, limits }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn limits(&self) -> &RankingLimits {
        &self.limits
    }

    /// 1商品を採点
    ///
    /// # Arguments
    /// * `attributes` - 抽出済みの視覚属性
    /// * `product` - 採点対象
    /// * `index` - カタログ内の位置
    /// * `catalog_len` - カタログ全体の件数（救済判定用）
    pub fn score<'a, T: CatalogItem>(
        &self,
        attributes: &VisualAttributes,
        product: &'a T,
        index: usize,
        catalog_len: usize,
    ) -> ScoredCandidate<'a, T> {
        let product_text = product.product_text();
        let category = product.category().map(str::to_lowercase);
        let ctx = SignalContext {
            attributes,
            product_text: &product_text,
            category: category.as_deref(),
            weights: &self.weights,
        };

        let mut score: u32 = 0;
        let mut reasons = Vec::new();
        for hit in SIGNALS.iter().filter_map(|signal| signal(&ctx)) {
            score = score.saturating_add(hit.points);
            reasons.push(hit.reason);
        }

        if catalog_len <= self.limits.fallback_catalog_size && score == 0 {
            score = self.weights.small_catalog_fallback;
            reasons.push("Included due to small catalog size".to_string());
        }

        ScoredCandidate {
            product,
            index,
            score,
            reasons,
        }
    }

    /// 採点・絞り込み・並べ替え済みの候補（監査用にスコアと理由付き）
    pub fn rank_with_scores<'a, T: CatalogItem>(
        &self,
        attributes: &VisualAttributes,
        catalog: &'a [T],
    ) -> Vec<ScoredCandidate<'a, T>> {
        if catalog.is_empty() {
            return Vec::new();
        }

        let keep_all = catalog.len() <= self.limits.include_all_catalog_size;
        let mut candidates: Vec<ScoredCandidate<'a, T>> = catalog
            .iter()
            .enumerate()
            .map(|(index, product)| self.score(attributes, product, index, catalog.len()))
            .filter(|c| keep_all || c.score > self.limits.min_score)
            .collect();

        // 安定ソート: 同点はカタログ順を維持
        candidates.sort_by(|a, b| b.score.cmp(&a.score));
        candidates.truncate(self.limits.max_results);
        candidates
    }

    /// 上位の商品のみを返す
    pub fn rank<'a, T: CatalogItem>(
        &self,
        attributes: &VisualAttributes,
        catalog: &'a [T],
    ) -> Vec<&'a T> {
        self.rank_with_scores(attributes, catalog)
            .into_iter()
            .map(|c| c.product)
            .collect()
    }
}

/// 既定の重みで照合
pub fn match_products<'a, T: CatalogItem>(
    attributes: &VisualAttributes,
    catalog: &'a [T],
) -> Vec<&'a T> {
    Matcher::default().rank(attributes, catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CatalogEntry;

    fn entry(name: &str, description: &str, category: Option<&str>) -> CatalogEntry {
        CatalogEntry::new(name, description, category)
    }

    fn ctx_for<'a>(
        attributes: &'a VisualAttributes,
        product_text: &'a str,
        category: Option<&'a str>,
        weights: &'a ScoringWeights,
    ) -> SignalContext<'a> {
        SignalContext {
            attributes,
            product_text,
            category,
            weights,
        }
    }

    /// 家電・雑貨の10件カタログ
    fn sample_catalog() -> Vec<CatalogEntry> {
        vec![
            entry("Wireless Headphones", "Noise cancelling over-ear headphones", Some("Electronics")),
            entry("Red Sneakers", "Lightweight running shoes", Some("Footwear")),
            entry("Blue Mug", "Ceramic coffee mug", Some("Kitchen")),
            entry("Leather Wallet", "Brown leather bifold wallet", Some("Accessories")),
            entry("Steel Water Bottle", "Insulated stainless steel bottle", Some("Outdoor")),
            entry("Canvas Tote", "Natural canvas shopping bag", Some("Bags")),
            entry("Desk Lamp", "Black metal LED desk lamp", Some("Home")),
            entry("Acme Smart Watch", "Acme fitness tracker watch", Some("Electronics")),
            entry("Wool Scarf", "Red knitted wool scarf", Some("Apparel")),
            entry("Sunglasses", "Polarized black sunglasses", Some("Accessories")),
        ]
    }

    // =============================================
    // シグナル単体テスト
    // =============================================

    #[test]
    fn test_object_signal_case_insensitive() {
        let attrs = VisualAttributes {
            objects: vec!["headphones".into()],
            ..Default::default()
        };
        let product = entry("Wireless Headphones", "", None);
        let text = product.product_text();
        let weights = ScoringWeights::default();
        let hit = object_signal(&ctx_for(&attrs, &text, None, &weights)).unwrap();
        assert_eq!(hit.points, 40);
        assert_eq!(hit.reason, "Matches objects: headphones");
    }

    #[test]
    fn test_object_signal_counts_each_object() {
        let attrs = VisualAttributes {
            objects: vec!["Mug".into(), "coffee".into(), "teapot".into()],
            ..Default::default()
        };
        let text = "blue mug ceramic coffee mug kitchen";
        let weights = ScoringWeights::default();
        let hit = object_signal(&ctx_for(&attrs, text, None, &weights)).unwrap();
        assert_eq!(hit.points, 80);
    }

    #[test]
    fn test_blank_terms_never_match() {
        let attrs = VisualAttributes {
            colors: vec!["".into(), "  ".into()],
            ..Default::default()
        };
        let weights = ScoringWeights::default();
        assert!(color_signal(&ctx_for(&attrs, "anything", None, &weights)).is_none());
    }

    #[test]
    fn test_category_signal_uses_product_category() {
        let attrs = VisualAttributes {
            categories: vec!["Kitchen".into()],
            ..Default::default()
        };
        let weights = ScoringWeights::default();
        let hit = category_signal(&ctx_for(&attrs, "blue mug", Some("kitchenware"), &weights)).unwrap();
        assert_eq!(hit.points, 30);
    }

    #[test]
    fn test_brand_signal_is_flat() {
        let attrs = VisualAttributes {
            brand: Some("Acme".into()),
            ..Default::default()
        };
        let weights = ScoringWeights::default();
        let once = brand_signal(&ctx_for(&attrs, "acme watch", None, &weights)).unwrap();
        let many = brand_signal(&ctx_for(&attrs, "acme acme acme watch by acme", None, &weights)).unwrap();
        assert_eq!(once.points, 50);
        assert_eq!(many.points, 50);
        assert_eq!(many.reason, "Brand match: Acme");
    }

    #[test]
    fn test_brand_signal_empty_brand() {
        let attrs = VisualAttributes {
            brand: Some(String::new()),
            ..Default::default()
        };
        let weights = ScoringWeights::default();
        assert!(brand_signal(&ctx_for(&attrs, "acme watch", None, &weights)).is_none());
    }

    #[test]
    fn test_fuzzy_signal_exact_text_gets_max() {
        let attrs = VisualAttributes {
            description: "running shoes".into(),
            ..Default::default()
        };
        let weights = ScoringWeights::default();
        let hit = fuzzy_signal(&ctx_for(&attrs, "running shoes red sneakers", None, &weights)).unwrap();
        assert_eq!(hit.points, 30);
        assert_eq!(hit.reason, "Text similarity match (100% similar)");
    }

    #[test]
    fn test_fuzzy_signal_later_match_scores_less() {
        let attrs = VisualAttributes {
            description: "running shoes".into(),
            ..Default::default()
        };
        let weights = ScoringWeights::default();
        let hit = fuzzy_signal(&ctx_for(&attrs, "red sneakers running shoes", None, &weights)).unwrap();
        assert_eq!(hit.points, 26);
        assert_eq!(hit.reason, "Text similarity match (87% similar)");
    }

    #[test]
    fn test_fuzzy_signal_unrelated_text() {
        let attrs = VisualAttributes {
            objects: vec!["sneakers".into(), "shoes".into()],
            colors: vec!["white".into()],
            description: "white leather sneakers".into(),
            ..Default::default()
        };
        let weights = ScoringWeights::default();
        for text in [
            "wool scarf warm knitted scarf apparel",
            "steel water bottle insulated stainless steel bottle outdoor",
            "sunglasses polarized black sunglasses accessories",
        ] {
            assert!(fuzzy_signal(&ctx_for(&attrs, text, None, &weights)).is_none(), "{}", text);
        }
    }

    #[test]
    fn test_fuzzy_signal_empty_query() {
        let attrs = VisualAttributes::default();
        let weights = ScoringWeights::default();
        assert!(fuzzy_signal(&ctx_for(&attrs, "red sneakers", None, &weights)).is_none());
    }

    // =============================================
    // ランキングテスト
    // =============================================

    #[test]
    fn test_empty_catalog() {
        let attrs = VisualAttributes {
            objects: vec!["mug".into()],
            ..Default::default()
        };
        let catalog: Vec<CatalogEntry> = Vec::new();
        assert!(match_products(&attrs, &catalog).is_empty());
    }

    #[test]
    fn test_sneakers_scenario() {
        let catalog = vec![
            entry("Red Sneakers", "running shoes", Some("footwear")),
            entry("Blue Mug", "ceramic mug", Some("kitchen")),
        ];
        let attrs = VisualAttributes {
            objects: vec!["sneakers".into()],
            colors: vec!["red".into()],
            categories: vec!["footwear".into()],
            description: "red running shoes".into(),
            ..Default::default()
        };

        let scored = Matcher::default().rank_with_scores(&attrs, &catalog);
        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].product.name, "Red Sneakers");
        assert!(scored[0].score >= 90);
        assert_eq!(scored[1].product.name, "Blue Mug");
        assert!(scored[1].score < scored[0].score);

        let ranked = match_products(&attrs, &catalog);
        assert_eq!(ranked[0].name, "Red Sneakers");
        assert_eq!(ranked[1].name, "Blue Mug");
    }

    #[test]
    fn test_tiny_catalog_returns_everything() {
        let catalog = vec![
            entry("Desk Lamp", "metal lamp", Some("Home")),
            entry("Wool Scarf", "knitted scarf", Some("Apparel")),
            entry("Blue Mug", "ceramic mug", Some("Kitchen")),
        ];
        let attrs = VisualAttributes {
            objects: vec!["mug".into()],
            ..Default::default()
        };
        let ranked = match_products(&attrs, &catalog);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].name, "Blue Mug");
    }

    #[test]
    fn test_empty_attributes_small_catalog_fallback() {
        let catalog: Vec<CatalogEntry> = sample_catalog().into_iter().take(5).collect();
        let attrs = VisualAttributes::default();

        let scored = Matcher::default().rank_with_scores(&attrs, &catalog);
        assert_eq!(scored.len(), 5);
        for (i, candidate) in scored.iter().enumerate() {
            assert_eq!(candidate.score, 10);
            assert_eq!(candidate.index, i);
            assert_eq!(candidate.reasons, vec!["Included due to small catalog size"]);
        }
    }

    #[test]
    fn test_empty_attributes_large_catalog_is_empty() {
        let catalog = sample_catalog();
        let attrs = VisualAttributes::default();
        assert!(match_products(&attrs, &catalog).is_empty());
    }

    #[test]
    fn test_fuzzy_catches_paraphrase_without_exact_hit() {
        let mut catalog: Vec<CatalogEntry> = sample_catalog()
            .into_iter()
            .filter(|e| e.name != "Red Sneakers")
            .collect();
        catalog.push(entry("Trail Runner", "Running shoes for trails", Some("Sport")));
        let attrs = VisualAttributes {
            objects: vec!["sneaker".into()],
            description: "running shoe".into(),
            ..Default::default()
        };

        let scored = Matcher::default().rank_with_scores(&attrs, &catalog);
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].product.name, "Trail Runner");
        assert_eq!(scored[0].score, 17);
        assert_eq!(scored[0].reasons, vec!["Text similarity match (57% similar)"]);
    }

    #[test]
    fn test_no_matching_product_is_empty() {
        // 靴のないカタログ
        let catalog: Vec<CatalogEntry> = sample_catalog()
            .into_iter()
            .filter(|e| e.name != "Red Sneakers")
            .collect();
        assert!(catalog.len() > 5);
        let attrs = VisualAttributes {
            objects: vec!["sneakers".into(), "shoes".into()],
            categories: vec!["Footwear".into()],
            colors: vec!["white".into()],
            description: "white sneakers on a wooden floor".into(),
            ..Default::default()
        };

        let scored = Matcher::default().rank_with_scores(&attrs, &catalog);
        assert!(scored.is_empty(), "{:?}", scored.iter().map(|c| (&c.product.name, c.score)).collect::<Vec<_>>());
    }

    #[test]
    fn test_result_truncated_to_max() {
        let catalog: Vec<CatalogEntry> = (0..20)
            .map(|i| entry(&format!("Red Mug {}", i), "ceramic mug", Some("Kitchen")))
            .collect();
        let attrs = VisualAttributes {
            objects: vec!["mug".into()],
            ..Default::default()
        };
        let scored = Matcher::default().rank_with_scores(&attrs, &catalog);
        assert_eq!(scored.len(), 8);
        // 同点はカタログ順
        let indices: Vec<usize> = scored.iter().map(|c| c.index).collect();
        let mut sorted = indices.clone();
        sorted.sort();
        assert_eq!(indices, sorted);
    }

    #[test]
    fn test_brand_outranks_generic_match() {
        let catalog = sample_catalog();
        let attrs = VisualAttributes {
            objects: vec!["watch".into()],
            brand: Some("Acme".into()),
            categories: vec!["electronics".into()],
            ..Default::default()
        };
        let ranked = match_products(&attrs, &catalog);
        assert_eq!(ranked[0].name, "Acme Smart Watch");
        assert!(ranked.iter().any(|p| p.name == "Wireless Headphones"));
    }

    #[test]
    fn test_fuzzy_monotonic_for_equal_exact_scores() {
        let catalog = sample_catalog();
        let attrs = VisualAttributes {
            description: "leather wallet".into(),
            ..Default::default()
        };
        let matcher = Matcher::default();
        let wallet = matcher.score(&attrs, &catalog[3], 3, catalog.len());
        let bottle = matcher.score(&attrs, &catalog[4], 4, catalog.len());
        assert!(wallet.score >= bottle.score);
        assert_eq!(wallet.score, 30);
    }

    #[test]
    fn test_result_is_subsequence_of_catalog() {
        let catalog = sample_catalog();
        let attribute_sets = vec![
            VisualAttributes {
                colors: vec!["red".into(), "black".into()],
                ..Default::default()
            },
            VisualAttributes {
                objects: vec!["bottle".into(), "lamp".into(), "scarf".into()],
                materials: vec!["steel".into(), "wool".into()],
                ..Default::default()
            },
            VisualAttributes {
                description: "a pair of polarized sunglasses on a table".into(),
                ..Default::default()
            },
        ];

        for attrs in &attribute_sets {
            for len in 0..=catalog.len() {
                let slice = &catalog[..len];
                let ranked = match_products(attrs, slice);
                assert!(ranked.len() <= 8);
                assert!(ranked.len() <= slice.len());
                if len > 0 && len <= 3 {
                    assert_eq!(ranked.len(), len);
                }
                // 重複なし・全てカタログ内の要素
                let mut positions: Vec<usize> = ranked
                    .iter()
                    .map(|p| slice.iter().position(|c| std::ptr::eq(c, *p)).unwrap())
                    .collect();
                positions.sort();
                positions.dedup();
                assert_eq!(positions.len(), ranked.len());
            }
        }
    }

    #[test]
    fn test_huge_weights_saturate() {
        let weights = ScoringWeights {
            object: u32::MAX - 1,
            brand: u32::MAX,
            ..Default::default()
        };
        let attrs = VisualAttributes {
            objects: vec!["mug".into(), "coffee".into()],
            brand: Some("acme".into()),
            ..Default::default()
        };
        let catalog = vec![entry("Acme Mug", "coffee mug", Some("Kitchen"))];

        let scored = Matcher::new(weights, RankingLimits::default()).rank_with_scores(&attrs, &catalog);
        assert_eq!(scored[0].score, u32::MAX);
    }

    #[test]
    fn test_custom_limits() {
        let catalog = sample_catalog();
        let attrs = VisualAttributes {
            colors: vec!["black".into()],
            ..Default::default()
        };
        let matcher = Matcher::new(
            ScoringWeights::default(),
            RankingLimits {
                max_results: 1,
                ..Default::default()
            },
        );
        let ranked = matcher.rank(&attrs, &catalog);
        assert_eq!(ranked.len(), 1);
    }
}

//! 画像による商品検索
//!
//! 属性抽出 → 照合 の順に実行する。抽出に失敗した場合は照合を行わず
//! `ExtractionError` をそのまま返す。

use crate::analyzer::{build_capability, AttributeExtractor, CacheFile, ImagePayload};
use crate::catalog::{CatalogStore, Product};
use crate::config::Config;
use crate::error::{Result, ShopLensError};
use crate::scanner::{self, ImageInfo};
use rayon::prelude::*;
use shop_lens_common::{CatalogItem, ExtractionError, Matcher, ScoredCandidate, VisualAttributes};

/// 1画像分の検索結果（監査用のスコア付き）
#[derive(Debug)]
pub struct SearchOutcome<'a, T> {
    pub attributes: VisualAttributes,
    pub candidates: Vec<ScoredCandidate<'a, T>>,
}

impl<'a, T> SearchOutcome<'a, T> {
    fn empty() -> Self {
        Self {
            attributes: VisualAttributes::default(),
            candidates: Vec::new(),
        }
    }

    pub fn products(&self) -> Vec<&'a T> {
        self.candidates.iter().map(|c| c.product).collect()
    }
}

/// 複数画像の抽出結果（ファイル名付き）
#[derive(Debug, Default)]
pub struct BatchExtraction {
    pub extracted: Vec<(String, VisualAttributes)>,
    pub failures: Vec<(String, ShopLensError)>,
}

pub struct ImageSearch {
    extractor: AttributeExtractor,
    matcher: Matcher,
}

impl ImageSearch {
    pub fn new(extractor: AttributeExtractor, matcher: Matcher) -> Self {
        Self { extractor, matcher }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let capability = build_capability(config)?;
        Ok(Self::new(AttributeExtractor::new(capability), config.matcher()))
    }

    pub fn extractor(&self) -> &AttributeExtractor {
        &self.extractor
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// 画像に合う商品を上位から返す
    pub async fn search_by_image<'a, T: CatalogItem>(
        &self,
        image: &ImagePayload,
        catalog: &'a [T],
    ) -> std::result::Result<Vec<&'a T>, ExtractionError> {
        Ok(self.search_with_scores(image, catalog, None).await?.products())
    }

    /// スコア・理由付きで検索（キャッシュ指定時は抽出結果を再利用）
    pub async fn search_with_scores<'a, T: CatalogItem>(
        &self,
        image: &ImagePayload,
        catalog: &'a [T],
        cache: Option<&mut CacheFile>,
    ) -> std::result::Result<SearchOutcome<'a, T>, ExtractionError> {
        if catalog.is_empty() {
            tracing::info!("カタログに商品がないため解析をスキップ");
            return Ok(SearchOutcome::empty());
        }

        tracing::info!(file = %image.file_name, products = catalog.len(), "画像解析開始");
        let attributes = match cache {
            Some(cache) => self.extractor.extract_cached(image, cache).await?,
            None => self.extractor.extract(image).await?,
        };
        tracing::debug!(?attributes, "抽出属性");

        let candidates = rank_and_log(&self.matcher, &attributes, catalog);
        tracing::info!(file = %image.file_name, matches = candidates.len(), "照合完了");

        Ok(SearchOutcome {
            attributes,
            candidates,
        })
    }

    /// 画像を順に読み込んで抽出（読み込み・抽出の失敗は記録して次へ進む）
    ///
    /// `on_done` は1枚処理するごとに呼ばれる（進捗表示用）
    pub async fn extract_batch<F>(
        &self,
        images: &[ImageInfo],
        max_image_size: u32,
        mut cache: Option<&mut CacheFile>,
        mut on_done: F,
    ) -> BatchExtraction
    where
        F: FnMut(&ImageInfo),
    {
        let mut batch = BatchExtraction::default();

        for info in images {
            let result = match scanner::load_image(info, max_image_size) {
                Ok(payload) => match cache.as_deref_mut() {
                    Some(cache) => self.extractor.extract_cached(&payload, cache).await,
                    None => self.extractor.extract(&payload).await,
                }
                .map_err(ShopLensError::from),
                Err(e) => Err(e),
            };

            match result {
                Ok(attributes) => batch.extracted.push((info.file_name.clone(), attributes)),
                Err(e) => {
                    tracing::warn!(file = %info.file_name, error = %e, "画像をスキップ");
                    batch.failures.push((info.file_name.clone(), e));
                }
            }
            on_done(info);
        }

        batch
    }

    /// ストアから販売中の商品を取得して検索
    pub async fn search_store(&self, store: &dyn CatalogStore, image: &ImagePayload) -> Result<Vec<Product>> {
        let products = store.available_products().await?;
        let matches = self.search_by_image(image, &products).await?;
        Ok(matches.into_iter().cloned().collect())
    }
}

/// 照合して各候補のスコアと理由をログに出す
pub fn rank_and_log<'a, T: CatalogItem>(
    matcher: &Matcher,
    attributes: &VisualAttributes,
    catalog: &'a [T],
) -> Vec<ScoredCandidate<'a, T>> {
    let candidates = matcher.rank_with_scores(attributes, catalog);
    for candidate in &candidates {
        tracing::debug!(
            product = candidate.product.name(),
            score = candidate.score,
            reasons = %candidate.reasons.join("; "),
            "候補"
        );
    }
    candidates
}

/// 複数画像分の属性を並列に照合（入力順を維持）
pub fn rank_batch<'a, T: CatalogItem + Sync>(
    matcher: &Matcher,
    attribute_sets: &[VisualAttributes],
    catalog: &'a [T],
) -> Vec<Vec<ScoredCandidate<'a, T>>> {
    attribute_sets
        .par_iter()
        .map(|attributes| rank_and_log(matcher, attributes, catalog))
        .collect()
}

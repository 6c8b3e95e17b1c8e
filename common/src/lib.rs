//! shop-lens Common Library
//!
//! 画像属性の型・抽出レスポンスのパース・商品照合ロジック（I/Oなし）

pub mod error;
pub mod fuzzy;
pub mod matcher;
pub mod parser;
pub mod prompts;
pub mod types;
pub mod weights;

pub use error::{ExtractionError, Result};
pub use fuzzy::{fuzzy_match, normalized_distance, FuzzyMatch};
pub use matcher::{match_products, Matcher, Signal, SignalContext, SignalHit, SIGNALS};
pub use parser::{coerce_attributes, extract_json_object, parse_attributes_response};
pub use prompts::{build_combined_prompt, build_extraction_prompt, DEFAULT_MAX_TOKENS, EXTRACTION_USER_PROMPT};
pub use types::{CatalogEntry, CatalogItem, ScoredCandidate, VisualAttributes};
pub use weights::{InvalidWeights, RankingLimits, ScoringWeights};

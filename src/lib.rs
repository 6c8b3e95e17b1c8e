//! shop-lens
//!
//! 写真から商品カタログを逆引きする画像検索

pub mod ai_provider;
pub mod analyzer;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod scanner;
pub mod search;

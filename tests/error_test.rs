//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use shop_lens::catalog::FileCatalog;
use shop_lens::config::Config;
use shop_lens::error::ShopLensError;
use shop_lens::scanner;
use shop_lens_common::{ExtractionError, ScoringWeights};
use std::path::Path;
use tempfile::tempdir;

/// 存在しないパスをスキャンした場合
#[test]
fn test_scan_nonexistent_path() {
    let result = scanner::scan_path(Path::new("/nonexistent/path/12345"));
    assert!(matches!(result, Err(ShopLensError::FileNotFound(_))));
}

/// 空のフォルダをスキャンした場合
#[test]
fn test_scan_empty_folder() {
    let dir = tempdir().expect("Failed to create temp dir");
    let result = scanner::scan_folder(dir.path());

    // 空フォルダはエラーではなく空のVecを返す
    assert!(result.unwrap().is_empty());
}

/// 画像以外のファイルを直接指定した場合
#[test]
fn test_scan_non_image_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "hello").unwrap();

    let result = scanner::scan_path(&path);
    assert!(matches!(result, Err(ShopLensError::ImageLoad(_))));
}

/// 存在しないカタログ
#[test]
fn test_missing_catalog() {
    let result = FileCatalog::new("/nonexistent/catalog.json").load_all();
    assert!(matches!(result, Err(ShopLensError::FileNotFound(_))));
}

/// 未対応のカタログ形式
#[test]
fn test_unsupported_catalog_format() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("catalog.csv");
    std::fs::write(&path, "name\nmug").unwrap();

    let result = FileCatalog::new(&path).load_all();
    assert!(matches!(result, Err(ShopLensError::CatalogLoad(msg)) if msg.contains(".csv")));
}

/// 壊れたJSONカタログ
#[test]
fn test_malformed_json_catalog() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("catalog.json");
    std::fs::write(&path, "[{\"name\": ").unwrap();

    let result = FileCatalog::new(&path).load_all();
    assert!(matches!(result, Err(ShopLensError::CatalogLoad(_))));
}

/// 重みの順序が崩れた設定は読み込み時に拒否
#[test]
fn test_config_rejects_invalid_weights() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");
    let config = Config {
        weights: ScoringWeights {
            color: 50,
            ..Default::default()
        },
        ..Default::default()
    };
    config.save_to(&path).unwrap();

    let result = Config::load_from(&path);
    assert!(matches!(result, Err(ShopLensError::Config(_))));
}

/// ShopLensErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        ShopLensError::Config("テスト設定エラー".to_string()),
        ShopLensError::FileNotFound("photo.jpg".to_string()),
        ShopLensError::ImageLoad("壊れた画像".to_string()),
        ShopLensError::CatalogLoad("不正なカタログ".to_string()),
        ShopLensError::NoImagesFound("フォルダ".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "エラーメッセージが空: {:?}", err);
    }
}

/// MissingApiKeyエラーのメッセージ確認
#[test]
fn test_missing_api_key_message() {
    let err = ShopLensError::MissingApiKey("OPENAI_API_KEY");
    let display = format!("{}", err);

    assert!(display.contains("APIキー"));
    assert!(display.contains("shop-lens config"));
    assert!(display.contains("OPENAI_API_KEY"));
}

/// IOエラーからの変換
#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: ShopLensError = io_err.into();

    assert!(matches!(err, ShopLensError::Io(_)));
    assert!(format!("{}", err).contains("IO"));
}

/// JSONエラーからの変換
#[test]
fn test_json_error_conversion() {
    let json_err = serde_json::from_str::<serde_json::Value>("{ invalid }").unwrap_err();
    let err: ShopLensError = json_err.into();

    assert!(matches!(err, ShopLensError::JsonParse(_)));
}

/// 抽出エラーは種別を保ったまま包む
#[test]
fn test_extraction_error_conversion() {
    let err: ShopLensError = ExtractionError::Capability("HTTP 503".to_string()).into();

    assert!(matches!(err, ShopLensError::Extraction(ExtractionError::Capability(_))));
    assert!(format!("{}", err).contains("HTTP 503"));
}

//! プロンプト生成モジュール
//!
//! Vision APIに渡す属性抽出用の指示文:
//! - ATTRIBUTE_FIELDS: 抽出するフィールド名
//! - build_extraction_prompt: システム指示
//! - EXTRACTION_USER_PROMPT: 画像に添えるユーザー指示

/// 抽出するJSONフィールド（この順で出力させる）
pub const ATTRIBUTE_FIELDS: &[&str] = &[
    "objects",
    "colors",
    "materials",
    "categories",
    "description",
    "style",
    "brand",
];

/// レスポンス長の上限（トークン数）
pub const DEFAULT_MAX_TOKENS: u32 = 500;

/// 画像に添えるユーザー指示
pub const EXTRACTION_USER_PROMPT: &str =
    "Analyze this image and extract all product-related information for matching with an e-commerce catalog.";

/// 属性抽出プロンプト生成
///
/// # Returns
/// JSONオブジェクトのみを返すよう指示するシステムプロンプト
pub fn build_extraction_prompt() -> String {
    r#"You are an expert product identifier. Analyze the image and extract detailed information for product matching.

Respond with JSON in this exact format:
{
  "objects": ["list of main objects/items in the image"],
  "colors": ["primary colors present"],
  "materials": ["materials you can identify like plastic, metal, fabric, etc."],
  "categories": ["product categories this might belong to"],
  "description": "detailed description of what you see",
  "style": "style description if applicable",
  "brand": "brand name if visible"
}

Be thorough but focused on product-relevant details. Output the JSON object only."#
        .to_string()
}

/// 1回の呼び出しで画像と指示を渡すプロバイダ用（CLI経由など）
pub fn build_combined_prompt(image_reference: &str, instruction: &str) -> String {
    format!(
        "Read the following image file: {}\n\n{}\n\n{}",
        image_reference, EXTRACTION_USER_PROMPT, instruction
    )
}

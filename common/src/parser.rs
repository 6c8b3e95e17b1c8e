//! APIレスポンスパーサー
//!
//! Vision APIのレスポンスからJSONオブジェクトを抽出し、
//! VisualAttributesへ変換する。
//!
//! 2段階で処理する:
//! 1. トップレベルのJSONオブジェクトをパース（失敗はエラー）
//! 2. フィールドごとに型を合わせる（失敗しない。欠落・不正は既定値）

use crate::error::{ExtractionError, Result};
use crate::types::VisualAttributes;
use serde_json::{Map, Value};

/// APIレスポンスからJSONオブジェクト部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック
/// 2. 最初の `{` から最後の `}` まで
/// 3. エラー
///
/// # Examples
/// ```
/// use shop_lens_common::extract_json_object;
///
/// let response = "Result: {\"objects\": [\"mug\"]}";
/// let json = extract_json_object(response).unwrap();
/// assert_eq!(json, "{\"objects\": [\"mug\"]}");
/// ```
pub fn extract_json_object(response: &str) -> Result<&str> {
    // ```json ... ``` ブロックを探す
    if let Some(start_marker) = response.find("```json") {
        let start = start_marker + 7; // "```json" の長さ
        if let Some(end_offset) = response[start..].find("```") {
            let end = start + end_offset;
            return Ok(response[start..end].trim());
        }
    }

    // 生の {...} を探す
    if let Some(start) = response.find('{') {
        if let Some(end) = response.rfind('}') {
            if end > start {
                return Ok(&response[start..=end]);
            }
        }
    }

    Err(ExtractionError::Parse("JSONオブジェクトが見つかりません".into()))
}

/// 属性抽出レスポンスをパース
///
/// # Arguments
/// * `response` - Vision APIのテキストレスポンス
///
/// # Returns
/// * `Ok(VisualAttributes)` - 欠落フィールドは既定値で補完済み
/// * `Err(ExtractionError::Parse)` - JSONオブジェクトとして読めない場合
pub fn parse_attributes_response(response: &str) -> Result<VisualAttributes> {
    let json_str = extract_json_object(response)?;
    let value: Value = serde_json::from_str(json_str.trim())
        .map_err(|e| ExtractionError::Parse(format!("属性JSONパースエラー: {}", e)))?;

    match value {
        Value::Object(map) => Ok(coerce_attributes(&map)),
        other => Err(ExtractionError::Parse(format!(
            "JSONオブジェクトではありません: {}",
            value_kind(&other)
        ))),
    }
}

/// フィールド単位の型合わせ（失敗しない）
pub fn coerce_attributes(map: &Map<String, Value>) -> VisualAttributes {
    VisualAttributes {
        objects: coerce_list(map.get("objects")),
        colors: coerce_list(map.get("colors")),
        materials: coerce_list(map.get("materials")),
        categories: coerce_list(map.get("categories")),
        description: coerce_string(map.get("description")),
        style: coerce_optional(map.get("style")),
        brand: coerce_optional(map.get("brand")),
    }
}

/// 文字列配列へ変換。単一文字列は1要素のリストとして扱う
fn coerce_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

fn coerce_string(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn coerce_optional(value: Option<&Value>) -> Option<String> {
    Some(coerce_string(value)).filter(|s| !s.is_empty())
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! 価格表示（AED: アラブ首長国連邦ディルハム）

use regex::Regex;

/// 文字列価格を数値に変換（数字と小数点以外は無視、読めなければ0）
pub fn parse_aed_price(price: &str) -> f64 {
    lazy_static::lazy_static! {
        static ref NON_NUMERIC_RE: Regex = Regex::new(r"[^0-9.]").unwrap();
    }
    NON_NUMERIC_RE
        .replace_all(price, "")
        .parse::<f64>()
        .unwrap_or(0.0)
}

/// `AED 1234.50` 形式
pub fn format_aed(price: &str) -> String {
    format!("AED {:.2}", parse_aed_price(price))
}

/// 一覧向けの短い表記（1000以上は `AED 2.5K`）
pub fn format_aed_short(price: &str) -> String {
    let value = parse_aed_price(price);
    if value >= 1000.0 {
        let thousands = value / 1000.0;
        if value % 1000.0 == 0.0 {
            format!("AED {:.0}K", thousands)
        } else {
            format!("AED {:.1}K", thousands)
        }
    } else if value.fract() == 0.0 {
        format!("AED {:.0}", value)
    } else {
        format!("AED {:.2}", value)
    }
}

//! Excelカタログの読み込み
//!
//! 先頭シートの1行目をヘッダとして列名で対応付ける。
//! 列名は大文字小文字・空白・アンダースコアを無視して比較する。

use super::{Availability, Product};
use crate::error::{Result, ShopLensError};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::collections::HashMap;
use std::path::Path;

pub fn read_products(path: &Path) -> Result<Vec<Product>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| ShopLensError::CatalogLoad(format!("{}: {}", path.display(), e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ShopLensError::CatalogLoad(format!("{}: シートがありません", path.display())))?
        .map_err(|e| ShopLensError::CatalogLoad(format!("{}: {}", path.display(), e)))?;

    products_from_range(&range)
}

fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect::<String>()
        .to_lowercase()
}

fn cell_text(row: &[Data], column: Option<usize>) -> String {
    column
        .and_then(|i| row.get(i))
        .map(|cell| match cell {
            Data::Empty => String::new(),
            other => other.to_string().trim().to_string(),
        })
        .unwrap_or_default()
}

fn optional_text(row: &[Data], column: Option<usize>) -> Option<String> {
    Some(cell_text(row, column)).filter(|s| !s.is_empty())
}

fn products_from_range(range: &Range<Data>) -> Result<Vec<Product>> {
    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| ShopLensError::CatalogLoad("ヘッダ行がありません".into()))?;

    let columns: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| (normalize_header(&cell.to_string()), i))
        .collect();
    let column = |names: &[&str]| names.iter().find_map(|n| columns.get(*n).copied());

    let name_col = column(&["name", "product", "productname"])
        .ok_or_else(|| ShopLensError::CatalogLoad("name列がありません".into()))?;
    let id_col = column(&["id"]);
    let description_col = column(&["description"]);
    let price_col = column(&["price"]);
    let category_col = column(&["category"]);
    let image_col = column(&["imageurl", "image"]);
    let available_col = column(&["isavailable", "available", "availability"]);
    let stock_col = column(&["stockquantity", "stock"]);

    let mut products = Vec::new();
    for (line, row) in rows.enumerate() {
        let name = cell_text(row, Some(name_col));
        if name.is_empty() {
            continue;
        }

        let availability = cell_text(row, available_col);
        let is_available = availability.parse::<Availability>().map_err(|e| {
            // ヘッダの次が2行目
            ShopLensError::CatalogLoad(format!("{}行目: {}", line + 2, e))
        })?;

        products.push(Product {
            id: cell_text(row, id_col),
            name,
            description: cell_text(row, description_col),
            price: cell_text(row, price_col),
            category: optional_text(row, category_col),
            image_url: optional_text(row, image_col),
            is_available,
            stock_quantity: optional_text(row, stock_col),
            updated_at: None,
        });
    }

    Ok(products)
}

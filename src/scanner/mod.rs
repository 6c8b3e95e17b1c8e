//! 検索画像の読み込み
//!
//! 単一ファイルまたはフォルダ直下の画像を列挙し、
//! 必要に応じて長辺を縮小してからVision APIに渡す。

use crate::analyzer::ImagePayload;
use crate::error::{Result, ShopLensError};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub file_name: String,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// ファイルならその1枚、フォルダなら直下の画像を返す
pub fn scan_path(path: &Path) -> Result<Vec<ImageInfo>> {
    if !path.exists() {
        return Err(ShopLensError::FileNotFound(path.display().to_string()));
    }

    if path.is_file() {
        if !is_image_path(path) {
            return Err(ShopLensError::ImageLoad(format!(
                "対応していない形式です: {}",
                path.display()
            )));
        }
        return Ok(vec![image_info(path)]);
    }

    scan_folder(path)
}

pub fn scan_folder(folder: &Path) -> Result<Vec<ImageInfo>> {
    if !folder.is_dir() {
        return Err(ShopLensError::FileNotFound(folder.display().to_string()));
    }

    let mut images: Vec<ImageInfo> = WalkDir::new(folder)
        .max_depth(1) // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file() && is_image_path(e.path()))
        .map(|e| image_info(e.path()))
        .collect();

    // ファイル名でソート
    images.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(images)
}

fn image_info(path: &Path) -> ImageInfo {
    ImageInfo {
        path: path.to_path_buf(),
        file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
    }
}

fn extension_lowercase(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

fn is_image_path(path: &Path) -> bool {
    extension_lowercase(path).is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// 拡張子からMIMEタイプを決める（不明ならJPEG扱い）
pub fn mime_type_for(path: &Path) -> &'static str {
    match extension_lowercase(path).as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

/// 画像を読み込み、Vision APIに渡すペイロードを作る
///
/// # Arguments
/// * `info` - 読み込む画像
/// * `max_size` - 長辺の最大ピクセル数（0で縮小しない）
pub fn load_image(info: &ImageInfo, max_size: u32) -> Result<ImagePayload> {
    let bytes = std::fs::read(&info.path)
        .map_err(|e| ShopLensError::ImageLoad(format!("{}: {}", info.path.display(), e)))?;

    let payload = ImagePayload {
        file_name: info.file_name.clone(),
        mime_type: mime_type_for(&info.path).to_string(),
        bytes,
    };

    Ok(downscale(payload, max_size))
}

/// 長辺が max_size を超える場合のみJPEGで縮小する
///
/// デコードできない画像はそのまま渡す（形式の判定はVision API側に任せる）
pub fn downscale(payload: ImagePayload, max_size: u32) -> ImagePayload {
    if max_size == 0 {
        return payload;
    }

    let img = match image::load_from_memory(&payload.bytes) {
        Ok(img) => img,
        Err(e) => {
            tracing::debug!(file = %payload.file_name, error = %e, "画像をデコードできないため縮小せずに送信");
            return payload;
        }
    };

    let (width, height) = img.dimensions();
    if width.max(height) <= max_size {
        return payload;
    }

    let resized = DynamicImage::ImageRgb8(
        img.resize(max_size, max_size, FilterType::Lanczos3).to_rgb8(),
    );
    let mut buffer = Vec::new();
    if let Err(e) = resized.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg) {
        tracing::warn!(file = %payload.file_name, error = %e, "縮小画像のエンコードに失敗、元画像を送信");
        return payload;
    }

    tracing::debug!(
        file = %payload.file_name,
        from = %format!("{}x{}", width, height),
        to = %format!("{}x{}", resized.width(), resized.height()),
        "画像を縮小"
    );

    ImagePayload {
        file_name: payload.file_name,
        mime_type: "image/jpeg".to_string(),
        bytes: buffer,
    }
}

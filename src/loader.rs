//! ディスク上の画像ファイル読み込み
//!
//! 宣言MIMEタイプは拡張子から決める（不明な拡張子はNone）。

use crate::error::{DefectAiError, Result};
use defect_ai_common::{ImageFile, MediaType};
use std::path::Path;

pub fn load_image(path: &Path) -> Result<ImageFile> {
    if !path.is_file() {
        return Err(DefectAiError::FileNotFound(path.display().to_string()));
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let declared_type = declared_type_for(path);
    let bytes = std::fs::read(path)?;

    tracing::debug!(file = %file_name, bytes = bytes.len(), declared = ?declared_type, "image loaded");

    Ok(ImageFile::new(file_name, declared_type, bytes))
}

fn declared_type_for(path: &Path) -> Option<&'static str> {
    path.extension()
        .and_then(|ext| MediaType::from_extension(&ext.to_string_lossy()))
        .map(|m| m.mime())
}

//! 画像メディアタイプとプレビュー用Data URL
//!
//! 受付可能な形式: JPEG, PNG, WEBP, HEIC, HEIF

use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/webp")]
    Webp,
    #[serde(rename = "image/heic")]
    Heic,
    #[serde(rename = "image/heif")]
    Heif,
}

impl MediaType {
    pub const ALL: [MediaType; 5] = [
        MediaType::Jpeg,
        MediaType::Png,
        MediaType::Webp,
        MediaType::Heic,
        MediaType::Heif,
    ];

    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Webp => "image/webp",
            MediaType::Heic => "image/heic",
            MediaType::Heif => "image/heif",
        }
    }

    /// 宣言されたMIMEタイプから判定（大文字小文字は区別しない）
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|m| m.mime() == mime)
    }

    /// 拡張子から判定（ドットなし）
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(MediaType::Jpeg),
            "png" => Some(MediaType::Png),
            "webp" => Some(MediaType::Webp),
            "heic" => Some(MediaType::Heic),
            "heif" => Some(MediaType::Heif),
            _ => None,
        }
    }

    /// 受付判定
    ///
    /// 宣言タイプが許可リストにあればそれを採用する。
    /// ブラウザ等がHEICのタイプを空で渡すことがあるため、
    /// ファイル名が `.heic` で終わる場合は HEIC として受け付ける。
    pub fn resolve(declared: Option<&str>, file_name: &str) -> Option<Self> {
        declared
            .and_then(Self::from_mime)
            .or_else(|| {
                file_name
                    .to_lowercase()
                    .ends_with(".heic")
                    .then_some(MediaType::Heic)
            })
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime())
    }
}

/// バイト列をプレビュー用Data URLに変換
pub fn encode_preview(bytes: &[u8], media_type: MediaType) -> String {
    format!("data:{};base64,{}", media_type.mime(), STANDARD.encode(bytes))
}

/// Data URLからBase64データ部分を抽出
///
/// # Arguments
/// * `data_url` - "data:image/jpeg;base64,/9j/4AAQ..." 形式のData URL
pub fn extract_base64_from_data_url(data_url: &str) -> Option<&str> {
    data_url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, data)| data)
}

/// Data URLからMIMEタイプを抽出
pub fn extract_mime_type_from_data_url(data_url: &str) -> Option<&str> {
    data_url
        .strip_prefix("data:")
        .and_then(|rest| rest.split(';').next())
        .filter(|m| !m.is_empty())
}

/// プレビュー用Data URLを元のバイト列に戻す
pub fn decode_preview(data_url: &str) -> Result<Vec<u8>> {
    let data = extract_base64_from_data_url(data_url).ok_or(Error::InvalidDataUrl)?;
    STANDARD.decode(data).map_err(|_| Error::InvalidDataUrl)
}

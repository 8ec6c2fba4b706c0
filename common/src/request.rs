//! 解析リクエストの構築
//!
//! 選択された画像と自由記述欄から `AnalysisRequest` を組み立てる。
//! 形式チェックに失敗した場合、直前の有効な選択は保持される。

use crate::error::{Error, Result};
use crate::media::{encode_preview, MediaType};

/// ユーザーが選択したファイル
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub name: String,
    /// 宣言されたMIMEタイプ（不明な場合はNone）
    pub declared_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, declared_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.map(str::to_string),
            bytes,
        }
    }
}

/// 解析リクエスト（送信ごとに新規作成）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub file_name: String,
    pub image: Vec<u8>,
    pub media_type: MediaType,
    /// プレビュー用Data URL
    pub preview_url: String,
    pub comment: Option<String>,
    pub refinement: Option<String>,
}

/// ファイルと入力欄からリクエストを作成
///
/// 空白のみのコメント・補足指示は未入力として扱う。
pub fn build_request(
    file: &ImageFile,
    comment: Option<&str>,
    refinement: Option<&str>,
) -> Result<AnalysisRequest> {
    let media_type = MediaType::resolve(file.declared_type.as_deref(), &file.name)
        .ok_or_else(|| Error::UnsupportedMediaType(describe(file)))?;

    if file.bytes.is_empty() {
        return Err(Error::UnsupportedMediaType(format!("{} (0 bytes)", file.name)));
    }

    Ok(AnalysisRequest {
        file_name: file.name.clone(),
        image: file.bytes.clone(),
        media_type,
        preview_url: encode_preview(&file.bytes, media_type),
        comment: normalize_text(comment),
        refinement: normalize_text(refinement),
    })
}

fn normalize_text(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn describe(file: &ImageFile) -> String {
    match file.declared_type.as_deref() {
        Some(t) if !t.is_empty() => format!("{} ({})", file.name, t),
        _ => file.name.clone(),
    }
}

/// 現在の画像選択
///
/// 新しい候補が拒否されても、それまでの有効な選択は置き換えない。
#[derive(Debug, Default)]
pub struct Selection {
    current: Option<AnalysisRequest>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(
        &mut self,
        file: &ImageFile,
        comment: Option<&str>,
        refinement: Option<&str>,
    ) -> Result<&AnalysisRequest> {
        let request = build_request(file, comment, refinement)?;
        Ok(&*self.current.insert(request))
    }

    pub fn current(&self) -> Option<&AnalysisRequest> {
        self.current.as_ref()
    }

    /// 送信用に選択を取り出す
    pub fn take(&mut self) -> Option<AnalysisRequest> {
        self.current.take()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

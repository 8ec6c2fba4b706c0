//! 欠陥解析クライアント
//!
//! 1回の `analyze` につき外部サービスへの呼び出しは1回だけ（リトライ・キャッシュなし）。
//! 応答の形状検証は `defect_ai_common::parse_report` が行う。

pub mod gemini;

pub use gemini::GeminiBackend;

use crate::error::{DefectAiError, Result};
use async_trait::async_trait;
use defect_ai_common::{
    build_user_prompt, parse_report, response_schema, AnalysisReport, AnalysisRequest, MediaType,
    SYSTEM_INSTRUCTION,
};
use serde_json::Value;
use std::time::Instant;
use tracing::debug;

/// 外部推論サービスへ送る1回分の呼び出し内容
#[derive(Debug, Clone)]
pub struct GenerateCall<'a> {
    pub image: &'a [u8],
    pub media_type: MediaType,
    pub prompt: String,
    pub system_instruction: &'static str,
    pub response_schema: Value,
}

impl<'a> GenerateCall<'a> {
    pub fn from_request(request: &'a AnalysisRequest) -> Self {
        Self {
            image: &request.image,
            media_type: request.media_type,
            prompt: build_user_prompt(request.comment.as_deref(), request.refinement.as_deref()),
            system_instruction: SYSTEM_INSTRUCTION,
            response_schema: response_schema(),
        }
    }
}

/// 推論サービスのトランスポート
///
/// 応答テキストをそのまま返す。空応答は `EmptyResponse`、
/// 通信・HTTPエラーは `ApiCall` で返すこと。
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, api_key: &str, call: &GenerateCall<'_>) -> Result<String>;
}

pub struct DefectAnalyzer<B> {
    backend: B,
    api_key: Option<String>,
}

impl<B: InferenceBackend> DefectAnalyzer<B> {
    pub fn new(backend: B, api_key: Option<String>) -> Self {
        Self { backend, api_key }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// 画像を解析してレポートを返す
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisReport> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(DefectAiError::MissingApiKey)?;

        let call = GenerateCall::from_request(request);
        debug!(
            backend = self.backend.name(),
            file = %request.file_name,
            media_type = %request.media_type,
            image_bytes = request.image.len(),
            prompt_chars = call.prompt.chars().count(),
            "sending analysis request"
        );

        let start = Instant::now();
        let text = self.backend.generate(api_key, &call).await.map_err(|e| {
            debug!(backend = self.backend.name(), error = ?e, "inference call failed");
            e
        })?;
        debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            response_chars = text.chars().count(),
            "response received"
        );

        parse_report(&text).map_err(|e| {
            debug!(error = %e, "response rejected");
            DefectAiError::from(e)
        })
    }
}

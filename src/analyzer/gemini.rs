//! Gemini API連携（構造化出力）

use super::{GenerateCall, InferenceBackend};
use crate::config::Config;
use crate::error::{DefectAiError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Gemini APIリクエスト
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: String,
    response_schema: Value,
}

/// Gemini APIレスポンス
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// APIキーはクエリではなくこのヘッダーで送る
const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiBackend {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl GeminiBackend {
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| DefectAiError::Config(format!("HTTP-клиент: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_request(&self, call: &GenerateCall<'_>) -> GeminiRequest {
        GeminiRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: call.media_type.mime().to_string(),
                            data: STANDARD.encode(call.image),
                        },
                    },
                    Part::Text { text: call.prompt.clone() },
                ],
            }],
            system_instruction: Content {
                parts: vec![Part::Text { text: call.system_instruction.to_string() }],
            },
            generation_config: GenerationConfig {
                temperature: self.temperature,
                response_mime_type: "application/json".to_string(),
                response_schema: call.response_schema.clone(),
            },
        }
    }
}

#[async_trait]
impl InferenceBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, api_key: &str, call: &GenerateCall<'_>) -> Result<String> {
        let body = self.build_request(call);

        tracing::debug!(model = %self.model, "Sending request to Gemini");

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DefectAiError::ApiCall(format!("Gemini HTTP request failed: {}", e.without_url())))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DefectAiError::ApiCall(format!("Gemini response read failed: {}", e.without_url())))?;

        if !status.is_success() {
            return Err(DefectAiError::ApiCall(format!("Gemini returned {}: {}", status, text)));
        }

        extract_response_text(&text)
    }
}

/// 応答エンベロープから生成テキストを取り出す
///
/// ブロック・候補なし・テキストなしは `EmptyResponse`。
fn extract_response_text(body: &str) -> Result<String> {
    let response: GeminiResponse = serde_json::from_str(body)
        .map_err(|e| DefectAiError::MalformedResponse(format!("Gemini envelope: {}", e)))?;

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        tracing::debug!(block_reason = %reason, "prompt blocked");
        return Err(DefectAiError::EmptyResponse);
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(DefectAiError::EmptyResponse);
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
        .unwrap_or_default();

    if text.trim().is_empty() {
        tracing::debug!(finish_reason = ?candidate.finish_reason, "candidate has no text");
        return Err(DefectAiError::EmptyResponse);
    }

    Ok(text)
}

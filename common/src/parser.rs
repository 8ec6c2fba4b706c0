//! APIレスポンスパーサー
//!
//! モデルの応答テキストからJSONオブジェクトを取り出し、
//! 形状を検証して `AnalysisReport` に変換する。

use crate::error::{Error, Result};
use crate::types::{AnalysisReport, ViolatedNorm};
use serde_json::{Map, Value};

/// APIレスポンスからJSON部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック
/// 2. 生の {...} オブジェクト
/// 3. エラー
///
/// # Examples
/// ```
/// use defect_ai_common::extract_json;
///
/// let response = "Результат: {\"isIdentified\": true}";
/// let json = extract_json(response).unwrap();
/// assert_eq!(json, "{\"isIdentified\": true}");
/// ```
pub fn extract_json(response: &str) -> Result<&str> {
    if let Some(start_marker) = response.find("```json") {
        let start = start_marker + 7;
        if let Some(end_offset) = response[start..].find("```") {
            let end = start + end_offset;
            return Ok(response[start..end].trim());
        }
    }

    if let Some(start) = response.find('{') {
        if let Some(end) = response.rfind('}') {
            if end >= start {
                return Ok(&response[start..=end]);
            }
        }
    }

    Err(Error::MalformedResponse("JSONが見つかりません".into()))
}

/// 解析レスポンスをパース
///
/// # Returns
/// * `Err(Error::EmptyResponse)` - 空または空白のみ
/// * `Err(Error::MalformedResponse)` - JSONでない、`isIdentified` が真偽値でない、
///   `defectDescription` が空、違反規範の要素が不正
pub fn parse_report(response: &str) -> Result<AnalysisReport> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyResponse);
    }

    // 応答全体がJSONならそのまま使い、前後に文章がある場合のみ抽出する
    let value: Value = match serde_json::from_str(trimmed) {
        Ok(value) => value,
        Err(_) => serde_json::from_str(extract_json(trimmed)?)
            .map_err(|e| Error::MalformedResponse(format!("JSONパースエラー: {}", e)))?,
    };

    let Some(map) = value.as_object() else {
        return Err(Error::MalformedResponse("JSONオブジェクトではありません".into()));
    };

    let is_identified = map
        .get("isIdentified")
        .and_then(Value::as_bool)
        .ok_or_else(|| Error::MalformedResponse("isIdentified が真偽値ではありません".into()))?;

    let defect_description = map
        .get("defectDescription")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::MalformedResponse("defectDescription が空です".into()))?;

    Ok(AnalysisReport {
        is_identified,
        defect_description,
        possible_causes: get_string(map, "possibleCauses").unwrap_or_default(),
        violated_norms: parse_norms(map.get("violatedNorms"))?,
        remediation_measures: get_string(map, "remediationMeasures").unwrap_or_default(),
    })
}

fn parse_norms(value: Option<&Value>) -> Result<Vec<ViolatedNorm>> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(Error::MalformedResponse("violatedNorms が配列ではありません".into()));
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let code = item.get("code").and_then(Value::as_str);
            let text = item.get("text").and_then(Value::as_str);
            match (code, text) {
                (Some(code), Some(text)) => Ok(ViolatedNorm::new(code, text)),
                _ => Err(Error::MalformedResponse(format!(
                    "violatedNorms[{}] に code/text がありません",
                    i
                ))),
            }
        })
        .collect()
}

fn get_string(map: &Map<String, Value>, key: &str) -> Option<String> {
    let value = map.get(key)?;
    if let Some(s) = value.as_str() {
        return Some(s.to_string());
    }
    if value.is_null() {
        return None;
    }
    Some(value.to_string())
}

//! 解析結果の型定義
//!
//! - ViolatedNorm: 違反した規範文書の条項
//! - AnalysisReport: モデルから返される構造化レポート

use serde::{Deserialize, Serialize};

/// 違反規範（規範文書の条項とその要旨）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolatedNorm {
    /// 文書と条項の表記（例: "СН 1.03.04-2020, п. 5.1.2"）
    pub code: String,
    /// 要求事項の要旨
    pub text: String,
}

impl ViolatedNorm {
    pub fn new(code: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            text: text.into(),
        }
    }
}

/// 欠陥解析レポート
///
/// `is_identified` が false の場合、`defect_description` には特定できなかった
/// 理由が入り、他のフィールドは表示されない。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub is_identified: bool,

    pub defect_description: String,

    #[serde(default)]
    pub possible_causes: String,

    #[serde(default)]
    pub violated_norms: Vec<ViolatedNorm>,

    #[serde(default)]
    pub remediation_measures: String,
}

impl AnalysisReport {
    /// 規範を "code: text" 形式で1行ずつ連結
    pub fn norms_as_lines(&self) -> String {
        self.violated_norms
            .iter()
            .map(|n| format!("{}: {}", n.code, n.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

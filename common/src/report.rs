//! レポート描画（CLI/WASM共通）
//!
//! 結果ペインと同じ構成でテキスト・印刷用HTMLを生成する。
//! 欠陥が特定できなかった場合は「Заключение」のみを出力する。

use crate::types::AnalysisReport;

/// レポートのセクション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportSection {
    /// 特定できなかった場合の結論
    Conclusion,
    Description,
    Causes,
    Norms,
    Remediation,
}

impl ReportSection {
    pub fn title(&self) -> &'static str {
        match self {
            ReportSection::Conclusion => "Заключение",
            ReportSection::Description => "Описание дефекта",
            ReportSection::Causes => "Возможные причины",
            ReportSection::Norms => "Нарушенные нормы",
            ReportSection::Remediation => "Рекомендуемые меры устранения",
        }
    }

    /// レポートで表示するセクション一覧
    pub fn for_report(report: &AnalysisReport) -> Vec<ReportSection> {
        if report.is_identified {
            vec![
                ReportSection::Description,
                ReportSection::Causes,
                ReportSection::Norms,
                ReportSection::Remediation,
            ]
        } else {
            vec![ReportSection::Conclusion]
        }
    }
}

/// セクション単位のテキスト（コピー用）
pub fn section_text(report: &AnalysisReport, section: ReportSection) -> String {
    match section {
        ReportSection::Conclusion | ReportSection::Description => report.defect_description.clone(),
        ReportSection::Causes => report.possible_causes.clone(),
        ReportSection::Norms => report.norms_as_lines(),
        ReportSection::Remediation => report.remediation_measures.clone(),
    }
}

/// プレーンテキストのレポート
pub fn render_text(report: &AnalysisReport) -> String {
    ReportSection::for_report(report)
        .into_iter()
        .map(|section| {
            let body = section_text(report, section);
            let body = if body.is_empty() { "—".to_string() } else { body };
            format!("■ {}\n{}", section.title(), body)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// 印刷用HTMLドキュメント
///
/// # Arguments
/// * `report` - 解析レポート
/// * `title` - 見出し
/// * `date` - 作成日（表示用文字列）
/// * `preview_url` - 写真のData URL（任意）
pub fn render_html(
    report: &AnalysisReport,
    title: &str,
    date: &str,
    preview_url: Option<&str>,
) -> String {
    let mut body = String::new();

    if let Some(url) = preview_url {
        body.push_str(&format!(
            "<div class=\"photo\"><img src=\"{}\" alt=\"Фото дефекта\"></div>\n",
            escape_html(url)
        ));
    }

    for section in ReportSection::for_report(report) {
        body.push_str(&format!("<h2>{}</h2>\n", section.title()));
        match section {
            ReportSection::Norms if report.violated_norms.is_empty() => {
                body.push_str("<p>—</p>\n");
            }
            ReportSection::Norms => {
                body.push_str("<ul class=\"norms\">\n");
                for norm in &report.violated_norms {
                    body.push_str(&format!(
                        "<li><span class=\"code\">{}</span><br><q>{}</q></li>\n",
                        escape_html(&norm.code),
                        escape_html(&norm.text)
                    ));
                }
                body.push_str("</ul>\n");
            }
            ReportSection::Conclusion => {
                body.push_str(&format!(
                    "<p class=\"warning\">{}</p>\n",
                    escape_html(&report.defect_description)
                ));
            }
            _ => {
                body.push_str(&format!(
                    "<p>{}</p>\n",
                    escape_html(&section_text(report, section))
                ));
            }
        }
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="ru">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: "Times New Roman", serif; margin: 20mm; color: #111; }}
h1 {{ font-size: 18pt; margin-bottom: 0; }}
.date {{ color: #555; margin-top: 4pt; }}
h2 {{ font-size: 13pt; border-bottom: 1px solid #999; margin-top: 14pt; }}
.photo img {{ max-width: 100%; max-height: 90mm; }}
.norms li {{ margin-bottom: 6pt; }}
.code {{ font-family: monospace; font-weight: bold; }}
.warning {{ color: #a15c00; }}
p {{ white-space: pre-wrap; }}
@media print {{ body {{ margin: 10mm; }} }}
</style>
</head>
<body>
<h1>{title}</h1>
<p class="date">Дата: {date}</p>
{body}</body>
</html>
"#,
        title = escape_html(title),
        date = escape_html(date),
        body = body,
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

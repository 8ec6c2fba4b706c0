//! レポートのファイル出力（JSON / 印刷用HTML）

use crate::cli::ExportFormat;
use crate::error::Result;
use defect_ai_common::{render_html, AnalysisReport};
use std::path::{Path, PathBuf};

pub struct ExportOptions<'a> {
    pub format: ExportFormat,
    pub title: &'a str,
    pub date: String,
    pub preview_url: Option<&'a str>,
}

/// タイトルをファイル名に使える形にする（パス区切りは `_` に置換）
fn file_stem_for_title(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if stem.trim_matches('.').is_empty() {
        "report".to_string()
    } else {
        stem
    }
}

fn output_path_for_format(output: &Path, title: &str, extension: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.{}", file_stem_for_title(title), extension))
    } else {
        output.to_path_buf()
    }
}

fn output_paths_for_both(output: &Path, title: &str) -> (PathBuf, PathBuf) {
    if output.is_dir() || output.extension().is_none() {
        let stem = file_stem_for_title(title);
        (
            output.join(format!("{}.json", stem)),
            output.join(format!("{}.html", stem)),
        )
    } else {
        let parent = output.parent().unwrap_or_else(|| Path::new("."));
        let stem = output
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| file_stem_for_title(title));
        (
            parent.join(format!("{}.json", stem)),
            parent.join(format!("{}.html", stem)),
        )
    }
}

pub fn write_json(report: &AnalysisReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn write_html(report: &AnalysisReport, path: &Path, options: &ExportOptions<'_>) -> Result<()> {
    let html = render_html(report, options.title, &options.date, options.preview_url);
    std::fs::write(path, html)?;
    Ok(())
}

/// 形式に応じてレポートを書き出し、出力したパスを返す
pub fn export_report(
    report: &AnalysisReport,
    output: &Path,
    options: &ExportOptions<'_>,
) -> Result<Vec<PathBuf>> {
    if output.extension().is_none() {
        std::fs::create_dir_all(output)?;
    }

    let written = match options.format {
        ExportFormat::Json => {
            let path = output_path_for_format(output, options.title, "json");
            write_json(report, &path)?;
            vec![path]
        }
        ExportFormat::Html => {
            let path = output_path_for_format(output, options.title, "html");
            write_html(report, &path, options)?;
            vec![path]
        }
        ExportFormat::Both => {
            let (json_path, html_path) = output_paths_for_both(output, options.title);
            write_json(report, &json_path)?;
            write_html(report, &html_path, options)?;
            vec![json_path, html_path]
        }
    };

    for path in &written {
        tracing::debug!(path = %path.display(), "report written");
    }

    Ok(written)
}

//! JSON/HTML出力の統合テスト

use defect_ai_common::{parse_report, AnalysisReport, ViolatedNorm};
use defect_ai_rust::cli::ExportFormat;
use defect_ai_rust::export::{export_report, ExportOptions};
use tempfile::tempdir;

fn create_test_report() -> AnalysisReport {
    AnalysisReport {
        is_identified: true,
        defect_description: "Коррозия арматуры балконной плиты".to_string(),
        possible_causes: "Недостаточный защитный слой бетона".to_string(),
        violated_norms: vec![
            ViolatedNorm::new("СН 2.01.07-2020, п. 11.2", "Защитный слой бетона"),
            ViolatedNorm::new("ТКП 45-5.09-33-2006, п. 4.5", "Антикоррозионная защита"),
        ],
        remediation_measures: "Зачистка, антикоррозионная обработка, восстановление защитного слоя".to_string(),
    }
}

fn options(format: ExportFormat) -> ExportOptions<'static> {
    ExportOptions {
        format,
        title: "Отчёт о дефекте",
        date: "15.10.2026".to_string(),
        preview_url: Some("data:image/jpeg;base64,/9j/4AAQ"),
    }
}

#[test]
fn test_export_both_into_directory() {
    let dir = tempdir().expect("Failed to create temp dir");
    let report = create_test_report();

    let written = export_report(&report, dir.path(), &options(ExportFormat::Both)).unwrap();
    assert_eq!(written.len(), 2);

    let json_path = dir.path().join("Отчёт о дефекте.json");
    let html_path = dir.path().join("Отчёт о дефекте.html");
    assert!(json_path.exists(), "JSONファイルが作成されていない");
    assert!(html_path.exists(), "HTMLファイルが作成されていない");

    let html = std::fs::read_to_string(&html_path).unwrap();
    assert!(html.contains("Коррозия арматуры балконной плиты"));
    assert!(html.contains("СН 2.01.07-2020, п. 11.2"));
    assert!(html.contains("data:image/jpeg;base64,/9j/4AAQ"));
    assert!(html.contains("15.10.2026"));
}

#[test]
fn test_saved_json_reloads_with_norm_order() {
    let dir = tempdir().expect("Failed to create temp dir");
    let report = create_test_report();
    let path = dir.path().join("defect.json");

    export_report(&report, &path, &options(ExportFormat::Json)).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("\"isIdentified\": true"));
    assert_eq!(parse_report(&content).unwrap(), report);
}

#[test]
fn test_export_html_only_to_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("print.html");

    let written = export_report(&create_test_report(), &path, &options(ExportFormat::Html)).unwrap();
    assert_eq!(written, vec![path.clone()]);
    assert!(!dir.path().join("print.json").exists());
}

#[test]
fn test_title_with_slash_is_written_into_output_dir() {
    let dir = tempdir().expect("Failed to create temp dir");
    let opts = ExportOptions {
        title: "Отчёт 1/2",
        ..options(ExportFormat::Both)
    };

    let written = export_report(&create_test_report(), dir.path(), &opts).unwrap();
    assert_eq!(
        written,
        vec![dir.path().join("Отчёт 1_2.json"), dir.path().join("Отчёт 1_2.html")]
    );
    assert!(written.iter().all(|p| p.exists()));
}

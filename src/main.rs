use clap::Parser;
use defect_ai_common::{build_request, parse_report, render_text, Selection};
use defect_ai_rust::analyzer::{DefectAnalyzer, GeminiBackend};
use defect_ai_rust::cli::{Cli, Commands, ExportFormat};
use defect_ai_rust::config::Config;
use defect_ai_rust::error::Result;
use defect_ai_rust::export::{self, ExportOptions};
use defect_ai_rust::loader;
use defect_ai_rust::session::{Session, SessionState};
use indicatif::{ProgressBar, ProgressStyle};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(kind = %e.kind(), error = ?e, "command failed");
            eprintln!("❌ {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "error" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), ".env loaded");
    }

    match cli.command {
        Commands::Analyze { image, comment, refinement, output, format, title } => {
            println!("🏗️ defect-ai - Анализ дефекта\n");

            // 1. 画像読み込み
            println!("[1/3] Загрузка фото...");
            let file = loader::load_image(&image)?;
            let mut selection = Selection::new();
            selection.select(&file, comment.as_deref(), refinement.as_deref())?;
            let Some(request) = selection.take() else {
                return Ok(());
            };
            println!("✔ {} ({}, {} байт)\n", request.file_name, request.media_type, request.image.len());

            // 2. AI解析
            println!("[2/3] Анализ...");
            let config = Config::load()?;
            let backend = GeminiBackend::from_config(&config)?;
            let analyzer = DefectAnalyzer::new(backend, config.api_key());
            let mut session = Session::new();

            let ticket = session.begin(request.clone())?;
            let spinner = spinner("Ожидание ответа модели...");
            let outcome = analyzer.analyze(&request).await;
            spinner.finish_and_clear();

            match outcome {
                Ok(report) => {
                    session.complete(ticket, Ok(report));
                }
                Err(e) => {
                    session.complete(ticket, Err(&e));
                    return Err(e);
                }
            }

            let SessionState::Success { request, report } = session.state() else {
                return Ok(());
            };
            println!("✔ Анализ завершён\n");
            println!("{}\n", render_text(report));

            // 3. 保存
            if let Some(output) = output {
                println!("[3/3] Сохранение отчёта...");
                let options = ExportOptions {
                    format,
                    title: &title,
                    date: today(),
                    preview_url: Some(request.preview_url.as_str()),
                };
                for path in export::export_report(report, &output, &options)? {
                    println!("✔ {}", path.display());
                }
            }

            println!("\n✅ Готово");
        }

        Commands::Render { input, image, output, title } => {
            println!("📄 defect-ai - Печатный отчёт\n");

            let content = std::fs::read_to_string(&input)?;
            let report = parse_report(&content)?;

            let preview_url = match image {
                Some(path) => {
                    let file = loader::load_image(&path)?;
                    Some(build_request(&file, None, None)?.preview_url)
                }
                None => None,
            };

            let output = output.unwrap_or_else(|| input.with_extension("html"));
            let options = ExportOptions {
                format: ExportFormat::Html,
                title: &title,
                date: today(),
                preview_url: preview_url.as_deref(),
            };
            export::write_html(&report, &output, &options)?;
            println!("✔ HTML: {}", output.display());
            println!("  Откройте файл в браузере и используйте «Печать → Сохранить как PDF».");
        }

        Commands::Config { set_api_key, show } => {
            let mut config = match Config::load() {
                Ok(config) => config,
                // 読めない設定ファイルはキーの再設定で上書きする
                Err(e) if set_api_key.is_some() => {
                    tracing::debug!(error = %e, "config unreadable, starting from defaults");
                    Config::default()
                }
                Err(e) => return Err(e),
            };

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ Ключ API сохранён");
            }

            if show {
                println!("Настройки:");
                println!("  Файл: {}", Config::config_path().map(|p| p.display().to_string()).unwrap_or_default());
                println!("  Модель: {}", config.model);
                println!("  API: {}", config.api_base_url);
                println!("  Temperature: {}", config.temperature);
                println!("  Таймаут: {} с", config.timeout_seconds);
                println!("  Ключ API: {}", if config.api_key().is_some() { "задан" } else { "не задан" });
            }
        }
    }

    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

fn today() -> String {
    chrono::Local::now().format("%d.%m.%Y").to_string()
}

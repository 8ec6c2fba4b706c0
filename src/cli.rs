use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "defect-ai")]
#[command(about = "Экспертный анализ фото строительных дефектов", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Подробный журнал (debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Проанализировать фото дефекта
    Analyze {
        /// Фото дефекта (JPG, PNG, WEBP, HEIC)
        #[arg(required = true)]
        image: PathBuf,

        /// Комментарий инженера
        #[arg(short, long)]
        comment: Option<String>,

        /// Уточнение запроса
        #[arg(short, long)]
        refinement: Option<String>,

        /// Файл или каталог для сохранения отчёта
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Формат отчёта (json/html/both)
        #[arg(short, long, default_value = "both")]
        format: ExportFormat,

        /// Заголовок отчёта
        #[arg(short, long, default_value = "Отчёт о дефекте")]
        title: String,
    },

    /// Сформировать печатный HTML-отчёт из сохранённого JSON
    Render {
        /// JSON-отчёт
        #[arg(required = true)]
        input: PathBuf,

        /// Фото для вставки в отчёт
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// Выходной HTML-файл (по умолчанию рядом с JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Заголовок отчёта
        #[arg(short, long, default_value = "Отчёт о дефекте")]
        title: String,
    },

    /// Показать/изменить настройки
    Config {
        /// Сохранить ключ API
        #[arg(long)]
        set_api_key: Option<String>,

        /// Показать настройки
        #[arg(long)]
        show: bool,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Html,
    #[default]
    Both,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "html" | "pdf" => Ok(ExportFormat::Html),
            "both" => Ok(ExportFormat::Both),
            _ => Err(format!("Unknown format: {}. Use json, html, or both", s)),
        }
    }
}

use crate::session::AnalysisInProgress;
use thiserror::Error;

/// ユーザーに表示するエラー区分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ConfigurationError,
    EmptyResponse,
    MalformedResponse,
    UnsupportedFileType,
    ServiceError,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::ConfigurationError => "ConfigurationError",
            ErrorKind::EmptyResponse => "EmptyResponse",
            ErrorKind::MalformedResponse => "MalformedResponse",
            ErrorKind::UnsupportedFileType => "UnsupportedFileType",
            ErrorKind::ServiceError => "ServiceError",
        };
        f.write_str(name)
    }
}

/// アプリケーションエラー
///
/// `Display` はそのまま画面に出すメッセージ。詳細はフィールドに保持し、ログにのみ出す。
#[derive(Error, Debug)]
pub enum DefectAiError {
    #[error("Ошибка конфигурации: Ключ API не найден. Задайте переменную окружения GEMINI_API_KEY или выполните `defect-ai config --set-api-key KEY`.")]
    MissingApiKey,

    #[error("Ошибка конфигурации: {0}")]
    Config(String),

    #[error("Неподдерживаемый формат ({0}). Допустимы: JPG, PNG, WEBP, HEIC.")]
    UnsupportedFileType(String),

    #[error("Ответ от модели пустой. Возможно, сработали фильтры безопасности. Попробуйте изменить запрос или фото.")]
    EmptyResponse,

    #[error("Не удалось обработать ответ от сервиса анализа. Попробуйте изменить запрос или фото.")]
    MalformedResponse(String),

    #[error("Ошибка при анализе изображения. Пожалуйста, попробуйте еще раз.")]
    ApiCall(String),

    #[error("Файл не найден: {0}")]
    FileNotFound(String),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    InProgress(#[from] AnalysisInProgress),
}

impl DefectAiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DefectAiError::MissingApiKey | DefectAiError::Config(_) => ErrorKind::ConfigurationError,
            DefectAiError::UnsupportedFileType(_) => ErrorKind::UnsupportedFileType,
            DefectAiError::EmptyResponse => ErrorKind::EmptyResponse,
            DefectAiError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            DefectAiError::ApiCall(_)
            | DefectAiError::FileNotFound(_)
            | DefectAiError::Io(_)
            | DefectAiError::Json(_)
            | DefectAiError::InProgress(_) => ErrorKind::ServiceError,
        }
    }

    /// ユーザー向けメッセージ
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

impl From<defect_ai_common::Error> for DefectAiError {
    fn from(err: defect_ai_common::Error) -> Self {
        use defect_ai_common::Error as E;
        match err {
            E::UnsupportedMediaType(what) => DefectAiError::UnsupportedFileType(what),
            E::EmptyResponse => DefectAiError::EmptyResponse,
            E::MalformedResponse(detail) => DefectAiError::MalformedResponse(detail),
            E::InvalidDataUrl => DefectAiError::MalformedResponse("invalid data URL".into()),
            E::Io(e) => DefectAiError::Io(e),
            E::Json(e) => DefectAiError::Json(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, DefectAiError>;

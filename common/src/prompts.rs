//! プロンプト生成モジュール
//!
//! - SYSTEM_INSTRUCTION: 技術監督エンジニアとしてのシステム指示
//! - build_user_prompt: 画像に添える指示文
//! - response_schema: 構造化出力のスキーマ（全5フィールド必須）

use serde_json::{json, Value};

/// コメント未入力時の既定文
pub const NO_COMMENT: &str = "Нет комментария.";

/// システム指示（ベラルーシ共和国の現行規範のみを引用させる）
pub const SYSTEM_INSTRUCTION: &str = r#"Ты — ведущий инженер технического надзора в строительстве с 20-летним опытом работы в Республике Беларусь. Твоя задача — провести экспертный анализ фотографии строительного дефекта.
Твои ответы должны быть:
1.  **Профессиональными и технически точными.** Используй правильную строительную терминологию.
2.  **Основанными на действующих нормах РБ.** Ссылайся ИСКЛЮЧИТЕЛЬНО на актуальные и действующие на сегодняшний день нормативные документы Республики Беларусь (СН, ТКП, СТБ, ГОСТ). Не используй отмененные или устаревшие нормы.
3.  **Структурированными.** Всегда предоставляй ответ в формате JSON, строго соответствующем предоставленной схеме.
4.  **Объективными.** Если по фотографии невозможно однозначно определить дефект, его причины или применимые нормы, прямо укажи это в соответствующих полях. Не додумывай информацию.
5.  **На русском языке.**

Твоя задача — помочь инженеру технадзора быстро и качественно зафиксировать дефект и подготовить предписание."#;

/// 画像に添えるユーザー指示文を生成
///
/// # Arguments
/// * `comment` - 技術者のコメント（未入力なら既定文）
/// * `refinement` - 解析対象の絞り込み指示（任意）
pub fn build_user_prompt(comment: Option<&str>, refinement: Option<&str>) -> String {
    let comment = comment.unwrap_or(NO_COMMENT);

    let mut prompt = format!(
        "Проанализируй изображение строительного дефекта.\nКомментарий инженера: \"{}\"",
        comment
    );

    if let Some(refinement) = refinement {
        prompt.push_str(&format!("\nУточнение запроса: \"{}\"", refinement));
    }

    prompt
}

/// 構造化出力スキーマ
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "isIdentified": {
                "type": "BOOLEAN",
                "description": "Был ли дефект однозначно идентифицирован по фото?"
            },
            "defectDescription": {
                "type": "STRING",
                "description": "Краткое, но точное техническое описание идентифицированного дефекта. Если не идентифицирован, указать причину (плохое качество фото, дефект не виден и т.д.)."
            },
            "possibleCauses": {
                "type": "STRING",
                "description": "Перечисление наиболее вероятных причин возникновения дефекта с технической точки зрения."
            },
            "violatedNorms": {
                "type": "ARRAY",
                "description": "Список нарушенных пунктов действующих нормативных документов Республики Беларусь. Если нормы не нарушены или не могут быть определены, оставить массив пустым.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "code": {
                            "type": "STRING",
                            "description": "Обозначение нормативного документа и пункта (например, 'СН 1.03.04-2020, п. 5.1.2')."
                        },
                        "text": {
                            "type": "STRING",
                            "description": "Краткая выдержка или суть требования нарушенного пункта."
                        }
                    },
                    "required": ["code", "text"]
                }
            },
            "remediationMeasures": {
                "type": "STRING",
                "description": "Конкретные, технически грамотные рекомендации по устранению дефекта со ссылками на технологии и материалы."
            }
        },
        "required": [
            "isIdentified",
            "defectDescription",
            "possibleCauses",
            "violatedNorms",
            "remediationMeasures"
        ]
    })
}

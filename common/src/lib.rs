//! Defect AI Common Library
//!
//! CLIと将来のWeb(WASM)フロントエンドで共有される型とユーティリティ

pub mod types;
pub mod media;
pub mod request;
pub mod error;
pub mod prompts;
pub mod parser;
pub mod report;

pub use types::{AnalysisReport, ViolatedNorm};
pub use media::{MediaType, decode_preview, encode_preview};
pub use request::{AnalysisRequest, ImageFile, Selection, build_request};
pub use error::{Error, Result};
pub use prompts::{SYSTEM_INSTRUCTION, build_user_prompt, response_schema};
pub use parser::{extract_json, parse_report};
pub use report::{ReportSection, render_html, render_text, section_text};

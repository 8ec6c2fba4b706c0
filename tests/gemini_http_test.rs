//! Gemini HTTPトランスポートのテスト
//!
//! ローカルの `TcpListener` が固定応答を返し、ステータス・エンベロープごとの
//! エラー区分と送信回数を検証

use defect_ai_common::{build_request, AnalysisRequest, ImageFile};
use defect_ai_rust::analyzer::{DefectAnalyzer, GeminiBackend};
use defect_ai_rust::config::Config;
use defect_ai_rust::error::{DefectAiError, ErrorKind};
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing_subscriber::EnvFilter;

const API_KEY: &str = "test-key-42";

/// 受信したリクエストを記録して、毎回同じ応答を返すサーバー
struct CannedServer {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl CannedServer {
    async fn start(status: &'static str, body: String) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let Ok(head) = read_request(&mut stream).await else {
                    continue;
                };
                seen.lock().unwrap().push(head);

                let response = format!(
                    "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            requests,
        }
    }

    fn request_heads(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn analyzer(&self, api_key: Option<&str>) -> DefectAnalyzer<GeminiBackend> {
        analyzer_for(&self.base_url, api_key)
    }
}

/// リクエストヘッダーを返し、本文は読み捨てる
async fn read_request(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(String::from_utf8_lossy(&buf).to_string());
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_string();
            let total = end + 4 + content_length(&head);
            while buf.len() < total {
                let n = stream.read(&mut chunk).await?;
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            return Ok(head);
        }
    }
}

fn content_length(head: &str) -> usize {
    head.lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.trim().eq_ignore_ascii_case("content-length") {
                value.trim().parse().ok()
            } else {
                None
            }
        })
        .unwrap_or(0)
}

fn analyzer_for(base_url: &str, api_key: Option<&str>) -> DefectAnalyzer<GeminiBackend> {
    let config = Config {
        api_base_url: base_url.to_string(),
        timeout_seconds: 10,
        ..Default::default()
    };
    let backend = GeminiBackend::from_config(&config).unwrap();
    DefectAnalyzer::new(backend, api_key.map(str::to_string))
}

fn request() -> AnalysisRequest {
    let file = ImageFile::new("wall.png", Some("image/png"), vec![0x89, b'P', b'N', b'G', 1, 2, 3]);
    build_request(&file, Some("Трещина в стене"), None).unwrap()
}

fn candidate_envelope(text: &str) -> String {
    json!({
        "candidates": [{
            "content": {"parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

#[tokio::test]
async fn test_valid_candidate_becomes_report() {
    let report = json!({
        "isIdentified": true,
        "defectDescription": "Наклонная трещина в кирпичной кладке",
        "possibleCauses": "Неравномерная осадка фундамента",
        "violatedNorms": [{"code": "СН 1.03.01-2019, п. 7.1", "text": "Приёмка каменных работ"}],
        "remediationMeasures": "Инъектирование трещины, мониторинг осадки"
    });
    let server = CannedServer::start("200 OK", candidate_envelope(&report.to_string())).await;

    let result = server.analyzer(Some(API_KEY)).analyze(&request()).await.unwrap();
    assert!(result.is_identified);
    assert_eq!(result.defect_description, "Наклонная трещина в кирпичной кладке");
    assert_eq!(result.violated_norms.len(), 1);
    assert_eq!(result.violated_norms[0].code, "СН 1.03.01-2019, п. 7.1");

    let heads = server.request_heads();
    assert_eq!(heads.len(), 1);
    let request_line = heads[0].lines().next().unwrap_or_default();
    assert!(request_line.starts_with("POST /models/gemini-2.5-flash:generateContent "));
    assert!(!request_line.contains("key="), "key leaked into URL: {}", request_line);
    assert!(heads[0]
        .to_ascii_lowercase()
        .contains(&format!("x-goog-api-key: {}", API_KEY)));
}

#[tokio::test]
async fn test_server_error_is_service_error() {
    let server = CannedServer::start(
        "500 Internal Server Error",
        json!({"error": {"code": 500, "message": "internal"}}).to_string(),
    )
    .await;

    let err = server.analyzer(Some(API_KEY)).analyze(&request()).await.unwrap_err();
    assert!(matches!(err, DefectAiError::ApiCall(_)));
    assert_eq!(err.kind(), ErrorKind::ServiceError);
    assert_eq!(server.request_heads().len(), 1);
}

#[tokio::test]
async fn test_blocked_prompt_is_empty_response() {
    let server = CannedServer::start(
        "200 OK",
        json!({"promptFeedback": {"blockReason": "SAFETY"}}).to_string(),
    )
    .await;

    let err = server.analyzer(Some(API_KEY)).analyze(&request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmptyResponse);
    assert_eq!(server.request_heads().len(), 1);
}

#[tokio::test]
async fn test_blank_candidate_text_is_empty_response() {
    let server = CannedServer::start("200 OK", candidate_envelope("  \n ")).await;

    let err = server.analyzer(Some(API_KEY)).analyze(&request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmptyResponse);
    assert_eq!(server.request_heads().len(), 1);
}

#[tokio::test]
async fn test_non_json_candidate_is_malformed() {
    let server = CannedServer::start("200 OK", candidate_envelope("Извините, не могу помочь.")).await;

    let err = server.analyzer(Some(API_KEY)).analyze(&request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    assert_eq!(server.request_heads().len(), 1);
}

#[tokio::test]
async fn test_html_envelope_is_malformed() {
    let server = CannedServer::start("200 OK", "<html>gateway</html>".to_string()).await;

    let err = server.analyzer(Some(API_KEY)).analyze(&request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
}

#[tokio::test]
async fn test_missing_key_sends_nothing() {
    let server = CannedServer::start("200 OK", candidate_envelope("{}")).await;

    let err = server.analyzer(None).analyze(&request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigurationError);
    assert!(server.request_heads().is_empty());
}

/// 接続できない場合もエラー内容にAPIキーが含まれない
#[tokio::test]
async fn test_connection_refused_does_not_expose_key() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let secret = "SECRET-KEY-123";
    let analyzer = analyzer_for(&format!("http://{}", addr), Some(secret));

    let err = analyzer.analyze(&request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServiceError);
    assert!(!err.to_string().contains(secret), "{}", err);
    assert!(!format!("{:?}", err).contains(secret), "{:?}", err);
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// 失敗時の診断はdebugのみ（既定のフィルタでは何も出ない）
#[tokio::test]
async fn test_failures_log_nothing_at_warn() {
    let logs = LogBuffer::default();
    let sink = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("warn"))
        .with_writer(move || sink.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let failing = CannedServer::start("503 Service Unavailable", "{}".to_string()).await;
    let blocked = CannedServer::start(
        "200 OK",
        json!({"promptFeedback": {"blockReason": "SAFETY"}}).to_string(),
    )
    .await;
    let garbage = CannedServer::start("200 OK", candidate_envelope("не JSON")).await;

    for server in [&failing, &blocked, &garbage] {
        assert!(server.analyzer(Some(API_KEY)).analyze(&request()).await.is_err());
    }

    let output = String::from_utf8_lossy(&logs.0.lock().unwrap()).to_string();
    assert!(output.is_empty(), "unexpected log output: {}", output);
}

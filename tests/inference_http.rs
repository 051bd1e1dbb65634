//! Integration tests for `InferenceClient` against a local one-shot HTTP
//! server. Each test binds an ephemeral port, serves one canned response,
//! and hands back the raw request so headers and body can be checked.
//!
//! Run with:
//!   cargo test --test inference_http

use docgen_wizard::{
    Generate, GenerationConfig, GenerationError, InferenceClient, Prompt, ResponseFormat,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Serve exactly one response; the handle resolves to the raw request.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/models/test", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        request
    });
    (url, handle)
}

/// Read headers, then as many body bytes as `Content-Length` announces.
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn client(endpoint: &str) -> InferenceClient {
    let config = GenerationConfig::builder()
        .endpoint(endpoint)
        .api_key("hf_test_token")
        .build()
        .unwrap();
    InferenceClient::new(config).unwrap()
}

fn prompt() -> Prompt {
    Prompt::compose("Write a haiku about rain", None, ResponseFormat::Html)
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_batch_response_with_echo_is_cleaned() {
    let (url, server) = serve_once(
        "200 OK",
        r#"[{"generated_text":"<s>[INST] echo [/INST]</s>```html\n<div><h1>Rain</h1><p>drops</p></div>\n```"}]"#,
    )
    .await;

    let generated = client(&url).generate(&prompt()).await.unwrap();
    assert_eq!(generated.text, "<div><h1>Rain</h1><p>drops</p></div>");
    assert_eq!(generated.format, ResponseFormat::Html);

    let request = server.await.unwrap();
    let lower = request.to_ascii_lowercase();
    assert!(request.starts_with("POST /models/test"), "got: {request}");
    assert!(lower.contains("authorization: bearer hf_test_token"));
    assert!(request.contains(r#""max_new_tokens":2048"#));
    assert!(request.contains(r#""return_full_text":false"#));
    assert!(request.contains("[INST]"));
    assert!(request.contains("Write a haiku about rain"));
}

#[tokio::test]
async fn test_model_loading_is_warming_up() {
    let (url, server) = serve_once(
        "503 Service Unavailable",
        r#"{"error":"Model is loading","estimated_time":20.0}"#,
    )
    .await;

    let err = client(&url).generate(&prompt()).await.unwrap_err();
    assert!(matches!(err, GenerationError::WarmingUp { retry: true, .. }));
    assert!(err.is_retryable());
    server.await.unwrap();
}

#[tokio::test]
async fn test_plain_outage_is_not_warming_up() {
    let (url, server) = serve_once("503 Service Unavailable", r#"{"error":"upstream down"}"#).await;

    let err = client(&url).generate(&prompt()).await.unwrap_err();
    assert!(!err.is_retryable());
    assert!(matches!(err, GenerationError::Upstream { status: 503, .. }));
    server.await.unwrap();
}

#[tokio::test]
async fn test_empty_array_is_empty_result() {
    let (url, server) = serve_once("200 OK", "[]").await;

    let err = client(&url).generate(&prompt()).await.unwrap_err();
    assert_eq!(err, GenerationError::EmptyResult);
    server.await.unwrap();
}

#[tokio::test]
async fn test_server_error_is_upstream() {
    let (url, server) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;

    let err = client(&url).generate(&prompt()).await.unwrap_err();
    match err {
        GenerationError::Upstream { status, details } => {
            assert_eq!(status, 500);
            assert!(details.contains("boom"));
        }
        other => panic!("expected Upstream, got {other:?}"),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn test_proxy_html_shape_is_accepted() {
    let (url, server) = serve_once("200 OK", r#"{"html":"<div><p>ok</p></div>"}"#).await;

    let generated = client(&url).generate(&prompt()).await.unwrap();
    assert_eq!(generated.text, "<div><p>ok</p></div>");
    server.await.unwrap();
}

#[tokio::test]
async fn test_refused_connection_is_network_error() {
    let err = client("http://127.0.0.1:1/models/test")
        .generate(&prompt())
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Network { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_missing_key_fails_before_network() {
    let config = GenerationConfig::builder()
        .endpoint("http://127.0.0.1:1/never")
        .build()
        .unwrap();
    let client = InferenceClient::new(config).unwrap();

    let err = client.generate(&prompt()).await.unwrap_err();
    assert!(matches!(err, GenerationError::Configuration { .. }));
    assert!(!client.config().is_configured());
}

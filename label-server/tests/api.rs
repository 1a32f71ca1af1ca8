//! HTTP API tests: the full router driven with `oneshot` against mock printers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use tspl_printer::{PrintError, PrintResult, PrinterConnection, PrinterDevice, PrinterStatus};

use label_server::{Config, ServerState, api::build_app};

#[derive(Clone, Copy)]
enum Mode {
    Ready,
    Refuse,
    Hang,
}

#[derive(Default)]
struct Received {
    data: Mutex<Vec<u8>>,
    opens: AtomicUsize,
}

impl Received {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.data.lock().unwrap()).into_owned()
    }
}

struct MockPrinter {
    mode: Mode,
    received: Arc<Received>,
}

struct MockLink {
    mode: Mode,
    received: Arc<Received>,
}

#[async_trait]
impl PrinterDevice for MockPrinter {
    async fn open(&self) -> PrintResult<Box<dyn PrinterConnection>> {
        if let Mode::Refuse = self.mode {
            return Err(PrintError::Connection("connection refused".into()));
        }
        self.received.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockLink {
            mode: self.mode,
            received: self.received.clone(),
        }))
    }

    fn describe(&self) -> String {
        "mock://label-printer".into()
    }
}

#[async_trait]
impl PrinterConnection for MockLink {
    async fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        if let Mode::Hang = self.mode {
            std::future::pending::<()>().await;
        }
        self.received.data.lock().unwrap().extend_from_slice(data);
        Ok(())
    }

    async fn query_status(&mut self) -> PrintResult<PrinterStatus> {
        Ok(PrinterStatus::from_byte(0x00))
    }

    async fn close(&mut self) -> PrintResult<()> {
        Ok(())
    }
}

fn app(mode: Mode) -> (axum::Router, Arc<Received>) {
    let received = Arc::new(Received::default());
    let device = Arc::new(MockPrinter {
        mode,
        received: received.clone(),
    });
    let state = ServerState::new(Config::default(), device);
    (build_app(state), received)
}

async fn call(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_root_info() {
    let (app, _) = app(Mode::Ready);
    let (status, body) = call(app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "label-server");
    assert_eq!(body["health"], "/health");
}

#[tokio::test]
async fn test_health_does_not_touch_printer() {
    let (app, received) = app(Mode::Ready);
    let (status, body) = call(app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "alive");
    assert_eq!(body["printer"]["device"], "mock://label-printer");
    assert_eq!(body["printer"]["state"], "disconnected");
    assert_eq!(body["printer"]["queued"], 0);
    assert_eq!(received.opens.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_print_single_text_rows() {
    let (app, received) = app(Mode::Ready);
    let (status, body) = call(
        app,
        "POST",
        "/print",
        Some(json!({
            "template": "single-text",
            "print_list": [{"text": "物料A"}, {"text": "物料B"}],
            "qty": 3
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["labels"], 2);
    assert_eq!(body["copies"], 3);
    assert!(body["job_id"].is_string());

    let sent = received.text();
    assert_eq!(sent.matches("PRINT 3,1\r\n").count(), 2);
    assert!(sent.contains("TEXT 30,80,\"TSS24.BF2\",0,1,1,\"物料A\""));
    assert!(sent.contains("SIZE 100 mm, 90 mm"));
}

#[tokio::test]
async fn test_print_double_text_second_only() {
    let (app, received) = app(Mode::Ready);
    let (status, _) = call(
        app,
        "POST",
        "/print",
        Some(json!({"template": "double-text", "print_list": [{"text2": "Lot 7"}]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let sent = received.text();
    assert!(sent.contains("TEXT 30,360,"));
    assert!(!sent.contains("TEXT 30,80,"));
}

#[tokio::test]
async fn test_print_string_sizes() {
    let (app, received) = app(Mode::Ready);
    let (status, _) = call(
        app,
        "POST",
        "/print",
        Some(json!({
            "template": "barcode-with-text",
            "print_list": [{"barcode": "1234567890", "text": "SKU"}],
            "width": "60",
            "height": 40
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let sent = received.text();
    assert!(sent.contains("SIZE 60 mm, 40 mm"));
    assert!(sent.contains("BARCODE 150,150,\"128\",80,1,0,2,2,\"1234567890\""));
}

#[tokio::test]
async fn test_print_custom_layout() {
    let (app, received) = app(Mode::Ready);
    let (status, body) = call(
        app,
        "POST",
        "/print",
        Some(json!({
            "template": "custom",
            "layout": {
                "elements": [
                    {
                        "type": "text", "x": 20, "y": 20,
                        "text": "标题", "font_size": 48, "font_name": "宋体"
                    },
                    {
                        "type": "qrcode", "x": 400, "y": 20,
                        "content": "https://example.com", "size": 6
                    }
                ]
            }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["labels"], 1);
    let sent = received.text();
    assert!(sent.contains("TEXT 20,20,\"TSS24.BF2\",0,2,2,\"标题\""));
    assert!(sent.contains("QRCODE 400,20,H,6,A,0,\"https://example.com\""));
}

#[tokio::test]
async fn test_custom_layout_string_size() {
    let (app, received) = app(Mode::Ready);
    let (status, body) = call(
        app,
        "POST",
        "/print",
        Some(json!({
            "template": "custom",
            "layout": {
                "elements": [{"type": "text", "x": 10, "y": 10, "text": "Lot 7"}],
                "width": "60",
                "height": "40"
            }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(received.text().contains("SIZE 60 mm, 40 mm"));
}

#[tokio::test]
async fn test_print_quick_qrcode() {
    let (app, received) = app(Mode::Ready);
    let (status, body) = call(
        app,
        "POST",
        "/print/qrcode",
        Some(json!({"content": "https://example.com", "text": "Scan", "qty": 2, "qr_size": 5})),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["copies"], 2);
    let sent = received.text();
    assert!(sent.contains("TEXT 250,30,"));
    assert!(sent.contains("QRCODE 250,150,H,5,A,0,\"https://example.com\""));
    assert!(sent.contains("PRINT 2,1"));
}

#[tokio::test]
async fn test_validation_errors() {
    let cases = [
        json!({"template": "triple-text", "print_list": [{"text": "a"}]}),
        json!({"template": "single-text", "print_list": [{"text": ""}]}),
        json!({"template": "single-text", "print_list": [{"text": "a"}], "qty": 0}),
        json!({"template": "single-text", "print_list": [{"text": "a"}], "qty": 101}),
        json!({"template": "single-text", "print_list": []}),
        json!({"template": "single-text"}),
        json!({
            "template": "custom",
            "layout": {"elements": [{"type": "text", "x": 900, "y": 10, "text": "off"}]}
        }),
    ];

    for case in cases {
        let (app, received) = app(Mode::Ready);
        let (status, body) = call(app, "POST", "/print", Some(case.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", case);
        assert_eq!(body["kind"], "validation_error", "{}", case);
        assert!(body["detail"].is_string());
        assert_eq!(received.opens.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn test_unsupported_symbology() {
    let (app, _) = app(Mode::Ready);
    let (status, body) = call(
        app,
        "POST",
        "/print",
        Some(json!({
            "template": "custom",
            "layout": {"elements": [{
                "type": "barcode", "x": 10, "y": 10,
                "content": "123", "barcode_type": "PDF417"
            }]}
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "unsupported_symbology");
}

#[tokio::test]
async fn test_malformed_json() {
    let (app, _) = app(Mode::Ready);
    let request = Request::builder()
        .method("POST")
        .uri("/print")
        .header("content-type", "application/json")
        .body(Body::from("{\"template\": "))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["kind"], "validation_error");
}

#[tokio::test]
async fn test_printer_unreachable() {
    let (app, _) = app(Mode::Refuse);
    let (status, body) = call(app.clone(), "POST", "/test", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["kind"], "device_unavailable");

    let (status, _) = call(
        app,
        "POST",
        "/print",
        Some(json!({"template": "single-text", "print_list": [{"text": "a"}]})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_printer_test_endpoint() {
    let (app, received) = app(Mode::Ready);
    let (status, body) = call(app.clone(), "POST", "/test", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["printer_status"], "ready");
    assert!(received.text().is_empty());

    let (_, health) = call(app, "GET", "/health", None).await;
    assert_eq!(health["printer"]["state"], "connected");
}

#[tokio::test]
async fn test_print_timeout() {
    let (app, _) = app(Mode::Hang);
    let (status, body) = call(
        app.clone(),
        "POST",
        "/print",
        Some(json!({"template": "single-text", "print_list": [{"text": "a"}], "timeout_ms": 50})),
    )
    .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["kind"], "timeout");

    let (_, health) = call(app, "GET", "/health", None).await;
    assert_eq!(health["printer"]["state"], "disconnected");
    assert_eq!(health["printer"]["jobs_failed"], 1);
}

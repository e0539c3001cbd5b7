//! HTTP endpoint tests, driven through the router without a socket.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use posproxy::ProxyError;
use posproxy::job::{Device, JobOptions, PrintService};
use posproxy::server::{AppState, EPOS_PATH, router};
use posproxy::transport::Transport;
use pretty_assertions::assert_eq;
use tower::ServiceExt;

#[derive(Clone, Default)]
struct Recorder {
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
    fail: bool,
}

impl Transport for Recorder {
    fn write_all(&mut self, data: &[u8]) -> Result<(), ProxyError> {
        if self.fail {
            return Err(ProxyError::Transport("paper jam".into()));
        }
        self.writes.lock().unwrap().push(data.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "recorder".into()
    }
}

fn app(recorder: &Recorder) -> Router {
    let device = Device::new(Box::new(recorder.clone()), Duration::from_secs(2));
    let service = PrintService::new(device, JobOptions::default());
    router(Arc::new(AppState::new(service)))
}

fn post(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(EPOS_PATH)
        .header(header::CONTENT_TYPE, "text/xml; charset=utf-8")
        .body(body.into())
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

const JOB: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body xmlns:m="http://www.epson-pos.com/schemas/2011/03/epos-print">
    <text align="center">Hello World</text>
    <cut type="feed"/>
  </s:Body>
</s:Envelope>"#;

#[tokio::test]
async fn test_post_prints_and_replies_success() {
    let recorder = Recorder::default();
    let response = app(&recorder).oneshot(post(JOB)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/xml; charset=utf-8"
    );
    let body = body_string(response).await;
    assert!(body.contains("<s:Envelope"));
    assert!(body.contains(r#"success="true""#));

    let writes = recorder.writes.lock().unwrap();
    assert_eq!(writes.len(), 1);
    assert!(writes[0].starts_with(b"\x1b@"));
    assert!(writes[0].ends_with(b"\xfa"));
}

#[tokio::test]
async fn test_invalid_xml_is_client_fault() {
    let recorder = Recorder::default();
    let response = app(&recorder)
        .oneshot(post("<s:Envelope><s:Body><text>"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_string(response).await;
    assert!(body.contains("s:Client"));
    assert!(body.contains("cannot parse XML"));
    assert!(recorder.writes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_request_is_client_fault() {
    let recorder = Recorder::default();
    let response = app(&recorder).oneshot(post(Body::empty())).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response).await.contains("cannot parse XML"));
}

#[tokio::test]
async fn test_device_failure_is_server_fault() {
    let recorder = Recorder {
        fail: true,
        ..Recorder::default()
    };
    let response = app(&recorder).oneshot(post(JOB)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_string(response).await;
    assert!(body.contains("s:Server"));
    assert!(body.contains("printer write failed"));
    assert!(body.contains("paper jam"));
}

#[tokio::test]
async fn test_preflight_mirrors_origin() {
    let recorder = Recorder::default();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri(EPOS_PATH)
        .header(header::ORIGIN, "http://pos.example:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app(&recorder).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://pos.example:3000"
    );

    let methods: Vec<String> = headers
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .unwrap()
        .to_str()
        .unwrap()
        .split(',')
        .map(|m| m.trim().to_string())
        .collect();
    for method in ["POST", "GET", "OPTIONS", "PUT", "DELETE"] {
        assert!(methods.iter().any(|m| m == method), "missing {}", method);
    }

    let allowed = headers
        .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
        .unwrap()
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    assert!(allowed.contains("content-type"));
    assert!(recorder.writes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_post_echoes_origin() {
    let recorder = Recorder::default();
    let mut request = post(JOB);
    request
        .headers_mut()
        .insert(header::ORIGIN, "http://till-2.local".parse().unwrap());
    let response = app(&recorder).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://till-2.local"
    );
}

#[tokio::test]
async fn test_get_is_not_a_print() {
    let recorder = Recorder::default();
    let request = Request::builder()
        .method(Method::GET)
        .uri(EPOS_PATH)
        .body(Body::empty())
        .unwrap();
    let response = app(&recorder).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(recorder.writes.lock().unwrap().is_empty());
}

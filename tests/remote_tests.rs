// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the processing service clients
//!
//! Each test runs a small tiny_http server on a free local port that plays
//! the processing service.

use scan_camera::app::{Executor, Message, NoticeLevel, SessionModel, SessionRuntime, SessionSettings};
use scan_camera::backends::camera::still::StillImageBackend;
use scan_camera::backends::camera::{CameraFrame, PixelFormat};
use scan_camera::errors::RemoteError;
use scan_camera::pipelines::photo::{CapturedFrame, FilterMode};
use scan_camera::remote::{
    CompileClient, DownloadAction, DownloadOutcome, Downloader, ProcessingClient, ServerClient,
};
use std::io::Read;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tiny_http::{Header, Response, Server};

/// A request as seen by the fake server
#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    body: String,
}

struct FakeServer {
    url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeServer {
    /// Serve every request with `route(method, path) -> (status, content type, body)`
    fn start<F>(route: F) -> Self
    where
        F: Fn(&str, &str) -> (u16, &'static str, Vec<u8>) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = Server::from_listener(listener, None).unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);

        std::thread::spawn(move || {
            for mut request in server.incoming_requests() {
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                let method = request.method().to_string();
                let path = request.url().to_string();
                let (status, content_type, reply) = route(&method, &path);
                recorded.lock().unwrap().push(Recorded { method, path, body });

                let header = Header::from_bytes("Content-Type", content_type).unwrap();
                let response = Response::from_data(reply)
                    .with_status_code(status)
                    .with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            url: format!("http://{}", addr),
            requests,
        }
    }

    fn client(&self) -> ServerClient {
        ServerClient::new(&self.url, Some(Duration::from_secs(5))).unwrap()
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

fn json(status: u16, body: &str) -> (u16, &'static str, Vec<u8>) {
    (status, "application/json", body.as_bytes().to_vec())
}

fn sample_frame() -> CapturedFrame {
    CapturedFrame {
        encoded: vec![0xFF, 0xD8, 0xFF, 0xD9],
        width: 4,
        height: 4,
        filter: FilterMode::Bw,
    }
}

#[tokio::test]
async fn test_process_sends_data_uri_and_filter() {
    let server = FakeServer::start(|_, _| {
        json(
            200,
            r#"{"success": true, "filename": "scan_1.jpg", "url": "/static/processed/scan_1.jpg", "detected": true}"#,
        )
    });

    let outcome = ProcessingClient::new(server.client())
        .submit(&sample_frame())
        .await
        .unwrap();
    assert_eq!(outcome.record.filename, "scan_1.jpg");
    assert!(outcome.record.detected);
    assert!(!outcome.low_confidence);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/process");
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["filter"], "bw");
    assert!(
        body["image"]
            .as_str()
            .unwrap()
            .starts_with("data:image/jpeg;base64,")
    );
}

#[tokio::test]
async fn test_process_error_body_is_read_despite_status() {
    let server = FakeServer::start(|_, _| json(400, r#"{"error": "No image data provided"}"#));

    let err = ProcessingClient::new(server.client())
        .submit(&sample_frame())
        .await
        .unwrap_err();
    assert_eq!(err, RemoteError::Processing("No image data provided".into()));
}

#[tokio::test]
async fn test_process_non_json_reply_is_server_error() {
    let server = FakeServer::start(|_, _| (500, "text/html", b"<h1>Internal</h1>".to_vec()));

    let err = ProcessingClient::new(server.client())
        .submit(&sample_frame())
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Server(_)));
}

#[tokio::test]
async fn test_unreachable_server_is_server_error() {
    // Bind and drop to get a port nobody listens on
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let client = ServerClient::new(
        &format!("http://127.0.0.1:{}", port),
        Some(Duration::from_secs(2)),
    )
    .unwrap();

    let err = ProcessingClient::new(client)
        .submit(&sample_frame())
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Server(_)));
}

#[tokio::test]
async fn test_compile_sends_ordered_filenames() {
    let server = FakeServer::start(|_, _| {
        json(
            200,
            r#"{"success": true, "download_url": "/download_pdf/Compiled_Doc_1.pdf"}"#,
        )
    });

    let result = CompileClient::new(server.client())
        .compile(vec!["b.jpg".into(), "a.jpg".into()])
        .await
        .unwrap();
    assert_eq!(result.download_url, "/download_pdf/Compiled_Doc_1.pdf");

    let requests = server.requests();
    assert_eq!(requests[0].path, "/compile");
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["filenames"], serde_json::json!(["b.jpg", "a.jpg"]));
}

#[tokio::test]
async fn test_compile_rejection() {
    let server = FakeServer::start(|_, _| json(200, r#"{"success": false, "error": "missing"}"#));

    let err = CompileClient::new(server.client())
        .compile(vec!["a.jpg".into()])
        .await
        .unwrap_err();
    assert_eq!(err, RemoteError::Compile("missing".into()));
}

#[tokio::test]
async fn test_cleanup() {
    let server = FakeServer::start(|_, _| json(200, r#"{"success": true}"#));
    server.client().cleanup().await.unwrap();
    assert_eq!(server.requests()[0].path, "/cleanup");
}

#[tokio::test]
async fn test_download_saves_into_directory() {
    let server = FakeServer::start(|_, _| (200, "application/pdf", b"%PDF-1.4 test".to_vec()));
    let dir = tempfile::tempdir().unwrap();
    let downloader = Downloader::new(
        server.client(),
        DownloadAction::Save,
        Some(dir.path().join("docs")),
    );

    let outcome = downloader
        .download("/download_pdf/Compiled_Doc_1.pdf")
        .await
        .unwrap();

    let expected = dir.path().join("docs").join("Compiled_Doc_1.pdf");
    assert_eq!(outcome, DownloadOutcome::Saved(expected.clone()));
    assert_eq!(std::fs::read(expected).unwrap(), b"%PDF-1.4 test");
    assert_eq!(server.requests()[0].method, "GET");
}

#[tokio::test]
async fn test_download_missing_file() {
    let server = FakeServer::start(|_, _| json(404, r#"{"error": "File not found"}"#));
    let dir = tempfile::tempdir().unwrap();
    let downloader = Downloader::new(
        server.client(),
        DownloadAction::Save,
        Some(dir.path().to_path_buf()),
    );

    let err = downloader
        .download("/download_pdf/gone.pdf")
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Download(_)));
    assert!(!dir.path().join("gone.pdf").exists());
}

#[test]
fn test_session_capture_compile_download() {
    let server = FakeServer::start(|method, path| match (method, path) {
        ("POST", "/process") => json(
            200,
            r#"{"success": true, "filename": "scan_1.jpg", "url": "/static/processed/scan_1.jpg", "detected": false}"#,
        ),
        ("POST", "/compile") => json(
            200,
            r#"{"success": true, "download_url": "/download_pdf/Compiled_Doc_1.pdf"}"#,
        ),
        ("GET", "/download_pdf/Compiled_Doc_1.pdf") => {
            (200, "application/pdf", b"%PDF-1.4".to_vec())
        }
        _ => json(404, r#"{"error": "not found"}"#),
    });
    let dir = tempfile::tempdir().unwrap();

    let frame = CameraFrame::new(16, 16, PixelFormat::Gray8, vec![180; 256]);
    let backend = StillImageBackend::from_frames(vec![("cam".into(), "Desk".into(), frame)]);
    let model = SessionModel::new(Box::new(backend), SessionSettings::default());
    let client = server.client();
    let downloader = Downloader::new(
        client.clone(),
        DownloadAction::Save,
        Some(dir.path().to_path_buf()),
    );

    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut session = SessionRuntime::new(
        model,
        Executor::new(client, downloader),
        rt.handle().clone(),
    );

    session.dispatch(Message::Init);
    session.dispatch(Message::Capture);
    assert_eq!(session.pending(), 1);
    rt.block_on(session.settle());

    assert_eq!(session.model().gallery().page_count(), 1);
    let notices = session.model_mut().take_notices();
    assert_eq!(notices.last().unwrap().level, NoticeLevel::Warning);

    session.dispatch(Message::Compile);
    rt.block_on(session.settle());
    assert_eq!(session.pending(), 0);

    let notices = session.model_mut().take_notices();
    assert_eq!(notices.last().unwrap().message, "PDF Downloaded!");
    assert!(dir.path().join("Compiled_Doc_1.pdf").exists());
    assert_eq!(session.model().gallery().page_count(), 1);

    let paths: Vec<_> = server.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(
        paths,
        vec!["/process", "/compile", "/download_pdf/Compiled_Doc_1.pdf"]
    );
}

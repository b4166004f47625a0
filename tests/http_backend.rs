//! Backend exchanges against a mocked Kokoro web service.

use std::net::TcpListener;
use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kokoro_studio::studio::downloads::ArtifactSaver;
use kokoro_studio::studio::surface::RecordingSurface;
use kokoro_studio::{
    ClientConfig, FormState, GenerationBackend, GenerationSessionController, HttpBackend,
    InputMode, RequestFailure, RequestOutcome, StudioError, SurfaceUpdate, UploadedFile,
    VoiceCatalog,
};

fn config_for(base_url: &str) -> ClientConfig {
    ClientConfig {
        base_url: Some(base_url.to_string()),
        timeout_secs: 5,
        ..Default::default()
    }
}

fn british_form() -> FormState {
    let catalog = VoiceCatalog::kokoro();
    let (mut form, _) = FormState::initial(&catalog, "b");
    assert!(form.select_voice(&catalog, "bf_emma"));
    form.set_text("Good morning");
    form.set_speed(1.2);
    form
}

async fn last_body(server: &MockServer) -> String {
    let requests = server.received_requests().await.unwrap_or_default();
    let request = requests.last().expect("no request reached the mock");
    String::from_utf8_lossy(&request.body).into_owned()
}

/// Find an address nothing listens on
fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

#[tokio::test]
async fn generate_sends_text_form_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .and(body_string_contains("name=\"langCode\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "session_id": "5f0c",
            "files": ["segment_0.wav", "segment_1.wav"],
            "output": "Saved to output/5f0c/segment_0.wav",
            "command": "python3 kokoro_tts.py --text 'Good morning'"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&config_for(&server.uri())).unwrap();
    let response = backend.generate(&british_form().to_request()).await.unwrap();

    assert!(response.success);
    assert_eq!(response.session_id.as_deref(), Some("5f0c"));
    assert_eq!(
        response.files,
        Some(vec!["segment_0.wav".to_string(), "segment_1.wav".to_string()])
    );

    let body = last_body(&server).await;
    for needle in [
        "name=\"inputType\"",
        "text",
        "Good morning",
        "name=\"langCode\"",
        "name=\"voice\"",
        "bf_emma",
        "name=\"speed\"",
        "1.2",
    ] {
        assert!(body.contains(needle), "missing {needle} in {body}");
    }
    assert!(!body.contains("name=\"textFile\""));
}

#[tokio::test]
async fn generate_uploads_file_in_file_mode() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "session_id": "abc",
            "files": []
        })))
        .mount(&server)
        .await;

    let mut form = british_form();
    form.set_input_mode(InputMode::File);
    form.set_file(Some(UploadedFile {
        name: "chapter1.txt".to_string(),
        contents: b"It was a dark and stormy night.".to_vec(),
    }));

    let backend = HttpBackend::new(&config_for(&server.uri())).unwrap();
    backend.generate(&form.to_request()).await.unwrap();

    let body = last_body(&server).await;
    assert!(body.contains("name=\"textFile\"; filename=\"chapter1.txt\""));
    assert!(body.contains("It was a dark and stormy night."));
    assert!(!body.contains("name=\"text\"\r\n"));
    assert!(!body.contains("Good morning"));
}

#[tokio::test]
async fn generate_respects_base_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/kokoro/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&config_for(&format!("{}/kokoro/", server.uri()))).unwrap();
    let response = backend.generate(&british_form().to_request()).await.unwrap();
    assert!(!response.success);
    assert_eq!(response.error, None);
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<h1>Internal Server Error</h1>"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&config_for(&server.uri())).unwrap();
    let err = backend
        .generate(&british_form().to_request())
        .await
        .unwrap_err();

    match err {
        StudioError::MalformedResponse(msg) => assert!(msg.starts_with("HTTP 500"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn controller_renders_backend_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "session_id": "sess-1",
            "files": ["out1.wav", "out2.wav"]
        })))
        .mount(&server)
        .await;

    let backend = Arc::new(HttpBackend::new(&config_for(&server.uri())).unwrap());
    let mut controller = GenerationSessionController::new(backend, RecordingSurface::new());

    let outcome = controller.submit(&british_form()).await;
    assert!(matches!(outcome, RequestOutcome::Success { .. }));

    let urls: Vec<String> = controller
        .surface_mut()
        .take()
        .into_iter()
        .filter_map(|u| match u {
            SurfaceUpdate::Artifact { entry } => Some(entry.url),
            _ => None,
        })
        .collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/output/sess-1/out1.wav", server.uri()),
            format!("{}/output/sess-1/out2.wav", server.uri()),
        ]
    );

    assert_eq!(controller.download_all().len(), 2);
}

#[tokio::test]
async fn controller_surfaces_backend_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "bad language",
            "command": "python3 kokoro_tts.py --lang-code q"
        })))
        .mount(&server)
        .await;

    let backend = Arc::new(HttpBackend::new(&config_for(&server.uri())).unwrap());
    let mut controller = GenerationSessionController::new(backend, RecordingSurface::new());

    let outcome = controller.submit(&british_form()).await;
    assert_eq!(
        outcome,
        RequestOutcome::Failure {
            failure: RequestFailure::BackendRejection {
                message: "bad language".to_string()
            }
        }
    );
    assert!(controller.surface().updates.iter().any(|u| matches!(
        u,
        SurfaceUpdate::Status { message, .. } if message == "Error: bad language"
    )));
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_failure() {
    let backend = Arc::new(HttpBackend::new(&config_for(&closed_port_url())).unwrap());
    let mut controller = GenerationSessionController::new(backend, RecordingSurface::new());

    let outcome = controller.submit(&british_form()).await;

    let message = match outcome {
        RequestOutcome::Failure {
            failure: RequestFailure::TransportFailure { message },
        } => message,
        other => panic!("expected transport failure, got {other:?}"),
    };
    assert!(!message.is_empty());
    assert!(!controller.is_pending());
    assert!(controller.surface().updates.iter().any(|u| matches!(
        u,
        SurfaceUpdate::Status { message: shown, .. } if *shown == format!("Error: {message}")
    )));
}

#[tokio::test]
async fn lists_session_files() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/output/sess-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": ["segment_0.wav", "segment_1.wav"]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/output/unknown"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"files": []})))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&config_for(&server.uri())).unwrap();
    assert_eq!(
        backend.list_session_files("sess-9").await.unwrap(),
        vec!["segment_0.wav", "segment_1.wav"]
    );
    assert!(backend.list_session_files("unknown").await.unwrap().is_empty());
}

#[tokio::test]
async fn saver_writes_artifact_into_download_dir() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/output/sess-1/out1.wav"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"RIFF....WAVE".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig {
        download_dir: Some(dir.path().join("downloads")),
        ..config_for(&server.uri())
    };
    let saver = ArtifactSaver::new(&config).unwrap();

    let url = format!("{}/output/sess-1/out1.wav", server.uri());
    let saved = saver.save(&url, "out1.wav").await.unwrap();

    assert_eq!(saved, dir.path().join("downloads").join("out1.wav"));
    assert_eq!(std::fs::read(&saved).unwrap(), b"RIFF....WAVE");
    assert!(!dir.path().join("downloads").join("out1.wav.part").exists());
}

#[tokio::test]
async fn saver_reports_missing_artifact() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/output/gone/out1.wav"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig {
        download_dir: Some(dir.path().to_path_buf()),
        ..config_for(&server.uri())
    };
    let saver = ArtifactSaver::new(&config).unwrap();

    let url = format!("{}/output/gone/out1.wav", server.uri());
    let err = saver.save(&url, "out1.wav").await.unwrap_err();
    assert!(matches!(err, StudioError::Http(_)));
    assert!(!dir.path().join("out1.wav").exists());
}

#[tokio::test]
async fn saver_keeps_earlier_download_with_same_name() {
    let server = MockServer::start().await;
    for (session, body) in [("first", "FIRST"), ("second", "SECOND")] {
        Mock::given(method("GET"))
            .and(path(format!("/output/{session}/segment_0.wav")))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
    }

    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig {
        download_dir: Some(dir.path().to_path_buf()),
        ..config_for(&server.uri())
    };
    let saver = ArtifactSaver::new(&config).unwrap();

    let first = saver
        .save(&format!("{}/output/first/segment_0.wav", server.uri()), "segment_0.wav")
        .await
        .unwrap();
    let second = saver
        .save(&format!("{}/output/second/segment_0.wav", server.uri()), "segment_0.wav")
        .await
        .unwrap();

    assert_eq!(first, dir.path().join("segment_0.wav"));
    assert_eq!(second, dir.path().join("segment_0 (1).wav"));
    assert_eq!(std::fs::read_to_string(&first).unwrap(), "FIRST");
    assert_eq!(std::fs::read_to_string(&second).unwrap(), "SECOND");
}

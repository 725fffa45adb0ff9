use crate::{
    ErrorKind, SessionId, Uploader,
    store::Segment,
    upload::{CloudinarySettings, CloudinaryUploader, UploadContainer, object_name, upload_endpoint},
};

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::StatusCode,
    routing::post,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

const CLOUD_NAME: &str = "demo";
const UPLOAD_PRESET: &str = "unsigned_audio";

#[derive(Debug, Clone, Default)]
struct ReceivedPart {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Clone)]
struct MockHost {
    status: StatusCode,
    body: Value,
    received: Arc<Mutex<Vec<HashMap<String, ReceivedPart>>>>,
}

async fn handle_upload(
    State(host): State<MockHost>,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    let mut parts = HashMap::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        parts.insert(
            name,
            ReceivedPart {
                file_name,
                content_type,
                bytes,
            },
        );
    }
    host.received
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .push(parts);
    (host.status, Json(host.body.clone()))
}

/// Serve a fake Cloudinary upload endpoint on an ephemeral port.
#[allow(clippy::unwrap_used)]
async fn spawn_host(status: StatusCode, body: Value) -> (String, MockHost) {
    let host = MockHost {
        status,
        body,
        received: Arc::default(),
    };
    let app = Router::new()
        .route(
            &format!("/v1_1/{}/raw/upload", CLOUD_NAME),
            post(handle_upload),
        )
        .with_state(host.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://{}", addr), host)
}

#[allow(clippy::unwrap_used)]
fn uploader(api_base: &str, container: UploadContainer) -> CloudinaryUploader {
    CloudinaryUploader::new(CloudinarySettings {
        cloud_name: CLOUD_NAME.to_string(),
        upload_preset: UPLOAD_PRESET.to_string(),
        api_base: api_base.to_string(),
        container,
        request_timeout: Duration::from_secs(5),
    })
    .unwrap()
}

fn session() -> SessionId {
    SessionId::from_string("audio_session_1700000000000_0badc0de")
}

fn segment() -> Segment {
    Segment::new(vec![1, 0, 2, 0], "audio/L16;rate=8000;channels=1")
}

/// WHAT: A 200 response with secure_url yields that URL
/// WHY: The URL becomes the last-upload link in the tray
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_host_accepts_when_uploading_then_secure_url_returned_and_form_complete() {
    // Given: A host that accepts uploads
    let url = "https://res.cloudinary.com/demo/raw/upload/v1/chunk.wav";
    let (base, host) = spawn_host(StatusCode::OK, json!({ "secure_url": url })).await;
    let uploader = uploader(&base, UploadContainer::Wav);

    // When: Uploading a segment
    let result = uploader.upload(&segment(), &session(), 3).await.unwrap();

    // Then: URL returned, multipart form carries file, preset and object name
    assert_eq!(result, url);
    let received = host.received.lock().unwrap().clone();
    assert_eq!(received.len(), 1);
    let form = &received[0];
    assert_eq!(form["upload_preset"].bytes, UPLOAD_PRESET.as_bytes());
    let public_id = String::from_utf8(form["public_id"].bytes.clone()).unwrap();
    assert!(public_id.starts_with("audio_session_1700000000000_0badc0de_chunk_3_"));
    let file = &form["file"];
    assert_eq!(file.file_name.as_deref(), Some(format!("{}.wav", public_id).as_str()));
    assert_eq!(file.content_type.as_deref(), Some("audio/wav"));
    assert_eq!(&file.bytes[0..4], b"RIFF");
}

/// WHAT: A non-success status is an upload error carrying the status
/// WHY: HTTP 500 must keep the segment and surface a readable error
#[tokio::test]
async fn given_host_returns_500_when_uploading_then_upload_error_with_status() {
    // Given: A failing host
    let (base, _host) = spawn_host(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": { "message": "boom" } }),
    )
    .await;
    let uploader = uploader(&base, UploadContainer::Raw);

    // When: Uploading
    let result = uploader.upload(&segment(), &session(), 0).await;

    // Then: Upload error mentioning the status
    match result {
        Err(e) => {
            assert_eq!(e.kind(), ErrorKind::Upload);
            assert!(e.reason().starts_with("HTTP 500"), "{}", e.reason());
        }
        Ok(url) => unreachable!("expected failure, got {}", url),
    }
}

/// WHAT: A success response without secure_url is an upload error
/// WHY: Without a URL the segment is not acknowledged and must be kept
#[tokio::test]
async fn given_response_without_url_when_uploading_then_upload_error() {
    // Given: A host that answers 200 without a URL
    let (base, _host) = spawn_host(StatusCode::OK, json!({ "public_id": "x" })).await;
    let uploader = uploader(&base, UploadContainer::Raw);

    // When: Uploading
    let result = uploader.upload(&segment(), &session(), 0).await;

    // Then: Upload error
    assert!(matches!(result, Err(ref e) if e.kind() == ErrorKind::Upload));
}

/// WHAT: An unreachable host is an upload error
/// WHY: Offline operation must leave the segment stored
#[tokio::test]
async fn given_unreachable_host_when_uploading_then_upload_error() {
    // Given: A port nothing listens on
    let uploader = uploader("http://127.0.0.1:9", UploadContainer::Raw);

    // When: Uploading
    let result = uploader.upload(&segment(), &session(), 0).await;

    // Then: Upload error
    assert!(matches!(result, Err(ref e) if e.kind() == ErrorKind::Upload));
}

/// WHAT: Endpoint is built from base and cloud name
/// WHY: Trailing slashes in config must not produce a double slash
#[test]
fn given_base_with_trailing_slash_when_building_endpoint_then_single_slash() {
    assert_eq!(
        upload_endpoint("https://api.cloudinary.com/", "demo"),
        "https://api.cloudinary.com/v1_1/demo/raw/upload"
    );
}

/// WHAT: Object names differ for the same index and millisecond
/// WHY: The random suffix keeps repeated and concurrent uploads unique
#[test]
fn given_same_index_and_time_when_naming_then_nonce_distinguishes() {
    let session = session();

    let a = object_name(&session, 0, 1_700_000_000_000, "aaaa1111");
    let b = object_name(&session, 0, 1_700_000_000_000, "bbbb2222");

    assert_ne!(a, b);
    assert_eq!(
        a,
        "audio_session_1700000000000_0badc0de_chunk_0_1700000000000_aaaa1111"
    );
}

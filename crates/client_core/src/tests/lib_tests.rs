use super::*;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response as AxumResponse},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use shared::{
    domain::FileKind,
    error::{ApiError, FailureKind},
};
use std::{collections::HashMap, sync::Arc};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone, Default)]
struct ReceivedUpload {
    username: Option<String>,
    password: Option<String>,
    filename: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Clone, Default)]
struct VaultServerState {
    users: Arc<Mutex<HashMap<String, (String, Vec<FileRecord>)>>>,
    uploads: Arc<Mutex<Vec<ReceivedUpload>>>,
}

async fn read_fields(mut multipart: Multipart) -> ReceivedUpload {
    let mut received = ReceivedUpload::default();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("username") => received.username = field.text().await.ok(),
            Some("password") => received.password = field.text().await.ok(),
            Some("file") => {
                received.filename = field.file_name().map(str::to_string);
                received.content_type = field.content_type().map(str::to_string);
                received.bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
            }
            _ => {}
        }
    }
    received
}

async fn handle_register(
    State(state): State<VaultServerState>,
    multipart: Multipart,
) -> Json<serde_json::Value> {
    let fields = read_fields(multipart).await;
    let (Some(username), Some(password)) = (fields.username, fields.password) else {
        return Json(json!({"success": false}));
    };
    let mut users = state.users.lock().await;
    if users.contains_key(&username) {
        return Json(json!({"success": false, "message": "Username already exists."}));
    }
    users.insert(username, (password, Vec::new()));
    Json(json!({"success": true, "message": "Account created successfully."}))
}

async fn handle_login(
    State(state): State<VaultServerState>,
    multipart: Multipart,
) -> Json<serde_json::Value> {
    let fields = read_fields(multipart).await;
    let users = state.users.lock().await;
    match (fields.username, fields.password) {
        (Some(username), Some(password))
            if users.get(&username).is_some_and(|(stored, _)| *stored == password) =>
        {
            Json(json!({"success": true, "username": username}))
        }
        _ => Json(json!({"success": false, "message": "Invalid credentials."})),
    }
}

async fn handle_files(
    State(state): State<VaultServerState>,
    Path(username): Path<String>,
) -> Json<serde_json::Value> {
    let users = state.users.lock().await;
    let files = users
        .get(&username)
        .map(|(_, files)| files.clone())
        .unwrap_or_default();
    Json(json!({"files": files}))
}

async fn handle_encrypt(
    State(state): State<VaultServerState>,
    multipart: Multipart,
) -> AxumResponse {
    let upload = read_fields(multipart).await;
    state.uploads.lock().await.push(upload.clone());
    let Some(username) = upload.username.clone() else {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    };
    if username == "broken" {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    if let Some((_, files)) = state.users.lock().await.get_mut(&username) {
        files.push(FileRecord {
            name: upload.filename.clone().unwrap_or_default(),
            kind: FileKind::Encrypted,
        });
    }
    let mut sealed = format!("ENC:{username}:").into_bytes();
    sealed.extend_from_slice(&upload.bytes);
    sealed.into_response()
}

async fn handle_decrypt(
    State(state): State<VaultServerState>,
    multipart: Multipart,
) -> AxumResponse {
    let upload = read_fields(multipart).await;
    state.uploads.lock().await.push(upload.clone());
    let prefix = format!("ENC:{}:", upload.username.unwrap_or_default()).into_bytes();
    match upload.bytes.strip_prefix(prefix.as_slice()) {
        Some(plaintext) => plaintext.to_vec().into_response(),
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Decryption failed."})),
        )
            .into_response(),
    }
}

async fn spawn_vault_server() -> (String, VaultServerState) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = VaultServerState::default();
    let app = Router::new()
        .route("/register", post(handle_register))
        .route("/login", post(handle_login))
        .route("/files/:username", get(handle_files))
        .route("/encrypt", post(handle_encrypt))
        .route("/decrypt", post(handle_decrypt))
        .route(
            "/broken/login",
            post(|| async { (StatusCode::BAD_GATEWAY, "<html>upstream down</html>") }),
        )
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

#[tokio::test]
async fn register_then_login_returns_confirmed_username() {
    let (server_url, _) = spawn_vault_server().await;
    let client = HttpVaultClient::from_base(&server_url).expect("client");

    let message = client.register("alice", "s3cret").await.expect("register");
    assert_eq!(message.as_deref(), Some("Account created successfully."));

    let username = client.login("alice", "s3cret").await.expect("login");
    assert_eq!(username, "alice");
}

#[tokio::test]
async fn duplicate_registration_is_rejected_with_server_message() {
    let (server_url, _) = spawn_vault_server().await;
    let client = HttpVaultClient::from_base(&server_url).expect("client");
    client.register("alice", "one").await.expect("first register");

    let err = client
        .register("alice", "two")
        .await
        .expect_err("duplicate must fail");
    assert_eq!(err.kind(), FailureKind::RemoteRejected);
    let api: ApiError = err.into();
    assert_eq!(api.message.as_deref(), Some("Username already exists."));
}

#[tokio::test]
async fn wrong_password_is_remote_rejection() {
    let (server_url, _) = spawn_vault_server().await;
    let client = HttpVaultClient::from_base(&server_url).expect("client");
    client.register("alice", "right").await.expect("register");

    let err = client.login("alice", "wrong").await.expect_err("must fail");
    match err {
        GatewayError::Rejected {
            operation, message, ..
        } => {
            assert_eq!(operation, "login");
            assert_eq!(message.as_deref(), Some("Invalid credentials."));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn non_json_body_is_connectivity_failure() {
    let (server_url, _) = spawn_vault_server().await;
    let client = HttpVaultClient::from_base(&format!("{server_url}/broken")).expect("client");

    let err = client.login("alice", "pw").await.expect_err("must fail");
    assert!(matches!(
        err,
        GatewayError::UnexpectedResponse {
            operation: "login",
            status: 502
        }
    ));
    assert_eq!(err.kind(), FailureKind::ConnectivityFailed);
}

#[tokio::test]
async fn unreachable_service_is_connectivity_failure() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = HttpVaultClient::from_base(&format!("http://{addr}")).expect("client");
    let err = client.list_files("alice").await.expect_err("must fail");
    assert!(matches!(err, GatewayError::Transport { operation: "list_files", .. }));
    let api: ApiError = err.into();
    assert_eq!(api.kind, FailureKind::ConnectivityFailed);
}

#[tokio::test]
async fn encrypt_sends_multipart_fields_and_returns_payload() {
    let (server_url, state) = spawn_vault_server().await;
    let client = HttpVaultClient::from_base(&server_url).expect("client");
    client.register("alice", "pw").await.expect("register");

    let sealed = client
        .encrypt("alice", FileUpload::new("report.pdf", b"%PDF-1.7".to_vec()))
        .await
        .expect("encrypt");
    assert_eq!(sealed, b"ENC:alice:%PDF-1.7".to_vec());

    let uploads = state.uploads.lock().await.clone();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].username.as_deref(), Some("alice"));
    assert_eq!(uploads[0].filename.as_deref(), Some("report.pdf"));
    assert_eq!(uploads[0].content_type.as_deref(), Some("application/pdf"));

    let files = client.list_files("alice").await.expect("files");
    assert_eq!(
        files,
        vec![FileRecord {
            name: "report.pdf".to_string(),
            kind: FileKind::Encrypted,
        }]
    );
}

#[tokio::test]
async fn encrypt_failure_without_payload_is_connectivity_failure() {
    let (server_url, _) = spawn_vault_server().await;
    let client = HttpVaultClient::from_base(&server_url).expect("client");

    let err = client
        .encrypt("broken", FileUpload::new("notes.txt", b"hi".to_vec()))
        .await
        .expect_err("must fail");
    assert!(matches!(
        err,
        GatewayError::UnexpectedResponse {
            operation: "encrypt",
            status: 500
        }
    ));
}

#[tokio::test]
async fn decrypt_uses_owner_field_and_surfaces_detail() {
    let (server_url, _) = spawn_vault_server().await;
    let client = HttpVaultClient::from_base(&server_url).expect("client");

    let plaintext = client
        .decrypt(
            "alice",
            FileUpload::new("report.pdf.enc", b"ENC:alice:%PDF".to_vec()),
        )
        .await
        .expect("decrypt");
    assert_eq!(plaintext, b"%PDF".to_vec());

    let err = client
        .decrypt(
            "mallory",
            FileUpload::new("report.pdf.enc", b"ENC:alice:%PDF".to_vec()),
        )
        .await
        .expect_err("wrong owner must fail");
    let api: ApiError = err.into();
    assert_eq!(api.kind, FailureKind::RemoteRejected);
    assert_eq!(api.message.as_deref(), Some("Decryption failed."));
}

#[tokio::test]
async fn file_listing_escapes_username_segment() {
    let (server_url, state) = spawn_vault_server().await;
    state.users.lock().await.insert(
        "bob smith".to_string(),
        (
            "pw".to_string(),
            vec![FileRecord {
                name: "a.txt".to_string(),
                kind: FileKind::Decrypted,
            }],
        ),
    );
    let client = HttpVaultClient::from_base(&format!("{server_url}/")).expect("client");

    let files = client.list_files("bob smith").await.expect("files");
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].kind, FileKind::Decrypted);
}

#[test]
fn base_url_must_be_http() {
    assert!(matches!(
        parse_base_url("ftp://example.com"),
        Err(GatewayError::InvalidBaseUrl { .. })
    ));
    assert!(parse_base_url("not a url").is_err());
    assert!(parse_base_url(" https://vault.example.com/api ").is_ok());
}

#[test]
fn endpoint_keeps_base_path_prefix() {
    let client = HttpVaultClient::from_base("http://localhost:8000/api/").expect("client");
    let url = client.endpoint(&["files", "alice"]).expect("endpoint");
    assert_eq!(url.as_str(), "http://localhost:8000/api/files/alice");

    let client = HttpVaultClient::from_base("http://localhost:8000").expect("client");
    let url = client.endpoint(&["login"]).expect("endpoint");
    assert_eq!(url.as_str(), "http://localhost:8000/login");
}

#[test]
fn upload_guesses_mime_type_from_name() {
    assert_eq!(
        FileUpload::new("photo.png", Vec::new()).mime_type.as_deref(),
        Some("image/png")
    );
}

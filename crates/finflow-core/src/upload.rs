//! Bank statement upload relay
//!
//! Takes the file a signed-in user picked and forwards it, with their bearer
//! token, as a single-field multipart request to the ingestion endpoint. All
//! local checks (session, file type, size, duplicate submission) run before
//! any network call.

use std::collections::HashSet;
use std::sync::Mutex;

use bytes::Bytes;
use finflow_config::Config;
use glob::{MatchOptions, Pattern};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::{CoreError, CoreResult};
use super::http::{message_from_body, transport_error};
use super::models::Session;

/// A file picked by the user
#[derive(Debug, Clone)]
pub struct StatementFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Success body of the ingestion endpoint; both fields are optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub status: Option<String>,
    /// Number of transactions the endpoint stored
    #[serde(default)]
    pub count: Option<u64>,
}

/// Users with an upload in flight
#[derive(Debug, Default)]
struct InFlight {
    users: Mutex<HashSet<String>>,
}

impl InFlight {
    fn try_begin(&self, user_id: &str) -> Option<BusyGuard<'_>> {
        let mut users = self.users.lock().unwrap_or_else(|p| p.into_inner());
        if users.insert(user_id.to_string()) {
            Some(BusyGuard {
                owner: self,
                user_id: user_id.to_string(),
            })
        } else {
            None
        }
    }
}

/// Marks a user busy until dropped
struct BusyGuard<'a> {
    owner: &'a InFlight,
    user_id: String,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.owner
            .users
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&self.user_id);
    }
}

pub struct UploadRelay {
    client: Client,
    url: String,
    accept: Vec<Pattern>,
    max_bytes: usize,
    in_flight: InFlight,
}

impl UploadRelay {
    pub fn new(client: Client, url: &str, accept: &[String], max_bytes: usize) -> CoreResult<Self> {
        let accept = accept
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| CoreError::ValidationError {
                    message: format!("invalid upload pattern '{}': {}", p, e),
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(Self {
            client,
            url: url.to_string(),
            accept,
            max_bytes,
            in_flight: InFlight::default(),
        })
    }

    pub fn from_config(client: Client, config: &Config) -> CoreResult<Self> {
        Self::new(
            client,
            &config.upload_url(),
            &config.upload.accept,
            config.upload.max_bytes,
        )
    }

    /// Whether the file name matches one of the accepted patterns (case-insensitive)
    pub fn accepts(&self, file_name: &str) -> bool {
        let options = MatchOptions {
            case_sensitive: false,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        self.accept.iter().any(|p| p.matches_with(file_name, options))
    }

    /// Value for the `accept` attribute of the file input, e.g. `.csv,.xlsx`
    pub fn accept_attribute(&self) -> String {
        self.accept
            .iter()
            .filter_map(|p| p.as_str().strip_prefix('*'))
            .filter(|ext| ext.starts_with('.'))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Relay the file for the given session.
    ///
    /// `session` is `None` when the request carried no valid session; that is
    /// rejected with `Unauthenticated` before anything else is looked at.
    pub async fn upload(&self, session: Option<&Session>, file: StatementFile) -> CoreResult<UploadReceipt> {
        let session = session.ok_or(CoreError::Unauthenticated)?;

        if !self.accepts(&file.file_name) {
            return Err(CoreError::UnsupportedFileType { name: file.file_name });
        }
        if file.bytes.len() > self.max_bytes {
            return Err(CoreError::FileTooLarge {
                size: file.bytes.len(),
                limit: self.max_bytes,
            });
        }

        let _busy = self
            .in_flight
            .try_begin(&session.user.id)
            .ok_or(CoreError::UploadInProgress)?;

        log::info!(
            "Uploading statement {} ({} bytes) for user {}",
            file.file_name,
            file.bytes.len(),
            session.user.id
        );

        let mut part = Part::bytes(file.bytes.to_vec()).file_name(file.file_name.clone());
        if let Some(ref content_type) = file.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| CoreError::ValidationError {
                    message: format!("invalid content type '{}': {}", content_type, e),
                })?;
        }
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::AUTHORIZATION, session.credential.bearer())
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport_error(&self.url, e))?;

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                log::warn!("Could not read upload response body from {}: {}", self.url, e);
                String::new()
            }
        };

        if !status.is_success() {
            let detail = message_from_body(status, &body, &["detail"]);
            log::warn!(
                "Statement upload for user {} rejected with {}: {}",
                session.user.id,
                status,
                detail
            );
            return Err(CoreError::UploadRejected {
                status: status.as_u16(),
                detail,
            });
        }

        let receipt = match serde_json::from_str::<UploadReceipt>(&body) {
            Ok(receipt) => receipt,
            Err(e) => {
                log::warn!("Upload response from {} is not a receipt: {}", self.url, e);
                UploadReceipt::default()
            }
        };
        log::info!(
            "Statement {} accepted for user {} ({} transactions)",
            file.file_name,
            session.user.id,
            receipt.count.map(|c| c.to_string()).unwrap_or_else(|| "?".to_string())
        );
        Ok(receipt)
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Credential, UserIdentity};
    use crate::test_support::spawn;
    use axum::{
        extract::{Multipart, State},
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct Endpoint {
        hits: Arc<AtomicUsize>,
    }

    /// Mimics the ingestion API: CSV/XLSX only, bearer required
    async fn upload_statement(
        State(endpoint): State<Endpoint>,
        headers: HeaderMap,
        mut multipart: Multipart,
    ) -> (StatusCode, Json<serde_json::Value>) {
        endpoint.hits.fetch_add(1, Ordering::SeqCst);
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer good") {
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "detail": "Could not validate credentials" })),
            );
        }
        let mut fields = Vec::new();
        while let Ok(Some(field)) = multipart.next_field().await {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().unwrap_or_default().to_string();
            let text = field.text().await.unwrap_or_default();
            fields.push((name, file_name, text));
        }
        match fields.as_slice() {
            [(name, _, text)] if name == "file" && text.contains("boom") => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "detail": "'amount' column missing" })),
            ),
            [(name, file_name, _)] if name == "file" && file_name == "receipt.csv" => {
                (StatusCode::OK, Json(serde_json::json!("stored")))
            }
            [(name, file_name, text)] if name == "file" => {
                if file_name.ends_with("slow.csv") {
                    tokio::time::sleep(Duration::from_millis(300)).await;
                }
                let rows = text.lines().count().saturating_sub(1);
                (
                    StatusCode::OK,
                    Json(serde_json::json!({ "status": "success", "count": rows })),
                )
            }
            _ => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({ "detail": "file field required" })),
            ),
        }
    }

    async fn relay() -> (UploadRelay, Endpoint) {
        let endpoint = Endpoint::default();
        let base = spawn(
            Router::new()
                .route("/upload-statement", post(upload_statement))
                .with_state(endpoint.clone()),
        )
        .await;
        let relay = UploadRelay::new(
            Client::new(),
            &format!("{}/upload-statement", base),
            &["*.csv".to_string(), "*.xlsx".to_string()],
            1024,
        )
        .unwrap();
        (relay, endpoint)
    }

    fn session(token: &str) -> Session {
        Session::new(
            Credential::new(token),
            UserIdentity { id: "u1".to_string(), email: None },
        )
    }

    fn csv(name: &str, body: &str) -> StatementFile {
        StatementFile {
            file_name: name.to_string(),
            content_type: Some("text/csv".to_string()),
            bytes: Bytes::from(body.to_string()),
        }
    }

    #[tokio::test]
    async fn test_upload_success() {
        let (relay, endpoint) = relay().await;
        let receipt = relay
            .upload(
                Some(&session("good")),
                csv("march.csv", "date,description,amount\n2024-03-01,Rent,300\n2024-03-02,Sale,50\n"),
            )
            .await
            .unwrap();
        assert_eq!(receipt.status.as_deref(), Some("success"));
        assert_eq!(receipt.count, Some(2));
        assert_eq!(endpoint.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unexpected_success_body_gives_empty_receipt() {
        let (relay, _) = relay().await;
        let receipt = relay
            .upload(Some(&session("good")), csv("receipt.csv", "h\nrow\n"))
            .await
            .unwrap();
        assert_eq!(receipt, UploadReceipt::default());
    }

    #[tokio::test]
    async fn test_truncated_success_body_gives_empty_receipt() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            while !request.ends_with(b"--\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 64\r\n\r\n{\"status\":")
                .await;
            let _ = socket.shutdown().await;
        });

        let relay = UploadRelay::new(
            Client::new(),
            &format!("http://{}/upload-statement", addr),
            &["*.csv".to_string()],
            1024,
        )
        .unwrap();
        let receipt = relay
            .upload(Some(&session("good")), csv("march.csv", "h\nrow\n"))
            .await
            .unwrap();
        assert_eq!(receipt.count, None);
    }

    #[tokio::test]
    async fn test_no_session_rejected_before_network() {
        let (relay, endpoint) = relay().await;
        let err = relay.upload(None, csv("march.csv", "x")).await.unwrap_err();
        assert!(matches!(err, CoreError::Unauthenticated));
        assert_eq!(err.to_string(), "You must be logged in");
        assert_eq!(endpoint.hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unsupported_type_rejected_before_network() {
        let (relay, endpoint) = relay().await;
        let err = relay
            .upload(Some(&session("good")), csv("statement.pdf", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedFileType { .. }));
        assert_eq!(endpoint.hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_oversized_file_rejected() {
        let (relay, endpoint) = relay().await;
        let err = relay
            .upload(Some(&session("good")), csv("big.csv", &"a".repeat(2048)))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::FileTooLarge { size: 2048, limit: 1024 }));
        assert_eq!(endpoint.hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_surfaces_exact_detail() {
        let (relay, _) = relay().await;
        let err = relay
            .upload(Some(&session("good")), csv("march.csv", "boom"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::UploadRejected { status: 500, .. }));
        assert_eq!(err.to_string(), "'amount' column missing");
    }

    #[tokio::test]
    async fn test_rejected_token_surfaces_detail() {
        let (relay, _) = relay().await;
        let err = relay
            .upload(Some(&session("expired")), csv("march.csv", "x"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Could not validate credentials");
    }

    #[tokio::test]
    async fn test_duplicate_submission_rejected_while_busy() {
        let (relay, endpoint) = relay().await;
        let relay = Arc::new(relay);

        let first = tokio::spawn({
            let relay = relay.clone();
            async move {
                relay
                    .upload(Some(&session("good")), csv("slow.csv", "h\nrow\n"))
                    .await
            }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;

        let second = relay
            .upload(Some(&session("good")), csv("again.csv", "h\nrow\n"))
            .await;
        assert!(matches!(second, Err(CoreError::UploadInProgress)));

        assert!(first.await.unwrap().is_ok());
        assert_eq!(endpoint.hits.load(Ordering::SeqCst), 1);

        // The guard is released once the first upload finishes
        let third = relay
            .upload(Some(&session("good")), csv("again.csv", "h\nrow\n"))
            .await;
        assert!(third.is_ok());
        assert_eq!(endpoint.hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_accepts_is_case_insensitive() {
        let relay = UploadRelay::new(
            Client::new(),
            "http://api.test/upload-statement",
            &["*.csv".to_string(), "*.xlsx".to_string()],
            10,
        )
        .unwrap();
        assert!(relay.accepts("March.CSV"));
        assert!(relay.accepts("q1.xlsx"));
        assert!(!relay.accepts("q1.xls"));
        assert!(!relay.accepts("csv"));
        assert_eq!(relay.accept_attribute(), ".csv,.xlsx");
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let result = UploadRelay::new(Client::new(), "http://api.test", &["[".to_string()], 10);
        assert!(matches!(result, Err(CoreError::ValidationError { .. })));
    }
}

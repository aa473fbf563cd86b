//! Shared HTTP plumbing for the remote collaborators

use std::time::Duration;

use finflow_config::Config;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::error::{CoreError, CoreResult};

/// Build the client shared by every collaborator
pub fn build_client(config: &Config) -> CoreResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.api.timeout_secs))
        .user_agent(concat!("finflow/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| CoreError::Transport {
            url: String::new(),
            message: e.to_string(),
        })
}

pub(crate) fn transport_error(url: &str, error: reqwest::Error) -> CoreError {
    CoreError::Transport {
        url: url.to_string(),
        message: error.to_string(),
    }
}

/// Decode a JSON success body
pub(crate) async fn read_json<T: DeserializeOwned>(url: &str, response: Response) -> CoreResult<T> {
    response.json::<T>().await.map_err(|e| CoreError::InvalidResponse {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// Best-effort extraction of a human-readable message from an error body.
///
/// Looks at the given keys in order; string values win, other JSON values are
/// rendered compactly. Falls back to the status reason phrase.
pub(crate) async fn error_message(response: Response, keys: &[&str]) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    message_from_body(status, &body, keys)
}

pub(crate) fn message_from_body(status: StatusCode, body: &str, keys: &[&str]) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in keys {
            match value.get(*key) {
                Some(serde_json::Value::String(s)) if !s.is_empty() => return s.clone(),
                Some(serde_json::Value::Null) | None => continue,
                Some(other) => return other.to_string(),
            }
        }
    }
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

//! Auth collaborator
//!
//! The provider owns credential issuance and storage. This module only asks it
//! three questions: who does this token belong to, sign this user in, and
//! register this user. [`GoTrueAuth`] speaks the Supabase GoTrue REST dialect.

use async_trait::async_trait;
use finflow_config::Config;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::{CoreError, CoreResult};
use super::http::{error_message, read_json, transport_error};
use super::models::{Credential, Session, UserIdentity};

/// Keys GoTrue uses for error text, most specific first
const AUTH_ERROR_KEYS: &[&str] = &["error_description", "msg", "message", "error"];

/// Result of a successful sign-up
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    /// The provider issued a session right away
    SignedIn(Session),
    /// The provider sent a confirmation email first
    ConfirmationSent { email: String },
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolve the user behind a token.
    ///
    /// `Ok(None)` means the provider does not recognize the token. Provider or
    /// transport failures are `Err(AuthUnavailable)`, never `Ok(None)`.
    async fn current_user(&self, credential: &Credential) -> CoreResult<Option<UserIdentity>>;

    async fn sign_in(&self, email: &str, password: &str) -> CoreResult<Session>;

    async fn sign_up(&self, email: &str, password: &str) -> CoreResult<SignUpOutcome>;
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: UserIdentity,
}

/// Sign-up answers either with a session or with the bare user
#[derive(Deserialize)]
struct SignUpResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<UserIdentity>,
    #[serde(default)]
    email: Option<String>,
}

/// GoTrue (Supabase Auth) REST client
pub struct GoTrueAuth {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl GoTrueAuth {
    pub fn new(client: Client, base_url: &str, anon_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }

    pub fn from_config(client: Client, config: &Config) -> Self {
        Self::new(client, &config.auth.url, &config.auth.anon_key)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, path)
    }

    fn unavailable(url: &str, error: reqwest::Error) -> CoreError {
        CoreError::AuthUnavailable {
            message: transport_error(url, error).to_string(),
        }
    }

    /// 4xx is the provider saying no; anything else means it failed
    async fn rejection(response: reqwest::Response) -> CoreError {
        let status = response.status();
        let message = error_message(response, AUTH_ERROR_KEYS).await;
        if status.is_client_error() {
            CoreError::AuthRejected { message }
        } else {
            CoreError::AuthUnavailable { message }
        }
    }
}

#[async_trait]
impl AuthProvider for GoTrueAuth {
    async fn current_user(&self, credential: &Credential) -> CoreResult<Option<UserIdentity>> {
        let url = self.endpoint("/user");
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.anon_key)
            .header(reqwest::header::AUTHORIZATION, credential.bearer())
            .send()
            .await
            .map_err(|e| Self::unavailable(&url, e))?;

        let status = response.status();
        if status.is_success() {
            let user: UserIdentity = read_json(&url, response).await.map_err(|e| {
                CoreError::AuthUnavailable { message: e.to_string() }
            })?;
            return Ok(Some(user));
        }

        if status.is_client_error() {
            log::debug!("Auth provider rejected session token with status {}", status);
            return Ok(None);
        }

        let message = error_message(response, AUTH_ERROR_KEYS).await;
        Err(CoreError::AuthUnavailable { message })
    }

    async fn sign_in(&self, email: &str, password: &str) -> CoreResult<Session> {
        let url = self.endpoint("/token?grant_type=password");
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&PasswordGrant { email, password })
            .send()
            .await
            .map_err(|e| Self::unavailable(&url, e))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let token: TokenResponse = read_json(&url, response).await?;
        log::info!("User {} signed in", token.user.id);
        Ok(Session::new(Credential::new(token.access_token), token.user))
    }

    async fn sign_up(&self, email: &str, password: &str) -> CoreResult<SignUpOutcome> {
        let url = self.endpoint("/signup");
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&PasswordGrant { email, password })
            .send()
            .await
            .map_err(|e| Self::unavailable(&url, e))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let body: SignUpResponse = read_json(&url, response).await?;
        match (body.access_token, body.user) {
            (Some(token), Some(user)) => {
                log::info!("User {} signed up and signed in", user.id);
                Ok(SignUpOutcome::SignedIn(Session::new(Credential::new(token), user)))
            }
            _ => {
                log::info!("Sign-up confirmation sent");
                Ok(SignUpOutcome::ConfirmationSent {
                    email: body.email.unwrap_or_else(|| email.to_string()),
                })
            }
        }
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn;
    use axum::{
        extract::Query,
        http::{HeaderMap, StatusCode as AxumStatus},
        routing::{get, post},
        Json, Router,
    };
    use std::collections::HashMap;

    async fn user(headers: HeaderMap) -> (AxumStatus, Json<serde_json::Value>) {
        let auth = headers.get("authorization").and_then(|v| v.to_str().ok()).unwrap_or("");
        let apikey = headers.get("apikey").and_then(|v| v.to_str().ok()).unwrap_or("");
        match (auth, apikey) {
            ("Bearer good", "anon") => (
                AxumStatus::OK,
                Json(serde_json::json!({ "id": "u1", "email": "owner@finflow.test" })),
            ),
            ("Bearer broken", _) => (
                AxumStatus::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "msg": "database down" })),
            ),
            _ => (
                AxumStatus::UNAUTHORIZED,
                Json(serde_json::json!({ "msg": "invalid JWT" })),
            ),
        }
    }

    async fn token(
        Query(q): Query<HashMap<String, String>>,
        Json(body): Json<serde_json::Value>,
    ) -> (AxumStatus, Json<serde_json::Value>) {
        if q.get("grant_type").map(String::as_str) != Some("password") {
            return (AxumStatus::BAD_REQUEST, Json(serde_json::json!({ "error": "grant" })));
        }
        if body["password"] == "hunter2" {
            (
                AxumStatus::OK,
                Json(serde_json::json!({
                    "access_token": "good",
                    "token_type": "bearer",
                    "user": { "id": "u1", "email": body["email"] }
                })),
            )
        } else {
            (
                AxumStatus::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "invalid_grant",
                    "error_description": "Invalid login credentials"
                })),
            )
        }
    }

    async fn signup(Json(body): Json<serde_json::Value>) -> (AxumStatus, Json<serde_json::Value>) {
        match body["email"].as_str() {
            Some("taken@finflow.test") => (
                AxumStatus::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({ "msg": "User already registered" })),
            ),
            Some("instant@finflow.test") => (
                AxumStatus::OK,
                Json(serde_json::json!({
                    "access_token": "fresh",
                    "user": { "id": "u2", "email": "instant@finflow.test" }
                })),
            ),
            _ => (
                AxumStatus::OK,
                Json(serde_json::json!({ "id": "u3", "email": body["email"] })),
            ),
        }
    }

    async fn provider() -> GoTrueAuth {
        let router = Router::new()
            .route("/auth/v1/user", get(user))
            .route("/auth/v1/token", post(token))
            .route("/auth/v1/signup", post(signup));
        let base = spawn(router).await;
        GoTrueAuth::new(Client::new(), &format!("{}/", base), "anon")
    }

    #[tokio::test]
    async fn test_current_user_known_token() {
        let auth = provider().await;
        let user = auth.current_user(&Credential::new("good")).await.unwrap();
        assert_eq!(user.map(|u| u.id), Some("u1".to_string()));
    }

    #[tokio::test]
    async fn test_current_user_unknown_token_is_none() {
        let auth = provider().await;
        let user = auth.current_user(&Credential::new("stale")).await.unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_current_user_provider_failure_is_error() {
        let auth = provider().await;
        let err = auth.current_user(&Credential::new("broken")).await.unwrap_err();
        assert!(matches!(err, CoreError::AuthUnavailable { ref message } if message == "database down"));
    }

    #[tokio::test]
    async fn test_current_user_unreachable_provider_is_error() {
        let auth = GoTrueAuth::new(Client::new(), "http://127.0.0.1:9", "anon");
        let err = auth.current_user(&Credential::new("good")).await.unwrap_err();
        assert!(matches!(err, CoreError::AuthUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_sign_in() {
        let auth = provider().await;
        let session = auth.sign_in("owner@finflow.test", "hunter2").await.unwrap();
        assert_eq!(session.credential.token(), "good");
        assert_eq!(session.user.email.as_deref(), Some("owner@finflow.test"));
    }

    #[tokio::test]
    async fn test_sign_in_rejected_carries_provider_message() {
        let auth = provider().await;
        let err = auth.sign_in("owner@finflow.test", "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[tokio::test]
    async fn test_sign_up_with_confirmation() {
        let auth = provider().await;
        let outcome = auth.sign_up("new@finflow.test", "hunter2").await.unwrap();
        assert_eq!(
            outcome,
            SignUpOutcome::ConfirmationSent { email: "new@finflow.test".to_string() }
        );
    }

    #[tokio::test]
    async fn test_sign_up_with_immediate_session() {
        let auth = provider().await;
        let outcome = auth.sign_up("instant@finflow.test", "hunter2").await.unwrap();
        assert!(matches!(outcome, SignUpOutcome::SignedIn(ref s) if s.credential.token() == "fresh"));
    }

    #[tokio::test]
    async fn test_sign_up_rejected() {
        let auth = provider().await;
        let err = auth.sign_up("taken@finflow.test", "hunter2").await.unwrap_err();
        assert!(matches!(err, CoreError::AuthRejected { ref message } if message == "User already registered"));
    }
}

//! Auth form submissions
//!
//! Endpoints:
//! - signin_submit: Password sign-in, sets the session cookie
//! - signup_submit: Registration; signs in directly when the provider allows it
//! - signout: Clears the session cookie

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    Form,
};
use finflow_config::Config;
use finflow_core::{CoreError, Session, SignUpOutcome};
use serde::Deserialize;

use super::page::{render_signin, render_signup, FormNotice};
use crate::session::{clear_session_cookie, redirect_to, session_cookie};
use crate::{ApiError, AppState, DASHBOARD_PATH};

#[derive(Debug, Deserialize)]
pub struct AuthForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Checked locally so obviously bad input never reaches the provider
fn validate(email: &str, password: &str) -> Result<(), &'static str> {
    if !finflow_utils::is_plausible_email(email) {
        return Err("Please enter a valid email address.");
    }
    if password.is_empty() {
        return Err("Please enter your password.");
    }
    Ok(())
}

fn form_status(error: &CoreError) -> StatusCode {
    match error {
        CoreError::AuthUnavailable { .. } | CoreError::Transport { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_REQUEST,
    }
}

/// Redirect to the dashboard carrying the new session cookie
fn signed_in(config: &Config, headers: &HeaderMap, session: &Session) -> Response {
    let cookie = match HeaderValue::from_str(&session_cookie(config, session.credential.token())) {
        Ok(cookie) => cookie,
        Err(e) => {
            log::error!("Session token is not a valid cookie value: {}", e);
            return ApiError::InternalError.into_response();
        }
    };
    let mut response = redirect_to(headers, DASHBOARD_PATH);
    response.headers_mut().append(header::SET_COOKIE, cookie);
    response
}

pub async fn signin_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<AuthForm>,
) -> Response {
    let email = form.email.trim();
    if let Err(message) = validate(email, &form.password) {
        let html = render_signin(&headers, Some(FormNotice::Error(message)), email);
        return (StatusCode::BAD_REQUEST, Html(html)).into_response();
    }

    match state.auth.sign_in(email, &form.password).await {
        Ok(session) => signed_in(&state.config, &headers, &session),
        Err(e) => {
            log::warn!("Sign-in failed: {}", e);
            let message = e.to_string();
            let html = render_signin(&headers, Some(FormNotice::Error(&message)), email);
            (form_status(&e), Html(html)).into_response()
        }
    }
}

pub async fn signup_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<AuthForm>,
) -> Response {
    let email = form.email.trim();
    if let Err(message) = validate(email, &form.password) {
        let html = render_signup(&headers, Some(FormNotice::Error(message)), email);
        return (StatusCode::BAD_REQUEST, Html(html)).into_response();
    }

    match state.auth.sign_up(email, &form.password).await {
        Ok(SignUpOutcome::SignedIn(session)) => signed_in(&state.config, &headers, &session),
        Ok(SignUpOutcome::ConfirmationSent { email }) => {
            let message = format!(
                "Registration successful! Please check {} for a confirmation link.",
                email
            );
            Html(render_signup(&headers, Some(FormNotice::Info(&message)), "")).into_response()
        }
        Err(e) => {
            log::warn!("Sign-up failed: {}", e);
            let message = e.to_string();
            let html = render_signup(&headers, Some(FormNotice::Error(&message)), email);
            (form_status(&e), Html(html)).into_response()
        }
    }
}

pub async fn signout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let mut response = redirect_to(&headers, "/");
    if let Ok(cookie) = HeaderValue::from_str(&clear_session_cookie(&state.config)) {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}

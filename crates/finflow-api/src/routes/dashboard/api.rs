//! Dashboard API endpoints - JSON API and HTMX partial responses
//!
//! Endpoints:
//! - api_transactions: Loaded transactions, newest first (JSON)
//! - api_metrics: Income, expenses, balance and breakdown (JSON)
//! - htmx_transactions_panel: Stat cards, chart and table (HTML fragment)
//! - htmx_upload_statement: Relay a statement file (HTMX)

use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Response},
    Json,
};
use finflow_core::{
    CoreError, DashboardEntry, DashboardView, GuardOutcome, MetricsSummary, StatementFile, Transaction,
    ViewScope,
};
use finflow_utils::escape_html;

use super::page::{render_panel, render_unavailable};
use super::TRANSACTIONS_CHANGED;
use crate::session::{is_htmx_request, session_token, signin_redirect};
use crate::{ApiError, AppState};

/// Multipart field carrying the statement
const FILE_FIELD: &str = "file";

/// Guard the request, then load for the verified session
pub(crate) async fn enter_dashboard(state: &AppState, headers: &HeaderMap, scope: &ViewScope) -> DashboardEntry {
    let token = session_token(headers, &state.config.session.cookie_name);
    state.dashboard.enter(token.as_deref(), scope).await
}

/// JSON endpoints answer with a status instead of a redirect
async fn ready_view(state: &AppState, headers: &HeaderMap) -> Result<DashboardView, ApiError> {
    let (_handle, scope) = ViewScope::new();
    match enter_dashboard(state, headers, &scope).await {
        DashboardEntry::Ready(view) => Ok(view),
        DashboardEntry::SignInRequired => Err(ApiError::Unauthorized),
        DashboardEntry::Unavailable(e) => Err(ApiError::Unavailable { message: e.to_string() }),
    }
}

pub async fn api_transactions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    let view = ready_view(&state, &headers).await?;
    Ok(Json(view.transactions))
}

pub async fn api_metrics(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MetricsSummary>, ApiError> {
    let view = ready_view(&state, &headers).await?;
    Ok(Json(view.metrics().summary()))
}

/// HTMX: transactions panel, re-requested on `transactions-changed`
pub async fn htmx_transactions_panel(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (_handle, scope) = ViewScope::new();
    match enter_dashboard(&state, &headers, &scope).await {
        DashboardEntry::Ready(view) => Html(render_panel(&state.config, &view)).into_response(),
        DashboardEntry::SignInRequired => signin_redirect(&state.config, &headers),
        DashboardEntry::Unavailable(_) => render_unavailable(&headers),
    }
}

/// HTMX: relay the chosen statement to the upload API
///
/// Failures come back as an alert fragment. HTMX only swaps 2xx responses, so
/// HTMX callers get 200 with the alert and plain callers get the real status.
pub async fn htmx_upload_statement(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let token = session_token(&headers, &state.config.session.cookie_name);
    let session = match state.dashboard.guard().check(token.as_deref()).await {
        GuardOutcome::Authenticated(session) => session,
        GuardOutcome::Unauthenticated => {
            return upload_failure(&headers, ApiError::from(CoreError::Unauthenticated));
        }
        GuardOutcome::CheckFailed(e) => {
            return upload_failure(&headers, ApiError::Unavailable { message: e.to_string() });
        }
    };

    let file = match read_statement(multipart).await {
        Ok(file) => file,
        Err(e) => return upload_failure(&headers, e),
    };

    match state.upload.upload(Some(&session), file).await {
        Ok(receipt) => {
            let message = match receipt.count {
                Some(count) => format!("Statement uploaded. {} transactions imported.", count),
                None => "Statement uploaded.".to_string(),
            };
            let mut response = Html(notice_html("status", "bg-emerald-50 border-emerald-200 text-emerald-700", &message))
                .into_response();
            response
                .headers_mut()
                .insert("hx-trigger", HeaderValue::from_static(TRANSACTIONS_CHANGED));
            response
        }
        Err(e) => upload_failure(&headers, ApiError::from(e)),
    }
}

/// Pull the `file` part out of the form
async fn read_statement(mut multipart: Multipart) -> Result<StatementFile, ApiError> {
    let missing = || ApiError::BadRequest {
        message: "Please choose a statement file to upload.".to_string(),
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest { message: e.body_text() })?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest { message: e.body_text() })?;
        if file_name.is_empty() {
            return Err(missing());
        }
        return Ok(StatementFile {
            file_name,
            content_type,
            bytes,
        });
    }

    Err(missing())
}

fn notice_html(role: &str, class: &str, message: &str) -> String {
    format!(
        "<div role='{}' class='p-3 border rounded-lg text-sm {}'>{}</div>",
        role,
        class,
        escape_html(message)
    )
}

fn upload_failure(headers: &HeaderMap, error: ApiError) -> Response {
    log::warn!("Statement upload failed: {}", error);
    let html = notice_html("alert", "bg-red-50 border-red-200 text-red-700", &error.to_string());
    if is_htmx_request(headers) {
        Html(html).into_response()
    } else {
        (error.status(), Html(html)).into_response()
    }
}

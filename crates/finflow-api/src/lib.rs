//! HTTP server with HTMX support
//!
//! Routes are organized into modules:
//! - routes::home: Marketing landing page
//! - routes::auth: Sign-in, sign-up and sign-out
//! - routes::dashboard: Session-gated dashboard, JSON data and statement upload
//!
//! Protected paths pass through [`session::require_session`] first.

pub mod error;
pub mod routes;
pub mod session;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use finflow_config::Config;
use finflow_core::{
    build_client, source_from_config, AuthProvider, CoreResult, Dashboard, GoTrueAuth, TransactionSource,
    UploadRelay,
};
use tokio::net::TcpListener;

pub use error::ApiError;

/// Landing page for signed-in users
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Multipart framing allowance on top of the configured file size limit
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: Arc<dyn AuthProvider>,
    pub dashboard: Dashboard,
    pub upload: Arc<UploadRelay>,
}

impl AppState {
    pub fn new(
        config: Config,
        auth: Arc<dyn AuthProvider>,
        source: Arc<dyn TransactionSource>,
        upload: UploadRelay,
    ) -> Self {
        Self {
            config: Arc::new(config),
            dashboard: Dashboard::new(auth.clone(), source),
            auth,
            upload: Arc::new(upload),
        }
    }

    /// Wire the auth provider, transaction source and upload relay from config
    pub fn from_config(config: Config) -> CoreResult<Self> {
        let client = build_client(&config)?;
        let auth: Arc<dyn AuthProvider> = Arc::new(GoTrueAuth::from_config(client.clone(), &config));
        let source = source_from_config(client.clone(), &config);
        let upload = UploadRelay::from_config(client, &config)?;
        log::debug!("Transactions are read from the {} source", source.name());
        Ok(Self::new(config, auth, source, upload))
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::auth::{page_signin, page_signup, signin_submit, signout, signup_submit};
    use routes::dashboard::{
        api_metrics, api_transactions, htmx_transactions_panel, htmx_upload_statement, page_dashboard,
    };
    use routes::home::page_home;

    let upload_limit = state.config.upload.max_bytes.saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        // API endpoints
        .route("/api/health", get(health_check))
        // Marketing
        .route("/", get(page_home))
        // Auth screens
        .route("/signin", get(page_signin).post(signin_submit))
        .route("/login", get(page_signin).post(signin_submit))
        .route("/signup", get(page_signup).post(signup_submit))
        .route("/register", get(page_signup).post(signup_submit))
        .route("/signout", post(signout))
        // Dashboard
        .route("/dashboard", get(page_dashboard))
        .route("/dashboard/transactions", get(htmx_transactions_panel))
        .route("/dashboard/transactions.json", get(api_transactions))
        .route("/dashboard/metrics.json", get(api_metrics))
        .route(
            "/dashboard/upload",
            post(htmx_upload_statement).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .layer(middleware::from_fn_with_state(state.clone(), session::require_session))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

// ==================== Template Functions ====================

/// Base HTML template
pub fn base_html(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - FinFlow</title>
    <script src="https://unpkg.com/htmx.org@1.9.10"></script>
    <script src="https://cdn.tailwindcss.com"></script>
    <style>
        .htmx-indicator {{ opacity: 0; transition: opacity 0.3s; }}
        .htmx-request .htmx-indicator {{ opacity: 1; }}
        .htmx-request.htmx-indicator {{ opacity: 1; }}
    </style>
</head>
<body class="bg-slate-50 text-gray-900 min-h-screen flex flex-col">
    {}
</body>
</html>"#,
        finflow_utils::escape_html(title),
        content
    )
}

/// Top bar for public pages
pub fn public_nav() -> String {
    r#"<nav class='flex justify-between items-center px-8 py-4 shadow-sm bg-white'>
        <a href='/' class='text-2xl font-bold text-emerald-600'>FinFlow</a>
        <div class='flex gap-4'>
            <a href='/signin' class='px-4 py-2 border border-emerald-600 text-emerald-600 rounded-lg hover:bg-emerald-50'>Sign In</a>
            <a href='/signup' class='px-4 py-2 bg-emerald-600 text-white rounded-lg hover:bg-emerald-700'>Get Started</a>
        </div>
    </nav>"#
        .to_string()
}

/// Top bar for the signed-in area
pub fn app_nav(display_name: &str) -> String {
    format!(
        r#"<nav class='flex justify-between items-center px-8 py-4 shadow-sm bg-white'>
        <a href='{}' class='text-2xl font-bold text-emerald-600'>FinFlow</a>
        <div class='flex items-center gap-4'>
            <span class='text-sm text-gray-600'>{}</span>
            <form method='post' action='/signout'>
                <button type='submit' class='px-3 py-1 text-sm border rounded-lg text-gray-700 hover:bg-gray-100'>Sign out</button>
            </form>
        </div>
    </nav>"#,
        DASHBOARD_PATH,
        finflow_utils::escape_html(display_name)
    )
}

/// Shared footer
pub fn footer() -> String {
    format!(
        "<footer class='py-6 text-center text-gray-500 text-sm'>&copy; {} FinFlow. All rights reserved.</footer>",
        chrono::Utc::now().format("%Y")
    )
}

/// Wrap content for full page or HTMX partial
pub fn page_response(headers: &axum::http::HeaderMap, title: &str, nav: &str, inner_content: &str) -> String {
    if session::is_htmx_request(headers) {
        inner_content.to_string()
    } else {
        base_html(
            title,
            &format!(
                "{}<main class='flex-1 w-full max-w-6xl mx-auto p-6'>{}</main>{}",
                nav,
                inner_content,
                footer()
            ),
        )
    }
}

/// Start the HTTP server
///
/// Builds the application state from `config`, binds the configured address
/// and serves until Ctrl-C.
pub async fn start_server(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::from_config(config)?;
    let router = create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    log::info!("Starting FinFlow server on http://{}", addr);
    log::info!("Available routes:");
    log::info!("  - / (Landing page)");
    log::info!("  - /signin, /signup (Auth screens)");
    log::info!("  - /dashboard (Transactions and metrics)");
    log::info!("  - /api/health (Liveness probe)");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped gracefully");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        log::info!("Received Ctrl-C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                log::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                log::error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

// ==================== Tests ====================

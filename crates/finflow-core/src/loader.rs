//! Transaction loading for the dashboard
//!
//! Sources:
//! - `ApiTransactionSource`: `GET {api}/transactions` with the user's bearer token
//! - `TableTransactionSource`: the auth provider's REST table endpoint, ordered by date
//!
//! The loader never fails a view: errors are logged and an empty list is
//! returned so the dashboard renders its empty state.

use std::sync::Arc;

use async_trait::async_trait;
use finflow_config::{Config, TransactionSourceKind};
use reqwest::Client;

use super::error::{CoreError, CoreResult, DefaultErrorLogger, ErrorContext, ErrorLogger};
use super::http::{read_json, transport_error};
use super::models::{Credential, Session, Transaction};
use super::scope::ViewScope;

/// Where transactions come from
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Fetch every transaction visible to the credential's owner
    async fn fetch(&self, credential: &Credential) -> CoreResult<Vec<Transaction>>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Bookkeeping API endpoint returning a JSON array
pub struct ApiTransactionSource {
    client: Client,
    url: String,
}

impl ApiTransactionSource {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            url: format!("{}/transactions", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl TransactionSource for ApiTransactionSource {
    async fn fetch(&self, credential: &Credential) -> CoreResult<Vec<Transaction>> {
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::AUTHORIZATION, credential.bearer())
            .send()
            .await
            .map_err(|e| transport_error(&self.url, e))?;

        if !response.status().is_success() {
            return Err(CoreError::FetchFailed {
                status: response.status().as_u16(),
            });
        }
        read_json(&self.url, response).await
    }

    fn name(&self) -> &'static str {
        "api"
    }
}

/// Direct query against the provider's transaction table
///
/// Row-level security on the provider side limits rows to the token's owner.
pub struct TableTransactionSource {
    client: Client,
    url: String,
    anon_key: String,
}

impl TableTransactionSource {
    pub fn new(client: Client, provider_url: &str, anon_key: &str, table: &str) -> Self {
        Self {
            client,
            url: format!(
                "{}/rest/v1/{}?select=*&order=date.desc",
                provider_url.trim_end_matches('/'),
                table
            ),
            anon_key: anon_key.to_string(),
        }
    }
}

#[async_trait]
impl TransactionSource for TableTransactionSource {
    async fn fetch(&self, credential: &Credential) -> CoreResult<Vec<Transaction>> {
        let response = self
            .client
            .get(&self.url)
            .header("apikey", &self.anon_key)
            .header(reqwest::header::AUTHORIZATION, credential.bearer())
            .send()
            .await
            .map_err(|e| transport_error(&self.url, e))?;

        if !response.status().is_success() {
            return Err(CoreError::FetchFailed {
                status: response.status().as_u16(),
            });
        }
        read_json(&self.url, response).await
    }

    fn name(&self) -> &'static str {
        "table"
    }
}

/// Pick the configured source
pub fn source_from_config(client: Client, config: &Config) -> Arc<dyn TransactionSource> {
    match config.transactions.source {
        TransactionSourceKind::Api => Arc::new(ApiTransactionSource::new(client, &config.api.base_url)),
        TransactionSourceKind::Table => Arc::new(TableTransactionSource::new(
            client,
            &config.auth.url,
            &config.auth.anon_key,
            &config.transactions.table,
        )),
    }
}

#[derive(Clone)]
pub struct TransactionLoader {
    source: Arc<dyn TransactionSource>,
    logger: Arc<dyn ErrorLogger>,
}

impl TransactionLoader {
    pub fn new(source: Arc<dyn TransactionSource>) -> Self {
        Self {
            source,
            logger: Arc::new(DefaultErrorLogger),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn ErrorLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Fetch newest-first, or fail with the reason.
    ///
    /// Resolves to `Err(Cancelled)` as soon as the scope is cancelled, dropping
    /// the in-flight request.
    pub async fn try_load(&self, credential: &Credential, scope: &ViewScope) -> CoreResult<Vec<Transaction>> {
        if scope.is_cancelled() {
            return Err(CoreError::Cancelled);
        }

        let mut transactions = tokio::select! {
            result = self.source.fetch(credential) => result?,
            _ = scope.cancelled() => return Err(CoreError::Cancelled),
        };

        // Sources are expected to order by date already; stable sort keeps
        // their order among same-day rows
        transactions.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(transactions)
    }

    /// Fetch newest-first; any failure is logged and yields an empty list
    pub async fn load(&self, credential: &Credential, scope: &ViewScope, context: &ErrorContext) -> Vec<Transaction> {
        match self.try_load(credential, scope).await {
            Ok(transactions) => {
                log::debug!(
                    "Loaded {} transactions from {} source",
                    transactions.len(),
                    self.source.name()
                );
                transactions
            }
            Err(e) => {
                self.logger.log_error(&e, context);
                Vec::new()
            }
        }
    }

    /// [`load`](Self::load) with the session's credential and user in the log context
    pub async fn load_for_session(&self, session: &Session, scope: &ViewScope) -> Vec<Transaction> {
        let context = ErrorContext::new("load_transactions").with_user_id(&session.user.id);
        self.load(&session.credential, scope, &context).await
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn;
    use axum::{http::HeaderMap, http::StatusCode, routing::get, Json, Router};
    use chrono::NaiveDate;
    use std::sync::Mutex;
    use std::time::Duration;

    async fn transactions(headers: HeaderMap) -> (StatusCode, Json<serde_json::Value>) {
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer good") {
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "detail": "Not authenticated" })),
            );
        }
        (
            StatusCode::OK,
            Json(serde_json::json!([
                { "id": 1, "date": "2024-01-05", "description": "Rent", "category": "Housing", "amount": 300, "type": "expense" },
                { "id": 2, "date": "2024-02-01", "description": "Invoice", "category": "Sales", "amount": 1000, "type": "income" },
                { "id": 3, "date": "2024-01-20", "description": "Fuel", "amount": 50.25, "type": "expense" }
            ])),
        )
    }

    async fn slow() -> Json<serde_json::Value> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Json(serde_json::json!([]))
    }

    async fn api_base() -> String {
        spawn(
            Router::new()
                .route("/transactions", get(transactions))
                .route("/slow/transactions", get(slow))
                .route("/garbage/transactions", get(|| async { "not json" })),
        )
        .await
    }

    /// Captures logged errors instead of printing them
    #[derive(Default)]
    struct RecordingLogger {
        errors: Mutex<Vec<String>>,
    }

    impl ErrorLogger for RecordingLogger {
        fn log_error(&self, error: &CoreError, context: &ErrorContext) {
            self.errors
                .lock()
                .unwrap()
                .push(format!("{}:{}", context.operation, error.code()));
        }
    }

    #[tokio::test]
    async fn test_loads_newest_first() {
        let base = api_base().await;
        let loader = TransactionLoader::new(Arc::new(ApiTransactionSource::new(Client::new(), &base)));
        let list = loader
            .try_load(&Credential::new("good"), &ViewScope::detached())
            .await
            .unwrap();

        let dates: Vec<NaiveDate> = list.iter().map(|t| t.date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            ]
        );
        assert_eq!(list[1].category, "Uncategorized");
    }

    #[tokio::test]
    async fn test_authorization_failure_yields_empty_list_and_logs() {
        let base = api_base().await;
        let logger = Arc::new(RecordingLogger::default());
        let loader = TransactionLoader::new(Arc::new(ApiTransactionSource::new(Client::new(), &base)))
            .with_logger(logger.clone());

        let list = loader
            .load(
                &Credential::new("expired"),
                &ViewScope::detached(),
                &ErrorContext::new("load_transactions"),
            )
            .await;

        assert!(list.is_empty());
        assert_eq!(*logger.errors.lock().unwrap(), vec!["load_transactions:FETCH_FAILED"]);
    }

    #[tokio::test]
    async fn test_transport_failure_yields_empty_list() {
        let loader = TransactionLoader::new(Arc::new(ApiTransactionSource::new(
            Client::new(),
            "http://127.0.0.1:9",
        )));
        let list = loader
            .load(&Credential::new("good"), &ViewScope::detached(), &ErrorContext::new("load"))
            .await;
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let base = api_base().await;
        let loader = TransactionLoader::new(Arc::new(ApiTransactionSource::new(
            Client::new(),
            &format!("{}/garbage", base),
        )));
        let err = loader
            .try_load(&Credential::new("good"), &ViewScope::detached())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_scope_aborts_fetch() {
        let base = api_base().await;
        let loader = TransactionLoader::new(Arc::new(ApiTransactionSource::new(
            Client::new(),
            &format!("{}/slow", base),
        )));
        let (handle, scope) = ViewScope::new();

        let task = tokio::spawn(async move {
            loader.try_load(&Credential::new("good"), &scope).await
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(handle);

        let result = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("fetch should stop once the view is gone")
            .unwrap();
        assert!(matches!(result, Err(CoreError::Cancelled)));
    }

    #[tokio::test]
    async fn test_already_cancelled_scope_skips_fetch() {
        let loader = TransactionLoader::new(Arc::new(ApiTransactionSource::new(
            Client::new(),
            "http://127.0.0.1:9",
        )));
        let (handle, scope) = ViewScope::new();
        handle.cancel();
        let result = loader.try_load(&Credential::new("good"), &scope).await;
        assert!(matches!(result, Err(CoreError::Cancelled)));
    }

    #[tokio::test]
    async fn test_table_source_query() {
        async fn table(
            headers: HeaderMap,
            axum::extract::Query(q): axum::extract::Query<std::collections::HashMap<String, String>>,
        ) -> (StatusCode, Json<serde_json::Value>) {
            let ok = headers.get("apikey").and_then(|v| v.to_str().ok()) == Some("anon")
                && q.get("order").map(String::as_str) == Some("date.desc")
                && q.get("select").map(String::as_str) == Some("*");
            if !ok {
                return (StatusCode::BAD_REQUEST, Json(serde_json::json!({})));
            }
            (
                StatusCode::OK,
                Json(serde_json::json!([
                    { "id": "9", "date": "2024-03-01", "amount": "12.00", "type": "income" }
                ])),
            )
        }

        let base = spawn(Router::new().route("/rest/v1/transactions", get(table))).await;
        let source = TableTransactionSource::new(Client::new(), &base, "anon", "transactions");
        let list = source.fetch(&Credential::new("good")).await.unwrap();
        assert_eq!(list.len(), 1);
        assert!(list[0].is_income());
    }

    #[test]
    fn test_source_from_config() {
        let mut config = Config::default();
        config.api.base_url = "http://api.test".to_string();
        assert_eq!(source_from_config(Client::new(), &config).name(), "api");
        config.transactions.source = TransactionSourceKind::Table;
        assert_eq!(source_from_config(Client::new(), &config).name(), "table");
    }
}

//! Core finance logic: sessions, transaction loading, metrics and statement uploads

pub mod auth;
pub mod dashboard;
pub mod error;
pub mod guard;
pub mod http;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod scope;
pub mod types;
pub mod upload;

pub use auth::{AuthProvider, GoTrueAuth, SignUpOutcome};
pub use dashboard::{Dashboard, DashboardEntry, DashboardView};
pub use error::{CoreError, CoreResult, DefaultErrorLogger, ErrorCode, ErrorContext, ErrorLogger, ErrorSeverity};
pub use guard::{GuardOutcome, SessionGuard};
pub use http::build_client;
pub use loader::{
    source_from_config, ApiTransactionSource, TableTransactionSource, TransactionLoader, TransactionSource,
};
pub use metrics::{CategorySlice, Metrics, MetricsSummary};
pub use models::{Credential, Session, Transaction, UserIdentity};
pub use scope::{ViewHandle, ViewScope};
pub use types::TransactionType;
pub use upload::{StatementFile, UploadReceipt, UploadRelay};

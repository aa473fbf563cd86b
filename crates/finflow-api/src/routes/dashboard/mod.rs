//! Dashboard routes - Metrics, transaction list, statement upload
//!
//! Every handler goes through the session guard before anything is loaded.
//! A successful upload answers with an `HX-Trigger` event that makes the
//! transactions panel fetch itself again.
//!
//! Structure:
//! - api.rs: JSON API and HTMX endpoints
//! - page.rs: Full page rendering

pub mod api;
pub mod page;

/// HTMX event fired after a statement upload succeeds
pub const TRANSACTIONS_CHANGED: &str = "transactions-changed";

pub use api::{api_metrics, api_transactions, htmx_transactions_panel, htmx_upload_statement};
pub use page::page_dashboard;

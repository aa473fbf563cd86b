//! Dashboard entry: session guard, then transaction loader, then metrics

use std::sync::Arc;

use super::auth::AuthProvider;
use super::error::CoreError;
use super::guard::{GuardOutcome, SessionGuard};
use super::loader::{TransactionLoader, TransactionSource};
use super::metrics::Metrics;
use super::models::{Session, Transaction};
use super::scope::ViewScope;

/// Everything one dashboard render needs
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub session: Session,
    /// Newest first
    pub transactions: Vec<Transaction>,
}

impl DashboardView {
    /// Recomputed on every call from the current list
    pub fn metrics(&self) -> Metrics {
        Metrics::from_transactions(&self.transactions)
    }
}

/// How a dashboard entry ended
#[derive(Debug)]
pub enum DashboardEntry {
    /// Send the visitor to sign in; nothing was loaded
    SignInRequired,
    /// The session could not be verified; nothing was loaded
    Unavailable(CoreError),
    Ready(DashboardView),
}

#[derive(Clone)]
pub struct Dashboard {
    guard: SessionGuard,
    loader: TransactionLoader,
}

impl Dashboard {
    pub fn new(auth: Arc<dyn AuthProvider>, source: Arc<dyn TransactionSource>) -> Self {
        Self {
            guard: SessionGuard::new(auth),
            loader: TransactionLoader::new(source),
        }
    }

    pub fn guard(&self) -> &SessionGuard {
        &self.guard
    }

    /// Run the guard and, only when it passes, the loader
    pub async fn enter(&self, token: Option<&str>, scope: &ViewScope) -> DashboardEntry {
        match self.guard.check(token).await {
            GuardOutcome::Unauthenticated => DashboardEntry::SignInRequired,
            GuardOutcome::CheckFailed(e) => DashboardEntry::Unavailable(e),
            GuardOutcome::Authenticated(session) => {
                let transactions = self.loader.load_for_session(&session, scope).await;
                DashboardEntry::Ready(DashboardView {
                    session,
                    transactions,
                })
            }
        }
    }
}

//! Cancellation tied to the lifetime of a view
//!
//! A view (one dashboard request) creates a [`ViewHandle`] and a [`ViewScope`].
//! Work started on behalf of the view watches the scope; cancelling or dropping
//! the handle aborts that work.

use std::sync::Arc;

use tokio::sync::watch;

/// Owner side: cancel explicitly or simply drop it
#[derive(Debug)]
pub struct ViewHandle {
    tx: watch::Sender<bool>,
}

impl ViewHandle {
    pub fn cancel(&self) {
        // No receivers left means nothing to cancel
        let _ = self.tx.send(true);
    }
}

/// Observer side, cheap to clone
#[derive(Debug, Clone)]
pub struct ViewScope {
    rx: watch::Receiver<bool>,
    // Keeps a detached scope's channel open forever
    _anchor: Option<Arc<watch::Sender<bool>>>,
}

impl ViewScope {
    pub fn new() -> (ViewHandle, ViewScope) {
        let (tx, rx) = watch::channel(false);
        (ViewHandle { tx }, ViewScope { rx, _anchor: None })
    }

    /// A scope that is never cancelled
    pub fn detached() -> ViewScope {
        let (tx, rx) = watch::channel(false);
        ViewScope {
            rx,
            _anchor: Some(Arc::new(tx)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once the owning handle is cancelled or dropped
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

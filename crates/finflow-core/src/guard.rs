//! Session guard for protected views

use std::sync::Arc;

use super::auth::AuthProvider;
use super::error::CoreError;
use super::models::{Credential, Session};

/// What a view learns on entry
#[derive(Debug)]
pub enum GuardOutcome {
    /// Proceed; the credential may be handed to data loaders
    Authenticated(Session),
    /// No token, or the provider does not recognize it
    Unauthenticated,
    /// The provider could not answer; the user may well be signed in
    CheckFailed(CoreError),
}

impl GuardOutcome {
    pub fn session(&self) -> Option<&Session> {
        match self {
            GuardOutcome::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct SessionGuard {
    auth: Arc<dyn AuthProvider>,
}

impl SessionGuard {
    pub fn new(auth: Arc<dyn AuthProvider>) -> Self {
        Self { auth }
    }

    /// Verify the token read from the request, if any.
    ///
    /// A missing or blank token is decided locally without asking the provider.
    pub async fn check(&self, token: Option<&str>) -> GuardOutcome {
        let token = match token.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return GuardOutcome::Unauthenticated,
        };

        let credential = Credential::new(token);
        match self.auth.current_user(&credential).await {
            Ok(Some(user)) => GuardOutcome::Authenticated(Session::new(credential, user)),
            Ok(None) => GuardOutcome::Unauthenticated,
            Err(e) => {
                log::warn!("Session check failed: {}", e);
                GuardOutcome::CheckFailed(e)
            }
        }
    }
}

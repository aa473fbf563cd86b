//! Route modules for the API server
//!
//! - home: Marketing landing page
//! - auth: Sign-in, sign-up, sign-out
//! - dashboard: Session-gated dashboard and statement upload
//!
//! Larger modules follow a consistent structure:
//! - mod.rs: Module declaration and exports
//! - api.rs: JSON API endpoints and HTMX form handlers
//! - page.rs: HTMX page rendering

pub mod auth;
pub mod dashboard;
pub mod home;

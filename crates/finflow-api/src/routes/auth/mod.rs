//! Auth routes - Sign-in, sign-up and sign-out
//!
//! The auth provider does the real work; these handlers validate the form,
//! call it with email and password, and manage the session cookie.
//!
//! Structure:
//! - api.rs: Form submissions
//! - page.rs: Form rendering

pub mod api;
pub mod page;

pub use api::{signin_submit, signout, signup_submit};
pub use page::{page_signin, page_signup};

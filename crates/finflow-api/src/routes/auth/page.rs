//! Auth page rendering
//!
//! Endpoints:
//! - page_signin: Sign-in form (`/signin`, `/login`)
//! - page_signup: Sign-up form (`/signup`, `/register`)

use axum::{http::HeaderMap, response::Html};
use finflow_utils::escape_html;

/// Message shown above a form
#[derive(Debug, Clone, Copy)]
pub enum FormNotice<'a> {
    Error(&'a str),
    Info(&'a str),
}

impl FormNotice<'_> {
    fn render(&self) -> String {
        let (class, role, text) = match self {
            FormNotice::Error(text) => ("bg-red-50 border-red-200 text-red-700", "alert", text),
            FormNotice::Info(text) => ("bg-emerald-50 border-emerald-200 text-emerald-700", "status", text),
        };
        format!(
            "<div role='{}' class='p-3 border rounded-lg text-sm {}'>{}</div>",
            role,
            class,
            escape_html(text)
        )
    }
}

pub async fn page_signin(headers: HeaderMap) -> Html<String> {
    Html(render_signin(&headers, None, ""))
}

pub async fn page_signup(headers: HeaderMap) -> Html<String> {
    Html(render_signup(&headers, None, ""))
}

pub fn render_signin(headers: &HeaderMap, notice: Option<FormNotice<'_>>, email: &str) -> String {
    let form = auth_form(
        "/signin",
        "Welcome Back",
        "Sign In",
        notice,
        email,
        "current-password",
        "New to FinFlow? <a href='/signup' class='text-emerald-600 font-medium'>Sign Up</a>",
    );
    crate::page_response(headers, "Sign In", &crate::public_nav(), &form)
}

pub fn render_signup(headers: &HeaderMap, notice: Option<FormNotice<'_>>, email: &str) -> String {
    let form = auth_form(
        "/signup",
        "Create your account",
        "Sign Up",
        notice,
        email,
        "new-password",
        "Already have an account? <a href='/signin' class='text-emerald-600 font-medium'>Sign In</a>",
    );
    crate::page_response(headers, "Sign Up", &crate::public_nav(), &form)
}

fn auth_form(
    action: &str,
    heading: &str,
    submit_label: &str,
    notice: Option<FormNotice<'_>>,
    email: &str,
    password_autocomplete: &str,
    footer_html: &str,
) -> String {
    format!(
        r#"<div class='flex justify-center py-12'>
        <form method='post' action='{}' class='bg-white rounded-xl shadow-sm p-8 w-full max-w-md space-y-6'>
            <h2 class='text-2xl font-bold text-center'>{}</h2>
            {}
            <input type='email' name='email' placeholder='Email' value='{}' required autocomplete='email'
                class='w-full p-3 border rounded-lg'>
            <input type='password' name='password' placeholder='Password' required autocomplete='{}'
                class='w-full p-3 border rounded-lg'>
            <button type='submit' class='w-full py-3 bg-emerald-600 text-white font-semibold rounded-lg hover:bg-emerald-700'>{}</button>
            <p class='text-sm text-center text-gray-600'>{}</p>
        </form>
    </div>"#,
        action,
        heading,
        notice.map(|n| n.render()).unwrap_or_default(),
        escape_html(email),
        password_autocomplete,
        submit_label,
        footer_html
    )
}

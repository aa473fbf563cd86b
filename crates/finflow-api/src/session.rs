//! Session cookie handling and route protection
//!
//! The cookie only carries the provider's access token. Whether that token is
//! still good is decided by the session guard, not here: the middleware turns
//! away requests that carry no token at all, before any handler runs.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use finflow_config::Config;

use crate::AppState;

/// Read the session token from the `Cookie` headers
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| {
            urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string())
        })
        .filter(|token| !token.trim().is_empty())
}

/// `Set-Cookie` value that stores the token for the whole site
pub fn session_cookie(config: &Config, token: &str) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        config.session.cookie_name,
        urlencoding::encode(token)
    );
    if config.session.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the token
pub fn clear_session_cookie(config: &Config) -> String {
    format!(
        "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax",
        config.session.cookie_name
    )
}

/// Check if request is from HTMX (partial page update)
pub fn is_htmx_request(headers: &HeaderMap) -> bool {
    headers.get("hx-request").is_some()
}

/// Full-page navigation: 303 for plain requests, `HX-Redirect` for HTMX
pub fn redirect_to(headers: &HeaderMap, location: &str) -> Response {
    if is_htmx_request(headers) {
        match HeaderValue::from_str(location) {
            Ok(value) => {
                let mut response = StatusCode::OK.into_response();
                response.headers_mut().insert("hx-redirect", value);
                response
            }
            Err(_) => StatusCode::BAD_REQUEST.into_response(),
        }
    } else {
        Redirect::to(location).into_response()
    }
}

/// Send the visitor to sign in, dropping a stale cookie if they had one
pub fn signin_redirect(config: &Config, headers: &HeaderMap) -> Response {
    let mut response = redirect_to(headers, &config.session.signin_path);
    if session_token(headers, &config.session.cookie_name).is_some() {
        if let Ok(value) = HeaderValue::from_str(&clear_session_cookie(config)) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

/// Middleware: protected paths require a session cookie
pub async fn require_session(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let config = &state.config;
    let path = request.uri().path();

    if config.is_protected(path)
        && session_token(request.headers(), &config.session.cookie_name).is_none()
    {
        log::debug!("No session for protected path {}, redirecting to sign-in", path);
        return redirect_to(request.headers(), &config.session.signin_path);
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_session_token_among_other_cookies() {
        let h = headers("theme=dark; sb-access-token=abc.def; lang=en");
        assert_eq!(session_token(&h, "sb-access-token").as_deref(), Some("abc.def"));
        assert_eq!(session_token(&h, "missing"), None);
    }

    #[test]
    fn test_empty_token_is_none() {
        let h = headers("sb-access-token=");
        assert_eq!(session_token(&h, "sb-access-token"), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let mut config = Config::default();
        let cookie = session_cookie(&config, "tok");
        assert_eq!(cookie, "sb-access-token=tok; Path=/; HttpOnly; SameSite=Lax");

        config.session.secure_cookie = true;
        assert!(session_cookie(&config, "tok").ends_with("; Secure"));
        assert!(clear_session_cookie(&config).contains("Max-Age=0"));
    }

    #[test]
    fn test_redirect_plain_and_htmx() {
        let plain = redirect_to(&HeaderMap::new(), "/login");
        assert_eq!(plain.status(), StatusCode::SEE_OTHER);
        assert_eq!(plain.headers()[header::LOCATION], "/login");

        let mut hx = HeaderMap::new();
        hx.insert("hx-request", HeaderValue::from_static("true"));
        let htmx = redirect_to(&hx, "/login");
        assert_eq!(htmx.status(), StatusCode::OK);
        assert_eq!(htmx.headers()["hx-redirect"], "/login");
    }
}

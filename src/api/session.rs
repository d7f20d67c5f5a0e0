//! Session cookie handling. A session is an opaque cookie holding the
//! user id; presence of a valid cookie authorizes write actions.

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::error::AppError;
use crate::models::User;
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

pub const SESSION_COOKIE: &str = "session";
const SESSION_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 365;

/// Extractor for the signed-in user. Rejects with 401 when the cookie
/// is missing or no longer maps to a user.
pub struct SessionUser(pub User);

impl FromRequestParts<AppState> for SessionUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = session_id(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("you must be signed in"))?;

        let user = state
            .storage
            .users
            .get(&user_id)
            .map_err(AppError::from)?
            .ok_or_else(|| ApiError::unauthorized("session is no longer valid"))?;

        Ok(SessionUser(user))
    }
}

/// Pull the session user id out of the Cookie header, if any.
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// Set-Cookie value establishing a session for the given user.
pub fn issue_cookie(user_id: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={user_id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={SESSION_MAX_AGE_SECS}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Set-Cookie value that expires the session immediately.
pub fn clear_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn parses_session_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=user-42; lang=en"),
        );
        assert_eq!(session_id(&headers).as_deref(), Some("user-42"));
    }

    #[test]
    fn missing_cookie_is_none() {
        let headers = HeaderMap::new();
        assert!(session_id(&headers).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert!(session_id(&headers).is_none());
    }

    #[test]
    fn issued_cookie_round_trips() {
        let cookie = issue_cookie("user-42", false);
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(&cookie).unwrap());
        // Only the first name=value pair matters to the parser.
        assert_eq!(session_id(&headers).as_deref(), Some("user-42"));
        assert!(!cookie.contains("Secure"));
        assert!(issue_cookie("user-42", true).contains("Secure"));
    }
}

//! Cookie-based owner identity.

use axum::{
    extract::{Request, State},
    http::{
        HeaderMap, HeaderValue,
        header::{COOKIE, SET_COOKIE},
    },
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Name of the identity cookie.
pub const COOKIE_NAME: &str = "user_data";

/// Identity of the requesting user, inserted as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(pub String);

/// Resolves the caller's identity from the `user_data` cookie.
///
/// # Cookie Format
///
/// ```text
/// user_data=<user-id>.<hex HMAC-SHA256(user-id)>
/// ```
///
/// # Flow
///
/// 1. Read `user_data` and verify its signature
/// 2. On a missing or forged cookie, issue a fresh UUID v4 identity
/// 3. Insert [`Owner`] into request extensions
/// 4. Attach `Set-Cookie` to the response when an identity was issued
///
/// Never rejects a request.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/api/user/urls", get(list_user_urls_handler))
///     .layer(middleware::from_fn_with_state(state.clone(), identity::layer));
/// ```
pub async fn layer(State(st): State<AppState>, mut req: Request, next: Next) -> Response {
    let verified = cookie_value(req.headers()).and_then(|value| st.signer.verify(&value));

    let (owner, issued) = match verified {
        Some(user_id) => (user_id, None),
        None => {
            let (user_id, value) = st.signer.issue();
            tracing::debug!("Issued identity {}", user_id);
            (user_id, Some(value))
        }
    };

    req.extensions_mut().insert(Owner(owner));

    let mut response = next.run(req).await;

    if let Some(value) = issued {
        let cookie = format!("{COOKIE_NAME}={value}; Path=/; HttpOnly");
        match HeaderValue::from_str(&cookie) {
            Ok(header) => {
                response.headers_mut().append(SET_COOKIE, header);
            }
            Err(e) => tracing::error!("Failed to encode identity cookie: {}", e),
        }
    }

    response
}

fn cookie_value(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_value_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; user_data=abc.def; lang=en"),
        );

        assert_eq!(cookie_value(&headers).as_deref(), Some("abc.def"));
    }

    #[test]
    fn test_cookie_value_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark"));

        assert!(cookie_value(&headers).is_none());
        assert!(cookie_value(&HeaderMap::new()).is_none());
    }
}

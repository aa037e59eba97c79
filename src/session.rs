//! Session gate: no token in the page URL, no configurator.

use percent_encoding::percent_decode_str;

use crate::config::AppConfig;
use crate::error::{ConfiguratorError, Result};

/// Access token taken from the `token` query parameter.
///
/// Read once at startup and attached to every authorized request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

/// Extracts the session token from `current_url`.
///
/// A missing or empty token is [`ConfiguratorError::SessionMissing`] carrying
/// the login URL the caller must navigate to.
pub fn check_session(current_url: &str, config: &AppConfig) -> Result<SessionToken> {
    match query_param(current_url, "token") {
        Some(token) if !token.is_empty() => Ok(SessionToken(token)),
        _ => Err(ConfiguratorError::SessionMissing {
            redirect: config.login_url(),
        }),
    }
}

/// First value of `key` in the query string of `url`, percent-decoded.
///
/// `url` may be a full href, a bare `?a=b` search string, or just `a=b`.
pub fn query_param(url: &str, key: &str) -> Option<String> {
    let without_fragment = url.split('#').next().unwrap_or_default();
    let query = match without_fragment.split_once('?') {
        Some((_, q)) => q,
        None if without_fragment.contains("://") => return None,
        None => without_fragment,
    };

    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        (decode(k) == key).then(|| decode(v))
    })
}

fn decode(s: &str) -> String {
    let s = s.replace('+', " ");
    percent_decode_str(&s).decode_utf8_lossy().into_owned()
}

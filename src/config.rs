//! Runtime configuration.
//!
//! Defaults come from build-time env (`CONFIGURATOR_API_URL`,
//! `CONFIGURATOR_DASHBOARD_URL`); a page may override any key with a JSON
//! block, see [`AppConfig::from_json`].

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;

use crate::error::{ConfiguratorError, Result};
use crate::session::SessionToken;

const DEFAULT_API_URL: &str = match option_env!("CONFIGURATOR_API_URL") {
    Some(url) => url,
    None => "http://localhost:3000/api/v1",
};

const DEFAULT_DASHBOARD_URL: &str = match option_env!("CONFIGURATOR_DASHBOARD_URL") {
    Some(url) => url,
    None => "http://localhost:5173",
};

/// Unreserved characters (RFC 3986) stay as-is in query values.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Backend base, `POST {api_url}/bags`.
    pub api_url: String,
    /// Companion app hosting `/login` and `/voting`.
    pub dashboard_url: String,
    pub model_path: String,
    pub logo_path: String,
    /// Part that receives the logo decal.
    pub decal_target: String,
    /// Tried when `decal_target` is not in the model.
    pub decal_fallback: String,
    /// Sent as the `user` field of every submission.
    pub user_id: String,
    pub submit_timeout_ms: u32,
    /// `error`, `warn`, `info`, `debug` or `trace`.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            dashboard_url: DEFAULT_DASHBOARD_URL.to_owned(),
            model_path: "/assets/chips_bag/scene.gltf".to_owned(),
            logo_path: "/assets/logo.png".to_owned(),
            decal_target: "bag".to_owned(),
            decal_fallback: "Object_2".to_owned(),
            user_id: "anonymous".to_owned(),
            submit_timeout_ms: 15_000,
            log_level: "debug".to_owned(),
        }
    }
}

impl AppConfig {
    /// Parses a (possibly partial) JSON object; missing keys keep their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let cfg: AppConfig =
            serde_json::from_str(text).map_err(|e| ConfiguratorError::Config(e.to_string()))?;
        Ok(cfg.normalized())
    }

    /// Strips trailing slashes from the base URLs.
    pub fn normalized(mut self) -> Self {
        self.api_url = self.api_url.trim_end_matches('/').to_owned();
        self.dashboard_url = self.dashboard_url.trim_end_matches('/').to_owned();
        self
    }

    pub fn bags_endpoint(&self) -> String {
        format!("{}/bags", self.api_url)
    }

    pub fn login_url(&self) -> String {
        format!("{}/login", self.dashboard_url)
    }

    pub fn voting_url(&self, token: &SessionToken) -> String {
        format!(
            "{}/voting?token={}",
            self.dashboard_url,
            utf8_percent_encode(token.as_str(), QUERY_VALUE)
        )
    }

    pub fn log_level(&self) -> log::Level {
        self.log_level.parse().unwrap_or(log::Level::Debug)
    }
}

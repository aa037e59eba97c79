use std::fmt;

/// Everything that can go wrong between page load and a submitted design.
///
/// Only [`ConfiguratorError::SessionMissing`] ends the session; every other
/// variant is reported to the user and leaves the page usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfiguratorError {
    /// No `token` query parameter. Carries the login URL to redirect to.
    SessionMissing { redirect: String },
    /// The base model (or its part description) could not be loaded.
    AssetLoad(String),
    /// Fetch failed before any response arrived.
    SubmissionNetwork(String),
    /// Fetch was aborted after the configured timeout.
    SubmissionTimeout { after_ms: u32 },
    /// Backend answered with a non-2xx status.
    SubmissionRejected { status: u16 },
    /// Backend answered 2xx but the body was not JSON.
    SubmissionParse(String),
    /// A required form field is absent or unusable.
    Validation(String),
    /// Frame capture from the rendering surface failed.
    Capture(String),
    /// Configuration block present but malformed.
    Config(String),
}

impl ConfiguratorError {
    /// Short, user-facing sentence for the status line.
    pub fn user_message(&self) -> String {
        match self {
            Self::SessionMissing { .. } => "Your session has expired. Redirecting to login…".into(),
            Self::AssetLoad(_) => "The bag model could not be loaded.".into(),
            Self::SubmissionNetwork(_) => "Could not reach the server. Please try again.".into(),
            Self::SubmissionTimeout { .. } => "The server took too long to answer. Please try again.".into(),
            Self::SubmissionRejected { status } => format!("The server rejected the design (HTTP {status})."),
            Self::SubmissionParse(_) => "The server sent an unexpected answer. Please try again.".into(),
            Self::Validation(msg) => msg.clone(),
            Self::Capture(_) => "Could not take a snapshot of your bag.".into(),
            Self::Config(_) => "The configurator is misconfigured.".into(),
        }
    }
}

impl fmt::Display for ConfiguratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionMissing { redirect } => write!(f, "session token missing, redirecting to {redirect}"),
            Self::AssetLoad(e) => write!(f, "asset load failed: {e}"),
            Self::SubmissionNetwork(e) => write!(f, "submission network error: {e}"),
            Self::SubmissionTimeout { after_ms } => write!(f, "submission timed out after {after_ms} ms"),
            Self::SubmissionRejected { status } => write!(f, "submission rejected with status {status}"),
            Self::SubmissionParse(e) => write!(f, "submission response is not JSON: {e}"),
            Self::Validation(e) => write!(f, "validation failed: {e}"),
            Self::Capture(e) => write!(f, "frame capture failed: {e}"),
            Self::Config(e) => write!(f, "invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfiguratorError {}

pub type Result<T> = std::result::Result<T, ConfiguratorError>;

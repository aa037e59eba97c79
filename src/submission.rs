//! Submission state machine and the multipart request it produces.
//!
//! ```text
//! Idle ──begin──▶ Submitting ──ok──▶ Submitted ──reset──▶ Idle
//!                     │
//!                     └──err──▶ ErrorReported ──begin──▶ Submitting
//! ```

use serde_json::Value;

use crate::error::{ConfiguratorError, Result};
use crate::form::{Attachment, SubmissionPayload};
use crate::session::SessionToken;

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionState {
    Idle,
    Submitting,
    /// Terminal until [`SubmissionPipeline::reset`].
    Submitted { response: Value },
    /// Last attempt failed; the form may be sent again.
    ErrorReported { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartValue {
    Text(String),
    File(Attachment),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: &'static str,
    pub value: PartValue,
}

/// Ordered multipart body. The browser picks the boundary when it encodes it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    /// Field order: name, font, color, keyFlavours, image?, user, screenshot.
    pub fn from_payload(payload: &SubmissionPayload) -> Self {
        // Vec<String> always serializes.
        let flavours = serde_json::to_string(&payload.key_flavours).unwrap_or_else(|_| "[]".into());

        let mut form = Self::default();
        form.text("name", &payload.name);
        form.text("font", &payload.font);
        form.text("color", &payload.color);
        form.text("keyFlavours", &flavours);
        if let Some(image) = &payload.image {
            form.file("image", image.clone());
        }
        form.text("user", &payload.user);
        form.file("screenshot", payload.screenshot.clone());
        form
    }

    fn text(&mut self, name: &'static str, value: &str) {
        self.parts.push(FormPart {
            name,
            value: PartValue::Text(value.to_owned()),
        });
    }

    fn file(&mut self, name: &'static str, file: Attachment) {
        self.parts.push(FormPart {
            name,
            value: PartValue::File(file),
        });
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.parts.iter().map(|p| p.name).collect()
    }

    pub fn get(&self, name: &str) -> Option<&PartValue> {
        self.parts.iter().find(|p| p.name == name).map(|p| &p.value)
    }
}

/// Everything needed to perform one `POST /bags`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BagRequest {
    /// Ties the response back to the attempt that sent it.
    pub generation: u64,
    pub url: String,
    pub authorization: String,
    pub form: MultipartForm,
}

/// Transport for [`BagRequest`]s.
///
/// Implementations must resolve every failure (network, timeout, status,
/// body) to an `Err`, never panic.
#[allow(async_fn_in_trait)]
pub trait BagApi {
    async fn post_bag(&self, request: BagRequest) -> Result<Value>;
}

/// Maps a finished HTTP exchange to the pipeline's notion of success.
pub fn interpret_response(status: u16, body: &str) -> Result<Value> {
    if !(200..300).contains(&status) {
        return Err(ConfiguratorError::SubmissionRejected { status });
    }
    serde_json::from_str(body).map_err(|e| ConfiguratorError::SubmissionParse(e.to_string()))
}

#[derive(Debug)]
pub struct SubmissionPipeline {
    endpoint: String,
    state: SubmissionState,
    /// Bumped by every `begin` and `reset`; older outcomes are stale.
    generation: u64,
}

impl SubmissionPipeline {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            state: SubmissionState::Idle,
            generation: 0,
        }
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn can_submit(&self) -> bool {
        matches!(self.state, SubmissionState::Idle | SubmissionState::ErrorReported { .. })
    }

    /// Moves to `Submitting` and returns the request to send, or `None` if a
    /// submission is in flight or already accepted.
    pub fn begin(&mut self, payload: SubmissionPayload, token: &SessionToken) -> Option<BagRequest> {
        if !self.can_submit() {
            log::warn!("submit ignored while {:?}", self.state_name());
            return None;
        }
        self.state = SubmissionState::Submitting;
        self.generation += 1;
        log::info!("submitting design {:?}", payload.name);
        Some(BagRequest {
            generation: self.generation,
            url: self.endpoint.clone(),
            authorization: token.bearer(),
            form: MultipartForm::from_payload(&payload),
        })
    }

    /// Records the outcome of the request `generation` started by
    /// [`begin`](Self::begin). Outcomes of requests superseded by a later
    /// `begin` or a `reset` are dropped.
    pub fn finish(&mut self, generation: u64, outcome: Result<Value>) -> &SubmissionState {
        if generation != self.generation || self.state != SubmissionState::Submitting {
            log::warn!(
                "stale submission result #{generation} while {} #{}, dropped",
                self.state_name(),
                self.generation
            );
            return &self.state;
        }
        self.state = match outcome {
            Ok(response) => {
                log::info!("design accepted");
                SubmissionState::Submitted { response }
            }
            Err(e) => {
                log::error!("{e}");
                SubmissionState::ErrorReported {
                    message: e.user_message(),
                }
            }
        };
        &self.state
    }

    pub fn reset(&mut self) {
        self.state = SubmissionState::Idle;
        self.generation += 1;
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            SubmissionState::Idle => "idle",
            SubmissionState::Submitting => "submitting",
            SubmissionState::Submitted { .. } => "submitted",
            SubmissionState::ErrorReported { .. } => "error",
        }
    }
}

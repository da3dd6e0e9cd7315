use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Redirect class codes understood by the central error handler.
pub const REDIRECT_MOVED: &str = "301";
pub const REDIRECT_FOUND: &str = "302";

/// Targets ending in this marker leave the application entirely.
pub const NOT_FOUND_MARKER: &str = "404.html";

/// First-class failure value raised by effects and the route resolver.
/// Travels through the dispatch stream as an error action payload.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct AppError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// A navigation instruction: `to` is carried in `detail`.
    pub fn redirect(code: &str, to: impl Into<String>) -> Self {
        let to = to.into();
        Self {
            code: code.into(),
            message: format!("redirect to {to}"),
            detail: Some(to),
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.code.as_str(), REDIRECT_MOVED | REDIRECT_FOUND)
    }

    pub fn redirect_target(&self) -> Option<&str> {
        if self.is_redirect() {
            self.detail.as_deref()
        } else {
            None
        }
    }
}

/// Terminal disposition of a raised error; each error lands in exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorDisposition {
    /// Full page load, used when the target leaves the application.
    HardRedirect(String),
    /// History-based in-app replace, no reload.
    ReplacePath(String),
    /// Forward to telemetry, nothing user-visible.
    Report,
}

pub fn classify(error: &AppError, not_found_marker: &str) -> ErrorDisposition {
    match error.redirect_target() {
        Some(target) if target.ends_with(not_found_marker) => {
            ErrorDisposition::HardRedirect(target.to_string())
        }
        Some(target) => ErrorDisposition::ReplacePath(target.to_string()),
        None => ErrorDisposition::Report,
    }
}

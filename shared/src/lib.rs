#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod app;
pub mod capabilities;
pub mod event;
pub mod fallback;
pub mod image_processing;
pub mod model;
pub mod view;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use event::Event;
pub use model::{
    ActionForm, DataSource, DetailPanel, ImageStaging, Issue, IssueCache, IssueId, IssueOrdering,
    IssueStatus, Model, Page, StagedImage, Transition, TransitionPayload,
};
pub use view::{DashboardStats, ViewModel};

pub const ADMIN_VIEW_PATH: &str = "/api/complaints/admin-view";
pub const COMPLAINTS_PATH: &str = "/api/complaints";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_IMAGE_DIMENSION: u32 = 8192;
pub const MAX_IMAGE_PIXELS: u64 = 40_000_000;
pub const MAX_IMAGE_ALLOC: u64 = 512 * 1024 * 1024;
pub const MAX_PROCESSED_DIMENSION: u32 = 1920;
pub const DEFAULT_JPEG_QUALITY: u8 = 85;
pub const MAX_CONCURRENT_ENCODES: usize = 2;

pub const DESCRIPTION_PREVIEW_LENGTH: usize = 80;

pub const FALLBACK_BANNER_MESSAGE: &str =
    "Could not connect to the backend. Please ensure the server is running. Displaying sample data.";
pub const ACTIONS_DISABLED_MESSAGE: &str = "Actions are disabled while sample data is shown.";
pub const ACTION_FAILED_MESSAGE: &str = "An error occurred. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Validation,
    NotFound,
    Server,
    Serialization,
    Deserialization,
    Configuration,
    ActionFailed,
    ActionsDisabled,
    ImageProcessing,
    ImageTooLarge,
    ImageDimensionsTooLarge,
    ImageFormatUnsupported,
    Overloaded,
    InvalidState,
    Internal,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Server => "SERVER_ERROR",
            Self::Serialization => "SERIALIZATION_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::Configuration => "CONFIGURATION_ERROR",
            Self::ActionFailed => "ACTION_FAILED",
            Self::ActionsDisabled => "ACTIONS_DISABLED",
            Self::ImageProcessing => "IMAGE_PROCESSING_ERROR",
            Self::ImageTooLarge => "IMAGE_TOO_LARGE",
            Self::ImageDimensionsTooLarge => "IMAGE_DIMENSIONS_TOO_LARGE",
            Self::ImageFormatUnsupported => "IMAGE_FORMAT_UNSUPPORTED",
            Self::Overloaded => "OVERLOADED",
            Self::InvalidState => "INVALID_STATE",
            Self::Internal => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network | Self::Timeout | Self::Server | Self::Overloaded => {
                ErrorSeverity::Transient
            }

            Self::Serialization | Self::Internal | Self::InvalidState => ErrorSeverity::Fatal,

            Self::Validation
            | Self::NotFound
            | Self::Deserialization
            | Self::Configuration
            | Self::ActionFailed
            | Self::ActionsDisabled
            | Self::ImageProcessing
            | Self::ImageTooLarge
            | Self::ImageDimensionsTooLarge
            | Self::ImageFormatUnsupported
            | Self::Unknown => ErrorSeverity::Permanent,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            internal_message: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Transitions are refused outright while the cache holds sample data.
    #[must_use]
    pub fn actions_disabled() -> Self {
        Self::new(ErrorKind::ActionsDisabled, ACTIONS_DISABLED_MESSAGE)
    }

    /// Wraps the cause of a failed transition into the generic action alert.
    #[must_use]
    pub fn action_failed(transition: Transition, issue_id: IssueId, cause: &AppError) -> Self {
        Self::new(ErrorKind::ActionFailed, ACTION_FAILED_MESSAGE)
            .with_internal(cause.to_string())
            .with_context("transition", transition.as_str())
            .with_context("issue_id", issue_id.to_string())
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to reach the server. Please check the connection and try again.".into()
            }
            ErrorKind::Timeout => "The request timed out. Please try again.".into(),
            ErrorKind::Validation
            | ErrorKind::ActionFailed
            | ErrorKind::ActionsDisabled
            | ErrorKind::ImageTooLarge
            | ErrorKind::ImageDimensionsTooLarge => self.message.clone(),
            ErrorKind::NotFound => "The requested issue could not be found.".into(),
            ErrorKind::Server => "The server reported an error. Please try again.".into(),
            ErrorKind::Serialization | ErrorKind::Deserialization => {
                "The server sent data that could not be read.".into()
            }
            ErrorKind::Configuration => {
                "The server address is not configured correctly.".into()
            }
            ErrorKind::ImageProcessing => {
                "Unable to process the image. Please try a different photo.".into()
            }
            ErrorKind::ImageFormatUnsupported => {
                "This image format is not supported. Please use JPEG, PNG, WebP or GIF.".into()
            }
            ErrorKind::Overloaded => "Too many images are being prepared. Please wait.".into(),
            ErrorKind::InvalidState => {
                "That action is not available for this issue right now.".into()
            }
            ErrorKind::Internal | ErrorKind::Unknown => {
                "An unexpected error occurred. Please try again.".into()
            }
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<capabilities::HttpError> for AppError {
    fn from(e: capabilities::HttpError) -> Self {
        use capabilities::HttpError;

        match &e {
            HttpError::InvalidUrl { .. } => AppError::new(ErrorKind::Configuration, e.to_string()),
            HttpError::SerializationError { .. } | HttpError::BodyTooLarge { .. } => {
                AppError::new(ErrorKind::Serialization, e.to_string())
            }
        }
    }
}

/// Every non-2xx status is the same failure to the dashboard; the code is
/// kept in the context for logs.
impl From<crux_http::Error> for AppError {
    fn from(e: crux_http::Error) -> Self {
        match &e {
            crux_http::Error::Http(http) => {
                AppError::new(ErrorKind::Server, "The server rejected the request")
                    .with_internal(e.to_string())
                    .with_context("http_status", u16::from(http.code).to_string())
            }
            crux_http::Error::Timeout => AppError::new(ErrorKind::Timeout, "Request timed out"),
            crux_http::Error::Io(_) => {
                AppError::new(ErrorKind::Network, "Network error").with_internal(e.to_string())
            }
            crux_http::Error::Json(_) => {
                AppError::new(ErrorKind::Deserialization, "Unreadable server response")
                    .with_internal(e.to_string())
            }
            crux_http::Error::Url(_) => {
                AppError::new(ErrorKind::Configuration, e.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ImageError {
    #[error("The chosen file is empty")]
    Empty,
    #[error("Image size {size} bytes exceeds maximum of {max} bytes")]
    TooLarge { size: usize, max: usize },
    #[error("Image dimensions {width}x{height} exceed the supported maximum")]
    DimensionsTooLarge { width: u32, height: u32 },
    #[error("Unsupported image format")]
    UnsupportedFormat,
    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),
    #[error("Failed to encode image: {0}")]
    EncodeFailed(String),
    #[error("Image encoder is busy")]
    Overloaded,
    #[error("Image processing failed: {0}")]
    ProcessingFailed(String),
}

impl From<ImageError> for AppError {
    fn from(e: ImageError) -> Self {
        let kind = match &e {
            ImageError::Empty => ErrorKind::Validation,
            ImageError::TooLarge { .. } => ErrorKind::ImageTooLarge,
            ImageError::DimensionsTooLarge { .. } => ErrorKind::ImageDimensionsTooLarge,
            ImageError::UnsupportedFormat => ErrorKind::ImageFormatUnsupported,
            ImageError::Overloaded => ErrorKind::Overloaded,
            ImageError::DecodeFailed(_)
            | ImageError::EncodeFailed(_)
            | ImageError::ProcessingFailed(_) => ErrorKind::ImageProcessing,
        };
        AppError::new(kind, e.to_string())
    }
}

/// Input problems caught on the panel before any request is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("Employee name is required")]
    MissingEmployeeName,
    #[error("Employee contact is required")]
    MissingEmployeeContact,
    #[error("Upload a photo of the completed work before resolving")]
    ImageNotStaged,
    #[error("The photo is still being prepared")]
    ImageStillEncoding,
    #[error("No action is available for this issue")]
    NoActionAvailable,
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::new(ErrorKind::Validation, e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Cannot {transition} an issue that is {status}")]
    NotAvailable {
        transition: Transition,
        status: IssueStatus,
    },
}

impl From<TransitionError> for AppError {
    fn from(e: TransitionError) -> Self {
        AppError::new(ErrorKind::InvalidState, e.to_string())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserFacingError {
    pub message: String,
    pub is_transient: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            is_transient: e.severity == ErrorSeverity::Transient,
            error_code: e.code().to_string(),
        }
    }
}

/// Shortens free text to at most `max_len` characters, breaking on a word
/// boundary when one is close to the cut.
#[must_use]
pub fn description_preview(text: &str, max_len: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_len {
        return text.to_string();
    }

    let cut: String = text.chars().take(max_len.saturating_sub(3)).collect();
    let trimmed = match cut.rfind(' ') {
        Some(idx) if idx > cut.len() / 2 => &cut[..idx],
        _ => cut.as_str(),
    };
    format!("{}...", trimmed.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    mod error_tests {
        use super::*;
        use crux_http::http::StatusCode;

        #[test]
        fn test_app_error_new() {
            let error = AppError::new(ErrorKind::Network, "Test error");

            assert_eq!(error.kind, ErrorKind::Network);
            assert_eq!(error.severity, ErrorSeverity::Transient);
            assert_eq!(error.message, "Test error");
            assert!(error.internal_message.is_none());
        }

        #[test]
        fn test_app_error_with_context() {
            let error = AppError::new(ErrorKind::Validation, "Invalid input")
                .with_context("field", "name")
                .with_context("issue_id", "7");

            assert_eq!(error.context.get("field"), Some(&"name".to_string()));
            assert_eq!(error.context.get("issue_id"), Some(&"7".to_string()));
        }

        #[test]
        fn test_action_failed_uses_generic_message() {
            let cause = AppError::new(ErrorKind::Server, "boom");
            let error = AppError::action_failed(Transition::Assign, IssueId(4), &cause);

            assert_eq!(error.kind, ErrorKind::ActionFailed);
            assert_eq!(error.user_facing_message(), ACTION_FAILED_MESSAGE);
            assert_eq!(error.context.get("transition"), Some(&"assign".to_string()));
            assert!(error.internal_message.is_some());
        }

        #[test]
        fn test_actions_disabled_message() {
            let error = AppError::actions_disabled();
            assert_eq!(error.user_facing_message(), ACTIONS_DISABLED_MESSAGE);
        }

        fn status_error(code: StatusCode) -> crux_http::Error {
            crux_http::http::Error::from_str(code, code.canonical_reason()).into()
        }

        #[test]
        fn test_http_error_mapping() {
            let timeout = AppError::from(crux_http::Error::Timeout);
            assert_eq!(timeout.kind, ErrorKind::Timeout);

            let connection = AppError::from(crux_http::Error::Io("connection refused".into()));
            assert_eq!(connection.kind, ErrorKind::Network);
            assert!(connection.severity == ErrorSeverity::Transient);

            let json = AppError::from(crux_http::Error::Json("expected value".into()));
            assert_eq!(json.kind, ErrorKind::Deserialization);
        }

        #[test]
        fn test_every_non_success_status_is_a_server_error() {
            for code in [
                StatusCode::BadRequest,
                StatusCode::NotFound,
                StatusCode::Conflict,
                StatusCode::ImATeapot,
                StatusCode::InternalServerError,
                StatusCode::ServiceUnavailable,
            ] {
                let error = AppError::from(status_error(code));
                assert_eq!(error.kind, ErrorKind::Server, "status {code}");
                assert_eq!(
                    error.context.get("http_status"),
                    Some(&u16::from(code).to_string())
                );
            }
        }

        #[test]
        fn test_request_build_errors_map_to_configuration() {
            let error = AppError::from(capabilities::HttpError::InvalidUrl {
                url: "ftp://x".into(),
                reason: "bad scheme".into(),
            });
            assert_eq!(error.kind, ErrorKind::Configuration);
        }

        #[test]
        fn test_image_error_mapping() {
            assert_eq!(
                AppError::from(ImageError::UnsupportedFormat).kind,
                ErrorKind::ImageFormatUnsupported
            );
            assert_eq!(
                AppError::from(ImageError::TooLarge { size: 20, max: 10 }).kind,
                ErrorKind::ImageTooLarge
            );
        }

        #[test]
        fn test_user_facing_error_conversion() {
            let error = AppError::new(ErrorKind::Timeout, "slow");
            let view = UserFacingError::from(&error);

            assert_eq!(view.error_code, "TIMEOUT");
            assert!(view.is_transient);
        }

        #[test]
        fn test_display_includes_internal() {
            let error = AppError::new(ErrorKind::Network, "Network error").with_internal("refused");
            assert_eq!(error.to_string(), "[NETWORK_ERROR] Network error (internal: refused)");
        }
    }

    mod format_tests {
        use super::*;

        #[test]
        fn test_description_preview_short_text_unchanged() {
            assert_eq!(description_preview("  Pothole  ", 80), "Pothole");
        }

        #[test]
        fn test_description_preview_breaks_on_word() {
            let text = "Garbage bin overflowing near the central park entrance";
            let preview = description_preview(text, 30);

            assert!(preview.ends_with("..."));
            assert!(preview.chars().count() <= 30);
            assert_eq!(preview, "Garbage bin overflowing...");
        }

        #[test]
        fn test_description_preview_handles_multibyte() {
            let text = "ஒரு பெரிய குழி சாலையில் உள்ளது மற்றும் ஆபத்தானது";
            let preview = description_preview(text, 10);
            assert!(preview.chars().count() <= 10);
        }
    }
}

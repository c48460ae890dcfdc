// src/error.rs

use std::fmt;

use validator::ValidationErrors;

/// Global Application Error Enum.
/// Every failure the student client can run into ends up here and is turned
/// into a user-visible message at the call site.
#[derive(Debug)]
pub enum AppError {
    // Local form validation failed; never reaches the network.
    Validation(ValidationErrors),

    // Server could not be reached (connection refused, DNS, reset...).
    Network(String),

    // Server answered with a non-success status.
    Rejected { status: u16, message: String },

    // The session has no questions, so the exam cannot start.
    EmptyQuestionSet,

    // Reading or writing the persisted attempt record failed.
    Storage(String),

    // Response body did not match the expected shape.
    Decode(String),

    // Bad client configuration (e.g. an unparseable API base URL).
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(errors) => write!(f, "validation failed: {}", errors),
            AppError::Network(msg) => write!(f, "network error: {}", msg),
            AppError::Rejected { status, message } => {
                write!(f, "rejected by server (HTTP {}): {}", status, message)
            }
            AppError::EmptyQuestionSet => write!(f, "session has no questions"),
            AppError::Storage(msg) => write!(f, "storage error: {}", msg),
            AppError::Decode(msg) => write!(f, "unexpected response: {}", msg),
            AppError::Config(msg) => write!(f, "configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Text shown to the student for this error.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(_) => "Please correct the highlighted fields".to_string(),
            AppError::Network(_) => "Could not reach the server".to_string(),
            AppError::Rejected { status, message } => {
                if message.trim().is_empty() {
                    format!("Request failed (HTTP {})", status)
                } else {
                    message.clone()
                }
            }
            AppError::EmptyQuestionSet => "No questions in this session".to_string(),
            AppError::Storage(_) => "Could not save your progress locally".to_string(),
            AppError::Decode(_) => "The server sent an unexpected response".to_string(),
            AppError::Config(msg) => format!("Client misconfigured: {}", msg),
        }
    }

    /// Transport-level failures are worth retrying without user involvement.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Network(_))
    }

    /// Inline messages for a failed form; empty for every other error.
    pub fn field_errors(&self) -> Vec<FieldError> {
        match self {
            AppError::Validation(errors) => field_errors(errors),
            _ => Vec::new(),
        }
    }
}

/// A single inline message attached to a form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Flattens `ValidationErrors` into field/message pairs, sorted by field name.
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| FieldError {
                field: field.to_string(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string()),
            })
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::Validation(err)
    }
}

/// Converts `reqwest::Error` into the matching variant.
/// Status errors keep their code; decoding errors are reported as such.
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            AppError::Rejected {
                status: status.as_u16(),
                message: String::new(),
            }
        } else if err.is_decode() {
            AppError::Decode(err.to_string())
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_uses_server_message_when_present() {
        let err = AppError::Rejected {
            status: 401,
            message: "Invalid Session ID or OTP".to_string(),
        };
        assert_eq!(err.user_message(), "Invalid Session ID or OTP");
    }

    #[test]
    fn rejected_falls_back_to_status_code() {
        let err = AppError::Rejected {
            status: 503,
            message: "  ".to_string(),
        };
        assert_eq!(err.user_message(), "Request failed (HTTP 503)");
    }

    #[test]
    fn only_network_errors_are_transient() {
        assert!(AppError::Network("reset".into()).is_transient());
        assert!(!AppError::EmptyQuestionSet.is_transient());
        assert!(
            !AppError::Rejected {
                status: 500,
                message: String::new()
            }
            .is_transient()
        );
    }

    #[test]
    fn only_validation_errors_carry_fields() {
        let mut errors = ValidationErrors::new();
        errors.add(
            "otp",
            validator::ValidationError::new("otp").with_message("OTP is too short".into()),
        );
        let err = AppError::from(errors);

        assert_eq!(
            err.field_errors(),
            vec![FieldError {
                field: "otp".to_string(),
                message: "OTP is too short".to_string(),
            }]
        );
        assert!(AppError::EmptyQuestionSet.field_errors().is_empty());
    }
}

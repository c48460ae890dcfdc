// src/models/auth.rs

use std::{borrow::Cow, fmt};

use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

use crate::utils::validation::{
    is_valid_enrollment, is_valid_identifier, is_valid_name, is_valid_otp, is_valid_password,
    is_valid_session_id,
};

/// Login credentials. Serialized as the backend's `{ email, password }` body.
#[derive(Clone, Serialize, Validate)]
pub struct LoginForm {
    /// Email address or alphanumeric enrollment id.
    #[serde(rename = "email")]
    #[validate(custom(function = check_identifier))]
    pub identifier: String,

    #[validate(custom(function = check_password))]
    pub password: String,
}

impl LoginForm {
    /// Builds the form from raw input. The identifier is trimmed, the password is not.
    pub fn new(identifier: &str, password: &str) -> Self {
        Self {
            identifier: identifier.trim().to_string(),
            password: password.to_string(),
        }
    }
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("identifier", &self.identifier)
            .field("password", &"***")
            .finish()
    }
}

/// Session registration form. Serialized as `{ name, enrollment, sessionId, otp }`.
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JoinForm {
    #[validate(custom(function = check_name))]
    pub name: String,

    #[validate(custom(function = check_enrollment))]
    pub enrollment: String,

    #[validate(custom(function = check_session_id))]
    pub session_id: String,

    /// One-time code handed out by the instructor.
    #[validate(custom(function = check_otp))]
    pub otp: String,
}

impl JoinForm {
    pub fn new(name: &str, enrollment: &str, session_id: &str, otp: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            enrollment: enrollment.trim().to_string(),
            session_id: session_id.trim().to_string(),
            otp: otp.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(deserialize_with = "opaque_id")]
    pub student_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    #[serde(deserialize_with = "opaque_id")]
    pub student_id: String,

    #[serde(default)]
    pub message: Option<String>,
}

/// Accepts an identifier sent either as a JSON number or a string.
fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number id, got {}",
            other
        ))),
    }
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn check_identifier(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(invalid("required", "Email or enrollment ID is required"));
    }
    if !is_valid_identifier(value) {
        return Err(invalid(
            "identifier",
            "Please enter a valid email or enrollment ID",
        ));
    }
    Ok(())
}

fn check_password(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(invalid("required", "Password is required"));
    }
    if !is_valid_password(value) {
        return Err(invalid(
            "too_short",
            "Password must be at least 6 characters",
        ));
    }
    Ok(())
}

fn check_name(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(invalid("required", "Full name is required"));
    }
    if !is_valid_name(value) {
        return Err(invalid("too_short", "Please enter a valid name"));
    }
    Ok(())
}

fn check_enrollment(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(invalid("required", "Enrollment ID is required"));
    }
    if !is_valid_enrollment(value) {
        return Err(invalid("too_short", "Please enter a valid enrollment ID"));
    }
    Ok(())
}

fn check_session_id(value: &str) -> Result<(), ValidationError> {
    if !is_valid_session_id(value) {
        return Err(invalid("required", "Session ID is required"));
    }
    Ok(())
}

fn check_otp(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(invalid("required", "OTP is required"));
    }
    if !is_valid_otp(value) {
        return Err(invalid("too_short", "Please enter a valid OTP"));
    }
    Ok(())
}

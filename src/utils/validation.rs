use std::sync::LazyLock;

use regex::Regex;

/// Email shape OR a purely alphanumeric login id (enrollment numbers).
static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$|^[A-Za-z0-9]+$").expect("identifier regex is valid")
});

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_NAME_LEN: usize = 2;
pub const MIN_ENROLLMENT_LEN: usize = 2;
pub const MIN_SESSION_ID_LEN: usize = 1;
pub const MIN_OTP_LEN: usize = 4;

pub fn is_valid_identifier(identifier: &str) -> bool {
    IDENTIFIER_RE.is_match(identifier)
}

pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

pub fn is_valid_name(name: &str) -> bool {
    name.trim().chars().count() >= MIN_NAME_LEN
}

pub fn is_valid_enrollment(enrollment: &str) -> bool {
    enrollment.trim().chars().count() >= MIN_ENROLLMENT_LEN
}

pub fn is_valid_session_id(session_id: &str) -> bool {
    session_id.trim().chars().count() >= MIN_SESSION_ID_LEN
}

pub fn is_valid_otp(otp: &str) -> bool {
    otp.trim().chars().count() >= MIN_OTP_LEN
}

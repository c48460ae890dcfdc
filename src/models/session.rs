// src/models/session.rs

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of an exam session as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Waiting,
    Active,
    Ended,
}

/// Response of the session status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub status: SessionState,

    #[serde(default)]
    pub title: Option<String>,

    /// Name of the instructor running the session.
    #[serde(default, alias = "instructorName")]
    pub instructor: Option<String>,

    /// Number of students joined so far.
    #[serde(default)]
    pub student_count: Option<u32>,

    /// Scheduled start, as sent by the server (ISO-8601, with or without offset).
    #[serde(default)]
    pub start_time: Option<String>,
}

impl SessionStatus {
    /// Parsed start time. Timestamps without an offset are taken as UTC.
    pub fn start_time_utc(&self) -> Option<DateTime<Utc>> {
        self.start_time.as_deref().and_then(parse_timestamp)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn status_parses_wire_names() {
        let s: SessionStatus = serde_json::from_value(serde_json::json!({
            "status": "WAITING",
            "title": "Midterm",
            "instructorName": "Dr. Rao",
            "studentCount": 12,
            "startTime": "2026-10-19T09:00:00Z"
        }))
        .unwrap();

        assert_eq!(s.status, SessionState::Waiting);
        assert_eq!(s.instructor.as_deref(), Some("Dr. Rao"));
        assert_eq!(s.student_count, Some(12));
        assert_eq!(
            s.start_time_utc(),
            Some(Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn naive_start_time_is_utc() {
        let s = SessionStatus {
            status: SessionState::Waiting,
            title: None,
            instructor: None,
            student_count: None,
            start_time: Some("2026-10-19T09:30:15.250".to_string()),
        };
        let parsed = s.start_time_utc().unwrap();
        assert_eq!(parsed.timestamp(), Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 15).unwrap().timestamp());
    }

    #[test]
    fn garbage_start_time_is_ignored() {
        let s = SessionStatus {
            status: SessionState::Active,
            title: None,
            instructor: None,
            student_count: None,
            start_time: Some("soon".to_string()),
        };
        assert!(s.start_time_utc().is_none());
    }
}

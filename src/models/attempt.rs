// src/models/attempt.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{
    question::OptionKey,
    submission::{AnswerEntry, SubmitPayload},
};

/// Stage of a student's attempt. Exactly one holds at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Unauthenticated,
    AwaitingJoin,
    Waiting,
    InProgress,
    Disqualified,
    Completed,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Disqualified | Phase::Completed)
    }
}

/// The persisted part of an attempt. Always written as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoredAttempt {
    pub phase: Phase,
    pub identifier: Option<String>,
    pub student_id: Option<String>,
    pub session_id: Option<String>,
    pub name: Option<String>,
    pub enrollment: Option<String>,
    pub cheated: bool,
    pub completed: bool,
}

/// State of one attempt, owned by the session machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttemptState {
    pub phase: Phase,

    /// Email or enrollment id used at login.
    pub identifier: Option<String>,
    student_id: Option<String>,
    session_id: Option<String>,
    pub name: Option<String>,
    pub enrollment: Option<String>,

    violation: bool,
    completed: bool,

    /// Set while a submission is being prepared or is in flight.
    submitting: bool,

    /// The exam clock ran out; answers are frozen.
    expired: bool,

    answers: BTreeMap<i64, OptionKey>,
    pub current_index: usize,
}

impl AttemptState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the attempt from a stored record. Terminal flags win over the
    /// stored phase, and a violation wins over a completion.
    pub fn from_record(record: &StoredAttempt) -> Self {
        let phase = if record.cheated {
            Phase::Disqualified
        } else if record.completed {
            Phase::Completed
        } else {
            record.phase
        };

        Self {
            phase,
            identifier: record.identifier.clone(),
            student_id: record.student_id.clone(),
            session_id: record.session_id.clone(),
            name: record.name.clone(),
            enrollment: record.enrollment.clone(),
            violation: record.cheated,
            completed: record.completed,
            ..Self::default()
        }
    }

    pub fn to_record(&self) -> StoredAttempt {
        StoredAttempt {
            phase: self.phase,
            identifier: self.identifier.clone(),
            student_id: self.student_id.clone(),
            session_id: self.session_id.clone(),
            name: self.name.clone(),
            enrollment: self.enrollment.clone(),
            cheated: self.violation,
            completed: self.completed,
        }
    }

    pub fn student_id(&self) -> Option<&str> {
        self.student_id.as_deref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Records the identities issued on join. Once set they are never replaced.
    pub fn bind_identity(&mut self, student_id: String, session_id: String) {
        if self.student_id.is_none() {
            self.student_id = Some(student_id);
        }
        if self.session_id.is_none() {
            self.session_id = Some(session_id);
        }
    }

    pub fn violation(&self) -> bool {
        self.violation
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn flag_violation(&mut self) {
        self.violation = true;
    }

    pub fn mark_completed(&mut self) {
        self.completed = true;
    }

    pub fn expire(&mut self) {
        self.expired = true;
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Disqualified, but the backend has not acknowledged it yet.
    pub fn owes_disqualification(&self) -> bool {
        self.phase == Phase::Disqualified && self.violation && !self.completed
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Check-and-set of the submission guard. Returns false if a submission
    /// is already under way.
    pub fn begin_submission(&mut self) -> bool {
        if self.submitting {
            return false;
        }
        self.submitting = true;
        true
    }

    pub fn end_submission(&mut self) {
        self.submitting = false;
    }

    pub fn answers(&self) -> &BTreeMap<i64, OptionKey> {
        &self.answers
    }

    pub fn answer_for(&self, question_id: i64) -> Option<OptionKey> {
        self.answers.get(&question_id).copied()
    }

    /// Inserts or replaces the answer for a question. Answers are never
    /// removed, and never change once time is up.
    pub fn select(&mut self, question_id: i64, option: OptionKey) {
        if self.expired {
            return;
        }
        self.answers.insert(question_id, option);
    }

    /// Resets per-exam state when a new question set is loaded.
    pub fn begin_exam(&mut self) {
        self.answers.clear();
        self.current_index = 0;
        self.submitting = false;
        self.expired = false;
    }

    /// Leaving now would lose answers that were never submitted.
    pub fn has_unsaved_progress(&self) -> bool {
        self.phase == Phase::InProgress && !self.completed
    }

    /// Builds the submission body. `None` until both identities are known.
    pub fn payload(&self) -> Option<SubmitPayload> {
        Some(SubmitPayload {
            session_id: self.session_id.clone()?,
            student_id: self.student_id.clone()?,
            name: self.name.clone().unwrap_or_else(|| "Unknown".to_string()),
            enrollment: self
                .enrollment
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            cheated: self.violation,
            answers: self
                .answers
                .iter()
                .map(|(&question_id, &selected_option)| AnswerEntry {
                    question_id,
                    selected_option,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined() -> AttemptState {
        let mut state = AttemptState::new();
        state.bind_identity("42".into(), "9".into());
        state.name = Some("Asha".into());
        state.enrollment = Some("E12".into());
        state.phase = Phase::InProgress;
        state
    }

    #[test]
    fn payload_contains_only_answered_questions() {
        let mut state = joined();
        state.select(1, OptionKey::A);
        state.select(2, OptionKey::B);

        let payload = state.payload().unwrap();
        assert_eq!(payload.answers.len(), 2);
        assert!(payload.answers.contains(&AnswerEntry {
            question_id: 1,
            selected_option: OptionKey::A
        }));
        assert!(payload.answers.contains(&AnswerEntry {
            question_id: 2,
            selected_option: OptionKey::B
        }));
        assert!(!payload.cheated);
    }

    #[test]
    fn reselecting_overwrites() {
        let mut state = joined();
        state.select(1, OptionKey::A);
        state.select(1, OptionKey::D);
        assert_eq!(state.answers().len(), 1);
        assert_eq!(state.answer_for(1), Some(OptionKey::D));
    }

    #[test]
    fn payload_requires_identities() {
        assert!(AttemptState::new().payload().is_none());
    }

    #[test]
    fn identity_is_set_once() {
        let mut state = joined();
        state.bind_identity("other".into(), "other".into());
        assert_eq!(state.student_id(), Some("42"));
        assert_eq!(state.session_id(), Some("9"));
    }

    #[test]
    fn submission_guard_is_exclusive() {
        let mut state = joined();
        assert!(state.begin_submission());
        assert!(!state.begin_submission());
        state.end_submission();
        assert!(state.begin_submission());
    }

    #[test]
    fn record_round_trip_prefers_violation() {
        let mut state = joined();
        state.flag_violation();
        state.mark_completed();
        let restored = AttemptState::from_record(&state.to_record());
        assert_eq!(restored.phase, Phase::Disqualified);
        assert!(restored.violation());
        assert!(restored.answers().is_empty());
    }

    #[test]
    fn answers_freeze_when_time_is_up() {
        let mut state = joined();
        state.select(1, OptionKey::A);
        state.expire();
        state.select(1, OptionKey::D);
        state.select(2, OptionKey::B);
        assert_eq!(state.answer_for(1), Some(OptionKey::A));
        assert_eq!(state.answers().len(), 1);

        state.begin_exam();
        assert!(!state.is_expired());
    }

    #[test]
    fn unacknowledged_disqualification_is_owed() {
        let mut state = joined();
        state.flag_violation();
        state.phase = Phase::Disqualified;
        assert!(state.owes_disqualification());

        state.mark_completed();
        assert!(!state.owes_disqualification());
        assert!(state.completed());
    }

    #[test]
    fn completed_record_restores_completed() {
        let record = StoredAttempt {
            phase: Phase::InProgress,
            completed: true,
            ..StoredAttempt::default()
        };
        assert_eq!(AttemptState::from_record(&record).phase, Phase::Completed);
    }
}

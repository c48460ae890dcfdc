// src/models/submission.rs

use serde::{Deserialize, Serialize};

use crate::{
    models::question::OptionKey,
    utils::format::{PerformanceBadge, percentage},
};

/// One answered question in a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEntry {
    pub question_id: i64,
    pub selected_option: OptionKey,
}

/// Body of the submit call. Unanswered questions are simply absent from `answers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPayload {
    pub session_id: String,
    pub student_id: String,
    pub name: String,
    pub enrollment: String,

    /// Set when the attempt was ended by a proctoring violation.
    pub cheated: bool,

    pub answers: Vec<AnswerEntry>,
}

/// Per-question outcome returned after grading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub question_id: i64,

    #[serde(default)]
    pub selected: Option<String>,

    #[serde(default)]
    pub correct_option: Option<String>,

    #[serde(default)]
    pub explanation: Option<String>,

    #[serde(default)]
    pub is_correct: bool,

    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub score: u32,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub results: Vec<QuestionResult>,
}

/// Everything the results screen needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultReport {
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub badge: PerformanceBadge,
    pub items: Vec<ResultItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultItem {
    pub number: usize,
    pub correct: bool,
    pub text: String,
    pub your_answer: String,
    /// Only present for wrong answers.
    pub correct_answer: Option<String>,
    pub explanation: String,
}

impl ResultReport {
    /// Builds the report for an exam of `total` questions.
    pub fn new(response: &SubmitResponse, total: usize) -> Self {
        let total = total as u32;
        let percent = percentage(response.score, total);

        let items = response
            .results
            .iter()
            .enumerate()
            .map(|(idx, r)| ResultItem {
                number: idx + 1,
                correct: r.is_correct,
                text: r.text.clone().unwrap_or_default(),
                your_answer: r
                    .selected
                    .clone()
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| "Not answered".to_string()),
                correct_answer: if r.is_correct {
                    None
                } else {
                    r.correct_option.clone()
                },
                explanation: r
                    .explanation
                    .clone()
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| "No explanation provided.".to_string()),
            })
            .collect();

        Self {
            score: response.score,
            total,
            percentage: percent,
            badge: PerformanceBadge::for_percentage(percent),
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_uses_backend_field_names() {
        let payload = SubmitPayload {
            session_id: "9".into(),
            student_id: "42".into(),
            name: "Asha".into(),
            enrollment: "E12".into(),
            cheated: false,
            answers: vec![AnswerEntry {
                question_id: 3,
                selected_option: OptionKey::C,
            }],
        };
        let body = serde_json::to_value(&payload).unwrap();
        assert_eq!(body["sessionId"], "9");
        assert_eq!(body["answers"][0]["questionId"], 3);
        assert_eq!(body["answers"][0]["selectedOption"], "C");
    }

    #[test]
    fn report_fills_defaults() {
        let response: SubmitResponse = serde_json::from_value(serde_json::json!({
            "score": 1,
            "message": "Submission successful",
            "results": [
                { "questionId": 1, "selected": "A", "correctOption": "A", "isCorrect": true, "text": "Q1" },
                { "questionId": 2, "correctOption": "B", "isCorrect": false, "text": "Q2" }
            ]
        }))
        .unwrap();

        let report = ResultReport::new(&response, 2);
        assert_eq!(report.percentage, 50);
        assert_eq!(report.badge, PerformanceBadge::Average);
        assert_eq!(report.items[0].correct_answer, None);
        assert_eq!(report.items[1].your_answer, "Not answered");
        assert_eq!(report.items[1].correct_answer.as_deref(), Some("B"));
        assert_eq!(report.items[1].explanation, "No explanation provided.");
    }
}

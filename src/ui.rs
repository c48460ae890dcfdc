// src/ui.rs

use std::io::{self, Write};

use crate::{
    error::FieldError,
    models::{
        question::{OptionKey, Question},
        session::SessionStatus,
        submission::ResultReport,
    },
};

/// Screens of the student client. Exactly one is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Login,
    JoinSession,
    Waiting,
    Quiz,
    Result,
    Cheating,
    AlreadyCompleted,
}

/// Forms that can carry inline field errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    Login,
    Join,
}

/// What the quiz screen shows for the current question.
#[derive(Debug, Clone, Copy)]
pub struct QuestionView<'a> {
    pub question: &'a Question,
    /// Zero based.
    pub index: usize,
    pub total: usize,
    pub selected: Option<OptionKey>,
    pub progress_percent: u32,
}

impl QuestionView<'_> {
    pub fn is_last(&self) -> bool {
        self.index + 1 == self.total
    }
}

/// Presentation side of the client. Pure output, apart from `confirm` and
/// `request_fullscreen`, which ask the environment for something.
pub trait Presenter {
    fn show_section(&mut self, section: Section);

    /// Offers the identifier remembered from the last successful login.
    fn prefill_login(&mut self, identifier: &str);

    /// Offers a default enrollment on the join form.
    fn prefill_join(&mut self, enrollment: &str);

    fn render_waiting_room(&mut self, status: &SessionStatus);
    fn render_waiting_clock(&mut self, remaining: &str);
    fn render_question(&mut self, view: QuestionView<'_>);
    fn render_exam_clock(&mut self, remaining: &str);
    fn render_results(&mut self, report: &ResultReport);
    fn show_field_errors(&mut self, form: Form, errors: &[FieldError]);
    fn show_error(&mut self, message: &str);
    fn notify(&mut self, message: &str);

    /// Asks the student to confirm an action.
    fn confirm(&mut self, prompt: &str) -> bool;

    /// Best effort; an `Err` carries the reason it was refused.
    fn request_fullscreen(&mut self) -> Result<(), String>;

    /// Warn before closing while answers would be lost.
    fn set_exit_guard(&mut self, armed: bool);
}

/// Line-oriented terminal presenter.
///
/// A confirmation is granted by issuing the same command twice in a row.
/// Terminals cannot go fullscreen or report focus, so proctoring runs without
/// those channels here.
pub struct ConsoleUi<W: Write = io::Stdout> {
    out: W,
    pending_confirm: Option<String>,
    exit_guard: bool,
}

impl ConsoleUi<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleUi<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            pending_confirm: None,
            exit_guard: false,
        }
    }

    pub fn exit_guard(&self) -> bool {
        self.exit_guard
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        // Nothing sensible to do if the terminal is gone.
        let _ = writeln!(self.out, "{}", text);
        let _ = self.out.flush();
    }
}

impl<W: Write> Presenter for ConsoleUi<W> {
    fn show_section(&mut self, section: Section) {
        self.pending_confirm = None;
        let banner = match section {
            Section::Login => "== Login ==  (login <email|id> <password>)",
            Section::JoinSession => {
                "== Join session ==  (join <session-id> <otp> <enrollment|-> <full name>)"
            }
            Section::Waiting => "== Waiting room ==  (leave)",
            Section::Quiz => "== Exam ==  (a|b|c|d, next, prev, submit)",
            Section::Result => "== Results ==  (exit)",
            Section::Cheating => {
                "== Disqualified ==  Leaving the exam window was detected. (exit)"
            }
            Section::AlreadyCompleted => {
                "== You have completed this quiz. Multiple submissions are not allowed. ==  (exit)"
            }
        };
        self.line(banner);
    }

    fn prefill_login(&mut self, identifier: &str) {
        self.line(&format!(
            "Last login: {}  (login <password> to reuse it)",
            identifier
        ));
    }

    fn prefill_join(&mut self, enrollment: &str) {
        self.line(&format!("Enrollment: {}  (pass - to keep it)", enrollment));
    }

    fn render_waiting_room(&mut self, status: &SessionStatus) {
        let text = format!(
            "{} | Instructor: {} | Students joined: {}",
            status.title.as_deref().unwrap_or("Waiting Room"),
            status.instructor.as_deref().unwrap_or("-"),
            status.student_count.unwrap_or(0)
        );
        self.line(&text);
    }

    fn render_waiting_clock(&mut self, remaining: &str) {
        self.line(&format!("Starts in {}", remaining));
    }

    fn render_question(&mut self, view: QuestionView<'_>) {
        self.pending_confirm = None;
        let header = format!(
            "Question {}/{}  ({}% complete)",
            view.index + 1,
            view.total,
            view.progress_percent
        );
        self.line(&header);
        self.line(&view.question.text);
        if let Some(image) = &view.question.image {
            self.line(&format!("[image: {}]", image));
        }
        for (key, text) in view.question.options() {
            let mark = if view.selected == Some(key) { "*" } else { " " };
            self.line(&format!("{} {}) {}", mark, key, text));
        }
        if view.is_last() {
            self.line("Last question: type `submit` when you are done.");
        }
    }

    fn render_exam_clock(&mut self, remaining: &str) {
        self.line(&format!("Time: {}", remaining));
    }

    fn render_results(&mut self, report: &ResultReport) {
        self.line(&format!(
            "Score: {}/{} ({}%) {}",
            report.score, report.total, report.percentage, report.badge
        ));
        for item in &report.items {
            let status = if item.correct { "Correct" } else { "Incorrect" };
            self.line(&format!("Question {}: {}", item.number, status));
            if !item.text.is_empty() {
                self.line(&format!("  {}", item.text));
            }
            self.line(&format!("  Your answer: {}", item.your_answer));
            if let Some(correct) = &item.correct_answer {
                self.line(&format!("  Correct answer: {}", correct));
            }
            self.line(&format!("  Explanation: {}", item.explanation));
        }
    }

    fn show_field_errors(&mut self, _form: Form, errors: &[FieldError]) {
        for e in errors {
            self.line(&format!("  {}: {}", e.field, e.message));
        }
    }

    fn show_error(&mut self, message: &str) {
        self.line(&format!("Error: {}", message));
    }

    fn notify(&mut self, message: &str) {
        self.line(message);
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        if self.pending_confirm.as_deref() == Some(prompt) {
            self.pending_confirm = None;
            return true;
        }
        self.line(&format!("{} Repeat the command to confirm.", prompt));
        self.pending_confirm = Some(prompt.to_string());
        false
    }

    fn request_fullscreen(&mut self) -> Result<(), String> {
        Err("terminal has no fullscreen mode".to_string())
    }

    fn set_exit_guard(&mut self, armed: bool) {
        self.exit_guard = armed;
    }
}

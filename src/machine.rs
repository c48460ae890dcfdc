// src/machine.rs

//! The exam session state machine.
//!
//! `SessionMachine` owns the attempt and is the only thing that mutates it.
//! Timers and the violation monitor feed it events; the API, the store and
//! the presenter are collaborators it calls out to. Events are handled one
//! at a time, so the only suspension points are network calls.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use validator::Validate;

use crate::{
    api::ExamApi,
    config::{Config, TICK_INTERVAL},
    error::AppError,
    event::Event,
    models::{
        attempt::{AttemptState, Phase},
        auth::{JoinForm, LoginForm},
        question::{OptionKey, Question},
        session::SessionState,
        submission::ResultReport,
    },
    monitor::{Signal, SignalSource, ViolationMonitor},
    store::SessionStore,
    timer::{TimerKind, Timers, seconds_until},
    ui::{Form, Presenter, QuestionView, Section},
    utils::format::{format_countdown, progress_percent},
};

const RESEND_DISQUALIFICATION: &str =
    "Your disqualification has not reached the server yet. Submit again to send it.";
const RESEND_EXPIRED: &str = "Time is up. Submit again to send your answers.";

/// What caused a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    /// Student pressed submit; needs confirmation.
    Manual,
    TimerExpired,
    Violation,
}

pub struct SessionMachine<A, S, P> {
    config: Config,
    api: A,
    store: S,
    ui: P,

    state: AttemptState,
    questions: Vec<Question>,
    exam_remaining: u64,
    waiting_start: Option<DateTime<Utc>>,

    /// Identifier of the last successful login, offered on the login form.
    remembered: Option<String>,

    timers: Timers,
    monitor: ViolationMonitor,
    /// Only the latest `ResumeProctoring` may resume the monitor.
    resume_ticket: u64,
    events: UnboundedSender<Event>,
}

impl<A, S, P> SessionMachine<A, S, P>
where
    A: ExamApi,
    S: SessionStore,
    P: Presenter,
{
    /// Creates the machine and the receiving end of its event channel.
    pub fn new(config: Config, api: A, store: S, ui: P) -> (Self, UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let machine = Self {
            exam_remaining: config.exam_duration_secs,
            config,
            api,
            store,
            ui,
            state: AttemptState::new(),
            questions: Vec::new(),
            waiting_start: None,
            remembered: None,
            timers: Timers::new(tx.clone()),
            monitor: ViolationMonitor::new(),
            resume_ticket: 0,
            events: tx,
        };
        (machine, rx)
    }

    /// Sender for input sources (keyboard, forms...).
    pub fn sender(&self) -> UnboundedSender<Event> {
        self.events.clone()
    }

    /// Capability handed to the environment for proctoring signals.
    pub fn signal_source(&self) -> SignalSource {
        SignalSource::new(self.events.clone())
    }

    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn exam_remaining(&self) -> u64 {
        self.exam_remaining
    }

    pub fn is_timer_running(&self, kind: TimerKind) -> bool {
        self.timers.is_running(kind)
    }

    pub fn presenter(&self) -> &P {
        &self.ui
    }

    /// Processes events until `Event::Shutdown`. The machine keeps a sender
    /// of its own, so the channel never closes while it runs.
    pub async fn run(&mut self, mut events: UnboundedReceiver<Event>) {
        self.start().await;
        while let Some(event) = events.recv().await {
            if matches!(event, Event::Shutdown) {
                break;
            }
            self.handle(event).await;
        }
        self.timers.stop_all();
        tracing::info!("Session machine stopped in phase {:?}", self.state.phase);
    }

    /// Restores the attempt from the store, or shows the login screen.
    ///
    /// Terminal attempts are resolved before anything else and without
    /// touching the network.
    pub async fn start(&mut self) {
        self.remembered = self.store.last_identifier().unwrap_or_else(|e| {
            tracing::warn!("Could not read the last login identifier: {}", e);
            None
        });

        let record = match self.store.load() {
            Ok(record) => record,
            Err(e) => {
                tracing::error!("Discarding unreadable attempt record: {}", e);
                if let Err(e) = self.store.clear() {
                    tracing::error!("Failed to clear attempt record: {}", e);
                }
                None
            }
        };

        let Some(record) = record else {
            self.show_login();
            return;
        };

        self.state = AttemptState::from_record(&record);
        tracing::info!("Rehydrated attempt in phase {:?}", self.state.phase);

        match self.state.phase {
            Phase::Disqualified => {
                self.ui.show_section(Section::Cheating);
                if self.state.owes_disqualification() {
                    self.ui.notify(RESEND_DISQUALIFICATION);
                }
            }
            Phase::Completed => self.ui.show_section(Section::AlreadyCompleted),
            Phase::Unauthenticated => self.show_login(),
            Phase::AwaitingJoin => self.show_join(),
            // The question set and answers are not persisted; an exam in
            // progress is resumed through the waiting room and re-fetched.
            Phase::Waiting | Phase::InProgress => self.enter_waiting().await,
        }
    }

    pub async fn handle(&mut self, event: Event) {
        if self.state.phase.is_terminal() {
            match event {
                Event::Exit => self.reset_to_login(),
                Event::Submit if self.state.owes_disqualification() => {
                    self.submit(SubmitTrigger::Violation).await
                }
                Event::Tick { kind, .. } => self.timers.stop(kind),
                other => tracing::trace!("Ignoring {:?} in terminal phase", other),
            }
            return;
        }

        match event {
            Event::Login(form) => self.login(form).await,
            Event::Join(form) => self.join(form).await,
            Event::BackToLogin => {
                if self.state.phase == Phase::AwaitingJoin {
                    self.reset_to_login();
                }
            }
            Event::Leave => {
                if self.state.phase == Phase::Waiting
                    && self.ui.confirm("Are you sure you want to leave this session?")
                {
                    self.reset_to_login();
                }
            }
            Event::Next => self.navigate(true),
            Event::Previous => self.navigate(false),
            Event::Select(option) => self.select(option),
            Event::Submit => {
                if self.state.phase == Phase::InProgress {
                    let trigger = if self.state.is_expired() {
                        SubmitTrigger::TimerExpired
                    } else {
                        SubmitTrigger::Manual
                    };
                    self.submit(trigger).await;
                }
            }
            Event::Exit => {}
            Event::Signal(signal) => self.on_signal(signal).await,
            Event::ResumeProctoring(ticket) => {
                if ticket == self.resume_ticket
                    && self.state.phase == Phase::InProgress
                    && !self.state.is_submitting()
                {
                    self.monitor.resume();
                }
            }
            Event::Tick { kind, generation } => self.on_tick(kind, generation).await,
            Event::Shutdown => {}
        }
    }

    async fn login(&mut self, mut form: LoginForm) {
        if self.state.phase != Phase::Unauthenticated {
            return;
        }
        if form.identifier.is_empty() {
            if let Some(remembered) = &self.remembered {
                form.identifier = remembered.clone();
            }
        }
        if let Err(e) = form.validate().map_err(AppError::from) {
            tracing::debug!("Login form rejected: {}", e);
            self.ui.show_field_errors(Form::Login, &e.field_errors());
            return;
        }

        match self.api.login(&form).await {
            Ok(student_id) => {
                tracing::info!("Logged in as {} (student {})", form.identifier, student_id);
                if let Err(e) = self.store.remember_identifier(&form.identifier) {
                    tracing::warn!("Could not remember the login identifier: {}", e);
                }
                self.remembered = Some(form.identifier.clone());
                // A fresh login replaces whatever attempt was there before.
                self.state = AttemptState::new();
                self.state.identifier = Some(form.identifier);
                self.monitor.reset();
                self.questions.clear();
                self.transition(Phase::AwaitingJoin);
                self.show_join();
            }
            Err(e) => {
                tracing::warn!("Login failed: {}", e);
                self.ui
                    .show_error(&format!("Login failed: {}", e.user_message()));
            }
        }
    }

    async fn join(&mut self, mut form: JoinForm) {
        if self.state.phase != Phase::AwaitingJoin {
            return;
        }
        if form.enrollment.is_empty() {
            if let Some(identifier) = &self.state.identifier {
                form.enrollment = identifier.clone();
            }
        }
        if let Err(e) = form.validate().map_err(AppError::from) {
            tracing::debug!("Join form rejected: {}", e);
            self.ui.show_field_errors(Form::Join, &e.field_errors());
            return;
        }

        match self.api.register_for_session(&form).await {
            Ok(student_id) => {
                tracing::info!(
                    "Joined session {} as student {}",
                    form.session_id,
                    student_id
                );
                self.state.bind_identity(student_id, form.session_id);
                self.state.name = Some(form.name);
                self.state.enrollment = Some(form.enrollment);
                self.enter_waiting().await;
            }
            Err(e) => {
                tracing::warn!("Join failed: {}", e);
                self.ui
                    .show_error(&format!("Join failed: {}", e.user_message()));
            }
        }
    }

    async fn enter_waiting(&mut self) {
        self.transition(Phase::Waiting);
        self.ui.show_section(Section::Waiting);
        self.timers
            .start(TimerKind::StatusPoll, self.config.poll_interval());
        self.poll_status().await;
    }

    async fn poll_status(&mut self) {
        let Some(session_id) = self.state.session_id().map(str::to_string) else {
            tracing::error!("Waiting without a session id");
            self.reset_to_login();
            return;
        };

        let status = match self.api.session_status(&session_id).await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!("Status poll for session {} failed, will retry: {}", session_id, e);
                self.ui.show_error("Error checking status. Retrying...");
                return;
            }
        };

        match status.status {
            SessionState::Waiting => {
                self.ui.render_waiting_room(&status);
                if let Some(start) = status.start_time_utc() {
                    if self.waiting_start != Some(start)
                        || !self.timers.is_running(TimerKind::WaitingClock)
                    {
                        self.waiting_start = Some(start);
                        self.render_waiting_clock();
                        self.timers.start(TimerKind::WaitingClock, TICK_INTERVAL);
                    }
                }
            }
            SessionState::Active => self.load_exam().await,
            SessionState::Ended => {
                tracing::info!("Session {} has ended", session_id);
                self.ui.notify("This session has ended");
                self.reset_to_login();
            }
        }
    }

    async fn load_exam(&mut self) {
        let (Some(session_id), Some(student_id)) = (
            self.state.session_id().map(str::to_string),
            self.state.student_id().map(str::to_string),
        ) else {
            tracing::error!("Cannot load questions without identities");
            self.reset_to_login();
            return;
        };

        let questions = match self.api.questions(&session_id, &student_id).await {
            Ok(questions) => questions,
            Err(e) => {
                tracing::error!("Failed to load questions for session {}: {}", session_id, e);
                self.ui
                    .show_error(&format!("Failed to load questions: {}", e.user_message()));
                return;
            }
        };

        if questions.is_empty() {
            tracing::error!("Session {} returned no questions", session_id);
            self.ui.show_error(&AppError::EmptyQuestionSet.user_message());
            self.reset_to_login();
            return;
        }

        self.questions = questions;
        self.state.begin_exam();

        let fullscreen = match self.ui.request_fullscreen() {
            Ok(()) => true,
            Err(reason) => {
                tracing::warn!("Fullscreen request denied or failed: {}", reason);
                false
            }
        };

        self.exam_remaining = self.config.exam_duration_secs;
        self.transition(Phase::InProgress);
        self.monitor.arm(fullscreen);
        self.ui.show_section(Section::Quiz);
        self.timers.start(TimerKind::ExamClock, TICK_INTERVAL);
        self.ui
            .render_exam_clock(&format_countdown(self.exam_remaining));
        self.render_question();
        tracing::info!(
            "Exam started with {} questions, {}s on the clock",
            self.questions.len(),
            self.exam_remaining
        );
    }

    fn navigate(&mut self, forward: bool) {
        if self.state.phase != Phase::InProgress || self.state.is_expired() {
            return;
        }
        let idx = self.state.current_index;
        if forward && idx + 1 < self.questions.len() {
            self.state.current_index += 1;
        } else if !forward && idx > 0 {
            self.state.current_index -= 1;
        } else {
            return;
        }
        self.render_question();
    }

    fn select(&mut self, option: OptionKey) {
        if self.state.phase != Phase::InProgress || self.state.is_expired() {
            return;
        }
        if let Some(question) = self.questions.get(self.state.current_index) {
            self.state.select(question.id, option);
            self.render_question();
        }
    }

    async fn on_signal(&mut self, signal: Signal) {
        let Some(violation) = self.monitor.observe(signal) else {
            return;
        };
        if self.state.phase != Phase::InProgress || self.state.violation() {
            return;
        }

        tracing::warn!("Proctoring violation detected: {:?}", violation.signal);
        self.state.flag_violation();
        self.transition(Phase::Disqualified);
        self.ui.show_section(Section::Cheating);
        self.submit(SubmitTrigger::Violation).await;
    }

    async fn on_tick(&mut self, kind: TimerKind, generation: u64) {
        if !self.timers.is_current(kind, generation) {
            tracing::trace!("Dropping stale {:?} tick {}", kind, generation);
            return;
        }

        match kind {
            TimerKind::StatusPoll => {
                if self.state.phase == Phase::Waiting {
                    self.poll_status().await;
                }
            }
            TimerKind::WaitingClock => {
                if self.render_waiting_clock() == 0 {
                    self.timers.stop(TimerKind::WaitingClock);
                }
            }
            TimerKind::ExamClock => {
                if self.state.phase != Phase::InProgress {
                    return;
                }
                self.exam_remaining = self.exam_remaining.saturating_sub(1);
                self.ui
                    .render_exam_clock(&format_countdown(self.exam_remaining));
                if self.exam_remaining == 0 {
                    self.timers.stop(TimerKind::ExamClock);
                    self.state.expire();
                    tracing::info!("Exam time is up, submitting");
                    self.submit(SubmitTrigger::TimerExpired).await;
                }
            }
        }
    }

    /// Sends the answers. Only one submission may be under way at a time;
    /// a second trigger while one is pending is a no-op. Only a manual
    /// submission asks for confirmation.
    async fn submit(&mut self, trigger: SubmitTrigger) {
        if !self.state.begin_submission() {
            tracing::debug!("Submission already in flight, ignoring {:?}", trigger);
            return;
        }
        self.monitor.suspend();

        if trigger == SubmitTrigger::Manual
            && !self.ui.confirm("Are you sure you want to submit?")
        {
            self.abort_submission(false);
            return;
        }

        let Some(payload) = self.state.payload() else {
            tracing::error!("Cannot submit without identities");
            self.ui
                .show_error("Submission failed: attempt is missing its identity");
            self.abort_submission(false);
            return;
        };

        tracing::info!(
            "Submitting {} answers ({:?}, cheated: {})",
            payload.answers.len(),
            trigger,
            payload.cheated
        );

        match self.api.submit_answers(&payload).await {
            Ok(response) => {
                self.state.end_submission();
                self.state.mark_completed();
                if self.state.violation() {
                    tracing::info!("Disqualified attempt recorded, score {}", response.score);
                    self.persist();
                    self.ui.set_exit_guard(false);
                } else {
                    let report = ResultReport::new(&response, self.questions.len());
                    tracing::info!(
                        "Submission accepted: {}/{} ({}%)",
                        report.score,
                        report.total,
                        report.percentage
                    );
                    self.transition(Phase::Completed);
                    self.ui.show_section(Section::Result);
                    self.ui.render_results(&report);
                }
            }
            Err(e) => {
                tracing::error!("Submission failed ({:?}): {}", trigger, e);
                self.ui
                    .show_error(&format!("Submission failed: {}", e.user_message()));
                match trigger {
                    SubmitTrigger::Violation => self.ui.notify(RESEND_DISQUALIFICATION),
                    SubmitTrigger::TimerExpired => self.ui.notify(RESEND_EXPIRED),
                    SubmitTrigger::Manual => {}
                }
                self.abort_submission(true);
            }
        }
    }

    /// Releases the submission guard and, during the exam, proctoring.
    ///
    /// After a request, signals raised while it was in flight may still be
    /// queued. Proctoring then resumes only once they have been handled.
    fn abort_submission(&mut self, after_request: bool) {
        self.state.end_submission();
        if self.state.phase != Phase::InProgress {
            return;
        }
        if after_request {
            self.resume_ticket += 1;
            if self
                .events
                .send(Event::ResumeProctoring(self.resume_ticket))
                .is_ok()
            {
                return;
            }
        }
        self.monitor.resume();
    }

    /// Forgets the attempt and goes back to the login screen.
    fn reset_to_login(&mut self) {
        self.transition(Phase::Unauthenticated);
        self.timers.stop_all();
        self.state = AttemptState::new();
        self.monitor.reset();
        self.questions.clear();
        self.waiting_start = None;
        self.show_login();
    }

    fn show_login(&mut self) {
        self.ui.show_section(Section::Login);
        if let Some(identifier) = &self.remembered {
            self.ui.prefill_login(identifier);
        }
    }

    /// The login identifier doubles as the default enrollment.
    fn show_join(&mut self) {
        self.ui.show_section(Section::JoinSession);
        if let Some(identifier) = &self.state.identifier {
            self.ui.prefill_join(identifier);
        }
    }

    /// Moves to `to`, stopping the timers of the phase being left, and writes
    /// the new state through to the store.
    fn transition(&mut self, to: Phase) {
        let from = self.state.phase;

        if from == Phase::Waiting && to != Phase::Waiting {
            self.timers.stop(TimerKind::StatusPoll);
            self.timers.stop(TimerKind::WaitingClock);
        }
        if from == Phase::InProgress && to != Phase::InProgress {
            self.timers.stop(TimerKind::ExamClock);
            self.monitor.disarm();
        }

        self.state.phase = to;
        self.persist();
        self.ui.set_exit_guard(self.state.has_unsaved_progress());

        if from != to {
            tracing::info!("Phase {:?} -> {:?}", from, to);
        }
    }

    fn persist(&mut self) {
        let result = if self.state.phase == Phase::Unauthenticated {
            self.store.clear()
        } else {
            self.store.save(&self.state.to_record())
        };
        if let Err(e) = result {
            tracing::error!("Failed to persist attempt: {}", e);
        }
    }

    /// Renders the waiting-room countdown and returns the seconds left.
    fn render_waiting_clock(&mut self) -> u64 {
        let remaining = self
            .waiting_start
            .map(|start| seconds_until(start, Utc::now()))
            .unwrap_or(0);
        self.ui.render_waiting_clock(&format_countdown(remaining));
        remaining
    }

    fn render_question(&mut self) {
        let index = self.state.current_index;
        let Some(question) = self.questions.get(index) else {
            return;
        };
        let view = QuestionView {
            question,
            index,
            total: self.questions.len(),
            selected: self.state.answer_for(question.id),
            progress_percent: progress_percent(index, self.questions.len()),
        };
        self.ui.render_question(view);
    }
}

// src/monitor.rs

//! Proctoring: turns environment signals into at most one violation per attempt.
//!
//! The embedding environment reports what it can observe through a
//! [`SignalSource`]. Channels it cannot observe are simply never reported and
//! the exam carries on without them; a terminal, for example, has no notion of
//! page visibility.

use tokio::sync::mpsc::UnboundedSender;

use crate::event::Event;

/// Raw observations from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    VisibilityLost,
    FocusLost,
    FullscreenExited,
    FullscreenEntered,
}

/// A detected proctoring violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    pub signal: Signal,
}

#[derive(Debug, Default)]
pub struct ViolationMonitor {
    armed: bool,
    suspended: bool,
    fullscreen_seen: bool,
    tripped: Option<Signal>,
}

impl ViolationMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts watching. `fullscreen_active` tells whether the exam managed to
    /// enter fullscreen; if not, a later manual entry still counts.
    pub fn arm(&mut self, fullscreen_active: bool) {
        self.armed = true;
        self.suspended = false;
        self.fullscreen_seen |= fullscreen_active;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
        self.suspended = false;
    }

    /// Forgets everything, for a brand new attempt.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Ignore signals while a submission is in flight. Leaving fullscreen to
    /// show a dialog must not count against the student. Signals raised in
    /// that window stay ignored as long as they are observed before `resume`.
    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    pub fn resume(&mut self) {
        self.suspended = false;
    }

    pub fn tripped(&self) -> Option<Signal> {
        self.tripped
    }

    /// Feeds one signal. Returns a violation only for the first qualifying one.
    pub fn observe(&mut self, signal: Signal) -> Option<Violation> {
        if signal == Signal::FullscreenEntered {
            self.fullscreen_seen = true;
            return None;
        }
        if !self.armed || self.suspended || self.tripped.is_some() {
            return None;
        }
        if signal == Signal::FullscreenExited && !self.fullscreen_seen {
            return None;
        }

        self.tripped = Some(signal);
        Some(Violation { signal })
    }
}

/// Handle given to the environment to report what it observes.
#[derive(Debug, Clone)]
pub struct SignalSource {
    events: UnboundedSender<Event>,
}

impl SignalSource {
    pub fn new(events: UnboundedSender<Event>) -> Self {
        Self { events }
    }

    pub fn on_visibility_lost(&self) {
        self.raise(Signal::VisibilityLost);
    }

    pub fn on_focus_lost(&self) {
        self.raise(Signal::FocusLost);
    }

    pub fn on_fullscreen_exited(&self) {
        self.raise(Signal::FullscreenExited);
    }

    pub fn on_fullscreen_entered(&self) {
        self.raise(Signal::FullscreenEntered);
    }

    fn raise(&self, signal: Signal) {
        if self.events.send(Event::Signal(signal)).is_err() {
            tracing::debug!("Dropped {:?}: session machine is gone", signal);
        }
    }
}

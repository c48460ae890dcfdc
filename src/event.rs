// src/event.rs

use crate::{
    models::{
        auth::{JoinForm, LoginForm},
        question::OptionKey,
    },
    monitor::Signal,
    timer::TimerKind,
};

/// Everything the session machine reacts to.
///
/// User input, timer ticks and proctoring signals all arrive through the
/// same channel and are handled one at a time.
#[derive(Debug, Clone)]
pub enum Event {
    Login(LoginForm),
    Join(JoinForm),

    /// Return from the join form to the login form.
    BackToLogin,

    /// Leave the waiting room.
    Leave,

    Next,
    Previous,
    Select(OptionKey),

    /// Student asked to submit. Confirmation is requested before sending,
    /// unless the attempt is already past the point of no return (time up or
    /// disqualified) and only needs re-sending.
    Submit,

    /// Dismiss a terminal screen and forget the attempt.
    Exit,

    Signal(Signal),

    /// Re-enables proctoring after a failed submission. Queued behind any
    /// signal raised while the request was in flight, so those are dropped.
    ResumeProctoring(u64),

    Tick { kind: TimerKind, generation: u64 },

    /// Stop the event loop.
    Shutdown,
}

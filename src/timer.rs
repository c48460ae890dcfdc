// src/timer.rs

use std::{collections::HashMap, time::Duration};

use chrono::{DateTime, Utc};
use tokio::{
    sync::mpsc::UnboundedSender,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};

use crate::event::Event;

/// The repeating tasks that drive phase changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Waiting-room countdown to the scheduled start.
    WaitingClock,
    /// Exam countdown to auto-submit.
    ExamClock,
    /// Session status poll while waiting.
    StatusPoll,
}

struct Slot {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Registry of running tickers, at most one per kind.
///
/// Every start gets a fresh generation number which travels with each tick,
/// so ticks already queued by a stopped ticker can be recognised and dropped.
pub struct Timers {
    events: UnboundedSender<Event>,
    slots: HashMap<TimerKind, Slot>,
    next_generation: u64,
}

impl Timers {
    pub fn new(events: UnboundedSender<Event>) -> Self {
        Self {
            events,
            slots: HashMap::new(),
            next_generation: 0,
        }
    }

    /// Starts a ticker of `kind`, replacing any ticker of the same kind.
    /// The first tick fires one `period` from now.
    pub fn start(&mut self, kind: TimerKind, period: Duration) -> u64 {
        self.stop(kind);

        self.next_generation += 1;
        let generation = self.next_generation;
        let tx = self.events.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(Event::Tick { kind, generation }).is_err() {
                    break;
                }
            }
        });

        tracing::debug!("Started {:?} timer (generation {})", kind, generation);
        self.slots.insert(kind, Slot { generation, handle });
        generation
    }

    pub fn stop(&mut self, kind: TimerKind) {
        if let Some(slot) = self.slots.remove(&kind) {
            slot.handle.abort();
            tracing::debug!("Stopped {:?} timer (generation {})", kind, slot.generation);
        }
    }

    pub fn stop_all(&mut self) {
        for (_, slot) in self.slots.drain() {
            slot.handle.abort();
        }
    }

    pub fn is_running(&self, kind: TimerKind) -> bool {
        self.slots.contains_key(&kind)
    }

    /// True if a tick with this generation comes from the live ticker of `kind`.
    pub fn is_current(&self, kind: TimerKind, generation: u64) -> bool {
        self.slots
            .get(&kind)
            .is_some_and(|slot| slot.generation == generation)
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        self.stop_all();
    }
}

/// Whole seconds from `now` until `start`, clamped at zero.
pub fn seconds_until(start: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (start - now).num_seconds().max(0) as u64
}

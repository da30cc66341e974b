use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionRecord;
use crate::timer::{DecisionKind, DecisionToken, Mode, Prompt, TimerState};

/// Every accepted state change in the system produces an Event.
/// The presentation layer renders them; nothing in the core reads them back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        mode: Mode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    Ticked {
        remaining_secs: u64,
        total_secs: u64,
    },
    TimerPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// The app went to the background during a running work interval.
    TimerInterrupted {
        interruption_count: u32,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    IntervalCompleted {
        mode: Mode,
        completed_work_intervals: u32,
        /// Whether the presentation layer should vibrate.
        vibrate: bool,
        at: DateTime<Utc>,
    },
    DecisionRequested {
        token: DecisionToken,
        decision: DecisionKind,
        prompt: Prompt,
    },
    ModeSwitched {
        mode: Mode,
        total_secs: u64,
        auto_started: bool,
        at: DateTime<Utc>,
    },
    DurationAdjusted {
        total_secs: u64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        mode: Mode,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: Mode,
        at: DateTime<Utc>,
    },
    CycleReset {
        at: DateTime<Utc>,
    },
    SessionSaved {
        id: i64,
        record: SessionRecord,
    },
    /// The store rejected a record. The session is lost; the timer carries on.
    SessionSaveFailed {
        message: String,
        record: SessionRecord,
    },
    StateSnapshot {
        state: TimerState,
        at: DateTime<Utc>,
    },
}

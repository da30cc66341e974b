//! Timer engine implementation.
//!
//! The engine is a pure state machine. It owns no threads and no clock: the
//! driver calls `tick()` once per second while the engine reports
//! `running`, and forwards lifecycle transitions and user decisions.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (PausedByUser | PausedByInterruption) -> Running
//! Running -> Completed -> (next mode) Idle | Running
//! any -> Idle   (stop / reset)
//! ```
//!
//! Operations requested in an incompatible state are ignored and return
//! `None`; the state is left untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::decision::{DecisionKind, DecisionToken, PendingDecision, Prompt, Resolution};
use super::mode::{Mode, TimerSettings};
use crate::events::Event;
use crate::session::{Category, IntervalOutcome, SessionRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Running,
    PausedByUser,
    PausedByInterruption,
    /// Countdown reached zero; waiting for the follow-up mode.
    Completed,
}

impl Phase {
    fn is_paused(self) -> bool {
        matches!(self, Phase::PausedByUser | Phase::PausedByInterruption)
    }
}

/// Snapshot of the countdown and its counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub mode: Mode,
    pub phase: Phase,
    pub remaining_secs: u64,
    pub total_secs: u64,
    /// Background transitions during the current work interval.
    pub interruption_count: u32,
    /// Naturally completed work intervals since start-up or the last cycle reset.
    pub completed_work_intervals: u32,
    /// Paused by a background transition and no resume decision requested yet.
    pub interruption_pending: bool,
}

impl TimerState {
    pub fn running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.total_secs.saturating_sub(self.remaining_secs)
    }
}

/// A decision the presentation layer has to ask the user about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedDecision {
    pub token: DecisionToken,
    pub kind: DecisionKind,
    pub prompt: Prompt,
}

impl IssuedDecision {
    pub fn to_event(&self) -> Event {
        Event::DecisionRequested {
            token: self.token,
            decision: self.kind,
            prompt: self.prompt.clone(),
        }
    }
}

/// Result of closing a naturally completed interval.
#[derive(Debug, Clone)]
pub struct IntervalEnd {
    pub record: Option<SessionRecord>,
    pub proposed: Mode,
    /// `None` when the proposed mode was auto-started.
    pub decision: Option<IssuedDecision>,
    pub events: Vec<Event>,
}

/// Result of an early stop.
#[derive(Debug, Clone)]
pub struct Stopped {
    pub record: Option<SessionRecord>,
    pub event: Event,
}

/// Result of a resolved decision.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub resolution: Resolution,
    pub event: Option<Event>,
}

/// Core timer state machine.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    state: TimerState,
    pending: Option<PendingDecision>,
    last_token: u64,
    /// Set once `complete_interval` ran for the current `Completed` phase.
    interval_closed: bool,
}

impl TimerEngine {
    /// Create an idle engine in `Work` mode with the configured duration.
    pub fn new(settings: &TimerSettings) -> Self {
        let total = settings.duration_secs(Mode::Work);
        Self {
            state: TimerState {
                mode: Mode::Work,
                phase: Phase::Idle,
                remaining_secs: total,
                total_secs: total,
                interruption_count: 0,
                completed_work_intervals: 0,
                interruption_pending: false,
            },
            pending: None,
            last_token: 0,
            interval_closed: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn is_running(&self) -> bool {
        self.state.running()
    }

    /// The outstanding decision, if any.
    pub fn pending_decision(&self) -> Option<(DecisionToken, DecisionKind)> {
        self.pending.map(|p| (p.token, p.kind))
    }

    /// Completed phase whose follow-up has not been computed yet.
    pub fn needs_completion(&self) -> bool {
        self.state.phase == Phase::Completed && !self.interval_closed
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state.clone(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start from idle, or continue after a pause.
    ///
    /// A pause caused by an interruption can only be left this way once the
    /// app is back in the foreground and its resume decision is no longer
    /// outstanding.
    pub fn start(&mut self) -> Option<Event> {
        let phase = self.state.phase;
        match phase {
            Phase::Idle | Phase::PausedByUser => {}
            Phase::PausedByInterruption
                if !self.state.interruption_pending && !self.resume_outstanding() => {}
            _ => {
                debug!(?phase, "start ignored");
                return None;
            }
        }
        if self.state.remaining_secs == 0 {
            debug!("start ignored: nothing left to count down");
            return None;
        }

        self.state.phase = Phase::Running;
        self.state.interruption_pending = false;
        let at = Utc::now();
        if phase == Phase::Idle {
            Some(Event::TimerStarted {
                mode: self.state.mode,
                remaining_secs: self.state.remaining_secs,
                at,
            })
        } else {
            Some(Event::TimerResumed {
                remaining_secs: self.state.remaining_secs,
                at,
            })
        }
    }

    /// Count down one second. Reaching zero moves to `Completed`.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.state.running() {
            return None;
        }
        self.state.remaining_secs = self.state.remaining_secs.saturating_sub(1);
        if self.state.remaining_secs == 0 {
            self.state.phase = Phase::Completed;
            self.interval_closed = false;
            info!(mode = ?self.state.mode, "interval ran down");
        }
        Some(Event::Ticked {
            remaining_secs: self.state.remaining_secs,
            total_secs: self.state.total_secs,
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.running() {
            debug!(phase = ?self.state.phase, "pause ignored");
            return None;
        }
        self.state.phase = Phase::PausedByUser;
        self.state.interruption_pending = false;
        Some(Event::TimerPaused {
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// The app left the foreground.
    pub fn background(&mut self) -> Option<Event> {
        if self.state.mode != Mode::Work || !self.state.running() {
            debug!(mode = ?self.state.mode, phase = ?self.state.phase, "background ignored");
            return None;
        }
        self.state.phase = Phase::PausedByInterruption;
        self.state.interruption_count += 1;
        self.state.interruption_pending = true;
        info!(count = self.state.interruption_count, "work interval interrupted");
        Some(Event::TimerInterrupted {
            interruption_count: self.state.interruption_count,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// The app came back. Asks whether to resume; never resumes by itself.
    pub fn foreground(&mut self) -> Option<IssuedDecision> {
        if self.state.mode != Mode::Work || !self.state.interruption_pending {
            return None;
        }
        self.state.interruption_pending = false;
        Some(self.issue(DecisionKind::Resume, Prompt::resume()))
    }

    /// Ask the user to confirm an early stop of the current interval.
    pub fn request_stop(&mut self) -> Option<IssuedDecision> {
        if !(self.state.running() || self.state.phase.is_paused()) {
            debug!(phase = ?self.state.phase, "stop request ignored");
            return None;
        }
        Some(self.issue(DecisionKind::ConfirmStop, Prompt::confirm_stop()))
    }

    /// Apply the user's answer to an issued decision.
    ///
    /// Answers for anything but the latest outstanding token are ignored.
    /// `choice` is the selected option index, `None` for a dismissed prompt.
    pub fn resolve(
        &mut self,
        token: DecisionToken,
        choice: Option<usize>,
        settings: &TimerSettings,
    ) -> Option<Resolved> {
        let pending = match self.pending {
            Some(p) if p.token == token => p,
            _ => {
                debug!(%token, "stale or unknown decision dropped");
                return None;
            }
        };
        self.pending = None;

        let Some(choice) = choice else {
            return Some(Resolved {
                resolution: Resolution::Dismissed,
                event: None,
            });
        };
        let accepted = choice == pending.kind.accept_index();

        let resolved = match pending.kind {
            DecisionKind::Resume => {
                if accepted && self.state.phase == Phase::PausedByInterruption {
                    self.state.phase = Phase::Running;
                    Resolved {
                        resolution: Resolution::Resumed,
                        event: Some(Event::TimerResumed {
                            remaining_secs: self.state.remaining_secs,
                            at: Utc::now(),
                        }),
                    }
                } else {
                    Resolved {
                        resolution: Resolution::StayedPaused,
                        event: None,
                    }
                }
            }
            DecisionKind::NextMode { proposed } if accepted => Resolved {
                event: self.switch_mode(proposed, settings),
                resolution: Resolution::ModeSwitched(proposed),
            },
            DecisionKind::NextMode { .. } => Resolved {
                resolution: Resolution::Dismissed,
                event: None,
            },
            DecisionKind::ConfirmStop => Resolved {
                resolution: if accepted {
                    Resolution::StopConfirmed
                } else {
                    Resolution::StopCancelled
                },
                event: None,
            },
        };
        Some(resolved)
    }

    /// Lengthen or shorten an untouched idle interval.
    pub fn adjust_duration(&mut self, delta_minutes: i64) -> Option<Event> {
        if self.state.phase != Phase::Idle || self.state.elapsed_secs() != 0 {
            debug!(phase = ?self.state.phase, "duration adjustment ignored");
            return None;
        }
        let total = i64::try_from(self.state.total_secs).ok()?;
        let adjusted = total.checked_add(delta_minutes.checked_mul(60)?)?;
        if adjusted <= 0 {
            debug!(adjusted, "duration adjustment would underflow");
            return None;
        }
        let adjusted = adjusted as u64;
        self.state.total_secs = adjusted;
        self.state.remaining_secs = adjusted;
        Some(Event::DurationAdjusted {
            total_secs: adjusted,
            at: Utc::now(),
        })
    }

    /// Close a naturally completed interval: build its record and decide
    /// which mode comes next.
    pub fn complete_interval(
        &mut self,
        settings: &TimerSettings,
        category: Option<&Category>,
        now: DateTime<Utc>,
    ) -> Option<IntervalEnd> {
        if !self.needs_completion() {
            debug!(phase = ?self.state.phase, "completion ignored");
            return None;
        }
        self.interval_closed = true;

        let record = SessionRecord::from_outcome(&IntervalOutcome {
            mode: self.state.mode,
            total_secs: self.state.total_secs,
            remaining_secs: self.state.remaining_secs,
            distraction_count: self.state.interruption_count,
            category,
            completed: true,
            at: now,
        });

        let every = settings.long_break_every();
        let proposed = match self.state.mode {
            Mode::Work => {
                self.state.completed_work_intervals += 1;
                if self.state.completed_work_intervals % every == 0 {
                    Mode::LongBreak
                } else {
                    Mode::ShortBreak
                }
            }
            Mode::ShortBreak | Mode::LongBreak => Mode::Work,
        };

        let mut events = vec![Event::IntervalCompleted {
            mode: self.state.mode,
            completed_work_intervals: self.state.completed_work_intervals,
            vibrate: settings.vibration_enabled,
            at: now,
        }];

        let decision = if settings.auto_starts(proposed) {
            events.extend(self.switch_mode(proposed, settings));
            None
        } else {
            let prompt =
                Prompt::next_mode(proposed, self.state.completed_work_intervals, every);
            Some(self.issue(DecisionKind::NextMode { proposed }, prompt))
        };

        Some(IntervalEnd {
            record,
            proposed,
            decision,
            events,
        })
    }

    /// End the interval early. Work intervals with at least one full minute
    /// elapsed yield a partial record; the timer returns to idle either way.
    pub fn stop_and_save(
        &mut self,
        settings: &TimerSettings,
        category: Option<&Category>,
        now: DateTime<Utc>,
    ) -> Option<Stopped> {
        if !(self.state.running() || self.state.phase.is_paused()) {
            debug!(phase = ?self.state.phase, "stop ignored");
            return None;
        }
        let elapsed_secs = self.state.elapsed_secs();
        let record = SessionRecord::from_outcome(&IntervalOutcome {
            mode: self.state.mode,
            total_secs: self.state.total_secs,
            remaining_secs: self.state.remaining_secs,
            distraction_count: self.state.interruption_count,
            category,
            completed: false,
            at: now,
        });
        if record.is_none() {
            debug!(elapsed_secs, "stopped interval discarded");
        }
        let mode = self.state.mode;
        self.enter_idle(settings);
        Some(Stopped {
            record,
            event: Event::TimerStopped {
                mode,
                elapsed_secs,
                at: now,
            },
        })
    }

    /// Back to idle for the current mode, dropping all progress.
    pub fn reset_without_saving(&mut self, settings: &TimerSettings) -> Event {
        self.enter_idle(settings);
        Event::TimerReset {
            mode: self.state.mode,
            at: Utc::now(),
        }
    }

    /// Explicit user reset of the long-break cycle counter.
    pub fn reset_cycle(&mut self) -> Event {
        self.state.completed_work_intervals = 0;
        Event::CycleReset { at: Utc::now() }
    }

    /// Enter `mode` with its configured duration. Not allowed mid-interval.
    pub fn switch_mode(&mut self, mode: Mode, settings: &TimerSettings) -> Option<Event> {
        if self.state.running() {
            debug!(?mode, "mode switch ignored while running");
            return None;
        }
        let auto_started = settings.auto_starts(mode);
        self.state.mode = mode;
        self.enter_idle(settings);
        if auto_started {
            self.state.phase = Phase::Running;
        }
        Some(Event::ModeSwitched {
            mode,
            total_secs: self.state.total_secs,
            auto_started,
            at: Utc::now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn enter_idle(&mut self, settings: &TimerSettings) {
        let total = settings.duration_secs(self.state.mode);
        self.state.phase = Phase::Idle;
        self.state.total_secs = total;
        self.state.remaining_secs = total;
        self.state.interruption_count = 0;
        self.state.interruption_pending = false;
        self.pending = None;
        self.interval_closed = false;
    }

    fn issue(&mut self, kind: DecisionKind, prompt: Prompt) -> IssuedDecision {
        self.last_token += 1;
        let token = DecisionToken(self.last_token);
        if let Some(previous) = self.pending.replace(PendingDecision { token, kind }) {
            debug!(superseded = %previous.token, %token, "decision superseded");
        }
        IssuedDecision {
            token,
            kind,
            prompt,
        }
    }

    fn resume_outstanding(&self) -> bool {
        matches!(
            self.pending,
            Some(PendingDecision {
                kind: DecisionKind::Resume,
                ..
            })
        )
    }
}

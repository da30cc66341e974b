//! Pending user decisions.
//!
//! Whenever the engine needs an answer from the user it issues a
//! [`DecisionToken`] together with a [`Prompt`]. Only the engine's
//! `resolve` accepts the answer, and only for the most recently issued
//! token; answers carrying an older token are dropped.

use serde::{Deserialize, Serialize};

use super::mode::Mode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DecisionToken(pub u64);

impl std::fmt::Display for DecisionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionKind {
    /// Continue the work interval after returning to the app.
    Resume,
    /// Start the proposed follow-up mode.
    NextMode { proposed: Mode },
    /// Finish the running interval early.
    ConfirmStop,
}

impl DecisionKind {
    /// Index of the option that accepts the decision.
    pub(crate) fn accept_index(self) -> usize {
        match self {
            DecisionKind::Resume | DecisionKind::ConfirmStop => 1,
            DecisionKind::NextMode { .. } => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingDecision {
    pub token: DecisionToken,
    pub kind: DecisionKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptOption {
    pub label: String,
    pub is_destructive: bool,
}

impl PromptOption {
    fn plain(label: &str) -> Self {
        Self {
            label: label.to_string(),
            is_destructive: false,
        }
    }

    fn destructive(label: &str) -> Self {
        Self {
            label: label.to_string(),
            is_destructive: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub title: String,
    pub message: String,
    pub options: Vec<PromptOption>,
}

impl Prompt {
    pub(crate) fn resume() -> Self {
        Self {
            title: "Welcome back!".into(),
            message: "Do you want to continue your focus session?".into(),
            options: vec![PromptOption::plain("No"), PromptOption::plain("Yes")],
        }
    }

    pub(crate) fn next_mode(proposed: Mode, completed: u32, every: u32) -> Self {
        match proposed {
            Mode::LongBreak => Self {
                title: "Great work!".into(),
                message: format!("You completed {every} pomodoros! Time for a long break."),
                options: vec![PromptOption::plain("Start long break")],
            },
            Mode::ShortBreak => Self {
                title: "Pomodoro complete!".into(),
                message: format!(
                    "Time for a short break. {} / {every} pomodoros",
                    completed % every
                ),
                options: vec![PromptOption::plain("Start short break")],
            },
            Mode::Work => Self {
                title: "Break is over!".into(),
                message: "Ready to start a new pomodoro?".into(),
                options: vec![PromptOption::plain("Start pomodoro")],
            },
        }
    }

    pub(crate) fn confirm_stop() -> Self {
        Self {
            title: "End session".into(),
            message: "Are you sure you want to end the session?".into(),
            options: vec![PromptOption::plain("Cancel"), PromptOption::destructive("End")],
        }
    }
}

/// What a resolved decision did to the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The work interval continues with its remaining time.
    Resumed,
    /// The user declined to resume; the timer stays paused.
    StayedPaused,
    /// The proposed mode was entered.
    ModeSwitched(Mode),
    /// The user confirmed the early stop; the caller performs the stop.
    StopConfirmed,
    /// The user cancelled the early stop.
    StopCancelled,
    /// The prompt was closed without a choice.
    Dismissed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_option_exists_in_every_prompt() {
        let cases = [
            (DecisionKind::Resume, Prompt::resume()),
            (DecisionKind::ConfirmStop, Prompt::confirm_stop()),
            (
                DecisionKind::NextMode { proposed: Mode::Work },
                Prompt::next_mode(Mode::Work, 1, 4),
            ),
        ];
        for (kind, prompt) in cases {
            assert!(kind.accept_index() < prompt.options.len(), "{kind:?}");
        }
    }

    #[test]
    fn short_break_prompt_shows_cycle_progress() {
        let prompt = Prompt::next_mode(Mode::ShortBreak, 6, 4);
        assert!(prompt.message.ends_with("2 / 4 pomodoros"));
    }

    #[test]
    fn only_end_is_destructive() {
        let prompt = Prompt::confirm_stop();
        assert!(!prompt.options[0].is_destructive);
        assert!(prompt.options[1].is_destructive);
    }
}

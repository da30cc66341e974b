mod decision;
mod engine;
mod mode;

pub use decision::{DecisionKind, DecisionToken, Prompt, PromptOption, Resolution};
pub use engine::{IntervalEnd, IssuedDecision, Phase, Resolved, Stopped, TimerEngine, TimerState};
pub use mode::{Mode, TimerSettings};

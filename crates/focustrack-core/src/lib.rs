//! # focustrack core library
//!
//! Business logic for the focustrack Pomodoro timer. The `focustrack` CLI is
//! a thin terminal front end over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a pure state machine over work and break intervals.
//!   It never touches the clock, storage or the user; every transition
//!   returns the events and decisions it produced.
//! - **Driver**: owns the engine and applies ticks, lifecycle transitions,
//!   commands and prompt answers from a single queue.
//! - **Storage**: SQLite session history and TOML configuration.
//! - **Stats**: focus reports built from the session history.
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: core timer state machine
//! - [`TimerDriver`]: single-queue dispatch around the engine
//! - [`Database`]: session persistence
//! - [`Config`]: application configuration management

pub mod driver;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod ports;
pub mod session;
pub mod stats;
pub mod storage;
pub mod ticker;
pub mod timer;

pub use driver::{Command, Input, TimerDriver};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use lifecycle::{AppActivity, LifecycleMonitor, LifecycleTransition};
pub use ports::{CategorySource, PromptSurface, SessionStore, SettingsProvider};
pub use session::{Category, SessionRecord, StoredSession};
pub use stats::Report;
pub use storage::{Config, ConfigFile, Database};
pub use timer::{DecisionKind, DecisionToken, Mode, Phase, Prompt, TimerEngine, TimerSettings, TimerState};

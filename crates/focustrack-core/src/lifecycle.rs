//! Foreground monitor.
//!
//! Turns raw application activity reports into foreground/background
//! transitions. Exactly one transition is produced per observed edge between
//! "active" and "not active"; repeated or intermediate reports produce
//! nothing, and a missed edge is never inferred later.

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Application activity as reported by the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppActivity {
    Active,
    /// Visible but not focused (e.g. a system overlay is on top).
    Inactive,
    Background,
}

impl AppActivity {
    fn is_active(self) -> bool {
        self == AppActivity::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleTransition {
    BecameBackground,
    BecameForeground,
}

#[derive(Debug, Clone)]
pub struct LifecycleMonitor {
    current: AppActivity,
}

impl Default for LifecycleMonitor {
    fn default() -> Self {
        Self::new(AppActivity::Active)
    }
}

impl LifecycleMonitor {
    pub fn new(initial: AppActivity) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> AppActivity {
        self.current
    }

    /// Record a new activity report and return the transition it completes.
    pub fn observe(&mut self, next: AppActivity) -> Option<LifecycleTransition> {
        let previous = std::mem::replace(&mut self.current, next);
        let transition = match (previous.is_active(), next.is_active()) {
            (true, false) => Some(LifecycleTransition::BecameBackground),
            (false, true) => Some(LifecycleTransition::BecameForeground),
            _ => None,
        };
        trace!(?previous, ?next, ?transition, "activity observed");
        transition
    }
}

//! Session records: the persisted summary of one work interval.
//!
//! A record exists only for `Work` intervals that accumulated at least one
//! full minute. Shorter attempts leave no trace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Mode;

/// Category name used when no category is active.
pub const FALLBACK_CATEGORY: &str = "General";

/// Seconds that make up one recorded minute.
const SECS_PER_MINUTE: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub icon: String,
}

impl Category {
    pub fn new(name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: icon.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub category: String,
    pub duration_minutes: u32,
    pub distraction_count: u32,
    pub timestamp: DateTime<Utc>,
    /// True when the interval ran down to zero, false when stopped early.
    pub completed: bool,
}

/// A record as returned by the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub id: i64,
    #[serde(flatten)]
    pub record: SessionRecord,
}

/// Inputs captured at the moment an interval ends.
#[derive(Debug, Clone, Copy)]
pub struct IntervalOutcome<'a> {
    pub mode: Mode,
    pub total_secs: u64,
    pub remaining_secs: u64,
    pub distraction_count: u32,
    pub category: Option<&'a Category>,
    pub completed: bool,
    pub at: DateTime<Utc>,
}

impl IntervalOutcome<'_> {
    pub fn elapsed_secs(&self) -> u64 {
        self.total_secs.saturating_sub(self.remaining_secs)
    }

    pub fn elapsed_minutes(&self) -> u64 {
        self.elapsed_secs() / SECS_PER_MINUTE
    }
}

impl SessionRecord {
    /// Build the record for a finished interval, or `None` when the interval
    /// is a break or ran for less than a minute.
    pub fn from_outcome(outcome: &IntervalOutcome<'_>) -> Option<Self> {
        if outcome.mode != Mode::Work {
            return None;
        }
        let minutes = outcome.elapsed_minutes();
        if minutes < 1 {
            return None;
        }
        Some(Self {
            category: outcome
                .category
                .map(|c| c.name.clone())
                .unwrap_or_else(|| FALLBACK_CATEGORY.to_string()),
            duration_minutes: u32::try_from(minutes).unwrap_or(u32::MAX),
            distraction_count: outcome.distraction_count,
            timestamp: outcome.at,
            completed: outcome.completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(mode: Mode, total: u64, remaining: u64) -> IntervalOutcome<'static> {
        IntervalOutcome {
            mode,
            total_secs: total,
            remaining_secs: remaining,
            distraction_count: 0,
            category: None,
            completed: false,
            at: Utc::now(),
        }
    }

    #[test]
    fn fifty_seconds_is_not_a_session() {
        assert!(SessionRecord::from_outcome(&outcome(Mode::Work, 1500, 1450)).is_none());
    }

    #[test]
    fn two_minutes_is_recorded_as_partial() {
        let record = SessionRecord::from_outcome(&outcome(Mode::Work, 1500, 1380)).unwrap();
        assert_eq!(record.duration_minutes, 2);
        assert!(!record.completed);
        assert_eq!(record.category, FALLBACK_CATEGORY);
    }

    #[test]
    fn minutes_are_floored() {
        let record = SessionRecord::from_outcome(&outcome(Mode::Work, 1500, 1500 - 179)).unwrap();
        assert_eq!(record.duration_minutes, 2);
    }

    #[test]
    fn breaks_never_produce_records() {
        assert!(SessionRecord::from_outcome(&outcome(Mode::ShortBreak, 300, 0)).is_none());
        assert!(SessionRecord::from_outcome(&outcome(Mode::LongBreak, 900, 0)).is_none());
    }

    #[test]
    fn active_category_name_is_used() {
        let coding = Category::new("Coding", "💻");
        let mut o = outcome(Mode::Work, 1500, 0);
        o.category = Some(&coding);
        o.completed = true;
        o.distraction_count = 3;
        let record = SessionRecord::from_outcome(&o).unwrap();
        assert_eq!(record.category, "Coding");
        assert_eq!(record.duration_minutes, 25);
        assert_eq!(record.distraction_count, 3);
        assert!(record.completed);
    }
}

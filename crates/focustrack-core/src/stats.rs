//! Focus reports computed from the session history.
//!
//! Days are calendar days in the timezone of the `now` passed to
//! [`Report::build`], so the CLI can report in local time while tests use UTC.

use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::session::{StoredSession, FALLBACK_CATEGORY};

/// Number of days covered by [`Report::last_7_days`].
pub const WEEK_DAYS: u64 = 7;

/// Minutes focused on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub minutes: u64,
}

/// Minutes focused under one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub name: String,
    pub minutes: u64,
    pub sessions: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub today_minutes: u64,
    pub today_sessions: u64,
    pub all_time_minutes: u64,
    pub total_sessions: u64,
    /// Sessions that ran down to zero.
    pub completed_sessions: u64,
    /// Sessions stopped early and saved with their elapsed minutes.
    pub partial_sessions: u64,
    pub total_distractions: u64,
    /// Oldest first, always seven entries ending today.
    pub last_7_days: Vec<DayTotal>,
    /// Highest total first; ties ordered by name.
    pub by_category: Vec<CategoryTotal>,
}

impl Report {
    pub fn build<Tz: TimeZone>(sessions: &[StoredSession], now: DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();
        let week_start = today
            .checked_sub_days(Days::new(WEEK_DAYS - 1))
            .unwrap_or(NaiveDate::MIN);

        let mut report = Report::default();
        let mut week: BTreeMap<NaiveDate, u64> = (0..WEEK_DAYS)
            .filter_map(|offset| week_start.checked_add_days(Days::new(offset)))
            .map(|date| (date, 0))
            .collect();
        let mut categories: BTreeMap<String, (u64, u64)> = BTreeMap::new();

        for session in sessions {
            let record = &session.record;
            let minutes = u64::from(record.duration_minutes);
            let day = record.timestamp.with_timezone(&tz).date_naive();

            report.total_sessions += 1;
            report.all_time_minutes += minutes;
            report.total_distractions += u64::from(record.distraction_count);
            if record.completed {
                report.completed_sessions += 1;
            } else {
                report.partial_sessions += 1;
            }
            if day == today {
                report.today_minutes += minutes;
                report.today_sessions += 1;
            }
            if let Some(total) = week.get_mut(&day) {
                *total += minutes;
            }

            let name = if record.category.trim().is_empty() {
                FALLBACK_CATEGORY.to_string()
            } else {
                record.category.clone()
            };
            let entry = categories.entry(name).or_default();
            entry.0 += minutes;
            entry.1 += 1;
        }

        report.last_7_days = week
            .into_iter()
            .map(|(date, minutes)| DayTotal { date, minutes })
            .collect();

        let mut by_category: Vec<CategoryTotal> = categories
            .into_iter()
            .map(|(name, (minutes, sessions))| CategoryTotal {
                name,
                minutes,
                sessions,
            })
            .collect();
        // BTreeMap order is by name; a stable sort keeps it for equal totals.
        by_category.sort_by(|a, b| b.minutes.cmp(&a.minutes));
        report.by_category = by_category;

        report
    }

    /// Share of all-time minutes spent in `category`, in percent.
    pub fn category_share(&self, category: &CategoryTotal) -> f64 {
        if self.all_time_minutes == 0 {
            return 0.0;
        }
        category.minutes as f64 * 100.0 / self.all_time_minutes as f64
    }
}

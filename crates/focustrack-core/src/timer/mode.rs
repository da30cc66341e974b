use serde::{Deserialize, Serialize};

/// Interval kind. Only `Work` tracks interruptions and produces session records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Work,
    ShortBreak,
    LongBreak,
}

impl Mode {
    pub fn is_break(self) -> bool {
        matches!(self, Mode::ShortBreak | Mode::LongBreak)
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Work => "Pomodoro",
            Mode::ShortBreak => "Short Break",
            Mode::LongBreak => "Long Break",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "work" | "pomodoro" | "focus" => Ok(Mode::Work),
            "short" | "short_break" | "shortbreak" => Ok(Mode::ShortBreak),
            "long" | "long_break" | "longbreak" => Ok(Mode::LongBreak),
            other => Err(format!("unknown mode '{other}' (expected work, short or long)")),
        }
    }
}

/// Read-only snapshot of the durations and auto-continue flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    #[serde(default = "default_sessions_until_long_break")]
    pub sessions_until_long_break: u32,
    #[serde(default)]
    pub auto_start_breaks: bool,
    #[serde(default)]
    pub auto_start_work: bool,
    #[serde(default = "default_true")]
    pub vibration_enabled: bool,
}

fn default_work_minutes() -> u32 {
    25
}
fn default_short_break_minutes() -> u32 {
    5
}
fn default_long_break_minutes() -> u32 {
    15
}
fn default_sessions_until_long_break() -> u32 {
    4
}
fn default_true() -> bool {
    true
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            sessions_until_long_break: default_sessions_until_long_break(),
            auto_start_breaks: false,
            auto_start_work: false,
            vibration_enabled: true,
        }
    }
}

impl TimerSettings {
    pub fn minutes_for(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Work => self.work_minutes,
            Mode::ShortBreak => self.short_break_minutes,
            Mode::LongBreak => self.long_break_minutes,
        }
    }

    /// Configured duration of `mode` in seconds, never below one minute.
    pub fn duration_secs(&self, mode: Mode) -> u64 {
        u64::from(self.minutes_for(mode).max(1)).saturating_mul(60)
    }

    pub fn auto_starts(&self, mode: Mode) -> bool {
        if mode.is_break() {
            self.auto_start_breaks
        } else {
            self.auto_start_work
        }
    }

    /// Long-break threshold; a zero in the file is treated as "every interval".
    pub fn long_break_every(&self) -> u32 {
        self.sessions_until_long_break.max(1)
    }
}

//! Contracts between the timer core and its collaborators.
//!
//! The driver talks to settings, categories, storage and the prompt surface
//! only through these traits, so the terminal front end, tests and any other
//! host can plug in their own implementations.

use crate::error::Result;
use crate::session::{Category, SessionRecord, StoredSession};
use crate::timer::{DecisionToken, Prompt, TimerSettings};

/// Read-only source of the current timer settings.
///
/// Called every time the timer enters a mode, never cached across switches.
pub trait SettingsProvider {
    fn snapshot(&self) -> TimerSettings;
}

/// The category new sessions are attributed to.
pub trait CategorySource {
    fn current(&self) -> Option<Category>;
}

/// Append-only session history from the core's point of view.
pub trait SessionStore {
    /// Persist a record and return its store id.
    fn append(&mut self, record: &SessionRecord) -> Result<i64>;

    /// All records, newest first.
    fn list_all(&self) -> Result<Vec<StoredSession>>;

    /// Remove every record. Never called by the timer itself.
    fn delete_all(&mut self) -> Result<usize>;
}

/// Presents a prompt to the user.
///
/// Must not block. The answer is delivered later as
/// [`Input::Decision`](crate::driver::Input::Decision) carrying the same token.
pub trait PromptSurface {
    fn present(&mut self, token: DecisionToken, prompt: &Prompt);
}

impl SettingsProvider for TimerSettings {
    fn snapshot(&self) -> TimerSettings {
        self.clone()
    }
}

impl CategorySource for Option<Category> {
    fn current(&self) -> Option<Category> {
        self.clone()
    }
}

impl<T: SettingsProvider + ?Sized> SettingsProvider for Box<T> {
    fn snapshot(&self) -> TimerSettings {
        (**self).snapshot()
    }
}

impl<T: CategorySource + ?Sized> CategorySource for Box<T> {
    fn current(&self) -> Option<Category> {
        (**self).current()
    }
}

impl<T: SessionStore + ?Sized> SessionStore for Box<T> {
    fn append(&mut self, record: &SessionRecord) -> Result<i64> {
        (**self).append(record)
    }

    fn list_all(&self) -> Result<Vec<StoredSession>> {
        (**self).list_all()
    }

    fn delete_all(&mut self) -> Result<usize> {
        (**self).delete_all()
    }
}

impl<T: PromptSurface + ?Sized> PromptSurface for Box<T> {
    fn present(&mut self, token: DecisionToken, prompt: &Prompt) {
        (**self).present(token, prompt)
    }
}

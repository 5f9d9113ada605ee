//! # Initialization Failure Notices
//!
//! When the database cannot be opened, the user is told once per failed
//! attempt, no matter how many operations were waiting on it. How the notice
//! is shown (dialog, stderr, log line) is up to the [`Notifier`].

use std::sync::Mutex;

use tracing::error;

/// User-facing description of a failed initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitFailureNotice {
    pub title: String,
    pub message: String,
}

impl InitFailureNotice {
    /// Notice for an attempt that failed with `reason`.
    pub fn storage_unavailable(reason: impl std::fmt::Display) -> Self {
        InitFailureNotice {
            title: "Device storage unavailable".to_string(),
            message: format!(
                "The device database could not be opened, so devices cannot be \
                 listed or saved right now. Details: {reason}"
            ),
        }
    }
}

/// Presents initialization failures to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &InitFailureNotice);
}

/// Writes notices to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &InitFailureNotice) {
        error!(title = %notice.title, "{}", notice.message);
    }
}

/// Keeps every notice it receives. Useful in tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<InitFailureNotice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        RecordingNotifier::default()
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    pub fn notices(&self) -> Vec<InitFailureNotice> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<InitFailureNotice>> {
        self.notices.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: &InitFailureNotice) {
        self.lock().push(notice.clone());
    }
}

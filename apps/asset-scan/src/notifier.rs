//! Shows database initialization failures on the terminal.

use asset_db::{InitFailureNotice, Notifier};
use tracing::error;

/// Prints the notice to stderr and logs it.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, notice: &InitFailureNotice) {
        error!(title = %notice.title, "{}", notice.message);
        eprintln!("{}\n  {}", notice.title, notice.message);
    }
}

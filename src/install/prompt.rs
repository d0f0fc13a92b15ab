//! User decisions the installer needs while it runs.

use std::path::Path;

use inquire::{Confirm, Select};
use log::{error, warn};

/// Answer to "the installed executable is locked".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    Cancel,
}

/// Synchronous callbacks into whatever presentation layer hosts the installer.
pub trait Prompter {
    /// The previous executable at `path` could not be removed, most likely
    /// because it is still running.
    fn locked_executable(&self, display_name: &str, path: &Path) -> RetryDecision;

    /// Ask whether to put a shortcut on the desktop.
    fn confirm_shortcut(&self, display_name: &str) -> bool;

    /// Surface an external tool failure.
    fn report_error(&self, title: &str, message: &str);
}

/// Terminal prompts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolePrompter;

impl Prompter for ConsolePrompter {
    fn locked_executable(&self, display_name: &str, path: &Path) -> RetryDecision {
        let message = format!(
            "{display_name} is already running ({}). Please close it to upgrade.",
            path.display()
        );
        match Select::new(&message, vec!["Retry", "Cancel"]).prompt() {
            Ok("Retry") => RetryDecision::Retry,
            Ok(_) => RetryDecision::Cancel,
            Err(e) => {
                warn!("Prompt failed, cancelling upgrade retry: {e}");
                RetryDecision::Cancel
            }
        }
    }

    fn confirm_shortcut(&self, display_name: &str) -> bool {
        Confirm::new(&format!(
            "{display_name} has been installed. Create a desktop shortcut?"
        ))
        .with_default(true)
        .prompt()
        .unwrap_or(false)
    }

    fn report_error(&self, title: &str, message: &str) {
        error!("{title}");
        eprintln!("{title}\n{message}");
    }
}

/// Unattended runs: never retry, never create shortcuts, log errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractive;

impl Prompter for NonInteractive {
    fn locked_executable(&self, display_name: &str, path: &Path) -> RetryDecision {
        warn!("{display_name} is running from {}, not retrying", path.display());
        RetryDecision::Cancel
    }

    fn confirm_shortcut(&self, _display_name: &str) -> bool {
        false
    }

    fn report_error(&self, title: &str, message: &str) {
        error!("{title}: {message}");
    }
}

//! Local deployment and integrity of the application bundle
//!
//! The surrounding application builds an [`Installer`] once at startup and
//! calls [`Installer::ensure_installed`]. Everything touching the OS sits
//! behind three seams so the orchestration is testable anywhere:
//! - [`CommandRunner`] for the driver query tool, `schtasks` and the driver
//!   package installer
//! - [`Platform`] for registry, shell links and reboot-time deletion
//! - [`Prompter`] for the retry/cancel and shortcut questions

mod arch;
mod assets;
mod command;
mod detection;
mod error;
mod installer;
mod integrity;
mod manifest;
mod platform;
mod prompt;
mod schedule;
mod uninstall;

#[cfg(target_os = "windows")]
mod windows;

pub use arch::Arch;
pub use assets::{AssetSource, BundleDir, MemoryAssets};
pub use command::{
    CommandOutput, CommandRunner, CommandSpec, DRIVER_QUERY_TIMEOUT, SystemRunner,
    TASK_CREATE_TIMEOUT, TASK_DELETE_TIMEOUT,
};
pub use detection::{FOUND_SUFFIX, parse_device_count};
pub use error::InstallerError;
pub use installer::{Installer, InstallerBuilder};
pub use integrity::hash_file;
pub use manifest::{Index, ManifestEntry, load_index};
pub use platform::{Platform, RegistryView, UnsupportedPlatform, UserPrincipal};
pub use prompt::{ConsolePrompter, NonInteractive, Prompter, RetryDecision};
pub use schedule::{RENDERED_FILE, ScheduledTaskSpec, TASK_TOOL, TEMPLATE_RESOURCE};
pub use uninstall::UninstallReport;

#[cfg(target_os = "windows")]
pub use windows::WindowsPlatform;

//! Deployment and integrity core of the LVPNGUI tray client.
//!
//! See [`install::Installer`] for the entry points used by the application.

pub mod config;
pub mod install;

pub use config::AppConfig;
pub use install::{Installer, InstallerBuilder, InstallerError};

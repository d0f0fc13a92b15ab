//! OS shell integration seam.
//!
//! The orchestrator only sees this trait; the Windows shim lives in
//! `install::windows`. Other targets get [`UnsupportedPlatform`], which
//! reports "not present" for lookups and fails shell operations.

use std::path::{Path, PathBuf};

use super::InstallerError;

/// Registry view used for lookups under HKEY_LOCAL_MACHINE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryView {
    /// The view matching the current process.
    Native,
    /// Force the 64-bit view (`KEY_WOW64_64KEY`).
    Force64,
}

/// Account the scheduled task runs as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPrincipal {
    pub domain: Option<String>,
    pub name: String,
}

impl UserPrincipal {
    /// `DOMAIN\user`, or the bare name when no domain is known.
    pub fn qualified(&self) -> String {
        match &self.domain {
            Some(domain) if !domain.is_empty() => format!("{domain}\\{}", self.name),
            _ => self.name.clone(),
        }
    }
}

pub trait Platform {
    /// Default value of `HKLM\<key>`; `None` on any failure.
    fn install_location(&self, key: &str, view: RegistryView) -> Option<PathBuf>;

    /// Create a shell link at `link` pointing to `target`.
    fn create_shortcut(
        &self,
        link: &Path,
        target: &Path,
        description: &str,
    ) -> Result<(), InstallerError>;

    /// Ask the OS to remove `path` at next reboot.
    fn delete_on_reboot(&self, path: &Path) -> Result<(), InstallerError>;

    fn desktop_dir(&self) -> Option<PathBuf>;

    fn current_user(&self) -> Option<UserPrincipal>;
}

/// User identity from the `USERDOMAIN`/`USERNAME` environment variables.
pub fn user_from_env() -> Option<UserPrincipal> {
    let name = std::env::var("USERNAME").ok().filter(|n| !n.is_empty())?;
    Some(UserPrincipal {
        domain: std::env::var("USERDOMAIN").ok(),
        name,
    })
}

/// Shim for targets without an implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedPlatform;

impl Platform for UnsupportedPlatform {
    fn install_location(&self, key: &str, _view: RegistryView) -> Option<PathBuf> {
        log::debug!("registry lookup for {key} not supported on this platform");
        None
    }

    fn create_shortcut(
        &self,
        link: &Path,
        target: &Path,
        _description: &str,
    ) -> Result<(), InstallerError> {
        Err(InstallerError::Shortcut {
            link: link.to_path_buf(),
            target: target.to_path_buf(),
            reason: "shell links are not supported on this platform".to_string(),
        })
    }

    fn delete_on_reboot(&self, path: &Path) -> Result<(), InstallerError> {
        Err(InstallerError::Platform(format!(
            "deferred deletion of {} is not supported on this platform",
            path.display()
        )))
    }

    fn desktop_dir(&self) -> Option<PathBuf> {
        dirs::desktop_dir()
    }

    fn current_user(&self) -> Option<UserPrincipal> {
        user_from_env()
    }
}

/// Platform shim for the running OS.
pub fn native() -> Box<dyn Platform> {
    cfg_if::cfg_if! {
        if #[cfg(target_os = "windows")] {
            Box::new(super::windows::WindowsPlatform::new())
        } else {
            Box::new(UnsupportedPlatform)
        }
    }
}

//! Windows shim: registry through `RegOpenKeyExW`, shortcuts through the
//! `IShellLinkW` COM object, deferred deletion through `MoveFileExW`.

use std::path::{Path, PathBuf};

use crate::install::InstallerError;
use crate::install::platform::{Platform, RegistryView, UserPrincipal, user_from_env};

mod handles;
mod registry;
mod shell;
mod utils;

#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsPlatform;

impl WindowsPlatform {
    pub fn new() -> Self {
        Self
    }
}

impl Platform for WindowsPlatform {
    fn install_location(&self, key: &str, view: RegistryView) -> Option<PathBuf> {
        registry::default_value(key, view)
    }

    fn create_shortcut(
        &self,
        link: &Path,
        target: &Path,
        description: &str,
    ) -> Result<(), InstallerError> {
        shell::create_link(link, target, description).map_err(|e| InstallerError::Shortcut {
            link: link.to_path_buf(),
            target: target.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn delete_on_reboot(&self, path: &Path) -> Result<(), InstallerError> {
        shell::delete_at_reboot(path).map_err(|e| {
            InstallerError::Platform(format!(
                "MoveFileExW({}, MOVEFILE_DELAY_UNTIL_REBOOT) failed: {e}",
                path.display()
            ))
        })
    }

    fn desktop_dir(&self) -> Option<PathBuf> {
        dirs::desktop_dir()
    }

    fn current_user(&self) -> Option<UserPrincipal> {
        user_from_env()
    }
}

//! Uninstallation and cleanup
//!
//! Removal is best-effort. The main executable, the single-instance lock
//! file and the root directory itself may still be in use while the
//! application uninstalls itself; whatever survives is handed to the OS for
//! deletion at next reboot.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use walkdir::WalkDir;

use super::platform::Platform;

/// What happened to the installation root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UninstallReport {
    /// Files and directories removed right away.
    pub removed: Vec<PathBuf>,
    /// Paths the OS will delete at next reboot.
    pub deferred: Vec<PathBuf>,
    /// Paths that could neither be removed nor scheduled.
    pub left_behind: Vec<PathBuf>,
}

impl UninstallReport {
    pub fn is_complete(&self) -> bool {
        self.deferred.is_empty() && self.left_behind.is_empty()
    }
}

/// Remove `root` recursively and defer the `locked` paths that survive.
///
/// A missing root is a no-op.
pub fn remove_installation(
    root: &Path,
    locked: &[PathBuf],
    platform: &dyn Platform,
) -> UninstallReport {
    remove_installation_with(root, locked, platform, remove_entry)
}

/// [`remove_installation`] with a custom per-entry removal; `remove` gets
/// the path and whether it is a directory.
pub fn remove_installation_with(
    root: &Path,
    locked: &[PathBuf],
    platform: &dyn Platform,
    mut remove: impl FnMut(&Path, bool) -> io::Result<()>,
) -> UninstallReport {
    let mut report = UninstallReport::default();
    if !root.exists() {
        debug!("Nothing to uninstall at {}", root.display());
        return report;
    }

    info!("Removing installation at {}", root.display());
    remove_tree_best_effort(root, &mut report, &mut remove);

    for path in locked {
        if !path.exists() {
            continue;
        }
        match platform.delete_on_reboot(path) {
            Ok(()) => {
                info!("Scheduled {} for deletion at reboot", path.display());
                report.deferred.push(path.clone());
            }
            Err(e) => {
                warn!("Failed to schedule {} for deletion: {e}", path.display());
                report.left_behind.push(path.clone());
            }
        }
    }

    // Anything else still standing was neither removable nor deferred.
    for entry in WalkDir::new(root).min_depth(1).into_iter().filter_map(Result::ok) {
        let path = entry.into_path();
        if !report.deferred.contains(&path) && !report.left_behind.contains(&path) {
            report.left_behind.push(path);
        }
    }

    info!(
        "Uninstall finished: {} removed, {} deferred, {} left behind",
        report.removed.len(),
        report.deferred.len(),
        report.left_behind.len()
    );
    report
}

/// Delete children before parents, continuing past every failure.
fn remove_tree_best_effort(
    root: &Path,
    report: &mut UninstallReport,
    remove: &mut impl FnMut(&Path, bool) -> io::Result<()>,
) {
    for entry in WalkDir::new(root).contents_first(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Failed to walk installation directory: {e}");
                continue;
            }
        };

        let path = entry.path();
        match remove(path, entry.file_type().is_dir()) {
            Ok(()) => report.removed.push(path.to_path_buf()),
            Err(e) => debug!("Could not remove {} now: {e}", path.display()),
        }
    }
}

fn remove_entry(path: &Path, is_dir: bool) -> io::Result<()> {
    if is_dir {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    }
}

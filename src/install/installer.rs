//! Installer orchestration: verification, install/upgrade, uninstall and
//! start-on-boot, composed from the leaf modules.
//!
//! Nothing here is transactional. A failure halfway through `install()`
//! leaves a partially updated root; the next `is_installed()` notices the
//! mismatch and the caller runs `install()` again.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::arch::Arch;
use super::assets::{AssetSource, BundleDir};
use super::command::{CommandRunner, CommandSpec, SystemRunner};
use super::detection::driver_present;
use super::integrity::{Mismatch, same_binary, verify_files};
use super::manifest::{Index, load_index};
use super::platform::{self, Platform};
use super::prompt::{NonInteractive, Prompter, RetryDecision};
use super::schedule::{RENDERED_FILE, ScheduledTaskSpec, TaskScheduler};
use super::uninstall::{UninstallReport, remove_installation};
use super::InstallerError;
use crate::config::AppConfig;

/// Builds an [`Installer`], filling unset collaborators with the host defaults.
pub struct InstallerBuilder {
    config: AppConfig,
    arch: Option<Arch>,
    base_dir: Option<PathBuf>,
    current_exe: Option<PathBuf>,
    assets: Option<Box<dyn AssetSource>>,
    platform: Option<Box<dyn Platform>>,
    runner: Option<Box<dyn CommandRunner>>,
    prompter: Option<Box<dyn Prompter>>,
}

impl InstallerBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            arch: None,
            base_dir: None,
            current_exe: None,
            assets: None,
            platform: None,
            runner: None,
            prompter: None,
        }
    }

    /// Bundle architecture; detected from the build target when unset.
    pub fn arch(mut self, arch: Arch) -> Self {
        self.arch = Some(arch);
        self
    }

    /// Directory replacing the per-user application-data area.
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Path of the running executable; `std::env::current_exe()` when unset.
    pub fn current_exe(mut self, path: impl Into<PathBuf>) -> Self {
        self.current_exe = Some(path.into());
        self
    }

    pub fn assets(mut self, assets: impl AssetSource + 'static) -> Self {
        self.assets = Some(Box::new(assets));
        self
    }

    pub fn platform(mut self, platform: impl Platform + 'static) -> Self {
        self.platform = Some(Box::new(platform));
        self
    }

    pub fn runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.runner = Some(Box::new(runner));
        self
    }

    pub fn prompter(mut self, prompter: impl Prompter + 'static) -> Self {
        self.prompter = Some(Box::new(prompter));
        self
    }

    /// Resolve defaults and load the manifest. A bad manifest is fatal.
    pub fn build(self) -> Result<Installer, InstallerError> {
        let arch = match self.arch {
            Some(arch) => arch,
            None => Arch::detect()?,
        };
        let current_exe = match self.current_exe {
            Some(path) => path,
            None => std::env::current_exe()?,
        };
        let root = self.config.installation_root(self.base_dir.as_deref())?;
        let assets = match self.assets {
            Some(assets) => assets,
            None => Box::new(BundleDir::new(
                self.config.resolve_bundle_dir(current_exe.parent()),
            )),
        };

        let index = load_index(assets.as_ref(), arch)?;
        info!(
            "Installer ready: root={}, arch={arch}, {} manifest entries",
            root.display(),
            index.len()
        );

        Ok(Installer {
            config: self.config,
            arch,
            root,
            current_exe,
            index,
            assets,
            platform: self.platform.unwrap_or_else(platform::native),
            runner: self.runner.unwrap_or_else(|| Box::new(SystemRunner)),
            prompter: self.prompter.unwrap_or_else(|| Box::new(NonInteractive)),
        })
    }
}

/// Local deployment of the application bundle.
pub struct Installer {
    config: AppConfig,
    arch: Arch,
    root: PathBuf,
    current_exe: PathBuf,
    index: Index,
    assets: Box<dyn AssetSource>,
    platform: Box<dyn Platform>,
    runner: Box<dyn CommandRunner>,
    prompter: Box<dyn Prompter>,
}

impl Installer {
    pub fn builder(config: AppConfig) -> InstallerBuilder {
        InstallerBuilder::new(config)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn arch(&self) -> Arch {
        self.arch
    }

    /// Installation root (`<data dir>/<org>/<name>`).
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn installed_exe(&self) -> PathBuf {
        self.root.join(&self.config.exe_name)
    }

    pub fn lock_file(&self) -> PathBuf {
        self.root.join(&self.config.lock_file)
    }

    /// Read-only check: manifest files, running binary, driver, in that order.
    pub fn is_installed(&self) -> bool {
        if let Err(mismatch) = verify_files(&self.root, &self.index) {
            match mismatch {
                Mismatch::Unreadable { filename, reason } => {
                    info!("Installer: cannot open {}: {reason}", self.root.join(filename).display());
                }
                Mismatch::Digest { filename, actual } => {
                    info!(
                        "Installer: different hash for {}: {actual}",
                        self.root.join(filename).display()
                    );
                }
            }
            return false;
        }

        if !same_binary(&self.current_exe, &self.installed_exe()) {
            info!("Installer: different hash for app binary");
            return false;
        }

        if !self.driver_present() {
            info!("Installer: TAP driver not detected");
            return false;
        }

        true
    }

    pub fn driver_present(&self) -> bool {
        driver_present(
            self.platform.as_ref(),
            self.runner.as_ref(),
            &self.config.driver,
            self.arch,
        )
    }

    /// Install or upgrade in place. Every bundled file is rewritten.
    pub fn install(&self) -> Result<(), InstallerError> {
        info!("Installing {} into {}", self.config.display_name, self.root.display());

        fs::create_dir_all(&self.root).map_err(|source| InstallerError::CreateRoot {
            path: self.root.clone(),
            source,
        })?;

        self.write_bundled_files()?;
        self.upgrade_executable()?;
        self.install_driver();
        self.offer_shortcut()?;

        info!("{} installed", self.config.display_name);
        Ok(())
    }

    /// Run `install()` unless `is_installed()` already holds. Returns
    /// whether an install ran.
    pub fn ensure_installed(&self) -> Result<bool, InstallerError> {
        if self.is_installed() {
            info!("Installation verified - all components present");
            return Ok(false);
        }
        info!("Installation required, running installer");
        self.install()?;
        Ok(true)
    }

    /// Remove the installation root; locked leftovers go at next reboot.
    pub fn uninstall(&self) -> UninstallReport {
        let locked = [self.installed_exe(), self.lock_file(), self.root.clone()];
        remove_installation(&self.root, &locked, self.platform.as_ref())
    }

    /// Replace the logon task with one for the installed executable, or just
    /// remove it when `enabled` is false.
    ///
    /// `Ok(false)` means `schtasks` rejected the task and the user has been
    /// told; callers that already stored "enabled" must revert it.
    pub fn set_start_on_boot(&self, enabled: bool) -> Result<bool, InstallerError> {
        let scheduler = TaskScheduler {
            runner: self.runner.as_ref(),
            prompter: self.prompter.as_ref(),
            assets: self.assets.as_ref(),
        };
        let task_name = self.config.task_name();

        scheduler.delete(&task_name);
        if !enabled {
            return Ok(true);
        }

        let user = self
            .platform
            .current_user()
            .ok_or_else(|| InstallerError::Platform("cannot determine current user".into()))?;
        let spec = ScheduledTaskSpec {
            task_name,
            executable_path: self.installed_exe(),
            user,
            xml_path: self.root.join(RENDERED_FILE),
        };
        scheduler.create(&spec)
    }

    fn write_bundled_files(&self) -> Result<(), InstallerError> {
        for (filename, _) in self.index.iter() {
            let name = format!("{}/{}", self.arch.resource_dir(), filename.replace('\\', "/"));
            let dest = self.root.join(filename);

            let data = self.assets.read(&name).map_err(|source| InstallerError::ReadAsset {
                name: name.clone(),
                dest: dest.clone(),
                source,
            })?;

            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|source| InstallerError::WriteFile {
                    path: dest.clone(),
                    source,
                })?;
            }
            fs::write(&dest, data).map_err(|source| InstallerError::WriteFile {
                path: dest.clone(),
                source,
            })?;
            debug!("Wrote {}", dest.display());
        }
        Ok(())
    }

    /// Replace the installed executable with the running one.
    ///
    /// The old copy is deleted before the new one is copied, so an
    /// interruption in between leaves no executable in the root.
    fn upgrade_executable(&self) -> Result<(), InstallerError> {
        let installed = self.installed_exe();

        if is_same_file(&self.current_exe, &installed) {
            debug!("Running from {}, nothing to copy", installed.display());
            return Ok(());
        }

        if installed.exists() {
            loop {
                match fs::remove_file(&installed) {
                    Ok(()) => break,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => break,
                    Err(e) => {
                        warn!("Cannot remove {}: {e}", installed.display());
                        let decision = self
                            .prompter
                            .locked_executable(&self.config.display_name, &installed);
                        if decision == RetryDecision::Cancel {
                            break;
                        }
                    }
                }
            }

            if installed.exists() {
                fs::remove_file(&installed).map_err(|source| {
                    InstallerError::LockedExecutable {
                        path: installed.clone(),
                        source,
                    }
                })?;
            }
        }

        fs::copy(&self.current_exe, &installed).map_err(|source| {
            InstallerError::CopyExecutable {
                from: self.current_exe.clone(),
                to: installed.clone(),
                source,
            }
        })?;
        info!("Copied {} -> {}", self.current_exe.display(), installed.display());
        Ok(())
    }

    /// Run the bundled driver package in the foreground when the driver is
    /// missing. It may ask for consent, so there is no time bound.
    fn install_driver(&self) {
        if self.driver_present() {
            return;
        }

        let package = self.root.join(&self.config.driver.installer);
        info!("Starting driver installer {}", package.display());
        match self.runner.run(&CommandSpec::new(&package).foreground(), None) {
            Ok(out) if out.success() => info!("Driver installer finished"),
            Ok(out) => warn!("Driver installer exited with {:?}", out.code),
            Err(e) => warn!("Could not start driver installer: {e}"),
        }
    }

    fn offer_shortcut(&self) -> Result<(), InstallerError> {
        let display_name = &self.config.display_name;
        if !self.prompter.confirm_shortcut(display_name) {
            return Ok(());
        }

        let target = self.installed_exe();
        let desktop = self
            .platform
            .desktop_dir()
            .ok_or_else(|| InstallerError::Shortcut {
                link: PathBuf::from(format!("{display_name}.lnk")),
                target: target.clone(),
                reason: "desktop directory unknown".to_string(),
            })?;
        let link = desktop.join(format!("{display_name}.lnk"));

        self.platform.create_shortcut(&link, &target, display_name)?;
        info!("Created desktop shortcut {}", link.display());
        Ok(())
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

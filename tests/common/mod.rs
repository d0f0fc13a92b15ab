#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use lvpngui_installer::AppConfig;
use lvpngui_installer::install::{
    CommandOutput, CommandRunner, CommandSpec, Installer, InstallerBuilder, InstallerError,
    MemoryAssets, Platform, Prompter, RegistryView, RetryDecision, UserPrincipal,
};

pub const EMPTY_SHA1: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";
pub const ABC_SHA1: &str = "a9993e364706816aba3e25717850c26c9cd0d89d";
pub const FOUND_ONE: &str = "ROOT\\NET\\0000 : TAP-Windows Adapter V9\r\n1 matching device(s) found.\r\n";

/// Runner that records invocations and answers from a script.
#[derive(Clone, Default)]
pub struct FakeRunner {
    pub calls: Rc<RefCell<Vec<(CommandSpec, Option<Duration>)>>>,
    /// Output returned for `find <device>` queries.
    pub driver_output: Rc<RefCell<String>>,
    /// Exit code returned for `schtasks /Create`.
    pub create_code: Rc<RefCell<Option<i32>>>,
    pub create_output: Rc<RefCell<String>>,
    /// When set, a foreground run (driver package) makes the driver appear.
    pub installer_fixes_driver: Rc<RefCell<bool>>,
}

impl FakeRunner {
    pub fn with_driver() -> Self {
        let runner = Self::default();
        *runner.driver_output.borrow_mut() = FOUND_ONE.to_string();
        *runner.create_code.borrow_mut() = Some(0);
        runner
    }

    pub fn without_driver() -> Self {
        let runner = Self::with_driver();
        *runner.driver_output.borrow_mut() = "No matching devices found.\r\n".to_string();
        runner
    }

    pub fn calls(&self) -> Vec<(CommandSpec, Option<Duration>)> {
        self.calls.borrow().clone()
    }

    pub fn foreground_calls(&self) -> Vec<CommandSpec> {
        self.calls()
            .into_iter()
            .filter(|(spec, _)| spec.foreground)
            .map(|(spec, _)| spec)
            .collect()
    }

    pub fn schtasks_calls(&self) -> Vec<(Vec<String>, Option<Duration>)> {
        self.calls()
            .into_iter()
            .filter(|(spec, _)| spec.program == Path::new("schtasks"))
            .map(|(spec, timeout)| (spec.arg_strings(), timeout))
            .collect()
    }
}

impl CommandRunner for FakeRunner {
    fn run(
        &self,
        spec: &CommandSpec,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, InstallerError> {
        self.calls.borrow_mut().push((spec.clone(), timeout));
        let args = spec.arg_strings();

        if spec.foreground {
            if *self.installer_fixes_driver.borrow() {
                *self.driver_output.borrow_mut() = FOUND_ONE.to_string();
            }
            return Ok(CommandOutput {
                code: Some(0),
                ..Default::default()
            });
        }

        match args.first().map(String::as_str) {
            Some("find") => Ok(CommandOutput {
                code: Some(0),
                output: self.driver_output.borrow().clone(),
                timed_out: false,
            }),
            // Deleting a task that does not exist fails; the installer ignores it.
            Some("/Delete") => Ok(CommandOutput {
                code: Some(1),
                output: "ERROR: The system cannot find the file specified.".into(),
                timed_out: false,
            }),
            Some("/Create") => Ok(CommandOutput {
                code: *self.create_code.borrow(),
                output: self.create_output.borrow().clone(),
                timed_out: false,
            }),
            _ => Ok(CommandOutput::default()),
        }
    }
}

#[derive(Clone)]
pub struct FakePlatform {
    pub tap_location: Option<PathBuf>,
    pub desktop: Option<PathBuf>,
    pub shortcuts: Rc<RefCell<Vec<(PathBuf, PathBuf, String)>>>,
    pub deferred: Rc<RefCell<Vec<PathBuf>>>,
}

impl FakePlatform {
    pub fn new(desktop: Option<PathBuf>) -> Self {
        Self {
            tap_location: Some(PathBuf::from("C:/Program Files/TAP-Windows")),
            desktop,
            shortcuts: Rc::default(),
            deferred: Rc::default(),
        }
    }
}

impl Platform for FakePlatform {
    fn install_location(&self, _key: &str, _view: RegistryView) -> Option<PathBuf> {
        self.tap_location.clone()
    }

    fn create_shortcut(
        &self,
        link: &Path,
        target: &Path,
        description: &str,
    ) -> Result<(), InstallerError> {
        self.shortcuts.borrow_mut().push((
            link.to_path_buf(),
            target.to_path_buf(),
            description.to_string(),
        ));
        Ok(())
    }

    fn delete_on_reboot(&self, path: &Path) -> Result<(), InstallerError> {
        self.deferred.borrow_mut().push(path.to_path_buf());
        Ok(())
    }

    fn desktop_dir(&self) -> Option<PathBuf> {
        self.desktop.clone()
    }

    fn current_user(&self) -> Option<UserPrincipal> {
        Some(UserPrincipal {
            domain: Some("CORP".into()),
            name: "alice".into(),
        })
    }
}

type LockedHook = Rc<dyn Fn(&Path) -> RetryDecision>;

/// Prompter answering from fixed choices and recording what it was asked.
#[derive(Clone)]
pub struct ScriptedPrompter {
    pub create_shortcut: bool,
    pub on_locked: LockedHook,
    pub locked_prompts: Rc<RefCell<usize>>,
    pub errors: Rc<RefCell<Vec<(String, String)>>>,
}

impl ScriptedPrompter {
    pub fn new(create_shortcut: bool) -> Self {
        Self {
            create_shortcut,
            on_locked: Rc::new(|_| RetryDecision::Cancel),
            locked_prompts: Rc::default(),
            errors: Rc::default(),
        }
    }

    pub fn on_locked(mut self, hook: impl Fn(&Path) -> RetryDecision + 'static) -> Self {
        self.on_locked = Rc::new(hook);
        self
    }
}

impl Prompter for ScriptedPrompter {
    fn locked_executable(&self, _display_name: &str, path: &Path) -> RetryDecision {
        *self.locked_prompts.borrow_mut() += 1;
        (self.on_locked)(path)
    }

    fn confirm_shortcut(&self, _display_name: &str) -> bool {
        self.create_shortcut
    }

    fn report_error(&self, title: &str, message: &str) {
        self.errors
            .borrow_mut()
            .push((title.to_string(), message.to_string()));
    }
}

/// Temporary layout: a base dir for the install root and a running executable.
pub struct Sandbox {
    pub tmp: tempfile::TempDir,
    pub base: PathBuf,
    pub exe: PathBuf,
}

impl Sandbox {
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join("appdata");
        let dist = tmp.path().join("dist");
        fs::create_dir_all(&dist).unwrap();
        let exe = dist.join("lvpngui.exe");
        fs::write(&exe, b"lvpngui v2").unwrap();
        Self { tmp, base, exe }
    }

    pub fn root(&self) -> PathBuf {
        self.base.join("LVPNGUI").join("lvpngui")
    }

    pub fn desktop(&self) -> PathBuf {
        self.tmp.path().join("Desktop")
    }
}

/// Bundle with `openvpn.exe` = "abc" and an empty `tap-windows.exe`.
pub fn bundle() -> MemoryAssets {
    MemoryAssets::new()
        .with(
            "bin64/index.txt",
            format!("# x64 bundle\n{ABC_SHA1} openvpn.exe\n{EMPTY_SHA1} tap-windows.exe\n"),
        )
        .with("bin64/openvpn.exe", b"abc".to_vec())
        .with("bin64/tap-windows.exe", Vec::new())
}

pub fn builder(
    sandbox: &Sandbox,
    assets: MemoryAssets,
    platform: &FakePlatform,
    runner: &FakeRunner,
    prompter: &ScriptedPrompter,
) -> InstallerBuilder {
    Installer::builder(AppConfig::default())
        .arch(lvpngui_installer::install::Arch::X64)
        .base_dir(&sandbox.base)
        .current_exe(&sandbox.exe)
        .assets(assets)
        .platform(platform.clone())
        .runner(runner.clone())
        .prompter(prompter.clone())
}

mod common;

use std::fs;

use common::*;
use lvpngui_installer::install::{InstallerError, RetryDecision};

#[test]
fn install_then_verify_is_idempotent() {
    let sandbox = Sandbox::new();
    let platform = FakePlatform::new(Some(sandbox.desktop()));
    let runner = FakeRunner::with_driver();
    let prompter = ScriptedPrompter::new(false);
    let installer = builder(&sandbox, bundle(), &platform, &runner, &prompter)
        .build()
        .unwrap();

    assert_eq!(installer.root(), sandbox.root());
    assert!(!installer.is_installed());

    installer.install().unwrap();

    let root = sandbox.root();
    assert_eq!(fs::read(root.join("openvpn.exe")).unwrap(), b"abc");
    assert_eq!(fs::read(root.join("tap-windows.exe")).unwrap(), b"");
    assert_eq!(fs::read(root.join("lvpngui.exe")).unwrap(), b"lvpngui v2");
    assert!(installer.is_installed());
    assert!(runner.foreground_calls().is_empty());
    assert!(platform.shortcuts.borrow().is_empty());

    assert!(!installer.ensure_installed().unwrap());
}

#[test]
fn ensure_installed_runs_install_when_needed() {
    let sandbox = Sandbox::new();
    let platform = FakePlatform::new(None);
    let runner = FakeRunner::with_driver();
    let prompter = ScriptedPrompter::new(false);
    let installer = builder(&sandbox, bundle(), &platform, &runner, &prompter)
        .build()
        .unwrap();

    assert!(installer.ensure_installed().unwrap());
    assert!(installer.is_installed());
}

#[test]
fn differing_content_against_empty_digest_is_not_installed() {
    let sandbox = Sandbox::new();
    let platform = FakePlatform::new(None);
    let runner = FakeRunner::with_driver();
    let prompter = ScriptedPrompter::new(false);
    let installer = builder(&sandbox, bundle(), &platform, &runner, &prompter)
        .build()
        .unwrap();
    installer.install().unwrap();

    fs::write(sandbox.root().join("tap-windows.exe"), b"tampered").unwrap();
    assert!(!installer.is_installed());

    installer.install().unwrap();
    assert!(installer.is_installed());
}

#[test]
fn digest_comparison_is_case_insensitive() {
    let sandbox = Sandbox::new();
    let platform = FakePlatform::new(None);
    let runner = FakeRunner::with_driver();
    let prompter = ScriptedPrompter::new(false);
    let assets = bundle().with(
        "bin64/index.txt",
        format!("{} openvpn.exe\n", ABC_SHA1.to_uppercase()),
    );
    let installer = builder(&sandbox, assets, &platform, &runner, &prompter)
        .build()
        .unwrap();

    installer.install().unwrap();
    assert!(installer.is_installed());
}

#[test]
fn newer_running_binary_means_upgrade_pending() {
    let sandbox = Sandbox::new();
    let platform = FakePlatform::new(None);
    let runner = FakeRunner::with_driver();
    let prompter = ScriptedPrompter::new(false);
    let installer = builder(&sandbox, bundle(), &platform, &runner, &prompter)
        .build()
        .unwrap();
    installer.install().unwrap();

    fs::write(&sandbox.exe, b"lvpngui v3").unwrap();
    assert!(!installer.is_installed());

    installer.install().unwrap();
    assert_eq!(
        fs::read(sandbox.root().join("lvpngui.exe")).unwrap(),
        b"lvpngui v3"
    );
    assert!(installer.is_installed());
    assert_eq!(*prompter.locked_prompts.borrow(), 0);
}

#[test]
fn missing_driver_runs_package_installer_without_timeout() {
    let sandbox = Sandbox::new();
    let platform = FakePlatform::new(None);
    let runner = FakeRunner::without_driver();
    *runner.installer_fixes_driver.borrow_mut() = true;
    let prompter = ScriptedPrompter::new(false);
    let installer = builder(&sandbox, bundle(), &platform, &runner, &prompter)
        .build()
        .unwrap();

    assert!(!installer.driver_present());
    installer.install().unwrap();

    let calls = runner.calls();
    let (package, timeout) = calls
        .iter()
        .find(|(spec, _)| spec.foreground)
        .expect("driver package should run");
    assert_eq!(package.program, sandbox.root().join("tap-windows.exe"));
    assert_eq!(*timeout, None);
    assert!(installer.is_installed());
}

#[test]
fn driver_still_absent_keeps_installation_incomplete() {
    let sandbox = Sandbox::new();
    let platform = FakePlatform::new(None);
    let runner = FakeRunner::without_driver();
    let prompter = ScriptedPrompter::new(false);
    let installer = builder(&sandbox, bundle(), &platform, &runner, &prompter)
        .build()
        .unwrap();

    installer.install().unwrap();
    assert_eq!(runner.foreground_calls().len(), 1);
    assert!(!installer.is_installed());
}

#[test]
fn missing_registry_key_means_driver_absent() {
    let sandbox = Sandbox::new();
    let mut platform = FakePlatform::new(None);
    platform.tap_location = None;
    let runner = FakeRunner::with_driver();
    let prompter = ScriptedPrompter::new(false);
    let installer = builder(&sandbox, bundle(), &platform, &runner, &prompter)
        .build()
        .unwrap();

    installer.install().unwrap();
    assert!(!installer.is_installed());
    assert!(runner.calls().iter().all(|(spec, _)| spec.foreground));
}

#[test]
fn accepted_shortcut_points_at_installed_executable() {
    let sandbox = Sandbox::new();
    let platform = FakePlatform::new(Some(sandbox.desktop()));
    let runner = FakeRunner::with_driver();
    let prompter = ScriptedPrompter::new(true);
    let installer = builder(&sandbox, bundle(), &platform, &runner, &prompter)
        .build()
        .unwrap();

    installer.install().unwrap();

    let shortcuts = platform.shortcuts.borrow();
    assert_eq!(shortcuts.len(), 1);
    let (link, target, description) = &shortcuts[0];
    assert_eq!(*link, sandbox.desktop().join("LVPNGUI.lnk"));
    assert_eq!(*target, sandbox.root().join("lvpngui.exe"));
    assert_eq!(description, "LVPNGUI");
}

#[test]
fn shortcut_without_desktop_is_fatal() {
    let sandbox = Sandbox::new();
    let platform = FakePlatform::new(None);
    let runner = FakeRunner::with_driver();
    let prompter = ScriptedPrompter::new(true);
    let installer = builder(&sandbox, bundle(), &platform, &runner, &prompter)
        .build()
        .unwrap();

    let err = installer.install().unwrap_err();
    assert!(matches!(err, InstallerError::Shortcut { .. }), "{err}");
}

#[test]
fn unreadable_bundled_file_is_fatal_and_names_path() {
    let sandbox = Sandbox::new();
    let platform = FakePlatform::new(None);
    let runner = FakeRunner::with_driver();
    let prompter = ScriptedPrompter::new(false);
    let assets = bundle().with(
        "bin64/index.txt",
        format!("{ABC_SHA1} openvpn.exe\n{EMPTY_SHA1} missing.dll\n"),
    );
    let installer = builder(&sandbox, assets, &platform, &runner, &prompter)
        .build()
        .unwrap();

    let err = installer.install().unwrap_err();
    match err {
        InstallerError::ReadAsset { name, dest, .. } => {
            assert_eq!(name, "bin64/missing.dll");
            assert_eq!(dest, sandbox.root().join("missing.dll"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!installer.is_installed());
}

#[test]
fn malformed_manifest_fails_construction() {
    let sandbox = Sandbox::new();
    let platform = FakePlatform::new(None);
    let runner = FakeRunner::with_driver();
    let prompter = ScriptedPrompter::new(false);
    let assets = bundle().with(
        "bin64/index.txt",
        format!("{ABC_SHA1} openvpn.exe\nnot-a-valid-line\n"),
    );

    let result = builder(&sandbox, assets, &platform, &runner, &prompter).build();
    assert!(matches!(result, Err(InstallerError::Manifest(_))));
}

#[test]
fn nested_manifest_entries_are_written_under_root() {
    let sandbox = Sandbox::new();
    let platform = FakePlatform::new(None);
    let runner = FakeRunner::with_driver();
    let prompter = ScriptedPrompter::new(false);
    let assets = bundle()
        .with("bin64/index.txt", format!("{ABC_SHA1} plugins/auth.dll\n"))
        .with("bin64/plugins/auth.dll", b"abc".to_vec());
    let installer = builder(&sandbox, assets, &platform, &runner, &prompter)
        .build()
        .unwrap();

    installer.install().unwrap();
    assert!(sandbox.root().join("plugins").join("auth.dll").is_file());
    assert!(installer.is_installed());
}

#[test]
fn locked_executable_cancel_then_failed_removal_is_fatal() {
    let sandbox = Sandbox::new();
    let platform = FakePlatform::new(None);
    let runner = FakeRunner::with_driver();
    let prompter = ScriptedPrompter::new(false);
    let installer = builder(&sandbox, bundle(), &platform, &runner, &prompter)
        .build()
        .unwrap();

    // A directory in place of the executable cannot be removed as a file.
    fs::create_dir_all(sandbox.root().join("lvpngui.exe")).unwrap();

    let err = installer.install().unwrap_err();
    assert!(matches!(err, InstallerError::LockedExecutable { .. }), "{err}");
    assert_eq!(*prompter.locked_prompts.borrow(), 1);
}

#[test]
fn locked_executable_retry_succeeds_once_released() {
    let sandbox = Sandbox::new();
    let platform = FakePlatform::new(None);
    let runner = FakeRunner::with_driver();
    let prompter = ScriptedPrompter::new(false).on_locked(|path| {
        // The user closes the running copy before answering.
        fs::remove_dir(path).unwrap();
        RetryDecision::Retry
    });
    let installer = builder(&sandbox, bundle(), &platform, &runner, &prompter)
        .build()
        .unwrap();
    fs::create_dir_all(sandbox.root().join("lvpngui.exe")).unwrap();

    installer.install().unwrap();

    assert_eq!(*prompter.locked_prompts.borrow(), 1);
    assert!(installer.is_installed());
}

#[test]
fn running_from_install_root_skips_self_copy() {
    let sandbox = Sandbox::new();
    let platform = FakePlatform::new(None);
    let runner = FakeRunner::with_driver();
    let prompter = ScriptedPrompter::new(false);
    let first = builder(&sandbox, bundle(), &platform, &runner, &prompter)
        .build()
        .unwrap();
    first.install().unwrap();

    let installed = sandbox.root().join("lvpngui.exe");
    let second = builder(&sandbox, bundle(), &platform, &runner, &prompter)
        .current_exe(&installed)
        .build()
        .unwrap();
    fs::write(sandbox.root().join("openvpn.exe"), b"corrupt").unwrap();

    second.install().unwrap();
    assert_eq!(fs::read(&installed).unwrap(), b"lvpngui v2");
    assert!(second.is_installed());
}

#[test]
fn uninstall_without_root_is_a_noop() {
    let sandbox = Sandbox::new();
    let platform = FakePlatform::new(None);
    let runner = FakeRunner::with_driver();
    let prompter = ScriptedPrompter::new(false);
    let installer = builder(&sandbox, bundle(), &platform, &runner, &prompter)
        .build()
        .unwrap();

    let report = installer.uninstall();
    assert!(report.removed.is_empty());
    assert!(report.is_complete());
    assert!(platform.deferred.borrow().is_empty());
}

#[test]
fn uninstall_removes_installed_tree() {
    let sandbox = Sandbox::new();
    let platform = FakePlatform::new(None);
    let runner = FakeRunner::with_driver();
    let prompter = ScriptedPrompter::new(false);
    let installer = builder(&sandbox, bundle(), &platform, &runner, &prompter)
        .build()
        .unwrap();
    installer.install().unwrap();
    fs::write(installer.lock_file(), b"").unwrap();

    let report = installer.uninstall();

    assert!(!sandbox.root().exists());
    assert!(report.is_complete());
    assert!(report.removed.contains(&installer.installed_exe()));
    assert!(report.removed.contains(&installer.lock_file()));
    assert!(!installer.is_installed());
}

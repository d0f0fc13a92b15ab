//! Logon-time scheduled task management through `schtasks`.

use std::fs;
use std::io;
use std::path::PathBuf;

use log::{debug, info, warn};

use super::InstallerError;
use super::assets::AssetSource;
use super::command::{CommandRunner, CommandSpec, TASK_CREATE_TIMEOUT, TASK_DELETE_TIMEOUT};
use super::platform::UserPrincipal;
use super::prompt::Prompter;

pub const TASK_TOOL: &str = "schtasks";
/// Template name inside the asset bundle.
pub const TEMPLATE_RESOURCE: &str = "schtasks_template.xml";
/// Rendered definition written into the installation root.
pub const RENDERED_FILE: &str = "schtasks.xml";

const BUILTIN_TEMPLATE: &str = include_str!("../../resources/schtasks_template.xml");

/// Everything needed to register the start-on-boot task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTaskSpec {
    pub task_name: String,
    pub executable_path: PathBuf,
    pub user: UserPrincipal,
    pub xml_path: PathBuf,
}

impl ScheduledTaskSpec {
    /// Substitute `%FULLUSERNAME%`, `%EXEPATH%` and `%TASKNAME%` verbatim.
    pub fn render(&self, template: &str) -> String {
        template
            .replace("%FULLUSERNAME%", &self.user.qualified())
            .replace("%EXEPATH%", &self.executable_path.display().to_string())
            .replace("%TASKNAME%", &self.task_name)
    }

    pub fn create_command(&self) -> CommandSpec {
        CommandSpec::new(TASK_TOOL)
            .arg("/Create")
            .arg("/XML")
            .arg(&self.xml_path)
            .args(["/RU", self.user.name.as_str()])
            .args(["/TN", self.task_name.as_str()])
            .arg("/IT")
    }
}

pub fn delete_command(task_name: &str) -> CommandSpec {
    CommandSpec::new(TASK_TOOL).args(["/Delete", "/TN", task_name, "/F"])
}

/// Task template from the bundle, or the built-in one when the bundle has none.
pub fn load_template(assets: &dyn AssetSource) -> Result<String, InstallerError> {
    match assets.read(TEMPLATE_RESOURCE) {
        Ok(raw) => String::from_utf8(raw)
            .map_err(|_| InstallerError::Template(format!("{TEMPLATE_RESOURCE} is not valid UTF-8"))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No bundled {TEMPLATE_RESOURCE}, using built-in template");
            Ok(BUILTIN_TEMPLATE.to_string())
        }
        Err(e) => Err(InstallerError::Template(format!("{TEMPLATE_RESOURCE}: {e}"))),
    }
}

/// Drives `schtasks` for one task.
pub struct TaskScheduler<'a> {
    pub runner: &'a dyn CommandRunner,
    pub prompter: &'a dyn Prompter,
    pub assets: &'a dyn AssetSource,
}

impl TaskScheduler<'_> {
    /// Best-effort removal; a missing task or a slow tool is not a failure.
    pub fn delete(&self, task_name: &str) {
        match self.runner.run(&delete_command(task_name), Some(TASK_DELETE_TIMEOUT)) {
            Ok(out) if out.success() => info!("Removed scheduled task {task_name}"),
            Ok(out) => debug!("schtasks /Delete for {task_name} ended with {:?}", out.code),
            Err(e) => warn!("Could not run schtasks /Delete: {e}"),
        }
    }

    /// Render the definition, write it to disk and register it.
    ///
    /// Returns `Ok(false)` when `schtasks` rejects the task; the tool's
    /// output has already been shown through the prompter.
    pub fn create(&self, spec: &ScheduledTaskSpec) -> Result<bool, InstallerError> {
        let xml = spec.render(&load_template(self.assets)?);
        fs::write(&spec.xml_path, xml).map_err(|source| InstallerError::WriteFile {
            path: spec.xml_path.clone(),
            source,
        })?;

        let out = self
            .runner
            .run(&spec.create_command(), Some(TASK_CREATE_TIMEOUT))?;
        if out.success() {
            info!("Registered scheduled task {}", spec.task_name);
            return Ok(true);
        }

        let code = out
            .code
            .map_or_else(|| "killed".to_string(), |c| c.to_string());
        warn!("schtasks /Create failed for {} ({code})", spec.task_name);
        self.prompter
            .report_error(&format!("schtask error: {code}"), &out.output);
        Ok(false)
    }
}

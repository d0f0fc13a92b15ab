use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::install::InstallerError;

/// File looked up next to the running executable when no config path is given.
pub const PROVIDER_FILE: &str = "provider.toml";

/// Application identity and bundle layout (mirrors the provider defaults).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Organization directory under the per-user application-data area
    pub org_name: String,
    /// Short application name; also the task name prefix
    pub name: String,
    pub display_name: String,
    /// File name of the installed main executable
    pub exe_name: String,
    /// Single-instance lock file kept by the surrounding application
    pub lock_file: String,
    /// Directory holding `bin64/`, `bin32/` and `schtasks_template.xml`.
    /// Relative paths resolve against the running executable's directory.
    pub bundle_dir: PathBuf,
    pub driver: DriverConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            org_name: "LVPNGUI".to_string(),
            name: "lvpngui".to_string(),
            display_name: "LVPNGUI".to_string(),
            exe_name: "lvpngui.exe".to_string(),
            lock_file: "lvpngui.lock".to_string(),
            bundle_dir: PathBuf::from("bundle"),
            driver: DriverConfig::default(),
        }
    }
}

/// Kernel network driver (TAP-Windows) constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Key under HKEY_LOCAL_MACHINE whose default value is the install location
    pub registry_key: String,
    /// Query tool, relative to the install location
    pub query_tool: PathBuf,
    pub device_id: String,
    /// Driver package installer shipped in the manifest
    pub installer: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            registry_key: "SOFTWARE\\TAP-Windows".to_string(),
            query_tool: PathBuf::from("bin").join("tapinstall.exe"),
            device_id: "tap0901".to_string(),
            installer: "tap-windows.exe".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from an explicit file, else `provider.toml` beside `exe_dir`, else defaults.
    pub fn load(explicit: Option<&Path>, exe_dir: Option<&Path>) -> Result<Self, InstallerError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        if let Some(dir) = exe_dir {
            let candidate = dir.join(PROVIDER_FILE);
            if candidate.is_file() {
                return Self::from_file(&candidate);
            }
        }

        log::debug!("No {PROVIDER_FILE} found, using built-in provider defaults");
        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self, InstallerError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            InstallerError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = toml::from_str(&raw).map_err(|e| {
            InstallerError::Config(format!("cannot parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        log::info!("Using provider config from: {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<(), InstallerError> {
        for (field, value) in [
            ("org_name", &self.org_name),
            ("name", &self.name),
            ("exe_name", &self.exe_name),
        ] {
            if value.trim().is_empty() {
                return Err(InstallerError::Config(format!("`{field}` must not be empty")));
            }
        }
        Ok(())
    }

    /// Scheduled task name derived from the application name.
    pub fn task_name(&self) -> String {
        format!("{}StartTask", self.name)
    }

    /// Installation root under `base`, or under the per-user roaming data dir.
    pub fn installation_root(&self, base: Option<&Path>) -> Result<PathBuf, InstallerError> {
        let base = match base {
            Some(dir) => dir.to_path_buf(),
            None => dirs::data_dir().ok_or_else(|| {
                InstallerError::Config("could not determine application data directory".into())
            })?,
        };
        Ok(base.join(&self.org_name).join(&self.name))
    }

    /// Bundle directory, resolved against `exe_dir` when relative.
    pub fn resolve_bundle_dir(&self, exe_dir: Option<&Path>) -> PathBuf {
        match exe_dir {
            Some(dir) if self.bundle_dir.is_relative() => dir.join(&self.bundle_dir),
            _ => self.bundle_dir.clone(),
        }
    }
}

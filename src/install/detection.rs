//! TAP driver presence detection
//!
//! The driver counts as present when:
//! - the vendor's install location is recorded under HKLM, and
//! - the vendor query tool (`tapinstall find <device-id>`) reports at least
//!   one matching device within its time bound.
//!
//! Every failure along the way means "not present"; nothing here is an error.

use log::{debug, info};

use super::arch::Arch;
use super::command::{CommandRunner, CommandSpec, DRIVER_QUERY_TIMEOUT};
use super::platform::{Platform, RegistryView};
use crate::config::DriverConfig;

/// Trailer of the query tool's summary line.
pub const FOUND_SUFFIX: &str = "matching device(s) found.";

/// Check whether the kernel network driver is installed.
pub fn driver_present(
    platform: &dyn Platform,
    runner: &dyn CommandRunner,
    driver: &DriverConfig,
    arch: Arch,
) -> bool {
    let view = if arch.is_64bit() {
        RegistryView::Force64
    } else {
        RegistryView::Native
    };

    let Some(location) = platform.install_location(&driver.registry_key, view) else {
        debug!("Driver registry key {} not found", driver.registry_key);
        return false;
    };

    let tool = location.join(&driver.query_tool);
    let spec = CommandSpec::new(tool).args(["find", driver.device_id.as_str()]);

    let result = match runner.run(&spec, Some(DRIVER_QUERY_TIMEOUT)) {
        Ok(result) => result,
        Err(e) => {
            debug!("Driver query failed: {e}");
            return false;
        }
    };

    let count = parse_device_count(&result.output);
    match count {
        Some(n) => {
            info!("TAP driver found ({n} device(s))");
            true
        }
        None => {
            debug!("Driver query output did not report a device: {:?}", result.output);
            false
        }
    }
}

/// Device count from the last non-empty line of query output, if it is at
/// least one.
pub fn parse_device_count(output: &str) -> Option<u32> {
    let last = output.lines().map(str::trim).filter(|l| !l.is_empty()).last()?;
    if !last.ends_with(FOUND_SUFFIX) {
        return None;
    }

    let n: i64 = last.split_whitespace().next()?.parse().ok()?;
    if n < 1 {
        return None;
    }
    u32::try_from(n).ok()
}

//! Read-only registry lookups.

use std::path::PathBuf;

use log::debug;
use windows::Win32::System::Registry::{
    HKEY, HKEY_LOCAL_MACHINE, KEY_READ, KEY_WOW64_64KEY, REG_EXPAND_SZ, REG_SZ, REG_VALUE_TYPE,
    RegOpenKeyExW, RegQueryValueExW,
};
use windows::core::PCWSTR;

use super::handles::RegistryHandle;
use super::utils::{from_wide, to_wide};
use crate::install::platform::RegistryView;

/// Default (unnamed) string value of `HKLM\<key>`.
pub(super) fn default_value(key: &str, view: RegistryView) -> Option<PathBuf> {
    let key_path = to_wide(key);
    let mut access = KEY_READ;
    if view == RegistryView::Force64 {
        access |= KEY_WOW64_64KEY;
    }

    let mut raw = HKEY::default();
    let status = unsafe {
        RegOpenKeyExW(
            HKEY_LOCAL_MACHINE,
            PCWSTR(key_path.as_ptr()),
            Some(0),
            access,
            &mut raw,
        )
    };
    if status.is_err() {
        debug!("Failed to open key HKLM\\{key}: {}", status.0);
        return None;
    }
    let hkey = RegistryHandle(raw);

    let mut buffer = [0u16; 512];
    let mut size = (buffer.len() * 2) as u32;
    let mut value_type = REG_VALUE_TYPE::default();
    let status = unsafe {
        RegQueryValueExW(
            hkey.handle(),
            PCWSTR::null(),
            None,
            Some(&mut value_type),
            Some(buffer.as_mut_ptr() as *mut u8),
            Some(&mut size),
        )
    };
    if status.is_err() {
        debug!("Failed to get default value of HKLM\\{key}: {}", status.0);
        return None;
    }
    if value_type != REG_SZ && value_type != REG_EXPAND_SZ {
        debug!("HKLM\\{key} default value is not a string");
        return None;
    }

    let len = (size as usize / 2).min(buffer.len());
    let value = from_wide(&buffer[..len]);
    if value.is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

//! Shell link creation and reboot-time deletion.

use std::path::Path;

use windows::Win32::Storage::FileSystem::{MOVEFILE_DELAY_UNTIL_REBOOT, MoveFileExW};
use windows::Win32::System::Com::{
    CLSCTX_INPROC_SERVER, COINIT_APARTMENTTHREADED, CoCreateInstance, CoInitializeEx,
    IPersistFile,
};
use windows::Win32::UI::Shell::{IShellLinkW, ShellLink};
use windows::core::{HSTRING, Interface, PCWSTR};

use super::handles::ComApartment;
use super::utils::to_wide;

/// Save an `IShellLinkW` at `link` targeting `target`.
pub(super) fn create_link(
    link: &Path,
    target: &Path,
    description: &str,
) -> windows::core::Result<()> {
    let _apartment = ComApartment::new(unsafe {
        CoInitializeEx(None, COINIT_APARTMENTTHREADED).is_ok()
    });

    unsafe {
        let shell_link: IShellLinkW = CoCreateInstance(&ShellLink, None, CLSCTX_INPROC_SERVER)?;
        shell_link.SetPath(&HSTRING::from(target.as_os_str()))?;
        shell_link.SetDescription(&HSTRING::from(description))?;

        let file: IPersistFile = shell_link.cast()?;
        file.Save(&HSTRING::from(link.as_os_str()), true)?;
    }
    Ok(())
}

/// `MoveFileExW(path, NULL, MOVEFILE_DELAY_UNTIL_REBOOT)`.
pub(super) fn delete_at_reboot(path: &Path) -> windows::core::Result<()> {
    let wide = to_wide(path.as_os_str());
    unsafe { MoveFileExW(PCWSTR(wide.as_ptr()), PCWSTR::null(), MOVEFILE_DELAY_UNTIL_REBOOT) }
}

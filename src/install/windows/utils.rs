//! UTF-16 conversion for Win32 calls.

use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;

/// Null-terminated wide string.
#[inline]
pub(super) fn to_wide(s: impl AsRef<OsStr>) -> Vec<u16> {
    s.as_ref().encode_wide().chain(std::iter::once(0)).collect()
}

/// Decode a registry string buffer, stopping at the first null.
pub(super) fn from_wide(buf: &[u16]) -> String {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..len])
}

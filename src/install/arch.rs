//! Target architecture of the bundled binaries.

use std::fmt;
use std::str::FromStr;

use super::InstallerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X64,
    X86,
}

impl Arch {
    /// Architecture of the running build.
    pub fn detect() -> Result<Self, InstallerError> {
        std::env::consts::ARCH.parse()
    }

    /// Suffix used by the bundle directories (`bin64`, `bin32`).
    pub fn bits(self) -> &'static str {
        match self {
            Self::X64 => "64",
            Self::X86 => "32",
        }
    }

    /// Bundle directory holding this architecture's manifest and files.
    pub fn resource_dir(self) -> String {
        format!("bin{}", self.bits())
    }

    pub fn is_64bit(self) -> bool {
        self == Self::X64
    }
}

impl FromStr for Arch {
    type Err = InstallerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "64" | "x86_64" | "amd64" | "x64" => Ok(Self::X64),
            "32" | "x86" | "i386" | "i686" => Ok(Self::X86),
            other => Err(InstallerError::UnsupportedArch(other.to_string())),
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.bits())
    }
}

//! Error type shared by every installer operation.

use std::path::PathBuf;

/// Fatal installer failures.
///
/// Soft verification failures (hash mismatch, missing file, missing driver)
/// never surface here; they only turn `is_installed()` false.
#[derive(Debug, thiserror::Error)]
pub enum InstallerError {
    #[error("invalid manifest: {0}")]
    Manifest(String),

    #[error("unsupported architecture: {0}")]
    UnsupportedArch(String),

    #[error("cannot create installation directory {}: {source}", path.display())]
    CreateRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read bundled resource {name} -> {}: {source}", dest.display())]
    ReadAsset {
        name: String,
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write file {}: {source}", path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot delete {} for upgrade: {source}", path.display())]
    LockedExecutable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot copy file {} -> {}: {source}", from.display(), to.display())]
    CopyExecutable {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create link {} -> {}: {reason}", link.display(), target.display())]
    Shortcut {
        link: PathBuf,
        target: PathBuf,
        reason: String,
    },

    #[error("cannot read task template: {0}")]
    Template(String),

    #[error("failed to run {program}: {source}")]
    Command {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("platform error: {0}")]
    Platform(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

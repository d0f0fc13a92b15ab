//! Content hashing and manifest verification.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha1::{Digest, Sha1};

use super::manifest::Index;

const READ_BUF_SIZE: usize = 64 * 1024;

/// Stream a file through SHA-1 and return the lowercase hex digest.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    hash_reader(&mut file)
}

pub fn hash_reader(reader: &mut impl Read) -> io::Result<String> {
    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; READ_BUF_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub fn digests_match(actual: &str, expected: &str) -> bool {
    actual.eq_ignore_ascii_case(expected)
}

/// Why a manifest entry failed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    Unreadable { filename: String, reason: String },
    Digest { filename: String, actual: String },
}

/// Check every manifest entry under `root`, stopping at the first failure.
pub fn verify_files(root: &Path, index: &Index) -> Result<(), Mismatch> {
    for (filename, expected) in index.iter() {
        let path = root.join(filename);
        let actual = hash_file(&path).map_err(|e| Mismatch::Unreadable {
            filename: filename.to_string(),
            reason: e.to_string(),
        })?;
        if !digests_match(&actual, expected) {
            return Err(Mismatch::Digest {
                filename: filename.to_string(),
                actual,
            });
        }
    }
    Ok(())
}

/// True when `running` is readable and byte-identical (by digest) to `installed`.
///
/// An unreadable running binary counts as a mismatch, which keeps an
/// upgrade pending.
pub fn same_binary(running: &Path, installed: &Path) -> bool {
    let Ok(running_hash) = hash_file(running) else {
        log::debug!("cannot hash running binary {}", running.display());
        return false;
    };
    match hash_file(installed) {
        Ok(installed_hash) => running_hash == installed_hash,
        Err(e) => {
            log::debug!("cannot hash installed binary {}: {e}", installed.display());
            false
        }
    }
}

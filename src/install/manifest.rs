//! Manifest of bundled files and their expected SHA-1 digests.
//!
//! One entry per line, `<sha1-hex> <filename>`. Blank lines and lines
//! starting with `#` are skipped; anything else that does not have exactly
//! two tokens fails the whole load.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::path::{Component, Path};

use super::InstallerError;
use super::arch::Arch;
use super::assets::AssetSource;

/// Length of a hex-encoded SHA-1 digest.
const DIGEST_HEX_LEN: usize = 40;

/// One manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub filename: String,
    pub expected_hash: String,
}

/// Filename → lowercase hex digest, ordered by filename.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    entries: BTreeMap<String, String>,
}

impl Index {
    pub fn parse(text: &str) -> Result<Self, InstallerError> {
        let mut entries = BTreeMap::new();

        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let entry = parse_line(line)
                .map_err(|reason| InstallerError::Manifest(format!("line {}: {reason}", lineno + 1)))?;

            match entries.entry(entry.filename) {
                Entry::Vacant(slot) => {
                    slot.insert(entry.expected_hash);
                }
                Entry::Occupied(slot) => {
                    return Err(InstallerError::Manifest(format!(
                        "line {}: duplicate entry for {}",
                        lineno + 1,
                        slot.key()
                    )));
                }
            }
        }

        if entries.is_empty() {
            return Err(InstallerError::Manifest("no entries".to_string()));
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, filename: &str) -> Option<&str> {
        self.entries.get(filename).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(f, h)| (f.as_str(), h.as_str()))
    }
}

/// Read `bin<arch>/index.txt` from the bundle and parse it.
pub fn load_index(assets: &dyn AssetSource, arch: Arch) -> Result<Index, InstallerError> {
    let name = format!("{}/index.txt", arch.resource_dir());
    let raw = assets
        .read(&name)
        .map_err(|e| InstallerError::Manifest(format!("cannot open index file {name}: {e}")))?;
    let text = String::from_utf8(raw)
        .map_err(|_| InstallerError::Manifest(format!("{name} is not valid UTF-8")))?;

    let index = Index::parse(&text)?;
    log::debug!("Loaded {} manifest entries from {name}", index.len());
    Ok(index)
}

fn parse_line(line: &str) -> Result<ManifestEntry, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let [hash, filename] = parts.as_slice() else {
        return Err(format!("expected `<hash> <filename>`, found {} fields", parts.len()));
    };

    if hash.len() != DIGEST_HEX_LEN || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!("`{hash}` is not a SHA-1 hex digest"));
    }
    if !is_plain_relative(filename) {
        return Err(format!("`{filename}` must be a relative path inside the install root"));
    }

    Ok(ManifestEntry {
        filename: (*filename).to_string(),
        expected_hash: hash.to_ascii_lowercase(),
    })
}

fn is_plain_relative(name: &str) -> bool {
    !name.starts_with(['/', '\\'])
        && Path::new(name)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{RawRosterFile, RosterFile};
use crate::errors::Result;

/// File holding the fallback program list, relative to the data directory.
pub const PROGRAMS_LIST_FILE: &str = "list-of-programs";

/// Load a roster file from a given path and return the raw `RawRosterFile`.
///
/// `.yaml` / `.yml` files are parsed as YAML, anything else as TOML. This
/// only performs deserialization; use [`load_and_validate`] for the checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawRosterFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let roster = if is_yaml(path) {
        // An empty YAML document deserializes to `None`.
        serde_yaml::from_str::<Option<RawRosterFile>>(&contents)?.unwrap_or_default()
    } else {
        toml::from_str(&contents)?
    };

    Ok(roster)
}

/// Load a roster file and run validation.
///
/// This is the entry point for the rest of the application:
///
/// - Reads YAML or TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - an empty roster,
///   - zero concurrency / heartbeat,
///   - duplicate device identities,
///   - a roster where no device can be reached.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<RosterFile> {
    let raw = load_from_path(&path)?;
    let roster = RosterFile::try_from(raw)?;
    Ok(roster)
}

/// Load the shared fallback program list from `<data_dir>/list-of-programs`.
///
/// One program per line; blank lines are ignored. A missing file yields an
/// empty list.
pub fn load_programs_list(data_dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = data_dir.as_ref().join(PROGRAMS_LIST_FILE);
    if !path.exists() {
        return Ok(Vec::new());
    }

    let contents = fs::read_to_string(&path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Default roster location: `devices.yaml` inside the data directory.
pub fn default_roster_path(data_dir: impl AsRef<Path>) -> PathBuf {
    data_dir.as_ref().join("devices.yaml")
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{RawRosterFile, RosterFile};
use crate::errors::{FleetError, Result};

impl TryFrom<RawRosterFile> for RosterFile {
    type Error = crate::errors::FleetError;

    fn try_from(raw: RawRosterFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_roster(&raw)?;
        Ok(RosterFile::new_unchecked(
            raw.config,
            raw.devices.unwrap_or_default(),
        ))
    }
}

/// Run all roster checks without consuming the file.
pub fn validate_roster(raw: &RawRosterFile) -> Result<()> {
    validate_raw_roster(raw)
}

fn validate_raw_roster(raw: &RawRosterFile) -> Result<()> {
    ensure_has_devices(raw)?;
    validate_run_section(raw)?;
    validate_unique_identities(raw)?;
    ensure_resolvable_host(raw)?;
    Ok(())
}

fn ensure_has_devices(raw: &RawRosterFile) -> Result<()> {
    if raw.devices.as_ref().is_none_or(|d| d.is_empty()) {
        return Err(FleetError::ConfigError(
            "roster must contain at least one entry under `devices`".to_string(),
        ));
    }
    Ok(())
}

fn validate_run_section(raw: &RawRosterFile) -> Result<()> {
    if raw.config.max_concurrency == 0 {
        return Err(FleetError::ConfigError(
            "config.max_concurrency must be >= 1 (got 0)".to_string(),
        ));
    }

    if raw.config.heartbeat_secs == 0 {
        return Err(FleetError::ConfigError(
            "config.heartbeat_secs must be >= 1 (got 0)".to_string(),
        ));
    }

    if raw.config.remote_root.trim().is_empty() {
        return Err(FleetError::ConfigError(
            "config.remote_root must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_unique_identities(raw: &RawRosterFile) -> Result<()> {
    let mut seen = HashSet::new();
    for (index, device) in raw.devices.iter().flatten().enumerate() {
        let identity = device.identity(index);
        if !seen.insert(identity.clone()) {
            return Err(FleetError::ConfigError(format!(
                "device '{}' appears more than once in the roster",
                identity
            )));
        }
    }
    Ok(())
}

fn ensure_resolvable_host(raw: &RawRosterFile) -> Result<()> {
    let any_address = raw
        .devices
        .iter()
        .flatten()
        .any(|d| d.address().is_some());

    if !any_address {
        return Err(FleetError::ConfigError(
            "no device in the roster has a `host` or `id` to connect to".to_string(),
        ));
    }
    Ok(())
}

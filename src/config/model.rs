// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::engine::EngineOptions;
use crate::types::{EnvValue, Host};

/// Roster file as read from disk, before validation.
///
/// The layout matches the `devices.yaml` files used on the fleet:
///
/// ```yaml
/// config:
///   max_concurrency: 5
///   heartbeat_secs: 10
///
/// devices:
///   - id: pi-01
///     host: 192.168.1.21
///     programs: [camera, uploader]
///     env:
///       CAMERA_ID: 3
///   - id: pi-02
/// ```
///
/// The same structure is accepted as TOML (`[config]` + `[[devices]]`).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawRosterFile {
    /// Run settings from `config`.
    #[serde(default)]
    pub config: RunSection,

    /// Device entries, in roster order. `devices: null` is treated as empty.
    #[serde(default)]
    pub devices: Option<Vec<DeviceConfig>>,
}

/// `config` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RunSection {
    /// Upper bound on hosts processed at the same time.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Seconds without any completion before a heartbeat is emitted.
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,

    /// Directory on each host that program trees are copied into.
    #[serde(default = "default_remote_root")]
    pub remote_root: String,

    /// Store retrieved artifacts under `<dest>/<host id>/` instead of one
    /// shared directory.
    #[serde(default)]
    pub per_host_artifacts: bool,
}

fn default_max_concurrency() -> usize {
    5
}

fn default_heartbeat_secs() -> u64 {
    10
}

fn default_remote_root() -> String {
    "/home/pi/wcl".to_string()
}

impl RunSection {
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            max_concurrency: self.max_concurrency,
            heartbeat_interval: Duration::from_secs(self.heartbeat_secs),
        }
    }
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            heartbeat_secs: default_heartbeat_secs(),
            remote_root: default_remote_root(),
            per_host_artifacts: false,
        }
    }
}

/// One entry of `devices`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DeviceConfig {
    #[serde(default)]
    pub id: Option<String>,

    /// Network address; falls back to `id` when absent.
    #[serde(default)]
    pub host: Option<String>,

    /// Programs for this device. `None` means "use the shared list"; an
    /// explicit empty list means "no programs".
    #[serde(default)]
    pub programs: Option<Vec<String>>,

    /// Values used when writing `.env` files for this device's programs.
    #[serde(default)]
    pub env: BTreeMap<String, EnvValue>,
}

impl DeviceConfig {
    fn non_blank(value: &Option<String>) -> Option<String> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Address this device is reached at: `host`, else `id`.
    pub fn address(&self) -> Option<String> {
        Self::non_blank(&self.host).or_else(|| Self::non_blank(&self.id))
    }

    /// Identity used in reports: `id`, else `host`, else `device[<index>]`.
    pub fn identity(&self, index: usize) -> String {
        Self::non_blank(&self.id)
            .or_else(|| Self::non_blank(&self.host))
            .unwrap_or_else(|| format!("device[{index}]"))
    }

    /// Resolve into a [`Host`], using `shared_programs` when the device has
    /// no list of its own.
    pub fn to_host(&self, index: usize, shared_programs: &[String]) -> Host {
        let programs = self
            .programs
            .clone()
            .unwrap_or_else(|| shared_programs.to_vec())
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        Host {
            id: self.identity(index),
            address: self.address(),
            programs,
            env: self
                .env
                .iter()
                .map(|(k, v)| (k.clone(), v.to_string()))
                .collect(),
        }
    }
}

/// Validated roster file.
///
/// Only constructed through `TryFrom<RawRosterFile>` (see `validate.rs`), so
/// holders can rely on the checked invariants.
#[derive(Debug, Clone)]
pub struct RosterFile {
    pub config: RunSection,
    pub devices: Vec<DeviceConfig>,
}

impl RosterFile {
    pub(crate) fn new_unchecked(config: RunSection, devices: Vec<DeviceConfig>) -> Self {
        Self { config, devices }
    }

    /// All devices resolved into hosts, in roster order.
    pub fn hosts(&self, shared_programs: &[String]) -> Vec<Host> {
        self.devices
            .iter()
            .enumerate()
            .map(|(i, d)| d.to_host(i, shared_programs))
            .collect()
    }
}

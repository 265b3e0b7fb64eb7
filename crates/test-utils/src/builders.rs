#![allow(dead_code)]

use std::collections::BTreeMap;

use fleetrun::config::{DeviceConfig, RawRosterFile, RosterFile, RunSection};
use fleetrun::types::{EnvValue, Host};

/// Builder for `Host` to simplify test setup.
pub struct HostBuilder {
    host: Host,
}

impl HostBuilder {
    /// Host whose address equals its id.
    pub fn new(id: &str) -> Self {
        Self {
            host: Host::new(id, id),
        }
    }

    pub fn address(mut self, address: &str) -> Self {
        self.host.address = Some(address.to_string());
        self
    }

    pub fn no_address(mut self) -> Self {
        self.host.address = None;
        self
    }

    pub fn program(mut self, name: &str) -> Self {
        self.host.programs.push(name.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.host.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> Host {
        self.host
    }
}

/// Builder for `RawRosterFile` / `RosterFile`.
pub struct RosterBuilder {
    roster: RawRosterFile,
}

impl RosterBuilder {
    pub fn new() -> Self {
        Self {
            roster: RawRosterFile {
                config: RunSection::default(),
                devices: Some(Vec::new()),
            },
        }
    }

    pub fn with_device(mut self, device: DeviceConfig) -> Self {
        self.roster.devices.get_or_insert_with(Vec::new).push(device);
        self
    }

    pub fn max_concurrency(mut self, n: usize) -> Self {
        self.roster.config.max_concurrency = n;
        self
    }

    pub fn heartbeat_secs(mut self, secs: u64) -> Self {
        self.roster.config.heartbeat_secs = secs;
        self
    }

    pub fn raw(self) -> RawRosterFile {
        self.roster
    }

    pub fn build(self) -> RosterFile {
        RosterFile::try_from(self.roster).expect("Failed to build valid roster from builder")
    }
}

impl Default for RosterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `DeviceConfig`.
pub struct DeviceBuilder {
    device: DeviceConfig,
}

impl DeviceBuilder {
    pub fn new() -> Self {
        Self {
            device: DeviceConfig {
                id: None,
                host: None,
                programs: None,
                env: BTreeMap::new(),
            },
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.device.id = Some(id.to_string());
        self
    }

    pub fn host(mut self, host: &str) -> Self {
        self.device.host = Some(host.to_string());
        self
    }

    pub fn programs(mut self, programs: &[&str]) -> Self {
        self.device.programs = Some(programs.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn env(mut self, key: &str, value: EnvValue) -> Self {
        self.device.env.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> DeviceConfig {
        self.device
    }
}

impl Default for DeviceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

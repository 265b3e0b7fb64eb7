// src/types.rs

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

/// Canonical host identity type used throughout the engine.
pub type HostId = String;

/// One remote target participating in a run.
///
/// Built from a roster entry (see [`crate::config::RosterFile`]) or directly in
/// tests. `address` is `None` when the roster gave neither a `host` nor an
/// `id`; such hosts are never dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub id: HostId,
    pub address: Option<String>,
    pub programs: Vec<String>,
    pub env: BTreeMap<String, String>,
}

impl Host {
    pub fn new(id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            address: Some(address.into()),
            programs: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    /// A host with no network address.
    pub fn unaddressed(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            address: None,
            programs: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    /// The trimmed address, or `None` if it is absent or blank.
    pub fn resolved_address(&self) -> Option<&str> {
        self.address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }

    /// Identity made safe for use as a single local path component.
    ///
    /// Distinct ids always give distinct stems: bytes outside
    /// `[A-Za-z0-9._-]` (including `%`) are written as `%XX`, and the dots of
    /// an id that is exactly `.` or `..` are escaped too.
    pub fn file_stem(&self) -> String {
        if self.id == "." || self.id == ".." {
            return "%2E".repeat(self.id.len());
        }

        let mut stem = String::with_capacity(self.id.len());
        for byte in self.id.bytes() {
            if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.') {
                stem.push(char::from(byte));
            } else {
                let _ = write!(stem, "%{byte:02X}");
            }
        }
        stem
    }
}

/// Scalar value allowed in a device's `env` table.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum EnvValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvValue::Bool(b) => write!(f, "{b}"),
            EnvValue::Int(i) => write!(f, "{i}"),
            EnvValue::Float(x) => write!(f, "{x}"),
            EnvValue::Str(s) => f.write_str(s),
        }
    }
}

// src/config/mod.rs

//! Roster loading and validation for fleetrun.
//!
//! Responsibilities:
//! - Define the serde-backed data model (`model.rs`).
//! - Load a roster file and the shared program list from disk (`loader.rs`).
//! - Validate basic invariants like reachable hosts (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_roster_path, load_and_validate, load_from_path, load_programs_list};
pub use model::{DeviceConfig, RawRosterFile, RosterFile, RunSection};
pub use validate::validate_roster;

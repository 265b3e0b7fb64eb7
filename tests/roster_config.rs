// tests/roster_config.rs

use std::fs;
use std::path::PathBuf;

use fleetrun::config::{
    load_and_validate, load_from_path, load_programs_list, validate_roster, RosterFile, RunSection,
};
use fleetrun::errors::FleetError;
use fleetrun::types::EnvValue;
use fleetrun_test_utils::builders::{DeviceBuilder, RosterBuilder};
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

fn config_error(result: Result<RosterFile, FleetError>) -> String {
    match result {
        Err(FleetError::ConfigError(msg)) => msg,
        other => panic!("expected a configuration error, got {other:?}"),
    }
}

#[test]
fn yaml_roster_resolves_hosts() -> TestResult {
    let dir = TempDir::new()?;
    let path = write(
        &dir,
        "devices.yaml",
        r#"
config:
  max_concurrency: 2

devices:
  - id: pi-01
    host: 192.168.1.21
    programs: [camera]
    env:
      CAMERA_ID: 3
      DEBUG: true
      NAME: north
  - host: 192.168.1.22
  - id: pi-03
    programs: []
"#,
    );

    let roster = load_and_validate(&path)?;
    assert_eq!(roster.config.max_concurrency, 2);
    assert_eq!(roster.config.heartbeat_secs, 10);
    assert_eq!(roster.config.remote_root, "/home/pi/wcl");

    let shared = vec!["uploader".to_string(), "camera".to_string()];
    let hosts = roster.hosts(&shared);
    assert_eq!(hosts.len(), 3);

    assert_eq!(hosts[0].id, "pi-01");
    assert_eq!(hosts[0].resolved_address(), Some("192.168.1.21"));
    assert_eq!(hosts[0].programs, vec!["camera"]);
    assert_eq!(hosts[0].env["CAMERA_ID"], "3");
    assert_eq!(hosts[0].env["DEBUG"], "true");
    assert_eq!(hosts[0].env["NAME"], "north");

    assert_eq!(hosts[1].id, "192.168.1.22");
    assert_eq!(hosts[1].programs, shared);

    assert_eq!(hosts[2].resolved_address(), Some("pi-03"));
    assert!(hosts[2].programs.is_empty());
    Ok(())
}

#[test]
fn toml_roster_is_accepted() -> TestResult {
    let dir = TempDir::new()?;
    let path = write(
        &dir,
        "devices.toml",
        r#"
[config]
heartbeat_secs = 30
per_host_artifacts = true

[[devices]]
id = "pi-01"

[devices.env]
CAMERA_ID = 7
"#,
    );

    let roster = load_and_validate(&path)?;
    assert_eq!(roster.config.heartbeat_secs, 30);
    assert!(roster.config.per_host_artifacts);
    assert_eq!(roster.config.max_concurrency, RunSection::default().max_concurrency);
    assert_eq!(roster.devices[0].env["CAMERA_ID"], EnvValue::Int(7));
    Ok(())
}

#[test]
fn device_without_id_or_host_has_no_address() -> TestResult {
    let dir = TempDir::new()?;
    let path = write(
        &dir,
        "devices.yml",
        "devices:\n  - id: pi-01\n  - programs: [camera]\n",
    );

    let hosts = load_and_validate(&path)?.hosts(&[]);

    assert_eq!(hosts[1].id, "device[1]");
    assert_eq!(hosts[1].resolved_address(), None);
    Ok(())
}

#[test]
fn empty_yaml_document_is_an_empty_roster() -> TestResult {
    let dir = TempDir::new()?;
    let path = write(&dir, "devices.yaml", "");

    let raw = load_from_path(&path)?;
    assert!(raw.devices.is_none());

    let msg = config_error(load_and_validate(&path));
    assert!(msg.contains("at least one entry"), "{msg}");
    Ok(())
}

#[test]
fn malformed_yaml_is_a_parse_error() -> TestResult {
    let dir = TempDir::new()?;
    let path = write(&dir, "devices.yaml", "devices: [unterminated\n");

    assert!(matches!(
        load_and_validate(&path),
        Err(FleetError::YamlError(_))
    ));
    Ok(())
}

#[test]
fn malformed_toml_is_a_parse_error() -> TestResult {
    let dir = TempDir::new()?;
    let path = write(&dir, "devices.toml", "[[devices]\nid = ");

    assert!(matches!(
        load_and_validate(&path),
        Err(FleetError::TomlError(_))
    ));
    Ok(())
}

#[test]
fn missing_roster_is_an_io_error() {
    let result = load_and_validate("/definitely/not/here/devices.yaml");
    assert!(matches!(result, Err(FleetError::IoError(_))));
}

#[test]
fn zero_concurrency_is_rejected() {
    let raw = RosterBuilder::new()
        .max_concurrency(0)
        .with_device(DeviceBuilder::new().id("pi-01").build())
        .raw();

    let msg = config_error(RosterFile::try_from(raw));
    assert!(msg.contains("max_concurrency"), "{msg}");
}

#[test]
fn zero_heartbeat_is_rejected() {
    let raw = RosterBuilder::new()
        .heartbeat_secs(0)
        .with_device(DeviceBuilder::new().id("pi-01").build())
        .raw();

    assert!(validate_roster(&raw).is_err());
}

#[test]
fn duplicate_identities_are_rejected() {
    let raw = RosterBuilder::new()
        .with_device(DeviceBuilder::new().id("pi-01").host("10.0.0.1").build())
        .with_device(DeviceBuilder::new().id("pi-01").host("10.0.0.2").build())
        .raw();

    let msg = config_error(RosterFile::try_from(raw));
    assert!(msg.contains("'pi-01'"), "{msg}");
}

#[test]
fn roster_with_no_reachable_device_is_rejected() {
    let raw = RosterBuilder::new()
        .with_device(DeviceBuilder::new().programs(&["camera"]).build())
        .raw();

    let msg = config_error(RosterFile::try_from(raw));
    assert!(msg.contains("no device"), "{msg}");
}

#[test]
fn builder_roster_applies_device_programs_over_shared_list() {
    let roster = RosterBuilder::new()
        .with_device(DeviceBuilder::new().id("pi-01").programs(&["camera"]).build())
        .with_device(
            DeviceBuilder::new()
                .id("pi-02")
                .env("CAMERA_ID", EnvValue::Str("2".to_string()))
                .build(),
        )
        .build();

    let hosts = roster.hosts(&["uploader".to_string()]);

    assert_eq!(hosts[0].programs, vec!["camera"]);
    assert_eq!(hosts[1].programs, vec!["uploader"]);
    assert_eq!(hosts[1].env["CAMERA_ID"], "2");
}

#[test]
fn programs_list_skips_blank_lines() -> TestResult {
    let dir = TempDir::new()?;
    write(&dir, "list-of-programs", "camera\n\n  uploader  \n\n");

    assert_eq!(load_programs_list(dir.path())?, vec!["camera", "uploader"]);
    Ok(())
}

#[test]
fn missing_programs_list_is_empty() -> TestResult {
    let dir = TempDir::new()?;
    assert!(load_programs_list(dir.path())?.is_empty());
    Ok(())
}

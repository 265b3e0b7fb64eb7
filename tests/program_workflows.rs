// tests/program_workflows.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use fleetrun::engine::{OutcomeStatus, DONE};
use fleetrun::exec::CommandOutput;
use fleetrun::workflow::env_file::{extract_env_keys, render_env};
use fleetrun::workflow::programs::NO_PROGRAMS;
use fleetrun::workflow::{EnvFileWriter, HostWorkflow, ProgramEnable, ProgramSync};
use fleetrun_test_utils::builders::HostBuilder;
use fleetrun_test_utils::fake_fleet;
use fleetrun_test_utils::fake_transport::Op;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::test]
async fn copy_programs_mirrors_each_program_tree() {
    let (_fs, transport) = fake_fleet();
    let sync = ProgramSync::new(transport.clone(), "/data", "/home/pi/wcl");
    let host = HostBuilder::new("pi-01").program("camera").program("uploader").build();

    let outcome = sync.execute(&host).await;

    assert_eq!(outcome.status, OutcomeStatus::Succeeded);
    assert_eq!(outcome.message, DONE);
    let calls = transport.calls_for("pi-01");
    assert_eq!(calls[0].op, Op::Invoke);
    assert_eq!(calls[0].args, vec!["mkdir", "-p", "/home/pi/wcl"]);
    assert_eq!(calls[1].op, Op::SyncTree);
    assert_eq!(
        calls[1].args,
        vec!["/data/camera", "/home/pi/wcl/", "--exclude=.git"]
    );
    assert_eq!(calls[2].args[0], "/data/uploader");
}

#[tokio::test]
async fn copy_failure_is_counted_per_program() {
    let (_fs, transport) = fake_fleet();
    transport.respond(
        "pi-01",
        Op::SyncTree,
        CommandOutput {
            status: 23,
            stdout: String::new(),
            stderr: "rsync error: some files could not be transferred\n".to_string(),
        },
    );
    let sync = ProgramSync::new(transport.clone(), "/data", "/home/pi/wcl");
    let host = HostBuilder::new("pi-01").program("camera").program("uploader").build();

    let outcome = sync.execute(&host).await;

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.message, "failed to copy 2 of 2 program(s) on pi-01");
    assert!(outcome
        .notable
        .contains(&"failed to copy camera to pi-01".to_string()));
    assert!(outcome
        .notable
        .contains(&"rsync error: some files could not be transferred".to_string()));
}

#[tokio::test]
async fn host_without_programs_is_reported_but_untouched() {
    let (_fs, transport) = fake_fleet();
    let sync = ProgramSync::new(transport.clone(), "/data", "/home/pi/wcl");

    let outcome = sync.execute(&HostBuilder::new("pi-01").build()).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.message, NO_PROGRAMS);
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn enable_runs_setup_with_the_directory_as_an_argument() {
    let (_fs, transport) = fake_fleet();
    let enable = ProgramEnable::new(transport.clone(), "/home/pi/wcl/");
    let host = HostBuilder::new("pi-01").program("camera").build();

    let outcome = enable.execute(&host).await;

    assert!(outcome.is_success());
    let calls = transport.calls_for("pi-01");
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[1].args,
        vec![
            "bash",
            "-c",
            r#"cd "$1" && source setup"#,
            "enable",
            "/home/pi/wcl/camera"
        ]
    );
    assert_eq!(enable.name(), "enable-programs");
}

#[tokio::test]
async fn enable_fails_when_remote_root_cannot_be_created() {
    let (_fs, transport) = fake_fleet();
    transport.fail("pi-01", Op::Invoke);
    let enable = ProgramEnable::new(transport.clone(), "/home/pi/wcl");
    let host = HostBuilder::new("pi-01").program("camera").build();

    let outcome = enable.execute(&host).await;

    assert!(outcome.is_failure());
    assert_eq!(outcome.message, "failed to prepare /home/pi/wcl on pi-01");
    assert_eq!(transport.calls_for("pi-01").len(), 1);
}

#[test]
fn env_keys_come_from_assignment_lines() {
    let template = "# camera settings\nCAMERA_ID=\n\n  EXPOSURE = auto\nnot a pair\n=orphan\n";
    assert_eq!(extract_env_keys(template), vec!["CAMERA_ID", "EXPOSURE"]);
}

#[test]
fn env_rendering_keeps_template_order_and_skips_unknown_keys() {
    let keys = vec!["B".to_string(), "A".to_string(), "C".to_string()];
    let env = BTreeMap::from([
        ("A".to_string(), "1".to_string()),
        ("B".to_string(), "two".to_string()),
    ]);

    assert_eq!(render_env(&keys, &env).as_deref(), Some("B=two\nA=1\n"));
    assert_eq!(render_env(&keys, &BTreeMap::new()), None);
}

fn staging_entries(dir: &TempDir) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir.path())
        .expect("read staging dir")
        .map(|e| e.expect("dir entry").path())
        .collect();
    entries.sort();
    entries
}

#[tokio::test]
async fn env_file_is_staged_pushed_and_cleaned_up() -> TestResult {
    let (fs, transport) = fake_fleet();
    let staging = TempDir::new()?;
    fs.add_file("/data/camera/env/.env.example", "CAMERA_ID=\nSECRET=\n");
    let writer = EnvFileWriter::new(transport.clone(), fs.clone(), "/data", "/home/pi/wcl")
        .with_temp_dir(staging.path());
    let host = HostBuilder::new("pi-01")
        .program("camera")
        .env("CAMERA_ID", "3")
        .build();

    let outcome = writer.execute(&host).await;

    assert!(outcome.is_success(), "{outcome:?}");
    assert_eq!(outcome.message, DONE);
    let calls = transport.calls_for("pi-01");
    assert_eq!(calls[0].args, vec!["mkdir", "-p", "/home/pi/wcl/camera/env"]);
    assert_eq!(calls[1].op, Op::Push);
    assert_eq!(calls[1].args[1], "/home/pi/wcl/camera/env/.env");
    assert_eq!(
        transport.remote_contents("pi-01", "/home/pi/wcl/camera/env/.env"),
        Some(b"CAMERA_ID=3\n".to_vec())
    );
    assert!(staging_entries(&staging).is_empty());
    Ok(())
}

#[tokio::test]
async fn existing_files_in_the_staging_dir_are_left_alone() -> TestResult {
    let (fs, transport) = fake_fleet();
    let staging = TempDir::new()?;
    let planted = staging.path().join("env_pi-01_camera");
    std::fs::write(&planted, "do not touch\n")?;
    fs.add_file("/data/camera/env/.env.example", "CAMERA_ID=\n");
    let writer = EnvFileWriter::new(transport.clone(), fs.clone(), "/data", "/home/pi/wcl")
        .with_temp_dir(staging.path());
    let host = HostBuilder::new("pi-01")
        .program("camera")
        .env("CAMERA_ID", "3")
        .build();

    let outcome = writer.execute(&host).await;

    assert!(outcome.is_success(), "{outcome:?}");
    assert_eq!(std::fs::read_to_string(&planted)?, "do not touch\n");
    assert_eq!(staging_entries(&staging), vec![planted]);
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn symlinks_in_the_staging_dir_are_not_followed() -> TestResult {
    let (fs, transport) = fake_fleet();
    let staging = TempDir::new()?;
    let elsewhere = TempDir::new()?;
    let victim = elsewhere.path().join("victim");
    std::fs::write(&victim, "original\n")?;
    std::os::unix::fs::symlink(&victim, staging.path().join("env_pi-01_camera"))?;
    fs.add_file("/data/camera/env/.env.example", "CAMERA_ID=\n");
    let writer = EnvFileWriter::new(transport.clone(), fs.clone(), "/data", "/home/pi/wcl")
        .with_temp_dir(staging.path());
    let host = HostBuilder::new("pi-01")
        .program("camera")
        .env("CAMERA_ID", "3")
        .build();

    let outcome = writer.execute(&host).await;

    assert!(outcome.is_success(), "{outcome:?}");
    assert_eq!(std::fs::read_to_string(&victim)?, "original\n");
    Ok(())
}

#[tokio::test]
async fn env_programs_without_template_or_values_are_skipped() {
    let (fs, transport) = fake_fleet();
    fs.add_file("/data/uploader/env/.env.example", "BUCKET=\n");
    fs.add_file("/data/empty/env/.env.example", "# nothing here\n");
    let staging = TempDir::new().expect("create staging dir");
    let writer = EnvFileWriter::new(transport.clone(), fs.clone(), "/data", "/home/pi/wcl")
        .with_temp_dir(staging.path());
    let host = HostBuilder::new("pi-01")
        .program("camera")
        .program("uploader")
        .program("empty")
        .build();

    let outcome = writer.execute(&host).await;

    assert!(outcome.is_success());
    assert_eq!(
        outcome.message,
        "wrote 0 env file(s); skipped camera (.env.example not found), \
         uploader (no matching env values), empty (no keys in .env.example)"
    );
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn env_push_failure_fails_the_host() {
    let (fs, transport) = fake_fleet();
    fs.add_file("/data/camera/env/.env.example", "CAMERA_ID=\n");
    transport.fail("pi-01", Op::Push);
    let staging = TempDir::new().expect("create staging dir");
    let writer = EnvFileWriter::new(transport.clone(), fs.clone(), "/data", "/home/pi/wcl")
        .with_temp_dir(staging.path());
    let host = HostBuilder::new("pi-01")
        .program("camera")
        .env("CAMERA_ID", "3")
        .build();

    let outcome = writer.execute(&host).await;

    assert!(outcome.is_failure());
    assert_eq!(outcome.message, "failed to write 1 of 1 env file(s) on pi-01");
    assert_eq!(
        outcome.notable,
        vec!["failed to write /home/pi/wcl/camera/env/.env on pi-01"]
    );
}

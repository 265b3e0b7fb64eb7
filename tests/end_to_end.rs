// tests/end_to_end.rs

use std::sync::Arc;

use fleetrun::engine::{Engine, EngineOptions, OutcomeStatus, DONE};
use fleetrun::report::{render, RunReport};
use fleetrun::workflow::{RemoteExecutor, ScriptWorkflow};
use fleetrun_test_utils::builders::HostBuilder;
use fleetrun_test_utils::fake_fleet;
use fleetrun_test_utils::fake_transport::Op;

#[tokio::test(start_paused = true)]
async fn one_success_one_failure_one_skip() {
    let (fs, transport) = fake_fleet();
    fs.add_file("/data/script.py", "print('hi')\n");
    transport
        .remote_file("A", "/tmp/script_outputs.json", r#"{"files": ["/tmp/out/A.png"]}"#)
        .remote_file("A", "/tmp/out/A.png", "png")
        .fail("B", Op::Invoke);

    let executor = RemoteExecutor::new(
        transport.clone(),
        fs.clone(),
        ScriptWorkflow::new("/data/script.py"),
        "/data/images",
    )
    .with_temp_dir("/scratch");

    let hosts = vec![
        HostBuilder::new("A").build(),
        HostBuilder::new("B").build(),
        HostBuilder::new("C").no_address().build(),
    ];

    let outcomes = Engine::new(EngineOptions::default())
        .run(hosts, Arc::new(executor))
        .await;

    assert_eq!(outcomes.len(), 3);
    let by_host = |id: &str| {
        outcomes
            .iter()
            .find(|o| o.host == id)
            .cloned()
            .unwrap_or_else(|| panic!("no outcome for {id}"))
    };

    let a = by_host("A");
    assert_eq!(a.status, OutcomeStatus::Succeeded);
    assert_eq!(a.message, DONE);

    let b = by_host("B");
    assert_eq!(b.status, OutcomeStatus::Failed);
    assert_eq!(b.message, "failed to execute script on B");

    assert_eq!(by_host("C").status, OutcomeStatus::Skipped);
    assert!(transport.calls_for("C").is_empty());

    assert_eq!(render(&outcomes), "Host B:\nfailed to execute script on B\n\n");
    assert_eq!(fs.contents("/data/images/A.png"), Some(b"png".to_vec()));
    assert_ne!(RunReport::new("run-script", &outcomes).exit_code(), 0);
}

// tests/summary_report.rs

use fleetrun::engine::{Outcome, OutcomeStatus};
use fleetrun::report::{render, RunReport};

#[test]
fn clean_run_renders_nothing() {
    let outcomes = vec![
        Outcome::succeeded("pi-01", Vec::new()),
        Outcome::succeeded("pi-02", Vec::new()),
    ];

    assert_eq!(render(&outcomes), "");
}

#[test]
fn failure_block_lists_message_then_indented_lines() {
    let outcomes = vec![
        Outcome::succeeded("pi-01", Vec::new()),
        Outcome::failed(
            "pi-02",
            "failed to execute script on 10.0.0.2",
            vec!["OSError: disk full".to_string(), "ERROR: aborting".to_string()],
        ),
    ];

    assert_eq!(
        render(&outcomes),
        concat!(
            "Host pi-02:\n",
            "failed to execute script on 10.0.0.2\n",
            "  OSError: disk full\n",
            "  ERROR: aborting\n",
            "\n",
        )
    );
}

#[test]
fn success_with_notable_lines_is_shown() {
    let outcomes = vec![Outcome::succeeded(
        "pi-03",
        vec!["warn: low memory".to_string()],
    )];

    let summary = render(&outcomes);

    assert!(summary.starts_with("Host pi-03:\n"));
    assert!(summary.contains("  warn: low memory\n"));
}

#[test]
fn success_with_custom_message_is_shown_without_lines() {
    let outcomes = vec![Outcome::succeeded_with(
        "pi-04",
        "no programs configured",
        Vec::new(),
    )];

    assert_eq!(render(&outcomes), "Host pi-04:\nno programs configured\n\n");
}

#[test]
fn skipped_hosts_are_left_out_of_the_text() {
    let outcomes = vec![Outcome::skipped("ghost")];

    assert_eq!(render(&outcomes), "");
}

#[test]
fn blocks_are_sorted_by_host() {
    let outcomes = vec![
        Outcome::failed("pi-09", "boom", Vec::new()),
        Outcome::failed("pi-02", "boom", Vec::new()),
        Outcome::failed("pi-05", "boom", Vec::new()),
    ];

    let summary = render(&outcomes);
    let order: Vec<&str> = summary
        .lines()
        .filter(|l| l.starts_with("Host "))
        .collect();

    assert_eq!(order, vec!["Host pi-02:", "Host pi-05:", "Host pi-09:"]);
}

#[test]
fn report_counts_and_exit_code() {
    let outcomes = vec![
        Outcome::succeeded("a", Vec::new()),
        Outcome::failed("b", "failed to execute script on b", Vec::new()),
        Outcome::skipped("c"),
    ];

    let report = RunReport::new("run-script", &outcomes);

    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.skipped(), 1);
    assert!(report.has_failures());
    assert_eq!(report.exit_code(), 1);
    assert_eq!(report.hosts[2].status, OutcomeStatus::Skipped);
}

#[test]
fn skipped_only_run_exits_cleanly() {
    let report = RunReport::new("run-script", &[Outcome::skipped("c")]);
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn json_report_carries_every_host() -> Result<(), Box<dyn std::error::Error>> {
    let outcomes = vec![
        Outcome::failed("b", "failed to copy script to b", vec!["error: refused".to_string()]),
        Outcome::succeeded("a", Vec::new()),
    ];

    let json = RunReport::new("run-script", &outcomes).to_json()?;
    let value: serde_json::Value = serde_json::from_str(&json)?;

    assert_eq!(value["workflow"], "run-script");
    assert_eq!(value["hosts"][0]["host"], "a");
    assert_eq!(value["hosts"][0]["status"], "succeeded");
    assert_eq!(value["hosts"][0]["message"], "done");
    assert_eq!(value["hosts"][1]["success"], false);
    assert_eq!(value["hosts"][1]["notable"][0], "error: refused");
    Ok(())
}

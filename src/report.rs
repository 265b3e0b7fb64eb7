// src/report.rs

//! Final run summary.
//!
//! Hosts finish in whatever order the network allows; everything here sorts
//! by host id first so the same run always renders the same way.

use std::fmt::Write as _;

use serde::Serialize;

use crate::engine::{Outcome, OutcomeStatus, DONE};

/// Whether a host deserves a block in the text summary.
fn is_noteworthy(outcome: &Outcome) -> bool {
    match outcome.status {
        OutcomeStatus::Failed => true,
        OutcomeStatus::Succeeded => outcome.message != DONE,
        // Announced when the run started.
        OutcomeStatus::Skipped => false,
    }
}

fn sorted(outcomes: &[Outcome]) -> Vec<&Outcome> {
    let mut refs: Vec<&Outcome> = outcomes.iter().collect();
    refs.sort_by(|a, b| a.host.cmp(&b.host));
    refs
}

/// Render the human-readable summary.
///
/// One block per noteworthy host:
///
/// ```text
/// Host pi-02:
/// failed to execute script on 10.0.0.2
///   Traceback ... Error: disk full
/// ```
///
/// Clean successes and skipped hosts produce no output, so a fully clean run
/// renders as an empty string.
pub fn render(outcomes: &[Outcome]) -> String {
    let mut out = String::new();
    for outcome in sorted(outcomes).into_iter().filter(|o| is_noteworthy(o)) {
        let _ = writeln!(out, "Host {}:", outcome.host);
        let _ = writeln!(out, "{}", outcome.message);
        for line in &outcome.notable {
            let _ = writeln!(out, "  {line}");
        }
        out.push('\n');
    }
    out
}

/// One row of the structured report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostReport {
    pub host: String,
    pub status: OutcomeStatus,
    pub success: bool,
    pub message: String,
    pub notable: Vec<String>,
}

/// Structured form of a run's outcomes, sorted by host id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub workflow: String,
    pub hosts: Vec<HostReport>,
}

impl RunReport {
    pub fn new(workflow: impl Into<String>, outcomes: &[Outcome]) -> Self {
        let hosts = sorted(outcomes)
            .into_iter()
            .map(|o| HostReport {
                host: o.host.clone(),
                status: o.status,
                success: o.is_success(),
                message: o.message.clone(),
                notable: o.notable.clone(),
            })
            .collect();

        Self {
            workflow: workflow.into(),
            hosts,
        }
    }

    pub fn failed(&self) -> usize {
        self.count(OutcomeStatus::Failed)
    }

    pub fn succeeded(&self) -> usize {
        self.count(OutcomeStatus::Succeeded)
    }

    pub fn skipped(&self) -> usize {
        self.count(OutcomeStatus::Skipped)
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Process exit status for this report: 1 if any host failed, else 0.
    pub fn exit_code(&self) -> i32 {
        if self.has_failures() { 1 } else { 0 }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    fn count(&self, status: OutcomeStatus) -> usize {
        self.hosts.iter().filter(|h| h.status == status).count()
    }
}

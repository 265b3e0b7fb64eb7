pub mod builders;
pub mod fake_transport;

use std::sync::{Arc, Once};

use fleetrun::fs::mock::MockFileSystem;
use fleetrun::logging::{build_filter, LOG_ENV_VAR};
use tracing_subscriber::fmt;

use crate::fake_transport::FakeTransport;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// Honors `FLEETRUN_LOG` the same way the binary does. Output goes through
/// `with_test_writer()`, so it only shows up for failing tests unless run
/// with `-- --nocapture`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let env_value = std::env::var(LOG_ENV_VAR).ok();

        fmt()
            .with_env_filter(build_filter(None, env_value.as_deref()))
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// An in-memory local filesystem and a fake transport writing pulled files
/// into it.
pub fn fake_fleet() -> (Arc<MockFileSystem>, Arc<FakeTransport>) {
    init_tracing();
    let fs = Arc::new(MockFileSystem::new());
    let transport = Arc::new(FakeTransport::new(fs.clone()));
    (fs, transport)
}

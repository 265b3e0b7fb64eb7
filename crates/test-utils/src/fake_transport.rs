use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fleetrun::exec::{CommandOutput, RemoteTransport, TransportFuture};
use fleetrun::fs::FileSystem;

/// Kind of transport call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Push,
    Pull,
    Invoke,
    SyncTree,
}

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub host: String,
    pub op: Op,
    pub args: Vec<String>,
}

#[derive(Default)]
struct FakeState {
    /// Files that exist on each host: (host, remote path) -> contents.
    remote_files: HashMap<(String, String), Vec<u8>>,
    /// Canned response for every call of an op on a host.
    responses: HashMap<(String, Op), CommandOutput>,
    /// Remote paths whose pull fails even if the file exists.
    failing_pulls: HashSet<(String, String)>,
    /// Per-host delay applied to `invoke`.
    invoke_delays: HashMap<String, Duration>,
    calls: Vec<Call>,
}

/// A scripted `RemoteTransport` that:
/// - records every call
/// - keeps an in-memory "remote filesystem" per host; `push` copies into it,
///   `pull` copies from it into the local `FileSystem` and fails for missing
///   files, like `scp`
/// - answers with canned outputs where the test asked for them, success
///   otherwise
/// - tracks how many calls were in flight at once
pub struct FakeTransport {
    fs: Arc<dyn FileSystem>,
    state: Mutex<FakeState>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeTransport {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            state: Mutex::new(FakeState::default()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Make `path` exist on `host` with `contents`.
    pub fn remote_file(&self, host: &str, path: &str, contents: impl Into<Vec<u8>>) -> &Self {
        let mut state = self.state.lock().unwrap();
        state
            .remote_files
            .insert((host.to_string(), path.to_string()), contents.into());
        self
    }

    /// Answer every `op` on `host` with `output`.
    pub fn respond(&self, host: &str, op: Op, output: CommandOutput) -> &Self {
        let mut state = self.state.lock().unwrap();
        state.responses.insert((host.to_string(), op), output);
        self
    }

    /// Make every `op` on `host` exit with status 1 and no output.
    pub fn fail(&self, host: &str, op: Op) -> &Self {
        self.respond(host, op, CommandOutput::with_status(1))
    }

    /// Make pulling `path` from `host` fail.
    pub fn fail_pull(&self, host: &str, path: &str) -> &Self {
        let mut state = self.state.lock().unwrap();
        state
            .failing_pulls
            .insert((host.to_string(), path.to_string()));
        self
    }

    /// Delay every `invoke` on `host` by `delay` (virtual time under a
    /// paused clock).
    pub fn invoke_delay(&self, host: &str, delay: Duration) -> &Self {
        let mut state = self.state.lock().unwrap();
        state.invoke_delays.insert(host.to_string(), delay);
        self
    }

    /// Contents of `path` on `host`, including files pushed during the run.
    pub fn remote_contents(&self, host: &str, path: &str) -> Option<Vec<u8>> {
        let state = self.state.lock().unwrap();
        state
            .remote_files
            .get(&(host.to_string(), path.to_string()))
            .cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_for(&self, host: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.host == host).collect()
    }

    /// Highest number of calls observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn begin(
        &self,
        host: &str,
        op: Op,
        args: Vec<String>,
    ) -> (Option<CommandOutput>, Option<Duration>) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let mut state = self.state.lock().unwrap();
        state.calls.push(Call {
            host: host.to_string(),
            op,
            args,
        });
        let canned = state.responses.get(&(host.to_string(), op)).cloned();
        let delay = match op {
            Op::Invoke => state.invoke_delays.get(host).copied(),
            _ => None,
        };
        (canned, delay)
    }

    fn end(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn do_pull(&self, host: &str, remote_path: &str, local: &Path) -> CommandOutput {
        let contents = {
            let state = self.state.lock().unwrap();
            let key = (host.to_string(), remote_path.to_string());
            if state.failing_pulls.contains(&key) {
                None
            } else {
                state.remote_files.get(&key).cloned()
            }
        };

        match contents {
            Some(bytes) => match self.fs.write(local, &bytes) {
                Ok(()) => CommandOutput::ok(),
                Err(e) => CommandOutput {
                    status: 1,
                    stdout: String::new(),
                    stderr: format!("scp: {}: {e}", local.display()),
                },
            },
            None => CommandOutput {
                status: 1,
                stdout: String::new(),
                stderr: format!("scp: {remote_path}: No such file or directory"),
            },
        }
    }

    /// Copy a local file into the host's remote files. The local side is
    /// looked up in the shared `FileSystem` first, then on disk.
    fn do_push(&self, local: &Path, host: &str, remote_path: &str) -> CommandOutput {
        let contents = match self.fs.read_to_string(local) {
            Ok(text) => Ok(text.into_bytes()),
            Err(_) => std::fs::read(local),
        };

        match contents {
            Ok(bytes) => {
                self.remote_file(host, remote_path, bytes);
                CommandOutput::ok()
            }
            Err(e) => CommandOutput {
                status: 1,
                stdout: String::new(),
                stderr: format!("scp: {}: {e}", local.display()),
            },
        }
    }

    async fn call<F>(
        &self,
        host: &str,
        op: Op,
        args: Vec<String>,
        default: F,
    ) -> anyhow::Result<CommandOutput>
    where
        F: FnOnce() -> CommandOutput,
    {
        let (canned, delay) = self.begin(host, op, args);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let output = canned.unwrap_or_else(default);
        self.end();
        Ok(output)
    }
}

impl RemoteTransport for FakeTransport {
    fn push<'a>(
        &'a self,
        local: &'a Path,
        host: &'a str,
        remote_path: &'a str,
    ) -> TransportFuture<'a> {
        Box::pin(async move {
            let args = vec![local.display().to_string(), remote_path.to_string()];
            self.call(host, Op::Push, args, || self.do_push(local, host, remote_path))
                .await
        })
    }

    fn pull<'a>(
        &'a self,
        host: &'a str,
        remote_path: &'a str,
        local: &'a Path,
    ) -> TransportFuture<'a> {
        Box::pin(async move {
            let args = vec![remote_path.to_string(), local.display().to_string()];
            self.call(host, Op::Pull, args, || self.do_pull(host, remote_path, local))
                .await
        })
    }

    fn invoke<'a>(&'a self, host: &'a str, argv: &'a [String]) -> TransportFuture<'a> {
        Box::pin(async move {
            self.call(host, Op::Invoke, argv.to_vec(), CommandOutput::ok)
                .await
        })
    }

    fn sync_tree<'a>(
        &'a self,
        local_dir: &'a Path,
        host: &'a str,
        remote_dir: &'a str,
        excludes: &'a [String],
    ) -> TransportFuture<'a> {
        Box::pin(async move {
            let mut args = vec![local_dir.display().to_string(), remote_dir.to_string()];
            args.extend(excludes.iter().map(|e| format!("--exclude={e}")));
            self.call(host, Op::SyncTree, args, CommandOutput::ok).await
        })
    }
}

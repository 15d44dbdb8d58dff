//! Lifecycle of one supervised OS process.

use crate::{
    EVENT_CHANNEL_CAPACITY, OutputHandler, OutputStream, ProcessHandle, ProcessRecord,
    ProcessSpec, ProcessStatus, RestartPolicy, SupervisedProcess, SupervisorError,
    SupervisorEvent, SupervisorResult, SupervisorSettings, signal,
};

use std::panic::Location;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use cg_core::poll_until;
use error_location::ErrorLocation;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{broadcast, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Consecutive read failures after which an output reader gives up.
const MAX_CONSECUTIVE_READ_ERRORS: u32 = 10;

/// Slack added to the startup wait so the watchdog always fires first.
const STARTUP_WAIT_MARGIN: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ExitInfo {
    code: Option<i32>,
    success: bool,
}

/// Why the most recent launch never reached `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LaunchFailure {
    TimedOut,
    Exited(Option<i32>),
}

type SharedStdin = Arc<tokio::sync::Mutex<Option<ChildStdin>>>;

/// Handles to the live child, owned by whoever tears it down.
struct RunControl {
    pid: u32,
    stdin: SharedStdin,
    kill_tx: Option<oneshot::Sender<()>>,
    exit_rx: watch::Receiver<Option<ExitInfo>>,
    launched_at: Instant,
}

struct State {
    record: ProcessRecord,
    /// Bumped on every launch and every deliberate teardown. Background tasks
    /// carry the generation they were started for and go quiet once it moves.
    generation: u64,
    run: Option<RunControl>,
    launch_failure: Option<LaunchFailure>,
}

struct Inner {
    spec: ProcessSpec,
    handler: Arc<dyn OutputHandler>,
    settings: SupervisorSettings,
    policy: RestartPolicy,
    state: Mutex<State>,
    status_tx: watch::Sender<ProcessStatus>,
    events: broadcast::Sender<SupervisorEvent>,
}

/// Owns one child process: spawn, output capture, graceful or forced stop,
/// crash handling and the restart policy.
///
/// Cheap to clone; clones share the same process.
#[derive(Clone)]
pub struct ProcessSupervisor {
    inner: Arc<Inner>,
}

impl ProcessSupervisor {
    /// Create a supervisor for `spec`. Nothing is spawned until [`start`](Self::start).
    ///
    /// # Arguments
    /// * `spec` - what to launch
    /// * `handler` - interprets the process output and decides readiness
    /// * `settings` - startup, stop and restart timeouts
    /// * `policy` - what to do after an unexpected exit
    pub fn new(
        spec: ProcessSpec,
        handler: Arc<dyn OutputHandler>,
        settings: SupervisorSettings,
        policy: RestartPolicy,
    ) -> Self {
        let (status_tx, _) = watch::channel(ProcessStatus::Stopped);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let record = ProcessRecord::new(&spec.name);

        Self {
            inner: Arc::new(Inner {
                spec,
                handler,
                settings,
                policy,
                state: Mutex::new(State {
                    record,
                    generation: 0,
                    run: None,
                    launch_failure: None,
                }),
                status_tx,
                events,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.spec.name
    }

    pub fn record(&self) -> ProcessRecord {
        self.inner.state().record.clone()
    }

    pub fn status(&self) -> ProcessStatus {
        self.inner.state().record.status
    }

    pub fn endpoint(&self) -> Option<String> {
        self.inner.state().record.endpoint.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SupervisorEvent> {
        self.inner.events.subscribe()
    }

    pub fn watch_status(&self) -> watch::Receiver<ProcessStatus> {
        self.inner.status_tx.subscribe()
    }

    /// Launch the process and wait until it reports ready.
    ///
    /// `args` replaces the configured arguments for this run only.
    ///
    /// # Errors
    /// * `AlreadyRunning` if a child is starting, running or stopping
    /// * `BinaryNotFound` if the executable cannot be located
    /// * `Timeout` if no readiness signal arrives within the startup timeout
    /// * `StartupFailed` if the process exits before becoming ready
    pub async fn start(&self, args: Option<Vec<String>>) -> SupervisorResult<ProcessHandle> {
        let generation = self.inner.launch(args, true)?;
        let settings = self.inner.settings;
        let wait = settings.startup_timeout + settings.kill_timeout + STARTUP_WAIT_MARGIN;
        let operation = format!("{} startup", self.name());

        let outcome = poll_until(&operation, settings.poll_interval, wait, || {
            let inner = Arc::clone(&self.inner);
            async move { inner.startup_outcome(generation) }
        })
        .await?;

        match &outcome {
            Ok(handle) => info!(
                process = %handle.name,
                pid = handle.pid,
                endpoint = handle.endpoint.as_deref().unwrap_or("-"),
                "Process started"
            ),
            Err(e) => error!(process = %self.name(), "Process failed to start: {e}"),
        }

        outcome
    }

    /// Stop the process. Succeeds immediately if it is already stopped.
    ///
    /// The graceful path writes the configured stop command (or sends SIGTERM)
    /// and waits for the stop grace period. When that expires, or `force` is
    /// set, the process is killed. The record always ends up `Stopped`.
    pub async fn stop(&self, force: bool) -> SupervisorResult<()> {
        let inner = &self.inner;
        let settings = inner.settings;

        loop {
            let run = {
                let mut state = inner.state();
                match state.record.status {
                    ProcessStatus::Stopped => return Ok(()),
                    ProcessStatus::Stopping => None,
                    _ => {
                        state.generation += 1;
                        inner.set_status(&mut state, ProcessStatus::Stopping);
                        Some(state.run.take())
                    }
                }
            };

            let Some(run) = run else {
                // Another teardown is in flight; wait for it to land, then
                // finish the job if it left anything but `Stopped`.
                let operation = format!("{} stop", self.name());
                poll_until(
                    &operation,
                    settings.poll_interval,
                    settings.stop_grace + settings.kill_timeout + STARTUP_WAIT_MARGIN,
                    || {
                        let inner = Arc::clone(inner);
                        async move {
                            (inner.state().record.status != ProcessStatus::Stopping).then_some(())
                        }
                    },
                )
                .await?;
                continue;
            };

            // Runs to completion even if this future is dropped.
            let teardown = tokio::spawn(Arc::clone(inner).teardown(run, force));
            return teardown.await.map_err(|e| {
                error!(process = %self.name(), "Stop task failed: {e}");
                SupervisorError::from(std::io::Error::other(e))
            });
        }
    }

    /// Stop gracefully, pause for the restart delay, then start again.
    pub async fn restart(&self) -> SupervisorResult<ProcessHandle> {
        info!(process = %self.name(), "Restarting process");
        self.stop(false).await?;
        tokio::time::sleep(self.inner.settings.restart_delay).await;
        self.start(None).await
    }

    /// Write one line to the process's stdin.
    ///
    /// # Errors
    /// `NotRunning` unless the process is `Running`.
    pub async fn send_line(&self, text: &str) -> SupervisorResult<()> {
        let stdin = {
            let state = self.inner.state();
            let status = state.record.status;
            match (&state.run, status) {
                (Some(run), ProcessStatus::Running) => Arc::clone(&run.stdin),
                _ => return Err(SupervisorError::not_running(self.name(), status)),
            }
        };

        let mut guard = stdin.lock().await;
        let Some(pipe) = guard.as_mut() else {
            return Err(SupervisorError::not_running(self.name(), ProcessStatus::Running));
        };

        pipe.write_all(format!("{text}\n").as_bytes()).await?;
        pipe.flush().await?;

        debug!(process = %self.name(), "Sent line to stdin: {text}");
        Ok(())
    }
}

#[async_trait]
impl SupervisedProcess for ProcessSupervisor {
    fn name(&self) -> &str {
        ProcessSupervisor::name(self)
    }

    async fn start(&self) -> SupervisorResult<ProcessHandle> {
        ProcessSupervisor::start(self, None).await
    }

    async fn stop(&self, force: bool) -> SupervisorResult<()> {
        ProcessSupervisor::stop(self, force).await
    }

    async fn restart(&self) -> SupervisorResult<ProcessHandle> {
        ProcessSupervisor::restart(self).await
    }

    fn record(&self) -> ProcessRecord {
        ProcessSupervisor::record(self)
    }
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn name(&self) -> &str {
        &self.spec.name
    }

    fn emit(&self, event: SupervisorEvent) {
        let _ = self.events.send(event);
    }

    /// The only place `record.status` changes. Leaving `Running` always
    /// clears the endpoint.
    fn set_status(&self, state: &mut State, to: ProcessStatus) {
        let from = state.record.status;
        if from == to {
            return;
        }

        state.record.status = to;
        if to != ProcessStatus::Running {
            state.record.endpoint = None;
        }

        self.status_tx.send_replace(to);
        debug!(process = %self.name(), %from, %to, "Process status changed");
        self.emit(SupervisorEvent::StatusChanged {
            name: self.name().to_string(),
            from,
            to,
        });
    }

    /// Spawn the child and its reader, monitor and watchdog tasks.
    ///
    /// Synchronous so the restart task can call it without recursing through
    /// an async fn. Returns the generation of the new run.
    fn launch(self: &Arc<Self>, args: Option<Vec<String>>, manual: bool) -> SupervisorResult<u64> {
        let program = self
            .spec
            .resolve_program()
            .ok_or_else(|| SupervisorError::binary_not_found(self.spec.program.clone()))?;

        let mut state = self.state();
        let status = state.record.status;
        if status.is_active() {
            return Err(SupervisorError::already_running(self.name(), status));
        }

        self.handler.reset();

        let mut cmd = Command::new(&program);
        cmd.args(args.as_deref().unwrap_or(&self.spec.args))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.spec.working_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.spec.env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|source| SupervisorError::Spawn {
            name: self.name().to_string(),
            source,
            location: ErrorLocation::from(Location::caller()),
        })?;

        let pid = child.id().unwrap_or_default();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdin: SharedStdin = Arc::new(tokio::sync::Mutex::new(child.stdin.take()));
        let (kill_tx, kill_rx) = oneshot::channel();
        let (exit_tx, exit_rx) = watch::channel(None);

        state.generation += 1;
        let generation = state.generation;
        state.launch_failure = None;
        state.record.pid = Some(pid);
        state.record.started_at = Some(cg_core::now());
        state.record.last_exit_code = None;
        if manual {
            state.record.restart_attempts = 0;
        }
        state.run = Some(RunControl {
            pid,
            stdin,
            kill_tx: Some(kill_tx),
            exit_rx,
            launched_at: Instant::now(),
        });

        info!(
            process = %self.name(),
            pid,
            program = %program.display(),
            "Spawned process"
        );

        self.set_status(&mut state, ProcessStatus::Starting);
        let signals_readiness = self.handler.signals_readiness();
        if !signals_readiness {
            self.set_status(&mut state, ProcessStatus::Running);
            self.emit(SupervisorEvent::Ready {
                name: self.name().to_string(),
                pid,
            });
        }
        drop(state);

        if let Some(stdout) = stdout {
            tokio::spawn(Arc::clone(self).read_output(stdout, OutputStream::Stdout, generation));
        }
        if let Some(stderr) = stderr {
            tokio::spawn(Arc::clone(self).read_output(stderr, OutputStream::Stderr, generation));
        }
        tokio::spawn(Arc::clone(self).monitor(child, kill_rx, exit_tx, generation));
        if signals_readiness {
            tokio::spawn(Arc::clone(self).startup_watchdog(generation, manual));
        }

        Ok(generation)
    }

    /// `None` while the launch of `generation` is still in progress.
    fn startup_outcome(&self, generation: u64) -> Option<SupervisorResult<ProcessHandle>> {
        let state = self.state();
        let current = state.generation == generation;

        match state.record.status {
            ProcessStatus::Starting if current => None,
            // Someone is tearing the launch down; wait for the final status.
            ProcessStatus::Stopping => None,
            ProcessStatus::Running if current => Some(Ok(ProcessHandle {
                name: self.name().to_string(),
                pid: state.record.pid.unwrap_or_default(),
                started_at: state.record.started_at.unwrap_or_else(cg_core::now),
                endpoint: state.record.endpoint.clone(),
            })),
            _ => Some(Err(match state.launch_failure {
                Some(LaunchFailure::TimedOut) => SupervisorError::Timeout {
                    operation: format!("{} startup", self.name()),
                    timeout_ms: u64::try_from(self.settings.startup_timeout.as_millis())
                        .unwrap_or(u64::MAX),
                    location: ErrorLocation::from(Location::caller()),
                },
                Some(LaunchFailure::Exited(Some(code))) => SupervisorError::startup_failed(
                    self.name(),
                    format!("exited with code {code} before becoming ready"),
                ),
                Some(LaunchFailure::Exited(None)) => SupervisorError::startup_failed(
                    self.name(),
                    "terminated by a signal before becoming ready",
                ),
                None => SupervisorError::startup_failed(
                    self.name(),
                    "stopped before becoming ready",
                ),
            })),
        }
    }

    async fn read_output<R>(self: Arc<Self>, reader: R, stream: OutputStream, generation: u64)
    where
        R: AsyncRead + Unpin,
    {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        let mut consecutive_errors = 0;

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    consecutive_errors = 0;
                    let text = String::from_utf8_lossy(&buf);
                    let line = text.trim_end_matches(['\r', '\n']);
                    self.on_line(line, stream, generation);
                }
                Err(e) => {
                    consecutive_errors += 1;
                    warn!(process = %self.name(), stream = stream.as_str(), "Failed to read output: {e}");
                    self.emit(SupervisorEvent::OutputError {
                        name: self.name().to_string(),
                        stream,
                        message: e.to_string(),
                    });
                    if consecutive_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                        error!(process = %self.name(), stream = stream.as_str(), "Giving up on output stream");
                        break;
                    }
                }
            }
        }
    }

    fn on_line(&self, line: &str, stream: OutputStream, generation: u64) {
        debug!(
            target: "cg_process::output",
            process = %self.name(),
            stream = stream.as_str(),
            "{line}"
        );

        let signal = self.handler.handle_line(line, stream);
        if !signal.ready && signal.endpoint.is_none() {
            return;
        }

        let mut state = self.state();
        if state.generation != generation {
            return;
        }

        if signal.ready && state.record.status == ProcessStatus::Starting {
            self.set_status(&mut state, ProcessStatus::Running);
            self.emit(SupervisorEvent::Ready {
                name: self.name().to_string(),
                pid: state.record.pid.unwrap_or_default(),
            });
        }

        if let Some(endpoint) = signal.endpoint
            && state.record.status == ProcessStatus::Running
            && state.record.endpoint.as_deref() != Some(endpoint.as_str())
        {
            state.record.endpoint = Some(endpoint.clone());
            self.emit(SupervisorEvent::EndpointDiscovered {
                name: self.name().to_string(),
                endpoint,
            });
        }
    }

    async fn monitor(
        self: Arc<Self>,
        mut child: Child,
        mut kill_rx: oneshot::Receiver<()>,
        exit_tx: watch::Sender<Option<ExitInfo>>,
        generation: u64,
    ) {
        let waited = tokio::select! {
            result = child.wait() => result,
            Ok(()) = &mut kill_rx => {
                if let Err(e) = child.start_kill() {
                    warn!(process = %self.name(), "Failed to kill process: {e}");
                }
                child.wait().await
            }
        };

        let exit = match waited {
            Ok(status) => ExitInfo {
                code: status.code(),
                success: status.success(),
            },
            Err(e) => {
                warn!(process = %self.name(), "Failed to wait for process: {e}");
                ExitInfo {
                    code: None,
                    success: false,
                }
            }
        };

        let _ = exit_tx.send(Some(exit));
        self.on_exit(exit, generation);
    }

    /// Handle an exit nobody asked for.
    fn on_exit(self: &Arc<Self>, exit: ExitInfo, generation: u64) {
        let mut state = self.state();
        if state.generation != generation || state.record.status == ProcessStatus::Stopping {
            return;
        }

        let was_starting = state.record.status == ProcessStatus::Starting;
        let uptime = state
            .run
            .take()
            .map(|run| run.launched_at.elapsed())
            .unwrap_or_default();
        state.record.pid = None;
        state.record.last_exit_code = exit.code;
        self.handler.on_exit(exit.code);

        self.emit(SupervisorEvent::Exited {
            name: self.name().to_string(),
            code: exit.code,
            expected: false,
        });

        if exit.success && !was_starting {
            info!(process = %self.name(), "Process exited cleanly");
            state.record.restart_attempts = 0;
            self.set_status(&mut state, ProcessStatus::Stopped);
            return;
        }

        if was_starting {
            state.launch_failure = Some(LaunchFailure::Exited(exit.code));
        }

        error!(
            process = %self.name(),
            code = ?exit.code,
            uptime_secs = uptime.as_secs(),
            "Process exited unexpectedly"
        );
        self.emit(SupervisorEvent::Crashed {
            name: self.name().to_string(),
            code: exit.code,
        });

        let attempts = self
            .policy
            .attempts_after_run(state.record.restart_attempts, uptime);
        self.after_failed_run(&mut state, attempts, generation);
    }

    /// Count a failed run against the restart budget, then either schedule
    /// the next launch or give up. The record is left in `Error` either way.
    fn after_failed_run(self: &Arc<Self>, state: &mut State, attempts: u32, generation: u64) {
        let policy = self.policy;
        state.record.restart_attempts = attempts;

        if !policy.enabled {
            self.set_status(state, ProcessStatus::Error);
            return;
        }

        if !policy.allows(attempts) {
            error!(
                process = %self.name(),
                attempts,
                "Restart attempts exhausted, manual start required"
            );
            self.emit(SupervisorEvent::RestartExhausted {
                name: self.name().to_string(),
                attempts,
            });
            self.set_status(state, ProcessStatus::Error);
            return;
        }

        let attempt = attempts + 1;
        state.record.restart_attempts = attempt;
        warn!(
            process = %self.name(),
            "Restarting in {}ms (attempt {attempt}/{})",
            policy.backoff.as_millis(),
            policy.max_attempts
        );
        self.emit(SupervisorEvent::Restarting {
            name: self.name().to_string(),
            attempt,
            max_attempts: policy.max_attempts,
        });
        self.set_status(state, ProcessStatus::Error);

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(policy.backoff).await;

            {
                let state = inner.state();
                if state.generation != generation || state.record.status != ProcessStatus::Error {
                    debug!(process = %inner.name(), "Pending restart superseded");
                    return;
                }
            }

            if let Err(e) = inner.launch(None, false) {
                error!(process = %inner.name(), "Automatic restart failed: {e}");
            }
        });
    }

    /// Kill a launch that never became ready. An automatic relaunch that
    /// hangs counts against the restart budget like a crash.
    async fn startup_watchdog(self: Arc<Self>, generation: u64, manual: bool) {
        tokio::time::sleep(self.settings.startup_timeout).await;

        let run = {
            let mut state = self.state();
            if state.generation != generation || state.record.status != ProcessStatus::Starting {
                return;
            }

            warn!(
                process = %self.name(),
                "Process not ready after {}s, terminating",
                self.settings.startup_timeout.as_secs()
            );
            state.generation += 1;
            state.launch_failure = Some(LaunchFailure::TimedOut);
            self.set_status(&mut state, ProcessStatus::Stopping);
            state.run.take()
        };

        let mut code = None;
        if let Some(mut run) = run {
            if let Some(kill_tx) = run.kill_tx.take() {
                let _ = kill_tx.send(());
            }
            code = wait_for_exit(&mut run.exit_rx, self.settings.kill_timeout)
                .await
                .and_then(|exit| exit.code);
        }

        let mut state = self.state();
        state.record.pid = None;
        state.record.last_exit_code = code;
        self.handler.on_exit(code);

        if manual {
            self.set_status(&mut state, ProcessStatus::Error);
        } else {
            let attempts = state.record.restart_attempts;
            let generation = state.generation;
            self.after_failed_run(&mut state, attempts, generation);
        }
    }

    /// Stop the child behind `run` and settle the record on `Stopped`.
    async fn teardown(self: Arc<Self>, run: Option<RunControl>, force: bool) {
        let settings = self.settings;
        let mut exit = None;

        if let Some(mut run) = run {
            info!(process = %self.name(), pid = run.pid, force, "Stopping process");

            if !force && self.request_graceful_stop(&run).await {
                exit = wait_for_exit(&mut run.exit_rx, settings.stop_grace).await;
                if exit.is_none() {
                    warn!(
                        process = %self.name(),
                        "Process did not exit within {}s, killing",
                        settings.stop_grace.as_secs()
                    );
                }
            }

            if exit.is_none() {
                if let Some(kill_tx) = run.kill_tx.take() {
                    let _ = kill_tx.send(());
                }
                exit = wait_for_exit(&mut run.exit_rx, settings.kill_timeout).await;
                if exit.is_none() {
                    error!(process = %self.name(), pid = run.pid, "Process did not exit after kill");
                }
            }
        }

        let code = exit.and_then(|e| e.code);
        {
            let mut state = self.state();
            state.record.pid = None;
            state.record.started_at = None;
            state.record.restart_attempts = 0;
            state.record.last_exit_code = code;
            self.set_status(&mut state, ProcessStatus::Stopped);
        }
        self.handler.on_exit(code);
        self.emit(SupervisorEvent::Exited {
            name: self.name().to_string(),
            code,
            expected: true,
        });

        info!(process = %self.name(), "Process stopped");
    }

    /// Ask the process to exit on its own. Returns whether a request was made.
    async fn request_graceful_stop(&self, run: &RunControl) -> bool {
        if let Some(command) = &self.spec.stop_command {
            let mut guard = run.stdin.lock().await;
            if let Some(pipe) = guard.as_mut() {
                let written = async {
                    pipe.write_all(format!("{command}\n").as_bytes()).await?;
                    pipe.flush().await
                }
                .await;

                match written {
                    Ok(()) => {
                        info!(process = %self.name(), "Sent stop command '{command}'");
                        return true;
                    }
                    Err(e) => {
                        warn!(process = %self.name(), "Failed to write stop command: {e}");
                    }
                }
            }
        }

        signal::terminate(run.pid)
    }
}

async fn wait_for_exit(
    exit_rx: &mut watch::Receiver<Option<ExitInfo>>,
    timeout: Duration,
) -> Option<ExitInfo> {
    match tokio::time::timeout(timeout, exit_rx.wait_for(Option::is_some)).await {
        Ok(Ok(exit)) => *exit,
        _ => None,
    }
}

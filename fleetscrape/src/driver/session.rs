//! Device session driver.
//!
//! One session per device carries the device's whole command batch. The
//! driver starts the transport client, feeds it the composed script, and
//! captures everything the client prints into one transcript:
//!
//! - **Single-write** dialects get the whole script in one write, then stdin
//!   is closed. Both ends process input line by line, so command order holds.
//! - **Paced** dialects are fed one input line at a time. After each write
//!   the driver waits for the prompt to come back, bounded by the dialect's
//!   settle interval for that step.
//!
//! The whole session runs under one wall-clock timeout. On expiry the client
//! is killed and the device is reported as timed out; nothing is salvaged.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use log::{debug, trace, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, ChildStdin};
use tokio::sync::mpsc;

use super::registry::SessionRegistry;
use super::result::{DeviceResult, ExecutionResult};
use crate::channel::{PromptPatterns, TranscriptBuffer, escape};
use crate::command::{CommandBatch, ComposedScript, compose};
use crate::device::DeviceProfile;
use crate::dialect::{DialectDefinition, DialectRegistry, SessionMode};
use crate::error::{CommandError, NoOutputReason, SessionError, TransportError};
use crate::pool::{CommandFailurePolicy, RunSettings, TranscriptCapture};
use crate::transcript::{self, NoiseFilter, RawTranscript, SegmentStatus};
use crate::transport::{Credentials, SessionTarget, Transport};

/// How long a killed client gets to be reaped.
const KILL_GRACE: Duration = Duration::from_secs(5);

/// Client diagnostics that explain a failed connection.
const CLIENT_DIAGNOSTICS: &[&str] = &[
    "Connection refused",
    "Connection timed out",
    "Operation timed out",
    "No route to host",
    "Network is unreachable",
    "Could not resolve hostname",
    "Permission denied",
    "Host key verification failed",
    "Connection closed by",
    "Connection reset by",
];

/// Runs device sessions for one run.
pub struct DeviceSessionDriver<T: Transport> {
    transport: Arc<T>,
    credentials: Arc<Credentials>,
    dialects: Arc<DialectRegistry>,
    settings: Arc<RunSettings>,
    registry: SessionRegistry,
}

impl<T: Transport> Clone for DeviceSessionDriver<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            credentials: Arc::clone(&self.credentials),
            dialects: Arc::clone(&self.dialects),
            settings: Arc::clone(&self.settings),
            registry: self.registry.clone(),
        }
    }
}

impl<T: Transport> DeviceSessionDriver<T> {
    /// Create a driver with built-in dialects and default settings.
    pub fn new(transport: Arc<T>, credentials: Arc<Credentials>) -> Self {
        Self {
            transport,
            credentials,
            dialects: Arc::new(DialectRegistry::builtin()),
            settings: Arc::new(RunSettings::default()),
            registry: SessionRegistry::new(),
        }
    }

    /// Use a specific dialect registry.
    pub fn with_dialects(mut self, dialects: Arc<DialectRegistry>) -> Self {
        self.dialects = dialects;
        self
    }

    /// Use specific run settings.
    pub fn with_settings(mut self, settings: Arc<RunSettings>) -> Self {
        self.settings = settings;
        self
    }

    /// Record sessions in `registry`.
    pub fn with_registry(mut self, registry: SessionRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// The registry sessions are recorded in.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Run `batch` on `device` in a single session.
    ///
    /// Never fails: session problems are reported inside the result, and the
    /// result always has one slot per command.
    pub async fn run(&self, device: &DeviceProfile, batch: &CommandBatch) -> DeviceResult {
        let started = Instant::now();
        let dialect = self.dialects.get(device.family);

        match self.run_session(device, batch, dialect).await {
            Ok(results) => DeviceResult::completed(device.clone(), results, started.elapsed()),
            Err(error) => {
                warn!("{}: {}", device.hostname, error);
                DeviceResult::failed(device.clone(), batch, &error, started.elapsed())
            }
        }
    }

    async fn run_session(
        &self,
        device: &DeviceProfile,
        batch: &CommandBatch,
        dialect: &DialectDefinition,
    ) -> Result<Vec<ExecutionResult>, SessionError> {
        let settings = &self.settings;
        let policy = settings.on_command_failure;
        let mode = match policy {
            CommandFailurePolicy::AbortRemaining => SessionMode::Paced,
            CommandFailurePolicy::Continue => dialect.session_mode,
        };
        let script = compose(batch, dialect);
        let port = device.port_or(self.credentials.port);

        let target = SessionTarget {
            hostname: &device.hostname,
            address: &device.address,
            port,
            credentials: &self.credentials,
            force_pty: dialect.force_pty,
        };

        let _lease = self.registry.open(&device.hostname);
        debug!(
            "{}: opening {} session on port {} ({:?}, {} commands)",
            device.hostname,
            dialect.name,
            port,
            mode,
            script.len()
        );

        let command = self.transport.command(&target)?;
        let mut session = Session::start(command, settings.search_depth)?;

        let delivered = tokio::time::timeout(
            settings.session_timeout,
            session.deliver(&script, dialect, mode, policy),
        )
        .await;

        let delivery = match delivered {
            Ok(Ok(delivery)) => delivery,
            Ok(Err(error)) => {
                let transcript = session.into_transcript();
                let error = match error {
                    Failure::Closed(status) => SessionError::Connection {
                        host: device.address.clone(),
                        port,
                        reason: connection_reason(transcript.as_bytes(), status),
                    },
                    Failure::Transport(error) => SessionError::Transport(error),
                };
                self.capture(device, &transcript, true).await;
                return Err(error);
            }
            Err(_) => {
                session.kill().await;
                let transcript = session.into_transcript();
                self.capture(device, &transcript, true).await;
                return Err(SessionError::Timeout {
                    host: device.hostname.clone(),
                    timeout: settings.session_timeout,
                });
            }
        };

        let transcript = session.into_transcript();
        let markers = script.markers();
        let matched = transcript.matched_markers(&markers);

        if !delivery.status.success() {
            if matched == 0 {
                let reason = connection_reason(transcript.as_bytes(), delivery.status);
                self.capture(device, &transcript, true).await;
                return Err(SessionError::Connection {
                    host: device.address.clone(),
                    port,
                    reason,
                });
            }
            warn!(
                "{}: client exited with {} after {} of {} markers, keeping output",
                device.hostname,
                delivery.status,
                matched,
                markers.len()
            );
        }

        debug!(
            "{}: session closed, {} bytes captured, {}/{} markers matched",
            device.hostname,
            transcript.len(),
            matched,
            markers.len()
        );
        self.capture(device, &transcript, false).await;

        Ok(attribute(transcript, &script, dialect, &delivery))
    }

    /// Write the transcript to the side channel if the policy asks for it.
    async fn capture(&self, device: &DeviceProfile, transcript: &RawTranscript, failed: bool) {
        let wanted = match self.settings.transcript_capture {
            TranscriptCapture::Never => false,
            TranscriptCapture::OnFailure => failed,
            TranscriptCapture::Always => true,
        };
        if !wanted {
            return;
        }

        match transcript
            .dump(&self.settings.transcript_dir, &device.hostname)
            .await
        {
            Ok(path) => debug!("{}: transcript written to {}", device.hostname, path.display()),
            Err(e) => warn!("{}: failed to write transcript: {}", device.hostname, e),
        }
    }
}

/// Turn a finished transcript into one result per command.
fn attribute(
    transcript: RawTranscript,
    script: &ComposedScript,
    dialect: &DialectDefinition,
    delivery: &Delivery,
) -> Vec<ExecutionResult> {
    let filter = NoiseFilter::new(dialect);
    let segments = transcript.demultiplex(&script.markers());

    script
        .steps
        .iter()
        .zip(segments)
        .map(|(step, segment)| {
            let command = step.command.as_str();
            let elapsed = delivery.elapsed_for(step.marker.index);

            if delivery.skipped(step.marker.index) {
                return ExecutionResult::with_error(command, "", elapsed, CommandError::Skipped);
            }

            match segment.status {
                SegmentStatus::Missing => ExecutionResult::with_error(
                    command,
                    "",
                    elapsed,
                    CommandError::NoOutputCaptured {
                        reason: NoOutputReason::MarkersMissing,
                    },
                ),
                SegmentStatus::Truncated => {
                    let output = filter.clean(&segment.text, Some(command));
                    ExecutionResult::with_error(command, output, elapsed, CommandError::Truncated)
                }
                SegmentStatus::Complete => {
                    let output = filter.clean(&segment.text, Some(command));
                    if output.is_empty() {
                        return ExecutionResult::with_error(
                            command,
                            output,
                            elapsed,
                            CommandError::NoOutputCaptured {
                                reason: NoOutputReason::EmptySegment,
                            },
                        );
                    }
                    match dialect.detect_failure(&output) {
                        Some(pattern) => {
                            let error = CommandError::Failed {
                                pattern: pattern.to_string(),
                            };
                            ExecutionResult::with_error(command, output, elapsed, error)
                        }
                        None => ExecutionResult::new(command, output, elapsed),
                    }
                }
            }
        })
        .collect()
}

/// Why delivery stopped before the session finished normally.
#[derive(Debug)]
enum Failure {
    /// The client went away before the device answered.
    Closed(ExitStatus),
    /// Local process or pipe error.
    Transport(TransportError),
}

impl From<TransportError> for Failure {
    fn from(error: TransportError) -> Self {
        Failure::Transport(error)
    }
}

/// What happened while the script was delivered.
#[derive(Debug)]
struct Delivery {
    status: ExitStatus,
    elapsed: Vec<Duration>,
    aborted_at: Option<usize>,
}

impl Delivery {
    fn elapsed_for(&self, index: usize) -> Duration {
        self.elapsed.get(index).copied().unwrap_or_default()
    }

    fn skipped(&self, index: usize) -> bool {
        self.aborted_at.is_some_and(|at| index >= at)
    }
}

/// Outcome of waiting for a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wait {
    Prompt,
    Settled,
    Closed,
}

/// A running client process and its captured output.
struct Session {
    child: Child,
    stdin: Option<ChildStdin>,
    output: mpsc::UnboundedReceiver<Bytes>,
    buffer: TranscriptBuffer,
    closed: bool,
}

impl Session {
    /// Spawn the client with piped standard streams.
    fn start(
        mut command: tokio::process::Command,
        search_depth: usize,
    ) -> Result<Self, TransportError> {
        let program = command
            .as_std()
            .get_program()
            .to_string_lossy()
            .into_owned();

        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|source| TransportError::Spawn { program, source })?;

        let stdin = child.stdin.take().ok_or(TransportError::MissingPipe("stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or(TransportError::MissingPipe("stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or(TransportError::MissingPipe("stderr"))?;

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(pump(stdout, tx.clone()));
        tokio::spawn(pump(stderr, tx));

        Ok(Self {
            child,
            stdin: Some(stdin),
            output: rx,
            buffer: TranscriptBuffer::new(search_depth),
            closed: false,
        })
    }

    async fn deliver(
        &mut self,
        script: &ComposedScript,
        dialect: &DialectDefinition,
        mode: SessionMode,
        policy: CommandFailurePolicy,
    ) -> Result<Delivery, Failure> {
        match mode {
            SessionMode::SingleWrite => self.deliver_single_write(script).await,
            SessionMode::Paced => self.deliver_paced(script, dialect, policy).await,
        }
    }

    async fn deliver_single_write(&mut self, script: &ComposedScript) -> Result<Delivery, Failure> {
        let started = Instant::now();
        self.send(&script.render()).await?;
        self.stdin = None;

        let status = self.finish().await?;
        let per_command = started.elapsed() / script.len().max(1) as u32;

        Ok(Delivery {
            status,
            elapsed: vec![per_command; script.len()],
            aborted_at: None,
        })
    }

    async fn deliver_paced(
        &mut self,
        script: &ComposedScript,
        dialect: &DialectDefinition,
        policy: CommandFailurePolicy,
    ) -> Result<Delivery, Failure> {
        let prompt = &dialect.prompt;
        let settle = &dialect.settle;

        if self.wait_for_prompt(prompt, 0, settle.banner).await == Wait::Closed {
            let status = self.finish().await?;
            return Err(Failure::Closed(status));
        }

        let mut elapsed = vec![Duration::ZERO; script.len()];
        let mut aborted_at = None;

        'delivery: {
            for directive in &script.preamble {
                if self.step(directive, prompt, settle.directive).await? == Wait::Closed {
                    break 'delivery;
                }
            }

            let filter = NoiseFilter::new(dialect);
            for step in &script.steps {
                let started = Instant::now();
                let mark = self.buffer.mark();

                for (line, limit) in [
                    (&step.begin_line, settle.directive),
                    (&step.command, settle.for_command(&step.command)),
                    (&step.end_line, settle.directive),
                ] {
                    if self.step(line, prompt, limit).await? == Wait::Closed {
                        elapsed[step.marker.index] = started.elapsed();
                        break 'delivery;
                    }
                }
                elapsed[step.marker.index] = started.elapsed();

                if policy == CommandFailurePolicy::AbortRemaining {
                    let region = &self.buffer.as_slice()[mark..];
                    let segments =
                        transcript::demultiplex_bytes(region, std::slice::from_ref(&step.marker));
                    let cleaned = segments
                        .first()
                        .map(|segment| filter.clean(&segment.text, Some(&step.command)))
                        .unwrap_or_default();
                    if let Some(pattern) = dialect.detect_failure(&cleaned) {
                        debug!(
                            "command {:?} failed ({:?}), skipping the rest",
                            step.command, pattern
                        );
                        aborted_at = Some(step.marker.index + 1);
                        break;
                    }
                }
            }

            self.send_line(&script.terminate).await?;
        }

        self.stdin = None;
        let status = self.finish().await?;

        Ok(Delivery {
            status,
            elapsed,
            aborted_at,
        })
    }

    /// Send one line and wait for the prompt to return.
    async fn step(
        &mut self,
        line: &str,
        prompt: &PromptPatterns,
        limit: Duration,
    ) -> Result<Wait, TransportError> {
        let mark = self.buffer.mark();
        self.send_line(line).await?;
        let wait = self.wait_for_prompt(prompt, mark, limit).await;
        if wait == Wait::Settled {
            warn!("no prompt within {:?} after {:?}, continuing", limit, line);
        }
        Ok(wait)
    }

    async fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
        self.send(&format!("{line}\n")).await
    }

    /// Write to the client. A closed pipe ends input without failing; the
    /// client's exit status and output decide what happened.
    async fn send(&mut self, text: &str) -> Result<(), TransportError> {
        let Some(stdin) = self.stdin.as_mut() else {
            return Ok(());
        };

        match write_input(stdin, text).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                debug!("client closed its input, {} bytes not sent", text.len());
                self.stdin = None;
                Ok(())
            }
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    /// Read until the prompt shows up after `since`, the output closes, or
    /// `limit` passes.
    async fn wait_for_prompt(
        &mut self,
        prompt: &PromptPatterns,
        since: usize,
        limit: Duration,
    ) -> Wait {
        let deadline = tokio::time::Instant::now() + limit;
        loop {
            if self.buffer.prompt_since(prompt, since) {
                return Wait::Prompt;
            }
            if self.closed {
                return Wait::Closed;
            }
            match tokio::time::timeout_at(deadline, self.output.recv()).await {
                Ok(Some(chunk)) => {
                    trace!("read {} bytes", chunk.len());
                    self.buffer.extend(&chunk);
                }
                Ok(None) => self.closed = true,
                Err(_) => return Wait::Settled,
            }
        }
    }

    /// Read until the client closes its output, then reap it.
    async fn finish(&mut self) -> Result<ExitStatus, TransportError> {
        while let Some(chunk) = self.output.recv().await {
            trace!("read {} bytes", chunk.len());
            self.buffer.extend(&chunk);
        }
        self.closed = true;
        Ok(self.child.wait().await?)
    }

    /// Kill the client and keep whatever it had already printed.
    async fn kill(&mut self) {
        self.stdin = None;
        if let Err(e) = self.child.start_kill() {
            debug!("failed to kill client: {}", e);
        }
        if tokio::time::timeout(KILL_GRACE, self.child.wait()).await.is_err() {
            warn!("client did not exit within {:?} of being killed", KILL_GRACE);
        }
        while let Ok(chunk) = self.output.try_recv() {
            self.buffer.extend(&chunk);
        }
    }

    fn into_transcript(mut self) -> RawTranscript {
        RawTranscript::new(self.buffer.take())
    }
}

/// Forward everything `reader` produces until it closes.
async fn pump<R: AsyncRead + Unpin>(mut reader: R, tx: mpsc::UnboundedSender<Bytes>) {
    let mut buf = BytesMut::with_capacity(8192);
    loop {
        buf.reserve(8192);
        match reader.read_buf(&mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                if tx.send(buf.split().freeze()).is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!("client output closed: {}", e);
                break;
            }
        }
    }
}

/// Write `text` and flush.
async fn write_input<W: AsyncWrite + Unpin>(writer: &mut W, text: &str) -> std::io::Result<()> {
    writer.write_all(text.as_bytes()).await?;
    writer.flush().await
}

/// Best explanation for a failed connection: the client's own diagnostic
/// line if it printed one, the exit status otherwise.
fn connection_reason(transcript: &[u8], status: ExitStatus) -> String {
    let text = escape::strip_str(transcript);
    text.lines()
        .map(str::trim)
        .find(|line| CLIENT_DIAGNOSTICS.iter().any(|d| line.contains(d)))
        .map(str::to_string)
        .unwrap_or_else(|| match status.code() {
            Some(code) => format!("client exited with status {code}"),
            None => "client terminated by signal".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::OsFamily;
    use crate::testing::{FakeDevice, ShellTransport};

    fn driver(transport: ShellTransport, settings: RunSettings) -> DeviceSessionDriver<ShellTransport> {
        DeviceSessionDriver::new(
            Arc::new(transport),
            Arc::new(Credentials::password("netops", "secret")),
        )
        .with_settings(Arc::new(settings))
    }

    fn quick_settings() -> RunSettings {
        RunSettings {
            session_timeout: Duration::from_secs(20),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_single_write_session() {
        let device = DeviceProfile::new("r1", "10.0.0.1", OsFamily::IosXe);
        let transport = ShellTransport::new().with_device(
            "r1",
            FakeDevice::new("R1#")
                .answer("show clock", "*12:00:00.000 UTC Mon Jan 1 2024")
                .answer("show users", "    Line       User       Host(s)\n*  1 vty 0     netops     idle"),
        );
        let batch = CommandBatch::new(["show clock", "show users", "clear counters"]);

        let result = driver(transport, quick_settings()).run(&device, &batch).await;

        assert!(result.success, "{:?}", result.error_message);
        assert_eq!(result.results.len(), 3);
        assert_eq!(result.results[0].output, "*12:00:00.000 UTC Mon Jan 1 2024");
        assert!(result.results[0].is_success());
        assert_eq!(
            result.results[1].output,
            "    Line       User       Host(s)\n*  1 vty 0     netops     idle"
        );
        assert_eq!(
            result.results[2].error,
            Some(CommandError::NoOutputCaptured {
                reason: NoOutputReason::EmptySegment
            })
        );
    }

    #[tokio::test]
    async fn test_paced_session() {
        let device = DeviceProfile::new("xr1", "10.0.0.2", OsFamily::IosXr);
        let transport = ShellTransport::new().with_device(
            "xr1",
            FakeDevice::new("RP/0/RP0/CPU0:xr1#")
                .banner("Please login with any configured user/password")
                .answer("show platform", "Node  Type  State\n0/RP0/CPU0  IOS XR RUN"),
        );
        let batch = CommandBatch::new(["show platform", "show bogus"]);

        let result = driver(transport, quick_settings()).run(&device, &batch).await;

        assert!(result.success, "{:?}", result.error_message);
        assert_eq!(result.results[0].output, "Node  Type  State\n0/RP0/CPU0  IOS XR RUN");
        assert_eq!(
            result.results[1].error,
            Some(CommandError::NoOutputCaptured {
                reason: NoOutputReason::EmptySegment
            })
        );
    }

    #[tokio::test]
    async fn test_abort_remaining_skips_after_failure() {
        let device = DeviceProfile::new("xr1", "10.0.0.2", OsFamily::IosXr);
        let transport = ShellTransport::new().with_device(
            "xr1",
            FakeDevice::new("RP/0/RP0/CPU0:xr1#")
                .answer("show clock", "12:00:00.000 UTC Mon Jan 1 2024")
                .answer("show bogus", "% Invalid input detected at '^' marker.")
                .answer("show version", "Cisco IOS XR Software, Version 7.3.2"),
        );
        let batch = CommandBatch::new(["show clock", "show bogus", "show version"]);
        let settings = RunSettings {
            on_command_failure: CommandFailurePolicy::AbortRemaining,
            ..quick_settings()
        };

        let result = driver(transport, settings).run(&device, &batch).await;

        assert!(result.success);
        assert!(result.results[0].is_success());
        assert_eq!(
            result.results[1].error,
            Some(CommandError::Failed {
                pattern: "% Invalid input detected".to_string()
            })
        );
        assert_eq!(result.results[2].error, Some(CommandError::Skipped));
    }

    #[tokio::test]
    async fn test_continue_policy_flags_failure_and_keeps_going() {
        let device = DeviceProfile::new("r1", "10.0.0.1", OsFamily::IosXe);
        let transport = ShellTransport::new().with_device(
            "r1",
            FakeDevice::new("R1#")
                .answer("show bogus", "% Invalid input detected at '^' marker.")
                .answer("show clock", "12:00"),
        );
        let batch = CommandBatch::new(["show bogus", "show clock"]);

        let result = driver(transport, quick_settings()).run(&device, &batch).await;

        assert!(matches!(result.results[0].error, Some(CommandError::Failed { .. })));
        assert_eq!(result.results[1].output, "12:00");
    }

    #[tokio::test]
    async fn test_disconnect_mid_batch_keeps_earlier_output() {
        let device = DeviceProfile::new("r1", "10.0.0.1", OsFamily::IosXe);
        let transport = ShellTransport::new().with_device(
            "r1",
            FakeDevice::new("R1#")
                .answer("show clock", "12:00")
                .hang_up_on("show version", "Cisco IOS XE Software\nVersion 17"),
        );
        let batch = CommandBatch::new(["show clock", "show version", "show inventory"]);

        let result = driver(transport, quick_settings()).run(&device, &batch).await;

        assert!(result.success, "{:?}", result.error_message);
        assert_eq!(result.failure, None);
        assert_eq!(result.results.len(), 3);
        assert!(result.results[0].is_success());
        assert_eq!(result.results[0].output, "12:00");
        assert_eq!(result.results[1].error, Some(CommandError::Truncated));
        assert_eq!(result.results[1].output, "Cisco IOS XE Software\nVersion 17");
        assert_eq!(
            result.results[2].error,
            Some(CommandError::NoOutputCaptured {
                reason: NoOutputReason::MarkersMissing
            })
        );
    }

    #[tokio::test]
    async fn test_unreachable_device() {
        let device = DeviceProfile::new("r3", "10.0.0.3", OsFamily::IosXe);
        let transport = ShellTransport::new().with_device("r3", FakeDevice::unreachable("10.0.0.3"));
        let batch = CommandBatch::new(["show clock", "show version"]);

        let result = driver(transport, quick_settings()).run(&device, &batch).await;

        assert!(!result.success);
        assert_eq!(result.failure, Some(crate::error::FailureKind::Connection));
        assert!(result.error_message.unwrap().contains("Connection refused"));
        assert_eq!(result.results.len(), 2);
        assert!(
            result
                .results
                .iter()
                .all(|r| r.error == Some(CommandError::SessionFailed))
        );
    }

    #[tokio::test]
    async fn test_unreachable_paced_device() {
        let device = DeviceProfile::new("xr9", "10.0.0.9", OsFamily::IosXr);
        let transport = ShellTransport::new().with_device("xr9", FakeDevice::unreachable("10.0.0.9"));
        let batch = CommandBatch::new(["show clock"]);

        let result = driver(transport, quick_settings()).run(&device, &batch).await;

        assert!(!result.success);
        assert_eq!(result.failure, Some(crate::error::FailureKind::Connection));
    }

    #[tokio::test]
    async fn test_session_timeout_kills_client() {
        let device = DeviceProfile::new("slow", "10.0.0.4", OsFamily::IosXe);
        let transport = ShellTransport::new().with_device("slow", FakeDevice::hung());
        let batch = CommandBatch::new(["show clock"]);
        let settings = RunSettings {
            session_timeout: Duration::from_millis(500),
            ..Default::default()
        };
        let driver = driver(transport, settings);

        let started = Instant::now();
        let result = driver.run(&device, &batch).await;
        let elapsed = started.elapsed();

        assert!(elapsed >= Duration::from_millis(500), "killed early: {elapsed:?}");
        assert!(elapsed < Duration::from_secs(3), "killed late: {elapsed:?}");
        assert!(!result.success);
        assert_eq!(result.failure, Some(crate::error::FailureKind::Timeout));
        assert_eq!(result.results.len(), 1);
        assert_eq!(driver.registry().active(), 0);
    }

    #[tokio::test]
    async fn test_transcript_written_on_failure() {
        let dir = std::env::temp_dir().join(format!("fleetscrape-session-{}", std::process::id()));
        let device = DeviceProfile::new("r3", "10.0.0.3", OsFamily::IosXe);
        let transport = ShellTransport::new().with_device("r3", FakeDevice::unreachable("10.0.0.3"));
        let settings = RunSettings {
            transcript_capture: TranscriptCapture::OnFailure,
            transcript_dir: dir.clone(),
            ..quick_settings()
        };

        let result = driver(transport, settings)
            .run(&device, &CommandBatch::new(["show clock"]))
            .await;
        assert!(!result.success);

        let written = tokio::fs::read_to_string(dir.join("r3.transcript.log")).await.unwrap();
        assert!(written.contains("Connection refused"));
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_write_input_writes_whole_script() {
        let batch = CommandBatch::new(["show clock"]);
        let script = compose(&batch, &crate::dialect::vendors::ios_xe::dialect());
        let rendered = script.render();

        let mut mock = tokio_test::io::Builder::new()
            .write(rendered.as_bytes())
            .build();
        write_input(&mut mock, &rendered).await.unwrap();
    }

    #[test]
    fn test_connection_reason_prefers_client_diagnostic() {
        use std::os::unix::process::ExitStatusExt;

        let status = ExitStatus::from_raw(255 << 8);
        let transcript = b"ssh: connect to host 10.0.0.3 port 22: Connection refused\r\n";
        assert_eq!(
            connection_reason(transcript, status),
            "ssh: connect to host 10.0.0.3 port 22: Connection refused"
        );
        assert_eq!(connection_reason(b"", status), "client exited with status 255");
    }
}

//! Shell command execution.
//!
//! Two entry points share one [`CommandRunner`] seam: [`CommandRunner::run`]
//! blocks and captures everything, [`CommandRunner::run_streaming`] hands
//! back an [`OutputStream`] that yields the combined stdout/stderr line by
//! line while the process is still running. Spawn failures never surface as
//! errors; they come back as a failed [`CommandResult`] carrying the OS error
//! text in `stderr`.

use std::collections::HashMap;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Result of executing a shell command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal or never started).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,

    /// The process never started (missing shell, permission denied).
    pub spawn_failed: bool,
}

impl CommandResult {
    /// Create a success result.
    pub fn success(stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code: Some(0),
            stdout,
            stderr,
            duration,
            success: true,
            spawn_failed: false,
        }
    }

    /// Create a failure result.
    pub fn failure(
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        duration: Duration,
    ) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            duration,
            success: false,
            spawn_failed: false,
        }
    }

    /// Create the result for a process that could not be started.
    pub fn spawn_failure(command: &str, error: &std::io::Error) -> Self {
        let mut result = Self::failure(
            None,
            String::new(),
            format!("failed to start `{}`: {}", command, error),
            Duration::ZERO,
        );
        result.spawn_failed = true;
        result
    }

    /// Stdout and stderr joined, for substring checks that don't care
    /// which pipe a tool wrote to.
    pub fn combined_output(&self) -> String {
        let mut out = self.stdout.clone();
        out.push_str(&self.stderr);
        out
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,
}

/// One step of a streaming command's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A complete line (without its terminator).
    Line(String),
    /// No line arrived within the poll timeout; the process is still running.
    Idle,
    /// Both pipes are closed; no more lines will arrive.
    Closed,
}

/// Live output of a running command.
///
/// The caller owns the process: it must either drain the stream to
/// [`StreamEvent::Closed`] or call [`OutputStream::terminate`], then call
/// [`OutputStream::finish`] to reap it.
pub trait OutputStream {
    /// Wait up to `timeout` for the next line.
    fn next_event(&mut self, timeout: Duration) -> StreamEvent;

    /// Kill the process without waiting for remaining output.
    fn terminate(&mut self);

    /// Reap the process and return its terminal record.
    fn finish(self: Box<Self>) -> CommandResult;
}

/// Blocking iterator over the lines of an [`OutputStream`].
pub struct Lines<'a> {
    stream: &'a mut dyn OutputStream,
}

impl Iterator for Lines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            match self.stream.next_event(Duration::from_secs(60)) {
                StreamEvent::Line(line) => return Some(line),
                StreamEvent::Idle => continue,
                StreamEvent::Closed => return None,
            }
        }
    }
}

/// View a stream as a plain line iterator, ignoring idle polls.
pub fn lines(stream: &mut dyn OutputStream) -> Lines<'_> {
    Lines { stream }
}

/// Something that can execute command strings.
///
/// Adapters only ever talk to this trait, which keeps every detection and
/// installation path testable with [`ScriptedRunner`](super::ScriptedRunner).
pub trait CommandRunner {
    /// Run to completion, capturing all output.
    fn run(&self, command: &str) -> CommandResult;

    /// Start the command and stream its combined output.
    fn run_streaming(&self, command: &str) -> Box<dyn OutputStream>;
}

/// Runs commands through the platform shell.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    options: CommandOptions,
}

impl ShellRunner {
    /// Create a runner with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a runner with explicit options.
    pub fn with_options(options: CommandOptions) -> Self {
        Self { options }
    }

    fn build(&self, command: &str) -> Command {
        let shell = detect_shell();
        let mut cmd = Command::new(&shell);
        cmd.arg(shell_flag(&shell));
        cmd.arg(command);

        if let Some(cwd) = &self.options.cwd {
            cmd.current_dir(cwd);
        }
        for (key, value) in &self.options.env {
            cmd.env(key, value);
        }
        cmd
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str) -> CommandResult {
        let start = Instant::now();
        tracing::debug!("Running: {}", command);

        let mut cmd = self.build(command);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let output = match cmd.output() {
            Ok(output) => output,
            Err(e) => {
                tracing::debug!("Spawn failed for '{}': {}", command, e);
                return CommandResult::spawn_failure(command, &e);
            }
        };

        let duration = start.elapsed();
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if output.status.success() {
            CommandResult::success(stdout, stderr, duration)
        } else {
            CommandResult::failure(output.status.code(), stdout, stderr, duration)
        }
    }

    fn run_streaming(&self, command: &str) -> Box<dyn OutputStream> {
        tracing::debug!("Streaming: {}", command);

        let mut cmd = self.build(command);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        // Own process group so terminate() reaches the whole pipeline and a
        // terminal Ctrl-C is ours to handle.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        match cmd.spawn() {
            Ok(child) => Box::new(ChildStream::start(command, child)),
            Err(e) => {
                tracing::debug!("Spawn failed for '{}': {}", command, e);
                Box::new(FailedStream {
                    result: Some(CommandResult::spawn_failure(command, &e)),
                })
            }
        }
    }
}

/// Streaming handle over a spawned child.
struct ChildStream {
    command: String,
    child: Child,
    rx: Receiver<String>,
    readers: Vec<JoinHandle<()>>,
    stdout: Arc<Mutex<String>>,
    stderr: Arc<Mutex<String>>,
    start: Instant,
    closed: bool,
    terminated: bool,
}

impl ChildStream {
    fn start(command: &str, mut child: Child) -> Self {
        let (tx, rx) = mpsc::channel();
        let stdout_buf = Arc::new(Mutex::new(String::new()));
        let stderr_buf = Arc::new(Mutex::new(String::new()));
        let mut readers = Vec::new();

        if let Some(out) = child.stdout.take() {
            let tx = tx.clone();
            let buf = Arc::clone(&stdout_buf);
            readers.push(thread::spawn(move || pump(out, tx, buf)));
        }
        if let Some(err) = child.stderr.take() {
            let buf = Arc::clone(&stderr_buf);
            readers.push(thread::spawn(move || pump(err, tx, buf)));
        }

        Self {
            command: command.to_string(),
            child,
            rx,
            readers,
            stdout: stdout_buf,
            stderr: stderr_buf,
            start: Instant::now(),
            closed: false,
            terminated: false,
        }
    }
}

impl OutputStream for ChildStream {
    fn next_event(&mut self, timeout: Duration) -> StreamEvent {
        if self.closed || self.terminated {
            return StreamEvent::Closed;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(line) => StreamEvent::Line(line),
            Err(RecvTimeoutError::Timeout) => StreamEvent::Idle,
            Err(RecvTimeoutError::Disconnected) => {
                self.closed = true;
                StreamEvent::Closed
            }
        }
    }

    fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        tracing::debug!("Terminating '{}'", self.command);
        kill_tree(&mut self.child);
    }

    fn finish(mut self: Box<Self>) -> CommandResult {
        if !self.terminated {
            while self.next_event(Duration::from_secs(60)) != StreamEvent::Closed {}
            for handle in self.readers.drain(..) {
                let _ = handle.join();
            }
        }

        let status = self.child.wait();
        let duration = self.start.elapsed();
        let stdout = self.stdout.lock().map(|s| s.clone()).unwrap_or_default();
        let mut stderr = self.stderr.lock().map(|s| s.clone()).unwrap_or_default();

        match status {
            Ok(status) if status.success() && !self.terminated => {
                CommandResult::success(stdout, stderr, duration)
            }
            Ok(status) => CommandResult::failure(status.code(), stdout, stderr, duration),
            Err(e) => {
                stderr.push_str(&e.to_string());
                CommandResult::failure(None, stdout, stderr, duration)
            }
        }
    }
}

/// Stream for a command that never started.
struct FailedStream {
    result: Option<CommandResult>,
}

impl OutputStream for FailedStream {
    fn next_event(&mut self, _timeout: Duration) -> StreamEvent {
        StreamEvent::Closed
    }

    fn terminate(&mut self) {}

    fn finish(mut self: Box<Self>) -> CommandResult {
        self.result.take().unwrap_or_else(|| {
            CommandResult::failure(None, String::new(), String::new(), Duration::ZERO)
        })
    }
}

/// Copy one pipe into the shared channel, splitting on `\n` and `\r`.
///
/// Model and package downloads redraw their progress with bare carriage
/// returns, so each redraw becomes its own line. Invalid UTF-8 is replaced.
fn pump<R: Read>(reader: R, tx: Sender<String>, captured: Arc<Mutex<String>>) {
    let mut pending: Vec<u8> = Vec::new();

    let emit = |pending: &mut Vec<u8>| {
        if pending.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(pending).into_owned();
        pending.clear();
        if let Ok(mut buf) = captured.lock() {
            buf.push_str(&line);
            buf.push('\n');
        }
        let _ = tx.send(line);
    };

    for byte in BufReader::new(reader).bytes() {
        let Ok(byte) = byte else { break };
        if byte == b'\n' || byte == b'\r' {
            emit(&mut pending);
        } else {
            pending.push(byte);
        }
    }
    emit(&mut pending);
}

#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    // The child leads its own process group (see run_streaming).
    let pgid = child.id() as libc::pid_t;
    // SAFETY: kill(2) with a negative pid signals a process group; no memory
    // is shared with the callee.
    let rc = unsafe { libc::kill(-pgid, libc::SIGTERM) };
    if rc != 0 {
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
}

/// Detect the current shell.
fn detect_shell() -> String {
    if cfg!(target_os = "windows") {
        std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string())
    } else {
        std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string())
    }
}

/// Get the flag to pass commands to the shell.
///
/// Uses `-lc` (login, non-interactive) on Unix so package managers set up
/// in the user's profile (Homebrew, nvm, pyenv) are on PATH. Interactive
/// mode is avoided because streamed commands run in their own process
/// group, where `-i` cannot take the terminal.
fn shell_flag(_shell: &str) -> &'static str {
    if cfg!(target_os = "windows") {
        "/C"
    } else {
        "-lc"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner() -> ShellRunner {
        ShellRunner::new()
    }

    #[test]
    fn run_successful_command() {
        let result = runner().run("echo hello");

        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.stdout.contains("hello"));
    }

    #[test]
    fn run_failing_command() {
        let result = runner().run("exit 3");

        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
    }

    #[test]
    fn run_with_env() {
        let mut options = CommandOptions::default();
        options
            .env
            .insert("MY_VAR".to_string(), "my_value".to_string());

        let cmd = if cfg!(target_os = "windows") {
            "echo %MY_VAR%"
        } else {
            "echo $MY_VAR"
        };

        let result = ShellRunner::with_options(options).run(cmd);

        assert!(result.success);
        assert!(result.stdout.contains("my_value"));
    }

    #[test]
    fn run_with_cwd() {
        let temp = tempfile::TempDir::new().unwrap();
        let options = CommandOptions {
            cwd: Some(temp.path().to_path_buf()),
            ..Default::default()
        };

        let cmd = if cfg!(target_os = "windows") {
            "cd"
        } else {
            "pwd"
        };

        assert!(ShellRunner::with_options(options).run(cmd).success);
    }

    #[test]
    fn spawn_failure_is_a_failed_result() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let result = CommandResult::spawn_failure("nope --version", &err);

        assert!(!result.success);
        assert!(result.spawn_failed);
        assert_eq!(result.exit_code, None);
        assert!(result.stderr.contains("nope --version"));
        assert!(result.stderr.contains("no such file"));
    }

    #[test]
    fn combined_output_joins_both_pipes() {
        let result = CommandResult::success("out\n".into(), "err\n".into(), Duration::ZERO);
        let combined = result.combined_output();
        assert!(combined.contains("out"));
        assert!(combined.contains("err"));
    }

    #[cfg(unix)]
    #[test]
    fn streaming_yields_lines_from_both_pipes() {
        let mut stream = runner().run_streaming("echo one; echo two >&2; echo three");
        let collected: Vec<String> = lines(stream.as_mut()).collect();
        let result = stream.finish();

        assert!(result.success);
        assert!(collected.contains(&"one".to_string()));
        assert!(collected.contains(&"two".to_string()));
        assert!(collected.contains(&"three".to_string()));
        assert!(result.stderr.contains("two"));
    }

    #[cfg(unix)]
    #[test]
    fn streaming_splits_carriage_returns() {
        let mut stream = runner().run_streaming("printf '10%%\\r20%%\\r30%%\\n'");
        let collected: Vec<String> = lines(stream.as_mut())
            .filter(|l| l.ends_with('%'))
            .collect();
        stream.finish();

        assert_eq!(collected, vec!["10%", "20%", "30%"]);
    }

    #[cfg(unix)]
    #[test]
    fn streaming_replaces_invalid_utf8() {
        let mut stream = runner().run_streaming("printf 'ok \\377 done\\n'");
        let collected: Vec<String> = lines(stream.as_mut()).collect();
        stream.finish();

        assert!(collected
            .iter()
            .any(|l| l.starts_with("ok ") && l.contains('\u{FFFD}')));
    }

    #[cfg(unix)]
    #[test]
    fn streaming_reports_exit_code() {
        let stream = runner().run_streaming("echo bye; exit 4");
        let result = stream.finish();

        assert!(!result.success);
        assert_eq!(result.exit_code, Some(4));
        assert!(result.stdout.contains("bye"));
    }

    #[cfg(unix)]
    #[test]
    fn streaming_idle_then_terminate() {
        let mut stream = runner().run_streaming("sleep 30");
        stream.terminate();
        assert_eq!(
            stream.next_event(Duration::from_millis(50)),
            StreamEvent::Closed
        );
        let result = stream.finish();
        assert!(!result.success);
    }

    #[test]
    fn failed_stream_is_closed_and_carries_error() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing shell");
        let mut stream: Box<dyn OutputStream> = Box::new(FailedStream {
            result: Some(CommandResult::spawn_failure("x", &err)),
        });

        assert_eq!(stream.next_event(Duration::ZERO), StreamEvent::Closed);
        let result = stream.finish();
        assert!(!result.success);
        assert!(result.stderr.contains("missing shell"));
    }

    #[test]
    fn shell_flag_is_login_non_interactive() {
        if cfg!(target_os = "windows") {
            assert_eq!(shell_flag("cmd.exe"), "/C");
        } else {
            assert_eq!(shell_flag("/bin/bash"), "-lc");
        }
    }
}

//! Transport to an engine: a child process or an in-memory channel pair.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::command::Command;
use crate::error::UciError;
use crate::response::{Response, parse_response};

/// How long a process gets to exit on its own after `quit`.
const QUIT_GRACE: Duration = Duration::from_millis(500);

/// A connected engine, split into parts by the session.
pub struct EngineProcess {
    reader: EngineReader,
    writer: EngineWriter,
    handle: ProcessHandle,
}

impl EngineProcess {
    /// Start the executable at `path` with piped standard streams.
    pub fn spawn(path: impl AsRef<Path>) -> Result<Self, UciError> {
        let path = path.as_ref();
        let spawn_error = |source| UciError::Spawn {
            path: path.display().to_string(),
            source,
        };

        let mut child = std::process::Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(spawn_error)?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            return Err(spawn_error(std::io::Error::other("engine streams unavailable")));
        };

        debug!(path = %path.display(), pid = child.id(), "engine process started");
        Ok(Self {
            reader: EngineReader {
                source: Source::Pipe(BufReader::new(stdout)),
            },
            writer: EngineWriter {
                sink: Sink::Pipe(stdin),
            },
            handle: ProcessHandle::Child(child),
        })
    }

    /// An engine living in the same process, driven through the returned handle.
    pub fn in_memory() -> (Self, EngineHandle) {
        let (command_tx, command_rx) = mpsc::channel();
        let (output_tx, output_rx) = mpsc::channel();

        let process = Self {
            reader: EngineReader {
                source: Source::Channel(output_rx),
            },
            writer: EngineWriter {
                sink: Sink::Channel(command_tx),
            },
            handle: ProcessHandle::Channel(output_tx.clone()),
        };
        let handle = EngineHandle {
            commands: command_rx,
            output: output_tx,
        };
        (process, handle)
    }

    pub(crate) fn into_parts(self) -> (EngineReader, EngineWriter, ProcessHandle) {
        (self.reader, self.writer, self.handle)
    }
}

enum Source {
    Pipe(BufReader<ChildStdout>),
    /// `None` marks end of output.
    Channel(Receiver<Option<String>>),
}

/// The engine's output stream.
pub struct EngineReader {
    source: Source,
}

impl EngineReader {
    /// Read one raw line, without the trailing newline.
    fn read_line(&mut self) -> Result<String, UciError> {
        match &mut self.source {
            Source::Pipe(reader) => {
                let mut line = String::new();
                if reader.read_line(&mut line)? == 0 {
                    return Err(UciError::Closed);
                }
                Ok(line.trim_end().to_string())
            }
            Source::Channel(rx) => match rx.recv() {
                Ok(Some(line)) => Ok(line),
                Ok(None) | Err(_) => Err(UciError::Closed),
            },
        }
    }

    /// Read the next meaningful response.
    ///
    /// Blank lines are skipped. Malformed lines are logged and skipped, except
    /// a malformed `bestmove`, which ends the current command.
    pub fn read_response(&mut self) -> Result<Response, UciError> {
        loop {
            let line = self.read_line()?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            debug!(line = %trimmed, "engine output");
            match parse_response(trimmed) {
                Ok(response) => return Ok(response),
                Err(e) if trimmed.starts_with("bestmove") => return Err(e),
                Err(e) => warn!(error = %e, line = %trimmed, "skipping malformed engine output"),
            }
        }
    }
}

enum Sink {
    Pipe(ChildStdin),
    Channel(Sender<String>),
}

/// The engine's input stream.
pub struct EngineWriter {
    sink: Sink,
}

impl EngineWriter {
    /// Write one command line and flush it.
    pub fn send(&mut self, command: &Command) -> Result<(), UciError> {
        debug!(command = %command, "sending to engine");
        match &mut self.sink {
            Sink::Pipe(stdin) => {
                writeln!(stdin, "{command}")?;
                stdin.flush()?;
                Ok(())
            }
            Sink::Channel(tx) => tx.send(command.to_string()).map_err(|_| UciError::Closed),
        }
    }
}

/// Owner of the engine's lifetime.
pub(crate) enum ProcessHandle {
    Child(Child),
    Channel(Sender<Option<String>>),
}

impl ProcessHandle {
    /// End the engine. Failures are logged, never returned.
    ///
    /// A child gets a short grace period to exit after `quit` before it is killed.
    pub(crate) fn terminate(&mut self) {
        match self {
            ProcessHandle::Child(child) => {
                let deadline = Instant::now() + QUIT_GRACE;
                loop {
                    match child.try_wait() {
                        Ok(Some(status)) => {
                            debug!(%status, "engine process exited");
                            return;
                        }
                        Ok(None) if Instant::now() < deadline => {
                            thread::sleep(Duration::from_millis(10));
                        }
                        Ok(None) => break,
                        Err(e) => {
                            warn!(error = %e, "failed to poll engine process");
                            break;
                        }
                    }
                }
                if let Err(e) = child.kill() {
                    warn!(error = %e, "failed to kill engine process");
                }
                if let Err(e) = child.wait() {
                    warn!(error = %e, "failed to reap engine process");
                }
            }
            ProcessHandle::Channel(tx) => {
                let _ = tx.send(None);
            }
        }
    }
}

/// The engine side of an in-memory transport.
///
/// Dropping the handle closes the engine's output.
pub struct EngineHandle {
    commands: Receiver<String>,
    output: Sender<Option<String>>,
}

impl EngineHandle {
    /// Wait for the next command line; `None` once the session side is gone.
    pub fn recv(&self) -> Option<String> {
        self.commands.recv().ok()
    }

    /// Like [`recv`](EngineHandle::recv), giving up after `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<String> {
        match self.commands.recv_timeout(timeout) {
            Ok(line) => Some(line),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Emit one line of engine output. Returns `false` if nobody reads it anymore.
    pub fn send(&self, line: impl Into<String>) -> bool {
        self.output.send(Some(line.into())).is_ok()
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        let _ = self.output.send(None);
    }
}

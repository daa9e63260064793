//! UCI client errors.

use std::time::Duration;

use rechess_core::MoveError;

use crate::session::EngineState;

/// Errors that can occur while talking to an engine process.
#[derive(Debug, thiserror::Error)]
pub enum UciError {
    /// The engine executable could not be started.
    #[error("failed to start engine at {path}: {source}")]
    Spawn {
        /// Path of the executable.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An I/O error occurred on the engine's standard streams.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The engine closed its output, usually because the process exited.
    #[error("engine closed its output")]
    Closed,

    /// The engine did not finish the handshake in time.
    #[error("engine did not answer within {timeout:?}")]
    Timeout {
        /// How long the handshake was given.
        timeout: Duration,
    },

    /// A line from the engine could not be understood.
    #[error("malformed engine output: {line}")]
    Protocol {
        /// The offending line.
        line: String,
    },

    /// A keyword was not followed by its value.
    #[error("missing value for {param}")]
    MissingValue {
        /// The keyword, e.g. `depth`.
        param: String,
    },

    /// A keyword's value could not be parsed.
    #[error("invalid value for {param}: {value}")]
    InvalidValue {
        /// The keyword, e.g. `depth`.
        param: String,
        /// The value that failed to parse.
        value: String,
    },

    /// The engine sent a move that is not valid UCI.
    #[error("invalid move from engine: {source}")]
    InvalidMove {
        /// The parse error.
        #[from]
        source: MoveError,
    },

    /// The engine answered `bestmove (none)` or `bestmove 0000`.
    #[error("engine returned no move")]
    NoMove,

    /// A command was requested while another one is still outstanding.
    #[error("engine is busy ({state})")]
    Busy {
        /// What the engine is currently doing.
        state: EngineState,
    },

    /// No engine process is loaded.
    #[error("no engine loaded")]
    NotLoaded,
}

//! Standing engine configuration, applied on every load and settings change.

use std::thread;

use tracing::debug;

use crate::command::Command;

/// Default transposition table size in megabytes.
pub const DEFAULT_HASH_MB: u32 = 256;

/// Default depth limit when the engine plays a move.
pub const DEFAULT_PLAY_DEPTH: u32 = 30;

/// Default depth limit for analysis.
pub const DEFAULT_ANALYSIS_DEPTH: u32 = 40;

/// Options sent to the engine with `setoption`, plus search depth limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Transposition table size in megabytes.
    pub hash_mb: u32,
    /// Number of search threads.
    pub threads: u32,
    /// Keep searching on the opponent's time after a move.
    pub ponder: bool,
    /// `go depth` used by `play_move`.
    pub depth: u32,
    /// `go depth` used by `start_analysis`.
    pub analysis_depth: u32,
}

impl EngineOptions {
    /// The `setoption` commands for this configuration.
    pub fn commands(&self) -> [Command; 3] {
        [
            Command::set_option("Hash", self.hash_mb),
            Command::set_option("Threads", self.threads),
            Command::set_option("Ponder", self.ponder),
        ]
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            hash_mb: DEFAULT_HASH_MB,
            threads: default_threads(),
            ponder: false,
            depth: DEFAULT_PLAY_DEPTH,
            analysis_depth: DEFAULT_ANALYSIS_DEPTH,
        }
    }
}

/// All logical CPUs but one, and at least one.
fn default_threads() -> u32 {
    let available = thread::available_parallelism().map_or(1, |n| n.get());
    let threads = available.saturating_sub(1).max(1);
    debug!(available, threads, "default engine threads");
    u32::try_from(threads).unwrap_or(u32::MAX)
}

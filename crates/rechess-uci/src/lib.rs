//! UCI client for ReChess: talks to an external engine process.

pub mod cancel;
pub mod command;
pub mod error;
pub mod options;
pub mod process;
pub mod response;
pub mod score;
pub mod session;

pub use cancel::CancelToken;
pub use command::{Command, GoParams};
pub use error::UciError;
pub use options::EngineOptions;
pub use process::{EngineHandle, EngineProcess};
pub use response::{Info, Response, parse_response};
pub use score::Score;
pub use session::{Analysis, CommandDone, CommandResult, EngineEvent, EngineSession, EngineState};

//! Game coordination for ReChess: the game session, clocks, settings and the
//! controller that ties them to the engine.

pub mod clock;
pub mod config;
pub mod controller;
pub mod event;
pub mod session;
pub mod ticker;

pub use clock::{Clock, Timer, format_time};
pub use config::{ConfigError, SessionConfig, SettingValue};
pub use controller::Controller;
pub use event::{Event, Notification};
pub use session::{Cursor, GameSession, MoveApplied};
pub use ticker::{TICK_INTERVAL, spawn_ticker};

//! Session configuration, read from named key/value settings.

use std::str::FromStr;

use rechess_core::Color;
use rechess_uci::EngineOptions;
use tracing::debug;

/// Default clock base time in seconds.
pub const DEFAULT_CLOCK_SECONDS: u64 = 300;

/// A setting value as stored by the settings collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingValue {
    Bool(bool),
    Number(i64),
}

impl FromStr for SettingValue {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "true" => Ok(SettingValue::Bool(true)),
            "false" => Ok(SettingValue::Bool(false)),
            other => other
                .parse()
                .map(SettingValue::Number)
                .map_err(|_| ConfigError::InvalidValue {
                    value: other.to_string(),
                }),
        }
    }
}

/// Errors raised while applying settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown setting: {key}")]
    UnknownKey { key: String },

    #[error("setting {key} expects a {expected}")]
    WrongType { key: String, expected: &'static str },

    #[error("setting {key} is out of range: {value}")]
    OutOfRange { key: String, value: i64 },

    #[error("not a boolean or a number: \"{value}\"")]
    InvalidValue { value: String },

    #[error("expected key=value, got \"{text}\"")]
    MalformedPair { text: String },
}

/// Everything the game, the clocks and the engine read from settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Base time per side in seconds (`clock.time`).
    pub clock_time: u64,
    /// Increment per move in seconds (`clock.increment`).
    pub clock_increment: u64,
    /// Color the engine plays (`engine.is_white`).
    pub engine_color: Color,
    /// Options passed to the engine session (`engine.*`).
    pub engine: EngineOptions,
    /// Color shown at the bottom of the board (`board.orientation`, `true` for White).
    pub orientation: Color,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            clock_time: DEFAULT_CLOCK_SECONDS,
            clock_increment: 0,
            engine_color: Color::Black,
            engine: EngineOptions::default(),
            orientation: Color::White,
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by `settings`, applied in order.
    pub fn from_settings<I, K>(settings: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, SettingValue)>,
        K: AsRef<str>,
    {
        let mut config = Self::default();
        for (key, value) in settings {
            config.set(key.as_ref(), value)?;
        }
        Ok(config)
    }

    /// Apply a single `key=value` text pair, as given on the command line.
    pub fn set_pair(&mut self, text: &str) -> Result<(), ConfigError> {
        let (key, value) = text.split_once('=').ok_or_else(|| ConfigError::MalformedPair {
            text: text.to_string(),
        })?;
        self.set(key.trim(), value.parse()?)
    }

    /// Apply one setting.
    pub fn set(&mut self, key: &str, value: SettingValue) -> Result<(), ConfigError> {
        debug!(key, ?value, "applying setting");
        match key {
            "clock.time" => self.clock_time = seconds(key, value)?,
            "clock.increment" => self.clock_increment = seconds(key, value)?,
            "engine.is_white" => self.engine_color = color(key, value)?,
            "engine.is_pondering" => self.engine.ponder = boolean(key, value)?,
            "engine.hash" => self.engine.hash_mb = positive(key, value)?,
            "engine.threads" => self.engine.threads = positive(key, value)?,
            "engine.depth" => self.engine.depth = positive(key, value)?,
            "engine.analysis_depth" => self.engine.analysis_depth = positive(key, value)?,
            "board.orientation" => self.orientation = color(key, value)?,
            _ => {
                return Err(ConfigError::UnknownKey {
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn boolean(key: &str, value: SettingValue) -> Result<bool, ConfigError> {
    match value {
        SettingValue::Bool(b) => Ok(b),
        SettingValue::Number(_) => Err(ConfigError::WrongType {
            key: key.to_string(),
            expected: "boolean",
        }),
    }
}

/// `true` means White.
fn color(key: &str, value: SettingValue) -> Result<Color, ConfigError> {
    Ok(if boolean(key, value)? { Color::White } else { Color::Black })
}

fn number(key: &str, value: SettingValue) -> Result<i64, ConfigError> {
    match value {
        SettingValue::Number(n) => Ok(n),
        SettingValue::Bool(_) => Err(ConfigError::WrongType {
            key: key.to_string(),
            expected: "number",
        }),
    }
}

fn seconds(key: &str, value: SettingValue) -> Result<u64, ConfigError> {
    let n = number(key, value)?;
    u64::try_from(n).map_err(|_| ConfigError::OutOfRange {
        key: key.to_string(),
        value: n,
    })
}

fn positive(key: &str, value: SettingValue) -> Result<u32, ConfigError> {
    let n = number(key, value)?;
    match u32::try_from(n) {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(ConfigError::OutOfRange {
            key: key.to_string(),
            value: n,
        }),
    }
}

//! Ошибки генерации карты
//!
//! Три уровня:
//! - ошибки конфигурации — генерация прерывается сразу, без повторов;
//! - деградация (река не дошла до воды, замки не удовлетворили ограничениям) —
//!   ошибкой становится только при политике `on_degraded = "fail"`;
//! - исчерпание повторов на внешней границе [`crate::generate_map`].

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read generator config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse generator config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("missing [castle] rule block")]
    MissingCastle,
    #[error("map dimensions must be non-zero (got {width}x{height})")]
    EmptyMap { width: u32, height: u32 },
    #[error("{field} must be at least 1")]
    ZeroSize { field: &'static str },
    #[error("at most 9 players are supported (got {0})")]
    TooManyPlayers(usize),
    #[error("duplicate {block} rule for terrain '{terrain}'")]
    DuplicateRule { block: &'static str, terrain: char },
    #[error("convert_to_bridge for terrain '{terrain}' has {count} entries, expected at most 3")]
    BridgeArity { terrain: char, count: usize },
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(
        "map {width}x{height} leaves no room for castles (need at least 3 columns and rows)"
    )]
    MapTooSmall { width: u32, height: u32 },
    #[error("{stage} degraded: {reason}")]
    Degraded { stage: &'static str, reason: String },
    #[error("map generation failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: usize,
        #[source]
        last: Box<GenerationError>,
    },
}

impl GenerationError {
    /// Можно ли повторить генерацию с продолженным потоком случайных чисел
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerationError::Degraded { .. })
    }
}

//! Unified error type for the arenaloop facade.

use std::path::PathBuf;

use arenaloop_arena::ArenaError;

/// Failure while loading or checking a [`ServerConfig`](crate::ServerConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration is not valid JSON for the expected shape.
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration parsed but cannot be served.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level error that wraps the errors of every layer.
///
/// The `#[from]` attribute on each variant lets `?` convert layer
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ArenaloopError {
    /// An arena-level error (full, not found, invalid state).
    #[error(transparent)]
    Arena(#[from] ArenaError),

    /// A configuration error (parse, io, invalid).
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use arenaloop_arena::ArenaId;

    use super::*;

    #[test]
    fn test_from_arena_error() {
        let err = ArenaError::NotFound(ArenaId::new("pirates"));
        let top: ArenaloopError = err.into();
        assert!(matches!(top, ArenaloopError::Arena(_)));
        assert!(top.to_string().contains("pirates"));
    }

    #[test]
    fn test_from_config_error() {
        let err = ConfigError::Invalid("no arenas".into());
        let top: ArenaloopError = err.into();
        assert!(matches!(top, ArenaloopError::Config(_)));
        assert!(top.to_string().contains("no arenas"));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: ConfigError = json_err.into();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}

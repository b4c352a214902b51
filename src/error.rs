//! Error types for the channel finder engine
//!
//! Construction failures are `SchemaError` and are fatal: no engine is
//! produced from a malformed definition. Query failures are
//! `NavigationError` and describe what the caller must change. An unknown
//! address is not an error; `validate`/`get` report it as false/`None`.

use thiserror::Error;

/// Umbrella error for callers that want a single type
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Malformed hierarchy or tree definition
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to read definition '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid definition JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Hierarchy defines no levels")]
    EmptyHierarchy,

    #[error("Hierarchy level '{0}' is defined more than once")]
    DuplicateLevel(String),

    #[error("Hierarchy level name must not be empty")]
    EmptyLevelName,

    #[error("Terminal level '{0}' cannot be optional")]
    OptionalTerminalLevel(String),

    #[error("Separator '{0}' is not valid: separators must be non-empty and distinct")]
    InvalidSeparator(String),

    #[error("Entry '{path}' is malformed: {reason}")]
    MalformedEntry { path: String, reason: String },

    #[error("Entry '{path}' has both an address and children")]
    AmbiguousEntry { path: String },

    #[error("Group '{path}' sits at or beyond the terminal level '{terminal_level}'")]
    GroupTooDeep {
        path: String,
        terminal_level: String,
    },

    #[error("Terminal '{path}' skips required level '{level}'")]
    MisplacedTerminal { path: String, level: String },

    #[error("Entry '{path}' renders an invalid address segment '{segment}'")]
    InvalidAddress { path: String, segment: String },

    #[error("Terminal '{path}' has an empty suffix")]
    EmptySuffix { path: String },

    #[error("Terminal '{path}' produces no address (no base and no suffixes)")]
    NoAddresses { path: String },

    #[error("Invalid instance expansion under '{path}': {reason}")]
    InvalidInstances { path: String, reason: String },

    #[error("Entry '{name}' appears more than once under '{path}'")]
    DuplicateChild { path: String, name: String },

    #[error("Address '{address}' is produced by both '{first}' and '{second}'")]
    DuplicateAddress {
        address: String,
        first: String,
        second: String,
    },
}

/// Selection that cannot be resolved against the tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("Unknown hierarchy level '{0}'")]
    UnknownLevel(String),

    #[error("Required level '{level}' has no selection")]
    MissingLevel { level: String },

    #[error("'{value}' is not a valid {level}; available: {}", available.join(", "))]
    UnknownValue {
        level: String,
        value: String,
        available: Vec<String>,
    },

    #[error("'{value}' is a signal, not a {level}")]
    TerminalAtLevel { level: String, value: String },

    #[error("'{value}' is a container at the {level} level; navigate further to reach a signal")]
    Incomplete { level: String, value: String },

    #[error("Selection for level '{level}' continues past signal '{terminal}'")]
    PastTerminal { level: String, terminal: String },

    #[error("Address '{0}' contains a separator artifact")]
    MalformedAddress(String),

    #[error("Selection matched no channels")]
    NoMatches,
}

/// Configuration loading failures
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Config has no database path")]
    MissingDatabasePath,
}

pub type SchemaResult<T> = Result<T, SchemaError>;
pub type NavigationResult<T> = Result<T, NavigationError>;

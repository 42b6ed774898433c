//! Structured CLI errors with meaningful exit codes.
//!
//! Exit code scheme:
//! - 0:  success
//! - 2:  clap arg parse error (automatic, before our code runs)
//! - 10: engine error (bad dimensions, render setup)
//! - 11: I/O error (config read, PNG write)
//! - 12: input error (bad config values, bad colors)
//! - 13: serialization error

use backdrop_core::EngineError;
use std::fmt;

/// Errors produced by CLI commands, each mapped to a distinct exit code.
#[derive(Debug)]
pub enum CliError {
    /// An engine-level error (bad dimensions, render setup).
    Engine(EngineError),
    /// An I/O error (config file read, PNG write).
    Io(String),
    /// A user input error (out-of-range option, unparseable color, bad fps).
    Input(String),
    /// A serialization error (malformed JSON output).
    Serialization(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Engine(_) => 10,
            CliError::Io(_) => 11,
            CliError::Input(_) => 12,
            CliError::Serialization(_) => 13,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Engine(e) => write!(f, "{e}"),
            CliError::Io(msg) | CliError::Input(msg) | CliError::Serialization(msg) => {
                f.write_str(msg)
            }
        }
    }
}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Io(msg) => CliError::Io(msg),
            e @ (EngineError::InvalidConfig(_) | EngineError::InvalidColor(_)) => {
                CliError::Input(e.to_string())
            }
            other => CliError::Engine(other),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}

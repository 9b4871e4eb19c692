//! Error types for the phylocfg library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for phylocfg operations.
pub type Result<T> = std::result::Result<T, PhyloCfgError>;

/// Errors that can occur while generating a pipeline configuration.
#[derive(Error, Debug)]
pub enum PhyloCfgError {
    /// Invalid or incomplete tool selection
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Configuration error raised by the output guard: the output file is
    /// already present and overwrite was not requested
    #[error("cannot write output file {0} because it already exists")]
    OutputExists(PathBuf),

    /// No executable matched the requested name (nor its fallback)
    #[error("{}", not_found_message(.fragment, .fallback.as_deref()))]
    ExecutableNotFound {
        fragment: String,
        fallback: Option<String>,
    },

    /// A command-line placeholder has no matching option in its stage
    #[error("stage [{stage}]: command line references #{key}# but no such option is set")]
    UnresolvedPlaceholder { stage: String, key: String },

    /// A mandatory option was never set
    #[error("stage [{stage}]: missing mandatory option '{key}'")]
    MissingOption { stage: String, key: String },

    /// Malformed configuration text
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn not_found_message(fragment: &str, fallback: Option<&str>) -> String {
    match fallback {
        Some(fallback) => format!(
            "could not find \"{fragment}\" (nor fallback \"{fallback}\") executable in your PATH environment variable"
        ),
        None => format!("could not find \"{fragment}\" executable in your PATH environment variable"),
    }
}

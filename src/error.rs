//! Error handling module for uplugin-build
//!
//! One error type covers every pipeline stage. Library code returns
//! [`Result`]; the binary wraps it in `anyhow` for context chains.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the build pipeline
#[derive(Error, Debug)]
pub enum BuildError {
    /// IO errors (filesystem, process spawn)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Version-control failures (clone, pull)
    #[error("Git error: {0}")]
    Vcs(String),

    /// No plugin descriptor under the search root
    #[error("No .uplugin file found under {}", .0.display())]
    DescriptorNotFound(PathBuf),

    /// Remote archive could not be downloaded
    #[error("Download failed: {0}")]
    Download(String),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Archive could not be read or extracted
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Packaging tool exited unsuccessfully
    #[error("An error occurred during the build process (exit code {})", display_code(.code))]
    Packaging { code: Option<i32> },

    /// External tool could not be run
    #[error("Tool execution failed: {0}")]
    Tool(String),

    /// Configuration errors (loading, parsing)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors (arguments, config values, prompt input)
    #[error("Validation error: {0}")]
    Validation(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, BuildError>;

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none, terminated by signal".to_string(), |c| c.to_string())
}

impl BuildError {
    /// Create a version-control error
    pub fn vcs(msg: impl Into<String>) -> Self {
        Self::Vcs(msg.into())
    }

    /// Create a download error
    pub fn download(msg: impl Into<String>) -> Self {
        Self::Download(msg.into())
    }

    /// Create a tool execution error
    pub fn tool(msg: impl Into<String>) -> Self {
        Self::Tool(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

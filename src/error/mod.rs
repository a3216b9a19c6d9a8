//! Error types for tree mirroring, transforms and the standalone tools

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;

/// Fatal errors raised before any file is touched
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    #[error("Input directory '{}' does not exist", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Input path '{}' is not a directory", path.display())]
    InputNotDirectory { path: PathBuf },

    #[error("Output directory '{}' exists, won't overwrite unless forced", path.display())]
    OutputExists { path: PathBuf },

    #[error("Output path '{}' exists and is not a directory", path.display())]
    OutputNotDirectory { path: PathBuf },

    #[error("Failed to create output directory '{}': {source}", path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No bytes provided to prepend or append")]
    NoBytesSupplied,

    #[error("Invalid hex bytes '{input}': {message}")]
    InvalidHex { input: String, message: String },

    #[error("External application '{}' could not be found", path.display())]
    MissingTool { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    #[error("IO error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MirrorError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::OutputExists { path } => format!(
                "'{}' exists, won't overwrite unless forced with '-f'. Exiting.",
                path.display()
            ),
            Self::InputNotFound { path } => {
                format!("Input directory '{}' does not exist. Exiting.", path.display())
            }
            Self::NoBytesSupplied => "No bytes provided to prepend or append! Exiting.".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Errors raised by a transform while processing a single file
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("'{program}' exited with {status}")]
    Subprocess { program: String, status: ExitStatus },

    #[error("XML error: {message}")]
    Xml { message: String },
}

impl TransformError {
    pub fn xml(message: impl fmt::Display) -> Self {
        Self::Xml {
            message: message.to_string(),
        }
    }
}

/// The step of per-file processing that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Read,
    Transform,
    Write,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureStage::Read => "read",
            FailureStage::Transform => "transform",
            FailureStage::Write => "write",
        };
        f.write_str(name)
    }
}

/// A recoverable per-file failure recorded in the tally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFailure {
    pub stage: FailureStage,
    pub reason: String,
}

impl EntryFailure {
    pub fn new(stage: FailureStage, reason: impl fmt::Display) -> Self {
        Self {
            stage,
            reason: reason.to_string(),
        }
    }

    pub fn read(reason: impl fmt::Display) -> Self {
        Self::new(FailureStage::Read, reason)
    }

    pub fn transform(error: &TransformError) -> Self {
        Self::new(FailureStage::Transform, error)
    }

    pub fn write(reason: impl fmt::Display) -> Self {
        Self::new(FailureStage::Write, reason)
    }
}

impl fmt::Display for EntryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.stage, self.reason)
    }
}

/// Errors from the standalone converters
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    #[error("'{input}' contains a non-digit character '{found}'")]
    InvalidDigit { input: String, found: char },

    #[error("'{input}' is empty")]
    EmptyNumber { input: String },

    #[error("Date '{input}' is not in format '%m/%d/%Y %H:%M:%S' ie. '01/01/2008 15:20:20'")]
    InvalidDate { input: String },

    #[error("'{input}' is not a valid PRTime")]
    InvalidPrtime { input: String },
}

/// Result type for setup and run operations
pub type MirrorResult<T> = Result<T, MirrorError>;

/// Result type for transform operations
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for the standalone tools
pub type ToolResult<T> = Result<T, ToolError>;

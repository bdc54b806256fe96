//! Error types shared across Narrator crates.

use std::path::PathBuf;

/// Top-level error type for Narrator operations.
#[derive(Debug, thiserror::Error)]
pub enum NarratorError {
    #[error("Speech synthesis failed after {attempts} attempt(s): {message}")]
    Synthesis {
        message: String,
        attempts: u32,
        /// Whether retrying the same request could succeed (network, quota, 5xx).
        transient: bool,
    },

    #[error("Mux failed (exit code {}): {}", code_label(.exit_code), .stderr)]
    Mux {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Ledger format error at line {line}: {message}")]
    LedgerFormat { line: usize, message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Media error: {message}")]
    Media { message: String },

    #[error("Assembly error: {message}")]
    Assembly { message: String },

    #[error("Timer error: {message}")]
    Timer { message: String },

    #[error("Scene error: {message}")]
    Scene { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using NarratorError.
pub type NarratorResult<T> = Result<T, NarratorError>;

fn code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}

impl NarratorError {
    /// A synthesis failure that a retry will not fix (auth, bad request).
    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis {
            message: msg.into(),
            attempts: 1,
            transient: false,
        }
    }

    /// A synthesis failure worth retrying (network, quota, server error).
    pub fn synthesis_transient(msg: impl Into<String>) -> Self {
        Self::Synthesis {
            message: msg.into(),
            attempts: 1,
            transient: true,
        }
    }

    pub fn ledger_format(line: usize, msg: impl Into<String>) -> Self {
        Self::LedgerFormat {
            line,
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media {
            message: msg.into(),
        }
    }

    pub fn assembly(msg: impl Into<String>) -> Self {
        Self::Assembly {
            message: msg.into(),
        }
    }

    pub fn timer(msg: impl Into<String>) -> Self {
        Self::Timer {
            message: msg.into(),
        }
    }

    pub fn scene(msg: impl Into<String>) -> Self {
        Self::Scene {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether this error is a synthesis failure that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Synthesis {
                transient: true,
                ..
            }
        )
    }

    /// Record how many attempts were spent before giving up.
    pub fn with_attempts(self, total: u32) -> Self {
        match self {
            Self::Synthesis {
                message, transient, ..
            } => Self::Synthesis {
                message,
                attempts: total,
                transient,
            },
            other => other,
        }
    }
}

//! Error types for codeblock-core.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type for codeblock-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in codeblock-core.
#[derive(Debug, Error)]
pub enum Error {
    /// A matched declaration or implementation file could not be read.
    #[error("failed to read module file {}: {source}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A discovery glob pattern could not be built.
    #[error("invalid module pattern: {0}")]
    Pattern(#[from] globset::Error),

    /// The staging directory or entry file could not be written.
    #[error("failed to stage code block in {}: {source}", path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The toolchain invocation itself failed.
    #[error("compilation failed: {0}")]
    Compilation(String),

    /// The bundle was missing or unreadable after the toolchain finished.
    #[error("failed to read bundle {}: {source}", path.display())]
    OutputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The staging directory could not be removed.
    #[error("failed to remove staging directory {}: {source}", path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The toolchain did not finish within the configured limit.
    #[error("compilation timed out after {0:?}")]
    Timeout(Duration),

    /// Compilation was cancelled by the caller.
    #[error("compilation cancelled")]
    Cancelled,
}

impl Error {
    /// Recovery hint shown alongside the error message.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Discovery { .. } => Some("check the permissions of the installed package tree"),
            Self::Pattern(_) => None,
            Self::Staging { .. } => Some("make sure the project root is writable"),
            Self::Compilation(_) => {
                Some("make sure node, webpack and ts-loader are installed in the project root")
            }
            Self::OutputRead { .. } => Some("the toolchain reported success but emitted no bundle"),
            Self::Cleanup { .. } => Some("remove the leftover codeblock-* directory by hand"),
            Self::Timeout(_) => Some("raise the timeout or simplify the code block"),
            Self::Cancelled => None,
        }
    }

    /// The error message followed by its recovery hint, if any.
    pub fn with_hint(&self) -> String {
        match self.hint() {
            Some(hint) => format!("{self}\n  hint: {hint}"),
            None => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_hint_appends_hint() {
        let err = Error::Compilation("webpack not found".to_string());
        let rendered = err.with_hint();
        assert!(rendered.starts_with("compilation failed: webpack not found"));
        assert!(rendered.contains("hint: "));
    }

    #[test]
    fn test_cancelled_has_no_hint() {
        assert_eq!(Error::Cancelled.with_hint(), "compilation cancelled");
    }
}

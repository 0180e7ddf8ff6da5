//! The bundler seam.
//!
//! The compiler never bundles anything itself. It stages an entry file and
//! hands a [`BundleRequest`] to a [`Toolchain`], which runs to completion,
//! fails hard, or gives up when its cancellation token fires.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::Result;

use super::types::BundleRequest;

/// A bundler the compiler can drive.
pub trait Toolchain: Send + Sync {
    /// Short name used in log messages.
    fn name(&self) -> &str;

    /// Bundle `request.entry` into `request.output_path()`.
    ///
    /// Return `Ok` once the bundler finished, even if it reported
    /// diagnostics; return `Err(Error::Compilation)` only when the
    /// invocation itself failed. When `cancel` fires, stop the bundler,
    /// wait for it to exit and return `Err(Error::Cancelled)`.
    fn bundle(
        &self,
        request: &BundleRequest,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<ToolchainReport>> + Send;
}

/// Severity of a toolchain diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Error,
    Warning,
}

/// A message the toolchain reported while bundling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
}

/// What a finished toolchain run reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolchainReport {
    pub diagnostics: Vec<Diagnostic>,
}

/// Wire shape of the report printed by the bundler driver.
#[derive(Debug, Default, Deserialize)]
struct RawReport {
    #[serde(default)]
    errors: Vec<String>,
    #[serde(default)]
    warnings: Vec<String>,
}

impl ToolchainReport {
    /// Parse a `{ "errors": [...], "warnings": [...] }` report.
    ///
    /// Blank output means no diagnostics. Output that isn't a report is
    /// kept as a single warning rather than discarded.
    pub fn parse(output: &str) -> Self {
        let trimmed = output.trim();
        if trimmed.is_empty() {
            return Self::default();
        }

        let Ok(raw) = serde_json::from_str::<RawReport>(trimmed) else {
            return Self {
                diagnostics: vec![Diagnostic {
                    level: DiagnosticLevel::Warning,
                    message: trimmed.to_string(),
                }],
            };
        };

        let errors = raw.errors.into_iter().map(|message| Diagnostic {
            level: DiagnosticLevel::Error,
            message,
        });
        let warnings = raw.warnings.into_iter().map(|message| Diagnostic {
            level: DiagnosticLevel::Warning,
            message,
        });

        Self {
            diagnostics: errors.chain(warnings).collect(),
        }
    }

    /// Whether any error-level diagnostic was reported.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.level == DiagnosticLevel::Error)
    }
}

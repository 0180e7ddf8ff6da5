//! Ephemeral compiler for code blocks.
//!
//! Each call stages a single-entry project in a fresh directory, runs the
//! toolchain on it, reads back the bundle and removes the directory on every
//! exit path.

use std::time::Instant;

use crate::error::{Error, Result};

use super::language::EntryExtension;
use super::staging::StagingArea;
use super::toolchain::{DiagnosticLevel, Toolchain, ToolchainReport};
use super::types::{BundleRequest, CompileOptions, CompiledBundle, CompilerConfig};
use super::webpack::WebpackToolchain;

/// Compiles code block sources into single-file bundles.
///
/// Holds no state between calls; concurrent calls are isolated by their
/// staging areas alone.
pub struct EphemeralCompiler<T = WebpackToolchain> {
    /// Compiler configuration
    config: CompilerConfig,

    /// Bundler
    toolchain: T,
}

impl EphemeralCompiler<WebpackToolchain> {
    /// Create a compiler backed by the project's webpack installation.
    pub fn new(config: CompilerConfig) -> Result<Self> {
        let toolchain = WebpackToolchain::new(&config)?;
        Ok(Self { config, toolchain })
    }
}

impl<T: Toolchain> EphemeralCompiler<T> {
    /// Create a compiler with a custom toolchain.
    pub fn with_toolchain(config: CompilerConfig, toolchain: T) -> Self {
        Self { config, toolchain }
    }

    /// Get the compiler configuration.
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Get the toolchain.
    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    /// Compile `source` tagged with `language`, using the configured timeout.
    pub async fn compile(&self, source: &str, language: &str) -> Result<CompiledBundle> {
        self.compile_with(source, language, CompileOptions::default())
            .await
    }

    /// Compile with per-call timeout and cancellation.
    ///
    /// The staging area is removed whether the call succeeds, fails, times
    /// out or is cancelled. A cleanup failure is only returned when nothing
    /// failed before it; otherwise it is logged and the earlier error wins.
    pub async fn compile_with(
        &self,
        source: &str,
        language: &str,
        options: CompileOptions,
    ) -> Result<CompiledBundle> {
        if options.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let start = Instant::now();
        let extension = EntryExtension::for_tag(language);
        if let Some(fallback) = extension.fallback() {
            tracing::warn!(
                "Unrecognized language tag {:?}, using extension '{}' ({:?})",
                language,
                extension,
                fallback
            );
        }

        let staging = StagingArea::create(&self.config.staging_root).await?;
        let outcome = self.run_staged(&staging, source, &extension, &options).await;
        let (code, report) = settle(outcome, staging.close().await)?;

        Ok(CompiledBundle {
            code,
            extension,
            diagnostics: report.diagnostics,
            compile_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Write the entry, run the toolchain and read the bundle back.
    async fn run_staged(
        &self,
        staging: &StagingArea,
        source: &str,
        extension: &EntryExtension,
        options: &CompileOptions,
    ) -> Result<(String, ToolchainReport)> {
        let entry = staging.write_entry(extension, source).await?;
        let request = BundleRequest::new(entry, staging, &self.config);

        let report = self.invoke(&request, options).await?;
        for diagnostic in &report.diagnostics {
            match diagnostic.level {
                DiagnosticLevel::Error => {
                    tracing::warn!("{} error: {}", self.toolchain.name(), diagnostic.message)
                }
                DiagnosticLevel::Warning => {
                    tracing::debug!("{} warning: {}", self.toolchain.name(), diagnostic.message)
                }
            }
        }

        let bundle_path = request.output_path();
        let code = tokio::fs::read_to_string(&bundle_path)
            .await
            .map_err(|source| Error::OutputRead {
                path: bundle_path,
                source,
            })?;

        Ok((code, report))
    }

    /// Run the toolchain under the effective timeout.
    async fn invoke(
        &self,
        request: &BundleRequest,
        options: &CompileOptions,
    ) -> Result<ToolchainReport> {
        let cancel = options.cancel.child_token();
        let invocation = self.toolchain.bundle(request, &cancel);
        tokio::pin!(invocation);

        let Some(limit) = options.timeout.or(self.config.timeout) else {
            return invocation.await;
        };

        match tokio::time::timeout(limit, &mut invocation).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    "{} did not finish within {:?}, cancelling",
                    self.toolchain.name(),
                    limit
                );
                cancel.cancel();
                // Let the toolchain stop its process before the staging area goes.
                if let Err(e) = invocation.await
                    && !matches!(e, Error::Cancelled)
                {
                    tracing::debug!("Toolchain error after timeout: {}", e);
                }
                Err(Error::Timeout(limit))
            }
        }
    }
}

/// Merge a staged run's outcome with its cleanup result.
///
/// The earlier error wins; a cleanup error it shadows is only logged.
fn settle<T>(outcome: Result<T>, cleanup: Result<()>) -> Result<T> {
    match (outcome, cleanup) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(cleanup_err)) => Err(cleanup_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(cleanup_err)) => {
            tracing::warn!("{}", cleanup_err);
            Err(err)
        }
    }
}

impl<T> std::fmt::Debug for EphemeralCompiler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralCompiler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

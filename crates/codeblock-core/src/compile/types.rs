//! Common types for the compilation pipeline.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::language::EntryExtension;
use super::staging::{BUNDLE_FILE, StagingArea};
use super::toolchain::Diagnostic;

/// Configuration for the ephemeral compiler.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Project root the toolchain runs in (where webpack is installed).
    pub project_root: PathBuf,

    /// Directory staging areas are created in.
    ///
    /// Keep this inside the project root so snippets can import the
    /// project's installed packages.
    pub staging_root: PathBuf,

    /// Path to `node`. Looked up in PATH when unset.
    pub node_path: Option<PathBuf>,

    /// Loader that transpiles typed sources.
    pub loader: String,

    /// Loader config file, relative to the project root.
    pub loader_config_file: PathBuf,

    /// Pattern (regex source) of files the transpile rule applies to.
    pub transpile_pattern: String,

    /// Pattern (regex source) of vendored paths the transpile rule skips.
    pub vendor_pattern: String,

    /// Default time limit for one toolchain invocation.
    pub timeout: Option<Duration>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            staging_root: PathBuf::from("."),
            node_path: None,
            loader: "ts-loader".to_string(),
            loader_config_file: PathBuf::from("codeblock.tsconfig.json"),
            transpile_pattern: r"\.tsx?$".to_string(),
            vendor_pattern: "node_modules".to_string(),
            timeout: None,
        }
    }
}

impl CompilerConfig {
    /// Create a config that runs and stages inside `root`.
    pub fn for_project(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            staging_root: root.clone(),
            project_root: root,
            ..Self::default()
        }
    }

    /// Set the default time limit.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the staging directory parent.
    pub fn with_staging_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.staging_root = root.into();
        self
    }
}

/// Per-call options for a compilation.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Time limit overriding [`CompilerConfig::timeout`].
    pub timeout: Option<Duration>,

    /// Cancels the in-flight toolchain invocation when triggered.
    pub cancel: CancellationToken,
}

impl CompileOptions {
    /// Options with a time limit.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::default()
        }
    }

    /// Options bound to a cancellation token.
    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            ..Self::default()
        }
    }
}

/// Rule routing typed sources through the transpile loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranspileRule {
    pub test: String,
    pub loader: String,
    pub config_file: PathBuf,
    pub exclude: String,
}

/// Everything a toolchain needs for one bundling run.
///
/// Output shrinking is always off: the bundle must be a literal,
/// debuggable transcription of the entry source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleRequest {
    /// The staged entry file.
    pub entry: PathBuf,

    /// Directory the bundle is written into.
    pub output_dir: PathBuf,

    /// Bundle file name inside `output_dir`.
    pub output_file: String,

    /// Transpile step for typed sources.
    pub transpile: TranspileRule,

    /// Extensions the bundler resolves imports with.
    pub resolve_extensions: Vec<String>,

    /// Always `false`.
    pub minimize: bool,
}

impl BundleRequest {
    /// Build a request for an entry staged in `staging`.
    pub fn new(entry: PathBuf, staging: &StagingArea, config: &CompilerConfig) -> Self {
        Self {
            entry,
            output_dir: staging.output_dir(),
            output_file: BUNDLE_FILE.to_string(),
            transpile: TranspileRule {
                test: config.transpile_pattern.clone(),
                loader: config.loader.clone(),
                config_file: config.loader_config_file.clone(),
                exclude: config.vendor_pattern.clone(),
            },
            resolve_extensions: [".tsx", ".ts", ".js"].map(String::from).to_vec(),
            minimize: false,
        }
    }

    /// Path of the bundle the toolchain is expected to emit.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_file)
    }

    /// Directory holding the entry file.
    pub fn staging_dir(&self) -> &Path {
        self.entry.parent().unwrap_or(Path::new("."))
    }
}

/// Result of a successful compilation.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledBundle {
    /// Full text of the emitted bundle.
    pub code: String,

    /// Entry extension, including whether a fallback was used.
    pub extension: EntryExtension,

    /// Diagnostics the toolchain reported without failing.
    pub diagnostics: Vec<Diagnostic>,

    /// Time spent staging, bundling and reading back, in milliseconds.
    pub compile_time_ms: u64,
}

impl CompiledBundle {
    /// Whether the untyped default extension was substituted.
    pub fn used_default_extension(&self) -> bool {
        self.extension.used_default()
    }
}

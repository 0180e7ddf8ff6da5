//! Ephemeral compilation of code blocks.
//!
//! This module provides:
//! - Language tag → entry extension mapping with observable fallbacks
//! - Staging areas (one throwaway directory per compilation)
//! - The toolchain seam and the webpack implementation
//! - The compiler that ties them together with timeout and cancellation
//!
//! # Architecture
//!
//! ```text
//! source + language
//!     │
//!     ├── EntryExtension ──► StagingArea/index.<ext>
//!     │
//!     └── BundleRequest ──► Toolchain (node + webpack) ──► StagingArea/dist/bundle.js
//!                                                              │
//!                                   CompiledBundle ◄── read ───┘ (staging area removed)
//! ```

mod compiler;
mod language;
mod staging;
mod toolchain;
mod types;
mod webpack;

pub use compiler::EphemeralCompiler;
pub use language::{EntryExtension, ExtensionFallback, SourceLanguage};
pub use staging::{BUNDLE_FILE, OUTPUT_DIR, StagingArea};
pub use toolchain::{Diagnostic, DiagnosticLevel, Toolchain, ToolchainReport};
pub use types::{BundleRequest, CompileOptions, CompiledBundle, CompilerConfig, TranspileRule};
pub use webpack::WebpackToolchain;

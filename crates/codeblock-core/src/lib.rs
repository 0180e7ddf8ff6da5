//! Core engine for runnable documentation code blocks.
//!
//! This crate provides:
//! - Module discovery: ambient declaration and implementation files for a
//!   code block's imports, assembled into an editor module manifest
//! - Ephemeral compilation: a throwaway single-entry project bundled by an
//!   external toolchain, with guaranteed cleanup

pub mod compile;
pub mod discover;
pub mod error;

pub use compile::{
    BundleRequest, CompileOptions, CompiledBundle, CompilerConfig, Diagnostic, DiagnosticLevel,
    EntryExtension, EphemeralCompiler, ExtensionFallback, SourceLanguage, StagingArea, Toolchain,
    ToolchainReport, TranspileRule, WebpackToolchain,
};
pub use discover::{
    CodeBlock, DeclarationFile, ImplementationFile, ModuleFile, ModuleManifestEntry,
    ModuleResolver, ResolverConfig,
};
pub use error::{Error, Result};

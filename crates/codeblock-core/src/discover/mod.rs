//! Module discovery for code block imports.
//!
//! Given the imports a code block declares, this module finds the ambient
//! declaration files (`*.d.ts`) and implementation files (`*.js`) already
//! installed under a package root and assembles them into manifest entries
//! an in-browser editor can load into its type-checking environment.
//!
//! # Layout
//!
//! ```text
//! <package_root>/
//! └── left-pad/
//!     ├── index.d.ts   ──► declare module 'left-pad' { ... }
//!     └── index.js     ──► impls[0]
//! ```

mod resolver;
mod types;

pub use resolver::{ModuleResolver, ResolverConfig};
pub use types::{
    CodeBlock, DeclarationFile, ImplementationFile, ModuleFile, ModuleManifestEntry,
};

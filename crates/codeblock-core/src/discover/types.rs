//! Data types shared between discovery and the page layer.

use serde::{Deserialize, Serialize};

/// A runnable snippet embedded in a guide page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// Declared external imports, in declaration order.
    #[serde(default)]
    pub imports: Vec<String>,

    /// Source text of the snippet.
    #[serde(default)]
    pub source: String,

    /// Source language tag (e.g. `typescript`, `javascript`).
    #[serde(default)]
    pub language: String,
}

impl CodeBlock {
    /// Create a code block that only declares imports.
    pub fn with_imports<I, S>(imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            imports: imports.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// A file discovered on disk for some import name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleFile {
    /// Path of the file as found under the package root.
    pub filename: String,

    /// Raw file content.
    pub content: String,
}

/// An ambient type-declaration file.
pub type DeclarationFile = ModuleFile;

/// A runtime implementation file.
pub type ImplementationFile = ModuleFile;

/// Discovery output for one import name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleManifestEntry {
    /// The import name.
    pub name: String,

    /// Synthesized `declare module '<name>' { ... }` block.
    pub content: String,

    /// Implementation files, one per discovered file, never concatenated.
    pub impls: Vec<ImplementationFile>,
}

impl ModuleManifestEntry {
    /// Build an entry from an import's declaration and implementation files.
    ///
    /// Returns `None` when there are no declaration files: imports without
    /// shippable ambient types are omitted from the manifest.
    pub fn synthesize(
        name: &str,
        declarations: &[DeclarationFile],
        impls: Vec<ImplementationFile>,
    ) -> Option<Self> {
        if declarations.is_empty() {
            return None;
        }

        let body = declarations
            .iter()
            .map(|file| file.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        Some(Self {
            name: name.to_string(),
            content: format!("declare module '{name}' {{\n{body}\n}}"),
            impls,
        })
    }
}

//! Resolve command implementation for Codeblock CLI.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use codeblock_core::discover::{CodeBlock, ModuleResolver, ResolverConfig};

/// Resolve imports and print the manifest as JSON on stdout.
pub fn execute(
    imports: Vec<String>,
    blocks_path: Option<&Path>,
    package_root: PathBuf,
    dedupe: bool,
) -> anyhow::Result<()> {
    let blocks = match blocks_path {
        Some(path) => load_blocks(path)?,
        None => vec![CodeBlock::with_imports(imports)],
    };

    let resolver = ModuleResolver::new(ResolverConfig::new(package_root).with_dedupe(dedupe))?;
    let manifest = resolver.resolve(&blocks)?;

    tracing::info!("Resolved {} modules", manifest.len());
    println!("{}", serde_json::to_string_pretty(&manifest)?);
    Ok(())
}

fn load_blocks(path: &Path) -> anyhow::Result<Vec<CodeBlock>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read code blocks from {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON array of code blocks", path.display()))
}

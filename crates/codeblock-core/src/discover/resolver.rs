//! Resolver that turns code block imports into module manifest entries.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use walkdir::WalkDir;

use crate::error::{Error, Result};

use super::types::{CodeBlock, ModuleFile, ModuleManifestEntry};

/// Glob for ambient declaration files, relative to an import's directory.
const DECLARATION_GLOB: &str = "**/*.d.ts";

/// Glob for implementation files, relative to an import's directory.
const IMPLEMENTATION_GLOB: &str = "**/*.js";

/// Configuration for module discovery.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Root of the installed package tree (usually `node_modules`).
    pub package_root: PathBuf,

    /// Emit only the first entry per import name.
    ///
    /// Off by default: every code block that declares an import gets its
    /// own entry, even when another block already declared it.
    pub dedupe: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            package_root: PathBuf::from("node_modules"),
            dedupe: false,
        }
    }
}

impl ResolverConfig {
    /// Create a config rooted at the given package tree.
    pub fn new(package_root: impl Into<PathBuf>) -> Self {
        Self {
            package_root: package_root.into(),
            ..Self::default()
        }
    }

    /// Enable or disable dedupe-by-name.
    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = dedupe;
        self
    }
}

/// Discovers declaration and implementation files for code block imports.
///
/// The resolver holds no state between calls: every [`resolve`](Self::resolve)
/// re-reads the package tree.
pub struct ModuleResolver {
    config: ResolverConfig,
    declarations: GlobMatcher,
    implementations: GlobMatcher,
}

impl ModuleResolver {
    /// Create a resolver for the given configuration.
    pub fn new(config: ResolverConfig) -> Result<Self> {
        Ok(Self {
            config,
            declarations: compile_glob(DECLARATION_GLOB)?,
            implementations: compile_glob(IMPLEMENTATION_GLOB)?,
        })
    }

    /// Get the resolver configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve every import of every code block, in declaration order.
    ///
    /// Imports without declaration files are skipped. Any read failure
    /// aborts the whole call; no partial manifest is returned.
    pub fn resolve(&self, blocks: &[CodeBlock]) -> Result<Vec<ModuleManifestEntry>> {
        let mut entries = Vec::new();
        let mut seen = HashSet::new();

        for block in blocks {
            for name in &block.imports {
                if self.config.dedupe && seen.contains(name.as_str()) {
                    continue;
                }

                if let Some(entry) = self.resolve_import(name)? {
                    seen.insert(name.as_str());
                    entries.push(entry);
                }
            }
        }

        tracing::debug!(
            "Resolved {} manifest entries from {} code blocks",
            entries.len(),
            blocks.len()
        );

        Ok(entries)
    }

    /// Resolve a single import name.
    pub fn resolve_import(&self, name: &str) -> Result<Option<ModuleManifestEntry>> {
        let Some(module_dir) = self.module_dir(name) else {
            tracing::debug!("Skipping import with non-package name: {}", name);
            return Ok(None);
        };

        let declarations = read_files(find_files(&module_dir, &self.declarations)?)?;
        let impls = read_files(find_files(&module_dir, &self.implementations)?)?;

        tracing::debug!(
            "Import '{}': {} declaration files, {} implementation files",
            name,
            declarations.len(),
            impls.len()
        );

        Ok(ModuleManifestEntry::synthesize(name, &declarations, impls))
    }

    /// Directory of an import under the package root.
    ///
    /// Names that are empty or would leave the package root (absolute paths,
    /// `..` segments) never resolve.
    fn module_dir(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(name);
        let is_package_path = !name.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));

        is_package_path.then(|| self.config.package_root.join(relative))
    }
}

fn compile_glob(pattern: &str) -> Result<GlobMatcher> {
    let glob = GlobBuilder::new(pattern).literal_separator(true).build()?;
    Ok(glob.compile_matcher())
}

/// Recursively collect files under `dir` matching `matcher`, sorted by name.
///
/// Dot-prefixed files and directories below `dir` are never matched.
fn find_files(dir: &Path, matcher: &GlobMatcher) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

    let mut paths = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|err| Error::Discovery {
            path: err.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf),
            source: err.into(),
        })?;

        let path = entry.path();
        let Ok(relative) = path.strip_prefix(dir) else {
            continue;
        };

        if matcher.is_match(relative) && path.is_file() {
            paths.push(entry.into_path());
        }
    }

    Ok(paths)
}

fn is_hidden(name: &OsStr) -> bool {
    name.as_encoded_bytes().starts_with(b".")
}

fn read_files(paths: Vec<PathBuf>) -> Result<Vec<ModuleFile>> {
    paths
        .into_iter()
        .map(|path| match fs::read_to_string(&path) {
            Ok(content) => Ok(ModuleFile {
                filename: path.display().to_string(),
                content,
            }),
            Err(source) => Err(Error::Discovery { path, source }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_default_config() {
        let config = ResolverConfig::default();
        assert_eq!(config.package_root, PathBuf::from("node_modules"));
        assert!(!config.dedupe);
    }

    #[test]
    fn test_declaration_glob_matches_nested_files() {
        let matcher = compile_glob(DECLARATION_GLOB).unwrap();
        assert!(matcher.is_match("index.d.ts"));
        assert!(matcher.is_match("dist/types/index.d.ts"));
        assert!(!matcher.is_match("index.ts"));
        assert!(!matcher.is_match("index.js"));
    }

    #[test]
    fn test_implementation_glob_excludes_declarations() {
        let matcher = compile_glob(IMPLEMENTATION_GLOB).unwrap();
        assert!(matcher.is_match("lib/index.js"));
        assert!(!matcher.is_match("index.d.ts"));
        assert!(!matcher.is_match("index.json"));
    }

    #[test]
    fn test_rejects_escaping_import_names() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        write(temp.path(), "secret/index.d.ts", "export {}");
        let resolver =
            ModuleResolver::new(ResolverConfig::new(temp.path().join("node_modules"))).unwrap();

        assert!(resolver.resolve_import("../secret").unwrap().is_none());
        assert!(resolver.resolve_import("").unwrap().is_none());
    }

    #[test]
    fn test_scoped_package_name() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        write(temp.path(), "@scope/pkg/index.d.ts", "export const x: number;");
        let resolver = ModuleResolver::new(ResolverConfig::new(temp.path())).unwrap();

        let entry = resolver.resolve_import("@scope/pkg").unwrap().unwrap();
        assert_eq!(
            entry.content,
            "declare module '@scope/pkg' {\nexport const x: number;\n}"
        );
    }

    #[test]
    fn test_is_hidden() {
        assert!(is_hidden(OsStr::new(".cache")));
        assert!(is_hidden(OsStr::new(".eslintrc.js")));
        assert!(!is_hidden(OsStr::new("index.d.ts")));
    }

    #[test]
    fn test_directory_named_like_js_is_ignored() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        write(temp.path(), "pkg/index.d.ts", "export {}");
        write(temp.path(), "pkg/weird.js/inner.txt", "not a module");
        let resolver = ModuleResolver::new(ResolverConfig::new(temp.path())).unwrap();

        let entry = resolver.resolve_import("pkg").unwrap().unwrap();
        assert!(entry.impls.is_empty());
    }
}

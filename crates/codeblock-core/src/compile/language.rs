//! Source language tags and entry file extensions.

use std::fmt;

use serde::Serialize;

/// Languages the page layer tags code blocks with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    TypeScript,
    JavaScript,
}

impl SourceLanguage {
    /// Parse a language tag. Tags match exactly, case included.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "typescript" => Some(Self::TypeScript),
            "javascript" => Some(Self::JavaScript),
            _ => None,
        }
    }

    /// Canonical source file extension.
    pub fn extension(self) -> &'static str {
        match self {
            Self::TypeScript => "ts",
            Self::JavaScript => "js",
        }
    }
}

/// Why an entry extension did not come from a recognized language tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionFallback {
    /// The tag itself was used as the extension.
    LiteralTag,
    /// The tag was unusable; the untyped default was used.
    Default,
}

/// Extension of the staged entry file, with how it was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryExtension {
    extension: String,
    fallback: Option<ExtensionFallback>,
}

impl EntryExtension {
    /// Extension used when a tag can't be mapped or used literally.
    pub const DEFAULT: &'static str = "js";

    /// Longest tag accepted as a literal extension.
    const MAX_LITERAL_LEN: usize = 16;

    /// Choose the entry extension for a language tag.
    ///
    /// Known languages map to their canonical extension. Anything else is
    /// used literally when it is a plausible extension (short, ASCII
    /// alphanumeric), and otherwise falls back to [`Self::DEFAULT`]. Never
    /// fails.
    pub fn for_tag(tag: &str) -> Self {
        if let Some(language) = SourceLanguage::from_tag(tag) {
            return Self {
                extension: language.extension().to_string(),
                fallback: None,
            };
        }

        if !tag.is_empty()
            && tag.len() <= Self::MAX_LITERAL_LEN
            && tag.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Self {
                extension: tag.to_string(),
                fallback: Some(ExtensionFallback::LiteralTag),
            };
        }

        Self {
            extension: Self::DEFAULT.to_string(),
            fallback: Some(ExtensionFallback::Default),
        }
    }

    /// The extension without a leading dot.
    pub fn as_str(&self) -> &str {
        &self.extension
    }

    /// How the extension was chosen, if not from a known language.
    pub fn fallback(&self) -> Option<ExtensionFallback> {
        self.fallback
    }

    /// Whether the untyped default was substituted for an unusable tag.
    pub fn used_default(&self) -> bool {
        self.fallback == Some(ExtensionFallback::Default)
    }

    /// Name of the staged entry file.
    pub fn entry_file_name(&self) -> String {
        format!("index.{}", self.extension)
    }
}

impl fmt::Display for EntryExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_languages() {
        let ts = EntryExtension::for_tag("typescript");
        assert_eq!(ts.as_str(), "ts");
        assert_eq!(ts.fallback(), None);

        let js = EntryExtension::for_tag("javascript");
        assert_eq!(js.as_str(), "js");
        assert_eq!(js.fallback(), None);
    }

    #[test]
    fn test_tags_match_exactly() {
        assert_eq!(SourceLanguage::from_tag("TypeScript"), None);
        assert_eq!(SourceLanguage::from_tag(" javascript"), None);

        let upper = EntryExtension::for_tag("JavaScript");
        assert_eq!(upper.as_str(), "JavaScript");
        assert_eq!(upper.fallback(), Some(ExtensionFallback::LiteralTag));

        let padded = EntryExtension::for_tag(" typescript ");
        assert_eq!(padded.as_str(), EntryExtension::DEFAULT);
        assert!(padded.used_default());
    }

    #[test]
    fn test_literal_tag_fallback() {
        let tsx = EntryExtension::for_tag("tsx");
        assert_eq!(tsx.as_str(), "tsx");
        assert_eq!(tsx.fallback(), Some(ExtensionFallback::LiteralTag));
        assert_eq!(tsx.entry_file_name(), "index.tsx");
    }

    #[test]
    fn test_default_fallback() {
        for tag in ["", "   ", "../../etc/passwd", "type script", ".tsx", "a-very-long-language-tag-name"] {
            let ext = EntryExtension::for_tag(tag);
            assert_eq!(ext.as_str(), EntryExtension::DEFAULT, "tag {tag:?}");
            assert!(ext.used_default());
        }
    }

    #[test]
    fn test_fallback_serializes_snake_case() {
        let json = serde_json::to_value(EntryExtension::for_tag("")).unwrap();
        assert_eq!(json["fallback"], "default");
    }
}

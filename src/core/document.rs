//! Document names and rendered output

use std::fmt;
use std::path::{Path, PathBuf};

/// Media type attached to a rendered document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaType(&'static str);

impl MediaType {
    pub const TEXT_PLAIN: MediaType = MediaType::new("text/plain");
    pub const TEXT_HTML: MediaType = MediaType::new("text/html");

    /// Create a media type from a static string
    pub const fn new(value: &'static str) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document rendered for delivery. Recomputed on every read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub media_type: MediaType,
    pub body: Vec<u8>,
}

/// Rejected because the name would escape the flat store root
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid document name: {0:?}")]
pub struct InvalidName(pub String);

/// A document name that is safe to join onto the store root.
///
/// Names are plain base names: no separators, no `..`, no leading dot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentName(String);

impl DocumentName {
    /// Parse a raw name, rejecting anything that could traverse out of the root
    pub fn parse(raw: &str) -> Result<Self, InvalidName> {
        let unsafe_name = raw.is_empty()
            || raw.starts_with('.')
            || raw.contains("..")
            || raw.contains(['/', '\\', '\0'])
            || Path::new(raw).is_absolute();

        if unsafe_name {
            return Err(InvalidName(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extension without the leading dot, if any
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.0).extension().and_then(|ext| ext.to_str())
    }

    /// Full path of this document under `root`
    pub fn path_in(&self, root: &Path) -> PathBuf {
        root.join(&self.0)
    }
}

impl fmt::Display for DocumentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names_parse() {
        for name in ["about.md", "changes.txt", "notes v2.md", "a.b.txt"] {
            assert_eq!(DocumentName::parse(name).unwrap().as_str(), name);
        }
    }

    #[test]
    fn test_traversal_names_rejected() {
        for name in [
            "",
            "../cms.rb",
            "..",
            "a..b.txt",
            "nested/file.txt",
            "/etc/passwd",
            "dir\\file.txt",
            ".hidden.md",
            "nul\0.txt",
            ".md",
            ".txt",
            "draft..md",
        ] {
            assert!(DocumentName::parse(name).is_err(), "accepted {name:?}");
        }
    }

    #[test]
    fn test_extension() {
        let name = DocumentName::parse("history.txt").unwrap();
        assert_eq!(name.extension(), Some("txt"));
        let bare = DocumentName::parse("README").unwrap();
        assert_eq!(bare.extension(), None);
    }

    #[test]
    fn test_media_type_display() {
        assert_eq!(MediaType::TEXT_HTML.to_string(), "text/html");
        assert_eq!(MediaType::TEXT_PLAIN.as_str(), "text/plain");
    }
}

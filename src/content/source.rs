//! Content source resolution and collection naming.

use std::fmt;
use std::path::{Path, PathBuf};

use url::Url;

/// Where a piece of content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// Remote content fetched over HTTP(S).
    Url(Url),
    /// Local file read from disk.
    File(PathBuf),
}

impl ContentSource {
    /// Classify a raw string as a URL or a filesystem path.
    ///
    /// A string counts as a URL only when it parses with both a scheme and a
    /// host; anything else (including bare words and relative paths) is
    /// treated as a path.
    pub fn resolve(input: &str) -> Self {
        if let Ok(url) = Url::parse(input) {
            if !url.scheme().is_empty() && url.has_host() {
                return Self::Url(url);
            }
        }
        Self::File(PathBuf::from(input))
    }

    /// Derive a stable collection name for this source.
    ///
    /// URLs drop the scheme and turn path separators into underscores;
    /// files use the stem with spaces replaced by underscores. The same
    /// source always maps to the same name, so re-runs find the existing
    /// collection instead of re-indexing.
    pub fn collection_name(&self) -> String {
        match self {
            Self::Url(url) => {
                let raw = url.as_str();
                let stripped = raw
                    .strip_prefix("https://")
                    .or_else(|| raw.strip_prefix("http://"))
                    .unwrap_or(raw);
                stripped.replace('/', "_").trim_matches('_').to_string()
            }
            Self::File(path) => Path::new(path)
                .file_stem()
                .map(|stem| stem.to_string_lossy().replace(' ', "_"))
                .unwrap_or_else(|| "unnamed".to_string()),
        }
    }
}

impl fmt::Display for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{url}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_https_url() {
        let source = ContentSource::resolve("https://example.org/docs/guide");
        assert!(matches!(source, ContentSource::Url(_)));
    }

    #[test]
    fn test_resolve_plain_path() {
        let source = ContentSource::resolve("docs/guide.md");
        assert_eq!(source, ContentSource::File(PathBuf::from("docs/guide.md")));
    }

    #[test]
    fn test_resolve_scheme_without_host_is_path() {
        // "C:" parses as a scheme on its own but has no host
        let source = ContentSource::resolve("notes.txt");
        assert!(matches!(source, ContentSource::File(_)));
    }

    #[test]
    fn test_url_collection_name() {
        let source = ContentSource::resolve("https://www.example.org/docs/intro/");
        assert_eq!(source.collection_name(), "www.example.org_docs_intro");
    }

    #[test]
    fn test_url_collection_name_is_stable() {
        let a = ContentSource::resolve("https://example.org/a/b").collection_name();
        let b = ContentSource::resolve("https://example.org/a/b").collection_name();
        assert_eq!(a, b);
    }

    #[test]
    fn test_file_collection_name_uses_stem() {
        let source = ContentSource::resolve("/data/user manual v2.txt");
        assert_eq!(source.collection_name(), "user_manual_v2");
    }
}

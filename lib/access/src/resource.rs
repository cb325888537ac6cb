//! Request path classification.
//!
//! Maps a decoded request path to the kind of resource it names. Pages are
//! identified by a normalized logical id (e.g. `guide_intro.md`) that matches
//! the keys of the generated hash map.

use std::fmt;

/// Extensions served without any access check.
const SAFE_EXTENSIONS: &[&str] = &[
    "css", "woff", "woff2", "ttf", "otf", "png", "jpg", "jpeg", "gif", "svg", "ico", "json", "map",
];

/// Directory holding the generated page chunks, relative to the base URL.
const ASSETS_DIR: &str = "assets/";

/// Chunk suffixes, tried in order.
const CHUNK_SUFFIXES: &[&str] = &[".lean.js", ".js"];

/// An 8-character content hash plus its separating dot.
const HASH_SEGMENT_CHARS: usize = 9;

/// Page served for the bare base URL.
const INDEX_PAGE: &str = "index.md";

/// Category of a resource, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Style sheets, fonts, images, and similar static files.
    SafeAsset,
    /// Shared scripts that do not belong to a single page.
    SafeScript,
    /// A logical page subject to access control.
    Page,
    /// Anything that could not be classified.
    Unknown,
}

impl ResourceKind {
    /// Returns a short lowercase name, used in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SafeAsset => "safe_asset",
            Self::SafeScript => "safe_script",
            Self::Page => "page",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified resource. Only pages carry an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    SafeAsset,
    SafeScript,
    Page(String),
    Unknown,
}

impl Resource {
    /// Returns the resource category.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::SafeAsset => ResourceKind::SafeAsset,
            Self::SafeScript => ResourceKind::SafeScript,
            Self::Page(_) => ResourceKind::Page,
            Self::Unknown => ResourceKind::Unknown,
        }
    }

    /// Returns the normalized page id for page resources.
    #[must_use]
    pub fn page(&self) -> Option<&str> {
        match self {
            Self::Page(page) => Some(page),
            _ => None,
        }
    }

    /// Returns true for resources that bypass access control.
    #[must_use]
    pub fn is_safe(&self) -> bool {
        matches!(self, Self::SafeAsset | Self::SafeScript)
    }
}

/// Classifies request paths relative to a base URL.
#[derive(Debug, Clone)]
pub struct ResourceClassifier {
    base_url: String,
}

impl ResourceClassifier {
    /// Creates a classifier for paths under `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Returns the base URL this classifier matches against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Classifies an already-decoded request path.
    ///
    /// Paths outside the base URL are always [`Resource::Unknown`].
    #[must_use]
    pub fn classify(&self, pathname: &str) -> Resource {
        let Some(relative) = pathname.strip_prefix(self.base_url.as_str()) else {
            return Resource::Unknown;
        };

        if let Some(page) = page_id(relative) {
            return Resource::Page(normalize_page_id(page));
        }
        if has_safe_extension(pathname) {
            return Resource::SafeAsset;
        }
        if pathname.ends_with(".js") && !pathname.contains(".md.") {
            return Resource::SafeScript;
        }
        Resource::Unknown
    }
}

/// Recovers the raw page id from a path relative to the base URL.
fn page_id(relative: &str) -> Option<String> {
    if relative.is_empty() {
        return Some(INDEX_PAGE.to_string());
    }
    if relative.ends_with("html") {
        return Some(format!("{}.md", drop_last_chars(relative, 5)));
    }
    if relative.ends_with("md") {
        return Some(relative.to_string());
    }

    let chunk = relative.strip_prefix(ASSETS_DIR)?;
    CHUNK_SUFFIXES.iter().find_map(|suffix| {
        let page_and_hash = chunk.strip_suffix(suffix)?;
        let page = drop_last_chars(page_and_hash, HASH_SEGMENT_CHARS);
        page.ends_with(".md").then(|| page.to_string())
    })
}

/// Lowercases the id and folds the first path separator into `_`.
///
/// Only the first separator is replaced: `a/b/c.md` becomes `a_b/c.md`.
/// Generated hash-map keys follow the same rule, so deeper separators are
/// kept as-is.
fn normalize_page_id(page: String) -> String {
    page.to_lowercase().replacen('/', "_", 1)
}

fn has_safe_extension(pathname: &str) -> bool {
    pathname
        .rsplit_once('.')
        .is_some_and(|(_, ext)| SAFE_EXTENSIONS.contains(&ext))
}

/// Drops the last `n` characters; yields "" when there are fewer.
fn drop_last_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return s;
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((index, _)) => &s[..index],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "/test/base/path/";

    fn classifier() -> ResourceClassifier {
        ResourceClassifier::new(BASE)
    }

    fn page(path: &str) -> Option<String> {
        classifier().classify(path).page().map(str::to_string)
    }

    #[test]
    fn root_is_index_page() {
        assert_eq!(
            classifier().classify(BASE),
            Resource::Page("index.md".to_string())
        );
    }

    #[test]
    fn html_maps_to_md() {
        assert_eq!(page("/test/base/path/index.html").as_deref(), Some("index.md"));
        assert_eq!(
            page("/test/base/path/guide/setup.html").as_deref(),
            Some("guide_setup.md")
        );
    }

    #[test]
    fn md_is_used_as_is() {
        assert_eq!(
            page("/test/base/path/some-page.md").as_deref(),
            Some("some-page.md")
        );
    }

    #[test]
    fn folder_separator_becomes_underscore() {
        assert_eq!(
            page("/test/base/path/folder/page.md").as_deref(),
            Some("folder_page.md")
        );
    }

    #[test]
    fn only_first_separator_is_replaced() {
        assert_eq!(
            page("/test/base/path/a/b/c.md").as_deref(),
            Some("a_b/c.md")
        );
    }

    #[test]
    fn lean_chunk_maps_to_page() {
        assert_eq!(
            page("/test/base/path/assets/index.md.BcqTVlpu.lean.js").as_deref(),
            Some("index.md")
        );
    }

    #[test]
    fn page_chunk_maps_to_page() {
        assert_eq!(
            page("/test/base/path/assets/other.md.CXRaHTI_.js").as_deref(),
            Some("other.md")
        );
    }

    #[test]
    fn nested_page_chunk_maps_to_normalized_page() {
        assert_eq!(
            page("/test/base/path/assets/guide_intro.md.Ab12Cd34.lean.js").as_deref(),
            Some("guide_intro.md")
        );
    }

    #[test]
    fn page_id_is_lowercased() {
        assert_eq!(
            page("/test/base/path/assets/SOMEPAGE.md.CXRaHTI_.js").as_deref(),
            Some("somepage.md")
        );
    }

    #[test]
    fn classification_is_idempotent_on_page_ids() {
        for path in [
            "/test/base/path/Folder/Page.html",
            "/test/base/path/assets/Guide.md.BcqTVlpu.lean.js",
            "/test/base/path/Notes.md",
        ] {
            let first = page(path).expect("page");
            let second = page(&format!("{BASE}{first}")).expect("page");
            assert_eq!(first, second, "{path}");
        }
    }

    #[test]
    fn outside_base_is_unknown() {
        let classifier = classifier();
        for path in [
            "/",
            "/other/index.html",
            "/other/style.css",
            "/other/app.js",
            "/test/base/pat",
            "",
        ] {
            assert_eq!(classifier.classify(path), Resource::Unknown, "{path}");
        }
    }

    #[test]
    fn static_assets_are_safe() {
        let classifier = classifier();
        for path in [
            "/test/base/path/assets/style.BcqTVlpu.css",
            "/test/base/path/fonts/inter.woff2",
            "/test/base/path/logo.svg",
            "/test/base/path/hashmap.json",
            "/test/base/path/assets/app.js.map",
        ] {
            assert_eq!(classifier.classify(path), Resource::SafeAsset, "{path}");
        }
    }

    #[test]
    fn shared_scripts_are_safe() {
        let classifier = classifier();
        assert_eq!(
            classifier.classify("/test/base/path/assets/app.BcqTVlpu.js"),
            Resource::SafeScript
        );
        assert_eq!(
            classifier.classify("/test/base/path/assets/chunks/framework.Dq2yMvNB.js"),
            Resource::SafeScript
        );
    }

    #[test]
    fn malformed_page_chunk_is_unknown() {
        // Hash segment too short: not a page, and `.md.` keeps it out of safe scripts.
        assert_eq!(
            classifier().classify("/test/base/path/assets/foo.md.abc.js"),
            Resource::Unknown
        );
    }

    #[test]
    fn unrecognized_paths_are_unknown() {
        let classifier = classifier();
        assert_eq!(classifier.classify("/test/base/path/guide/"), Resource::Unknown);
        assert_eq!(classifier.classify("/test/base/path/data.bin"), Resource::Unknown);
    }

    #[test]
    fn kinds_and_payloads() {
        assert_eq!(Resource::SafeAsset.kind(), ResourceKind::SafeAsset);
        assert!(Resource::SafeAsset.page().is_none());
        assert!(Resource::SafeScript.is_safe());
        assert!(!Resource::Unknown.is_safe());
        assert_eq!(Resource::Page("a.md".to_string()).kind().to_string(), "page");
    }

    #[test]
    fn root_base_url() {
        let classifier = ResourceClassifier::new("/");
        assert_eq!(classifier.classify("/"), Resource::Page("index.md".to_string()));
        assert_eq!(
            classifier.classify("/Guide/Intro.html"),
            Resource::Page("guide_intro.md".to_string())
        );
    }

    #[test]
    fn drop_last_chars_handles_short_and_multibyte_input() {
        assert_eq!(drop_last_chars("abc", 5), "");
        assert_eq!(drop_last_chars("héllo.html", 5), "héllo");
        assert_eq!(drop_last_chars("abc", 0), "abc");
    }
}

//! Page access-control lookup from build artifacts.
//!
//! The site generator emits a `hashmap.json` (page id to content hash) and,
//! for every page, a chunk `assets/<page>.<hash>.lean.js` whose source embeds
//! the page metadata as `JSON.parse('<escaped json>')`. The roles allowed to
//! read a page come from `frontmatter.role` in that metadata.
//!
//! Lookups never fail loudly: anything missing or malformed yields `None`,
//! which the policy treats as deny. The hash map and the chunk are re-read on
//! every call; nothing is cached.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, instrument, warn};

use crate::config::AccessConfig;
use crate::role::RoleSet;

/// Opening of the embedded metadata literal in generated chunks.
const JSON_PARSE_OPEN: &str = "JSON.parse('";

/// Name of the page-to-hash map, relative to the site directory.
const HASH_MAP_FILE: &str = "hashmap.json";

/// Roles required to read a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAccessControlEntry {
    /// Normalized page id.
    pub page: String,
    /// Roles allowed to read the page.
    pub roles: RoleSet,
}

/// Resolves the access-control entry of a page.
#[async_trait]
pub trait PageAccessControlLookup: Send + Sync {
    /// Returns the page's entry, or `None` when its access control is unknown.
    async fn get(&self, page: &str) -> Option<PageAccessControlEntry>;
}

/// Page metadata embedded in a generated chunk.
///
/// Only `frontmatter` is required; the remaining fields are informational.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub relative_path: String,
    pub frontmatter: serde_json::Map<String, Value>,
}

impl PageMetadata {
    /// Returns the roles declared in `frontmatter.role`.
    ///
    /// An absent or null role falls back to `fallback_role`; a single string
    /// is one role. Any other shape is unusable and yields `None`.
    #[must_use]
    pub fn roles(&self, fallback_role: &str) -> Option<RoleSet> {
        match self.frontmatter.get("role") {
            None | Some(Value::Null) => Some(RoleSet::single(fallback_role)),
            Some(Value::String(role)) => Some(RoleSet::single(role.as_str())),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str())
                .collect::<Option<RoleSet>>(),
            Some(_) => None,
        }
    }
}

/// Extracts the page metadata embedded in a chunk's source text.
///
/// Each `JSON.parse('...')` literal is tried in order; the first one that
/// decodes as [`PageMetadata`] wins.
#[must_use]
pub fn parse_page_metadata(source: &str) -> Option<PageMetadata> {
    let mut rest = source;
    while let Some(start) = rest.find(JSON_PARSE_OPEN) {
        let (literal, after) = read_quoted_literal(&rest[start + JSON_PARSE_OPEN.len()..])?;
        match serde_json::from_str::<PageMetadata>(&literal) {
            Ok(metadata) => return Some(metadata),
            Err(e) => debug!(error = %e, "embedded literal is not page metadata"),
        }
        rest = after;
    }
    None
}

/// Reads a single-quoted JS string body, undoing its escapes.
///
/// Returns the decoded text and the source following the closing quote.
fn read_quoted_literal(source: &str) -> Option<(String, &str)> {
    let mut decoded = String::new();
    let mut chars = source.char_indices();
    while let Some((index, c)) = chars.next() {
        match c {
            '\'' => return Some((decoded, &source[index + 1..])),
            '\\' => {
                let (_, escaped) = chars.next()?;
                match escaped {
                    'n' => decoded.push('\n'),
                    'r' => decoded.push('\r'),
                    't' => decoded.push('\t'),
                    // Left for the JSON decoder, which pairs surrogates and
                    // keeps escaped quotes inside their string.
                    'u' => {
                        let hex: String = chars.by_ref().take(4).map(|(_, h)| h).collect();
                        if hex.len() != 4 || !hex.chars().all(|h| h.is_ascii_hexdigit()) {
                            return None;
                        }
                        decoded.push_str("\\u");
                        decoded.push_str(&hex);
                    }
                    other => decoded.push(other),
                }
            }
            other => decoded.push(other),
        }
    }
    None
}

/// Looks up page access control in the generated site directory.
#[derive(Debug, Clone)]
pub struct SiteAssetLookup {
    site_dir: PathBuf,
    fallback_role: String,
}

impl SiteAssetLookup {
    /// Creates a lookup over the site generated under `site_root`.
    ///
    /// Artifacts are expected at `<site_root><base_url>`.
    #[must_use]
    pub fn new(site_root: impl AsRef<Path>, config: &AccessConfig) -> Self {
        Self {
            site_dir: site_root
                .as_ref()
                .join(config.base_url().trim_start_matches('/')),
            fallback_role: config.fallback_role().to_string(),
        }
    }

    /// Returns the directory holding `hashmap.json` and `assets/`.
    #[must_use]
    pub fn site_dir(&self) -> &Path {
        &self.site_dir
    }

    fn chunk_path(&self, page: &str, hash: &str) -> PathBuf {
        self.site_dir
            .join("assets")
            .join(format!("{page}.{hash}.lean.js"))
    }

    async fn load_hash_map(&self) -> Option<HashMap<String, String>> {
        let path = self.site_dir.join(HASH_MAP_FILE);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(path = %path.display(), error = %e, "hash map unreadable");
                return None;
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(map) => Some(map),
            Err(e) => {
                error!(path = %path.display(), error = %e, "hash map malformed");
                None
            }
        }
    }
}

#[async_trait]
impl PageAccessControlLookup for SiteAssetLookup {
    #[instrument(skip(self))]
    async fn get(&self, page: &str) -> Option<PageAccessControlEntry> {
        let hashes = self.load_hash_map().await?;
        let Some(hash) = hashes.get(page) else {
            debug!("page has no hash entry");
            return None;
        };

        // The page id matched a generated key, so it is safe to use in a path.
        let chunk_path = self.chunk_path(page, hash);
        let source = match tokio::fs::read_to_string(&chunk_path).await {
            Ok(source) => source,
            Err(e) => {
                error!(path = %chunk_path.display(), error = %e, "page chunk unreadable");
                return None;
            }
        };

        let Some(metadata) = parse_page_metadata(&source) else {
            error!(path = %chunk_path.display(), "page metadata not found in chunk");
            return None;
        };

        let Some(roles) = metadata.roles(&self.fallback_role) else {
            warn!(path = %chunk_path.display(), "frontmatter role has an unusable shape");
            return None;
        };

        debug!(roles = ?roles, "resolved page access control");
        Some(PageAccessControlEntry {
            page: page.to_string(),
            roles,
        })
    }
}

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Errors from loading an external catalog file.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("reading catalog {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing catalog {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Browsers tracked by support targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    Chrome,
    Edge,
    Firefox,
    Safari,
}

impl Browser {
    pub const ALL: [Browser; 4] = [Browser::Chrome, Browser::Edge, Browser::Firefox, Browser::Safari];

    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chrome => "chrome",
            Browser::Edge => "edge",
            Browser::Firefox => "firefox",
            Browser::Safari => "safari",
        }
    }
}

impl std::fmt::Display for Browser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-browser supported-since versions. A missing entry means no known
/// support; a value that does not parse as a number (e.g. "preview") counts
/// as unusable when scoring.
pub type SupportMatrix = BTreeMap<Browser, String>;

/// One web-platform feature as the checker sees it: identity, display
/// metadata, feature-group membership, support matrix, and the source
/// tokens the scanner looks for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    /// Stable feature id, e.g. "has-selector"
    pub id: String,

    /// Human-readable name, e.g. ":has() selector"
    pub name: String,

    /// Short description shown in detail views
    #[serde(default)]
    pub description: String,

    /// Feature-group names this feature belongs to (may be empty)
    #[serde(default)]
    pub groups: Vec<String>,

    /// Per-browser supported-since versions
    pub support: SupportMatrix,

    /// Documentation link (MDN or similar)
    #[serde(default)]
    pub docs_url: Option<String>,

    /// Literal source tokens whose presence indicates use of the feature
    pub tokens: Vec<String>,
}

/// Lookup seam between the session core and whatever supplies feature data.
/// Redirect resolution happens behind this trait; callers only ever see a
/// resolved feature or nothing.
pub trait FeatureLookup {
    fn lookup(&self, id: &str) -> Option<&Feature>;
}

/// Redirect entry for feature ids that were renamed or split upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Redirect {
    /// Feature id was renamed; follow to the new id
    Moved(String),
    /// Feature was split into several ids; the first is the canonical one
    Split(Vec<String>),
}

/// The static feature catalog: id → feature, plus redirects for ids that
/// moved or split between catalog revisions.
#[derive(Debug, Clone, Default)]
pub struct FeatureCatalog {
    features: BTreeMap<String, Feature>,
    redirects: BTreeMap<String, Redirect>,
}

/// On-disk catalog format (JSON).
#[derive(Debug, Deserialize)]
struct CatalogFile {
    features: Vec<Feature>,
    #[serde(default)]
    redirects: BTreeMap<String, Redirect>,
}

// Redirect chains in real catalog data are one or two hops; anything deeper
// is treated as a data error and the lookup gives up.
const MAX_REDIRECT_HOPS: usize = 4;

impl FeatureCatalog {
    pub fn new(features: Vec<Feature>, redirects: BTreeMap<String, Redirect>) -> Self {
        let features = features.into_iter().map(|f| (f.id.clone(), f)).collect();
        FeatureCatalog { features, redirects }
    }

    /// Load a catalog from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: CatalogFile = serde_json::from_str(&content).map_err(|source| {
            CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        debug!("Loaded {} features from {}", file.features.len(), path.display());
        Ok(FeatureCatalog::new(file.features, file.redirects))
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// All features in id order.
    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.features.values()
    }

    /// The catalog that ships with the binary: a table of recently-shipped
    /// web-platform features with their supported-since versions.
    pub fn builtin() -> Self {
        fn support(chrome: &str, edge: &str, firefox: &str, safari: &str) -> SupportMatrix {
            let mut m = SupportMatrix::new();
            if !chrome.is_empty() {
                m.insert(Browser::Chrome, chrome.to_string());
            }
            if !edge.is_empty() {
                m.insert(Browser::Edge, edge.to_string());
            }
            if !firefox.is_empty() {
                m.insert(Browser::Firefox, firefox.to_string());
            }
            if !safari.is_empty() {
                m.insert(Browser::Safari, safari.to_string());
            }
            m
        }

        fn feature(
            id: &str,
            name: &str,
            description: &str,
            groups: &[&str],
            support: SupportMatrix,
            docs_url: &str,
            tokens: &[&str],
        ) -> Feature {
            Feature {
                id: id.to_string(),
                name: name.to_string(),
                description: description.to_string(),
                groups: groups.iter().map(|g| g.to_string()).collect(),
                support,
                docs_url: if docs_url.is_empty() { None } else { Some(docs_url.to_string()) },
                tokens: tokens.iter().map(|t| t.to_string()).collect(),
            }
        }

        let features = vec![
            feature(
                "has-selector",
                ":has() selector",
                "Relational pseudo-class matching elements by their descendants",
                &["CSS Selectors"],
                support("105", "105", "121", "15.4"),
                "https://developer.mozilla.org/docs/Web/CSS/:has",
                &[":has("],
            ),
            feature(
                "container-queries",
                "Container queries",
                "Style elements based on the size of an ancestor container",
                &["CSS Layout"],
                support("105", "105", "110", "16"),
                "https://developer.mozilla.org/docs/Web/CSS/CSS_containment/Container_queries",
                &["@container", "container-type:", "container-name:"],
            ),
            feature(
                "subgrid",
                "Subgrid",
                "Nested grids that share tracks with their parent grid",
                &["CSS Layout"],
                support("117", "117", "71", "16"),
                "https://developer.mozilla.org/docs/Web/CSS/CSS_grid_layout/Subgrid",
                &["subgrid"],
            ),
            feature(
                "nesting",
                "CSS nesting",
                "Nest style rules inside other style rules",
                &["CSS Syntax"],
                support("120", "120", "117", "17.2"),
                "https://developer.mozilla.org/docs/Web/CSS/CSS_nesting",
                &["&:hover", "&::before", "&::after"],
            ),
            feature(
                "text-wrap-balance",
                "text-wrap: balance",
                "Balance line lengths in short runs of text",
                &["CSS Text"],
                support("114", "114", "121", "17.5"),
                "https://developer.mozilla.org/docs/Web/CSS/text-wrap",
                &["text-wrap: balance", "text-wrap:balance"],
            ),
            feature(
                "dialog",
                "<dialog> element",
                "Native modal and non-modal dialog boxes",
                &["HTML Elements"],
                support("37", "79", "98", "15.4"),
                "https://developer.mozilla.org/docs/Web/HTML/Element/dialog",
                &["<dialog", "showModal("],
            ),
            feature(
                "popover",
                "Popover API",
                "Declarative popovers via the popover attribute",
                &["HTML Elements"],
                support("114", "114", "125", "17"),
                "https://developer.mozilla.org/docs/Web/API/Popover_API",
                &["popover=", "showPopover(", "hidePopover("],
            ),
            feature(
                "structured-clone",
                "structuredClone()",
                "Deep-copy JavaScript values including transferable objects",
                &["JavaScript APIs"],
                support("98", "98", "94", "15.4"),
                "https://developer.mozilla.org/docs/Web/API/structuredClone",
                &["structuredClone("],
            ),
            feature(
                "array-at",
                "Array.prototype.at()",
                "Relative indexing for arrays and strings",
                &["JavaScript Syntax"],
                support("92", "92", "90", "15.4"),
                "https://developer.mozilla.org/docs/Web/JavaScript/Reference/Global_Objects/Array/at",
                &[".at(-"],
            ),
            feature(
                "object-groupby",
                "Object.groupBy()",
                "Group iterable items by a callback-derived key",
                &["JavaScript Syntax"],
                support("117", "117", "119", "17.4"),
                "https://developer.mozilla.org/docs/Web/JavaScript/Reference/Global_Objects/Object/groupBy",
                &["Object.groupBy(", "Map.groupBy("],
            ),
            feature(
                "view-transitions",
                "View Transitions",
                "Animated transitions between DOM states",
                &["Web APIs", "CSS Animation"],
                support("111", "111", "", "18"),
                "https://developer.mozilla.org/docs/Web/API/View_Transition_API",
                &["startViewTransition(", "::view-transition"],
            ),
            feature(
                "url-pattern",
                "URLPattern",
                "Pattern matching for URLs with route-style syntax",
                &["Web APIs"],
                support("95", "95", "", "26"),
                "https://developer.mozilla.org/docs/Web/API/URLPattern",
                &["new URLPattern("],
            ),
            feature(
                "clipboard-api",
                "Async Clipboard API",
                "Read and write the system clipboard asynchronously",
                &["Web APIs"],
                support("66", "79", "125", "13.1"),
                "https://developer.mozilla.org/docs/Web/API/Clipboard_API",
                &["navigator.clipboard"],
            ),
            feature(
                "dsd",
                "Declarative shadow DOM",
                "Server-rendered shadow roots via the shadowrootmode attribute",
                &["HTML Elements", "Web Components"],
                support("111", "111", "123", "16.4"),
                "https://developer.mozilla.org/docs/Web/HTML/Element/template#shadowrootmode",
                &["shadowrootmode="],
            ),
        ];

        let mut redirects = BTreeMap::new();
        // Historical ids kept so stale scanner data still resolves.
        redirects.insert(
            "css-has".to_string(),
            Redirect::Moved("has-selector".to_string()),
        );
        redirects.insert(
            "group-by".to_string(),
            Redirect::Split(vec!["object-groupby".to_string()]),
        );

        FeatureCatalog::new(features, redirects)
    }
}

impl FeatureLookup for FeatureCatalog {
    /// Look up a feature by id, following moved/split redirects. A split
    /// resolves to its first (canonical) part.
    fn lookup(&self, id: &str) -> Option<&Feature> {
        let mut current = id;
        for _ in 0..MAX_REDIRECT_HOPS {
            if let Some(feature) = self.features.get(current) {
                return Some(feature);
            }
            match self.redirects.get(current) {
                Some(Redirect::Moved(to)) => current = to,
                Some(Redirect::Split(parts)) => match parts.first() {
                    Some(first) => current = first,
                    None => return None,
                },
                None => return None,
            }
        }
        debug!("Redirect chain too deep for feature id '{}'", id);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_resolves_direct_ids() {
        let catalog = FeatureCatalog::builtin();
        let feature = catalog.lookup("has-selector").unwrap();
        assert_eq!(feature.name, ":has() selector");
        assert!(!catalog.is_empty());
    }

    #[test]
    fn moved_redirect_resolves_to_new_id() {
        let catalog = FeatureCatalog::builtin();
        let feature = catalog.lookup("css-has").unwrap();
        assert_eq!(feature.id, "has-selector");
    }

    #[test]
    fn split_redirect_resolves_to_first_part() {
        let catalog = FeatureCatalog::builtin();
        let feature = catalog.lookup("group-by").unwrap();
        assert_eq!(feature.id, "object-groupby");
    }

    #[test]
    fn unknown_id_is_not_found() {
        let catalog = FeatureCatalog::builtin();
        assert!(catalog.lookup("definitely-not-a-feature").is_none());
    }

    #[test]
    fn redirect_cycle_terminates() {
        let mut redirects = BTreeMap::new();
        redirects.insert("a".to_string(), Redirect::Moved("b".to_string()));
        redirects.insert("b".to_string(), Redirect::Moved("a".to_string()));
        let catalog = FeatureCatalog::new(Vec::new(), redirects);
        assert!(catalog.lookup("a").is_none());
    }
}

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{FeatureLookup, SupportMatrix};
use crate::target::Target;
use crate::verdict::{score, Verdict};

/// Zero-based source position span of a matched token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

/// What the scanner emits: one occurrence of a feature token at a location,
/// before the catalog and target have been consulted.
#[derive(Debug, Clone)]
pub struct RawOccurrence {
    /// Display path, also the file's identity
    pub file: String,
    pub feature_id: String,
    pub token: String,
    pub range: SourceRange,
    pub line_text: String,
}

/// One occurrence of a recognized feature token at a location in a file,
/// with the feature metadata it needs for display and re-scoring baked in.
/// Findings are created in bulk by a scan and replaced wholesale by the
/// next one; the session never patches them incrementally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// File identity and display path
    pub file: String,

    /// Resolved feature id (post-redirect)
    pub feature_id: String,

    /// Human-readable feature name
    pub feature_name: String,

    /// Feature-group names the feature belongs to
    pub groups: Vec<String>,

    /// Support matrix snapshot, kept so a target change can re-score
    /// without another catalog lookup
    pub support: SupportMatrix,

    /// Documentation link for the detail view
    pub docs_url: Option<String>,

    /// The matched token text
    pub token: String,

    /// Where the token was found
    pub range: SourceRange,

    /// The raw source line, for snippet display
    pub line_text: String,

    /// Classification against the active target
    pub verdict: Verdict,
}

impl Finding {
    /// Deterministic identity: a pure function of current data, recomputed
    /// on demand and never stored as a persisted handle. Stable across
    /// re-scans as long as the occurrence itself is unchanged.
    pub fn key(&self) -> String {
        format!(
            "{}::{}::{}::{}",
            self.file, self.feature_id, self.range.start_line, self.range.start_col
        )
    }

    /// Build a finding from a raw scanner occurrence. Returns `None` when
    /// the feature id is unknown to the catalog; unknown occurrences are
    /// dropped, never surfaced as errors.
    pub fn from_raw(
        raw: RawOccurrence,
        catalog: &dyn FeatureLookup,
        target: &Target,
    ) -> Option<Finding> {
        let Some(feature) = catalog.lookup(&raw.feature_id) else {
            debug!("Dropping occurrence of unknown feature '{}'", raw.feature_id);
            return None;
        };
        let verdict = score(&feature.support, target);
        Some(Finding {
            file: raw.file,
            feature_id: feature.id.clone(),
            feature_name: feature.name.clone(),
            groups: feature.groups.clone(),
            support: feature.support.clone(),
            docs_url: feature.docs_url.clone(),
            token: raw.token,
            range: raw.range,
            line_text: raw.line_text,
            verdict,
        })
    }

    /// Re-score against a new target. Called for every finding when the
    /// active target changes; verdicts are not re-derived on every render.
    pub fn rescore(&mut self, target: &Target) {
        self.verdict = score(&self.support, target);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::catalog::Browser;

    /// A finding with a chosen verdict, for exercising the session core
    /// without going through the catalog.
    pub fn finding(file: &str, feature_id: &str, line: u32, col: u32, verdict: Verdict) -> Finding {
        finding_with(file, feature_id, feature_id, "tok", line, col, verdict)
    }

    pub fn finding_with(
        file: &str,
        feature_id: &str,
        feature_name: &str,
        token: &str,
        line: u32,
        col: u32,
        verdict: Verdict,
    ) -> Finding {
        Finding {
            file: file.to_string(),
            feature_id: feature_id.to_string(),
            feature_name: feature_name.to_string(),
            groups: Vec::new(),
            support: [(Browser::Chrome, "120".to_string())].into_iter().collect(),
            docs_url: None,
            token: token.to_string(),
            range: SourceRange {
                start_line: line,
                start_col: col,
                end_line: line,
                end_col: col + token.len() as u32,
            },
            line_text: format!("line with {token}"),
            verdict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::finding;
    use super::*;
    use crate::catalog::FeatureCatalog;

    #[test]
    fn key_is_stable_and_distinct() {
        let a = finding("src/app.css", "has-selector", 3, 7, Verdict::Safe);
        let b = finding("src/app.css", "has-selector", 3, 8, Verdict::Safe);
        assert_eq!(a.key(), "src/app.css::has-selector::3::7");
        assert_eq!(a.key(), a.clone().key());
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn from_raw_resolves_redirected_ids() {
        let catalog = FeatureCatalog::builtin();
        let raw = RawOccurrence {
            file: "style.css".to_string(),
            feature_id: "css-has".to_string(),
            token: ":has(".to_string(),
            range: SourceRange { start_line: 0, start_col: 4, end_line: 0, end_col: 9 },
            line_text: "div:has(> img) { }".to_string(),
        };
        let finding = Finding::from_raw(raw, &catalog, &Target::enterprise()).unwrap();
        assert_eq!(finding.feature_id, "has-selector");
        // :has() support (105/105/121/15.4) sits below the enterprise
        // chrome/edge minimums of 114.
        assert_eq!(finding.verdict, Verdict::Blocked);
    }

    #[test]
    fn from_raw_drops_unknown_features() {
        let catalog = FeatureCatalog::builtin();
        let raw = RawOccurrence {
            file: "style.css".to_string(),
            feature_id: "no-such-feature".to_string(),
            token: "x".to_string(),
            range: SourceRange { start_line: 0, start_col: 0, end_line: 0, end_col: 1 },
            line_text: "x".to_string(),
        };
        assert!(Finding::from_raw(raw, &catalog, &Target::modern()).is_none());
    }

    #[test]
    fn rescore_follows_the_target() {
        let catalog = FeatureCatalog::builtin();
        let raw = RawOccurrence {
            file: "app.js".to_string(),
            feature_id: "object-groupby".to_string(),
            token: "Object.groupBy(".to_string(),
            range: SourceRange { start_line: 1, start_col: 0, end_line: 1, end_col: 15 },
            line_text: "Object.groupBy(items, keyOf)".to_string(),
        };
        // Support 117/117/119/17.4 clears the enterprise minimums but not
        // the modern ones.
        let mut finding = Finding::from_raw(raw, &catalog, &Target::enterprise()).unwrap();
        assert_eq!(finding.verdict, Verdict::Safe);
        finding.rescore(&Target::modern());
        assert_eq!(finding.verdict, Verdict::Blocked);
    }
}

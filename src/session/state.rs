use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::finding::Finding;
use crate::verdict::Verdict;

use super::grouping::group_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Severity,
    File,
}

/// Which detail overlay is open, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum DetailSelection {
    Issue { id: String },
    File { uri: String },
}

/// The mutable session view state: filters, sort, selection, detail overlay
/// and expansion flags. Mutated only through the transition methods below;
/// everything the display shows is derived from it plus the finding list.
///
/// Invariants, restored by `revalidate` after every mutation:
/// - a selected issue implies the selected file is that issue's file
/// - selection and detail references always resolve in the visible set
/// - collapsed entries only name files/groups present in the finding set
/// - the severity filter is never empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    /// Normalized: trimmed and case-folded
    pub search_query: String,
    pub severity_filter: BTreeSet<Verdict>,
    pub sort_order: SortOrder,
    /// Collapse occurrences of one (feature, token) pair into one row
    pub grouped_display: bool,
    pub selected_issue_id: Option<String>,
    pub selected_file_uri: Option<String>,
    pub detail: Option<DetailSelection>,
    pub collapsed_file_uris: BTreeSet<String>,
    pub collapsed_group_ids: BTreeSet<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            search_query: String::new(),
            severity_filter: full_severity_set(),
            sort_order: SortOrder::Severity,
            grouped_display: false,
            selected_issue_id: None,
            selected_file_uri: None,
            detail: None,
            collapsed_file_uris: BTreeSet::new(),
            collapsed_group_ids: BTreeSet::new(),
        }
    }
}

pub fn full_severity_set() -> BTreeSet<Verdict> {
    Verdict::ALL.into_iter().collect()
}

fn resolve<'a>(visible: &'a [Finding], key: &str) -> Option<&'a Finding> {
    visible.iter().find(|f| f.key() == key)
}

fn has_file(visible: &[Finding], uri: &str) -> bool {
    visible.iter().any(|f| f.file == uri)
}

impl ViewState {
    pub fn set_search(&mut self, raw: &str) {
        self.search_query = raw.trim().to_lowercase();
    }

    /// An empty selection is replaced by the full default set.
    pub fn set_severity(&mut self, verdicts: Vec<Verdict>) {
        let set: BTreeSet<Verdict> = verdicts.into_iter().collect();
        self.severity_filter = if set.is_empty() { full_severity_set() } else { set };
    }

    pub fn clear_filters(&mut self) {
        self.search_query.clear();
        self.severity_filter = full_severity_set();
    }

    fn clear_selection(&mut self) {
        self.selected_issue_id = None;
        self.selected_file_uri = None;
        self.detail = None;
    }

    /// Select an issue by key. A key that no longer resolves clears the
    /// selection instead; findings can disappear between the moment an
    /// event was queued and the moment it is handled.
    pub fn select_issue(&mut self, key: &str, visible: &[Finding]) {
        match resolve(visible, key) {
            Some(found) => {
                self.selected_issue_id = Some(key.to_string());
                self.selected_file_uri = Some(found.file.clone());
                self.detail = None;
            }
            None => self.clear_selection(),
        }
    }

    pub fn select_file(&mut self, uri: &str, visible: &[Finding]) {
        if has_file(visible, uri) {
            self.selected_file_uri = Some(uri.to_string());
            self.selected_issue_id = None;
            self.detail = None;
        } else {
            self.clear_selection();
        }
    }

    /// Select and open the issue detail overlay; the issue's file group is
    /// expanded so the selection is on screen.
    pub fn open_issue_detail(&mut self, key: &str, visible: &[Finding]) {
        match resolve(visible, key) {
            Some(found) => {
                self.collapsed_file_uris.remove(&found.file);
                self.selected_issue_id = Some(key.to_string());
                self.selected_file_uri = Some(found.file.clone());
                self.detail = Some(DetailSelection::Issue { id: key.to_string() });
            }
            None => self.clear_selection(),
        }
    }

    pub fn open_file_detail(&mut self, uri: &str, visible: &[Finding]) {
        if has_file(visible, uri) {
            self.collapsed_file_uris.remove(uri);
            self.selected_file_uri = Some(uri.to_string());
            self.selected_issue_id = None;
            self.detail = Some(DetailSelection::File { uri: uri.to_string() });
        } else {
            self.clear_selection();
        }
    }

    /// Closes the overlay and drops both selection fields unconditionally.
    pub fn close_detail(&mut self) {
        self.clear_selection();
    }

    /// Expanding targets a file currently on screen; a collapse request is
    /// recorded even when the file is filtered out, so clearing the filter
    /// brings it back collapsed. Entries for files no longer in the finding
    /// set are pruned by `revalidate`.
    pub fn set_file_expansion(&mut self, uri: &str, expanded: bool, visible: &[Finding]) {
        if expanded {
            if has_file(visible, uri) {
                self.collapsed_file_uris.remove(uri);
            }
        } else {
            self.collapsed_file_uris.insert(uri.to_string());
        }
    }

    pub fn set_group_expansion(&mut self, id: &str, expanded: bool, visible: &[Finding]) {
        if expanded {
            if visible.iter().any(|f| group_id(f) == id) {
                self.collapsed_group_ids.remove(id);
            }
        } else {
            self.collapsed_group_ids.insert(id.to_string());
        }
    }

    /// Restore the invariants after anything that can shrink the visible
    /// set: new scan results, a filter change, a target change. Runs before
    /// grouping and statistics so they always see a consistent selection.
    ///
    /// Collapsed-state pruning checks the full finding set, not the visible
    /// one, so a collapsed file that is merely filtered out stays collapsed
    /// and unchanged files keep their flag across a re-scan.
    pub fn revalidate(&mut self, visible: &[Finding], all: &[Finding]) {
        if self.severity_filter.is_empty() {
            self.severity_filter = full_severity_set();
        }

        if let Some(id) = self.selected_issue_id.clone() {
            match resolve(visible, &id) {
                Some(found) => self.selected_file_uri = Some(found.file.clone()),
                None => {
                    self.selected_issue_id = None;
                    if matches!(self.detail, Some(DetailSelection::Issue { .. })) {
                        self.detail = None;
                    }
                }
            }
        }

        if let Some(uri) = self.selected_file_uri.clone() {
            if !has_file(visible, &uri) {
                self.selected_file_uri = None;
                if matches!(self.detail, Some(DetailSelection::File { .. })) {
                    self.detail = None;
                }
            }
        }

        // A dangling overlay can outlive the checks above when it was set
        // without a matching selection; re-check it directly.
        let detail_ok = match &self.detail {
            Some(DetailSelection::Issue { id }) => resolve(visible, id).is_some(),
            Some(DetailSelection::File { uri }) => has_file(visible, uri),
            None => true,
        };
        if !detail_ok {
            self.detail = None;
        }

        let files: BTreeSet<&str> = all.iter().map(|f| f.file.as_str()).collect();
        self.collapsed_file_uris.retain(|uri| files.contains(uri.as_str()));

        let groups: BTreeSet<String> = all.iter().map(group_id).collect();
        self.collapsed_group_ids.retain(|id| groups.contains(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::test_support::finding;
    use pretty_assertions::assert_eq;

    fn sample() -> Vec<Finding> {
        vec![
            finding("a.css", "subgrid", 0, 0, Verdict::Blocked),
            finding("a.css", "nesting", 3, 1, Verdict::Warning),
            finding("b.js", "popover", 5, 2, Verdict::Safe),
        ]
    }

    #[test]
    fn select_issue_sets_file_and_clears_detail() {
        let visible = sample();
        let key = visible[2].key();
        let mut view = ViewState::default();
        view.detail = Some(DetailSelection::File { uri: "a.css".to_string() });

        view.select_issue(&key, &visible);
        assert_eq!(view.selected_issue_id.as_deref(), Some(key.as_str()));
        assert_eq!(view.selected_file_uri.as_deref(), Some("b.js"));
        assert_eq!(view.detail, None);
    }

    #[test]
    fn selecting_a_vanished_issue_degrades_to_no_selection() {
        let visible = sample();
        let mut view = ViewState::default();
        view.select_issue("gone::f::0::0", &visible);
        assert_eq!(view.selected_issue_id, None);
        assert_eq!(view.selected_file_uri, None);
        assert_eq!(view.detail, None);
    }

    #[test]
    fn select_file_replaces_issue_selection() {
        let visible = sample();
        let mut view = ViewState::default();
        view.select_issue(&visible[0].key(), &visible);
        view.select_file("b.js", &visible);
        assert_eq!(view.selected_issue_id, None);
        assert_eq!(view.selected_file_uri.as_deref(), Some("b.js"));
    }

    #[test]
    fn open_issue_detail_expands_the_file_group() {
        let visible = sample();
        let key = visible[0].key();
        let mut view = ViewState::default();
        view.collapsed_file_uris.insert("a.css".to_string());

        view.open_issue_detail(&key, &visible);
        assert!(!view.collapsed_file_uris.contains("a.css"));
        assert_eq!(view.detail, Some(DetailSelection::Issue { id: key }));
    }

    #[test]
    fn close_detail_clears_everything() {
        let visible = sample();
        let mut view = ViewState::default();
        view.open_file_detail("a.css", &visible);
        view.close_detail();
        assert_eq!(view.selected_issue_id, None);
        assert_eq!(view.selected_file_uri, None);
        assert_eq!(view.detail, None);
    }

    #[test]
    fn expanding_an_offscreen_file_is_a_noop() {
        let visible = sample();
        let mut view = ViewState::default();
        view.set_file_expansion("a.css", false, &visible);
        assert!(view.collapsed_file_uris.contains("a.css"));

        // While "a.css" is filtered off screen an expand request does not land.
        view.set_file_expansion("a.css", true, &[]);
        assert!(view.collapsed_file_uris.contains("a.css"));

        view.set_file_expansion("a.css", true, &visible);
        assert!(view.collapsed_file_uris.is_empty());
    }

    #[test]
    fn collapsing_a_filtered_out_file_is_recorded() {
        let all = sample();
        let mut view = ViewState::default();

        // "a.css" is scanned but hidden by the current filter; the collapse
        // request lands anyway and survives revalidation, so clearing the
        // filter shows the file collapsed.
        let visible = vec![all[2].clone()];
        view.set_file_expansion("a.css", false, &visible);
        view.revalidate(&visible, &all);
        assert!(view.collapsed_file_uris.contains("a.css"));

        // A file absent from the scan entirely does not stick around.
        view.set_file_expansion("never-scanned.css", false, &visible);
        view.revalidate(&visible, &all);
        assert!(!view.collapsed_file_uris.contains("never-scanned.css"));
    }

    #[test]
    fn revalidate_clears_dangling_issue_but_keeps_surviving_file() {
        let visible = sample();
        let mut view = ViewState::default();
        view.open_issue_detail(&visible[0].key(), &visible);

        // Re-scan drops the selected issue but keeps the file.
        let remaining = vec![visible[1].clone(), visible[2].clone()];
        view.revalidate(&remaining, &remaining);
        assert_eq!(view.selected_issue_id, None);
        assert_eq!(view.detail, None);
        assert_eq!(view.selected_file_uri.as_deref(), Some("a.css"));
    }

    #[test]
    fn revalidate_clears_file_selection_when_file_vanishes() {
        let visible = sample();
        let mut view = ViewState::default();
        view.open_file_detail("b.js", &visible);

        let remaining = vec![visible[0].clone(), visible[1].clone()];
        view.revalidate(&remaining, &remaining);
        assert_eq!(view.selected_file_uri, None);
        assert_eq!(view.detail, None);
    }

    #[test]
    fn revalidate_enforces_issue_file_agreement() {
        let visible = sample();
        let mut view = ViewState::default();
        view.selected_issue_id = Some(visible[2].key());
        view.selected_file_uri = Some("a.css".to_string());

        view.revalidate(&visible, &visible);
        assert_eq!(view.selected_file_uri.as_deref(), Some("b.js"));
    }

    #[test]
    fn collapsed_entries_survive_when_the_file_survives() {
        let all = sample();
        let mut view = ViewState::default();
        view.collapsed_file_uris.insert("a.css".to_string());
        view.collapsed_file_uris.insert("gone.css".to_string());

        // "a.css" is filtered out of the visible set but still scanned:
        // its collapsed flag is retained, the stale entry is pruned.
        let visible = vec![all[2].clone()];
        view.revalidate(&visible, &all);
        assert!(view.collapsed_file_uris.contains("a.css"));
        assert!(!view.collapsed_file_uris.contains("gone.css"));
    }

    #[test]
    fn empty_severity_filter_resets_to_full_set() {
        let mut view = ViewState::default();
        view.set_severity(Vec::new());
        assert_eq!(view.severity_filter, full_severity_set());

        view.severity_filter.clear();
        view.revalidate(&[], &[]);
        assert_eq!(view.severity_filter, full_severity_set());
    }
}

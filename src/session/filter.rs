use crate::finding::Finding;

use super::state::ViewState;

/// Apply the severity set and the search query to the full finding list,
/// producing the visible subset. Both predicates are pure, so application
/// order does not matter; ordering of the output is left to the grouping
/// engine.
pub fn apply(findings: &[Finding], view: &ViewState) -> Vec<Finding> {
    findings
        .iter()
        .filter(|f| view.severity_filter.contains(&f.verdict))
        .filter(|f| matches_query(f, &view.search_query))
        .cloned()
        .collect()
}

/// Every whitespace-separated query token must appear, case-insensitively,
/// somewhere in the finding's searchable text (feature name, feature id,
/// matched token, source line, display path). An empty query matches
/// everything.
fn matches_query(finding: &Finding, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let haystack = format!(
        "{} {} {} {} {}",
        finding.feature_name, finding.feature_id, finding.token, finding.line_text, finding.file
    )
    .to_lowercase();
    query.split_whitespace().all(|tok| haystack.contains(tok))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::test_support::{finding, finding_with};
    use crate::verdict::Verdict;

    fn view_with_query(query: &str) -> ViewState {
        let mut view = ViewState::default();
        view.set_search(query);
        view
    }

    #[test]
    fn empty_query_keeps_everything() {
        let findings = vec![
            finding("a.css", "subgrid", 0, 0, Verdict::Blocked),
            finding("b.js", "popover", 1, 2, Verdict::Safe),
        ];
        assert_eq!(apply(&findings, &ViewState::default()).len(), 2);
    }

    #[test]
    fn severity_filter_drops_other_verdicts() {
        let findings = vec![
            finding("a.css", "subgrid", 0, 0, Verdict::Blocked),
            finding("a.css", "popover", 1, 0, Verdict::Warning),
            finding("b.js", "dialog", 2, 0, Verdict::Safe),
        ];
        let mut view = ViewState::default();
        view.set_severity(vec![Verdict::Blocked, Verdict::Warning]);
        let visible = apply(&findings, &view);
        assert_eq!(visible.len(), 2);
        assert!(visible.iter().all(|f| f.verdict != Verdict::Safe));
    }

    #[test]
    fn query_tokens_must_all_match() {
        let findings = vec![
            finding_with("src/grid.css", "subgrid", "Subgrid", "subgrid", 0, 0, Verdict::Blocked),
            finding_with("src/app.js", "popover", "Popover API", "showPopover(", 1, 0, Verdict::Safe),
        ];
        // Both tokens hit the same finding (name + path).
        let visible = apply(&findings, &view_with_query("subgrid grid.css"));
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].feature_id, "subgrid");

        // Tokens spread across different findings match nothing.
        assert!(apply(&findings, &view_with_query("subgrid popover")).is_empty());
    }

    #[test]
    fn query_is_case_insensitive() {
        let findings = vec![finding_with(
            "src/app.js",
            "popover",
            "Popover API",
            "showPopover(",
            0,
            0,
            Verdict::Safe,
        )];
        assert_eq!(apply(&findings, &view_with_query("POPOVER")).len(), 1);
        assert_eq!(apply(&findings, &view_with_query("  ShowPopover  ")).len(), 1);
    }

    #[test]
    fn query_matches_line_text_and_path() {
        let findings = vec![finding("deep/nested/widget.css", "nesting", 4, 2, Verdict::Warning)];
        assert_eq!(apply(&findings, &view_with_query("nested/widget")).len(), 1);
        assert_eq!(apply(&findings, &view_with_query("line with")).len(), 1);
        assert!(apply(&findings, &view_with_query("absent")).is_empty());
    }
}

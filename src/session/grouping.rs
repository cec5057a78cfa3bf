use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::finding::Finding;
use crate::verdict::Verdict;

use super::state::{SortOrder, ViewState};
use super::stats::Summary;

/// Identity of a grouped issue: all occurrences of one (feature, token)
/// pair within one file.
pub fn group_id(finding: &Finding) -> String {
    format!("{}::{}::{}", finding.file, finding.feature_id, finding.token)
}

/// One display row for a single finding, carrying its selection flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueRow {
    pub key: String,
    pub selected: bool,
    pub finding: Finding,
}

/// All occurrences of one (feature, token) pair within a file. The first
/// occurrence (under the individual-issue sort) is the representative whose
/// metadata titles the group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedIssue {
    pub id: String,
    pub feature_id: String,
    pub feature_name: String,
    pub token: String,
    /// Worst verdict among the occurrences
    pub verdict: Verdict,
    pub expanded: bool,
    pub occurrences: Vec<IssueRow>,
}

/// Per-file issue listing, either flat or grouped by (feature, token).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum FileGroupBody {
    Issues { issues: Vec<IssueRow> },
    Grouped { groups: Vec<GroupedIssue> },
}

/// One file's slice of the visible set, ordered and flagged for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileGroup {
    pub uri: String,
    pub max_verdict: Verdict,
    pub summary: Summary,
    pub selected: bool,
    pub expanded: bool,
    #[serde(flatten)]
    pub body: FileGroupBody,
}

/// Individual-issue ordering within a file: verdict weight descending under
/// severity order, then (line, column) ascending, then feature name as the
/// final tie-break.
fn issue_order(a: &Finding, b: &Finding, order: SortOrder) -> Ordering {
    let positional = a
        .range
        .start_line
        .cmp(&b.range.start_line)
        .then(a.range.start_col.cmp(&b.range.start_col))
        .then_with(|| a.feature_name.cmp(&b.feature_name));
    match order {
        SortOrder::Severity => b.verdict.weight().cmp(&a.verdict.weight()).then(positional),
        SortOrder::File => positional,
    }
}

/// Two-level partition of the visible set, recomputed on every assembly
/// pass. An empty visible set produces zero groups.
pub fn build(visible: &[Finding], view: &ViewState) -> Vec<FileGroup> {
    // Level one: partition by file identity, path-ordered.
    let mut by_file: BTreeMap<&str, Vec<&Finding>> = BTreeMap::new();
    for finding in visible {
        by_file.entry(finding.file.as_str()).or_default().push(finding);
    }

    let mut groups: Vec<FileGroup> = by_file
        .into_iter()
        .map(|(uri, mut findings)| {
            findings.sort_by(|a, b| issue_order(a, b, view.sort_order));
            let max_verdict = findings
                .iter()
                .map(|f| f.verdict)
                .max()
                .unwrap_or(Verdict::Safe);
            let summary = Summary::from_refs(&findings);
            let body = if view.grouped_display {
                FileGroupBody::Grouped { groups: grouped_issues(&findings, view) }
            } else {
                FileGroupBody::Issues { issues: rows(&findings, view) }
            };
            FileGroup {
                uri: uri.to_string(),
                max_verdict,
                summary,
                selected: view.selected_file_uri.as_deref() == Some(uri),
                expanded: !view.collapsed_file_uris.contains(uri),
                body,
            }
        })
        .collect();

    // BTreeMap iteration already gave path order; under severity order a
    // stable sort by worst verdict keeps the path tie-break.
    if view.sort_order == SortOrder::Severity {
        groups.sort_by(|a, b| b.max_verdict.weight().cmp(&a.max_verdict.weight()));
    }
    groups
}

fn rows(findings: &[&Finding], view: &ViewState) -> Vec<IssueRow> {
    findings
        .iter()
        .map(|f| {
            let key = f.key();
            IssueRow {
                selected: view.selected_issue_id.as_deref() == Some(key.as_str()),
                key,
                finding: (*f).clone(),
            }
        })
        .collect()
}

/// Partition one file's sorted findings by (feature id, token). Scanning in
/// sorted order keeps each group's occurrences in the individual-issue
/// order and makes the first occurrence the representative.
fn grouped_issues(findings: &[&Finding], view: &ViewState) -> Vec<GroupedIssue> {
    let mut order: Vec<String> = Vec::new();
    let mut buckets: BTreeMap<String, GroupedIssue> = BTreeMap::new();

    for finding in findings {
        let id = group_id(finding);
        let key = finding.key();
        let row = IssueRow {
            selected: view.selected_issue_id.as_deref() == Some(key.as_str()),
            key,
            finding: (*finding).clone(),
        };
        match buckets.get_mut(&id) {
            Some(group) => {
                group.verdict = group.verdict.max(finding.verdict);
                group.occurrences.push(row);
            }
            None => {
                order.push(id.clone());
                buckets.insert(
                    id.clone(),
                    GroupedIssue {
                        expanded: !view.collapsed_group_ids.contains(&id),
                        id,
                        feature_id: finding.feature_id.clone(),
                        feature_name: finding.feature_name.clone(),
                        token: finding.token.clone(),
                        verdict: finding.verdict,
                        occurrences: vec![row],
                    },
                );
            }
        }
    }

    let mut groups: Vec<GroupedIssue> = order
        .into_iter()
        .filter_map(|id| buckets.remove(&id))
        .collect();
    groups.sort_by(|a, b| {
        let by_name = a.feature_name.cmp(&b.feature_name).then_with(|| a.token.cmp(&b.token));
        match view.sort_order {
            SortOrder::Severity => b.verdict.weight().cmp(&a.verdict.weight()).then(by_name),
            SortOrder::File => by_name,
        }
    });
    groups
}

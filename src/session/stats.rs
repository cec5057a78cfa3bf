use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::finding::Finding;
use crate::verdict::Verdict;

/// Verdict counts over some collection of findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub blocked: usize,
    pub warning: usize,
    pub safe: usize,
    pub total: usize,
}

impl Summary {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut summary = Summary::default();
        for f in findings {
            summary.count(f.verdict);
        }
        summary
    }

    pub fn from_refs(findings: &[&Finding]) -> Self {
        let mut summary = Summary::default();
        for f in findings {
            summary.count(f.verdict);
        }
        summary
    }

    fn count(&mut self, verdict: Verdict) {
        self.total += 1;
        match verdict {
            Verdict::Blocked => self.blocked += 1,
            Verdict::Warning => self.warning += 1,
            Verdict::Safe => self.safe += 1,
        }
    }
}

/// Bucket name for findings whose feature belongs to no feature-group.
pub const UNGROUPED: &str = "(ungrouped)";

/// Verdict counts for one feature-group. A finding contributes to every
/// group its feature belongs to, so rollup totals can exceed the finding
/// count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRollup {
    pub group: String,
    pub summary: Summary,
}

/// Per-feature-group rollups, sorted by blocked count descending, then
/// total descending, then group name for determinism.
pub fn group_rollups(findings: &[Finding]) -> Vec<GroupRollup> {
    let mut buckets: BTreeMap<&str, Summary> = BTreeMap::new();
    for finding in findings {
        if finding.groups.is_empty() {
            buckets.entry(UNGROUPED).or_default().count(finding.verdict);
        } else {
            for group in &finding.groups {
                buckets.entry(group.as_str()).or_default().count(finding.verdict);
            }
        }
    }

    let mut rollups: Vec<GroupRollup> = buckets
        .into_iter()
        .map(|(group, summary)| GroupRollup { group: group.to_string(), summary })
        .collect();
    rollups.sort_by(|a, b| {
        b.summary
            .blocked
            .cmp(&a.summary.blocked)
            .then(b.summary.total.cmp(&a.summary.total))
            .then_with(|| a.group.cmp(&b.group))
    });
    rollups
}

/// One completed scan, as remembered by the history series. Records are
/// append-only and never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub timestamp: DateTime<Utc>,
    pub summary: Summary,
}

/// User-configured limits on the verdict counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Budget {
    /// Maximum allowed blocked findings
    pub max_blocked: Option<usize>,
    /// Maximum allowed warning findings
    pub max_warning: Option<usize>,
    /// Minimum desired safe findings
    pub min_safe: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetKind {
    /// `actual` must not exceed `limit`
    Max,
    /// `actual` must reach `limit`
    Min,
}

/// Actual-vs-limit comparison for one metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetStatus {
    pub metric: &'static str,
    pub kind: BudgetKind,
    pub limit: usize,
    pub actual: usize,
    pub ok: bool,
}

/// Compare a summary against the configured budget. Metrics without a
/// configured limit produce no status line.
pub fn budget_status(summary: &Summary, budget: &Budget) -> Vec<BudgetStatus> {
    let mut statuses = Vec::new();
    if let Some(limit) = budget.max_blocked {
        statuses.push(BudgetStatus {
            metric: "blocked",
            kind: BudgetKind::Max,
            limit,
            actual: summary.blocked,
            ok: summary.blocked <= limit,
        });
    }
    if let Some(limit) = budget.max_warning {
        statuses.push(BudgetStatus {
            metric: "warning",
            kind: BudgetKind::Max,
            limit,
            actual: summary.warning,
            ok: summary.warning <= limit,
        });
    }
    if let Some(limit) = budget.min_safe {
        statuses.push(BudgetStatus {
            metric: "safe",
            kind: BudgetKind::Min,
            limit,
            actual: summary.safe,
            ok: summary.safe >= limit,
        });
    }
    statuses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::test_support::finding;
    use pretty_assertions::assert_eq;

    #[test]
    fn summary_counts_by_verdict() {
        let findings = vec![
            finding("a", "f1", 0, 0, Verdict::Blocked),
            finding("a", "f2", 1, 0, Verdict::Blocked),
            finding("a", "f3", 2, 0, Verdict::Warning),
            finding("b", "f4", 0, 0, Verdict::Safe),
        ];
        let summary = Summary::from_findings(&findings);
        assert_eq!(summary.blocked, 2);
        assert_eq!(summary.warning, 1);
        assert_eq!(summary.safe, 1);
        assert_eq!(summary.total, 4);
    }

    #[test]
    fn rollups_cover_every_group_and_the_ungrouped_bucket() {
        let mut in_two_groups = finding("a", "f1", 0, 0, Verdict::Blocked);
        in_two_groups.groups = vec!["CSS Layout".to_string(), "CSS Syntax".to_string()];
        let ungrouped = finding("a", "f2", 1, 0, Verdict::Safe);

        let rollups = group_rollups(&[in_two_groups, ungrouped]);
        assert_eq!(rollups.len(), 3);

        // Blocked-heavy groups first, ties by total then name.
        assert_eq!(rollups[0].group, "CSS Layout");
        assert_eq!(rollups[1].group, "CSS Syntax");
        assert_eq!(rollups[2].group, UNGROUPED);
        assert_eq!(rollups[0].summary.blocked, 1);
        assert_eq!(rollups[2].summary.safe, 1);
    }

    #[test]
    fn rollups_sort_by_blocked_then_total() {
        let mut warnings_only = finding("a", "f1", 0, 0, Verdict::Warning);
        warnings_only.groups = vec!["Quiet".to_string()];
        let mut more_warnings = finding("a", "f2", 1, 0, Verdict::Warning);
        more_warnings.groups = vec!["Quiet".to_string()];
        let mut one_blocked = finding("a", "f3", 2, 0, Verdict::Blocked);
        one_blocked.groups = vec!["Loud".to_string()];

        let rollups = group_rollups(&[warnings_only, more_warnings, one_blocked]);
        assert_eq!(rollups[0].group, "Loud");
        assert_eq!(rollups[1].group, "Quiet");
        assert_eq!(rollups[1].summary.total, 2);
    }

    #[test]
    fn budget_reports_over_and_under() {
        let summary = Summary { blocked: 3, warning: 1, safe: 2, total: 6 };
        let budget = Budget { max_blocked: Some(2), max_warning: Some(5), min_safe: Some(4) };
        let statuses = budget_status(&summary, &budget);
        assert_eq!(statuses.len(), 3);
        assert!(!statuses[0].ok); // 3 blocked > 2 allowed
        assert!(statuses[1].ok); // 1 warning <= 5
        assert!(!statuses[2].ok); // 2 safe < 4 desired
    }

    #[test]
    fn unconfigured_budget_produces_no_statuses() {
        let summary = Summary { blocked: 9, warning: 9, safe: 0, total: 18 };
        assert!(budget_status(&summary, &Budget::default()).is_empty());
    }
}

use serde::Serialize;

use crate::finding::Finding;

use super::filter;
use super::grouping::{self, FileGroup};
use super::state::{DetailSelection, ViewState};
use super::stats::{self, Budget, BudgetStatus, GroupRollup, ScanRecord, Summary};

/// How many history entries the display surface gets.
pub const HISTORY_WINDOW: usize = 20;

/// Derived statistics block: counts over the full and the visible set,
/// per-feature-group rollups, the recent scan series and budget checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub all: Summary,
    pub visible: Summary,
    pub rollups: Vec<GroupRollup>,
    pub history: Vec<ScanRecord>,
    pub budgets: Vec<BudgetStatus>,
}

/// Expanded content for the open detail overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum DetailPayload {
    Issue { finding: Finding },
    File { uri: String, summary: Summary },
}

/// One immutable view of the whole session, handed to the display surface.
/// Assembly is a pure projection: the same inputs always produce a
/// structurally identical snapshot, so the surface can diff cheaply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub target: String,
    pub scanning: bool,
    pub progress: Option<String>,
    pub notice: Option<String>,
    pub view: ViewState,
    pub files: Vec<FileGroup>,
    pub stats: Stats,
    pub detail: Option<DetailPayload>,
}

pub struct AssembleInput<'a> {
    pub view: &'a ViewState,
    pub findings: &'a [Finding],
    pub target_name: &'a str,
    pub scanning: bool,
    pub progress: Option<&'a str>,
    pub notice: Option<&'a str>,
    pub history: &'a [ScanRecord],
    pub budget: &'a Budget,
}

/// Compose the snapshot. Expects the view state to have been re-validated
/// already; a detail reference that still fails to resolve is rendered as
/// no detail rather than an error.
pub fn assemble(input: AssembleInput) -> Snapshot {
    let visible = filter::apply(input.findings, input.view);
    let files = grouping::build(&visible, input.view);

    let all_summary = Summary::from_findings(input.findings);
    let stats = Stats {
        all: all_summary,
        visible: Summary::from_findings(&visible),
        rollups: stats::group_rollups(input.findings),
        history: input
            .history
            .iter()
            .rev()
            .take(HISTORY_WINDOW)
            .rev()
            .cloned()
            .collect(),
        budgets: stats::budget_status(&all_summary, input.budget),
    };

    let detail = match &input.view.detail {
        Some(DetailSelection::Issue { id }) => visible
            .iter()
            .find(|f| f.key() == *id)
            .map(|f| DetailPayload::Issue { finding: f.clone() }),
        Some(DetailSelection::File { uri }) => {
            let in_file: Vec<&Finding> = visible.iter().filter(|f| f.file == *uri).collect();
            if in_file.is_empty() {
                None
            } else {
                Some(DetailPayload::File {
                    uri: uri.clone(),
                    summary: Summary::from_refs(&in_file),
                })
            }
        }
        None => None,
    };

    Snapshot {
        target: input.target_name.to_string(),
        scanning: input.scanning,
        progress: input.progress.map(str::to_string),
        notice: input.notice.map(str::to_string),
        view: input.view.clone(),
        files,
        stats,
        detail,
    }
}

pub mod filter;
pub mod grouping;
pub mod snapshot;
pub mod state;
pub mod stats;

use tracing::{debug, info};

use crate::catalog::FeatureLookup;
use crate::finding::{Finding, RawOccurrence};
use crate::target::Target;
use crate::verdict::Verdict;

use snapshot::{AssembleInput, Snapshot};
use state::{SortOrder, ViewState};
use stats::{Budget, ScanRecord, Summary};

/// Everything the display surface can ask the session to do. One variant
/// per user action; handling is exhaustive, so a new action is a
/// compile-time-checked addition.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Scan,
    SetSearch(String),
    SetSeverity(Vec<Verdict>),
    SetSort(SortOrder),
    SetGroupedDisplay(bool),
    ClearFilters,
    SelectIssue(String),
    SelectFile(String),
    OpenIssueDetail(String),
    OpenFileDetail(String),
    SetFileExpansion { uri: String, expanded: bool },
    SetGroupExpansion { id: String, expanded: bool },
    CloseDetail,
}

/// What the embedder must do after a command was applied. The session owns
/// presentation state only; actually running a scan is the embedder's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    ScanRequested,
}

/// The single owner of the finding list and the view state.
///
/// Single-threaded by construction: every mutation runs to completion,
/// ending with an invariant re-validation pass, before the next one is
/// applied. Snapshots taken between mutations are pure projections and
/// come out in mutation order.
pub struct Session {
    target: Target,
    budget: Budget,
    findings: Vec<Finding>,
    view: ViewState,
    history: Vec<ScanRecord>,
    scanning: bool,
    progress: Option<String>,
    notice: Option<String>,
}

impl Session {
    pub fn new(target: Target, budget: Budget) -> Self {
        Session {
            target,
            budget,
            findings: Vec::new(),
            view: ViewState::default(),
            history: Vec::new(),
            scanning: false,
            progress: None,
            notice: None,
        }
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Apply one user command. Selection commands resolve against the
    /// visible set as it stands when the command is processed, so an event
    /// racing a re-scan degrades to "no selection" instead of failing.
    pub fn apply(&mut self, command: Command) -> Effect {
        self.notice = None;
        let effect = match command {
            Command::Scan => {
                self.begin_scan("Scanning workspace…");
                return Effect::ScanRequested;
            }
            Command::SetSearch(raw) => {
                self.view.set_search(&raw);
                Effect::None
            }
            Command::SetSeverity(verdicts) => {
                self.view.set_severity(verdicts);
                Effect::None
            }
            Command::SetSort(order) => {
                self.view.sort_order = order;
                Effect::None
            }
            Command::SetGroupedDisplay(grouped) => {
                self.view.grouped_display = grouped;
                Effect::None
            }
            Command::ClearFilters => {
                self.view.clear_filters();
                Effect::None
            }
            Command::SelectIssue(key) => {
                let visible = self.visible();
                self.view.select_issue(&key, &visible);
                Effect::None
            }
            Command::SelectFile(uri) => {
                let visible = self.visible();
                self.view.select_file(&uri, &visible);
                Effect::None
            }
            Command::OpenIssueDetail(key) => {
                let visible = self.visible();
                self.view.open_issue_detail(&key, &visible);
                Effect::None
            }
            Command::OpenFileDetail(uri) => {
                let visible = self.visible();
                self.view.open_file_detail(&uri, &visible);
                Effect::None
            }
            Command::SetFileExpansion { uri, expanded } => {
                let visible = self.visible();
                self.view.set_file_expansion(&uri, expanded, &visible);
                Effect::None
            }
            Command::SetGroupExpansion { id, expanded } => {
                let visible = self.visible();
                self.view.set_group_expansion(&id, expanded, &visible);
                Effect::None
            }
            Command::CloseDetail => {
                self.view.close_detail();
                Effect::None
            }
        };
        self.revalidate();
        effect
    }

    // ── Scan lifecycle ──────────────────────────────────────────────

    pub fn begin_scan(&mut self, label: &str) {
        self.notice = None;
        self.scanning = true;
        self.progress = Some(label.to_string());
    }

    pub fn report_progress(&mut self, message: &str) {
        self.progress = Some(message.to_string());
    }

    /// Atomically replace the finding list with the results of a completed
    /// scan. Occurrences whose feature id the catalog cannot resolve are
    /// dropped. Appends to the scan history.
    pub fn complete_scan(&mut self, raw: Vec<RawOccurrence>, catalog: &dyn FeatureLookup) {
        let total = raw.len();
        self.findings = raw
            .into_iter()
            .filter_map(|occ| Finding::from_raw(occ, catalog, &self.target))
            .collect();
        if self.findings.len() < total {
            debug!("Dropped {} unresolvable occurrences", total - self.findings.len());
        }
        info!("Scan complete: {} findings", self.findings.len());

        self.history.push(ScanRecord {
            timestamp: chrono::Utc::now(),
            summary: Summary::from_findings(&self.findings),
        });
        self.scanning = false;
        self.progress = None;
        self.notice = None;
        self.revalidate();
    }

    /// A cancelled scan leaves the previous finding list untouched.
    #[allow(dead_code)] // not reachable from the one-shot CLI
    pub fn cancel_scan(&mut self) {
        self.scanning = false;
        self.progress = None;
    }

    /// A failed scan reverts to the pre-scan state and surfaces a one-time
    /// notice; the next mutation clears it.
    pub fn fail_scan(&mut self, message: &str) {
        self.scanning = false;
        self.progress = None;
        self.notice = Some(message.to_string());
    }

    // ── Configuration ───────────────────────────────────────────────

    /// Switch the active target and re-score every finding against it.
    /// Verdicts are recomputed here, not on every render.
    pub fn set_target(&mut self, target: Target) {
        info!("Target changed to '{}'", target.name);
        self.notice = None;
        self.target = target;
        for finding in &mut self.findings {
            finding.rescore(&self.target);
        }
        self.revalidate();
    }

    /// Re-run validation and let the next snapshot pick up display-only
    /// setting changes that do not affect verdicts.
    #[allow(dead_code)] // not reachable from the one-shot CLI
    pub fn refresh(&mut self) {
        self.revalidate();
    }

    // ── Projection ──────────────────────────────────────────────────

    pub fn snapshot(&self) -> Snapshot {
        snapshot::assemble(AssembleInput {
            view: &self.view,
            findings: &self.findings,
            target_name: &self.target.name,
            scanning: self.scanning,
            progress: self.progress.as_deref(),
            notice: self.notice.as_deref(),
            history: &self.history,
            budget: &self.budget,
        })
    }

    fn visible(&self) -> Vec<Finding> {
        filter::apply(&self.findings, &self.view)
    }

    fn revalidate(&mut self) {
        let visible = self.visible();
        self.view.revalidate(&visible, &self.findings);
    }
}

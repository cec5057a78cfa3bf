use comfy_table::{presets::UTF8_BORDERS_ONLY, Cell, Table};
use owo_colors::OwoColorize;

use crate::catalog::Browser;
use crate::session::grouping::{FileGroup, FileGroupBody, IssueRow};
use crate::session::snapshot::Snapshot;
use crate::session::stats::BudgetKind;
use crate::verdict::Verdict;

/// Render a session snapshot to the terminal with colors. `browsers`
/// controls which support columns are shown; it never changes verdicts.
pub fn render(snapshot: &Snapshot, browsers: &[Browser]) {
    println!();
    println!(
        "{}  Basecheck — target '{}', checked against {} finding(s)",
        "🌐".bold(),
        snapshot.target.bold(),
        snapshot.stats.all.total,
    );

    if let Some(ref notice) = snapshot.notice {
        println!("  {}  {}", "⚠️".bold(), notice.yellow());
    }
    println!();

    if snapshot.files.is_empty() {
        if snapshot.stats.all.total > 0 {
            println!("  {}  No findings match the current filters.", "🔍".bold());
        } else {
            println!("  {}  No unsupported feature uses found!", "✅".bold());
        }
        println!();
        return;
    }

    for group in &snapshot.files {
        render_file_group(group, browsers);
    }

    render_rollups(snapshot);
    render_budgets(snapshot);
    render_summary_bar(snapshot);
}

fn badge(verdict: Verdict) -> String {
    let text = format!(" {} ", verdict);
    match verdict {
        Verdict::Blocked => text.on_red().white().bold().to_string(),
        Verdict::Warning => text.on_yellow().black().bold().to_string(),
        Verdict::Safe => text.on_green().black().to_string(),
    }
}

fn render_file_group(group: &FileGroup, browsers: &[Browser]) {
    println!(
        "  {}  {} {}",
        badge(group.max_verdict),
        group.uri.bold(),
        format!(
            "({} blocked, {} warning, {} safe)",
            group.summary.blocked, group.summary.warning, group.summary.safe
        )
        .dimmed(),
    );

    if !group.expanded {
        println!("           {}", "…collapsed".dimmed());
        println!();
        return;
    }

    match &group.body {
        FileGroupBody::Issues { issues } => {
            for row in issues {
                render_issue_row(row, browsers);
            }
        }
        FileGroupBody::Grouped { groups } => {
            for grouped in groups {
                println!(
                    "     {}  {} {} {}",
                    badge(grouped.verdict),
                    grouped.feature_name.bold(),
                    format!("`{}`", grouped.token).dimmed(),
                    format!("×{}", grouped.occurrences.len()).dimmed(),
                );
                if grouped.expanded {
                    for row in &grouped.occurrences {
                        render_issue_row(row, browsers);
                    }
                } else {
                    println!("           {}", "…collapsed".dimmed());
                }
            }
        }
    }
    println!();
}

fn render_issue_row(row: &IssueRow, browsers: &[Browser]) {
    let f = &row.finding;
    let marker = if row.selected { "▶" } else { " " };
    println!(
        "       {} {}  {} {}",
        marker,
        format!("{}:{}", f.range.start_line + 1, f.range.start_col + 1).dimmed(),
        f.feature_name,
        format!("`{}`", f.token).dimmed(),
    );

    let snippet = f.line_text.trim();
    if !snippet.is_empty() {
        let trimmed: String = if snippet.chars().count() > 120 {
            format!("{}…", snippet.chars().take(119).collect::<String>())
        } else {
            snippet.to_string()
        };
        println!("           → {}", trimmed.dimmed());
    }

    // Unsupported rows get the support column so the reader sees why.
    if f.verdict != Verdict::Safe {
        let columns: Vec<String> = browsers
            .iter()
            .map(|browser| match f.support.get(browser) {
                Some(version) => format!("{browser} {version}"),
                None => format!("{browser} —"),
            })
            .collect();
        println!("           {}", columns.join("  ").dimmed());
    }
}

fn render_rollups(snapshot: &Snapshot) {
    if snapshot.stats.rollups.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Feature group", "Blocked", "Warning", "Safe", "Total"]);
    for rollup in &snapshot.stats.rollups {
        table.add_row(vec![
            Cell::new(&rollup.group),
            Cell::new(rollup.summary.blocked),
            Cell::new(rollup.summary.warning),
            Cell::new(rollup.summary.safe),
            Cell::new(rollup.summary.total),
        ]);
    }
    println!("{table}");
    println!();
}

fn render_budgets(snapshot: &Snapshot) {
    for status in &snapshot.stats.budgets {
        let bound = match status.kind {
            BudgetKind::Max => format!("{} allowed", status.limit),
            BudgetKind::Min => format!("{} desired", status.limit),
        };
        if status.ok {
            println!(
                "  {} budget {}: {} ({})",
                "✅".bold(),
                status.metric,
                status.actual,
                bound.dimmed()
            );
        } else {
            println!(
                "  {} budget {}: {} ({})",
                "❌".bold(),
                status.metric.red().bold(),
                status.actual.to_string().red().bold(),
                bound
            );
        }
    }
    if !snapshot.stats.budgets.is_empty() {
        println!();
    }
}

fn render_summary_bar(snapshot: &Snapshot) {
    println!("{}", "━".repeat(60));

    let summary = &snapshot.stats.visible;
    let mut parts = Vec::new();
    if summary.blocked > 0 {
        parts.push(format!("{} blocked", summary.blocked).red().bold().to_string());
    }
    if summary.warning > 0 {
        parts.push(format!("{} warning", summary.warning).yellow().bold().to_string());
    }
    if summary.safe > 0 {
        parts.push(format!("{} safe", summary.safe).green().to_string());
    }

    println!(
        " {} visible issue(s): {}",
        summary.total.to_string().bold(),
        parts.join(", ")
    );

    if summary.total != snapshot.stats.all.total {
        println!(
            " ({} hidden by filters)",
            (snapshot.stats.all.total - summary.total).to_string().dimmed()
        );
    }

    if snapshot.stats.history.len() > 1 {
        let series: Vec<String> = snapshot
            .stats
            .history
            .iter()
            .map(|r| r.summary.blocked.to_string())
            .collect();
        println!(" blocked over last {} scan(s): {}", series.len(), series.join(" → ").dimmed());
    }

    println!("{}", "━".repeat(60));
    println!();
}

mod catalog;
mod cli;
mod config;
mod engine;
mod finding;
mod listing;
mod report;
mod session;
mod target;
mod verdict;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use catalog::FeatureCatalog;
use cli::{Cli, ScanArgs};
use config::BasecheckConfig;
use engine::Scanner;
use session::state::SortOrder;
use session::{Command, Effect, Session};
use target::Target;
use verdict::Verdict;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("basecheck=debug")
    } else if cli.quiet {
        EnvFilter::new("basecheck=error")
    } else {
        EnvFilter::new("basecheck=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    info!("Basecheck v{}", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        cli::Commands::Scan(args) => run_scan(args)?,
        cli::Commands::Init => {
            config::init_config()?;
        }
        cli::Commands::Targets => {
            listing::list_targets();
        }
        cli::Commands::Features => {
            listing::list_features(&FeatureCatalog::builtin());
        }
    }

    Ok(())
}

fn run_scan(args: &ScanArgs) -> Result<()> {
    // Load optional config
    let config = if args.no_config {
        BasecheckConfig::default()
    } else {
        BasecheckConfig::load(&args.path).unwrap_or_default()
    };

    let catalog = match &args.catalog {
        Some(path) => FeatureCatalog::from_json_file(path)?,
        None => FeatureCatalog::builtin(),
    };

    // CLI target wins over config
    let target = match &args.target {
        Some(name) => Target::by_name(name)
            .with_context(|| format!("unknown target '{name}' (built-ins: modern, enterprise)"))?,
        None => config.resolve_target()?,
    };
    info!("Checking against target '{}'", target.name);

    let mut session = Session::new(target, config.budget());

    // Presentation flags go through the same command channel an editor
    // surface would use.
    if let Some(query) = &args.search {
        session.apply(Command::SetSearch(query.clone()));
    }
    if let Some(severity) = &args.severity {
        let verdicts: Vec<Verdict> = severity
            .split(',')
            .map(|s| Verdict::from_str(s.trim()))
            .collect();
        session.apply(Command::SetSeverity(verdicts));
    }
    if let Some(sort) = &args.sort {
        let order = if sort.eq_ignore_ascii_case("file") {
            SortOrder::File
        } else {
            SortOrder::Severity
        };
        session.apply(Command::SetSort(order));
    }
    if args.grouped {
        session.apply(Command::SetGroupedDisplay(true));
    }

    // Merge include/exclude patterns from config and CLI
    let mut include = args.include.clone();
    include.extend(config.scan.include.clone());
    let mut exclude = args.exclude.clone();
    exclude.extend(config.scan.exclude.clone());

    if session.apply(Command::Scan) == Effect::ScanRequested {
        let result = Scanner::new(&args.path, &catalog, include, exclude, args.max_file_size)
            .and_then(|scanner| scanner.run());
        match result {
            Ok(output) => {
                session.report_progress(&format!(
                    "Checked {} files in {:.2}s ({} skipped)",
                    output.files_scanned,
                    output.duration_ms as f64 / 1000.0,
                    output.files_skipped
                ));
                session.complete_scan(output.occurrences, &catalog);
            }
            Err(e) => {
                session.fail_scan(&format!("Scan failed: {e}"));
            }
        }
    }

    let snapshot = session.snapshot();

    // Output the report
    match args.format.as_str() {
        "json" => {
            let output = report::json::render(&snapshot)?;
            if let Some(ref path) = args.out {
                std::fs::write(path, &output)?;
                info!("Snapshot written to {}", path.display());
            } else {
                println!("{}", output);
            }
        }
        _ => {
            let browsers = config
                .check
                .browsers
                .clone()
                .unwrap_or_else(|| catalog::Browser::ALL.to_vec());
            report::terminal::render(&snapshot, &browsers);
            if let Some(ref path) = args.out {
                let json_output = report::json::render(&snapshot)?;
                std::fs::write(path, &json_output)?;
                info!("JSON snapshot also written to {}", path.display());
            }
        }
    }

    // Exit code based on findings
    if let Some(ref fail_on) = args.fail_on {
        let threshold = Verdict::from_str(fail_on);
        if session.findings().iter().any(|f| f.verdict >= threshold) {
            std::process::exit(1);
        }
    }

    Ok(())
}

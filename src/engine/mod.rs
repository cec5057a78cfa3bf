pub mod file_walker;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use rayon::prelude::*;
use regex::Regex;
use tracing::{debug, info};

use crate::catalog::FeatureCatalog;
use crate::finding::{RawOccurrence, SourceRange};

/// Everything a completed scan hands back: the raw occurrences for the
/// session to classify, plus file counts for progress reporting.
#[derive(Debug)]
pub struct ScanOutput {
    pub occurrences: Vec<RawOccurrence>,
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub duration_ms: u64,
}

/// One compiled token pattern, tied back to its feature id.
struct TokenMatcher {
    feature_id: String,
    token: String,
    pattern: Regex,
}

/// The workspace scanner. Discovers candidate files and emits one raw
/// occurrence per feature-token match; classification happens in the
/// session, not here.
pub struct Scanner {
    /// Root path to scan
    scan_path: PathBuf,
    /// Token patterns derived from the catalog
    matchers: Vec<TokenMatcher>,
    /// Maximum file size (bytes)
    max_file_size: u64,
    /// Include patterns
    include: Vec<String>,
    /// Exclude patterns
    exclude: Vec<String>,
}

impl Scanner {
    pub fn new(
        path: &std::path::Path,
        catalog: &FeatureCatalog,
        include: Vec<String>,
        exclude: Vec<String>,
        max_file_size: u64,
    ) -> Result<Self> {
        let scan_path = std::fs::canonicalize(path)?;
        let matchers = build_matchers(catalog);
        info!("Compiled {} token matchers from {} features", matchers.len(), catalog.len());

        Ok(Scanner { scan_path, matchers, max_file_size, include, exclude })
    }

    /// Run the full scan pipeline: discover, read in parallel, match.
    pub fn run(&self) -> Result<ScanOutput> {
        let start = Instant::now();

        info!("Discovering files in {}", self.scan_path.display());
        let file_paths = file_walker::walk_files(
            &self.scan_path,
            &self.include,
            &self.exclude,
            self.max_file_size,
        )?;

        info!("Found {} files to check", file_paths.len());

        let (per_file, skipped): (Vec<_>, Vec<_>) = file_paths
            .par_iter()
            .map(|path| {
                let rel_path = path
                    .strip_prefix(&self.scan_path)
                    .unwrap_or(path)
                    .to_string_lossy()
                    .replace('\\', "/");

                match std::fs::read_to_string(path) {
                    Ok(content) => Ok(self.match_file(&rel_path, &content)),
                    Err(e) => {
                        debug!("Skipping {}: {}", path.display(), e);
                        Err(())
                    }
                }
            })
            .partition_map(|r| match r {
                Ok(found) => rayon::iter::Either::Left(found),
                Err(()) => rayon::iter::Either::Right(()),
            });

        let files_scanned = per_file.len();
        let files_skipped = skipped.len();

        let mut occurrences: Vec<RawOccurrence> = per_file.into_iter().flatten().collect();
        // Parallel collection order is nondeterministic; fix it here.
        occurrences.sort_by(|a, b| {
            a.file
                .cmp(&b.file)
                .then(a.range.start_line.cmp(&b.range.start_line))
                .then(a.range.start_col.cmp(&b.range.start_col))
                .then_with(|| a.feature_id.cmp(&b.feature_id))
        });

        info!(
            "Matched {} occurrences across {} files ({} skipped)",
            occurrences.len(),
            files_scanned,
            files_skipped
        );

        Ok(ScanOutput {
            occurrences,
            files_scanned,
            files_skipped,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Match every token pattern against every line of one file.
    fn match_file(&self, rel_path: &str, content: &str) -> Vec<RawOccurrence> {
        let mut found = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            for matcher in &self.matchers {
                for hit in matcher.pattern.find_iter(line) {
                    found.push(RawOccurrence {
                        file: rel_path.to_string(),
                        feature_id: matcher.feature_id.clone(),
                        token: matcher.token.clone(),
                        range: SourceRange {
                            start_line: line_no as u32,
                            start_col: hit.start() as u32,
                            end_line: line_no as u32,
                            end_col: hit.end() as u32,
                        },
                        line_text: line.to_string(),
                    });
                }
            }
        }
        found
    }
}

/// Compile each catalog token into a literal pattern, with word-boundary
/// anchors where the token edge is a word character (so "subgrid" does not
/// match "subgridish", but ":has(" still matches mid-selector).
fn build_matchers(catalog: &FeatureCatalog) -> Vec<TokenMatcher> {
    let mut matchers = Vec::new();
    for feature in catalog.features() {
        for token in &feature.tokens {
            let mut pattern = regex::escape(token);
            if token.chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_') {
                pattern.insert_str(0, r"\b");
            }
            if token.chars().last().is_some_and(|c| c.is_alphanumeric() || c == '_') {
                pattern.push_str(r"\b");
            }
            matchers.push(TokenMatcher {
                feature_id: feature.id.clone(),
                token: token.clone(),
                pattern: Regex::new(&pattern).expect("escaped literal always compiles"),
            });
        }
    }
    matchers
}

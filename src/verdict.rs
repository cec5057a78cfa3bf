use serde::{Deserialize, Serialize};

use crate::catalog::SupportMatrix;
use crate::target::Target;

/// Classification of one finding against the active target.
/// Ordered so that `Blocked` compares greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Safe,
    Warning,
    Blocked,
}

impl Verdict {
    pub const ALL: [Verdict; 3] = [Verdict::Safe, Verdict::Warning, Verdict::Blocked];

    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "BLOCKED" => Verdict::Blocked,
            "WARNING" => Verdict::Warning,
            _ => Verdict::Safe,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Blocked => "BLOCKED",
            Verdict::Warning => "WARNING",
            Verdict::Safe => "SAFE",
        }
    }

    /// Sort weight used by the grouping engine: blocked=3, warning=2, safe=1.
    pub fn weight(&self) -> u8 {
        match self {
            Verdict::Blocked => 3,
            Verdict::Warning => 2,
            Verdict::Safe => 1,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Score a support matrix against a target.
///
/// - `Warning` if any browser the target has a minimum for lacks a usable
///   numeric version (missing entry or a value like "preview").
/// - Otherwise `Blocked` if any such browser's version is strictly below the
///   target minimum.
/// - Otherwise `Safe`.
///
/// Comparison is plain real-number comparison: fractional versions (16.4),
/// zero and negative values all compare normally. Browsers the target has no
/// minimum for are ignored even when their data is absent.
pub fn score(support: &SupportMatrix, target: &Target) -> Verdict {
    let mut blocked = false;
    for (browser, minimum) in &target.minimums {
        match support.get(browser).and_then(|v| v.trim().parse::<f64>().ok()) {
            None => return Verdict::Warning,
            Some(version) if version < *minimum => blocked = true,
            Some(_) => {}
        }
    }
    if blocked {
        Verdict::Blocked
    } else {
        Verdict::Safe
    }
}

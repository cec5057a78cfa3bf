use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::Browser;
use crate::session::stats::Budget;
use crate::target::Target;

/// Basecheck configuration (loaded from .basecheck.toml)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BasecheckConfig {
    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub check: CheckConfig,

    #[serde(default)]
    pub budget: BudgetConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScanConfig {
    /// Glob patterns to exclude
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Glob patterns to include
    #[serde(default)]
    pub include: Vec<String>,

    /// Max file size in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Built-in target name ("modern", "enterprise")
    #[serde(default = "default_target")]
    pub target: String,

    /// Custom per-browser minimums; overrides `target` when present
    #[serde(default)]
    pub thresholds: Option<BTreeMap<Browser, f64>>,

    /// Browsers shown in report support columns (display-only; does not
    /// affect verdicts)
    #[serde(default)]
    pub browsers: Option<Vec<Browser>>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        CheckConfig { target: default_target(), thresholds: None, browsers: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BudgetConfig {
    /// Maximum allowed blocked findings
    #[serde(default)]
    pub max_blocked: Option<usize>,

    /// Maximum allowed warning findings
    #[serde(default)]
    pub max_warning: Option<usize>,

    /// Minimum desired safe findings
    #[serde(default)]
    pub min_safe: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Default output format
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_max_file_size() -> u64 {
    1_048_576 // 1MB
}

fn default_target() -> String {
    "modern".to_string()
}

fn default_format() -> String {
    "terminal".to_string()
}

impl BasecheckConfig {
    /// Try to load .basecheck.toml from the given directory or its parents
    pub fn load(scan_path: &Path) -> Option<Self> {
        let config_path = find_config_file(scan_path)?;
        debug!("Found config: {}", config_path.display());

        match std::fs::read_to_string(&config_path) {
            Ok(content) => match toml::from_str::<BasecheckConfig>(&content) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    Some(config)
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", config_path.display(), e);
                    None
                }
            },
            Err(e) => {
                debug!("Could not read {}: {}", config_path.display(), e);
                None
            }
        }
    }

    /// Resolve the active target: custom thresholds win over the named
    /// built-in.
    pub fn resolve_target(&self) -> Result<Target> {
        if let Some(thresholds) = &self.check.thresholds {
            return Ok(Target {
                name: self.check.target.clone(),
                minimums: thresholds.clone(),
            });
        }
        match Target::by_name(&self.check.target) {
            Some(target) => Ok(target),
            None => bail!(
                "unknown target '{}' (built-ins: modern, enterprise)",
                self.check.target
            ),
        }
    }

    pub fn budget(&self) -> Budget {
        Budget {
            max_blocked: self.budget.max_blocked,
            max_warning: self.budget.max_warning,
            min_safe: self.budget.min_safe,
        }
    }
}

/// Walk up from the scan path to find .basecheck.toml
fn find_config_file(start: &Path) -> Option<std::path::PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let config = current.join(".basecheck.toml");
        if config.exists() {
            return Some(config);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Create a default .basecheck.toml in the current directory
pub fn init_config() -> Result<()> {
    let config_path = std::env::current_dir()?.join(".basecheck.toml");

    if config_path.exists() {
        println!("⚠️  .basecheck.toml already exists in this directory");
        return Ok(());
    }

    let default_config = r#"# Basecheck configuration

[check]
# Browser-support target: "modern" or "enterprise"
target = "modern"

# Or define custom per-browser minimums instead:
# thresholds = { chrome = 114, edge = 114, firefox = 115, safari = 16.4 }

# Browsers to show in report support columns (display-only)
# browsers = ["chrome", "firefox", "safari"]

[scan]
# Glob patterns to exclude from scanning
exclude = [
    "**/*.min.js",
    "**/*.min.css",
]

# Max file size to scan (bytes). Default: 1MB
# max_file_size = 1048576

[budget]
# Fail budgets: flag the report when counts drift past these
# max_blocked = 0
# max_warning = 10
# min_safe = 0

[output]
# Default output format: "terminal" or "json"
format = "terminal"
"#;

    std::fs::write(&config_path, default_config)?;
    println!("✅ Created .basecheck.toml");
    println!("   Edit it to pick your support target and budgets.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_resolves_the_modern_target() {
        let config = BasecheckConfig::default();
        assert_eq!(config.resolve_target().unwrap().name, "modern");
    }

    #[test]
    fn custom_thresholds_override_the_named_target() {
        let config: BasecheckConfig = toml::from_str(
            r#"
            [check]
            target = "pinned"
            thresholds = { chrome = 100, safari = 15.4 }
            "#,
        )
        .unwrap();
        let target = config.resolve_target().unwrap();
        assert_eq!(target.name, "pinned");
        assert_eq!(target.minimums[&Browser::Chrome], 100.0);
        assert_eq!(target.minimums.len(), 2);
    }

    #[test]
    fn unknown_target_name_is_an_error() {
        let config: BasecheckConfig =
            toml::from_str("[check]\ntarget = \"nonsense\"\n").unwrap();
        assert!(config.resolve_target().is_err());
    }

    #[test]
    fn budget_section_maps_onto_the_session_budget() {
        let config: BasecheckConfig = toml::from_str(
            r#"
            [budget]
            max_blocked = 0
            min_safe = 5
            "#,
        )
        .unwrap();
        let budget = config.budget();
        assert_eq!(budget.max_blocked, Some(0));
        assert_eq!(budget.max_warning, None);
        assert_eq!(budget.min_safe, Some(5));
    }

    #[test]
    fn config_discovery_walks_up_from_the_scan_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".basecheck.toml"), "[check]\ntarget = \"enterprise\"\n")
            .unwrap();
        let nested = dir.path().join("src/deep");
        std::fs::create_dir_all(&nested).unwrap();

        let config = BasecheckConfig::load(&nested).unwrap();
        assert_eq!(config.check.target, "enterprise");
    }
}

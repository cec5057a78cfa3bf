use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Browser;

/// A named set of per-browser minimum versions. Browsers without an entry
/// are ignored entirely when scoring, even if their support data is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    pub minimums: BTreeMap<Browser, f64>,
}

impl Target {
    pub fn new(name: &str, minimums: &[(Browser, f64)]) -> Self {
        Target {
            name: name.to_string(),
            minimums: minimums.iter().copied().collect(),
        }
    }

    /// Current stable majors across the four tracked browsers.
    pub fn modern() -> Self {
        Target::new(
            "modern",
            &[
                (Browser::Chrome, 126.0),
                (Browser::Edge, 126.0),
                (Browser::Firefox, 128.0),
                (Browser::Safari, 17.5),
            ],
        )
    }

    /// The slower enterprise rollout generation (ESR-era Firefox, managed
    /// Chrome/Edge, last-year Safari).
    pub fn enterprise() -> Self {
        Target::new(
            "enterprise",
            &[
                (Browser::Chrome, 114.0),
                (Browser::Edge, 114.0),
                (Browser::Firefox, 115.0),
                (Browser::Safari, 16.4),
            ],
        )
    }

    pub fn builtin() -> Vec<Target> {
        vec![Target::modern(), Target::enterprise()]
    }

    /// Resolve a built-in target by name (case-insensitive).
    pub fn by_name(name: &str) -> Option<Target> {
        Target::builtin()
            .into_iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }
}

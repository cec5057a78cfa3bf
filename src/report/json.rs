use anyhow::Result;

use crate::session::snapshot::Snapshot;

/// Render a session snapshot as pretty-printed JSON
pub fn render(snapshot: &Snapshot) -> Result<String> {
    let json = serde_json::to_string_pretty(snapshot)?;
    Ok(json)
}

//! Session persistence as JSON

use crate::error::Result;
use heyjack_playback::PersistedSession;
use std::path::Path;
use tracing::info;

/// Read a saved session, `None` if the file does not exist
pub fn load_session(path: &Path) -> Result<Option<PersistedSession>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(path)?;
    let session = serde_json::from_str(&data)?;
    info!(path = %path.display(), "loaded session");
    Ok(Some(session))
}

/// Write `session`, creating parent directories as needed
pub fn save_session(path: &Path, session: &PersistedSession) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(session)?;
    std::fs::write(path, data)?;
    info!(path = %path.display(), tracks = session.tracks.len(), "saved session");
    Ok(())
}

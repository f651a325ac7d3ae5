use anyhow::{Context, Result};
use std::process::Command;
use tracing::{info, warn};

/// Open an application bundle through the system `open` mechanism. `open`
/// handles activation and de-duplicates already-running apps for us.
pub fn launch_app(path: &str) -> Result<()> {
    Command::new("open")
        .arg(path)
        .spawn()
        .with_context(|| format!("Failed to launch application: {path}"))?;
    info!(app = %path, "launched application");
    Ok(())
}

/// Launch every app configured for a preset, in order. A failing entry is
/// logged and skipped; the rest of the group still launches.
pub fn launch_preset(name: &str, paths: &[String]) {
    if paths.is_empty() {
        info!(preset = %name, "preset has no apps configured");
        return;
    }
    info!(preset = %name, count = paths.len(), "launching preset");
    for path in paths {
        if let Err(err) = launch_app(path) {
            warn!(preset = %name, app = %path, error = %format!("{err:#}"), "preset app failed to launch");
        }
    }
}

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

pub const QUICK_SLOT_COUNT: usize = 4;
pub const PRESET_NAMES: [&str; 4] = ["Programming", "Chilling", "Debugging", "Focus Mode"];

/// User-configured launch targets, persisted to a property list under
/// `~/Library/Preferences`. Written back on every mutation; a missing or
/// unreadable file simply means the default empty configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub quick_app_paths: [Option<String>; QUICK_SLOT_COUNT],
    pub preset_apps: BTreeMap<String, Vec<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        let preset_apps = PRESET_NAMES
            .iter()
            .map(|name| (name.to_string(), Vec::new()))
            .collect();
        Self {
            quick_app_paths: Default::default(),
            preset_apps,
        }
    }
}

impl Settings {
    pub fn preferences_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join("Library/Preferences/com.dynamicisland.plist"))
    }

    /// Load the persisted settings, falling back to defaults on any failure.
    pub fn load() -> Self {
        let Some(path) = Self::preferences_path() else {
            warn!("no home directory; using default settings");
            return Settings::default();
        };
        if !path.exists() {
            debug!(path = %path.display(), "no settings file; using defaults");
            return Settings::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(err) => {
                warn!(path = %path.display(), error = %format!("{err:#}"), "failed to load settings; using defaults");
                Settings::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let doc: SettingsDocument = plist::from_file(path)
            .with_context(|| format!("Failed to read settings plist: {}", path.display()))?;
        Ok(doc.into())
    }

    /// Persist to the preferences path. Failures are logged, never surfaced;
    /// the in-memory settings stay authoritative for the session.
    pub fn save(&self) {
        let Some(path) = Self::preferences_path() else {
            warn!("no home directory; settings not saved");
            return;
        };
        if let Err(err) = self.save_to(&path) {
            warn!(path = %path.display(), error = %format!("{err:#}"), "failed to save settings");
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory: {}", parent.display())
            })?;
        }
        let doc = SettingsDocument::from(self);
        plist::to_file_xml(path, &doc)
            .with_context(|| format!("Failed to write settings plist: {}", path.display()))?;
        Ok(())
    }

    pub fn quick_slot(&self, index: usize) -> Option<&str> {
        self.quick_app_paths
            .get(index)
            .and_then(|slot| slot.as_deref())
    }

    /// Set or clear a quick-access slot. Slots are never removed, only
    /// nulled. Returns false for an out-of-range index.
    pub fn set_quick_slot(&mut self, index: usize, path: Option<String>) -> bool {
        match self.quick_app_paths.get_mut(index) {
            Some(slot) => {
                *slot = path.filter(|p| !p.trim().is_empty());
                true
            }
            None => false,
        }
    }

    pub fn preset_apps(&self, preset: &str) -> &[String] {
        self.preset_apps
            .get(preset)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Append a path to a preset. Duplicates are rejected; returns whether
    /// the preset changed.
    pub fn add_preset_app(&mut self, preset: &str, path: String) -> bool {
        if path.trim().is_empty() || !PRESET_NAMES.contains(&preset) {
            return false;
        }
        let apps = self.preset_apps.entry(preset.to_string()).or_default();
        if apps.contains(&path) {
            return false;
        }
        apps.push(path);
        true
    }

    pub fn clear_preset(&mut self, preset: &str) {
        if let Some(apps) = self.preset_apps.get_mut(preset) {
            apps.clear();
        }
    }
}

// On-disk shape. Property lists cannot hold nulls, so empty quick slots are
// stored as empty strings and folded back into `Option` on load, the same
// way the config document folds optionals into defaults.
#[derive(Debug, Serialize, Deserialize)]
struct SettingsDocument {
    #[serde(rename = "quickAppPaths", default)]
    quick_app_paths: Vec<String>,
    #[serde(rename = "presetApps", default)]
    preset_apps: BTreeMap<String, Vec<String>>,
}

impl From<SettingsDocument> for Settings {
    fn from(doc: SettingsDocument) -> Self {
        let mut settings = Settings::default();
        for (index, path) in doc
            .quick_app_paths
            .into_iter()
            .take(QUICK_SLOT_COUNT)
            .enumerate()
        {
            if !path.is_empty() {
                settings.quick_app_paths[index] = Some(path);
            }
        }
        for (name, apps) in doc.preset_apps {
            if PRESET_NAMES.contains(&name.as_str()) {
                let slot = settings.preset_apps.entry(name).or_default();
                for app in apps {
                    if !app.is_empty() && !slot.contains(&app) {
                        slot.push(app);
                    }
                }
            }
        }
        settings
    }
}

impl From<&Settings> for SettingsDocument {
    fn from(settings: &Settings) -> Self {
        Self {
            quick_app_paths: settings
                .quick_app_paths
                .iter()
                .map(|slot| slot.clone().unwrap_or_default())
                .collect(),
            preset_apps: settings.preset_apps.clone(),
        }
    }
}

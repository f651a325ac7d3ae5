use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// On-disk contract for the preferences plist: `quickAppPaths` is always four
// strings (empty string = unset slot) and `presetApps` maps preset names to
// path arrays. The widget must keep reading files written by older builds.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct PreferencesFile {
    #[serde(rename = "quickAppPaths", default)]
    quick_app_paths: Vec<String>,
    #[serde(rename = "presetApps", default)]
    preset_apps: BTreeMap<String, Vec<String>>,
}

#[test]
fn preferences_plist_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("com.dynamicisland.plist");

    let written = PreferencesFile {
        quick_app_paths: vec![
            "/Applications/Safari.app".to_string(),
            String::new(),
            "/Applications/Music.app".to_string(),
            String::new(),
        ],
        preset_apps: BTreeMap::from([
            (
                "Programming".to_string(),
                vec![
                    "/Applications/Zed.app".to_string(),
                    "/Applications/Ghostty.app".to_string(),
                ],
            ),
            ("Chilling".to_string(), Vec::new()),
        ]),
    };

    plist::to_file_xml(&path, &written).unwrap();
    let read: PreferencesFile = plist::from_file(&path).unwrap();
    assert_eq!(read, written);
}

#[test]
fn missing_keys_default_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sparse.plist");

    #[derive(Serialize)]
    struct Sparse {}
    plist::to_file_xml(&path, &Sparse {}).unwrap();

    let read: PreferencesFile = plist::from_file(&path).unwrap();
    assert!(read.quick_app_paths.is_empty());
    assert!(read.preset_apps.is_empty());
}

#[test]
fn truncated_file_is_a_read_error_not_a_panic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.plist");
    std::fs::write(&path, b"<?xml version=\"1.0\"?><plist><dict>").unwrap();

    let read: Result<PreferencesFile, _> = plist::from_file(&path);
    assert!(read.is_err());
}

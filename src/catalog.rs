//! Catalog scanner
//!
//! Discovers `<root>/<event>/<variant>.<ext>` files. The directory tree is the
//! only source of truth: every call rescans, so files dropped in while the
//! server runs show up on the next request.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Event name -> sorted variant identifiers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    events: BTreeMap<String, Vec<String>>,
}

impl Catalog {
    /// Event names, ascending
    pub fn list_events(&self) -> Vec<String> {
        self.events.keys().cloned().collect()
    }

    /// Variants of one event, ascending. Unknown events have none.
    pub fn list_variants(&self, event: &str) -> Vec<String> {
        self.events.get(event).cloned().unwrap_or_default()
    }

    pub fn contains(&self, event: &str, variant: &str) -> bool {
        self.events
            .get(event)
            .is_some_and(|variants| variants.iter().any(|v| v == variant))
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

/// Scan the data root. A missing root yields an empty catalog.
pub fn scan(root: &Path, extension: &str) -> Catalog {
    let mut events = BTreeMap::new();

    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Data root {:?} not readable: {}", root, e);
            return Catalog { events };
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(event) = dir_name(&path) else {
            tracing::debug!("Skipping event directory {:?}", path);
            continue;
        };

        let variants = scan_event(&path, extension);
        if variants.is_empty() {
            tracing::debug!("Event '{}' has no .{} files, omitted", event, extension);
            continue;
        }
        tracing::debug!("Event '{}': {} variants", event, variants.len());
        events.insert(event, variants);
    }

    tracing::debug!("Scanned {:?}: {} events", root, events.len());
    Catalog { events }
}

fn scan_event(dir: &Path, extension: &str) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Cannot list {:?}: {}", dir, e);
            return Vec::new();
        }
    };

    let mut variants: Vec<String> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter_map(|path| variant_id(&path, extension))
        .collect();
    variants.sort();
    variants
}

/// File name minus the data extension, stripped exactly once
fn variant_id(path: &Path, extension: &str) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let stem = name.strip_suffix(extension)?.strip_suffix('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(stem.to_string())
}

fn dir_name(path: &Path) -> Option<String> {
    path.file_name()?.to_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "bin,sort\n").unwrap();
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = tempdir().unwrap();
        let catalog = scan(&dir.path().join("nope"), "csv");
        assert!(catalog.is_empty());
        assert!(catalog.list_events().is_empty());
    }

    #[test]
    fn test_events_sorted_and_empty_events_omitted() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "utmb/2023.csv");
        touch(dir.path(), "lavaredo/2024.csv");
        touch(dir.path(), "western_states/notes.txt");
        fs::create_dir_all(dir.path().join("empty_event")).unwrap();
        touch(dir.path(), "stray.csv");

        let catalog = scan(dir.path(), "csv");
        assert_eq!(catalog.list_events(), vec!["lavaredo", "utmb"]);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_variants_sorted_extension_stripped_once() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "utmb/2024.csv");
        touch(dir.path(), "utmb/2023 CCC.csv");
        touch(dir.path(), "utmb/odd.csv.csv");
        touch(dir.path(), "utmb/backup.csv.bak");
        touch(dir.path(), "utmb/.csv");

        let catalog = scan(dir.path(), "csv");
        assert_eq!(
            catalog.list_variants("utmb"),
            vec!["2023 CCC", "2024", "odd.csv"]
        );
        assert!(catalog.contains("utmb", "2024"));
        assert!(!catalog.contains("utmb", "backup"));
        assert!(catalog.list_variants("missing").is_empty());
    }

    #[test]
    fn test_dot_names_are_listed() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "utmb/.draft.csv");
        touch(dir.path(), ".archive/2019.csv");

        let catalog = scan(dir.path(), "csv");
        assert_eq!(catalog.list_events(), vec![".archive", "utmb"]);
        assert_eq!(catalog.list_variants("utmb"), vec![".draft"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_event_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        touch(dir.path(), "locked/2023.csv");
        touch(dir.path(), "utmb/2024.csv");
        let locked = dir.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // root ignores directory permissions
        let enforced = fs::read_dir(&locked).is_err();
        let catalog = scan(dir.path(), "csv");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if enforced {
            assert_eq!(catalog.list_events(), vec!["utmb"]);
        } else {
            assert_eq!(catalog.list_events(), vec!["locked", "utmb"]);
        }
        assert_eq!(catalog.list_variants("utmb"), vec!["2024"]);
    }

    #[test]
    fn test_rescan_sees_new_files() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "utmb/2023.csv");
        assert_eq!(scan(dir.path(), "csv").list_variants("utmb"), vec!["2023"]);

        touch(dir.path(), "utmb/2024.csv");
        assert_eq!(
            scan(dir.path(), "csv").list_variants("utmb"),
            vec!["2023", "2024"]
        );
    }

    #[test]
    fn test_subdirectory_named_like_data_file_is_skipped() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("utmb/2022.csv")).unwrap();
        touch(dir.path(), "utmb/2023.csv");
        assert_eq!(scan(dir.path(), "csv").list_variants("utmb"), vec!["2023"]);
    }
}

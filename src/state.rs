//! Application State
//!
//! The function boundary the HTTP layer and CLI call into. Holds only
//! immutable configuration: every call rescans or reloads from disk, so
//! concurrent requests never share mutable data.

use crate::catalog::{self, Catalog};
use crate::compare::{self, Comparison, Metric, Selection};
use crate::config::Config;
use crate::error::CompareResult;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Create new app state from config
    pub fn new(config: Config, data_dir: PathBuf) -> Self {
        Self {
            config: Arc::new(config),
            data_dir,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Fresh scan of the data root
    pub fn catalog(&self) -> Catalog {
        catalog::scan(&self.data_dir, &self.config.extension)
    }

    pub fn list_events(&self) -> Vec<String> {
        self.catalog().list_events()
    }

    pub fn list_variants(&self, event: &str) -> Vec<String> {
        self.catalog().list_variants(event)
    }

    /// Compare two selections on the given metric
    pub fn compare(&self, a: &Selection, b: &Selection, metric: Metric) -> CompareResult<Comparison> {
        compare::compare(&self.data_dir, &self.config.extension, a, b, metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_scanned_variants_are_loadable() {
        let dir = tempdir().unwrap();
        for rel in ["ultra trail/2023 100k.csv", "ultra trail/2024.csv", "zegama/2024.csv"] {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "bin,sort,distance_km\n0-5%,1,3.0\n").unwrap();
        }
        let state = AppState::new(Config::default(), dir.path().to_path_buf());

        let events = state.list_events();
        assert_eq!(events, vec!["ultra trail", "zegama"]);
        for event in &events {
            for variant in state.list_variants(event) {
                let sel = Selection::new(event.clone(), variant);
                let result = state.compare(&sel, &sel, Metric::Distance).unwrap();
                assert_eq!(result.rows[0].delta, Some(0.0));
            }
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_backslash_variant_is_loadable() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("ev")).unwrap();
        fs::write(dir.path().join("ev").join("a\\b.csv"), "bin,sort,distance_km\nX,1,2.0\n").unwrap();
        let state = AppState::new(Config::default(), dir.path().to_path_buf());

        let variants = state.list_variants("ev");
        assert_eq!(variants, vec!["a\\b"]);
        let sel = Selection::new("ev", variants[0].clone());
        let result = state.compare(&sel, &sel, Metric::Distance).unwrap();
        assert_eq!(result.rows[0].value_a, Some(2.0));
    }

    #[test]
    fn test_missing_root_lists_nothing() {
        let dir = tempdir().unwrap();
        let state = AppState::new(Config::default(), dir.path().join("race_data"));
        assert!(state.list_events().is_empty());
        assert!(state.list_variants("utmb").is_empty());
    }
}

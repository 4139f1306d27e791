//! Configuration loader - YAML manifest + .env secrets

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default bar colours, top bin first before reversal
pub const DEFAULT_PALETTE: [&str; 11] = [
    "#803131", "#d63131", "#e77d31", "#efe331", "#d3d388", "#31d431", "#7fd1af", "#4ee6e6",
    "#3197e9", "#3b36db", "#682d94",
];

/// Main configuration loaded from race_vert.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_folder: PathBuf,
    /// Data-file extension, without the dot
    pub extension: String,
    /// |delta| at or below this is drawn neutral
    pub delta_threshold: f64,
    /// Axis extent as a multiple of the largest value
    pub axis_headroom: f64,
    /// Gap between the mirrored bars and the centre line, as a fraction of the largest value
    pub bar_gap: f64,
    pub palette: Vec<String>,
    pub colors: DeltaColors,
}

/// Delta annotation colours
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeltaColors {
    pub neutral: String,
    pub a_exceeds: String,
    pub b_exceeds: String,
}

impl Default for DeltaColors {
    fn default() -> Self {
        Self {
            neutral: "black".to_string(),
            a_exceeds: "#3197e9".to_string(),
            b_exceeds: "#d63131".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_folder: PathBuf::from("race_data"),
            extension: "csv".to_string(),
            delta_threshold: 1.0,
            axis_headroom: 1.7,
            bar_gap: 0.01,
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            colors: DeltaColors::default(),
        }
    }
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut config: Config = serde_yaml::from_str(content)?;
        config.extension = config.extension.trim_start_matches('.').to_string();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.extension.is_empty() {
            anyhow::bail!("extension must not be empty");
        }
        if self.palette.is_empty() {
            anyhow::bail!("palette needs at least one colour");
        }
        if !(self.axis_headroom > 0.0) || self.bar_gap < 0.0 || self.delta_threshold < 0.0 {
            anyhow::bail!("axis_headroom must be positive; bar_gap and delta_threshold non-negative");
        }
        Ok(())
    }
}

/// Environment overrides loaded from .env
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub data_dir: Option<PathBuf>,
    pub port: u16,
    pub log_dir: String,
}

impl Secrets {
    /// Load secrets from .env file
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        Secrets {
            data_dir: std::env::var("DATA_DIR").ok().map(PathBuf::from),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8501),
            log_dir: std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        }
    }

    /// Data root: DATA_DIR wins over the config file
    pub fn data_root(&self, config: &Config) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| config.data_folder.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.data_folder, PathBuf::from("race_data"));
        assert_eq!(config.extension, "csv");
        assert_eq!(config.palette.len(), 11);
        assert_eq!(config.delta_threshold, 1.0);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("extension: .tsv\ndelta_threshold: 0.5\n").unwrap();
        assert_eq!(config.extension, "tsv");
        assert_eq!(config.delta_threshold, 0.5);
        assert_eq!(config.axis_headroom, 1.7);
        assert_eq!(config.colors.b_exceeds, "#d63131");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Config::from_yaml("extension: ''\n").is_err());
        assert!(Config::from_yaml("palette: []\n").is_err());
        assert!(Config::from_yaml("axis_headroom: 0\n").is_err());
    }

    #[test]
    fn test_data_dir_override() {
        let config = Config::default();
        let secrets = Secrets {
            data_dir: Some(PathBuf::from("/srv/races")),
            ..Secrets::default()
        };
        assert_eq!(secrets.data_root(&config), PathBuf::from("/srv/races"));
        assert_eq!(Secrets::default().data_root(&config), PathBuf::from("race_data"));
    }
}

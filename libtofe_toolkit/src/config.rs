use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::ConfigError;
use super::splitter::{OverflowPolicy, SplitOptions};

/// Structure representing a splitting job. Contains the cut files to split, the reference cut
/// and the split settings. Configs are seralizable and deserializable to YAML using serde and
/// serde_yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub cut_paths: Vec<PathBuf>,
    pub reference_path: PathBuf,
    pub split_count: usize,
    #[serde(default)]
    pub overflow: OverflowPolicy,
    #[serde(default = "default_weight_factor")]
    pub weight_factor: f64,
    pub save_splits: bool,
    #[serde(default)]
    pub command_path: Option<PathBuf>,
}

fn default_weight_factor() -> f64 {
    1.0
}

impl Default for Config {
    /// Generate a new Config object. Paths will be empty/invalid
    fn default() -> Self {
        Self {
            cut_paths: Vec::new(),
            reference_path: PathBuf::from("None"),
            split_count: 1,
            overflow: OverflowPolicy::default(),
            weight_factor: default_weight_factor(),
            save_splits: true,
            command_path: None,
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Write the configuration to a YAML file
    pub fn write_config_file(&self, config_path: &Path) -> Result<(), ConfigError> {
        let yaml_str = serde_yaml::to_string(self)?;
        std::fs::write(config_path, yaml_str)?;
        Ok(())
    }

    pub fn is_split_count_valid(&self) -> bool {
        self.split_count >= 1
    }

    pub fn has_command_file(&self) -> bool {
        self.command_path.is_some()
    }

    pub fn split_options(&self) -> SplitOptions {
        SplitOptions {
            overflow: self.overflow,
            additional_weight_factor: self.weight_factor,
        }
    }
}

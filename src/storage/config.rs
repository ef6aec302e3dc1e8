//! JSON Configuration Management
//!
//! Handles reading and writing the orchestrator configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::settings::{OrchestratorSettings, SettingsUpdate};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, ensure_dir};

/// Configuration service for managing orchestrator settings
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    config: OrchestratorSettings,
}

impl ConfigService {
    /// Load the default config file (~/.step-analysis/config.json), creating
    /// it with defaults if absent
    pub fn new() -> AppResult<Self> {
        Self::open(config_path()?)
    }

    /// Load the config file at `path`, creating it with defaults if absent
    pub fn open(config_path: impl Into<PathBuf>) -> AppResult<Self> {
        let config_path = config_path.into();
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_dir(parent)?;
            }
        }

        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            tracing::info!("[Config] Writing default settings to {}", config_path.display());
            let default_config = OrchestratorSettings::default();
            Self::save_to_file(&config_path, &default_config)?;
            default_config
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a file
    fn load_from_file(path: &Path) -> AppResult<OrchestratorSettings> {
        let content = fs::read_to_string(path)?;
        let config: OrchestratorSettings = serde_json::from_str(&content)?;
        config.validate().map_err(AppError::validation)?;
        Ok(config)
    }

    /// Save configuration to a file with pretty formatting
    fn save_to_file(path: &Path, config: &OrchestratorSettings) -> AppResult<()> {
        config.validate().map_err(AppError::validation)?;
        let content = serde_json::to_string_pretty(config)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the current configuration
    pub fn get_config(&self) -> &OrchestratorSettings {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Update the configuration with a partial update.
    ///
    /// An update that fails validation is not applied.
    pub fn update_config(&mut self, update: SettingsUpdate) -> AppResult<OrchestratorSettings> {
        let mut next = self.config.clone();
        next.apply_update(update);
        Self::save_to_file(&self.config_path, &next)?;
        self.config = next;
        Ok(self.config.clone())
    }

    /// Reload configuration from disk
    pub fn reload(&mut self) -> AppResult<()> {
        self.config = Self::load_from_file(&self.config_path)?;
        Ok(())
    }
}

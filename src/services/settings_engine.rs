// Settings Engine
// Loads, saves and updates navigation settings stored as a JSON file.

use std::fs;
use std::path::Path;

use crate::types::errors::SettingsError;
use crate::types::settings::NavigationSettings;

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<NavigationSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &NavigationSettings;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

/// Settings engine persisting [`NavigationSettings`] as JSON on disk.
pub struct SettingsEngine {
    config_path: String,
    settings: NavigationSettings,
}

impl SettingsEngine {
    pub fn new(config_path: impl Into<String>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: NavigationSettings::default(),
        }
    }

    /// Rejects settings the navigation service cannot work with.
    pub fn validate(settings: &NavigationSettings) -> Result<(), SettingsError> {
        if settings.storage_key.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "storage_key cannot be empty".to_string(),
            ));
        }
        if settings.query_param.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "query_param cannot be empty".to_string(),
            ));
        }
        if settings.token_ttl_ms <= 0 {
            return Err(SettingsError::InvalidValue(format!(
                "token_ttl_ms must be positive, got {}",
                settings.token_ttl_ms
            )));
        }
        if !settings.default_fallback.starts_with('/') {
            return Err(SettingsError::InvalidValue(format!(
                "default_fallback must be an absolute path, got '{}'",
                settings.default_fallback
            )));
        }
        Ok(())
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from the JSON config file.
    ///
    /// A missing file yields defaults; a malformed or invalid one is an error.
    fn load(&mut self) -> Result<NavigationSettings, SettingsError> {
        let path = Path::new(&self.config_path);

        if !path.exists() {
            log::debug!("No settings at {}, using defaults", self.config_path);
            self.settings = NavigationSettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;

        let settings: NavigationSettings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })?;
        Self::validate(&settings)?;

        self.settings = settings;
        Ok(self.settings.clone())
    }

    /// Writes the current settings, creating parent directories as needed.
    fn save(&self) -> Result<(), SettingsError> {
        let path = Path::new(&self.config_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn get_settings(&self) -> &NavigationSettings {
        &self.settings
    }

    /// Updates one top-level setting, validates the result, then saves.
    ///
    /// `"token_ttl_ms"` → `settings.token_ttl_ms`.
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        if key.is_empty() {
            return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
        }

        let mut json_value = serde_json::to_value(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        match json_value.as_object_mut() {
            Some(map) if map.contains_key(key) => {
                map.insert(key.to_string(), value);
            }
            _ => {
                return Err(SettingsError::InvalidKey(format!(
                    "Key '{}' not found in settings",
                    key
                )));
            }
        }

        let new_settings: NavigationSettings = serde_json::from_value(json_value).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;
        Self::validate(&new_settings)?;

        self.settings = new_settings;
        self.save()?;

        Ok(())
    }

    /// Resets all settings to defaults and saves to disk.
    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = NavigationSettings::default();
        self.save()?;
        Ok(())
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}

// File: ./src/config.rs
// Handles configuration loading, saving, and defaults.
use crate::context::AppContext;
use crate::model::{Role, SynonymTable, TeacherProfile};
use crate::storage::LocalStorage;
use anyhow::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub teacher_name: String,
    #[serde(default)]
    pub teacher_email: String,
    /// Class the teacher is homeroom teacher of, if any.
    #[serde(default)]
    pub homeroom_class: Option<String>,
    /// Class used when neither the input nor the timetable names one.
    #[serde(default)]
    pub default_class: String,
    #[serde(default)]
    pub role: Role,
    /// Remove the `DD/MM` birthday hint from the text before name matching.
    #[serde(default)]
    pub strict_dob_hint: bool,
    /// Extra phrasings per tag label; replaces the built-in list for that label.
    #[serde(default)]
    pub tag_synonyms: HashMap<String, Vec<String>>,
}

impl Config {
    /// Load the configuration from disk using an explicit context.
    /// Returns a contextualized error if reading or parsing fails.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found"));
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;

        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(ctx: &dyn AppContext) -> Result<Self> {
        match Self::load(ctx) {
            Ok(c) => Ok(c),
            Err(e) if Self::is_missing_config_error(&e) => {
                log::debug!("No config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn is_missing_config_error(err: &Error) -> bool {
        if err.to_string().contains("Config file not found") {
            return true;
        }
        for cause in err.chain() {
            if let Some(io_err) = cause.downcast_ref::<std::io::Error>()
                && io_err.kind() == std::io::ErrorKind::NotFound
            {
                return true;
            }
        }
        false
    }

    /// Save configuration using an explicit context.
    pub fn save(&self, ctx: &dyn AppContext) -> Result<()> {
        let path = ctx.get_config_file_path()?;
        LocalStorage::with_lock(&path, || {
            let toml_str = toml::to_string_pretty(self)?;
            LocalStorage::atomic_write(&path, toml_str)?;
            Ok(())
        })?;
        Ok(())
    }

    /// Built-in synonyms with the configured entries layered on top.
    pub fn synonyms(&self) -> SynonymTable {
        let mut table = SynonymTable::default();
        table.merge(&SynonymTable::from_map(&self.tag_synonyms));
        table
    }

    pub fn profile(&self) -> TeacherProfile {
        TeacherProfile {
            teacher_name: self.teacher_name.clone(),
            teacher_email: self.teacher_email.clone(),
        }
    }

    /// Class a fresh session starts in: homeroom teachers start in their own class.
    pub fn starting_class(&self) -> String {
        match (self.role, &self.homeroom_class) {
            (Role::HomeroomTeacher, Some(c)) => c.clone(),
            _ => self.default_class.clone(),
        }
    }
}

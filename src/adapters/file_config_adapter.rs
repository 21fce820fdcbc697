//! INI strategy file adapter backed by `configparser`.
//!
//! Section and key names are case-insensitive (lowercased on load).

use crate::domain::error::PolyedgeError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PolyedgeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_string(&content).map_err(|e| match e {
            PolyedgeError::ConfigParse { reason, .. } => PolyedgeError::ConfigParse {
                file: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    pub fn from_string(content: &str) -> Result<Self, PolyedgeError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| PolyedgeError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, String> {
        self.config.getint(section, key)
    }

    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, String> {
        self.config.getfloat(section, key)
    }

    fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, String> {
        match self.get_string(section, key) {
            None => Ok(None),
            Some(v) => Self::parse_bool(&v)
                .map(Some)
                .ok_or_else(|| format!("'{v}' is not a boolean")),
        }
    }

    fn sections(&self) -> Vec<String> {
        let mut sections = self.config.sections();
        sections.sort();
        sections
    }

    fn keys(&self, section: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .config
            .get_map_ref()
            .get(&section.to_lowercase())
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

//! Registry load configuration
//!
//! This module provides the configuration structure selecting where the
//! catalogue is read from and how strictly record names are checked.

use crate::error::{ConfigError, ConfigResult};
use crate::tables::{DEFAULT_MAX_NAME_LEN, WIRE_MAX_NAME_LEN};
use std::path::{Path, PathBuf};

/// Where the catalogue comes from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CatalogueSource {
    /// Catalogue embedded in the library
    #[default]
    Bundled,
    /// JSON catalogue on disk
    JsonFile(PathBuf),
    /// Length-prefixed binary catalogue on disk
    BinaryFile(PathBuf),
}

impl CatalogueSource {
    /// Pick the format from the file extension (`.json`, anything else is binary)
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            CatalogueSource::JsonFile(path.to_path_buf())
        } else {
            CatalogueSource::BinaryFile(path.to_path_buf())
        }
    }

    /// Short description for log lines
    pub fn describe(&self) -> String {
        match self {
            CatalogueSource::Bundled => "bundled catalogue".to_string(),
            CatalogueSource::JsonFile(path) => format!("JSON file {}", path.display()),
            CatalogueSource::BinaryFile(path) => format!("binary file {}", path.display()),
        }
    }
}

/// Registry load configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadConfig {
    /// Catalogue source
    pub source: CatalogueSource,
    /// Longest accepted preset name, in bytes
    pub max_name_len: usize,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            source: CatalogueSource::Bundled,
            max_name_len: DEFAULT_MAX_NAME_LEN,
        }
    }
}

impl LoadConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the catalogue source
    pub fn source(mut self, source: CatalogueSource) -> Self {
        self.source = source;
        self
    }

    /// Read the catalogue from a file, format chosen by extension
    pub fn path(self, path: impl AsRef<Path>) -> Self {
        self.source(CatalogueSource::from_path(path))
    }

    /// Set the name length limit
    pub fn max_name_len(mut self, max_name_len: usize) -> Self {
        self.max_name_len = max_name_len;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_name_len == 0 || self.max_name_len > WIRE_MAX_NAME_LEN {
            return Err(ConfigError::InvalidMaxNameLen(self.max_name_len));
        }

        match &self.source {
            CatalogueSource::JsonFile(path) | CatalogueSource::BinaryFile(path)
                if path.as_os_str().is_empty() =>
            {
                Err(ConfigError::EmptyPath)
            }
            _ => Ok(()),
        }
    }
}

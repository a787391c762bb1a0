//! JSON catalogue format
//!
//! The bundled catalogue is `data/presets.json`, embedded at compile time.
//! The same format can be read from disk, so presets can be added or
//! edited without rebuilding.

use crate::error::{FormatError, FormatResult};
use crate::tables::JSON_VERSION;
use crate::types::RawPreset;
use serde::{Deserialize, Serialize};

/// Catalogue embedded in the library
pub const BUNDLED_CATALOGUE: &str = include_str!("../data/presets.json");

/// Top-level JSON document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogueFile {
    /// Schema version, currently 1
    pub version: u32,
    /// Presets in registration order
    pub presets: Vec<RawPreset>,
}

/// Parse a JSON catalogue into unvalidated records
pub fn parse_json(text: &str) -> FormatResult<Vec<RawPreset>> {
    let file: CatalogueFile = serde_json::from_str(text)?;
    if file.version != JSON_VERSION {
        return Err(FormatError::UnsupportedVersion(file.version));
    }
    Ok(file.presets)
}

/// Serialize records as a JSON catalogue
pub fn to_json_string(presets: Vec<RawPreset>) -> FormatResult<String> {
    let file = CatalogueFile {
        version: JSON_VERSION,
        presets,
    };
    Ok(serde_json::to_string_pretty(&file)?)
}

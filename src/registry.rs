//! Preset table registry
//!
//! The registry is built once from a catalogue and is read-only afterwards.
//! Construction is all-or-nothing: the first invalid or colliding record
//! fails the whole load and no partial registry is returned. Lookups by
//! table id and by name are hash lookups; iteration follows registration
//! order.

use crate::binary::{decode_catalogue, encode_catalogue};
use crate::catalogue::{parse_json, to_json_string, BUNDLED_CATALOGUE};
use crate::config::{CatalogueSource, LoadConfig};
use crate::error::{
    FormatResult, LookupResult, MalformedKind, MalformedRecordError, NotFound, Result,
};
use crate::tables::DEFAULT_MAX_NAME_LEN;
use crate::types::{PresetRecord, RawPreset};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fs;

/// Immutable, keyed collection of codec presets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    records: Vec<PresetRecord>,
    by_id: HashMap<u16, usize>,
    by_name: HashMap<String, usize>,
}

impl Registry {
    /// Build the registry from the bundled catalogue
    pub fn load() -> Result<Self> {
        Self::load_with(&LoadConfig::default())
    }

    /// Build the registry from the configured source
    pub fn load_with(config: &LoadConfig) -> Result<Self> {
        config.validate()?;

        let result = Self::read_source(&config.source)
            .and_then(|raw| Ok(Self::build(raw, config.max_name_len)?));

        match result {
            Ok(registry) => {
                info!(
                    "Loaded {} presets from {}",
                    registry.len(),
                    config.source.describe()
                );
                Ok(registry)
            }
            Err(err) => {
                warn!("Rejected {}: {}", config.source.describe(), err);
                Err(err)
            }
        }
    }

    fn read_source(source: &CatalogueSource) -> Result<Vec<RawPreset>> {
        match source {
            CatalogueSource::Bundled => Ok(parse_json(BUNDLED_CATALOGUE)?),
            CatalogueSource::JsonFile(path) => Ok(parse_json(&fs::read_to_string(path)?)?),
            CatalogueSource::BinaryFile(path) => decode_catalogue(&fs::read(path)?),
        }
    }

    /// Build from in-memory records with the default name limit
    pub fn from_raw(presets: Vec<RawPreset>) -> std::result::Result<Self, MalformedRecordError> {
        Self::build(presets, DEFAULT_MAX_NAME_LEN)
    }

    /// Build from in-memory records with an explicit configuration
    ///
    /// Only `max_name_len` is used; `source` is ignored.
    pub fn from_raw_with(presets: Vec<RawPreset>, config: &LoadConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(presets, config.max_name_len)?)
    }

    /// Build from JSON catalogue text
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(Self::build(parse_json(text)?, DEFAULT_MAX_NAME_LEN)?)
    }

    /// Build from a binary catalogue
    pub fn from_binary(data: &[u8]) -> Result<Self> {
        Ok(Self::build(decode_catalogue(data)?, DEFAULT_MAX_NAME_LEN)?)
    }

    fn build(
        presets: Vec<RawPreset>,
        max_name_len: usize,
    ) -> std::result::Result<Self, MalformedRecordError> {
        let mut records = Vec::with_capacity(presets.len());
        let mut by_id = HashMap::with_capacity(presets.len());
        let mut by_name = HashMap::with_capacity(presets.len());

        for (index, preset) in presets.iter().enumerate() {
            let record = PresetRecord::from_raw(preset, index, max_name_len)?;

            // A later record must never shadow an earlier id
            if let Some(&first_index) = by_id.get(&record.table_id()) {
                return Err(MalformedRecordError::new(
                    index,
                    record.name(),
                    MalformedKind::DuplicateTableId {
                        table_id: record.table_id(),
                        first_index,
                    },
                ));
            }
            if let Some(&first_index) = by_name.get(record.name()) {
                return Err(MalformedRecordError::new(
                    index,
                    record.name(),
                    MalformedKind::DuplicateName { first_index },
                ));
            }

            debug!(
                "Registered {:?} table_id={} {}x{}/{} fields={}",
                record.name(),
                record.table_id(),
                record.h_size(),
                record.y_size_ntsc(),
                record.y_size_pal(),
                record.num_fields()
            );

            by_id.insert(record.table_id(), index);
            by_name.insert(record.name().to_string(), index);
            records.push(record);
        }

        Ok(Self {
            records,
            by_id,
            by_name,
        })
    }

    /// Look up a preset by its table id
    pub fn find_by_id(&self, table_id: u16) -> LookupResult<&PresetRecord> {
        self.by_id
            .get(&table_id)
            .map(|&index| &self.records[index])
            .ok_or(NotFound::Id(table_id))
    }

    /// Look up a preset by name (exact, case-sensitive)
    pub fn find_by_name(&self, name: &str) -> LookupResult<&PresetRecord> {
        self.by_name
            .get(name)
            .map(|&index| &self.records[index])
            .ok_or_else(|| NotFound::Name(name.to_string()))
    }

    /// Every preset in registration order
    pub fn all(&self) -> std::slice::Iter<'_, PresetRecord> {
        self.records.iter()
    }

    /// Table ids in registration order
    pub fn ids(&self) -> impl Iterator<Item = u16> + '_ {
        self.records.iter().map(PresetRecord::table_id)
    }

    pub fn contains_id(&self, table_id: u16) -> bool {
        self.by_id.contains_key(&table_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Export as a JSON catalogue
    pub fn to_json_string(&self) -> FormatResult<String> {
        to_json_string(self.records.iter().map(PresetRecord::to_raw).collect())
    }

    /// Export as a binary catalogue
    pub fn to_binary(&self) -> Result<Vec<u8>> {
        encode_catalogue(self.records.iter())
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a PresetRecord;
    type IntoIter = std::slice::Iter<'a, PresetRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.all()
    }
}

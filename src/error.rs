//! Error types for the preset registry
//!
//! This module defines all error types used when loading, validating and
//! querying the preset catalogue.

use thiserror::Error;

/// Main error type for the preset registry
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A record violated a data model invariant; the whole load fails
    #[error("Malformed record: {0}")]
    MalformedRecord(#[from] MalformedRecordError),

    /// Lookup for an absent key
    #[error("Preset not found: {0}")]
    NotFound(#[from] NotFound),

    /// Catalogue encoding errors
    #[error("Catalogue format error: {0}")]
    Format(#[from] FormatError),

    /// Load configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Reading a catalogue file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A record that cannot enter the registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("record #{index} ({name}): {kind}")]
pub struct MalformedRecordError {
    /// Position of the record in the source, 0-based
    pub index: usize,
    /// Record name as given in the source (may be empty)
    pub name: String,
    /// What was wrong
    pub kind: MalformedKind,
}

impl MalformedRecordError {
    pub fn new(index: usize, name: impl Into<String>, kind: MalformedKind) -> Self {
        Self {
            index,
            name: name.into(),
            kind,
        }
    }
}

/// Invariant violations detected while validating a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedKind {
    /// Quantization block with the wrong number of entries
    #[error("{table} block {block} has {actual} entries, expected {expected}")]
    BlockLength {
        table: &'static str,
        block: usize,
        expected: usize,
        actual: usize,
    },

    /// Quantization table with the wrong number of blocks
    #[error("{table} has {actual} blocks, expected {expected}")]
    BlockCount {
        table: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Flat quantization table with the wrong number of entries
    #[error("{table} has {actual} entries, expected {expected}")]
    TableLength {
        table: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Field value does not fit its declared width
    #[error("{field} value {value} is out of range")]
    ValueOutOfRange { field: &'static str, value: i64 },

    /// Frame geometry below zero
    #[error("{field} is negative ({value})")]
    NegativeDimension { field: &'static str, value: i64 },

    /// Field count other than 1 (progressive) or 2 (interlaced)
    #[error("num_fields must be 1 or 2, got {0}")]
    InvalidNumFields(i64),

    /// Empty preset name
    #[error("name is empty")]
    EmptyName,

    /// Preset name longer than the configured limit
    #[error("name is {len} bytes, limit is {max}")]
    NameTooLong { len: usize, max: usize },

    /// Table id already taken by an earlier record
    #[error("table_id {table_id} already used by record #{first_index}")]
    DuplicateTableId { table_id: u16, first_index: usize },

    /// Name already taken by an earlier record
    #[error("name already used by record #{first_index}")]
    DuplicateName { first_index: usize },
}

/// Lookup miss; callers treat it as a recoverable condition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFound {
    #[error("no preset with table_id {0}")]
    Id(u16),

    #[error("no preset named {0:?}")]
    Name(String),
}

/// Catalogue encoding errors
#[derive(Debug, Error)]
pub enum FormatError {
    /// Binary catalogue does not start with the expected magic
    #[error("Bad magic: expected \"AVRP\", got {0:02X?}")]
    BadMagic([u8; 4]),

    /// Catalogue written by a newer or unknown format version
    #[error("Unsupported catalogue version {0}")]
    UnsupportedVersion(u32),

    /// Input ended before a field could be read
    #[error("Truncated input: needed {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Record body length disagrees with the fields it contains
    #[error("Record #{index} body is {declared} bytes but {consumed} were decoded")]
    BodyLengthMismatch {
        index: usize,
        declared: usize,
        consumed: usize,
    },

    /// Preset name is not valid UTF-8
    #[error("Invalid UTF-8 in record #{index} name")]
    InvalidName { index: usize },

    /// Bytes left over after the last record
    #[error("{0} trailing bytes after last record")]
    TrailingBytes(usize),

    /// Too many records, or a field too large, to encode
    #[error("Cannot encode {what}: {value} exceeds {max}")]
    EncodeOverflow {
        what: &'static str,
        value: usize,
        max: usize,
    },

    /// JSON catalogue parse/serialize failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Name length limit outside 1..=255
    #[error("Invalid max_name_len {0}: must be between 1 and 255")]
    InvalidMaxNameLen(usize),

    /// File source with an empty path
    #[error("Catalogue path is empty")]
    EmptyPath,
}

/// Specialized result types for different modules
pub type Result<T> = std::result::Result<T, RegistryError>;
pub type LookupResult<T> = std::result::Result<T, NotFound>;
pub type FormatResult<T> = std::result::Result<T, FormatError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

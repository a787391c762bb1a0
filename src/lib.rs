//! # AVR Presets
//!
//! A catalogue of AVR video codec presets. Each preset carries a name, a
//! stable numeric table id, a quality factor, NTSC/PAL frame geometry, a
//! target compressed frame size and two quantization tables (8-bit and
//! 16-bit, three zig-zag ordered 64-entry blocks each).
//!
//! The catalogue is data, not code: it ships as an embedded JSON file and
//! can also be read from JSON or length-prefixed binary files at runtime.
//! A [`Registry`] is built once, validated as a whole, and then shared
//! read-only with whatever encoder or decoder needs it.
//!
//! Only the AVR1 record of the bundled catalogue carries real values. The
//! other presets keep their real names, but their table ids, geometry and
//! quantization steps are placeholders. Load the real catalogue with
//! `Registry::load_with(&LoadConfig::new().path(..))` before relying on
//! a table id.
//!
//! ```no_run
//! use avr_presets::Registry;
//!
//! let registry = Registry::load()?;
//! let avr1 = registry.find_by_name("AVR1")?;
//! assert_eq!(registry.find_by_id(avr1.table_id())?, avr1);
//! # Ok::<(), avr_presets::RegistryError>(())
//! ```

pub mod binary;
pub mod catalogue;
pub mod config;
pub mod error;
pub mod registry;
pub mod tables;
pub mod types;

pub use config::{CatalogueSource, LoadConfig};
pub use error::{
    ConfigError, FormatError, MalformedKind, MalformedRecordError, NotFound, RegistryError,
};
pub use registry::Registry;
pub use types::{
    FieldMode, PresetRecord, Quant16Table, Quant8Table, QuantStep, QuantTable, RawPreset,
    VideoStandard,
};

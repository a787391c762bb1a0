//! Preset record types
//!
//! `RawPreset` is the unvalidated, serde-facing shape of one catalogue
//! entry. `PresetRecord` is the validated, immutable form held by the
//! registry. Conversion between the two is the only place record-level
//! invariants are checked.

use crate::error::{MalformedKind, MalformedRecordError};
use crate::tables::{
    BLOCK_COUNT, BLOCK_LEN, NATURAL_TO_ZIGZAG, QUANT16_SENTINEL_MIN, QUANT8_SENTINEL,
    QUANT_TABLE_LEN, ZIGZAG_TO_NATURAL,
};
use serde::{Deserialize, Serialize};

/// One quantization step width (u8 or u16)
pub trait QuantStep: Copy + Default + Into<i64> + TryFrom<i64> {
    /// True for "do not quantize / maximum step" entries
    fn is_sentinel(self) -> bool;
}

impl QuantStep for u8 {
    fn is_sentinel(self) -> bool {
        self == QUANT8_SENTINEL
    }
}

impl QuantStep for u16 {
    fn is_sentinel(self) -> bool {
        self >= QUANT16_SENTINEL_MIN
    }
}

/// Three 64-entry quantization blocks, stored in zig-zag order exactly as given
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuantTable<T> {
    blocks: [[T; BLOCK_LEN]; BLOCK_COUNT],
}

/// 8-bit quantization table
pub type Quant8Table = QuantTable<u8>;

/// 16-bit quantization table
pub type Quant16Table = QuantTable<u16>;

impl<T: QuantStep> QuantTable<T> {
    pub fn from_blocks(blocks: [[T; BLOCK_LEN]; BLOCK_COUNT]) -> Self {
        Self { blocks }
    }

    /// Build from a flat 192-entry slice; `None` for any other length
    pub fn from_slice(values: &[T]) -> Option<Self> {
        if values.len() != QUANT_TABLE_LEN {
            return None;
        }
        let mut blocks = [[T::default(); BLOCK_LEN]; BLOCK_COUNT];
        for (block, chunk) in blocks.iter_mut().zip(values.chunks_exact(BLOCK_LEN)) {
            block.copy_from_slice(chunk);
        }
        Some(Self { blocks })
    }

    /// Build from blocks given in row-major 8x8 order, storing them zig-zagged
    pub fn from_natural_order(natural: &[[T; BLOCK_LEN]; BLOCK_COUNT]) -> Self {
        let mut blocks = [[T::default(); BLOCK_LEN]; BLOCK_COUNT];
        for (block, rows) in blocks.iter_mut().zip(natural.iter()) {
            for (index, &value) in rows.iter().enumerate() {
                block[NATURAL_TO_ZIGZAG[index]] = value;
            }
        }
        Self { blocks }
    }

    /// Validate nested integer blocks as read from a catalogue
    pub(crate) fn from_raw_blocks(
        table: &'static str,
        raw: &[Vec<i64>],
    ) -> Result<Self, MalformedKind> {
        if raw.len() != BLOCK_COUNT {
            return Err(MalformedKind::BlockCount {
                table,
                expected: BLOCK_COUNT,
                actual: raw.len(),
            });
        }

        let mut blocks = [[T::default(); BLOCK_LEN]; BLOCK_COUNT];
        for (b, (block, values)) in blocks.iter_mut().zip(raw).enumerate() {
            if values.len() != BLOCK_LEN {
                return Err(MalformedKind::BlockLength {
                    table,
                    block: b,
                    expected: BLOCK_LEN,
                    actual: values.len(),
                });
            }
            for (slot, &value) in block.iter_mut().zip(values) {
                *slot = T::try_from(value)
                    .map_err(|_| MalformedKind::ValueOutOfRange { field: table, value })?;
            }
        }
        Ok(Self { blocks })
    }

    pub fn blocks(&self) -> &[[T; BLOCK_LEN]; BLOCK_COUNT] {
        &self.blocks
    }

    /// One block in stored (zig-zag) order
    pub fn block(&self, index: usize) -> Option<&[T; BLOCK_LEN]> {
        self.blocks.get(index)
    }

    /// Copy of one block rearranged into row-major 8x8 order
    pub fn block_natural_order(&self, index: usize) -> Option<[T; BLOCK_LEN]> {
        let block = self.blocks.get(index)?;
        let mut natural = [T::default(); BLOCK_LEN];
        for (zigzag, &value) in block.iter().enumerate() {
            natural[ZIGZAG_TO_NATURAL[zigzag]] = value;
        }
        Some(natural)
    }

    /// All 192 entries, block by block
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.blocks.iter().flat_map(|block| block.iter().copied())
    }

    pub fn len(&self) -> usize {
        QUANT_TABLE_LEN
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    pub fn sentinel_count(&self) -> usize {
        self.iter().filter(|v| v.is_sentinel()).count()
    }

    fn to_raw_blocks(&self) -> Vec<Vec<i64>> {
        self.blocks
            .iter()
            .map(|block| block.iter().map(|&v| Into::<i64>::into(v)).collect::<Vec<i64>>())
            .collect()
    }
}

/// Progressive or interlaced frame layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldMode {
    /// One field per frame
    Progressive = 1,
    /// Two interlaced fields per frame
    Interlaced = 2,
}

impl FieldMode {
    pub fn num_fields(self) -> u8 {
        self as u8
    }
}

impl TryFrom<i64> for FieldMode {
    type Error = MalformedKind;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(FieldMode::Progressive),
            2 => Ok(FieldMode::Interlaced),
            other => Err(MalformedKind::InvalidNumFields(other)),
        }
    }
}

/// Video standard selecting the vertical geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoStandard {
    Ntsc,
    Pal,
}

/// Unvalidated catalogue entry
///
/// Numeric fields are wide signed integers and tables are nested lists so
/// that range and shape problems surface as [`MalformedRecordError`]s
/// rather than parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawPreset {
    pub name: String,
    pub table_id: i64,
    pub q_factor: i64,
    pub h_size: i64,
    pub y_size_ntsc: i64,
    pub y_size_pal: i64,
    pub leading_lines_ntsc: i64,
    pub leading_lines_pal: i64,
    pub num_fields: i64,
    pub target_frame_size: i64,
    /// Three blocks of 64 byte steps
    pub quant8: Vec<Vec<i64>>,
    /// Three blocks of 64 16-bit steps
    pub quant16: Vec<Vec<i64>>,
}

/// A validated codec preset
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PresetRecord {
    name: String,
    table_id: u16,
    q_factor: i32,
    h_size: u16,
    y_size_ntsc: u16,
    y_size_pal: u16,
    leading_lines_ntsc: u16,
    leading_lines_pal: u16,
    field_mode: FieldMode,
    target_frame_size: u32,
    quant8: Quant8Table,
    quant16: Quant16Table,
}

fn dimension(field: &'static str, value: i64) -> Result<u16, MalformedKind> {
    if value < 0 {
        return Err(MalformedKind::NegativeDimension { field, value });
    }
    u16::try_from(value).map_err(|_| MalformedKind::ValueOutOfRange { field, value })
}

fn ranged<T: TryFrom<i64>>(field: &'static str, value: i64) -> Result<T, MalformedKind> {
    T::try_from(value).map_err(|_| MalformedKind::ValueOutOfRange { field, value })
}

impl PresetRecord {
    /// Validate one catalogue entry. `index` is its position in the source.
    pub fn from_raw(
        raw: &RawPreset,
        index: usize,
        max_name_len: usize,
    ) -> Result<Self, MalformedRecordError> {
        Self::check(raw, max_name_len)
            .map_err(|kind| MalformedRecordError::new(index, raw.name.as_str(), kind))
    }

    fn check(raw: &RawPreset, max_name_len: usize) -> Result<Self, MalformedKind> {
        if raw.name.is_empty() {
            return Err(MalformedKind::EmptyName);
        }
        if raw.name.len() > max_name_len {
            return Err(MalformedKind::NameTooLong {
                len: raw.name.len(),
                max: max_name_len,
            });
        }

        Ok(Self {
            name: raw.name.clone(),
            table_id: ranged("table_id", raw.table_id)?,
            q_factor: ranged("q_factor", raw.q_factor)?,
            h_size: dimension("h_size", raw.h_size)?,
            y_size_ntsc: dimension("y_size_ntsc", raw.y_size_ntsc)?,
            y_size_pal: dimension("y_size_pal", raw.y_size_pal)?,
            leading_lines_ntsc: dimension("leading_lines_ntsc", raw.leading_lines_ntsc)?,
            leading_lines_pal: dimension("leading_lines_pal", raw.leading_lines_pal)?,
            field_mode: FieldMode::try_from(raw.num_fields)?,
            target_frame_size: ranged("target_frame_size", raw.target_frame_size)?,
            quant8: QuantTable::from_raw_blocks("quant8", &raw.quant8)?,
            quant16: QuantTable::from_raw_blocks("quant16", &raw.quant16)?,
        })
    }

    /// Unvalidated form, for export
    pub fn to_raw(&self) -> RawPreset {
        RawPreset {
            name: self.name.clone(),
            table_id: self.table_id.into(),
            q_factor: self.q_factor.into(),
            h_size: self.h_size.into(),
            y_size_ntsc: self.y_size_ntsc.into(),
            y_size_pal: self.y_size_pal.into(),
            leading_lines_ntsc: self.leading_lines_ntsc.into(),
            leading_lines_pal: self.leading_lines_pal.into(),
            num_fields: self.field_mode.num_fields().into(),
            target_frame_size: self.target_frame_size.into(),
            quant8: self.quant8.to_raw_blocks(),
            quant16: self.quant16.to_raw_blocks(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_id(&self) -> u16 {
        self.table_id
    }

    /// Opaque quality factor; AVR and JFIF presets use different scales
    pub fn q_factor(&self) -> i32 {
        self.q_factor
    }

    pub fn h_size(&self) -> u16 {
        self.h_size
    }

    pub fn y_size_ntsc(&self) -> u16 {
        self.y_size_ntsc
    }

    pub fn y_size_pal(&self) -> u16 {
        self.y_size_pal
    }

    pub fn leading_lines_ntsc(&self) -> u16 {
        self.leading_lines_ntsc
    }

    pub fn leading_lines_pal(&self) -> u16 {
        self.leading_lines_pal
    }

    pub fn field_mode(&self) -> FieldMode {
        self.field_mode
    }

    pub fn num_fields(&self) -> u8 {
        self.field_mode.num_fields()
    }

    /// Rate-control hint in bytes, not a hard cap
    pub fn target_frame_size(&self) -> u32 {
        self.target_frame_size
    }

    pub fn quant8(&self) -> &Quant8Table {
        &self.quant8
    }

    pub fn quant16(&self) -> &Quant16Table {
        &self.quant16
    }

    pub fn y_size(&self, standard: VideoStandard) -> u16 {
        match standard {
            VideoStandard::Ntsc => self.y_size_ntsc,
            VideoStandard::Pal => self.y_size_pal,
        }
    }

    pub fn leading_lines(&self, standard: VideoStandard) -> u16 {
        match standard {
            VideoStandard::Ntsc => self.leading_lines_ntsc,
            VideoStandard::Pal => self.leading_lines_pal,
        }
    }

    /// Active lines in one field
    pub fn field_height(&self, standard: VideoStandard) -> u16 {
        self.y_size(standard) / u16::from(self.num_fields())
    }
}

//! Constants and lookup tables for AVR preset records
//!
//! This module contains the fixed table geometry shared by every preset,
//! the quantization sentinels, the binary catalogue header constants and
//! the JPEG zig-zag scan maps used to view a block in row-major order.

use lazy_static::lazy_static;

/// Entries per quantization block (one 8x8 block in zig-zag order)
pub const BLOCK_LEN: usize = 64;

/// Blocks per quantization table (one per colour/field plane)
pub const BLOCK_COUNT: usize = 3;

/// Total entries in one quantization table
pub const QUANT_TABLE_LEN: usize = BLOCK_LEN * BLOCK_COUNT;

/// 8-bit step meaning "do not quantize"
pub const QUANT8_SENTINEL: u8 = 255;

/// Lowest 16-bit step treated as "maximum/unused" (0xff00..=0xffff)
pub const QUANT16_SENTINEL_MIN: u16 = 0xff00;

/// Default upper bound on preset name length, in bytes
pub const DEFAULT_MAX_NAME_LEN: usize = 16;

/// Name length is stored as a u8 in the binary catalogue
pub const WIRE_MAX_NAME_LEN: usize = u8::MAX as usize;

/// Binary catalogue magic
pub const MAGIC: [u8; 4] = *b"AVRP";

/// Binary catalogue format version
pub const FORMAT_VERSION: u8 = 1;

/// JSON catalogue schema version
pub const JSON_VERSION: u32 = 1;

/// Maps zigzag index (0-63) to natural row-major index (0-63)
#[rustfmt::skip]
pub const ZIGZAG_TO_NATURAL: [usize; BLOCK_LEN] = [
     0,  1,  8, 16,  9,  2,  3, 10,
    17, 24, 32, 25, 18, 11,  4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13,  6,  7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
];

lazy_static! {
    /// Maps natural row-major index to zigzag index (inverse of ZIGZAG_TO_NATURAL)
    pub static ref NATURAL_TO_ZIGZAG: [usize; BLOCK_LEN] = {
        let mut table = [0usize; BLOCK_LEN];
        for (zigzag, &natural) in ZIGZAG_TO_NATURAL.iter().enumerate() {
            table[natural] = zigzag;
        }
        table
    };
}

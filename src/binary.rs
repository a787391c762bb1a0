//! Length-prefixed binary catalogue format
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! file   := magic "AVRP" | version u8 | count u16 | record{count}
//! record := body_len u32 | body
//! body   := name_len u8 | name | table_id u16 | q_factor i32 | h_size u16
//!           y_size_ntsc u16 | y_size_pal u16
//!           leading_lines_ntsc u16 | leading_lines_pal u16
//!           num_fields u8 | target_frame_size u32
//!           quant8_len u16 | u8{quant8_len}
//!           quant16_len u16 | u16{quant16_len}
//! ```
//!
//! Encoding problems are [`FormatError`]s. A well-formed file whose table
//! lengths are wrong yields a [`MalformedRecordError`], same as JSON input.

use crate::error::{FormatError, MalformedKind, MalformedRecordError, Result};
use crate::tables::{BLOCK_LEN, FORMAT_VERSION, MAGIC, QUANT_TABLE_LEN};
use crate::types::{PresetRecord, RawPreset};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::debug;
use std::io::{self, Cursor, Read, Write};

/// Header bytes before the first record: magic, version, count
const HEADER_LEN: usize = 7;

type Reader<'a> = Cursor<&'a [u8]>;

/// Run one read, turning a short read into `Truncated` at the current offset
fn read_field<'a, T>(
    reader: &mut Reader<'a>,
    needed: usize,
    read: impl FnOnce(&mut Reader<'a>) -> io::Result<T>,
) -> Result<T> {
    let offset = reader.position() as usize;
    match read(&mut *reader) {
        Ok(value) => Ok(value),
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Err(FormatError::Truncated {
            offset,
            needed,
            available: reader.get_ref().len().saturating_sub(offset),
        }
        .into()),
        Err(err) => Err(err.into()),
    }
}

fn checked_len<T: TryFrom<usize>>(what: &'static str, value: usize, max: usize) -> Result<T> {
    T::try_from(value).map_err(|_| FormatError::EncodeOverflow { what, value, max }.into())
}

fn write_record<W: Write>(writer: &mut W, record: &PresetRecord) -> Result<()> {
    let name = record.name().as_bytes();
    writer.write_u8(checked_len("name length", name.len(), u8::MAX as usize)?)?;
    writer.write_all(name)?;
    writer.write_u16::<LittleEndian>(record.table_id())?;
    writer.write_i32::<LittleEndian>(record.q_factor())?;
    writer.write_u16::<LittleEndian>(record.h_size())?;
    writer.write_u16::<LittleEndian>(record.y_size_ntsc())?;
    writer.write_u16::<LittleEndian>(record.y_size_pal())?;
    writer.write_u16::<LittleEndian>(record.leading_lines_ntsc())?;
    writer.write_u16::<LittleEndian>(record.leading_lines_pal())?;
    writer.write_u8(record.num_fields())?;
    writer.write_u32::<LittleEndian>(record.target_frame_size())?;

    writer.write_u16::<LittleEndian>(record.quant8().len() as u16)?;
    writer.write_all(&record.quant8().to_vec())?;
    writer.write_u16::<LittleEndian>(record.quant16().len() as u16)?;
    for step in record.quant16().iter() {
        writer.write_u16::<LittleEndian>(step)?;
    }
    Ok(())
}

/// Encode validated records as a binary catalogue
pub fn encode_catalogue<'a, I>(records: I) -> Result<Vec<u8>>
where
    I: ExactSizeIterator<Item = &'a PresetRecord>,
{
    let count = records.len();
    let mut out = Vec::with_capacity(HEADER_LEN + count * 640);
    out.write_all(&MAGIC)?;
    out.write_u8(FORMAT_VERSION)?;
    out.write_u16::<LittleEndian>(checked_len("record count", count, u16::MAX as usize)?)?;

    let mut body = Vec::new();
    for record in records {
        body.clear();
        write_record(&mut body, record)?;
        let body_len = checked_len("record body", body.len(), u32::MAX as usize)?;
        out.write_u32::<LittleEndian>(body_len)?;
        out.write_all(&body)?;
    }

    Ok(out)
}

fn split_blocks(values: Vec<i64>) -> Vec<Vec<i64>> {
    values.chunks(BLOCK_LEN).map(<[i64]>::to_vec).collect()
}

fn read_table_len(
    reader: &mut Reader<'_>,
    index: usize,
    name: &str,
    table: &'static str,
) -> Result<usize> {
    let len = usize::from(read_field(reader, 2, |r| r.read_u16::<LittleEndian>())?);
    if len != QUANT_TABLE_LEN {
        return Err(MalformedRecordError::new(
            index,
            name,
            MalformedKind::TableLength {
                table,
                expected: QUANT_TABLE_LEN,
                actual: len,
            },
        )
        .into());
    }
    Ok(len)
}

fn read_record(reader: &mut Reader<'_>, index: usize) -> Result<RawPreset> {
    let name_len = usize::from(read_field(reader, 1, |r| r.read_u8())?);
    let mut name = vec![0u8; name_len];
    read_field(reader, name_len, |r| r.read_exact(&mut name))?;
    let name = String::from_utf8(name).map_err(|_| FormatError::InvalidName { index })?;

    let table_id = read_field(reader, 2, |r| r.read_u16::<LittleEndian>())?;
    let q_factor = read_field(reader, 4, |r| r.read_i32::<LittleEndian>())?;
    let h_size = read_field(reader, 2, |r| r.read_u16::<LittleEndian>())?;
    let y_size_ntsc = read_field(reader, 2, |r| r.read_u16::<LittleEndian>())?;
    let y_size_pal = read_field(reader, 2, |r| r.read_u16::<LittleEndian>())?;
    let leading_lines_ntsc = read_field(reader, 2, |r| r.read_u16::<LittleEndian>())?;
    let leading_lines_pal = read_field(reader, 2, |r| r.read_u16::<LittleEndian>())?;
    let num_fields = read_field(reader, 1, |r| r.read_u8())?;
    let target_frame_size = read_field(reader, 4, |r| r.read_u32::<LittleEndian>())?;

    let len = read_table_len(reader, index, &name, "quant8")?;
    let mut quant8 = vec![0u8; len];
    read_field(reader, len, |r| r.read_exact(&mut quant8))?;

    let len = read_table_len(reader, index, &name, "quant16")?;
    let mut quant16 = vec![0u16; len];
    read_field(reader, len * 2, |r| r.read_u16_into::<LittleEndian>(&mut quant16))?;

    Ok(RawPreset {
        name,
        table_id: table_id.into(),
        q_factor: q_factor.into(),
        h_size: h_size.into(),
        y_size_ntsc: y_size_ntsc.into(),
        y_size_pal: y_size_pal.into(),
        leading_lines_ntsc: leading_lines_ntsc.into(),
        leading_lines_pal: leading_lines_pal.into(),
        num_fields: num_fields.into(),
        target_frame_size: target_frame_size.into(),
        quant8: split_blocks(quant8.into_iter().map(i64::from).collect()),
        quant16: split_blocks(quant16.into_iter().map(i64::from).collect()),
    })
}

/// Decode a binary catalogue into unvalidated records
pub fn decode_catalogue(data: &[u8]) -> Result<Vec<RawPreset>> {
    let mut reader = Cursor::new(data);

    let mut magic = [0u8; 4];
    read_field(&mut reader, MAGIC.len(), |r| r.read_exact(&mut magic))?;
    if magic != MAGIC {
        return Err(FormatError::BadMagic(magic).into());
    }
    let version = read_field(&mut reader, 1, |r| r.read_u8())?;
    if version != FORMAT_VERSION {
        return Err(FormatError::UnsupportedVersion(version.into()).into());
    }

    let count = usize::from(read_field(&mut reader, 2, |r| r.read_u16::<LittleEndian>())?);
    let mut presets = Vec::with_capacity(count);
    for index in 0..count {
        let declared = read_field(&mut reader, 4, |r| r.read_u32::<LittleEndian>())? as usize;
        let start = reader.position() as usize;
        let end = start
            .checked_add(declared)
            .filter(|&end| end <= data.len())
            .ok_or(FormatError::Truncated {
                offset: start,
                needed: declared,
                available: data.len() - start,
            })?;

        // body reader stops at the declared end but keeps absolute offsets
        let mut body = Cursor::new(&data[..end]);
        body.set_position(start as u64);
        let preset = read_record(&mut body, index)?;
        let consumed = body.position() as usize - start;
        if consumed != declared {
            return Err(FormatError::BodyLengthMismatch {
                index,
                declared,
                consumed,
            }
            .into());
        }
        debug!("Decoded record #{} {:?} ({} bytes)", index, preset.name, declared);
        presets.push(preset);
        reader.set_position(end as u64);
    }

    let remaining = data.len() - reader.position() as usize;
    if remaining != 0 {
        return Err(FormatError::TrailingBytes(remaining).into());
    }

    Ok(presets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use crate::tables::BLOCK_COUNT;

    fn record(name: &str, table_id: i64) -> PresetRecord {
        let raw = RawPreset {
            name: name.to_string(),
            table_id,
            q_factor: -3,
            h_size: 720,
            y_size_ntsc: 480,
            y_size_pal: 576,
            leading_lines_ntsc: 16,
            leading_lines_pal: 22,
            num_fields: 2,
            target_frame_size: 120_000,
            quant8: (0..BLOCK_COUNT)
                .map(|b| (0..BLOCK_LEN as i64).map(|i| i + b as i64).collect())
                .collect(),
            quant16: vec![vec![0xff00; BLOCK_LEN]; BLOCK_COUNT],
        };
        PresetRecord::from_raw(&raw, 0, 16).unwrap()
    }

    #[test]
    fn test_header_layout() {
        let records = [record("AVR6e", 6)];
        let bytes = encode_catalogue(records.iter()).unwrap();
        assert_eq!(&bytes[0..4], b"AVRP");
        assert_eq!(bytes[4], FORMAT_VERSION);
        assert_eq!(u16::from_le_bytes([bytes[5], bytes[6]]), 1);
        let body_len = u32::from_le_bytes([bytes[7], bytes[8], bytes[9], bytes[10]]) as usize;
        assert_eq!(bytes.len(), 11 + body_len);
        // name_len + name + fixed fields + two length-prefixed tables
        assert_eq!(body_len, 1 + 5 + 21 + 2 + 192 + 2 + 384);
    }

    #[test]
    fn test_decode_preserves_fields() {
        let original = record("AVR6e", 6);
        let bytes = encode_catalogue(std::iter::once(&original)).unwrap();
        let decoded = decode_catalogue(&bytes).unwrap();
        assert_eq!(decoded, vec![original.to_raw()]);
    }

    #[test]
    fn test_bad_magic() {
        let err = decode_catalogue(b"JFIF\x01\x00\x00").unwrap_err();
        assert!(matches!(err, RegistryError::Format(FormatError::BadMagic(_))));
    }

    #[test]
    fn test_unsupported_version() {
        let err = decode_catalogue(b"AVRP\x09\x00\x00").unwrap_err();
        assert!(matches!(err, RegistryError::Format(FormatError::UnsupportedVersion(9))));
    }

    #[test]
    fn test_truncated_body() {
        let records = [record("AVR6e", 6)];
        let bytes = encode_catalogue(records.iter()).unwrap();
        let err = decode_catalogue(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, RegistryError::Format(FormatError::Truncated { .. })));
    }

    #[test]
    fn test_trailing_bytes() {
        let records = [record("AVR6e", 6)];
        let mut bytes = encode_catalogue(records.iter()).unwrap();
        bytes.push(0);
        let err = decode_catalogue(&bytes).unwrap_err();
        assert!(matches!(err, RegistryError::Format(FormatError::TrailingBytes(1))));
    }

    #[test]
    fn test_truncation_reports_absolute_offset() {
        let records = [record("AVR6e", 6)];
        let bytes = encode_catalogue(records.iter()).unwrap();

        // shrink the declared body by one byte and drop the last byte
        let mut short = bytes[..bytes.len() - 1].to_vec();
        let body_len = u32::from_le_bytes([short[7], short[8], short[9], short[10]]) - 1;
        short[7..11].copy_from_slice(&body_len.to_le_bytes());

        match decode_catalogue(&short) {
            Err(RegistryError::Format(FormatError::Truncated { offset, needed, available })) => {
                assert_eq!(offset, bytes.len() - 384);
                assert_eq!((needed, available), (384, 383));
            }
            other => panic!("expected truncation, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_utf8_name() {
        let records = [record("AVR6e", 6)];
        let mut bytes = encode_catalogue(records.iter()).unwrap();
        // first name byte follows header, body_len and name_len
        bytes[12] = 0xFF;
        let err = decode_catalogue(&bytes).unwrap_err();
        assert!(matches!(err, RegistryError::Format(FormatError::InvalidName { index: 0 })));
    }

    #[test]
    fn test_body_length_mismatch() {
        let records = [record("AVR6e", 6), record("AVR3", 3)];
        let bytes = encode_catalogue(records.iter()).unwrap();
        let body_len = u32::from_le_bytes([bytes[7], bytes[8], bytes[9], bytes[10]]);
        let first_end = 11 + body_len as usize;

        // pad the first body with one byte the record layout does not account for
        let mut padded = bytes[..first_end].to_vec();
        padded.push(0);
        padded.extend_from_slice(&bytes[first_end..]);
        padded[7..11].copy_from_slice(&(body_len + 1).to_le_bytes());

        match decode_catalogue(&padded) {
            Err(RegistryError::Format(FormatError::BodyLengthMismatch {
                index,
                declared,
                consumed,
            })) => {
                assert_eq!(index, 0);
                assert_eq!(declared, body_len as usize + 1);
                assert_eq!(consumed, body_len as usize);
            }
            other => panic!("expected body length mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_short_table_is_malformed_record() {
        let mut body = Vec::new();
        body.write_u8(2).unwrap();
        body.write_all(b"Q1").unwrap();
        body.write_u16::<LittleEndian>(1).unwrap();
        body.write_i32::<LittleEndian>(50).unwrap();
        for _ in 0..5 {
            body.write_u16::<LittleEndian>(100).unwrap();
        }
        body.write_u8(1).unwrap();
        body.write_u32::<LittleEndian>(4096).unwrap();
        body.write_u16::<LittleEndian>(128).unwrap();
        body.write_all(&[1u8; 128]).unwrap();

        let mut bytes = MAGIC.to_vec();
        bytes.write_u8(FORMAT_VERSION).unwrap();
        bytes.write_u16::<LittleEndian>(1).unwrap();
        bytes.write_u32::<LittleEndian>(body.len() as u32).unwrap();
        bytes.write_all(&body).unwrap();

        match decode_catalogue(&bytes) {
            Err(RegistryError::MalformedRecord(err)) => {
                assert_eq!(err.index, 0);
                assert_eq!(err.name, "Q1");
                assert_eq!(
                    err.kind,
                    MalformedKind::TableLength { table: "quant8", expected: 192, actual: 128 }
                );
            }
            other => panic!("expected malformed record, got {:?}", other),
        }
    }
}

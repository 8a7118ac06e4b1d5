//! Fixed 0x48-byte save header.
//!
//! ```text
//! 0x00  u32  magic                 "BCPS"
//! 0x04  u32  version               1
//! 0x08  u64  part_table_offset     0x48
//! 0x10  u64  unknown
//! 0x18  i64  part_table_end        pad16(0x48 + 4 * part_count)
//! 0x20  u64  total_save_size
//! 0x28  u64  unknown2
//! 0x30  u64  part_size
//! 0x38  u64  unknown4
//! 0x40  u32  flags
//! 0x44  u32  save_compression_type
//! ```
//!
//! All fields are little-endian with no gaps between them.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use std::io::{self, Cursor, Write};

use crate::error::SaveError;
use crate::pad::pad16_i64;

/// `b"BCPS"` read as a little-endian u32.
pub const MAGIC: u32 = 0x5350_4342;
pub const VERSION: u32 = 1;
pub const HEADER_SIZE: usize = 0x48;
/// The part table always starts right after the header.
pub const PART_TABLE_OFFSET: u64 = HEADER_SIZE as u64;
/// Size of one part table entry.
pub const TABLE_ENTRY_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaveHeader {
    pub magic:                 u32,
    pub version:               u32,
    pub part_table_offset:     u64,
    pub unknown:               u64,
    pub part_table_end:        i64,
    pub total_save_size:       u64,
    pub unknown2:              u64,
    pub part_size:             u64,
    pub unknown4:              u64,
    pub flags:                 u32,
    pub save_compression_type: u32,
}

impl SaveHeader {
    /// A valid header with every opaque field zeroed. `part_table_end` is
    /// filled in for the part count implied by the two sizes, and left at 0
    /// when that count is invalid or its table end does not fit an `i64`.
    pub fn new(total_save_size: u64, part_size: u64) -> Self {
        let mut header = Self {
            magic:                 MAGIC,
            version:               VERSION,
            part_table_offset:     PART_TABLE_OFFSET,
            unknown:               0,
            part_table_end:        0,
            total_save_size,
            unknown2:              0,
            part_size,
            unknown4:              0,
            flags:                 0,
            save_compression_type: 0,
        };
        let table_end = header
            .expected_part_count()
            .ok()
            .and_then(|count| usize::try_from(count).ok())
            .and_then(Self::table_end_for);
        if let Some(table_end) = table_end {
            header.part_table_end = table_end;
        }
        header
    }

    /// Aligned end of the part table for `part_count` entries, or `None` if
    /// it does not fit an `i64`.
    pub fn table_end_for(part_count: usize) -> Option<i64> {
        let table_len = part_count.checked_mul(TABLE_ENTRY_SIZE)?;
        let end = i64::try_from(table_len).ok()?.checked_add(PART_TABLE_OFFSET as i64)?;
        pad16_i64(end)
    }

    /// Number of part table entries: `ceil(total_save_size / part_size)`.
    pub fn expected_part_count(&self) -> Result<u64, SaveError> {
        match (self.total_save_size, self.part_size) {
            (0, _) => Ok(0),
            (total, 0) => Err(SaveError::InvalidPartSize { part_size: 0, total_save_size: total }),
            (total, size) => Ok(total.div_ceil(size)),
        }
    }

    /// Copy of this header with `part_table_end` recomputed for `part_count`.
    pub fn with_table_end(&self, part_count: usize) -> Result<Self, SaveError> {
        let part_table_end = Self::table_end_for(part_count)
            .ok_or(SaveError::TableTooLarge { part_count })?;
        Ok(Self { part_table_end, ..*self })
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.magic)?;
        writer.write_u32::<LittleEndian>(self.version)?;
        writer.write_u64::<LittleEndian>(self.part_table_offset)?;
        writer.write_u64::<LittleEndian>(self.unknown)?;
        writer.write_i64::<LittleEndian>(self.part_table_end)?;
        writer.write_u64::<LittleEndian>(self.total_save_size)?;
        writer.write_u64::<LittleEndian>(self.unknown2)?;
        writer.write_u64::<LittleEndian>(self.part_size)?;
        writer.write_u64::<LittleEndian>(self.unknown4)?;
        writer.write_u32::<LittleEndian>(self.flags)?;
        writer.write_u32::<LittleEndian>(self.save_compression_type)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> io::Result<[u8; HEADER_SIZE]> {
        let mut out = Cursor::new([0u8; HEADER_SIZE]);
        self.write(&mut out)?;
        Ok(out.into_inner())
    }

    /// Parse and validate the header at the start of `bytes`.
    pub fn read(bytes: &[u8]) -> Result<Self, SaveError> {
        if bytes.len() < HEADER_SIZE {
            return Err(SaveError::Truncated {
                what:      "header",
                offset:    0,
                needed:    HEADER_SIZE as u64,
                available: bytes.len() as u64,
            });
        }
        let mut reader = Cursor::new(&bytes[..HEADER_SIZE]);

        let magic = reader.read_u32::<LittleEndian>()?;
        if magic != MAGIC {
            return Err(SaveError::BadMagic(magic));
        }
        let version = reader.read_u32::<LittleEndian>()?;
        if version != VERSION {
            return Err(SaveError::UnsupportedVersion(version));
        }
        let part_table_offset = reader.read_u64::<LittleEndian>()?;
        if part_table_offset != PART_TABLE_OFFSET {
            return Err(SaveError::BadTableOffset(part_table_offset));
        }
        Ok(Self {
            magic,
            version,
            part_table_offset,
            unknown:               reader.read_u64::<LittleEndian>()?,
            part_table_end:        reader.read_i64::<LittleEndian>()?,
            total_save_size:       reader.read_u64::<LittleEndian>()?,
            unknown2:              reader.read_u64::<LittleEndian>()?,
            part_size:             reader.read_u64::<LittleEndian>()?,
            unknown4:              reader.read_u64::<LittleEndian>()?,
            flags:                 reader.read_u32::<LittleEndian>()?,
            save_compression_type: reader.read_u32::<LittleEndian>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn sample() -> SaveHeader {
        SaveHeader {
            unknown:               0x1122_3344_5566_7788,
            unknown2:              2,
            unknown4:              4,
            flags:                 0x8000_0001,
            save_compression_type: 3,
            ..SaveHeader::new(0x18000, 0x10000)
        }
    }

    #[test]
    fn layout_is_byte_exact() {
        let bytes = sample().to_bytes().unwrap();
        assert_eq!(&bytes[0x00..0x04], b"BCPS");
        assert_eq!(&bytes[0x04..0x08], &1u32.to_le_bytes());
        assert_eq!(&bytes[0x08..0x10], &0x48u64.to_le_bytes());
        assert_eq!(&bytes[0x10..0x18], &0x1122_3344_5566_7788u64.to_le_bytes());
        assert_eq!(&bytes[0x18..0x20], &0x50i64.to_le_bytes());
        assert_eq!(&bytes[0x20..0x28], &0x18000u64.to_le_bytes());
        assert_eq!(&bytes[0x30..0x38], &0x10000u64.to_le_bytes());
        assert_eq!(&bytes[0x40..0x44], &0x8000_0001u32.to_le_bytes());
        assert_eq!(&bytes[0x44..0x48], &3u32.to_le_bytes());
        assert_eq!(SaveHeader::read(&bytes).unwrap(), sample());
    }

    #[test]
    fn expected_part_count_rounds_up() {
        assert_eq!(SaveHeader::new(0x18000, 0x10000).expected_part_count().unwrap(), 2);
        assert_eq!(SaveHeader::new(0x20000, 0x10000).expected_part_count().unwrap(), 2);
        assert_eq!(SaveHeader::new(1, 0x10000).expected_part_count().unwrap(), 1);
        assert_eq!(SaveHeader::new(0, 0).expected_part_count().unwrap(), 0);
        let err = SaveHeader::new(5, 0).expected_part_count().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptFormat);
    }

    #[test]
    fn table_end_is_aligned() {
        assert_eq!(SaveHeader::table_end_for(0), Some(0x50));
        assert_eq!(SaveHeader::table_end_for(2), Some(0x50));
        assert_eq!(SaveHeader::table_end_for(3), Some(0x60));
        assert_eq!(SaveHeader::table_end_for(6), Some(0x60));
        assert_eq!(SaveHeader::table_end_for(7), Some(0x70));
    }

    #[test]
    fn oversized_part_count_does_not_overflow() {
        let header = SaveHeader::new(u64::MAX, 1);
        assert_eq!(header.expected_part_count().unwrap(), u64::MAX);
        assert_eq!(header.part_table_end, 0);

        assert_eq!(SaveHeader::table_end_for(usize::MAX), None);
        let err = header.with_table_end(usize::MAX).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidContainer);
    }

    #[test]
    fn rejects_bad_fields() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes[0] = b'X';
        assert!(matches!(SaveHeader::read(&bytes), Err(SaveError::BadMagic(_))));

        let mut bytes = sample().to_bytes().unwrap();
        bytes[4] = 2;
        assert!(matches!(SaveHeader::read(&bytes), Err(SaveError::UnsupportedVersion(2))));

        let mut bytes = sample().to_bytes().unwrap();
        bytes[8] = 0x50;
        assert!(matches!(SaveHeader::read(&bytes), Err(SaveError::BadTableOffset(0x50))));

        let bytes = sample().to_bytes().unwrap();
        let err = SaveHeader::read(&bytes[..0x40]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedInput);
    }
}

//! Packed save container: header, part table and padded part payloads.
//!
//! # Packed layout
//! ```text
//! 0x00            header (0x48 bytes, see header.rs)
//! 0x48            part_count * u32 part lengths
//!                 filler up to part_table_end
//! part_table_end  for each part: payload, then filler to the next 16-byte boundary
//! ```
//!
//! # Split layout
//! The header blob holds the header, the length table and the table filler.
//! Every part is stored on its own, unpadded. See [`crate::parts`].
//!
//! Both decoders are lenient about bytes left over after the last part: they
//! are reported through [`Diagnostics`] and a `warn!`, never as an error.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::{self, File};
use std::io::{self, BufWriter, Cursor, Write};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::SaveError;
use crate::header::{SaveHeader, HEADER_SIZE, TABLE_ENTRY_SIZE};
use crate::pad::{filler, padding_len};
use crate::parts::SaveParts;

/// Advisory findings from a packed decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Bytes skipped between the end of the length table and `part_table_end`.
    pub table_padding:  usize,
    /// Bytes left unread after the last part and its padding.
    pub trailing_bytes: usize,
}

/// In-memory save: header metadata plus the ordered part payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveContainer {
    pub header: SaveHeader,
    pub parts:  Vec<Vec<u8>>,
}

// ── Byte cursor ──────────────────────────────────────────────────────────────

struct SliceReader<'a> {
    bytes: &'a [u8],
    pos:   usize,
}

impl<'a> SliceReader<'a> {
    fn new(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    fn take(&mut self, len: u64, what: &'static str) -> Result<&'a [u8], SaveError> {
        if len > self.remaining() as u64 {
            return Err(SaveError::Truncated {
                what,
                offset:    self.pos as u64,
                needed:    len,
                available: self.remaining() as u64,
            });
        }
        let start = self.pos;
        self.pos += len as usize;
        Ok(&self.bytes[start..self.pos])
    }
}

/// Read `expected_part_count()` little-endian u32 lengths starting at the
/// reader's position.
fn read_part_table(header: &SaveHeader, reader: &mut SliceReader<'_>) -> Result<Vec<u32>, SaveError> {
    let count = header.expected_part_count()?;
    let table_len = count.checked_mul(TABLE_ENTRY_SIZE as u64).unwrap_or(u64::MAX);
    let table = reader.take(table_len, "part table")?;
    let mut cursor = Cursor::new(table);
    let mut lengths = Vec::with_capacity(count as usize);
    for _ in 0..count {
        lengths.push(cursor.read_u32::<LittleEndian>()?);
    }
    Ok(lengths)
}

impl SaveContainer {
    pub fn new(header: SaveHeader, parts: Vec<Vec<u8>>) -> Self {
        Self { header, parts }
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Sum of the unpadded part lengths.
    pub fn total_payload_len(&self) -> u64 {
        self.parts.iter().map(|p| p.len() as u64).sum()
    }

    // ── Decode ───────────────────────────────────────────────────────────────

    /// Decode a complete packed save.
    pub fn decode_packed(bytes: &[u8]) -> Result<Self, SaveError> {
        Self::decode_packed_with_diagnostics(bytes).map(|(save, _)| save)
    }

    /// Decode a complete packed save and report the advisory findings.
    pub fn decode_packed_with_diagnostics(bytes: &[u8]) -> Result<(Self, Diagnostics), SaveError> {
        let header = SaveHeader::read(bytes)?;
        let mut reader = SliceReader::new(bytes, HEADER_SIZE);
        let lengths = read_part_table(&header, &mut reader)?;

        let mut diagnostics = Diagnostics::default();
        let position = reader.pos as u64;
        if header.part_table_end != position as i64 {
            if header.part_table_end < position as i64 {
                return Err(SaveError::BadTableEnd { table_end: header.part_table_end, position });
            }
            let skip = header.part_table_end as u64 - position;
            reader.take(skip, "part table padding")?;
            diagnostics.table_padding = skip as usize;
        }
        debug!(parts = lengths.len(), table_end = header.part_table_end, "decoding packed save");

        let mut parts = Vec::with_capacity(lengths.len());
        let last = lengths.len().saturating_sub(1);
        for (index, &len) in lengths.iter().enumerate() {
            parts.push(reader.take(len as u64, "part payload")?.to_vec());

            let padding = padding_len(len as usize);
            if index == last && padding > reader.remaining() {
                debug!(missing = padding - reader.remaining(), "final part padding is short");
                reader.pos = bytes.len();
            } else {
                reader.take(padding as u64, "part padding")?;
            }
        }

        diagnostics.trailing_bytes = reader.remaining();
        if diagnostics.trailing_bytes != 0 {
            warn!(
                trailing = diagnostics.trailing_bytes,
                offset = reader.pos,
                "packed save has unread bytes after the last part"
            );
        }

        Ok((Self { header, parts }, diagnostics))
    }

    /// Decode the split representation: the header blob written by
    /// [`SaveContainer::encode_to_parts`] plus the part payloads in index order.
    ///
    /// Part payload starts where the header blob ends, so `part_table_end` is
    /// not consulted and table filler inside the blob is simply ignored.
    ///
    /// Each part is read from its own file, never from one concatenated
    /// buffer: a part file can not spill into the next part. A file shorter
    /// than its table entry is `Truncated`; bytes past the entry are logged
    /// and dropped.
    pub fn decode_from_parts<P: AsRef<[u8]>>(header_bytes: &[u8], part_files: &[P]) -> Result<Self, SaveError> {
        let header = SaveHeader::read(header_bytes)?;
        let mut reader = SliceReader::new(header_bytes, HEADER_SIZE);
        let lengths = read_part_table(&header, &mut reader)?;
        debug!(parts = lengths.len(), filler = reader.remaining(), "decoding split save");

        if part_files.len() < lengths.len() {
            return Err(SaveError::MissingPart(part_files.len() as u32));
        }
        if part_files.len() > lengths.len() {
            warn!(
                expected = lengths.len(),
                found = part_files.len(),
                "ignoring part files beyond the part table"
            );
        }

        let mut parts = Vec::with_capacity(lengths.len());
        for (index, (&len, file)) in lengths.iter().zip(part_files).enumerate() {
            let file = file.as_ref();
            let mut part = SliceReader::new(file, 0);
            parts.push(part.take(len as u64, "part file")?.to_vec());
            if part.remaining() != 0 {
                warn!(part = index, trailing = part.remaining(), "part file is longer than its table entry");
            }
        }

        Ok(Self { header, parts })
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SaveError> {
        Self::decode_packed(&fs::read(path)?)
    }

    pub fn load_from_directory<P: AsRef<Path>>(path: P) -> Result<Self, SaveError> {
        SaveParts::read_dir(path)?.decode()
    }

    // ── Encode ───────────────────────────────────────────────────────────────

    /// Check that the header's part count and the part list agree and every
    /// part fits a table entry.
    pub fn validate(&self) -> Result<(), SaveError> {
        let expected = self.header.expected_part_count()?;
        if expected != self.parts.len() as u64 {
            return Err(SaveError::PartCountMismatch { expected, actual: self.parts.len() });
        }
        if let Some((index, part)) = self.parts.iter().enumerate().find(|(_, p)| p.len() > u32::MAX as usize) {
            return Err(SaveError::PartTooLarge { index, len: part.len() });
        }
        Ok(())
    }

    /// Header with `part_table_end` recomputed for the current part list.
    pub fn aligned_header(&self) -> Result<SaveHeader, SaveError> {
        self.header.with_table_end(self.parts.len())
    }

    /// Header, length table and table filler.
    fn write_header_region<W: Write>(&self, header: &SaveHeader, mut writer: W) -> io::Result<()> {
        header.write(&mut writer)?;
        for part in &self.parts {
            writer.write_u32::<LittleEndian>(part.len() as u32)?;
        }
        writer.write_all(filler(HEADER_SIZE + self.parts.len() * TABLE_ENTRY_SIZE))?;
        Ok(())
    }

    /// Stream the packed representation into `writer`.
    pub fn write_packed<W: Write>(&self, mut writer: W) -> Result<(), SaveError> {
        self.validate()?;
        let header = self.aligned_header()?;
        self.write_header_region(&header, &mut writer)?;
        for part in &self.parts {
            writer.write_all(part)?;
            writer.write_all(filler(part.len()))?;
        }
        Ok(())
    }

    pub fn encode_packed(&self) -> Result<Vec<u8>, SaveError> {
        self.validate()?;
        let table_end = self.aligned_header()?.part_table_end as usize;
        let size = self.parts.iter().fold(table_end, |acc, p| {
            acc.saturating_add(p.len()).saturating_add(padding_len(p.len()))
        });
        let mut out = Vec::with_capacity(size);
        self.write_packed(&mut out)?;
        Ok(out)
    }

    /// Split into a header blob and one unpadded blob per part.
    pub fn encode_to_parts(&self) -> Result<SaveParts, SaveError> {
        self.validate()?;
        let aligned = self.aligned_header()?;
        let mut header = Vec::with_capacity(aligned.part_table_end as usize);
        self.write_header_region(&aligned, &mut header)?;
        Ok(SaveParts { header, parts: self.parts.clone() })
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SaveError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_packed(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn save_to_directory<P: AsRef<Path>>(&self, path: P) -> Result<(), SaveError> {
        self.encode_to_parts()?.write_dir(path)?;
        Ok(())
    }
}

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Invalid magic number: {0:#010x}")]
    BadMagic(u32),
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(u32),
    #[error("Invalid part table offset: {0:#x}")]
    BadTableOffset(u64),
    #[error("Part table end {table_end:#x} lies before the end of the length table ({position:#x})")]
    BadTableEnd { table_end: i64, position: u64 },
    #[error("Invalid part size {part_size} for total save size {total_save_size}")]
    InvalidPartSize { part_size: u64, total_save_size: u64 },
    #[error("Part {0} appears more than once")]
    DuplicatePart(u32),
    #[error("Truncated input: {what} needs {needed} bytes at offset {offset:#x}, {available} available")]
    Truncated { what: &'static str, offset: u64, needed: u64, available: u64 },
    #[error("Header file is missing")]
    MissingHeader,
    #[error("Part file {0} is missing")]
    MissingPart(u32),
    #[error("Header expects {expected} parts, container holds {actual}")]
    PartCountMismatch { expected: u64, actual: usize },
    #[error("Part {index} is {len} bytes, larger than a table entry can describe")]
    PartTooLarge { index: usize, len: usize },
    #[error("Part table for {part_count} parts does not fit the header")]
    TableTooLarge { part_count: usize },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Coarse classification of a [`SaveError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Structural violation in the header or part table.
    CorruptFormat,
    /// A length field asks for more bytes than the input holds.
    TruncatedInput,
    /// Directory-mode input lacks the header blob or an indexed part.
    MissingHeaderOrPart,
    /// The in-memory container cannot be encoded as-is.
    InvalidContainer,
    Io,
}

impl SaveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SaveError::BadMagic(_)
            | SaveError::UnsupportedVersion(_)
            | SaveError::BadTableOffset(_)
            | SaveError::BadTableEnd { .. }
            | SaveError::InvalidPartSize { .. }
            | SaveError::DuplicatePart(_)          => ErrorKind::CorruptFormat,
            SaveError::Truncated { .. }            => ErrorKind::TruncatedInput,
            SaveError::MissingHeader
            | SaveError::MissingPart(_)            => ErrorKind::MissingHeaderOrPart,
            SaveError::PartCountMismatch { .. }
            | SaveError::PartTooLarge { .. }
            | SaveError::TableTooLarge { .. }      => ErrorKind::InvalidContainer,
            SaveError::Io(_)                       => ErrorKind::Io,
        }
    }
}

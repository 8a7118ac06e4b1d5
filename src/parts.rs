//! Split representation of a save: one header blob plus one blob per part.
//!
//! The header blob is named [`HEADER_FILE_NAME`]; part `i` is named `P{i}P`.
//! Parts are ordered by the number embedded in the name, never by the name
//! itself (`P10P` sorts before `P2P` lexically).

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

use crate::error::SaveError;
use crate::save::SaveContainer;

pub const HEADER_FILE_NAME: &str = "BETHESDAPFH";

pub fn part_file_name(index: usize) -> String {
    format!("P{index}P")
}

/// Index embedded in a part file name, or `None` if `name` is not one.
pub fn parse_part_index(name: &str) -> Option<u32> {
    let digits = name.strip_prefix('P')?.strip_suffix('P')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveParts {
    /// Header, part length table and table filler.
    pub header: Vec<u8>,
    /// Unpadded part payloads in index order.
    pub parts:  Vec<Vec<u8>>,
}

impl SaveParts {
    /// Collect named blobs given in any order. Names that are neither the
    /// header nor a part are skipped.
    pub fn from_named<I, N, B>(entries: I) -> Result<Self, SaveError>
    where
        I: IntoIterator<Item = (N, B)>,
        N: AsRef<str>,
        B: Into<Vec<u8>>,
    {
        let mut header: Option<Vec<u8>> = None;
        let mut indexed: BTreeMap<u32, Vec<u8>> = BTreeMap::new();
        for (name, data) in entries {
            let name = name.as_ref();
            if name == HEADER_FILE_NAME {
                header = Some(data.into());
            } else if let Some(index) = parse_part_index(name) {
                if indexed.insert(index, data.into()).is_some() {
                    return Err(SaveError::DuplicatePart(index));
                }
            } else {
                debug!(name, "skipping unrelated blob");
            }
        }

        let header = header.ok_or(SaveError::MissingHeader)?;
        let mut parts = Vec::with_capacity(indexed.len());
        for (expected, (index, data)) in indexed.into_iter().enumerate() {
            if index as usize != expected {
                return Err(SaveError::MissingPart(expected as u32));
            }
            parts.push(data);
        }
        Ok(Self { header, parts })
    }

    /// Header first, then parts in index order.
    pub fn files(&self) -> impl Iterator<Item = (String, &[u8])> + '_ {
        std::iter::once((HEADER_FILE_NAME.to_owned(), self.header.as_slice()))
            .chain(self.parts.iter().enumerate().map(|(i, p)| (part_file_name(i), p.as_slice())))
    }

    pub fn read_dir<P: AsRef<Path>>(path: P) -> Result<Self, SaveError> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if name == HEADER_FILE_NAME || parse_part_index(&name).is_some() {
                let data = fs::read(entry.path())?;
                entries.push((name, data));
            }
        }
        Self::from_named(entries)
    }

    /// Write every blob into `path`, creating it if necessary. Part files
    /// left over from a previous, longer save are removed.
    pub fn write_dir<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        fs::create_dir_all(path)?;
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let stale = entry
                .file_name()
                .to_str()
                .and_then(parse_part_index)
                .is_some_and(|index| index as usize >= self.parts.len());
            if stale && entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
            }
        }
        for (name, data) in self.files() {
            fs::write(path.join(name), data)?;
        }
        Ok(())
    }

    pub fn decode(&self) -> Result<SaveContainer, SaveError> {
        SaveContainer::decode_from_parts(&self.header, &self.parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_names() {
        assert_eq!(part_file_name(0), "P0P");
        assert_eq!(part_file_name(12), "P12P");
        assert_eq!(parse_part_index("P0P"), Some(0));
        assert_eq!(parse_part_index("P12P"), Some(12));
        assert_eq!(parse_part_index("PP"), None);
        assert_eq!(parse_part_index("P"), None);
        assert_eq!(parse_part_index("P+1P"), None);
        assert_eq!(parse_part_index("P1"), None);
        assert_eq!(parse_part_index(HEADER_FILE_NAME), None);
    }

    #[test]
    fn numeric_not_lexical_order() {
        let mut names: Vec<String> = (0..12).map(part_file_name).collect();
        names.sort();
        assert_eq!(names[1], "P10P");

        let entries = names
            .iter()
            .rev()
            .map(|n| (n.clone(), vec![parse_part_index(n).unwrap() as u8]))
            .chain(std::iter::once((HEADER_FILE_NAME.to_owned(), b"hdr".to_vec())));
        let split = SaveParts::from_named(entries).unwrap();
        let order: Vec<u8> = split.parts.iter().map(|p| p[0]).collect();
        assert_eq!(order, (0u8..12).collect::<Vec<_>>());
    }

    #[test]
    fn missing_entries() {
        let err = SaveParts::from_named([("P0P", b"a".to_vec())]).unwrap_err();
        assert!(matches!(err, SaveError::MissingHeader));

        let err = SaveParts::from_named([
            (HEADER_FILE_NAME, b"h".to_vec()),
            ("P0P", b"a".to_vec()),
            ("P2P", b"c".to_vec()),
        ])
        .unwrap_err();
        assert!(matches!(err, SaveError::MissingPart(1)));
    }

    #[test]
    fn duplicate_index_is_rejected() {
        let err = SaveParts::from_named([
            (HEADER_FILE_NAME, b"h".to_vec()),
            ("P1P", b"a".to_vec()),
            ("P01P", b"b".to_vec()),
        ])
        .unwrap_err();
        assert!(matches!(err, SaveError::DuplicatePart(1)));
    }

    #[test]
    fn unrelated_names_are_skipped() {
        let split = SaveParts::from_named([
            ("container.index", b"x".to_vec()),
            (HEADER_FILE_NAME, b"h".to_vec()),
            ("P0P", b"a".to_vec()),
        ])
        .unwrap();
        assert_eq!(split.parts, vec![b"a".to_vec()]);
    }
}

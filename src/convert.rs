//! Conversion workflow between packed saves and a [`SaveStore`].
//!
//! Export splits a packed save and writes each blob into the container
//! `<prefix><name>`, creating the container on first use and replacing blobs
//! that already exist. Import streams every blob of a container back out,
//! orders the parts numerically and decodes them.

use std::io::{self, Read};
use thiserror::Error;
use tracing::{debug, info};

use crate::error::SaveError;
use crate::parts::SaveParts;
use crate::save::SaveContainer;
use crate::store::SaveStore;

/// Container names for saves start with this prefix.
pub const DEFAULT_CONTAINER_PREFIX: &str = "Saves/";

/// Configuration for [`export_save`], [`import_save`] and [`list_saves`].
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub container_prefix: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self { container_prefix: DEFAULT_CONTAINER_PREFIX.to_owned() }
    }
}

impl ConvertOptions {
    pub fn container_name(&self, save_name: &str) -> String {
        format!("{}{}", self.container_prefix, save_name)
    }
}

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error("Storage error: {0}")]
    Io(#[from] io::Error),
    #[error("Container not found: {0}")]
    MissingContainer(String),
}

/// What [`export_save`] wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub container: String,
    pub added:     usize,
    pub updated:   usize,
}

/// Save names held by the store, with the prefix stripped, sorted.
pub fn list_saves<S: SaveStore + ?Sized>(store: &S, opts: &ConvertOptions) -> io::Result<Vec<String>> {
    let mut names: Vec<String> = store
        .container_names()?
        .into_iter()
        .filter_map(|n| n.strip_prefix(opts.container_prefix.as_str()).map(str::to_owned))
        .filter(|n| !n.is_empty())
        .collect();
    names.sort();
    Ok(names)
}

pub fn export_save<S: SaveStore + ?Sized>(
    store: &mut S,
    save_name: &str,
    save: &SaveContainer,
    opts: &ConvertOptions,
) -> Result<ExportSummary, ConvertError> {
    let split = save.encode_to_parts()?;
    let container_name = opts.container_name(save_name);

    if !store.contains(&container_name)? {
        info!(container = %container_name, "creating container");
        store.add_container(&container_name)?;
    }
    let mut container = store
        .container(&container_name)?
        .ok_or_else(|| ConvertError::MissingContainer(container_name.clone()))?;
    let existing = container.blob_names()?;

    let mut summary = ExportSummary { container: container_name.clone(), added: 0, updated: 0 };
    for (name, data) in split.files() {
        if existing.contains(&name) {
            container.update(&name, data)?;
            summary.updated += 1;
        } else {
            container.add(&name, data)?;
            summary.added += 1;
        }
        debug!(blob = %name, len = data.len(), "wrote blob");
    }
    info!(container = %container_name, added = summary.added, updated = summary.updated, "exported save");
    Ok(summary)
}

pub fn import_save<S: SaveStore + ?Sized>(
    store: &mut S,
    save_name: &str,
    opts: &ConvertOptions,
) -> Result<SaveContainer, ConvertError> {
    let container_name = opts.container_name(save_name);
    let container = store
        .container(&container_name)?
        .ok_or_else(|| ConvertError::MissingContainer(container_name.clone()))?;

    let mut entries = Vec::new();
    for name in container.blob_names()? {
        let mut data = Vec::new();
        container.open(&name)?.read_to_end(&mut data)?;
        entries.push((name, data));
    }
    let save = SaveParts::from_named(entries)?.decode()?;
    info!(container = %container_name, parts = save.part_count(), "imported save");
    Ok(save)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::SaveHeader;
    use crate::store::MemoryStore;

    fn sample(fill: u8) -> SaveContainer {
        SaveContainer::new(SaveHeader::new(0x30, 0x10), vec![vec![fill; 7], vec![fill; 16], vec![fill; 1]])
    }

    #[test]
    fn export_then_import() {
        let mut store = MemoryStore::new();
        let opts = ConvertOptions::default();

        let summary = export_save(&mut store, "slot.sfs", &sample(1), &opts).unwrap();
        assert_eq!(summary, ExportSummary { container: "Saves/slot.sfs".into(), added: 4, updated: 0 });

        let summary = export_save(&mut store, "slot.sfs", &sample(2), &opts).unwrap();
        assert_eq!((summary.added, summary.updated), (0, 4));

        assert_eq!(import_save(&mut store, "slot.sfs", &opts).unwrap(), sample(2));
        assert_eq!(list_saves(&store, &opts).unwrap(), vec!["slot.sfs".to_owned()]);
    }

    #[test]
    fn import_missing_container() {
        let mut store = MemoryStore::new();
        let err = import_save(&mut store, "nope", &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, ConvertError::MissingContainer(n) if n == "Saves/nope"));
    }

    #[test]
    fn import_without_header_blob() {
        let mut store = MemoryStore::new();
        store.add_container("Saves/broken").unwrap();
        store.container("Saves/broken").unwrap().unwrap().add("P0P", b"x").unwrap();
        let err = import_save(&mut store, "broken", &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, ConvertError::Save(SaveError::MissingHeader)));
    }

    #[test]
    fn list_filters_on_prefix() {
        let mut store = MemoryStore::new();
        store.add_container("Saves/b").unwrap();
        store.add_container("Saves/a").unwrap();
        store.add_container("Settings").unwrap();
        store.add_container("Saves/").unwrap();
        assert_eq!(list_saves(&store, &ConvertOptions::default()).unwrap(), vec!["a", "b"]);

        let opts = ConvertOptions { container_prefix: String::new() };
        assert_eq!(list_saves(&store, &opts).unwrap().len(), 4);
    }
}

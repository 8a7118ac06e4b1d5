//! Storage backend seam.
//!
//! The platform keeps each save as a named container of named blobs (the
//! split representation, one blob per file). [`SaveStore`] and
//! [`BlobContainer`] describe the operations the conversion workflow needs;
//! the real backend lives outside this crate.
//!
//! Two implementations ship here:
//! - [`DirStore`]: one directory per container under a root, one file per blob.
//! - [`MemoryStore`]: in-process maps, for tests and embedding.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};

// ── Traits ───────────────────────────────────────────────────────────────────

/// A single save container holding named blobs.
pub trait BlobContainer {
    fn blob_names(&self) -> io::Result<Vec<String>>;
    /// Blob content, or `None` if no blob has that name.
    fn get(&self, name: &str) -> io::Result<Option<Vec<u8>>>;
    /// Create a new blob. Fails with `AlreadyExists` if the name is taken.
    fn add(&mut self, name: &str, data: &[u8]) -> io::Result<()>;
    /// Replace an existing blob. Fails with `NotFound` if it does not exist.
    fn update(&mut self, name: &str, data: &[u8]) -> io::Result<()>;
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + '_>>;
}

impl<T: BlobContainer + ?Sized> BlobContainer for &mut T {
    fn blob_names(&self) -> io::Result<Vec<String>> { (**self).blob_names() }
    fn get(&self, name: &str) -> io::Result<Option<Vec<u8>>> { (**self).get(name) }
    fn add(&mut self, name: &str, data: &[u8]) -> io::Result<()> { (**self).add(name, data) }
    fn update(&mut self, name: &str, data: &[u8]) -> io::Result<()> { (**self).update(name, data) }
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + '_>> { (**self).open(name) }
}

/// A collection of named containers.
pub trait SaveStore {
    fn container_names(&self) -> io::Result<Vec<String>>;
    fn contains(&self, name: &str) -> io::Result<bool> {
        Ok(self.container_names()?.iter().any(|n| n == name))
    }
    fn container(&mut self, name: &str) -> io::Result<Option<Box<dyn BlobContainer + '_>>>;
    /// Create an empty container. Fails with `AlreadyExists` if the name is taken.
    fn add_container(&mut self, name: &str) -> io::Result<()>;
}

// ── DirStore ─────────────────────────────────────────────────────────────────

/// Filesystem-backed store. Container names may contain `/`; they are
/// escaped into a single directory name (`Saves/a.sfs` → `Saves%2Fa.sfs`).
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Open a store rooted at `root`, creating the directory if necessary.
    pub fn open<P: AsRef<Path>>(root: P) -> io::Result<Self> {
        let root = root.as_ref().to_owned();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn container_dir(&self, name: &str) -> io::Result<PathBuf> {
        if name.is_empty() || name == "." || name == ".." {
            return Err(invalid_name(name));
        }
        Ok(self.root.join(escape_name(name)))
    }
}

impl SaveStore for DirStore {
    fn container_names(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str().and_then(unescape_name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn container(&mut self, name: &str) -> io::Result<Option<Box<dyn BlobContainer + '_>>> {
        let dir = self.container_dir(name)?;
        if !dir.is_dir() {
            return Ok(None);
        }
        Ok(Some(Box::new(DirContainer { dir })))
    }

    fn add_container(&mut self, name: &str) -> io::Result<()> {
        fs::create_dir(self.container_dir(name)?)
    }
}

/// One container directory of a [`DirStore`].
#[derive(Debug, Clone)]
pub struct DirContainer {
    dir: PathBuf,
}

impl DirContainer {
    fn blob_path(&self, name: &str) -> io::Result<PathBuf> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(invalid_name(name));
        }
        Ok(self.dir.join(name))
    }
}

impl BlobContainer for DirContainer {
    fn blob_names(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn get(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.blob_path(name)?) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn add(&mut self, name: &str, data: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new().write(true).create_new(true).open(self.blob_path(name)?)?;
        file.write_all(data)
    }

    fn update(&mut self, name: &str, data: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new().write(true).truncate(true).open(self.blob_path(name)?)?;
        file.write_all(data)
    }

    fn open(&self, name: &str) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(File::open(self.blob_path(name)?)?))
    }
}

fn escape_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '%'  => out.push_str("%25"),
            '/'  => out.push_str("%2F"),
            '\\' => out.push_str("%5C"),
            c    => out.push(c),
        }
    }
    out
}

fn unescape_name(escaped: &str) -> Option<String> {
    let mut out = String::with_capacity(escaped.len());
    let mut rest = escaped;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let code = rest.get(pos + 1..pos + 3)?;
        out.push(match code {
            "25" => '%',
            "2F" => '/',
            "5C" => '\\',
            _    => return None,
        });
        rest = &rest[pos + 3..];
    }
    out.push_str(rest);
    Some(out)
}

fn invalid_name(name: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, format!("invalid name: {name:?}"))
}

// ── MemoryStore ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    containers: BTreeMap<String, MemoryContainer>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryContainer {
    blobs: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }
}

impl SaveStore for MemoryStore {
    fn container_names(&self) -> io::Result<Vec<String>> {
        Ok(self.containers.keys().cloned().collect())
    }

    fn container(&mut self, name: &str) -> io::Result<Option<Box<dyn BlobContainer + '_>>> {
        Ok(self.containers
            .get_mut(name)
            .map(|c| Box::new(c) as Box<dyn BlobContainer + '_>))
    }

    fn add_container(&mut self, name: &str) -> io::Result<()> {
        if self.containers.contains_key(name) {
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, format!("container exists: {name}")));
        }
        self.containers.insert(name.to_owned(), MemoryContainer::default());
        Ok(())
    }
}

impl BlobContainer for MemoryContainer {
    fn blob_names(&self) -> io::Result<Vec<String>> {
        Ok(self.blobs.keys().cloned().collect())
    }

    fn get(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.blobs.get(name).cloned())
    }

    fn add(&mut self, name: &str, data: &[u8]) -> io::Result<()> {
        if self.blobs.contains_key(name) {
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, format!("blob exists: {name}")));
        }
        self.blobs.insert(name.to_owned(), data.to_vec());
        Ok(())
    }

    fn update(&mut self, name: &str, data: &[u8]) -> io::Result<()> {
        match self.blobs.get_mut(name) {
            Some(blob) => {
                *blob = data.to_vec();
                Ok(())
            }
            None => Err(io::Error::new(io::ErrorKind::NotFound, format!("no such blob: {name}"))),
        }
    }

    fn open(&self, name: &str) -> io::Result<Box<dyn Read + '_>> {
        let blob = self.blobs
            .get(name)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no such blob: {name}")))?;
        Ok(Box::new(Cursor::new(blob.as_slice())))
    }
}

//! Package access: named parts as bytes, parsed once and shared.

use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use slideview_core::{Error, Result};
use zip::ZipArchive;

use crate::xml::{self, ParseError, RawNode};

/// Read-only source of package parts keyed by path (no leading slash).
pub trait PackageProvider: Send + Sync {
    /// Raw bytes of a part, or `None` when the package has no such part.
    fn read(&self, path: &str) -> Option<&[u8]>;

    /// All part paths in the package.
    fn part_names(&self) -> Vec<String>;
}

/// A package held entirely in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryPackage {
    parts: HashMap<String, Vec<u8>>,
}

impl MemoryPackage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl AsRef<str>, bytes: impl Into<Vec<u8>>) {
        self.parts
            .insert(normalize_part_path(path.as_ref()).to_string(), bytes.into());
    }

    /// Builder form of [`MemoryPackage::insert`].
    pub fn with_part(mut self, path: impl AsRef<str>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }
}

impl PackageProvider for MemoryPackage {
    fn read(&self, path: &str) -> Option<&[u8]> {
        self.parts.get(normalize_part_path(path)).map(Vec::as_slice)
    }

    fn part_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.parts.keys().cloned().collect();
        names.sort();
        names
    }
}

/// A zip archive unpacked into memory when opened.
#[derive(Debug)]
pub struct ZipPackage {
    inner: MemoryPackage,
}

impl ZipPackage {
    /// Unpack every file entry of the archive.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut inner = MemoryPackage::new();
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", i, e)))?;
            if file.is_dir() {
                continue;
            }

            let name = file.name().to_string();
            let declared = file.size();
            let bytes = read_entry(&mut file, declared)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", name, e)))?;
            inner.insert(&name, bytes);
        }

        log::debug!("Unpacked {} package parts", inner.parts.len());
        Ok(Self { inner })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }
}

impl PackageProvider for ZipPackage {
    fn read(&self, path: &str) -> Option<&[u8]> {
        self.inner.read(path)
    }

    fn part_names(&self) -> Vec<String> {
        self.inner.part_names()
    }
}

/// Parsed parts and copied binaries, each stored once per conversion.
///
/// Entries are immutable after insertion and handed out as `Arc`s.
#[derive(Debug, Default)]
pub struct PartCache {
    xml: RwLock<HashMap<String, Arc<RawNode>>>,
    bytes: RwLock<HashMap<String, Arc<[u8]>>>,
}

impl PartCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn xml(&self, path: &str) -> Option<Arc<RawNode>> {
        self.xml.read().get(path).cloned()
    }

    fn insert_xml(&self, path: &str, node: RawNode) -> Arc<RawNode> {
        let mut map = self.xml.write();
        // Another worker may have parsed the same part meanwhile; keep the first.
        map.entry(path.to_string())
            .or_insert_with(|| Arc::new(node))
            .clone()
    }

    fn bytes(&self, path: &str) -> Option<Arc<[u8]>> {
        self.bytes.read().get(path).cloned()
    }

    fn insert_bytes(&self, path: &str, bytes: &[u8]) -> Arc<[u8]> {
        let mut map = self.bytes.write();
        map.entry(path.to_string())
            .or_insert_with(|| Arc::from(bytes))
            .clone()
    }

    pub fn parsed_parts(&self) -> usize {
        self.xml.read().len()
    }
}

/// A package provider paired with the part cache.
pub struct Package {
    provider: Box<dyn PackageProvider>,
    cache: PartCache,
}

impl Package {
    pub fn new(provider: impl PackageProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
            cache: PartCache::new(),
        }
    }

    /// Open a `.pptx` file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(ZipPackage::open(path)?))
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        Ok(Self::new(ZipPackage::from_reader(reader)?))
    }

    /// Parsed tree of an XML part; `Ok(None)` when the part does not exist.
    pub fn xml(&self, path: &str) -> Result<Option<Arc<RawNode>>> {
        let path = normalize_part_path(path);
        if let Some(node) = self.cache.xml(path) {
            return Ok(Some(node));
        }

        let Some(raw) = self.provider.read(path) else {
            return Ok(None);
        };
        let text = std::str::from_utf8(raw).map_err(|e| {
            ParseError {
                position: e.valid_up_to(),
                message: "part is not valid UTF-8".to_string(),
            }
            .in_part(path)
        })?;
        let node = xml::parse(text).map_err(|e| e.in_part(path))?;

        log::debug!("Parsed part {}", path);
        Ok(Some(self.cache.insert_xml(path, node)))
    }

    /// Raw bytes of a part, copied out of the provider once.
    pub fn bytes(&self, path: &str) -> Option<Arc<[u8]>> {
        let path = normalize_part_path(path);
        if let Some(bytes) = self.cache.bytes(path) {
            return Some(bytes);
        }
        let raw = self.provider.read(path)?;
        Some(self.cache.insert_bytes(path, raw))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.provider.read(normalize_part_path(path)).is_some()
    }

    pub fn part_names(&self) -> Vec<String> {
        self.provider.part_names()
    }

    pub fn cache(&self) -> &PartCache {
        &self.cache
    }
}

impl std::fmt::Debug for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("parts", &self.provider.part_names().len())
            .field("cache", &self.cache)
            .finish()
    }
}

/// Upper bound on the buffer reserved up front for one archive entry.
const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

/// Read an entry to the end. The size recorded in the archive only sizes
/// the initial buffer, and never beyond [`MAX_PREALLOC`].
fn read_entry(reader: &mut impl Read, declared: u64) -> std::io::Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(declared.min(MAX_PREALLOC) as usize);
    reader.read_to_end(&mut bytes)?;
    Ok(bytes)
}

fn normalize_part_path(path: &str) -> &str {
    path.trim_start_matches('/')
}

//! DTD Reader Providers
//!
//! The parser never touches the filesystem itself. The root DTD and every
//! external parameter entity (`<!ENTITY % HTMLlat1 PUBLIC "..." "file">`)
//! are fetched through a `ReaderProvider`.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::config::CatalogEntry;
use crate::core::encoding::decode_source;

/// Source of DTD text
pub trait ReaderProvider: Send + Sync {
    /// Text for a public identifier. `file` is the system identifier given
    /// next to it, if any.
    fn read(&self, identifier: &str, file: Option<&str>) -> Option<String>;

    /// Whether the DTD behind `identifier` is XML (case-sensitive) rather
    /// than SGML
    fn is_xml(&self, _identifier: &str) -> bool {
        true
    }
}

/// In-memory catalog of DTD texts
#[derive(Debug, Clone, Default)]
pub struct CatalogProvider {
    entries: HashMap<String, String>,
    sgml: HashSet<String>,
}

impl CatalogProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: &[CatalogEntry]) -> Self {
        let mut catalog = Self::new();
        for entry in entries {
            catalog.insert(entry.key.clone(), entry.text.clone());
            if entry.sgml {
                catalog.mark_sgml(entry.key.clone());
            }
        }
        catalog
    }

    /// Builder form of `insert`
    pub fn with_entry(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(key, text);
        self
    }

    /// Register text under a public identifier or a file name
    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.entries.insert(key.into(), text.into());
    }

    /// Flag an identifier as an SGML DTD
    pub fn mark_sgml(&mut self, identifier: impl Into<String>) {
        self.sgml.insert(identifier.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ReaderProvider for CatalogProvider {
    fn read(&self, identifier: &str, file: Option<&str>) -> Option<String> {
        self.entries
            .get(identifier)
            .or_else(|| file.and_then(|f| self.entries.get(f)))
            .cloned()
    }

    fn is_xml(&self, identifier: &str) -> bool {
        !self.sgml.contains(identifier)
    }
}

/// Provider resolving system identifiers against a directory
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    root: PathBuf,
    xml: bool,
}

impl DirectoryProvider {
    pub fn new(root: impl Into<PathBuf>, xml: bool) -> Self {
        DirectoryProvider {
            root: root.into(),
            xml,
        }
    }
}

impl ReaderProvider for DirectoryProvider {
    fn read(&self, identifier: &str, file: Option<&str>) -> Option<String> {
        let path = self.root.join(file.unwrap_or(identifier));
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "DTD file not readable");
                return None;
            }
        };
        match decode_source(&bytes) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "DTD file not decodable");
                None
            }
        }
    }

    fn is_xml(&self, _identifier: &str) -> bool {
        self.xml
    }
}

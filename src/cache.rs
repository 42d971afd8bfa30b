//! Parsed DTD Cache
//!
//! Editors open many documents with the same DOCTYPE. Parsed DTDs are kept
//! in a process-wide LRU keyed by identifier and a fingerprint of everything
//! the parse depended on, so a changed catalog or mode never hits a stale
//! entry.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use lru::LruCache;
use tracing::{debug, trace};

use crate::config::{CatalogEntry, ParseOptions};
use crate::core::error::Result;
use crate::dtd::Dtd;

pub const DEFAULT_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    identifier: String,
    fingerprint: u64,
}

pub struct DtdCache {
    inner: Mutex<LruCache<CacheKey, Arc<Dtd>>>,
}

impl DtdCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        DtdCache {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// The cache shared by all NIF calls
    pub fn global() -> &'static DtdCache {
        static CACHE: OnceLock<DtdCache> = OnceLock::new();
        CACHE.get_or_init(|| DtdCache::new(DEFAULT_CAPACITY))
    }

    /// Return the cached DTD or run `parse` and remember its result.
    /// Failed parses are not cached. The lock is not held while parsing.
    pub fn get_or_parse<F>(&self, identifier: &str, fingerprint: u64, parse: F) -> Result<Arc<Dtd>>
    where
        F: FnOnce() -> Result<Dtd>,
    {
        let key = CacheKey {
            identifier: identifier.to_string(),
            fingerprint,
        };
        if let Some(dtd) = self.lock().get(&key) {
            trace!(identifier, "DTD cache hit");
            return Ok(dtd.clone());
        }

        let dtd = Arc::new(parse()?);
        self.lock().put(key, dtd.clone());
        debug!(identifier, elements = dtd.element_count(), "DTD cached");
        Ok(dtd)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<CacheKey, Arc<Dtd>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Hash of the inputs a parse depends on
pub fn fingerprint(source: &[u8], options: &ParseOptions, catalog: &[CatalogEntry]) -> u64 {
    let mut hasher = DefaultHasher::new();
    source.hash(&mut hasher);
    options.hash(&mut hasher);
    catalog.hash(&mut hasher);
    hasher.finish()
}

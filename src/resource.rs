//! ResourceArc Wrappers
//!
//! A parsed DTD lives on the Rust side and is handed to Elixir as an opaque
//! reference. It is immutable, so queries share it without locking.

use std::sync::Arc;

use rustler::ResourceArc;

use crate::dtd::Dtd;

/// Wrapper for a parsed DTD that can be stored in a ResourceArc
pub struct DtdResource {
    /// Shared with the parse cache when the DTD came from there
    pub dtd: Arc<Dtd>,
}

impl DtdResource {
    pub fn new(dtd: Arc<Dtd>) -> Self {
        DtdResource { dtd }
    }

    pub fn dtd(&self) -> &Dtd {
        &self.dtd
    }
}

#[rustler::resource_impl]
impl rustler::Resource for DtdResource {}

/// Type alias for the ResourceArc
pub type DtdRef = ResourceArc<DtdResource>;

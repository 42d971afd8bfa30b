//! DTD reading
//!
//! - provider: where DTD text comes from
//! - parser: declarations to model
//! - model: the immutable parsed DTD

pub mod model;
pub mod parser;
pub mod provider;

pub use model::{
    Attribute, AttributeDefault, AttributeKind, CharRef, ContentModel, DeclaredContent, Dtd,
    Element,
};
pub use parser::{parse_dtd, parse_source, DtdParser};
pub use provider::{CatalogProvider, DirectoryProvider, ReaderProvider};

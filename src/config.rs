//! Parse Configuration
//!
//! Runtime knobs passed from Elixir as a map. Compile-time configuration
//! lives in Cargo features (`mimalloc`, `memory_tracking`).

use rustler::{NifMap, NifUnitEnum};

/// Which DTD dialect is being read.
///
/// SGML DTDs (HTML 4 and older) are case-insensitive: element names are
/// folded to upper case and attribute names and values to lower case. XML
/// DTDs are case-sensitive and have no tag minimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, NifUnitEnum)]
pub enum DtdMode {
    Xml,
    Sgml,
}

impl DtdMode {
    pub fn is_xml(self) -> bool {
        self == DtdMode::Xml
    }

    /// Normalize an element name for lookup
    pub fn element_name(self, name: &str) -> String {
        match self {
            DtdMode::Xml => name.to_string(),
            DtdMode::Sgml => name.to_ascii_uppercase(),
        }
    }

    /// Normalize an attribute name or attribute value
    pub fn attribute_token(self, token: &str) -> String {
        match self {
            DtdMode::Xml => token.to_string(),
            DtdMode::Sgml => token.to_ascii_lowercase(),
        }
    }

    /// Compare a reserved word (`EMPTY`, `#REQUIRED`, `PUBLIC` ...)
    pub fn keyword_eq(self, token: &str, keyword: &str) -> bool {
        match self {
            DtdMode::Xml => token == keyword,
            DtdMode::Sgml => token.eq_ignore_ascii_case(keyword),
        }
    }
}

pub const DEFAULT_MAX_ENTITY_DEPTH: usize = 64;

/// Options for a single DTD parse
#[derive(Debug, Clone, PartialEq, Eq, Hash, NifMap)]
pub struct ParseOptions {
    /// Dialect; `None` lets the reader provider decide from the identifier
    pub mode: Option<DtdMode>,
    /// Maximum nesting of parameter entity expansions
    pub max_entity_depth: usize,
}

impl ParseOptions {
    pub fn xml() -> Self {
        ParseOptions {
            mode: Some(DtdMode::Xml),
            ..Self::default()
        }
    }

    pub fn sgml() -> Self {
        ParseOptions {
            mode: Some(DtdMode::Sgml),
            ..Self::default()
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            mode: None,
            max_entity_depth: DEFAULT_MAX_ENTITY_DEPTH,
        }
    }
}

/// One document of the catalog the host hands over with a parse request:
/// the root DTD or an external entity, keyed by public identifier or file
#[derive(Debug, Clone, PartialEq, Eq, Hash, NifMap)]
pub struct CatalogEntry {
    pub key: String,
    pub text: String,
    pub sgml: bool,
}

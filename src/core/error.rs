//! DTD Engine Errors

use thiserror::Error;

/// Everything that can go wrong while reading a DTD or answering a query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DtdError {
    #[error("premature end of DTD in {context}")]
    UnexpectedEof { context: &'static str },

    #[error("unexpected char '{found}' in {context}")]
    UnexpectedChar { found: char, context: &'static str },

    #[error("wrong DTD markup <!{0}")]
    UnknownMarkup(String),

    #[error("no such entity: \"{0}\"")]
    UnknownEntity(String),

    #[error("entity \"{0}\" references itself")]
    RecursiveEntity(String),

    #[error("entity expansion nested deeper than {0} levels")]
    EntityDepthExceeded(usize),

    #[error("'{name}' element referenced from {referenced_from} not found throughout the DTD")]
    UnknownElement { name: String, referenced_from: String },

    #[error("unexpected entity type \"{0}\"")]
    UnsupportedEntityType(String),

    #[error("group mixes '{expected}' with '{found}'")]
    MixedConnectors { expected: char, found: char },

    #[error("unknown keyword {keyword} in {context}")]
    UnknownKeyword {
        keyword: String,
        context: &'static str,
    },

    #[error("can't open reader for public identifier {0}")]
    ProviderUnavailable(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("unexpected marked section keyword {0}")]
    InvalidMarkedSection(String),

    #[error("element {0} is not declared")]
    NoSuchElement(String),

    #[error("completion query names no element")]
    EmptyPath,
}

pub type Result<T> = std::result::Result<T, DtdError>;

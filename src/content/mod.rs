//! Content models and the "what can follow" matcher
//!
//! - node: content tree and its derivatives
//! - interner: shares equal subtrees while parsing
//! - expr: standalone content model expressions
//! - matcher: feeds element names through a content model

pub mod expr;
pub mod interner;
pub mod matcher;
pub mod node;

pub use expr::parse_content_model;
pub use interner::ContentInterner;
pub use matcher::{complete, complete_element, Completion, ContentMatcher, Rejection};
pub use node::{Connector, Content, Occurrence, PCDATA};

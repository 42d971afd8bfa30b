//! Content model expressions outside a DTD
//!
//! Parses `(a,b*,(c|d)+)`, `EMPTY` or an SGML model with exceptions such as
//! `(TITLE & BASE?) +(SCRIPT|STYLE)` using the same grammar as `<!ELEMENT`.
//! Parameter entity references have nothing to expand against and fail with
//! `UnknownEntity`.

use crate::config::DtdMode;
use crate::core::error::Result;
use crate::dtd::{CatalogProvider, ContentModel, DtdParser};

/// Parse a standalone content model expression
pub fn parse_content_model(expression: &str, mode: DtdMode) -> Result<ContentModel> {
    let provider = CatalogProvider::new();
    DtdParser::for_expression(&provider, expression, mode).parse_content_expression()
}

//! DTD Parser
//!
//! Recursive-descent parser over the push-back scanner. Parameter entity
//! references are expanded wherever declaration separators are allowed,
//! which covers the way real DTDs use them: as whole declarations, inside
//! groups, as attribute types, and as marked section keywords.
//!
//! Handles both dialects:
//! - XML: case-sensitive, `<!-- -->` comments only
//! - SGML: case folding, `- O` tag minimization, `+(..)` / `-(..)`
//!   exceptions, the `&` connector and `-- --` comments inside declarations

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::config::{DtdMode, ParseOptions};
use crate::content::{Connector, Content, ContentInterner, Occurrence};
use crate::core::entities::{parse_char_ref, EntityTable};
use crate::core::error::{DtdError, Result};
use crate::core::scanner::{is_name_char, is_whitespace, unexpected, Scanner};

use super::model::{
    Attribute, AttributeDefault, AttributeKind, CharRef, ContentModel, DeclaredContent, Dtd,
    Element,
};
use super::provider::ReaderProvider;

const CTX_MARKUP: &str = "markup";
const CTX_COMMENT: &str = "comment";
const CTX_SECTION: &str = "marked section";
const CTX_ENTITY: &str = "ENTITY definition";
const CTX_ELEMENT: &str = "ELEMENT definition";
const CTX_GROUP: &str = "group definition";
const CTX_ATTLIST: &str = "ATTLIST definition";
const CTX_REFERENCE: &str = "entity reference";

/// Parse the DTD behind `identifier`, reading it through `provider`
pub fn parse_dtd(
    provider: &dyn ReaderProvider,
    identifier: &str,
    options: &ParseOptions,
) -> Result<Dtd> {
    DtdParser::new(provider, options.clone()).parse(identifier)
}

/// Parse DTD text that is already in memory. External parameter entities
/// are still fetched through `provider`.
pub fn parse_source(
    provider: &dyn ReaderProvider,
    identifier: &str,
    source: &str,
    options: &ParseOptions,
) -> Result<Dtd> {
    DtdParser::new(provider, options.clone()).parse_source(identifier, source)
}

pub struct DtdParser<'p> {
    provider: &'p dyn ReaderProvider,
    options: ParseOptions,
    mode: DtdMode,
    scanner: Scanner,
    entities: EntityTable,
    interner: ContentInterner,
    elements: BTreeMap<String, Element>,
    /// XML attribute lists seen before their element declaration
    pending: BTreeMap<String, Vec<Attribute>>,
    char_refs: BTreeMap<String, CharRef>,
    /// Open INCLUDE sections waiting for their `]]>`
    section_depth: usize,
}

impl<'p> DtdParser<'p> {
    pub fn new(provider: &'p dyn ReaderProvider, options: ParseOptions) -> Self {
        let mode = options.mode.unwrap_or(DtdMode::Xml);
        let scanner = Scanner::new(Vec::new(), options.max_entity_depth);
        DtdParser {
            provider,
            options,
            mode,
            scanner,
            entities: EntityTable::new(),
            interner: ContentInterner::new(),
            elements: BTreeMap::new(),
            pending: BTreeMap::new(),
            char_refs: BTreeMap::new(),
            section_depth: 0,
        }
    }

    /// Parser over a standalone content model expression
    pub(crate) fn for_expression(
        provider: &'p dyn ReaderProvider,
        expression: &str,
        mode: DtdMode,
    ) -> Self {
        let mut parser = DtdParser::new(provider, ParseOptions {
            mode: Some(mode),
            ..ParseOptions::default()
        });
        parser.scanner = Scanner::new(expression, parser.options.max_entity_depth);
        parser
    }

    /// Read the root DTD text through the provider and parse it
    pub fn parse(self, identifier: &str) -> Result<Dtd> {
        let source = self
            .provider
            .read(identifier, None)
            .ok_or_else(|| DtdError::ProviderUnavailable(identifier.to_string()))?;
        self.parse_source(identifier, &source)
    }

    pub fn parse_source(mut self, identifier: &str, source: &str) -> Result<Dtd> {
        self.mode = match self.options.mode {
            Some(mode) => mode,
            None if self.provider.is_xml(identifier) => DtdMode::Xml,
            None => DtdMode::Sgml,
        };
        self.scanner = Scanner::new(source, self.options.max_entity_depth);
        debug!(identifier, mode = ?self.mode, bytes = source.len(), "parsing DTD");

        self.parse_declarations()?;
        self.finish(identifier)
    }

    // ------------------------------------------------------------------
    // Top level
    // ------------------------------------------------------------------

    fn parse_declarations(&mut self) -> Result<()> {
        while let Some(b) = self.scanner.peek() {
            match b {
                b'%' if self.at_reference() => {
                    self.expand_reference()?;
                }
                b'<' => {
                    self.scanner.next();
                    self.parse_markup()?;
                }
                b']' if self.section_depth > 0 && self.scanner.starts_with(b"]]>") => {
                    self.scanner.advance(3);
                    self.section_depth -= 1;
                }
                // whitespace and stray text between declarations
                _ => {
                    self.scanner.next();
                }
            }
        }
        if self.section_depth > 0 {
            return Err(DtdError::UnexpectedEof { context: CTX_SECTION });
        }
        Ok(())
    }

    /// Markup after `<`
    fn parse_markup(&mut self) -> Result<()> {
        match self.scanner.next_or_eof(CTX_MARKUP)? {
            b'?' => self.scanner.skip_processing_instruction(),
            b'!' => {
                if self.scanner.starts_with(b"--") {
                    self.parse_comment_declaration()
                } else if self.scanner.peek() == Some(b'[') {
                    self.scanner.next();
                    self.parse_marked_section()
                } else if self.scanner.peek() == Some(b'>') {
                    // empty declaration <!>
                    self.scanner.next();
                    Ok(())
                } else {
                    let keyword = self.expect_name(CTX_MARKUP)?;
                    if self.is_keyword(&keyword, "ENTITY") {
                        self.parse_entity()
                    } else if self.is_keyword(&keyword, "ELEMENT") {
                        self.parse_element()
                    } else if self.is_keyword(&keyword, "ATTLIST") {
                        self.parse_attlist()
                    } else if self.is_keyword(&keyword, "NOTATION") {
                        self.scanner.skip_declaration("NOTATION definition")
                    } else {
                        Err(DtdError::UnknownMarkup(keyword))
                    }
                }
            }
            other => Err(unexpected(other, CTX_MARKUP)),
        }
    }

    /// `<!-- a -- -- b -->`, positioned at the first `--`
    fn parse_comment_declaration(&mut self) -> Result<()> {
        while self.scanner.starts_with(b"--") {
            self.scanner.advance(2);
            self.scanner.skip_comment_body()?;
            self.scanner.skip_whitespace();
        }
        self.scanner.expect(b'>', CTX_COMMENT)
    }

    /// `<![ KEYWORD [`, positioned after `<![`
    fn parse_marked_section(&mut self) -> Result<()> {
        let mut include = true;
        loop {
            self.skip_separators()?;
            if self.scanner.peek() == Some(b'[') {
                self.scanner.next();
                break;
            }
            let keyword = self.expect_name(CTX_SECTION)?;
            if self.is_keyword(&keyword, "INCLUDE") || self.is_keyword(&keyword, "TEMP") {
                continue;
            }
            if ["IGNORE", "CDATA", "RCDATA"]
                .iter()
                .any(|kw| self.is_keyword(&keyword, kw))
            {
                include = false;
            } else {
                return Err(DtdError::InvalidMarkedSection(keyword));
            }
        }

        if include {
            self.section_depth += 1;
            Ok(())
        } else {
            self.scanner.skip_ignored_section()
        }
    }

    // ------------------------------------------------------------------
    // Separators and parameter entities
    // ------------------------------------------------------------------

    #[inline]
    fn at_reference(&self) -> bool {
        self.scanner.peek() == Some(b'%') && self.scanner.peek_at(1).is_some_and(is_name_char)
    }

    /// Skip whitespace, `-- comments --` and parameter entity references.
    /// Returns the name of the last entity expanded, if any.
    fn skip_separators(&mut self) -> Result<Option<String>> {
        let mut expanded = None;
        loop {
            self.scanner.skip_whitespace();
            if self.at_reference() {
                expanded = Some(self.expand_reference()?);
            } else if self.scanner.starts_with(b"--") {
                self.scanner.advance(2);
                self.scanner.skip_comment_body()?;
            } else {
                return Ok(expanded);
            }
        }
    }

    /// Expand `%name;` in place. The `;` may be omitted before a separator.
    fn expand_reference(&mut self) -> Result<String> {
        self.scanner.next();
        let name = self.expect_name(CTX_REFERENCE)?;
        if self.scanner.peek() == Some(b';') {
            self.scanner.next();
        }
        let text = self
            .entities
            .get(&name)
            .ok_or_else(|| DtdError::UnknownEntity(name.clone()))?;
        trace!(entity = %name, len = text.len(), "expanding parameter entity");
        // replacement text is padded so it never fuses with adjacent tokens
        let padded = format!(" {} ", text);
        self.scanner.push_entity(&name, &padded)?;
        Ok(name)
    }

    // ------------------------------------------------------------------
    // ENTITY
    // ------------------------------------------------------------------

    fn parse_entity(&mut self) -> Result<()> {
        self.scanner.skip_whitespace();
        let parameter = self.scanner.peek() == Some(b'%')
            && self.scanner.peek_at(1).is_some_and(is_whitespace);
        if parameter {
            self.scanner.next();
        }
        self.skip_separators()?;
        let name = self.expect_name(CTX_ENTITY)?;
        self.skip_separators()?;

        if self.at_quote() {
            let text = self.scanner.read_literal(CTX_ENTITY)?;
            self.finish_declaration(CTX_ENTITY)?;
            if parameter {
                self.add_entity(name, text);
            } else {
                self.add_char_ref(name, &text);
            }
            return Ok(());
        }

        let keyword = self.expect_name(CTX_ENTITY)?;
        let external = self.is_keyword(&keyword, "PUBLIC") || self.is_keyword(&keyword, "SYSTEM");
        if external && !parameter {
            // external general entities carry no character reference
            debug!(entity = %name, "external general entity skipped");
            return self.scanner.skip_declaration(CTX_ENTITY);
        }

        if self.is_keyword(&keyword, "PUBLIC") {
            self.skip_separators()?;
            let identifier = self.scanner.read_literal(CTX_ENTITY)?;
            self.skip_separators()?;
            let file = if self.at_quote() {
                Some(self.scanner.read_literal(CTX_ENTITY)?)
            } else {
                None
            };
            self.finish_declaration(CTX_ENTITY)?;
            self.add_external_entity(name, &identifier, file.as_deref())
        } else if self.is_keyword(&keyword, "SYSTEM") {
            self.skip_separators()?;
            let file = self.scanner.read_literal(CTX_ENTITY)?;
            self.finish_declaration(CTX_ENTITY)?;
            self.add_external_entity(name, &file, Some(&file))
        } else if !parameter && !self.mode.is_xml() && self.is_keyword(&keyword, "CDATA") {
            self.skip_separators()?;
            let text = self.scanner.read_literal(CTX_ENTITY)?;
            self.finish_declaration(CTX_ENTITY)?;
            self.add_char_ref(name, &text);
            Ok(())
        } else {
            Err(DtdError::UnsupportedEntityType(keyword))
        }
    }

    fn add_entity(&mut self, name: String, text: String) {
        if !self.entities.add(name.clone(), text) {
            debug!(entity = %name, "parameter entity already defined, keeping first");
        }
    }

    /// Load an external parameter entity, unless the name is already taken
    fn add_external_entity(&mut self, name: String, identifier: &str, file: Option<&str>) -> Result<()> {
        if self.entities.contains(&name) {
            return Ok(());
        }
        let text = self
            .provider
            .read(identifier, file)
            .ok_or_else(|| DtdError::ProviderUnavailable(identifier.to_string()))?;
        debug!(entity = %name, identifier, "loaded external parameter entity");
        self.entities.add(name, text);
        Ok(())
    }

    fn add_char_ref(&mut self, name: String, literal: &str) {
        let Some(value) = parse_char_ref(literal) else {
            debug!(entity = %name, "general entity is not a character reference, skipped");
            return;
        };
        match self.char_refs.entry(name) {
            Entry::Vacant(slot) => {
                let name = slot.key().clone();
                slot.insert(CharRef { name, value });
            }
            Entry::Occupied(slot) => {
                debug!(entity = %slot.key(), "character reference already defined, keeping first");
            }
        }
    }

    // ------------------------------------------------------------------
    // ELEMENT
    // ------------------------------------------------------------------

    fn parse_element(&mut self) -> Result<()> {
        self.skip_separators()?;
        let names = self.parse_element_names(CTX_ELEMENT)?;
        self.skip_separators()?;
        let (optional_start, optional_end) = self.parse_minimization()?;
        self.skip_separators()?;
        let content = self.parse_declared_content()?;
        let (includes, excludes) = self.parse_exceptions()?;
        self.finish_declaration(CTX_ELEMENT)?;

        let model = Arc::new(ContentModel {
            content,
            includes,
            excludes,
        });
        for name in names {
            match self.elements.entry(name) {
                Entry::Occupied(mut slot) => {
                    warn!(element = %slot.key(), "element declared twice, later declaration wins");
                    let element = slot.get_mut();
                    element.model = model.clone();
                    element.optional_start = optional_start;
                    element.optional_end = optional_end;
                }
                Entry::Vacant(slot) => {
                    let name = slot.key().clone();
                    slot.insert(Element {
                        name,
                        model: model.clone(),
                        optional_start,
                        optional_end,
                        attributes: BTreeMap::new(),
                        mode: self.mode,
                    });
                }
            }
        }
        Ok(())
    }

    /// A single element name or a name group, normalized
    fn parse_element_names(&mut self, context: &'static str) -> Result<Vec<String>> {
        let names = if self.scanner.peek() == Some(b'(') {
            self.scanner.next();
            self.parse_name_group(context)?
        } else {
            vec![self.expect_name(context)?]
        };
        Ok(names.iter().map(|n| self.mode.element_name(n)).collect())
    }

    /// `- O` start/end tag minimization. Absent in XML DTDs.
    fn parse_minimization(&mut self) -> Result<(bool, bool)> {
        if !self.at_minimization_flag() {
            return Ok((false, false));
        }
        let optional_start = self.read_minimization_flag("ELEMENT optStart definition")?;
        self.skip_separators()?;
        let optional_end = self.read_minimization_flag("ELEMENT optEnd definition")?;
        Ok((optional_start, optional_end))
    }

    fn at_minimization_flag(&self) -> bool {
        matches!(self.scanner.peek(), Some(b'-' | b'O' | b'o'))
            && self.scanner.peek_at(1).is_some_and(is_whitespace)
    }

    fn read_minimization_flag(&mut self, context: &'static str) -> Result<bool> {
        match self.scanner.next_or_eof(context)? {
            b'-' => Ok(false),
            b'O' | b'o' => Ok(true),
            other => Err(unexpected(other, context)),
        }
    }

    fn parse_declared_content(&mut self) -> Result<DeclaredContent> {
        if self.scanner.peek() == Some(b'(') {
            self.scanner.next();
            let content = self.parse_content_group()?;
            return Ok(DeclaredContent::Model(content));
        }
        let keyword = self.expect_name(CTX_ELEMENT)?;
        let content = if self.is_keyword(&keyword, "EMPTY") {
            DeclaredContent::Empty
        } else if self.is_keyword(&keyword, "ANY") {
            DeclaredContent::Any
        } else if self.is_keyword(&keyword, "CDATA") {
            DeclaredContent::CData
        } else if self.is_keyword(&keyword, "RCDATA") {
            DeclaredContent::RCData
        } else {
            return Err(DtdError::UnknownKeyword {
                keyword,
                context: CTX_ELEMENT,
            });
        };
        Ok(content)
    }

    /// Content group after its `(`, with the trailing occurrence operator
    fn parse_content_group(&mut self) -> Result<Arc<Content>> {
        let mut members = Vec::new();
        let mut connector: Option<Connector> = None;
        loop {
            self.skip_separators()?;
            members.push(self.parse_content_item()?);
            self.skip_separators()?;
            let b = self.scanner.next_or_eof(CTX_GROUP)?;
            if b == b')' {
                break;
            }
            let found = Connector::from_byte(b).ok_or_else(|| unexpected(b, CTX_GROUP))?;
            match connector {
                None => connector = Some(found),
                Some(expected) if expected == found => {}
                Some(expected) => {
                    return Err(DtdError::MixedConnectors {
                        expected: expected.as_char(),
                        found: found.as_char(),
                    })
                }
            }
        }

        let group = match (members.len(), connector) {
            (1, _) | (_, None) => members.pop().unwrap_or_else(Content::empty),
            (_, Some(connector)) => self.interner.group(connector, members),
        };
        Ok(self.parse_occurrence(group))
    }

    fn parse_content_item(&mut self) -> Result<Arc<Content>> {
        if self.scanner.peek() == Some(b'(') {
            self.scanner.next();
            return self.parse_content_group();
        }
        let name = self.expect_name(CTX_GROUP)?;
        let leaf = self.interner.leaf(self.mode.element_name(&name));
        Ok(self.parse_occurrence(leaf))
    }

    /// An occurrence operator directly following an item
    fn parse_occurrence(&mut self, item: Arc<Content>) -> Arc<Content> {
        match self.scanner.peek().and_then(Occurrence::from_byte) {
            Some(occurrence) => {
                self.scanner.next();
                self.interner.repeat(occurrence, item)
            }
            None => item,
        }
    }

    /// SGML `+(..)` inclusions and `-(..)` exclusions, in any number
    fn parse_exceptions(&mut self) -> Result<(BTreeSet<String>, BTreeSet<String>)> {
        let mut includes = BTreeSet::new();
        let mut excludes = BTreeSet::new();
        loop {
            self.skip_separators()?;
            let target = match (self.scanner.peek(), self.scanner.peek_at(1)) {
                (Some(b'+'), Some(b'(')) => &mut includes,
                (Some(b'-'), Some(b'(')) => &mut excludes,
                _ => return Ok((includes, excludes)),
            };
            self.scanner.advance(2);
            for name in self.parse_name_group(CTX_ELEMENT)? {
                target.insert(self.mode.element_name(&name));
            }
        }
    }

    /// Names of a group after its `(`; any connector is accepted
    fn parse_name_group(&mut self, context: &'static str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        loop {
            self.skip_separators()?;
            names.push(self.expect_name(context)?);
            self.skip_separators()?;
            match self.scanner.next_or_eof(context)? {
                b')' => return Ok(names),
                b'|' | b',' | b'&' => {}
                other => return Err(unexpected(other, context)),
            }
        }
    }

    // ------------------------------------------------------------------
    // ATTLIST
    // ------------------------------------------------------------------

    fn parse_attlist(&mut self) -> Result<()> {
        self.skip_separators()?;
        let targets = self.parse_element_names(CTX_ATTLIST)?;
        let mut attributes = Vec::new();
        loop {
            self.skip_separators()?;
            if self.scanner.peek() == Some(b'>') {
                self.scanner.next();
                break;
            }
            attributes.push(self.parse_attribute_definition()?);
        }

        for target in targets {
            self.add_attributes(target, &attributes)?;
        }
        Ok(())
    }

    fn parse_attribute_definition(&mut self) -> Result<Attribute> {
        let name = self.expect_name(CTX_ATTLIST)?;
        let name = self.mode.attribute_token(&name);
        let type_helper = self.skip_separators()?;

        let kind = if self.scanner.peek() == Some(b'(') {
            self.scanner.next();
            self.enumeration_kind()?
        } else {
            let keyword = self.expect_name(CTX_ATTLIST)?;
            if self.is_keyword(&keyword, "NOTATION") {
                self.skip_separators()?;
                self.scanner.expect(b'(', CTX_ATTLIST)?;
                self.enumeration_kind()?
            } else {
                AttributeKind::Base(keyword)
            }
        };

        self.skip_separators()?;
        let default = self.parse_attribute_default()?;
        Ok(Attribute {
            name,
            kind,
            type_helper,
            default,
            mode: self.mode,
        })
    }

    fn enumeration_kind(&mut self) -> Result<AttributeKind> {
        let values: BTreeSet<String> = self
            .parse_name_group(CTX_ATTLIST)?
            .iter()
            .map(|v| self.mode.attribute_token(v))
            .collect();
        Ok(if values.len() == 1 {
            AttributeKind::Boolean
        } else {
            AttributeKind::Set(values)
        })
    }

    fn parse_attribute_default(&mut self) -> Result<AttributeDefault> {
        if self.at_quote() {
            return Ok(AttributeDefault::Value(self.scanner.read_literal(CTX_ATTLIST)?));
        }
        let token = self.expect_name(CTX_ATTLIST)?;
        if !token.starts_with('#') {
            return Ok(AttributeDefault::Value(self.mode.attribute_token(&token)));
        }

        let default = if self.is_keyword(&token, "#REQUIRED") {
            AttributeDefault::Required
        } else if self.is_keyword(&token, "#IMPLIED") {
            AttributeDefault::Implied
        } else if self.is_keyword(&token, "#CURRENT") {
            AttributeDefault::Current
        } else if self.is_keyword(&token, "#CONREF") {
            AttributeDefault::Conref
        } else if self.is_keyword(&token, "#FIXED") {
            self.skip_separators()?;
            let value = if self.at_quote() {
                self.scanner.read_literal(CTX_ATTLIST)?
            } else {
                let token = self.expect_name(CTX_ATTLIST)?;
                self.mode.attribute_token(&token)
            };
            AttributeDefault::Fixed(value)
        } else {
            return Err(DtdError::UnknownKeyword {
                keyword: token,
                context: CTX_ATTLIST,
            });
        };
        Ok(default)
    }

    fn add_attributes(&mut self, target: String, attributes: &[Attribute]) -> Result<()> {
        let Some(element) = self.elements.get_mut(&target) else {
            if self.mode.is_xml() {
                self.pending.entry(target).or_default().extend_from_slice(attributes);
                return Ok(());
            }
            return Err(DtdError::UnknownElement {
                name: target,
                referenced_from: "ATTLIST".to_string(),
            });
        };
        merge_attributes(element, attributes);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    #[inline]
    fn is_keyword(&self, token: &str, keyword: &str) -> bool {
        self.mode.keyword_eq(token, keyword)
    }

    #[inline]
    fn at_quote(&self) -> bool {
        matches!(self.scanner.peek(), Some(b'"' | b'\''))
    }

    fn expect_name(&mut self, context: &'static str) -> Result<String> {
        match self.scanner.read_name() {
            Some(name) => Ok(name),
            None => Err(match self.scanner.peek() {
                Some(b) => unexpected(b, context),
                None => DtdError::UnexpectedEof { context },
            }),
        }
    }

    /// Trailing separators and the closing `>`
    fn finish_declaration(&mut self, context: &'static str) -> Result<()> {
        self.skip_separators()?;
        self.scanner.expect(b'>', context)
    }

    /// Declared content and exceptions filling the whole input
    pub(crate) fn parse_content_expression(&mut self) -> Result<ContentModel> {
        self.skip_separators()?;
        let content = self.parse_declared_content()?;
        let (includes, excludes) = self.parse_exceptions()?;
        if let Some(b) = self.scanner.peek() {
            return Err(unexpected(b, CTX_GROUP));
        }
        Ok(ContentModel {
            content,
            includes,
            excludes,
        })
    }

    // ------------------------------------------------------------------
    // Post-pass
    // ------------------------------------------------------------------

    fn finish(mut self, identifier: &str) -> Result<Dtd> {
        for element in self.elements.values() {
            let model = &element.model;
            if let Some(missing) = model
                .includes
                .iter()
                .chain(model.excludes.iter())
                .find(|name| !self.elements.contains_key(*name))
            {
                return Err(DtdError::UnknownElement {
                    name: missing.clone(),
                    referenced_from: element.name.clone(),
                });
            }
        }

        for (target, attributes) in std::mem::take(&mut self.pending) {
            match self.elements.get_mut(&target) {
                Some(element) => merge_attributes(element, &attributes),
                None => warn!(
                    element = %target,
                    count = attributes.len(),
                    "attributes declared for an undeclared element dropped"
                ),
            }
        }

        debug!(
            identifier,
            elements = self.elements.len(),
            char_refs = self.char_refs.len(),
            entities = self.entities.len(),
            content_nodes = self.interner.len(),
            shared_nodes = self.interner.hits(),
            "DTD parsed"
        );

        Ok(Dtd {
            identifier: identifier.to_string(),
            mode: self.mode,
            elements: self.elements,
            char_refs: self.char_refs,
        })
    }
}

/// XML keeps the first definition of an attribute, SGML the last
fn merge_attributes(element: &mut Element, attributes: &[Attribute]) {
    for attribute in attributes {
        match element.attributes.entry(attribute.name.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(attribute.clone());
            }
            Entry::Occupied(mut slot) => {
                if !element.mode.is_xml() {
                    slot.insert(attribute.clone());
                }
            }
        }
    }
}

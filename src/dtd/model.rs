//! Parsed DTD
//!
//! Immutable result of parsing: elements with their content models and
//! attribute lists, plus the character-reference aliases. All lookups that
//! take a prefix return name-ordered results, as completion lists want.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Bound;
use std::sync::Arc;

use crate::config::DtdMode;
use crate::content::Content;

/// Iterate the entries of a sorted map whose key starts with `prefix`
fn prefixed<'a, V>(map: &'a BTreeMap<String, V>, prefix: &str) -> Vec<&'a V> {
    map.range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
        .take_while(|(key, _)| key.starts_with(prefix))
        .map(|(_, value)| value)
        .collect()
}

/// A parsed DTD
#[derive(Debug, Clone)]
pub struct Dtd {
    pub(crate) identifier: String,
    pub(crate) mode: DtdMode,
    pub(crate) elements: BTreeMap<String, Element>,
    pub(crate) char_refs: BTreeMap<String, CharRef>,
}

impl Dtd {
    /// Identify this DTD (usually its public identifier)
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn mode(&self) -> DtdMode {
        self.mode
    }

    /// Elements whose names start with `prefix`
    pub fn element_list(&self, prefix: &str) -> Vec<&Element> {
        let prefix = self.mode.element_name(prefix);
        prefixed(&self.elements, &prefix)
    }

    /// Get the element of given name
    pub fn element(&self, name: &str) -> Option<&Element> {
        match self.mode {
            DtdMode::Xml => self.elements.get(name),
            DtdMode::Sgml => self.elements.get(&name.to_ascii_uppercase()),
        }
    }

    pub fn has_element(&self, name: &str) -> bool {
        self.element(name).is_some()
    }

    pub fn element_names(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(String::as_str)
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Character references whose aliases start with `prefix` (case-sensitive)
    pub fn char_ref_list(&self, prefix: &str) -> Vec<&CharRef> {
        prefixed(&self.char_refs, prefix)
    }

    pub fn char_ref(&self, name: &str) -> Option<&CharRef> {
        self.char_refs.get(name)
    }
}

/// An element declaration
#[derive(Debug, Clone)]
pub struct Element {
    pub(crate) name: String,
    pub(crate) model: Arc<ContentModel>,
    pub(crate) optional_start: bool,
    pub(crate) optional_end: bool,
    pub(crate) attributes: BTreeMap<String, Attribute>,
    pub(crate) mode: DtdMode,
}

impl Element {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared content is `EMPTY`, so the end tag is forbidden
    pub fn is_empty(&self) -> bool {
        matches!(self.model.content, DeclaredContent::Empty)
    }

    pub fn has_optional_start(&self) -> bool {
        self.optional_start
    }

    pub fn has_optional_end(&self) -> bool {
        self.optional_end
    }

    pub fn content_model(&self) -> &Arc<ContentModel> {
        &self.model
    }

    /// Attributes whose names start with `prefix`: `#REQUIRED` ones
    /// first, each part ordered by name
    pub fn attribute_list(&self, prefix: &str) -> Vec<&Attribute> {
        let prefix = self.mode.attribute_token(prefix);
        let mut list = prefixed(&self.attributes, &prefix);
        // stable sort keeps name order inside each group
        list.sort_by_key(|attr| !attr.is_required());
        list
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        match self.mode {
            DtdMode::Xml => self.attributes.get(name),
            DtdMode::Sgml => self.attributes.get(&name.to_ascii_lowercase()),
        }
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{} {}",
            self.name,
            if self.optional_start { " O" } else { " -" },
            if self.optional_end { " O" } else { " -" },
            self.model
        )
    }
}

/// Type of an attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// A keyword type such as `CDATA`, `NUMBER`, `ID`
    Base(String),
    /// An enumeration with a single value (`checked (checked)`)
    Boolean,
    /// An enumeration of allowed values
    Set(BTreeSet<String>),
}

/// Default declaration of an attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeDefault {
    Required,
    Implied,
    Current,
    Conref,
    Fixed(String),
    Value(String),
}

impl AttributeDefault {
    /// The `#KEYWORD` as written, empty for a plain default value
    pub fn mode(&self) -> &'static str {
        match self {
            AttributeDefault::Required => "#REQUIRED",
            AttributeDefault::Implied => "#IMPLIED",
            AttributeDefault::Current => "#CURRENT",
            AttributeDefault::Conref => "#CONREF",
            AttributeDefault::Fixed(_) => "#FIXED",
            AttributeDefault::Value(_) => "",
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            AttributeDefault::Fixed(v) | AttributeDefault::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// An attribute definition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    pub(crate) name: String,
    pub(crate) kind: AttributeKind,
    pub(crate) type_helper: Option<String>,
    pub(crate) default: AttributeDefault,
    pub(crate) mode: DtdMode,
}

impl Attribute {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &AttributeKind {
        &self.kind
    }

    /// The last parameter entity through which the type was written
    pub fn type_helper(&self) -> Option<&str> {
        self.type_helper.as_deref()
    }

    pub fn default(&self) -> &AttributeDefault {
        &self.default
    }

    pub fn is_required(&self) -> bool {
        self.default == AttributeDefault::Required
    }

    /// Values starting with `prefix`; `None` unless the attribute is an
    /// enumeration
    pub fn value_list(&self, prefix: &str) -> Option<Vec<&str>> {
        let AttributeKind::Set(values) = &self.kind else {
            return None;
        };
        let prefix = self.mode.attribute_token(prefix);
        Some(
            values
                .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
                .take_while(|value| value.starts_with(prefix.as_str()))
                .map(String::as_str)
                .collect(),
        )
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        match &self.kind {
            AttributeKind::Set(values) => values
                .get(self.mode.attribute_token(name).as_str())
                .map(String::as_str),
            _ => None,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.name)?;
        match &self.kind {
            AttributeKind::Base(base) => f.write_str(base)?,
            AttributeKind::Boolean => write!(f, "({})", self.name)?,
            AttributeKind::Set(values) => {
                let joined: Vec<&str> = values.iter().map(String::as_str).collect();
                write!(f, "({})", joined.join("|"))?;
            }
        }
        match self.default.value() {
            Some(value) if self.default.mode().is_empty() => write!(f, " \"{}\"", value),
            Some(value) => write!(f, " {} \"{}\"", self.default.mode(), value),
            None => write!(f, " {}", self.default.mode()),
        }
    }
}

/// A character reference alias (`nbsp` -> U+00A0)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharRef {
    pub(crate) name: String,
    pub(crate) value: char,
}

impl CharRef {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The character this alias is for
    pub fn value(&self) -> char {
        self.value
    }
}

impl fmt::Display for CharRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->'{}'(&#{};)", self.name, self.value, self.value as u32)
    }
}

/// Declared content of an element
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeclaredContent {
    Empty,
    Any,
    CData,
    RCData,
    Model(Arc<Content>),
}

impl fmt::Display for DeclaredContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaredContent::Empty => f.write_str("EMPTY"),
            DeclaredContent::Any => f.write_str("ANY"),
            DeclaredContent::CData => f.write_str("CDATA"),
            DeclaredContent::RCData => f.write_str("RCDATA"),
            DeclaredContent::Model(content) => write!(f, "{}", content),
        }
    }
}

/// Content model of an element: declared content plus the SGML
/// inclusion and exclusion exceptions
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentModel {
    pub(crate) content: DeclaredContent,
    pub(crate) includes: BTreeSet<String>,
    pub(crate) excludes: BTreeSet<String>,
}

impl ContentModel {
    pub fn new(content: DeclaredContent) -> Self {
        ContentModel {
            content,
            includes: BTreeSet::new(),
            excludes: BTreeSet::new(),
        }
    }

    pub fn content(&self) -> &DeclaredContent {
        &self.content
    }

    /// Element names allowed anywhere inside, recursively
    pub fn includes(&self) -> &BTreeSet<String> {
        &self.includes
    }

    /// Element names forbidden anywhere inside, recursively
    pub fn excludes(&self) -> &BTreeSet<String> {
        &self.excludes
    }
}

impl fmt::Display for ContentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.content)?;
        for (sign, names) in [('+', &self.includes), ('-', &self.excludes)] {
            if !names.is_empty() {
                let joined: Vec<&str> = names.iter().map(String::as_str).collect();
                write!(f, " {}({})", sign, joined.join("|"))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Connector, Occurrence};

    fn element(name: &str, content: DeclaredContent, mode: DtdMode) -> Element {
        Element {
            name: name.to_string(),
            model: Arc::new(ContentModel::new(content)),
            optional_start: false,
            optional_end: false,
            attributes: BTreeMap::new(),
            mode,
        }
    }

    fn attribute(name: &str, kind: AttributeKind, default: AttributeDefault) -> Attribute {
        Attribute {
            name: name.to_string(),
            kind,
            type_helper: None,
            default,
            mode: DtdMode::Sgml,
        }
    }

    fn sample_dtd() -> Dtd {
        let mut elements = BTreeMap::new();
        for name in ["TABLE", "TBODY", "TD", "TEXTAREA", "TITLE", "BR"] {
            elements.insert(name.to_string(), element(name, DeclaredContent::Empty, DtdMode::Sgml));
        }
        let mut char_refs = BTreeMap::new();
        for (name, value) in [("nbsp", '\u{A0}'), ("not", '\u{AC}'), ("Ntilde", '\u{D1}')] {
            char_refs.insert(name.to_string(), CharRef { name: name.to_string(), value });
        }
        Dtd {
            identifier: "-//W3C//DTD HTML 4.01//EN".to_string(),
            mode: DtdMode::Sgml,
            elements,
            char_refs,
        }
    }

    #[test]
    fn test_element_list_by_prefix() {
        let dtd = sample_dtd();
        let names: Vec<_> = dtd.element_list("t").iter().map(|e| e.name()).collect();
        assert_eq!(names, ["TABLE", "TBODY", "TD", "TEXTAREA", "TITLE"]);
        let names: Vec<_> = dtd.element_list("te").iter().map(|e| e.name()).collect();
        assert_eq!(names, ["TEXTAREA"]);
        assert_eq!(dtd.element_list("").len(), 6);
        assert!(dtd.element_list("x").is_empty());
    }

    #[test]
    fn test_prefix_results_outlive_the_prefix() {
        let dtd = sample_dtd();
        let (elements, refs) = {
            let typed = String::from("tb");
            (dtd.element_list(&typed), dtd.char_ref_list(&typed[..0]))
        };
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].name(), "TBODY");
        assert_eq!(refs.len(), 3);

        let mut img = element("IMG", DeclaredContent::Empty, DtdMode::Sgml);
        let alt = attribute("alt", AttributeKind::Base("CDATA".into()), AttributeDefault::Implied);
        img.attributes.insert(alt.name.clone(), alt);
        let attributes = img.attribute_list(&String::from("AL"));
        assert_eq!(attributes[0].name(), "alt");
    }

    #[test]
    fn test_element_lookup_folds_case_in_sgml() {
        let dtd = sample_dtd();
        assert_eq!(dtd.element("tbody").map(Element::name), Some("TBODY"));
        assert!(dtd.has_element("Br"));
    }

    #[test]
    fn test_char_refs_are_case_sensitive() {
        let dtd = sample_dtd();
        let names: Vec<_> = dtd.char_ref_list("n").iter().map(|c| c.name()).collect();
        assert_eq!(names, ["nbsp", "not"]);
        assert_eq!(dtd.char_ref("Ntilde").map(CharRef::value), Some('\u{D1}'));
        assert!(dtd.char_ref("ntilde").is_none());
    }

    #[test]
    fn test_attribute_list_required_first() {
        let mut img = element("IMG", DeclaredContent::Empty, DtdMode::Sgml);
        for attr in [
            attribute("alt", AttributeKind::Base("CDATA".into()), AttributeDefault::Required),
            attribute("align", AttributeKind::Base("CDATA".into()), AttributeDefault::Implied),
            attribute("src", AttributeKind::Base("CDATA".into()), AttributeDefault::Required),
            attribute("border", AttributeKind::Base("NUMBER".into()), AttributeDefault::Implied),
        ] {
            img.attributes.insert(attr.name.clone(), attr);
        }
        let names: Vec<_> = img.attribute_list("").iter().map(|a| a.name()).collect();
        assert_eq!(names, ["alt", "src", "align", "border"]);
        let names: Vec<_> = img.attribute_list("A").iter().map(|a| a.name()).collect();
        assert_eq!(names, ["alt", "align"]);
        assert!(img.attribute("SRC").is_some_and(Attribute::is_required));
        assert!(img.is_empty());
    }

    #[test]
    fn test_value_list() {
        let values: BTreeSet<String> = ["left", "center", "right", "justify"]
            .into_iter()
            .map(String::from)
            .collect();
        let align = attribute("align", AttributeKind::Set(values), AttributeDefault::Implied);
        assert_eq!(align.value_list("").unwrap(), ["center", "justify", "left", "right"]);
        assert_eq!(align.value_list("L").unwrap(), ["left"]);
        assert_eq!(align.value("RIGHT"), Some("right"));

        let href = attribute("href", AttributeKind::Base("CDATA".into()), AttributeDefault::Implied);
        assert!(href.value_list("").is_none());
        assert!(href.value("x").is_none());
    }

    #[test]
    fn test_display() {
        let content = Content::group(
            Connector::Seq,
            vec![
                Content::leaf("HEAD"),
                Content::repeat(Occurrence::Optional, Content::leaf("BODY")),
            ],
        );
        let mut model = ContentModel::new(DeclaredContent::Model(content));
        model.includes.insert("INS".to_string());
        model.includes.insert("DEL".to_string());
        model.excludes.insert("A".to_string());
        assert_eq!(model.to_string(), "(HEAD,BODY?) +(DEL|INS) -(A)");

        let checked = attribute("checked", AttributeKind::Boolean, AttributeDefault::Implied);
        assert_eq!(checked.to_string(), "checked (checked) #IMPLIED");
        let fixed = attribute(
            "version",
            AttributeKind::Base("CDATA".into()),
            AttributeDefault::Fixed("4.01".into()),
        );
        assert_eq!(fixed.to_string(), "version CDATA #FIXED \"4.01\"");

        let nbsp = CharRef { name: "nbsp".to_string(), value: '\u{A0}' };
        assert_eq!(nbsp.to_string(), "nbsp->'\u{A0}'(&#160;)");
    }
}

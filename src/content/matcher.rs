//! Content Model Matcher
//!
//! Walks a content model over the child elements already present in a
//! document and answers which element names may come next. SGML exceptions
//! are honoured: inclusions may appear anywhere without advancing the
//! model, exclusions are never allowed, and both are inherited from every
//! open ancestor element.

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;

use crate::config::DtdMode;
use crate::core::error::{DtdError, Result};
use crate::dtd::{ContentModel, DeclaredContent, Dtd};

use super::node::Content;

/// A child element that the content model does not allow at its position
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("element {name} not allowed at position {index}")]
pub struct Rejection {
    /// Position in the consumed sequence
    pub index: usize,
    pub name: String,
}

/// Answer to a completion query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Element names allowed next
    pub next: BTreeSet<String>,
    /// Whether the element may be closed now
    pub can_close: bool,
    /// First consumed name that did not match, if any
    pub rejected: Option<Rejection>,
}

#[derive(Debug, Clone)]
enum State {
    /// `ANY`
    Any,
    /// `EMPTY`, `CDATA`, `RCDATA`
    Nothing,
    Model(Arc<Content>),
}

#[derive(Debug, Clone)]
pub struct ContentMatcher<'d> {
    dtd: Option<&'d Dtd>,
    mode: DtdMode,
    state: State,
    includes: BTreeSet<String>,
    excludes: BTreeSet<String>,
    consumed: usize,
}

impl<'d> ContentMatcher<'d> {
    /// Matcher over a bare content model, not attached to any DTD
    pub fn new(model: &ContentModel, mode: DtdMode) -> Self {
        ContentMatcher {
            dtd: None,
            mode,
            state: initial_state(model),
            includes: model.includes().clone(),
            excludes: model.excludes().clone(),
            consumed: 0,
        }
    }

    /// Matcher for the content of a declared element
    pub fn for_element(dtd: &'d Dtd, name: &str) -> Result<Self> {
        Self::for_path(dtd, &[name])
    }

    /// Matcher for the last element of `path`; the elements before it are
    /// its open ancestors, outermost first, and contribute their exceptions.
    /// An empty path is `EmptyPath`.
    pub fn for_path<S: AsRef<str>>(dtd: &'d Dtd, path: &[S]) -> Result<Self> {
        let mut includes = BTreeSet::new();
        let mut excludes = BTreeSet::new();
        let mut current = None;
        for name in path {
            let name = name.as_ref();
            let element = dtd
                .element(name)
                .ok_or_else(|| DtdError::NoSuchElement(name.to_string()))?;
            let model = element.content_model();
            includes.extend(model.includes().iter().cloned());
            excludes.extend(model.excludes().iter().cloned());
            current = Some(model);
        }
        let model = current.ok_or(DtdError::EmptyPath)?;

        Ok(ContentMatcher {
            dtd: Some(dtd),
            mode: dtd.mode(),
            state: initial_state(model),
            includes,
            excludes,
            consumed: 0,
        })
    }

    /// Consume the next child element
    pub fn feed(&mut self, name: &str) -> std::result::Result<(), Rejection> {
        let name = self.mode.element_name(name);
        let derivative = match &self.state {
            State::Model(content) => content.reduce(&name),
            State::Any | State::Nothing => None,
        };
        let accepted = !self.excludes.contains(&name)
            && (matches!(self.state, State::Any)
                || derivative.is_some()
                || self.includes.contains(&name));

        if !accepted {
            return Err(Rejection {
                index: self.consumed,
                name,
            });
        }
        if let Some(rest) = derivative {
            self.state = State::Model(rest);
        }
        self.consumed += 1;
        Ok(())
    }

    /// Element names that may come next
    pub fn possible_next(&self) -> BTreeSet<String> {
        let mut names = match &self.state {
            State::Any => self
                .dtd
                .map(|dtd| dtd.element_names().map(String::from).collect())
                .unwrap_or_default(),
            State::Nothing => BTreeSet::new(),
            State::Model(content) => content.possible_names(),
        };
        names.extend(self.includes.iter().cloned());
        names.retain(|name| !self.excludes.contains(name));
        if let Some(dtd) = self.dtd {
            names.retain(|name| dtd.has_element(name));
        }
        names
    }

    /// The element may be closed in the current state
    pub fn can_close(&self) -> bool {
        match &self.state {
            State::Any | State::Nothing => true,
            State::Model(content) => content.is_discardable(),
        }
    }

    /// Number of names consumed so far
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Feed `consumed` up to the first rejection and report the state
    pub fn complete<S: AsRef<str>>(mut self, consumed: &[S]) -> Completion {
        let rejected = consumed
            .iter()
            .find_map(|name| self.feed(name.as_ref()).err());
        Completion {
            next: self.possible_next(),
            can_close: self.can_close(),
            rejected,
        }
    }
}

fn initial_state(model: &ContentModel) -> State {
    match model.content() {
        DeclaredContent::Any => State::Any,
        DeclaredContent::Empty | DeclaredContent::CData | DeclaredContent::RCData => {
            State::Nothing
        }
        DeclaredContent::Model(content) => State::Model(content.clone()),
    }
}

/// Completion over a bare content model
pub fn complete<S: AsRef<str>>(model: &ContentModel, mode: DtdMode, consumed: &[S]) -> Completion {
    ContentMatcher::new(model, mode).complete(consumed)
}

/// Completion inside the last element of `path`
pub fn complete_element<P, S>(dtd: &Dtd, path: &[P], consumed: &[S]) -> Result<Completion>
where
    P: AsRef<str>,
    S: AsRef<str>,
{
    Ok(ContentMatcher::for_path(dtd, path)?.complete(consumed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParseOptions;
    use crate::content::{parse_content_model, Connector, Occurrence};
    use crate::dtd::{parse_source, CatalogProvider};
    use proptest::prelude::*;

    fn names(set: &BTreeSet<String>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    fn xml_model(expression: &str) -> ContentModel {
        parse_content_model(expression, DtdMode::Xml).unwrap()
    }

    const DTD: &str = r##"
<!ENTITY % inline "#PCDATA | A | B | BR">
<!ELEMENT HTML O O (HEAD, BODY)>
<!ELEMENT HEAD O O (TITLE & BASE?) +(SCRIPT)>
<!ELEMENT TITLE - - (#PCDATA) -(SCRIPT)>
<!ELEMENT BASE - O EMPTY>
<!ELEMENT SCRIPT - - CDATA>
<!ELEMENT BODY O O (P | UL | DIV)+ +(INS)>
<!ELEMENT INS - - (%inline;)*>
<!ELEMENT P - O (%inline;)*>
<!ELEMENT (A|B) - - (%inline;)* -(A)>
<!ELEMENT BR - O EMPTY>
<!ELEMENT UL - - (LI)+>
<!ELEMENT LI - O (%inline; | UL)*>
<!ELEMENT DIV - - ANY>
"##;

    fn dtd() -> Dtd {
        parse_source(&CatalogProvider::new(), "test", DTD, &ParseOptions::sgml()).unwrap()
    }

    #[test]
    fn test_sequence_completion() {
        let model = xml_model("(a,b*,(c|d)+)");
        let at_start = complete::<&str>(&model, DtdMode::Xml, &[]);
        assert_eq!(names(&at_start.next), ["a"]);
        assert!(!at_start.can_close);

        let after_a = complete(&model, DtdMode::Xml, &["a"]);
        assert_eq!(names(&after_a.next), ["b", "c", "d"]);

        let after_c = complete(&model, DtdMode::Xml, &["a", "b", "c"]);
        assert_eq!(names(&after_c.next), ["c", "d"]);
        assert!(after_c.can_close);
        assert!(after_c.rejected.is_none());
    }

    #[test]
    fn test_rejection_stops_feeding() {
        let model = xml_model("(a,b)");
        let result = complete(&model, DtdMode::Xml, &["a", "c", "b"]);
        assert_eq!(
            result.rejected,
            Some(Rejection {
                index: 1,
                name: "c".to_string()
            })
        );
        assert_eq!(names(&result.next), ["b"]);
        assert!(!result.can_close);
    }

    #[test]
    fn test_fully_consumed_sequence() {
        let model = xml_model("(a,b)");
        let result = complete(&model, DtdMode::Xml, &["a", "b"]);
        assert!(result.next.is_empty());
        assert!(result.can_close);
        let result = complete(&model, DtdMode::Xml, &["a", "b", "b"]);
        assert_eq!(result.rejected.map(|r| r.index), Some(2));
    }

    #[test]
    fn test_keyword_content() {
        let empty = xml_model("EMPTY");
        let result = complete(&empty, DtdMode::Xml, &["x"]);
        assert!(result.rejected.is_some());
        assert!(result.can_close);

        let any = xml_model("ANY");
        let result = complete(&any, DtdMode::Xml, &["x", "y"]);
        assert!(result.rejected.is_none());
        assert!(result.next.is_empty());
    }

    #[test]
    fn test_sgml_names_are_folded() {
        let model = parse_content_model("(ul|ol)", DtdMode::Sgml).unwrap();
        let mut matcher = ContentMatcher::new(&model, DtdMode::Sgml);
        assert!(matcher.feed("ul").is_ok());
        assert!(matcher.can_close());
        assert_eq!(matcher.consumed(), 1);
    }

    #[test]
    fn test_for_element() {
        let dtd = dtd();
        let html = ContentMatcher::for_element(&dtd, "html").unwrap();
        assert_eq!(names(&html.possible_next()), ["HEAD"]);

        let head = complete_element(&dtd, &["HTML", "HEAD"], &["BASE"]).unwrap();
        assert_eq!(names(&head.next), ["SCRIPT", "TITLE"]);
        assert!(!head.can_close);

        let head = complete_element(&dtd, &["HTML", "HEAD"], &["script", "title", "script"]).unwrap();
        assert!(head.rejected.is_none());
        assert!(head.can_close);
        assert_eq!(names(&head.next), ["BASE", "SCRIPT"]);

        assert_eq!(
            ContentMatcher::for_element(&dtd, "FONT").unwrap_err(),
            DtdError::NoSuchElement("FONT".to_string())
        );
        assert_eq!(
            ContentMatcher::for_path::<&str>(&dtd, &[]).unwrap_err(),
            DtdError::EmptyPath
        );
    }

    #[test]
    fn test_exceptions_are_inherited() {
        let dtd = dtd();
        // TITLE excludes SCRIPT even though HEAD includes it
        let title = complete_element(&dtd, &["HTML", "HEAD", "TITLE"], &["SCRIPT"]).unwrap();
        assert_eq!(title.rejected.map(|r| r.name), Some("SCRIPT".to_string()));

        let p = complete_element::<_, &str>(&dtd, &["HTML", "BODY", "P"], &[]).unwrap();
        assert_eq!(names(&p.next), ["A", "B", "BR", "INS"]);

        // A excludes itself, recursively
        let nested = complete_element::<_, &str>(&dtd, &["BODY", "P", "A", "B"], &[]).unwrap();
        assert_eq!(names(&nested.next), ["B", "BR", "INS"]);
    }

    #[test]
    fn test_any_offers_declared_elements() {
        let dtd = dtd();
        let div = complete_element(&dtd, &["BODY", "DIV"], &["whatever"]).unwrap();
        assert!(div.rejected.is_none());
        assert_eq!(div.next.len(), dtd.element_count());
    }

    #[test]
    fn test_cdata_content() {
        let dtd = dtd();
        let script = complete_element(&dtd, &["SCRIPT"], &["P"]).unwrap();
        assert!(script.next.is_empty());
        assert!(script.can_close);
        assert!(script.rejected.is_some());
    }

    #[test]
    fn test_undeclared_names_are_not_offered() {
        let dtd = parse_source(
            &CatalogProvider::new(),
            "t",
            "<!ELEMENT list (item|ghost)*><!ELEMENT item EMPTY>",
            &ParseOptions::xml(),
        )
        .unwrap();
        let list = complete_element::<_, &str>(&dtd, &["list"], &[]).unwrap();
        assert_eq!(names(&list.next), ["item"]);
    }

    const ALPHABET: [&str; 4] = ["a", "b", "c", "d"];

    fn content_strategy() -> impl Strategy<Value = Arc<Content>> {
        let leaf = prop::sample::select(ALPHABET.to_vec()).prop_map(|name| Content::leaf(name));
        leaf.prop_recursive(4, 24, 4, |inner| {
            prop_oneof![
                (
                    prop::sample::select(vec![
                        Occurrence::Optional,
                        Occurrence::ZeroOrMore,
                        Occurrence::OneOrMore
                    ]),
                    inner.clone()
                )
                    .prop_map(|(occurrence, content)| Content::repeat(occurrence, content)),
                (
                    prop::sample::select(vec![Connector::Seq, Connector::Choice, Connector::And]),
                    prop::collection::vec(inner, 2..4)
                )
                    .prop_map(|(connector, members)| Arc::new(Content::Group(connector, members))),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_offered_names_are_accepted(
            content in content_strategy(),
            picks in prop::collection::vec(any::<prop::sample::Index>(), 0..16),
        ) {
            let model = ContentModel::new(DeclaredContent::Model(content));
            let mut matcher = ContentMatcher::new(&model, DtdMode::Xml);
            for pick in picks {
                let next: Vec<String> = matcher.possible_next().into_iter().collect();
                if next.is_empty() {
                    break;
                }
                let name = pick.get(&next).clone();
                prop_assert!(matcher.feed(&name).is_ok(), "{} offered but rejected", name);
            }
        }

        #[test]
        fn prop_names_not_offered_are_rejected(
            content in content_strategy(),
            prefix in prop::collection::vec(prop::sample::select(ALPHABET.to_vec()), 0..6),
        ) {
            let model = ContentModel::new(DeclaredContent::Model(content));
            let mut matcher = ContentMatcher::new(&model, DtdMode::Xml);
            for name in prefix {
                if matcher.feed(name).is_err() {
                    break;
                }
            }
            let next = matcher.possible_next();
            for name in ALPHABET {
                let mut probe = matcher.clone();
                prop_assert_eq!(probe.feed(name).is_ok(), next.contains(name));
            }
        }
    }
}

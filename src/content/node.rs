//! Content Model Tree
//!
//! A content model is matched against a sequence of child element names by
//! taking derivatives: `reduce(name)` returns the content that must still
//! follow after `name` has been consumed. This is the automaton simulation
//! behind "what may come next" completion, without ever building an
//! explicit state table.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

/// Leaf name standing for character data in mixed content
pub const PCDATA: &str = "#PCDATA";

/// Multiplicity operator attached to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occurrence {
    /// `?`
    Optional,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
}

impl Occurrence {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'?' => Some(Occurrence::Optional),
            b'*' => Some(Occurrence::ZeroOrMore),
            b'+' => Some(Occurrence::OneOrMore),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Occurrence::Optional => '?',
            Occurrence::ZeroOrMore => '*',
            Occurrence::OneOrMore => '+',
        }
    }
}

/// Group connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connector {
    /// `,` - members in order
    Seq,
    /// `|` - exactly one member
    Choice,
    /// `&` - all members, any order (SGML only)
    And,
}

impl Connector {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            b',' => Some(Connector::Seq),
            b'|' => Some(Connector::Choice),
            b'&' => Some(Connector::And),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Connector::Seq => ',',
            Connector::Choice => '|',
            Connector::And => '&',
        }
    }
}

/// Node of a content model tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Content {
    /// Nothing left to match
    Empty,
    /// A single element name (or `#PCDATA`)
    Leaf(String),
    /// A node with `?`, `*` or `+`
    Repeat(Occurrence, Arc<Content>),
    /// A group of two or more members
    Group(Connector, Vec<Arc<Content>>),
}

impl Content {
    pub fn empty() -> Arc<Content> {
        Arc::new(Content::Empty)
    }

    pub fn leaf(name: impl Into<String>) -> Arc<Content> {
        Arc::new(Content::Leaf(name.into()))
    }

    pub fn repeat(occurrence: Occurrence, inner: Arc<Content>) -> Arc<Content> {
        Arc::new(Content::Repeat(occurrence, inner))
    }

    /// Build a group in canonical form. Nested sequences and choices are
    /// spliced into their parent, choices keep one copy of each
    /// alternative, consumed members are dropped from sequences and
    /// and-groups, and a group left with a single member is that member.
    pub fn group(connector: Connector, members: Vec<Arc<Content>>) -> Arc<Content> {
        let mut members: Vec<Arc<Content>> = match connector {
            Connector::Choice => {
                let mut seen = HashSet::with_capacity(members.len());
                splice(connector, members)
                    .filter(|m| seen.insert(m.clone()))
                    .collect()
            }
            Connector::Seq => splice(connector, members).filter(|m| !m.is_empty()).collect(),
            Connector::And => members.into_iter().filter(|m| !m.is_empty()).collect(),
        };
        match members.len() {
            0 => Content::empty(),
            1 => members.pop().unwrap_or_else(Content::empty),
            _ => Arc::new(Content::Group(connector, members)),
        }
    }

    /// True for the fully consumed state
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Content::Empty)
    }

    /// Can this content match an empty sequence of elements?
    ///
    /// `#PCDATA` counts as discardable because text never shows up in the
    /// element sequence being matched.
    pub fn is_discardable(&self) -> bool {
        match self {
            Content::Empty => true,
            Content::Leaf(name) => name == PCDATA,
            Content::Repeat(Occurrence::OneOrMore, inner) => inner.is_discardable(),
            Content::Repeat(_, _) => true,
            Content::Group(Connector::Choice, members) => {
                members.iter().any(|m| m.is_discardable())
            }
            Content::Group(_, members) => members.iter().all(|m| m.is_discardable()),
        }
    }

    /// Derivative with respect to one element name.
    ///
    /// Returns `None` if `name` cannot come next, or the content that must
    /// still follow (`Content::Empty` once everything is consumed). When
    /// the model is ambiguous all surviving alternatives are kept in a
    /// choice group, so the result is exact for any model.
    pub fn reduce(self: &Arc<Self>, name: &str) -> Option<Arc<Content>> {
        match self.as_ref() {
            Content::Empty => None,
            Content::Leaf(leaf) => (leaf == name).then(Content::empty),
            Content::Repeat(occurrence, inner) => {
                let rest = inner.reduce(name)?;
                Some(match occurrence {
                    Occurrence::Optional => rest,
                    Occurrence::ZeroOrMore => Content::group(Connector::Seq, vec![rest, self.clone()]),
                    Occurrence::OneOrMore => {
                        let tail = Content::repeat(Occurrence::ZeroOrMore, inner.clone());
                        Content::group(Connector::Seq, vec![rest, tail])
                    }
                })
            }
            Content::Group(Connector::Choice, members) => {
                let alternatives: Vec<_> = members.iter().filter_map(|m| m.reduce(name)).collect();
                if alternatives.is_empty() {
                    None
                } else {
                    Some(Content::group(Connector::Choice, alternatives))
                }
            }
            Content::Group(Connector::Seq, members) => {
                let mut alternatives = Vec::new();
                for (index, member) in members.iter().enumerate() {
                    if let Some(rest) = member.reduce(name) {
                        let mut remaining = Vec::with_capacity(members.len() - index);
                        remaining.push(rest);
                        remaining.extend(members[index + 1..].iter().cloned());
                        alternatives.push(Content::group(Connector::Seq, remaining));
                    }
                    // a member that must match blocks everything behind it
                    if !member.is_discardable() {
                        break;
                    }
                }
                if alternatives.is_empty() {
                    None
                } else {
                    Some(Content::group(Connector::Choice, alternatives))
                }
            }
            Content::Group(Connector::And, members) => {
                let mut alternatives = Vec::new();
                for (index, member) in members.iter().enumerate() {
                    if let Some(rest) = member.reduce(name) {
                        let others: Vec<_> = members
                            .iter()
                            .enumerate()
                            .filter(|(i, _)| *i != index)
                            .map(|(_, m)| m.clone())
                            .collect();
                        // the started member has to finish before another begins
                        let remaining = Content::group(Connector::And, others);
                        alternatives.push(Content::group(Connector::Seq, vec![rest, remaining]));
                    }
                }
                if alternatives.is_empty() {
                    None
                } else {
                    Some(Content::group(Connector::Choice, alternatives))
                }
            }
        }
    }

    /// Element names that may legally come next
    pub fn possible_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_possible(&mut names);
        names
    }

    fn collect_possible(&self, names: &mut BTreeSet<String>) {
        match self {
            Content::Empty => {}
            Content::Leaf(name) => {
                if name != PCDATA {
                    names.insert(name.clone());
                }
            }
            Content::Repeat(_, inner) => inner.collect_possible(names),
            Content::Group(Connector::Seq, members) => {
                for member in members {
                    member.collect_possible(names);
                    if !member.is_discardable() {
                        break;
                    }
                }
            }
            Content::Group(_, members) => {
                for member in members {
                    member.collect_possible(names);
                }
            }
        }
    }
}

/// Replace members that are groups of the same connector by their members
fn splice(connector: Connector, members: Vec<Arc<Content>>) -> impl Iterator<Item = Arc<Content>> {
    members.into_iter().flat_map(move |member| {
        if let Content::Group(inner_connector, inner) = member.as_ref() {
            if *inner_connector == connector {
                return inner.clone();
            }
        }
        vec![member]
    })
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Content::Empty => f.write_str("()"),
            Content::Leaf(name) => f.write_str(name),
            Content::Repeat(occurrence, inner) => write!(f, "{}{}", inner, occurrence.as_char()),
            Content::Group(connector, members) => {
                f.write_str("(")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", connector.as_char())?;
                    }
                    write!(f, "{}", member)?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str) -> Arc<Content> {
        Content::leaf(name)
    }

    fn names(content: &Content) -> Vec<String> {
        content.possible_names().into_iter().collect()
    }

    /// Feed names one by one; None if any is rejected
    fn feed(content: &Arc<Content>, input: &[&str]) -> Option<Arc<Content>> {
        input.iter().try_fold(content.clone(), |state, name| state.reduce(name))
    }

    #[test]
    fn test_leaf_reduces_to_empty() {
        let a = leaf("a");
        assert!(a.reduce("a").unwrap().is_empty());
        assert!(a.reduce("b").is_none());
    }

    #[test]
    fn test_pcdata_is_discardable_but_not_offered() {
        let pcdata = leaf(PCDATA);
        assert!(pcdata.is_discardable());
        assert!(pcdata.possible_names().is_empty());
    }

    #[test]
    fn test_sequence_skips_optional_members() {
        // (a?, b*, c)
        let model = Content::group(
            Connector::Seq,
            vec![
                Content::repeat(Occurrence::Optional, leaf("a")),
                Content::repeat(Occurrence::ZeroOrMore, leaf("b")),
                leaf("c"),
            ],
        );
        assert_eq!(names(&model), ["a", "b", "c"]);
        assert!(!model.is_discardable());

        let after_b = model.reduce("b").unwrap();
        assert_eq!(names(&after_b), ["b", "c"]);
        assert!(after_b.reduce("a").is_none());

        let done = feed(&model, &["a", "b", "b", "c"]).unwrap();
        assert!(done.is_empty());
    }

    #[test]
    fn test_last_member_of_sequence_consumed() {
        let model = Content::group(Connector::Seq, vec![leaf("a"), leaf("b")]);
        let done = feed(&model, &["a", "b"]).unwrap();
        assert!(done.is_empty());
        assert!(done.reduce("b").is_none());
    }

    #[test]
    fn test_plus_becomes_star() {
        let model = Content::repeat(Occurrence::OneOrMore, leaf("li"));
        assert!(!model.is_discardable());
        let after = model.reduce("li").unwrap();
        assert_eq!(after.to_string(), "li*");
        assert!(after.is_discardable());
        assert_eq!(names(&after), ["li"]);
    }

    #[test]
    fn test_repeated_group_restarts() {
        // (dt, dd)+
        let pair = Content::group(Connector::Seq, vec![leaf("dt"), leaf("dd")]);
        let model = Content::repeat(Occurrence::OneOrMore, pair);
        let mid = model.reduce("dt").unwrap();
        assert_eq!(names(&mid), ["dd"]);
        assert!(!mid.is_discardable());
        let after = mid.reduce("dd").unwrap();
        assert!(after.is_discardable());
        assert_eq!(names(&after), ["dt"]);
    }

    #[test]
    fn test_choice() {
        let model = Content::group(Connector::Choice, vec![leaf("c"), leaf("d")]);
        assert_eq!(names(&model), ["c", "d"]);
        assert!(model.reduce("d").unwrap().is_empty());
        assert!(model.reduce("e").is_none());
    }

    #[test]
    fn test_and_group_any_order() {
        // (title & base?) as in the HTML 4 HEAD content
        let model = Content::group(
            Connector::And,
            vec![leaf("title"), Content::repeat(Occurrence::Optional, leaf("base"))],
        );
        assert_eq!(names(&model), ["base", "title"]);
        assert!(!model.is_discardable());

        let after_base = model.reduce("base").unwrap();
        assert_eq!(names(&after_base), ["title"]);
        assert!(after_base.reduce("base").is_none());

        let after_title = model.reduce("title").unwrap();
        assert!(after_title.is_discardable());
        assert_eq!(names(&after_title), ["base"]);
    }

    #[test]
    fn test_ambiguous_sequence_keeps_both_paths() {
        // (a?, a): after one "a" the element may already be complete
        let model = Content::group(
            Connector::Seq,
            vec![Content::repeat(Occurrence::Optional, leaf("a")), leaf("a")],
        );
        let after = model.reduce("a").unwrap();
        assert!(after.is_discardable());
        assert_eq!(names(&after), ["a"]);
        assert!(feed(&model, &["a", "a"]).unwrap().is_discardable());
        assert!(feed(&model, &["a", "a", "a"]).is_none());
    }

    #[test]
    fn test_mixed_content() {
        // (#PCDATA | em | strong)*
        let model = Content::repeat(
            Occurrence::ZeroOrMore,
            Content::group(Connector::Choice, vec![leaf(PCDATA), leaf("em"), leaf("strong")]),
        );
        assert!(model.is_discardable());
        assert_eq!(names(&model), ["em", "strong"]);
        assert!(feed(&model, &["em", "strong", "em"]).is_some());
    }

    #[test]
    fn test_display() {
        let model = Content::group(
            Connector::Seq,
            vec![
                leaf("a"),
                Content::repeat(Occurrence::ZeroOrMore, leaf("b")),
                Content::repeat(
                    Occurrence::OneOrMore,
                    Content::group(Connector::Choice, vec![leaf("c"), leaf("d")]),
                ),
            ],
        );
        assert_eq!(model.to_string(), "(a,b*,(c|d)+)");
    }

    fn node_count(content: &Content) -> usize {
        match content {
            Content::Empty | Content::Leaf(_) => 1,
            Content::Repeat(_, inner) => 1 + node_count(inner),
            Content::Group(_, members) => 1 + members.iter().map(|m| node_count(m)).sum::<usize>(),
        }
    }

    #[test]
    fn test_ambiguous_derivatives_stay_bounded() {
        // (a*,a*,a*,a*,a*): every prefix of the sequence may have taken the name
        let star = Content::repeat(Occurrence::ZeroOrMore, leaf("a"));
        let model = Content::group(Connector::Seq, vec![star; 5]);

        let mut state = model.reduce("a").unwrap();
        let settled = node_count(&state);
        for _ in 1..60 {
            state = state.reduce("a").unwrap();
            assert_eq!(node_count(&state), settled);
        }
        assert!(settled < 64);
        assert!(state.is_discardable());
        assert_eq!(names(&state), ["a"]);
    }

    #[test]
    fn test_nested_groups_are_spliced() {
        let inner = Content::group(Connector::Choice, vec![leaf("a"), leaf("b")]);
        let outer = Content::group(Connector::Choice, vec![leaf("b"), inner, leaf("c")]);
        assert_eq!(outer.to_string(), "(b|a|c)");

        let tail = Content::group(Connector::Seq, vec![leaf("b"), leaf("c")]);
        let seq = Content::group(Connector::Seq, vec![leaf("a"), tail]);
        assert_eq!(seq.to_string(), "(a,b,c)");

        // and-groups are not associative: a started member must finish first
        let both = Content::group(Connector::And, vec![leaf("b"), leaf("c")]);
        let and = Content::group(Connector::And, vec![leaf("a"), both]);
        assert_eq!(and.to_string(), "(a&(b&c))");
    }

    #[test]
    fn test_group_collapses() {
        assert!(Content::group(Connector::Seq, vec![]).is_empty());
        assert_eq!(
            Content::group(Connector::Seq, vec![Content::empty(), leaf("a")]),
            leaf("a")
        );
        assert_eq!(
            Content::group(Connector::Choice, vec![leaf("a"), leaf("a")]),
            leaf("a")
        );
    }
}

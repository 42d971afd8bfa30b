//! Content Node Interning
//!
//! DTDs repeat the same sub-models over and over through parameter
//! entities (`%inline;`, `%flow;` ...). Nodes are hash-consed while a DTD
//! is parsed so every distinct subtree is allocated once and shared.

use std::collections::HashSet;
use std::sync::Arc;

use super::node::{Connector, Content, Occurrence};

/// Hash-consing pool for content nodes
#[derive(Debug, Default)]
pub struct ContentInterner {
    nodes: HashSet<Arc<Content>>,
    /// Number of intern requests answered from the pool
    hits: usize,
}

impl ContentInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared instance equal to `node`, storing it if new
    pub fn intern(&mut self, node: Content) -> Arc<Content> {
        if let Some(existing) = self.nodes.get(&node) {
            self.hits += 1;
            return existing.clone();
        }
        let node = Arc::new(node);
        self.nodes.insert(node.clone());
        node
    }

    pub fn leaf(&mut self, name: String) -> Arc<Content> {
        self.intern(Content::Leaf(name))
    }

    pub fn repeat(&mut self, occurrence: Occurrence, inner: Arc<Content>) -> Arc<Content> {
        self.intern(Content::Repeat(occurrence, inner))
    }

    /// Intern a group as written. Unlike `Content::group` nothing is
    /// collapsed: `(a|a)` stays a two-member choice, matching the source.
    pub fn group(&mut self, connector: Connector, members: Vec<Arc<Content>>) -> Arc<Content> {
        self.intern(Content::Group(connector, members))
    }

    /// Number of distinct nodes stored
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes that were shared instead of allocated
    pub fn hits(&self) -> usize {
        self.hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_duplicate() {
        let mut pool = ContentInterner::new();
        let a1 = pool.leaf("a".to_string());
        let a2 = pool.leaf("a".to_string());
        assert!(Arc::ptr_eq(&a1, &a2));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.hits(), 1);
    }

    #[test]
    fn test_intern_different() {
        let mut pool = ContentInterner::new();
        let a = pool.leaf("a".to_string());
        let b = pool.leaf("b".to_string());
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_shared_subtrees() {
        let mut pool = ContentInterner::new();
        let build = |pool: &mut ContentInterner| {
            let em = pool.leaf("em".to_string());
            let strong = pool.leaf("strong".to_string());
            let choice = pool.group(Connector::Choice, vec![em, strong]);
            pool.repeat(Occurrence::ZeroOrMore, choice)
        };
        let first = build(&mut pool);
        let second = build(&mut pool);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(pool.len(), 4);
    }
}

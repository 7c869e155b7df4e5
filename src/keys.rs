//! Structural identities used as hash-equality keys during alignment.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use crate::dom::{Dom, NodeId, NodeType};
use crate::word_match::WordMatcher;

/// Identity of a single node: type, name, value and attributes. Children do
/// not participate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeKey {
    pub node_type: NodeType,
    pub name: Option<String>,
    pub value: Option<String>,
    pub attrs: BTreeMap<String, String>,
}

impl NodeKey {
    pub fn of(dom: &Dom, node: NodeId) -> Self {
        Self {
            node_type: dom.node_type(node),
            name: dom.name(node).map(str::to_owned),
            value: dom.text_value(node).map(str::to_owned),
            attrs: dom.attributes(node).cloned().unwrap_or_default(),
        }
    }
}

/// Identity of a whole subtree: the node key plus the tree keys of all
/// children, recursively.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreeKey {
    pub key: NodeKey,
    pub children: Vec<TreeKey>,
}

impl TreeKey {
    pub fn of(dom: &Dom, node: NodeId) -> Self {
        Self {
            key: NodeKey::of(dom, node),
            children: dom
                .children(node)
                .iter()
                .map(|&child| Self::of(dom, child))
                .collect(),
        }
    }

    /// Whether the subtree contains no text beyond whitespace. Such subtrees
    /// are junk for alignment purposes.
    pub fn is_whitespace_only(&self) -> bool {
        if let Some(value) = &self.key.value
            && !(!value.is_empty() && value.chars().all(char::is_whitespace))
        {
            return false;
        }
        self.children.iter().all(Self::is_whitespace_only)
    }
}

/// Key for the fuzzy matching tier.
///
/// Two keys are equal when their top node keys are equal and the subtrees
/// are either identical or textually similar enough. The hash only covers
/// the node key, so hash-equal candidates are re-checked pairwise, which is
/// what makes the similarity oracle usable inside a hash-indexed matcher.
#[derive(Debug, Clone)]
pub struct FuzzyTreeKey {
    key: NodeKey,
    tree: TreeKey,
    text: String,
}

impl FuzzyTreeKey {
    pub const SIMILARITY_CUTOFF: f64 = 0.4;

    pub fn of(dom: &Dom, node: NodeId) -> Self {
        Self {
            key: NodeKey::of(dom, node),
            tree: TreeKey::of(dom, node),
            text: dom.tree_text(node),
        }
    }

    pub fn is_junk(&self) -> bool {
        self.tree.is_whitespace_only()
    }
}

impl PartialEq for FuzzyTreeKey {
    fn eq(&self, other: &Self) -> bool {
        if self.key != other.key {
            return false;
        }
        if self.tree == other.tree {
            return true;
        }
        text_similarity(&self.text, &other.text) >= Self::SIMILARITY_CUTOFF
    }
}

impl Eq for FuzzyTreeKey {}

impl Hash for FuzzyTreeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Must stay compatible with the fuzzy equality above: equal keys
        // always have equal top node keys.
        self.key.hash(state);
    }
}

/// Text similarity of two subtrees, the fuzzy-match oracle.
pub fn tree_text_ratio(a_dom: &Dom, a: NodeId, b_dom: &Dom, b: NodeId) -> f64 {
    text_similarity(&a_dom.tree_text(a), &b_dom.tree_text(b))
}

fn text_similarity(a: &str, b: &str) -> f64 {
    WordMatcher::new(a, b).text_ratio()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Dom;

    fn heading(dom: &mut Dom, tag: &str, text: &str) -> NodeId {
        let element = dom.create_element(tag, BTreeMap::new());
        let content = dom.create_text(text);
        dom.append_child(element, content);
        dom.append_child(dom.root(), element);
        element
    }

    #[test]
    fn tree_keys_compare_whole_subtrees() {
        let mut dom = Dom::with_root("body");
        let a = heading(&mut dom, "h1", "one");
        let b = heading(&mut dom, "h1", "one");
        let c = heading(&mut dom, "h1", "two");
        assert_eq!(TreeKey::of(&dom, a), TreeKey::of(&dom, b));
        assert_ne!(TreeKey::of(&dom, a), TreeKey::of(&dom, c));
        assert_eq!(NodeKey::of(&dom, a), NodeKey::of(&dom, c));
    }

    #[test]
    fn whitespace_only_subtrees_are_junk() {
        let mut dom = Dom::with_root("body");
        let blank = heading(&mut dom, "p", "  \n ");
        let full = heading(&mut dom, "p", "content");
        assert!(TreeKey::of(&dom, blank).is_whitespace_only());
        assert!(!TreeKey::of(&dom, full).is_whitespace_only());
    }

    #[test]
    fn fuzzy_keys_accept_similar_text() {
        let mut dom = Dom::with_root("body");
        let a = heading(&mut dom, "p", "make a small change in this paragraph");
        let b = heading(&mut dom, "p", "a small change was made in this paragraph");
        let c = heading(&mut dom, "p", "something else entirely here");
        let d = heading(&mut dom, "h2", "a small change was made in this paragraph");
        assert_eq!(FuzzyTreeKey::of(&dom, a), FuzzyTreeKey::of(&dom, b));
        assert_ne!(FuzzyTreeKey::of(&dom, a), FuzzyTreeKey::of(&dom, c));
        // Different tags never fuzzy-match, however close the text.
        assert_ne!(FuzzyTreeKey::of(&dom, b), FuzzyTreeKey::of(&dom, d));
    }
}

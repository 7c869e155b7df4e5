//! Helpers to keep tests concise.

use crate::changes::split_text_nodes;
use crate::dom::Dom;
use crate::keys::TreeKey;
use crate::markup::sort_del_before_ins;
use crate::parse::parse_document;
use crate::serialize::to_markup;

pub(crate) fn parse_html(input: &str) -> Dom {
    parse_document(input, true).expect("could not parse test input")
}

pub(crate) fn parse_xml(input: &str) -> Dom {
    parse_document(input, false).expect("could not parse test input")
}

/// Parses a fragment the way the diff pipeline sees it, with text nodes
/// split into one node per word.
pub(crate) fn parse_fragment(input: &str) -> Dom {
    let mut dom = parse_html(input);
    split_text_nodes(&mut dom);
    dom
}

pub(crate) fn to_compact(dom: &Dom) -> String {
    to_markup(dom, false)
}

/// Whether two pieces of markup parse to structurally equal documents.
pub(crate) fn html_equal(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let a_dom = parse_html(a);
    let b_dom = parse_html(b);
    TreeKey::of(&a_dom, a_dom.root()) == TreeKey::of(&b_dom, b_dom.root())
}

/// Removes all insertions and unwraps all deletions, recovering the old
/// version of a change document.
pub(crate) fn strip_changes_old(dom: &mut Dom) {
    for node in dom.elements_by_tag("ins") {
        dom.detach(node);
    }
    for node in dom.elements_by_tag("del") {
        dom.unwrap(node);
    }
}

/// Removes all deletions and unwraps all insertions, recovering the new
/// version of a change document.
pub(crate) fn strip_changes_new(dom: &mut Dom) {
    for node in dom.elements_by_tag("ins") {
        dom.unwrap(node);
    }
    for node in dom.elements_by_tag("del") {
        dom.detach(node);
    }
}

/// Swaps `<del>` and `<ins>` markers, turning a diff of (A, B) into a diff
/// of (B, A).
pub(crate) fn reverse_changes(dom: &mut Dom) {
    let deletions = dom.elements_by_tag("del");
    let insertions = dom.elements_by_tag("ins");
    for node in deletions {
        dom.rename_element(node, "ins");
    }
    for node in insertions {
        dom.rename_element(node, "del");
    }
    sort_del_before_ins(dom);
}

//! Turns the runner's inserted/deleted node lists into inline `<ins>`/`<del>`
//! markup, then repairs the result into well-formed HTML.

use rustc_hash::FxHashMap;

use crate::dom::{Dom, NodeId};
use crate::script_runner::OrigPosition;

const TABLE_SECTIONS: [&str; 5] = ["table", "tbody", "thead", "tfoot", "tr"];

/// Adds `<ins>` and `<del>` tags to the document to show changes.
pub(crate) fn add_changes_markup(
    dom: &mut Dom,
    inserted: &[NodeId],
    deleted: &[NodeId],
    origins: &FxHashMap<NodeId, OrigPosition>,
    html: bool,
) {
    // The differ deletes nodes in reverse order, so un-reverse the order
    // while re-attaching them where they used to live.
    for &node in deleted.iter().rev() {
        let origin = origins[&node];
        dom.insert_before(origin.parent, node, origin.next_sibling);
        dom.wrap(node, "del");
    }
    for &node in inserted {
        dom.wrap(node, "ins");
    }

    remove_nesting(dom, "del");
    remove_nesting(dom, "ins");
    sort_del_before_ins(dom);
    merge_adjacent(dom, "del");
    merge_adjacent(dom, "ins");
    remove_empty_changes(dom);
    if html {
        fix_lists(dom);
        fix_tables(dom);
    }
}

/// Unwraps change markers that have an ancestor with the same tag.
fn remove_nesting(dom: &mut Dom, tag: &str) {
    for node in dom.elements_by_tag(tag) {
        let root = dom.root();
        let nested = dom
            .ancestors(node)
            .skip(1)
            .take_while(|&ancestor| ancestor != root)
            .any(|ancestor| dom.is_element_named(ancestor, tag));
        if nested {
            dom.unwrap(node);
        }
    }
}

/// Bubbles every `<del>` left across immediately preceding `<ins>` siblings,
/// so that a deletion always reads before the insertion that replaced it.
pub(crate) fn sort_del_before_ins(dom: &mut Dom) {
    dom.normalize();
    let elements: Vec<NodeId> = dom
        .descendants(dom.root())
        .into_iter()
        .filter(|&node| dom.is_element_named(node, "del"))
        .collect();
    for node in elements {
        while let Some(previous) = dom.prev_sibling(node) {
            if !dom.is_element_named(previous, "ins") {
                break;
            }
            let parent = dom.parent(node).expect("sibling without a parent");
            let index = dom
                .index_in_parent(previous)
                .expect("sibling not under its parent");
            dom.detach(node);
            dom.insert_child(parent, index, node);
        }
    }
}

/// Merges every change marker into its previous sibling when both carry the
/// same tag.
fn merge_adjacent(dom: &mut Dom, tag: &str) {
    for node in dom.elements_by_tag(tag) {
        let Some(previous) = dom.prev_sibling(node) else {
            continue;
        };
        if !dom.is_element_named(previous, tag) {
            continue;
        }
        for child in dom.children(node).to_vec() {
            dom.detach(child);
            dom.append_child(previous, child);
        }
        dom.detach(node);
    }
}

/// Change markers that ended up with no contents say nothing; drop them.
fn remove_empty_changes(dom: &mut Dom) {
    for tag in ["del", "ins"] {
        for node in dom.elements_by_tag(tag) {
            if dom.children(node).is_empty() {
                dom.detach(node);
            }
        }
    }
}

/// Replaces a wrapper element by clones of itself around the inner contents
/// of each of its element children.
pub(crate) fn distribute(dom: &mut Dom, node: NodeId) {
    let tag = dom
        .name(node)
        .expect("can only distribute an element")
        .to_owned();
    let children: Vec<NodeId> = dom
        .children(node)
        .iter()
        .copied()
        .filter(|&child| dom.is_element(child))
        .collect();
    dom.unwrap(node);
    for child in children {
        dom.wrap_inner(child, &tag);
    }
}

/// `<ins>` and `<del>` are not allowed between `<ul>`/`<ol>` and their
/// `<li>` items. Inserted items get the marker pushed inside; deleted items
/// are kept in the list, marked with the `del-li` class, so the numbering of
/// the remaining items is not disturbed.
pub(crate) fn fix_lists(dom: &mut Dom) {
    let mut ins_wrappers = Vec::new();
    let mut del_wrappers = Vec::new();
    for item in dom.elements_by_tag("li") {
        let Some(parent) = dom.parent(item) else {
            continue;
        };
        if dom.is_element_named(parent, "del") && !del_wrappers.contains(&parent) {
            del_wrappers.push(parent);
        } else if dom.is_element_named(parent, "ins") && !ins_wrappers.contains(&parent) {
            ins_wrappers.push(parent);
        }
    }
    // ins > li becomes li > ins.
    for wrapper in ins_wrappers {
        distribute(dom, wrapper);
    }
    // del > li becomes li.del-li > del.
    for wrapper in del_wrappers {
        let children = dom.children(wrapper).to_vec();
        dom.unwrap(wrapper);
        for child in children {
            if dom.is_element_named(child, "li") {
                dom.set_attribute(child, "class", "del-li");
                dom.wrap_inner(child, "del");
            }
        }
    }
}

/// Pushes change markers wrapping rows or cells into the cells, and removes
/// any marker that remains directly inside table structure, where it would
/// be invalid.
pub(crate) fn fix_tables(dom: &mut Dom) {
    let mut wrappers = Vec::new();
    for row in dom.elements_by_tag("tr") {
        if let Some(parent) = dom.parent(row)
            && (dom.is_element_named(parent, "ins") || dom.is_element_named(parent, "del"))
            && !wrappers.contains(&parent)
        {
            wrappers.push(parent);
        }
    }
    for wrapper in wrappers {
        distribute(dom, wrapper);
    }

    let mut wrappers = Vec::new();
    let cells: Vec<NodeId> = dom
        .elements_by_tag("td")
        .into_iter()
        .chain(dom.elements_by_tag("th"))
        .collect();
    for cell in cells {
        if let Some(parent) = dom.parent(cell)
            && (dom.is_element_named(parent, "ins") || dom.is_element_named(parent, "del"))
            && !wrappers.contains(&parent)
        {
            wrappers.push(parent);
        }
    }
    for wrapper in wrappers {
        distribute(dom, wrapper);
    }

    for tag in ["ins", "del"] {
        for node in dom.elements_by_tag(tag) {
            if let Some(parent) = dom.parent(node)
                && dom
                    .name(parent)
                    .is_some_and(|name| TABLE_SECTIONS.contains(&name))
            {
                dom.detach(node);
            }
        }
    }
}

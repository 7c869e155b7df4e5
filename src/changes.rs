//! The diff pipeline on parsed documents: word-splitting, edit script
//! computation, script execution and change markup.

use log::debug;

use crate::differ::Differ;
use crate::dom::Dom;
use crate::error::DiffError;
use crate::markup::add_changes_markup;
use crate::script_runner::EditScriptRunner;
use crate::tokenize::split_text;

/// Splits every text node into one node per token, so that the tree differ
/// aligns words instead of whole text blocks.
pub(crate) fn split_text_nodes(dom: &mut Dom) {
    for node in dom.descendants(dom.root()) {
        let Some(value) = dom.text_value(node).map(str::to_owned) else {
            continue;
        };
        let pieces = split_text(&value);
        if pieces.len() <= 1 {
            continue;
        }
        let parent = dom.parent(node).expect("text node without a parent");
        for piece in &pieces {
            let piece_node = dom.create_text(piece);
            dom.insert_before(parent, piece_node, Some(node));
        }
        dom.detach(node);
    }
}

/// Diffs two parsed documents and returns a single document with the changes
/// marked up inline.
pub(crate) fn dom_diff(mut old_dom: Dom, mut new_dom: Dom, html: bool) -> Result<Dom, DiffError> {
    split_text_nodes(&mut old_dom);
    split_text_nodes(&mut new_dom);

    let edit_script = Differ::new(&old_dom, &new_dom).into_edit_script();

    let outcome = EditScriptRunner::new(old_dom).run(&edit_script)?;
    debug!(
        "edit script applied: {} deleted and {} inserted nodes",
        outcome.deleted.len(),
        outcome.inserted.len(),
    );

    let mut dom = outcome.dom;
    add_changes_markup(&mut dom, &outcome.inserted, &outcome.deleted, &outcome.origins, html);
    Ok(dom)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::differ::Differ;
    use crate::keys::TreeKey;
    use crate::script_runner::EditScriptRunner;
    use crate::test_utils::{parse_html, parse_xml, strip_changes_new, strip_changes_old, to_compact};

    #[test]
    fn text_nodes_split_into_words() {
        let mut dom = parse_html("<h1>red blue</h1>");
        split_text_nodes(&mut dom);
        let h1 = dom.child(dom.root(), 0).unwrap();
        let words: Vec<&str> = dom
            .children(h1)
            .iter()
            .map(|&child| dom.text_value(child).unwrap())
            .collect();
        assert_eq!(words, vec!["red", " ", "blue"]);
    }

    /// Applying the edit script for a pair of documents to the old document
    /// must reproduce the new one.
    #[rstest]
    #[case("<h1>one</h1>", "<h1>one</h1><h2>two</h2>")]
    #[case("<h1>old</h1>", "<h1>new</h1>")]
    #[case("<h1>one</h1><h2>two</h2>", "<h2>two</h2><h3>three</h3>")]
    #[case("<h1>blue</h1>", "<h1>red blue</h1>")]
    #[case("<h1>one</h1>filler<h2>two</h2>", "<h3>three</h3>filler<h4>four</h4>")]
    #[case(
        "<p>delete this</p><p>make a small change in this paragraph</p>",
        "<p>a small change was made in this paragraph</p>"
    )]
    #[case("before<h1>one</h1><h2>two</h2>after", "before<h3>three</h3><h4>four</h4>after")]
    #[case("<div><h1>one</h1></div>", "<div><h1>one</h1><h2>two</h2></div>")]
    fn edit_scripts_are_self_consistent(#[case] old: &str, #[case] new: &str) {
        let mut old_dom = parse_html(old);
        let mut new_dom = parse_html(new);
        split_text_nodes(&mut old_dom);
        split_text_nodes(&mut new_dom);

        let edit_script = Differ::new(&old_dom, &new_dom).into_edit_script();
        let outcome = EditScriptRunner::new(old_dom).run(&edit_script).unwrap();
        assert_eq!(
            TreeKey::of(&outcome.dom, outcome.dom.root()),
            TreeKey::of(&new_dom, new_dom.root()),
        );
    }

    /// Stripping `<ins>` subtrees from the marked-up diff recovers the old
    /// document; stripping `<del>` recovers the new one.
    #[rstest]
    #[case("<h1>one</h1>", "<h1>one</h1><h2>two</h2>")]
    #[case("<h1>old</h1>", "<h1>new</h1>")]
    #[case("<h1>one</h1><h2>two</h2>", "<h2>two</h2><h3>three</h3>")]
    #[case("<h1>test some stuff</h1>", "<h1>test alot of stuff</h1>")]
    #[case("first <h1>middle</h1> last", "first last")]
    fn stripping_changes_recovers_either_side(#[case] old: &str, #[case] new: &str) {
        let old_dom = parse_html(old);
        let new_dom = parse_html(new);
        let changes = dom_diff(old_dom.clone(), new_dom.clone(), true).unwrap();

        let mut recovered_old = changes.clone();
        strip_changes_old(&mut recovered_old);
        recovered_old.normalize();
        assert_eq!(
            TreeKey::of(&recovered_old, recovered_old.root()),
            TreeKey::of(&old_dom, old_dom.root()),
            "stripping insertions did not recover the old document",
        );

        let mut recovered_new = changes;
        strip_changes_new(&mut recovered_new);
        recovered_new.normalize();
        assert_eq!(
            TreeKey::of(&recovered_new, recovered_new.root()),
            TreeKey::of(&new_dom, new_dom.root()),
            "stripping deletions did not recover the new document",
        );
    }

    #[test]
    fn xml_documents_keep_their_root_and_skip_list_repair() {
        let old = "<ul>\
            <li>Monday<ul><li>2pm - 3pm</li></ul></li>\
            <li>Wednesday<ul><li>11am - Noon</li><li>3pm - 5pm</li></ul></li>\
            <li>Thursday<ul><li>11am - Noon</li></ul></li>\
            <li>Friday<ul><li>Noon - 1pm</li></ul></li>\
            </ul>";
        let new = "<ul>\
            <li>Tuesday<ul><li>3pm - 5pm</li></ul></li>\
            <li>Thursday<ul><li>11am - Noon</li></ul></li>\
            </ul>";
        let changes = dom_diff(parse_xml(old), parse_xml(new), false).unwrap();
        assert_eq!(
            to_compact(&changes),
            "<ul>\
            <del>\
            <li>Monday<ul><li>2pm - 3pm</li></ul></li>\
            <li>Wednesday<ul><li>11am - Noon</li><li>3pm - 5pm</li></ul></li>\
            </del>\
            <ins><li>Tuesday<ul><li>3pm - 5pm</li></ul></li></ins>\
            <li>Thursday<ul><li>11am - Noon</li></ul></li>\
            <del><li>Friday<ul><li>Noon - 1pm</li></ul></li></del>\
            </ul>",
        );
    }
}

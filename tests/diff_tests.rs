//! End-to-end tests for the public diff API.

use diffgiraf::{DiffSettings, diff};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn diff_compact(old: &str, new: &str) -> String {
    diff(old, new, &DiffSettings::default()).expect("diff failed")
}

#[rstest]
// no changes
#[case("<h1>one</h1>", "<h1>one</h1>", "<h1>one</h1>")]
// simple insert
#[case(
    "<h1>one</h1>",
    "<h1>one</h1><h2>two</h2>",
    "<h1>one</h1><ins><h2>two</h2></ins>"
)]
// insert before
#[case(
    "<h1>one</h1>",
    "<h2>two</h2><h1>one</h1>",
    "<ins><h2>two</h2></ins><h1>one</h1>"
)]
// insert empty element
#[case("", "<div></div>", "<ins><div/></ins>")]
// simple insert with tail text
#[case("tail", "<h1>one</h1>tail", "<ins><h1>one</h1></ins>tail")]
// simple node replace
#[case(
    "<h1>old</h1>",
    "<h1>new</h1>",
    "<del><h1>old</h1></del><ins><h1>new</h1></ins>"
)]
// delete and insert separately
#[case(
    "<h1>one</h1><h2>two</h2>",
    "<h2>two</h2><h3>three</h3>",
    "<del><h1>one</h1></del><h2>two</h2><ins><h3>three</h3></ins>"
)]
// multiple node insert
#[case(
    "<h3>three</h3>",
    "<h1>one</h1><h2>two</h2><h3>three</h3>",
    "<ins><h1>one</h1><h2>two</h2></ins><h3>three</h3>"
)]
// multiple node replace
#[case(
    "<h1>one</h1><h2>two</h2>",
    "<h3>three</h3><h4>four</h4>",
    "<del><h1>one</h1><h2>two</h2></del><ins><h3>three</h3><h4>four</h4></ins>"
)]
// multiple node replace with filler in between
#[case(
    "<h1>one</h1>filler<h2>two</h2>",
    "<h3>three</h3>filler<h4>four</h4>",
    "<del><h1>one</h1></del><ins><h3>three</h3></ins>filler<del><h2>two</h2></del><ins><h4>four</h4></ins>"
)]
// add before, same text content
#[case(
    "<h1>test</h1>",
    "<h2>test</h2><h1>test</h1>",
    "<ins><h2>test</h2></ins><h1>test</h1>"
)]
// deep level change
#[case(
    "<div><h1>one</h1></div>",
    "<div><h1>one</h1><h2>two</h2></div>",
    "<div><h1>one</h1><ins><h2>two</h2></ins></div>"
)]
// simple text insert between nodes
#[case(
    "<h1>one</h1><h2>two</h2>",
    "<h1>one</h1>test<h2>two</h2>",
    "<h1>one</h1><ins>test</ins><h2>two</h2>"
)]
// add tail text
#[case("<h1>test</h1>", "<h1>test</h1> tail", "<h1>test</h1><ins> tail</ins>")]
// change tail text
#[case(
    "<h1>test</h1>apple",
    "<h1>test</h1>banana",
    "<h1>test</h1><del>apple</del><ins>banana</ins>"
)]
// insert text before a text section
#[case("<h1>blue</h1>", "<h1>red blue</h1>", "<h1><ins>red </ins>blue</h1>")]
// insert text inside a text section
#[case(
    "<h1>red blue</h1>",
    "<h1>red green blue</h1>",
    "<h1>red <ins>green </ins>blue</h1>"
)]
// change a text section
#[case(
    "<h1>test some stuff</h1>",
    "<h1>test alot of stuff</h1>",
    "<h1>test <del>some</del><ins>alot of</ins> stuff</h1>"
)]
// text normalization around a removed element
#[case("first <h1>middle</h1> last", "first last", "first <del><h1>middle</h1> </del>last")]
// a near text match overrides replacement
#[case(
    "<p>delete this</p><p>make a small change in this paragraph</p>",
    "<p>a small change was made in this paragraph</p>",
    "<del><p>delete this</p></del><p><del>make </del>a small change <ins>was made </ins>in this paragraph</p>"
)]
// no match when similarity is very low
#[case(
    "<p>The quick brown fox jumps over the lazy dog</p>",
    "<p>This sentence has nothing to do with the previous one</p>",
    "<del><p>The quick brown fox jumps over the lazy dog</p></del><ins><p>This sentence has nothing to do with the previous one</p></ins>"
)]
// ignore comments
#[case("", "<div/><!--comment one--><!--comment two-->", "<ins><div/></ins>")]
// ignore style tags
#[case("", "<style type=\"text/css\"></style>", "")]
// add an image
#[case("", "<img src=\"image.gif\">", "<ins><img src=\"image.gif\"/></ins>")]
// change an image; attribute changes alone are not surfaced, but the
// differing attributes keep the two nodes from matching
#[case(
    "<img src=\"old.gif\">",
    "<img src=\"new.gif\">",
    "<del><img src=\"old.gif\"/></del><ins><img src=\"new.gif\"/></ins>"
)]
// unicode text
#[case(
    "<h1>uber</h1>",
    "<h1>\u{fc}ber</h1>",
    "<del><h1>uber</h1></del><ins><h1>\u{fc}ber</h1></ins>"
)]
// escaped characters in text
#[case("x", "&lt;", "<del>x</del><ins>&lt;</ins>")]
#[case("x", "&amp;", "<del>x</del><ins>&amp;</ins>")]
fn html_changes(#[case] old: &str, #[case] new: &str, #[case] expected: &str) {
    assert_eq!(diff_compact(old, new), expected);
}

#[rstest]
// a list item is inserted inside the nearest li, so numbering survives
#[case(
    "<ol><li>one</li></ol>",
    "<ol><li>one</li><li>two</li></ol>",
    "<ol><li>one</li><li><ins>two</ins></li></ol>"
)]
// a deleted list item stays in the list, marked with the del-li class
#[case(
    "<ol><li>one</li><li>two</li></ol>",
    "<ol><li>one</li></ol>",
    "<ol><li>one</li><li class=\"del-li\"><del>two</del></li></ol>"
)]
fn list_repair(#[case] old: &str, #[case] new: &str, #[case] expected: &str) {
    assert_eq!(diff_compact(old, new), expected);
}

#[test]
fn table_repair() {
    let changes = diff_compact(
        "<table><tr><td>A</td></tr></table>",
        "<table><tr><td>A</td></tr><tr><td>B</td></tr></table>",
    );
    assert_eq!(
        changes,
        "<table><tbody><tr><td>A</td></tr><tr><td><ins>B</ins></td></tr></tbody></table>",
    );
}

/// The invariants every change document must satisfy: no nested markers of
/// the same kind, no markers directly inside table structure, and no marker
/// directly wrapping an `<li>`.
#[rstest]
#[case("<h1>one</h1>", "<h1>one</h1><h2>two</h2>")]
#[case("<ol><li>one</li><li>two</li></ol>", "<ol><li>three</li></ol>")]
#[case(
    "<table><tr><td>A</td></tr></table>",
    "<table><tr><td>A</td></tr><tr><td>B</td></tr></table>"
)]
#[case("<p>one two three</p>", "<p>one 2 three four</p>")]
fn forbidden_nesting(#[case] old: &str, #[case] new: &str) {
    let changes = diff_compact(old, new);
    for marker in ["ins", "del"] {
        let open = format!("<{marker}>");
        let mut depth = 0usize;
        let mut rest = changes.as_str();
        while let Some(position) = rest.find('<') {
            rest = &rest[position..];
            if rest.starts_with(&open) {
                depth += 1;
                assert!(depth <= 1, "nested <{marker}> in {changes}");
            } else if rest.starts_with(&format!("</{marker}>")) {
                depth = depth.saturating_sub(1);
            }
            rest = &rest[1..];
        }
    }
    for context in ["<table>", "<tbody>", "<thead>", "<tfoot>", "<tr>"] {
        for marker in ["<ins>", "<del>"] {
            let forbidden = format!("{context}{marker}");
            assert!(
                !changes.contains(&forbidden),
                "{forbidden} found in {changes}",
            );
        }
    }
    for marker in ["ins", "del"] {
        assert!(
            !changes.contains(&format!("<{marker}><li>")),
            "<{marker}> directly wraps an <li> in {changes}",
        );
    }
}

#[test]
fn cutoff_returns_the_sentinel_message() {
    let settings = DiffSettings {
        cutoff: 0.2,
        ..DiffSettings::default()
    };
    assert_eq!(
        diff("<h1>totally</h1>", "<h2>different</h2>", &settings).unwrap(),
        "<h2>The differences from the previous version are too large to show concisely.</h2>",
    );
}

#[test]
fn word_level_text_diff() {
    assert_eq!(
        diffgiraf::text_changes(
            "The quick brown fox jumps over the lazy dog.",
            "The very quick brown foxes jump over the dog.",
        ),
        "The<ins> very</ins> quick brown <del>fox jumps</del><ins>foxes jump</ins> \
         over the<del> lazy</del> dog.",
    );
}

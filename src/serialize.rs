//! Serialization of a [`Dom`] back into markup, compact or indented.

use crate::dom::{Dom, NodeData, NodeId};

/// Serializes a document. When the root element is the synthetic `<body>`,
/// only its contents are emitted.
///
/// Pretty output puts every node on its own line, indented two spaces per
/// depth level; compact output is a single line.
pub fn to_markup(dom: &Dom, pretty: bool) -> String {
    let root = dom.root();
    let top_level: Vec<NodeId> = if dom.is_element_named(root, "body") {
        dom.children(root).to_vec()
    } else {
        vec![root]
    };

    let mut out = String::new();
    for node in top_level {
        if pretty {
            write_pretty(dom, node, 0, &mut out);
        } else {
            write_compact(dom, node, &mut out);
        }
    }
    if pretty {
        out.truncate(out.trim_end_matches('\n').len());
    }
    out
}

fn write_compact(dom: &Dom, node: NodeId, out: &mut String) {
    match dom.data(node) {
        NodeData::Text(value) => out.push_str(&escape_text(value)),
        NodeData::Element { name, attrs } => {
            out.push('<');
            out.push_str(name);
            for (attr_name, attr_value) in attrs {
                out.push(' ');
                out.push_str(attr_name);
                out.push_str("=\"");
                out.push_str(&escape_attribute(attr_value));
                out.push('"');
            }
            if dom.children(node).is_empty() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for &child in dom.children(node) {
                write_compact(dom, child, out);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
    }
}

fn write_pretty(dom: &Dom, node: NodeId, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match dom.data(node) {
        NodeData::Text(value) => {
            out.push_str(&indent);
            out.push_str(&escape_text(value));
            out.push('\n');
        }
        NodeData::Element { name, attrs } => {
            out.push_str(&indent);
            out.push('<');
            out.push_str(name);
            for (attr_name, attr_value) in attrs {
                out.push(' ');
                out.push_str(attr_name);
                out.push_str("=\"");
                out.push_str(&escape_attribute(attr_value));
                out.push('"');
            }
            if dom.children(node).is_empty() {
                out.push_str("/>\n");
                return;
            }
            out.push_str(">\n");
            for &child in dom.children(node) {
                write_pretty(dom, child, depth + 1, out);
            }
            out.push_str(&indent);
            out.push_str("</");
            out.push_str(name);
            out.push_str(">\n");
        }
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_utils::parse_html;

    #[test]
    fn compact_output_is_canonical() {
        let dom = parse_html("<h1>one</h1><div/><img src=\"a&b.gif\">");
        assert_eq!(
            to_markup(&dom, false),
            "<h1>one</h1><div/><img src=\"a&amp;b.gif\"/>",
        );
    }

    #[test]
    fn text_is_escaped() {
        let dom = parse_html("<p>a &lt; b &amp; c</p>");
        assert_eq!(to_markup(&dom, false), "<p>a &lt; b &amp; c</p>");
    }

    #[test]
    fn empty_body_serializes_to_nothing() {
        let dom = parse_html("");
        assert_eq!(to_markup(&dom, false), "");
    }

    #[test]
    fn pretty_output_indents_two_spaces_per_level() {
        let dom = parse_html("<h1>one</h1><ins><h2>two</h2></ins>");
        assert_eq!(
            to_markup(&dom, true),
            "<h1>\n  one\n</h1>\n<ins>\n  <h2>\n    two\n  </h2>\n</ins>",
        );
    }
}

//! Lenient HTML (and strict XML) parsing into a [`Dom`], with the textual
//! preprocessing and tree cleanup the differ relies on.
//!
//! Parsing is done with tree-sitter grammars, walked into an owned tree the
//! same way the syntax trees of structured merge tools are built from a
//! tree-sitter cursor. The HTML grammar is error-tolerant; in XML mode a
//! document that stays malformed even after wrapping it in a synthetic body
//! is a parse error.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tree_sitter::{Node as TsNode, Parser};

use crate::dom::{Dom, NodeId};
use crate::error::DiffError;

/// Elements that must not contain text directly; whitespace inside them is
/// parser noise and is removed outright.
const NON_TEXT_TAGS: [&str; 16] = [
    "html", "head", "table", "thead", "tbody", "tfoot", "tr", "colgroup", "col", "ul", "ol", "dl",
    "select", "img", "br", "hr",
];

/// Parses a document into a normalized tree rooted at a single element
/// (always `<body>` in HTML mode).
pub fn parse_document(input: &str, html: bool) -> Result<Dom, DiffError> {
    let input = preprocess(input);
    let mut dom = if html {
        parse_html(&input)?
    } else {
        parse_xml(&input)?
    };
    cleanup(&mut dom, html);
    Ok(dom)
}

// Textual preprocessing.

static COMMENT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("invalid comment pattern"));

/// Strips comments before parsing, so that nothing inside them can confuse
/// the rest of the preprocessing.
fn remove_comments(input: &str) -> String {
    COMMENT_PATTERN.replace_all(input, "").into_owned()
}

/// Removes newlines. A newline between tags or next to other whitespace is
/// dropped; a newline separating words becomes a space.
fn remove_newlines(input: &str) -> String {
    let input = input.replace("\r\n", "\n").replace('\r', "\n");
    let mut result = String::with_capacity(input.len());
    for (offset, character) in input.char_indices() {
        if character != '\n' {
            result.push(character);
            continue;
        }
        let before = input[..offset].chars().next_back();
        let after = input[offset + 1..].chars().next();
        let separates_tags = matches!(before, Some(c) if c == '>' || c.is_whitespace())
            && matches!(after, Some(c) if c == '<' || c.is_whitespace());
        if !separates_tags {
            result.push(' ');
        }
    }
    result.trim().to_owned()
}

/// Turns non-breaking spaces and their references into normal spaces.
fn normalize_entities(input: &str) -> String {
    input
        .replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&#xA0;", " ")
        .replace('\u{a0}', " ")
}

fn preprocess(input: &str) -> String {
    let input = remove_comments(input);
    let input = remove_newlines(&input);
    let input = normalize_entities(&input);
    input.trim().to_owned()
}

// Character references.

static ENTITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z][a-zA-Z0-9]*);").expect("invalid pattern")
});

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "deg" => '\u{b0}',
        "middot" => '\u{b7}',
        "laquo" => '\u{ab}',
        "raquo" => '\u{bb}',
        "times" => '\u{d7}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "bull" => '\u{2022}',
        "hellip" => '\u{2026}',
        "euro" => '\u{20ac}',
        "trade" => '\u{2122}',
        _ => return None,
    };
    Some(c)
}

/// Decodes numeric character references and the common named ones. Unknown
/// references are left as they are (and get re-escaped on output).
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_owned();
    }
    ENTITY_PATTERN
        .replace_all(text, |captures: &Captures| {
            let body = &captures[1];
            let decoded = if let Some(digits) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(digits, 16).ok().and_then(char::from_u32)
            } else if let Some(digits) = body.strip_prefix('#') {
                digits.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                named_entity(body)
            };
            match decoded {
                Some(c) => c.to_string(),
                None => captures[0].to_owned(),
            }
        })
        .into_owned()
}

// HTML parsing.

fn parse_html(input: &str) -> Result<Dom, DiffError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_html::LANGUAGE.into())
        .expect("error loading the HTML grammar");
    let tree = parser
        .parse(input, None)
        .ok_or_else(|| DiffError::Parse("the HTML parser produced no tree".to_owned()))?;
    let mut dom = Dom::with_root("body");
    let root = dom.root();
    convert_html_content(&mut dom, root, tree.root_node(), input);
    Ok(dom)
}

/// Converts the contents of a container node.
///
/// The grammar treats whitespace as an extra and its text tokens exclude
/// surrounding whitespace, so significant whitespace has to be restored from
/// the gaps between the spans of consecutive children.
fn convert_html_content(dom: &mut Dom, parent: NodeId, node: TsNode, source: &str) {
    // Inside an element the content starts after the start tag; elsewhere it
    // starts with the node itself.
    let mut position = match node.kind() {
        "element" | "script_element" | "style_element" => None,
        _ => Some(node.start_byte()),
    };
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "start_tag" | "self_closing_tag" => position = Some(child.end_byte()),
            "end_tag" | "erroneous_end_tag" => {
                if let Some(from) = position {
                    fill_whitespace_gap(dom, parent, source, from, child.start_byte());
                }
                position = Some(child.end_byte());
            }
            _ => {
                if let Some(from) = position {
                    fill_whitespace_gap(dom, parent, source, from, child.start_byte());
                }
                convert_html_node(dom, parent, child, source);
                position = Some(child.end_byte());
            }
        }
    }
    if let Some(from) = position {
        fill_whitespace_gap(dom, parent, source, from, node.end_byte());
    }
}

/// Re-creates a text node for the whitespace the grammar skipped between two
/// sibling nodes. Non-whitespace gaps are unparseable input and are dropped.
fn fill_whitespace_gap(dom: &mut Dom, parent: NodeId, source: &str, from: usize, to: usize) {
    if from >= to {
        return;
    }
    let gap = &source[from..to];
    if !gap.trim().is_empty() {
        return;
    }
    let text = dom.create_text(gap);
    dom.append_child(parent, text);
}

fn convert_html_node(dom: &mut Dom, parent: NodeId, node: TsNode, source: &str) {
    match node.kind() {
        "element" | "script_element" | "style_element" => {
            let (name, attrs) = html_tag(node, source);
            if name.is_empty() {
                // No recognizable start tag; keep whatever parsed inside.
                convert_html_content(dom, parent, node, source);
                return;
            }
            let element = dom.create_element(&name, attrs);
            dom.append_child(parent, element);
            convert_html_content(dom, element, node, source);
        }
        "text" | "entity" | "raw_text" => {
            let text = dom.create_text(&decode_entities(&source[node.byte_range()]));
            dom.append_child(parent, text);
        }
        "comment" | "doctype" => {}
        // Error recovery: treat the error node as transparent and keep its
        // parseable contents.
        _ => convert_html_content(dom, parent, node, source),
    }
}

fn html_tag(node: TsNode, source: &str) -> (String, BTreeMap<String, String>) {
    let mut name = String::new();
    let mut attrs = BTreeMap::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if !matches!(child.kind(), "start_tag" | "self_closing_tag") {
            continue;
        }
        let mut tag_cursor = child.walk();
        for part in child.named_children(&mut tag_cursor) {
            match part.kind() {
                "tag_name" => name = source[part.byte_range()].to_lowercase(),
                "attribute" => {
                    let (attr_name, attr_value) = html_attribute(part, source);
                    attrs.insert(attr_name, attr_value);
                }
                _ => {}
            }
        }
        break;
    }
    (name, attrs)
}

fn html_attribute(node: TsNode, source: &str) -> (String, String) {
    let mut name = String::new();
    let mut value = String::new();
    let mut cursor = node.walk();
    for part in node.named_children(&mut cursor) {
        match part.kind() {
            "attribute_name" => name = source[part.byte_range()].to_lowercase(),
            "attribute_value" => value = decode_entities(&source[part.byte_range()]),
            "quoted_attribute_value" => {
                let mut inner_cursor = part.walk();
                for inner in part.named_children(&mut inner_cursor) {
                    if inner.kind() == "attribute_value" {
                        value = decode_entities(&source[inner.byte_range()]);
                    }
                }
            }
            _ => {}
        }
    }
    (name, value)
}

// XML parsing.

fn parse_xml(input: &str) -> Result<Dom, DiffError> {
    match try_parse_xml(input) {
        Ok(dom) => Ok(dom),
        // Fragments and bare text are not documents; retry with a synthetic
        // root element.
        Err(_) => try_parse_xml(&format!("<body>{input}</body>")),
    }
}

fn try_parse_xml(input: &str) -> Result<Dom, DiffError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_xml::LANGUAGE_XML.into())
        .expect("error loading the XML grammar");
    let tree = parser
        .parse(input, None)
        .ok_or_else(|| DiffError::Parse("the XML parser produced no tree".to_owned()))?;
    if tree.root_node().has_error() {
        return Err(DiffError::Parse("the input is not well-formed XML".to_owned()));
    }
    let document = tree.root_node();
    let mut cursor = document.walk();
    let root_element = document
        .named_children(&mut cursor)
        .find(|child| child.kind() == "element")
        .ok_or_else(|| DiffError::Parse("the document has no root element".to_owned()))?;

    let (name, attrs) = xml_tag(root_element, input);
    let mut dom = Dom::with_root(&name);
    let root = dom.root();
    for (attr_name, attr_value) in &attrs {
        dom.set_attribute(root, attr_name, attr_value);
    }
    convert_xml_children(&mut dom, root, root_element, input);
    Ok(dom)
}

fn convert_xml_children(dom: &mut Dom, parent: NodeId, node: TsNode, source: &str) {
    // Whitespace the grammar may have skipped between children is restored
    // from the gaps between their spans, as in the HTML conversion.
    let mut position = match node.kind() {
        "document" => None,
        _ => Some(node.start_byte()),
    };
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if let Some(from) = position {
            fill_whitespace_gap(dom, parent, source, from, child.start_byte());
        }
        match child.kind() {
            "element" => {
                let (name, attrs) = xml_tag(child, source);
                let element = dom.create_element(&name, attrs);
                dom.append_child(parent, element);
                convert_xml_children(dom, element, child, source);
            }
            "content" => convert_xml_children(dom, parent, child, source),
            "CharData" => {
                let text = dom.create_text(&source[child.byte_range()]);
                dom.append_child(parent, text);
            }
            "EntityRef" | "CharRef" => {
                let text = dom.create_text(&decode_entities(&source[child.byte_range()]));
                dom.append_child(parent, text);
            }
            "CDSect" => {
                let raw = &source[child.byte_range()];
                let data = raw
                    .strip_prefix("<![CDATA[")
                    .and_then(|rest| rest.strip_suffix("]]>"))
                    .unwrap_or(raw);
                let text = dom.create_text(data);
                dom.append_child(parent, text);
            }
            _ => {}
        }
        position = Some(child.end_byte());
    }
    if node.kind() == "content"
        && let Some(from) = position
    {
        fill_whitespace_gap(dom, parent, source, from, node.end_byte());
    }
}

fn xml_tag(node: TsNode, source: &str) -> (String, BTreeMap<String, String>) {
    let mut name = String::new();
    let mut attrs = BTreeMap::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if !matches!(child.kind(), "STag" | "EmptyElemTag") {
            continue;
        }
        let mut tag_cursor = child.walk();
        for part in child.named_children(&mut tag_cursor) {
            match part.kind() {
                "Name" if name.is_empty() => name = source[part.byte_range()].to_owned(),
                "Attribute" => {
                    let mut attr_name = String::new();
                    let mut attr_value = String::new();
                    let mut attr_cursor = part.walk();
                    for attr_part in part.named_children(&mut attr_cursor) {
                        match attr_part.kind() {
                            "Name" => attr_name = source[attr_part.byte_range()].to_owned(),
                            "AttValue" => {
                                let raw = &source[attr_part.byte_range()];
                                // The value span includes the quotes.
                                let trimmed = raw
                                    .strip_prefix(['"', '\''])
                                    .and_then(|rest| rest.strip_suffix(['"', '\'']))
                                    .unwrap_or(raw);
                                attr_value = decode_entities(trimmed);
                            }
                            _ => {}
                        }
                    }
                    attrs.insert(attr_name, attr_value);
                }
                _ => {}
            }
        }
        break;
    }
    (name, attrs)
}

// Tree cleanup.

fn cleanup(dom: &mut Dom, html: bool) {
    if html {
        remove_insignificant_text_nodes(dom);
    }

    // Irrelevant content: styling containers carry no text of their own.
    for node in dom.descendants(dom.root()) {
        if dom.parent(node).is_none() {
            continue;
        }
        if dom.is_element_named(node, "style") {
            dom.detach(node);
        } else if dom.is_element_named(node, "font") || dom.is_element_named(node, "span") {
            dom.unwrap(node);
        }
    }

    // Make sure the body element is the top of the document.
    for node in dom.descendants(dom.root()) {
        if dom.parent(node).is_some() && dom.is_element_named(node, "head") {
            dom.detach(node);
        }
    }
    for node in dom.descendants(dom.root()) {
        if dom.parent(node).is_some() && dom.is_element_named(node, "html") {
            dom.unwrap(node);
        }
    }
    if html {
        for node in dom.descendants(dom.root()) {
            if dom.parent(node).is_some() && dom.is_element_named(node, "body") {
                dom.unwrap(node);
            }
        }
        insert_table_sections(dom);
    }

    dom.normalize();
}

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("invalid pattern"));

/// For elements that should not have text inside them, removes whitespace.
/// For elements that may have text, collapses whitespace runs to a single
/// space.
fn remove_insignificant_text_nodes(dom: &mut Dom) {
    for node in dom.descendants(dom.root()) {
        let Some(parent) = dom.parent(node) else {
            continue;
        };
        let Some(value) = dom.text_value(node).map(str::to_owned) else {
            continue;
        };
        let structural = dom.name(parent).is_some_and(|name| NON_TEXT_TAGS.contains(&name));
        if structural && value.chars().all(char::is_whitespace) {
            dom.detach(node);
        } else if !structural {
            dom.set_text_value(node, &WHITESPACE_RUN.replace_all(&value, " "));
        }
    }
}

/// Wraps runs of `<tr>` directly under `<table>` in a `<tbody>`, the way a
/// full HTML5 tree builder would.
fn insert_table_sections(dom: &mut Dom) {
    for table in dom.elements_by_tag("table") {
        let mut index = 0;
        while index < dom.children(table).len() {
            let child = dom.children(table)[index];
            if dom.is_element_named(child, "tr") {
                let section = dom.create_element("tbody", BTreeMap::new());
                dom.detach(child);
                dom.insert_child(table, index, section);
                dom.append_child(section, child);
                while let Some(&next) = dom.children(table).get(index + 1) {
                    if !dom.is_element_named(next, "tr") {
                        break;
                    }
                    dom.detach(next);
                    dom.append_child(section, next);
                }
            }
            index += 1;
        }
    }
}

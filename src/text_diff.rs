use crate::seq_match::OpTag;
use crate::word_match::WordMatcher;

/// Below this adjusted text ratio the whole block is treated as different
/// instead of producing a noisy word-by-word diff.
const TEXT_CHANGES_CUTOFF: f64 = 0.3;

/// Produces a word-level diff of two strings as inline `<del>`/`<ins>`
/// markup, respecting word boundaries, whitespace and punctuation.
///
/// The output is raw string concatenation; the input must already be safe to
/// embed in markup.
pub fn text_changes(old_text: &str, new_text: &str) -> String {
    let mut matcher = WordMatcher::new(old_text, new_text);

    if matcher.adjusted_text_ratio() < TEXT_CHANGES_CUTOFF {
        return format!("<del>{old_text}</del><ins>{new_text}</ins>");
    }

    let mut changes = String::new();
    for op in matcher.opcodes() {
        let old_section = matcher.a_words()[op.i1..op.i2].concat();
        let new_section = matcher.b_words()[op.j1..op.j2].concat();
        match op.tag {
            OpTag::Equal => changes.push_str(&old_section),
            OpTag::Delete => push_wrapped(&mut changes, "del", &old_section),
            OpTag::Insert => push_wrapped(&mut changes, "ins", &new_section),
            OpTag::Replace => {
                push_wrapped(&mut changes, "del", &old_section);
                push_wrapped(&mut changes, "ins", &new_section);
            }
        }
    }
    changes
}

fn push_wrapped(out: &mut String, tag: &str, text: &str) {
    out.push_str(&format!("<{tag}>{text}</{tag}>"));
}

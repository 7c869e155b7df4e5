use crate::seq_match::{MatchingBlock, Opcode, SequenceMatcher, calculate_ratio};
use crate::tokenize::split_text;

/// Words that are skipped when choosing anchor matches. They still count in
/// the output, just not as evidence of similarity.
const STOP_WORDS: [&str; 15] = [
    "a", "an", "and", "as", "at", "by", "for", "if", "in", "it", "of", "or", "so", "the", "to",
];

fn is_junk_word(word: &str) -> bool {
    (!word.is_empty() && word.chars().all(char::is_whitespace))
        || STOP_WORDS.contains(&word.to_lowercase().as_str())
}

/// A sequence matcher that treats a string as a sequence of words, so that
/// diffs never split a word. Whitespace and stop words are junk.
pub struct WordMatcher {
    matcher: SequenceMatcher<String>,
}

impl WordMatcher {
    pub fn new(a: &str, b: &str) -> Self {
        let junk = |word: &String| is_junk_word(word);
        Self {
            matcher: SequenceMatcher::new(Some(&junk), split_text(a), split_text(b)),
        }
    }

    pub fn a_words(&self) -> &[String] {
        self.matcher.a()
    }

    pub fn b_words(&self) -> &[String] {
        self.matcher.b()
    }

    pub fn matching_blocks(&mut self) -> &[MatchingBlock] {
        self.matcher.matching_blocks()
    }

    pub fn opcodes(&mut self) -> Vec<Opcode> {
        self.matcher.opcodes()
    }

    /// Word-level similarity where each word weighs its character length.
    /// More intuitive than the plain item ratio: a one-letter typo in a long
    /// word barely moves it.
    pub fn text_ratio(&mut self) -> f64 {
        let denominator = text_length(self.matcher.a()) + text_length(self.matcher.b());
        calculate_ratio(self.match_length(), denominator)
    }

    /// The text ratio computed against the shorter of the two sequences, so
    /// that a pure length mismatch is not punished.
    pub fn adjusted_text_ratio(&mut self) -> f64 {
        let denominator = 2 * text_length(self.matcher.a()).min(text_length(self.matcher.b()));
        calculate_ratio(self.match_length(), denominator)
    }

    /// The total length of all words that match between the two sequences.
    fn match_length(&mut self) -> usize {
        let blocks = self.matcher.matching_blocks().to_vec();
        blocks
            .iter()
            .map(|&(a, _, size)| text_length(&self.matcher.a()[a..a + size]))
            .sum()
    }
}

/// The length of the non-junk text in the sequence; junk words weigh zero.
fn text_length(words: &[String]) -> usize {
    words
        .iter()
        .map(|word| {
            if is_junk_word(word) {
                0
            } else {
                word.chars().count()
            }
        })
        .sum()
}

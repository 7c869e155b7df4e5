use std::sync::LazyLock;

use regex::Regex;

/// Contractions and other words that must be kept as a single token.
/// Matched case-insensitively.
const GROUPED_WORDS: [&str; 47] = [
    "i'm", "i'll", "i'd", "i've", "you're", "you'll", "you'd", "you've", "he's", "he'll", "he'd",
    "she's", "she'll", "she'd", "it's", "it'll", "it'd", "we're", "we'll", "we'd", "we've",
    "they're", "they'll", "they'd", "they've", "there's", "there'll", "there'd", "that's",
    "that'll", "that'd", "ain't", "aren't", "can't", "couldn't", "didn't", "doesn't", "don't",
    "hadn't", "hasn't", "isn't", "mustn't", "needn't", "shouldn't", "wasn't", "weren't", "won't",
];

/// The split passes, in priority order. Earlier patterns claim their pieces
/// first and later passes never split them again.
static WORD_SPLIT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let contractions = GROUPED_WORDS
        .iter()
        .map(|word| regex::escape(word))
        .collect::<Vec<_>>()
        .join("|");
    [
        // HTML character references. They never contain whitespace, so a bare
        // ampersand in running text stays a punctuation token.
        r"(?i)&[^\s;]*;".to_owned(),
        format!("(?i){contractions}"),
        // Simplified phone number pattern: any dash-separated list of digits.
        r"\d[\d-]+\d".to_owned(),
        // Slash-separated digits, as in dates.
        r"\d[\d/]+\d".to_owned(),
        r"\d+".to_owned(),
        // A single ASCII punctuation character.
        r"[!-/:-@\x5B-\x60\x7B-\x7E]".to_owned(),
        // A word.
        r"\p{L}+".to_owned(),
        r"\s+".to_owned(),
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("invalid tokenizer pattern"))
    .collect()
});

struct Piece {
    text: String,
    claimed: bool,
}

/// Splits text into words, numbers, punctuation, character references and
/// whitespace runs. The concatenation of the returned tokens is always the
/// input string.
pub fn split_text(text: &str) -> Vec<String> {
    multi_split(text, &WORD_SPLIT_PATTERNS)
}

/// Splits the text by the given regexes, in priority order. Once a piece has
/// been matched by a pattern it is claimed and later patterns leave it alone.
fn multi_split(text: &str, regexes: &[Regex]) -> Vec<String> {
    let mut pieces = vec![Piece {
        text: text.to_owned(),
        claimed: false,
    }];
    for regex in regexes {
        let mut next_pieces = Vec::with_capacity(pieces.len());
        for piece in pieces {
            if piece.claimed {
                next_pieces.push(piece);
                continue;
            }
            let mut last = 0;
            for found in regex.find_iter(&piece.text) {
                if found.start() > last {
                    next_pieces.push(Piece {
                        text: piece.text[last..found.start()].to_owned(),
                        claimed: false,
                    });
                }
                next_pieces.push(Piece {
                    text: found.as_str().to_owned(),
                    claimed: true,
                });
                last = found.end();
            }
            if last < piece.text.len() {
                next_pieces.push(Piece {
                    text: piece.text[last..].to_owned(),
                    claimed: false,
                });
            }
        }
        pieces = next_pieces;
    }
    pieces.into_iter().map(|piece| piece.text).collect()
}

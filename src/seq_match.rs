//! A generic longest-common-subsequence matcher over hashable items.
//!
//! This is a faithful port of the classic difflib-style sequence matcher,
//! including its junk handling and the popularity heuristic for long
//! sequences. The tree differ depends on its exact matching-block semantics,
//! so any deviation here shows up as drift in diff output.

use std::hash::Hash;

use rustc_hash::{FxHashMap, FxHashSet};

/// An aligned run between the two sequences: `(a_start, b_start, size)`.
pub type MatchingBlock = (usize, usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpTag {
    Equal,
    Replace,
    Delete,
    Insert,
}

/// A tagged pair of ranges, `a[i1..i2]` against `b[j1..j2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub tag: OpTag,
    pub i1: usize,
    pub i2: usize,
    pub j1: usize,
    pub j2: usize,
}

pub struct SequenceMatcher<T: Clone + Eq + Hash> {
    a: Vec<T>,
    b: Vec<T>,
    /// Indices in `b` of every non-junk, non-popular item.
    b2j: FxHashMap<T, Vec<usize>>,
    bjunk: FxHashSet<T>,
    matching_blocks: Option<Vec<MatchingBlock>>,
}

impl<T: Clone + Eq + Hash> SequenceMatcher<T> {
    pub fn new(is_junk: Option<&dyn Fn(&T) -> bool>, a: Vec<T>, b: Vec<T>) -> Self {
        let mut b2j: FxHashMap<T, Vec<usize>> = FxHashMap::default();
        for (index, item) in b.iter().enumerate() {
            b2j.entry(item.clone()).or_default().push(index);
        }

        let mut bjunk = FxHashSet::default();
        if let Some(is_junk) = is_junk {
            for item in b2j.keys() {
                if is_junk(item) {
                    bjunk.insert(item.clone());
                }
            }
            for item in &bjunk {
                b2j.remove(item);
            }
        }

        // Popular items of long sequences are ignored as anchors, just like
        // junk. This keeps the matcher fast on repetitive inputs.
        let n = b.len();
        if n >= 200 {
            let threshold = n / 100 + 1;
            let popular: Vec<T> = b2j
                .iter()
                .filter(|(_, indices)| indices.len() > threshold)
                .map(|(item, _)| item.clone())
                .collect();
            for item in &popular {
                b2j.remove(item);
            }
        }

        Self {
            a,
            b,
            b2j,
            bjunk,
            matching_blocks: None,
        }
    }

    pub fn a(&self) -> &[T] {
        &self.a
    }

    pub fn b(&self) -> &[T] {
        &self.b
    }

    fn is_b_junk(&self, item: &T) -> bool {
        self.bjunk.contains(item)
    }

    /// Finds the longest matching block in `a[alo..ahi]` and `b[blo..bhi]`.
    ///
    /// Junk items never start or grow a match on their own, but a match is
    /// extended over junk when both sides agree, so interior whitespace does
    /// not fragment the result.
    fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> MatchingBlock {
        let mut besti = alo;
        let mut bestj = blo;
        let mut bestsize = 0;

        let mut j2len: FxHashMap<usize, usize> = FxHashMap::default();
        for i in alo..ahi {
            let mut newj2len: FxHashMap<usize, usize> = FxHashMap::default();
            if let Some(indices) = self.b2j.get(&self.a[i]) {
                for &j in indices {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = if j == 0 {
                        1
                    } else {
                        j2len.get(&(j - 1)).copied().unwrap_or(0) + 1
                    };
                    newj2len.insert(j, k);
                    if k > bestsize {
                        besti = i + 1 - k;
                        bestj = j + 1 - k;
                        bestsize = k;
                    }
                }
            }
            j2len = newj2len;
        }

        while besti > alo
            && bestj > blo
            && !self.is_b_junk(&self.b[bestj - 1])
            && self.a[besti - 1] == self.b[bestj - 1]
        {
            besti -= 1;
            bestj -= 1;
            bestsize += 1;
        }
        while besti + bestsize < ahi
            && bestj + bestsize < bhi
            && !self.is_b_junk(&self.b[bestj + bestsize])
            && self.a[besti + bestsize] == self.b[bestj + bestsize]
        {
            bestsize += 1;
        }

        while besti > alo
            && bestj > blo
            && self.is_b_junk(&self.b[bestj - 1])
            && self.a[besti - 1] == self.b[bestj - 1]
        {
            besti -= 1;
            bestj -= 1;
            bestsize += 1;
        }
        while besti + bestsize < ahi
            && bestj + bestsize < bhi
            && self.is_b_junk(&self.b[bestj + bestsize])
            && self.a[besti + bestsize] == self.b[bestj + bestsize]
        {
            bestsize += 1;
        }

        (besti, bestj, bestsize)
    }

    /// The non-overlapping matching blocks, in order, ending with the
    /// zero-sized sentinel `(len(a), len(b), 0)`.
    pub fn matching_blocks(&mut self) -> &[MatchingBlock] {
        if self.matching_blocks.is_none() {
            self.matching_blocks = Some(self.compute_matching_blocks());
        }
        self.matching_blocks.as_deref().unwrap()
    }

    fn compute_matching_blocks(&self) -> Vec<MatchingBlock> {
        let la = self.a.len();
        let lb = self.b.len();
        let mut queue = vec![(0, la, 0, lb)];
        let mut matching_blocks = Vec::new();
        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.find_longest_match(alo, ahi, blo, bhi);
            if k > 0 {
                matching_blocks.push((i, j, k));
                if alo < i && blo < j {
                    queue.push((alo, i, blo, j));
                }
                if i + k < ahi && j + k < bhi {
                    queue.push((i + k, ahi, j + k, bhi));
                }
            }
        }
        matching_blocks.sort_unstable();

        // Collapse adjacent blocks into single larger ones.
        let mut i1 = 0;
        let mut j1 = 0;
        let mut k1 = 0;
        let mut non_adjacent: Vec<MatchingBlock> = Vec::new();
        for (i2, j2, k2) in matching_blocks {
            if i1 + k1 == i2 && j1 + k1 == j2 {
                k1 += k2;
            } else {
                if k1 > 0 {
                    non_adjacent.push((i1, j1, k1));
                }
                i1 = i2;
                j1 = j2;
                k1 = k2;
            }
        }
        if k1 > 0 {
            non_adjacent.push((i1, j1, k1));
        }
        non_adjacent.push((la, lb, 0));
        non_adjacent
    }

    /// The standard five-tag opcode stream derived from the matching blocks.
    pub fn opcodes(&mut self) -> Vec<Opcode> {
        opcodes_from_blocks(self.matching_blocks())
    }

    /// `2*M / T` where `M` is the number of matched items and `T` the total
    /// number of items in both sequences.
    pub fn ratio(&mut self) -> f64 {
        let matches: usize = self.matching_blocks().iter().map(|&(_, _, size)| size).sum();
        let length = self.a.len() + self.b.len();
        calculate_ratio(matches, length)
    }
}

/// Derives opcodes from an arbitrary sorted list of non-overlapping matching
/// blocks (which must end with the sentinel).
pub fn opcodes_from_blocks(blocks: &[MatchingBlock]) -> Vec<Opcode> {
    let mut i = 0;
    let mut j = 0;
    let mut opcodes = Vec::new();
    for &(ai, bj, size) in blocks {
        let tag = if i < ai && j < bj {
            Some(OpTag::Replace)
        } else if i < ai {
            Some(OpTag::Delete)
        } else if j < bj {
            Some(OpTag::Insert)
        } else {
            None
        };
        if let Some(tag) = tag {
            opcodes.push(Opcode {
                tag,
                i1: i,
                i2: ai,
                j1: j,
                j2: bj,
            });
        }
        i = ai + size;
        j = bj + size;
        if size > 0 {
            opcodes.push(Opcode {
                tag: OpTag::Equal,
                i1: ai,
                i2: i,
                j1: bj,
                j2: j,
            });
        }
    }
    opcodes
}

pub fn calculate_ratio(matches: usize, length: usize) -> f64 {
    if length > 0 {
        2.0 * matches as f64 / length as f64
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn longest_match_without_junk() {
        let sm = SequenceMatcher::new(None, chars(" abcd"), chars("abcd abcd"));
        assert_eq!(sm.find_longest_match(0, 5, 0, 9), (0, 4, 5));
    }

    #[test]
    fn longest_match_with_junk() {
        // With blanks as junk, the match cannot start on the second "abcd".
        let junk = |c: &char| *c == ' ';
        let sm = SequenceMatcher::new(Some(&junk), chars(" abcd"), chars("abcd abcd"));
        assert_eq!(sm.find_longest_match(0, 5, 0, 9), (1, 0, 4));
    }

    #[test]
    fn blocks_end_with_sentinel() {
        let mut sm = SequenceMatcher::new(None, chars("abxcd"), chars("abcd"));
        assert_eq!(sm.matching_blocks(), &[(0, 0, 2), (3, 2, 2), (5, 4, 0)]);
    }

    #[test]
    fn opcode_stream() {
        let mut sm = SequenceMatcher::new(None, chars("qabxcd"), chars("abycdf"));
        let tags: Vec<(OpTag, usize, usize, usize, usize)> = sm
            .opcodes()
            .into_iter()
            .map(|op| (op.tag, op.i1, op.i2, op.j1, op.j2))
            .collect();
        assert_eq!(
            tags,
            vec![
                (OpTag::Delete, 0, 1, 0, 0),
                (OpTag::Equal, 1, 3, 0, 2),
                (OpTag::Replace, 3, 4, 2, 3),
                (OpTag::Equal, 4, 6, 3, 5),
                (OpTag::Insert, 6, 6, 5, 6),
            ],
        );
    }

    #[test]
    fn ratio_counts_all_items() {
        let mut sm = SequenceMatcher::new(None, chars("abcd"), chars("bcde"));
        assert_eq!(sm.ratio(), 0.75);
    }

    #[test]
    fn empty_sequences_are_identical() {
        let mut sm = SequenceMatcher::new(None, Vec::<char>::new(), Vec::new());
        assert_eq!(sm.ratio(), 1.0);
        assert_eq!(sm.matching_blocks(), &[(0, 0, 0)]);
    }
}

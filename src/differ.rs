//! Recursive alignment of two documents into a positional edit script.

use std::collections::VecDeque;

use itertools::Itertools;
use log::debug;

use crate::dom::{Dom, NodeId};
use crate::edit_script::{Action, EditScriptEntry, NodeProperties};
use crate::keys::{FuzzyTreeKey, TreeKey};
use crate::seq_match::{MatchingBlock, OpTag, Opcode, SequenceMatcher, opcodes_from_blocks};

/// Below this ratio an exact-match alignment of a sibling sequence is
/// considered spurious and discarded wholesale.
const MIN_ALIGNMENT_RATIO: f64 = 0.3;

/// Computes an edit script transforming one document into another.
///
/// The differ works on its own copies of both trees: the old copy is mutated
/// as the script is emitted, so that the locations in later entries stay
/// valid against the evolving tree.
pub struct Differ {
    old: Dom,
    new: Dom,
    edit_script: Vec<EditScriptEntry>,
}

impl Differ {
    pub fn new(old_dom: &Dom, new_dom: &Dom) -> Self {
        Self {
            old: old_dom.clone(),
            new: new_dom.clone(),
            edit_script: Vec::new(),
        }
    }

    /// Runs the alignment, starting at the document roots.
    pub fn into_edit_script(mut self) -> Vec<EditScriptEntry> {
        self.diff_location(&[], &[]);
        debug!("edit script has {} operations", self.edit_script.len());
        self.edit_script
    }

    /// Aligns the children of the two given locations and emits edit-script
    /// entries for everything that does not match.
    ///
    /// Matching happens in two tiers. First whole subtrees are matched by
    /// full-tree equality. Then, in each gap between exact matches, subtrees
    /// are matched by top-node equality plus text similarity; those pairs
    /// still have differences inside, so they are queued for recursion.
    fn diff_location(&mut self, old_location: &[usize], new_location: &[usize]) {
        let old_parent = self
            .old
            .resolve_location(old_location)
            .expect("old location vanished during diffing");
        let new_parent = self
            .new
            .resolve_location(new_location)
            .expect("new location vanished during diffing");
        let new_children = self.new.children(new_parent).to_vec();
        let old_child_count = self.old.children(old_parent).len();

        // Tier 1: whole-subtree matches.
        let old_keys: Vec<TreeKey> = (self.old.children(old_parent).iter())
            .map(|&child| TreeKey::of(&self.old, child))
            .collect();
        let new_keys: Vec<TreeKey> = (new_children.iter())
            .map(|&child| TreeKey::of(&self.new, child))
            .collect();
        let junk = |key: &TreeKey| key.is_whitespace_only();
        let mut exact = SequenceMatcher::new(Some(&junk), old_keys, new_keys);
        // If the match is very poor, pretend there were no exact matching
        // blocks at all, leaving a single gap for the fuzzy tier.
        let matching_blocks: Vec<MatchingBlock> = if exact.ratio() < MIN_ALIGNMENT_RATIO {
            vec![(old_child_count, new_children.len(), 0)]
        } else {
            exact.matching_blocks().to_vec()
        };

        // Tier 2: text-similar matches in each gap between exact matches.
        let mut fuzzy_blocks: Vec<MatchingBlock> = Vec::new();
        for (alo, ahi, blo, bhi) in nonmatching_blocks(&matching_blocks) {
            let a_keys: Vec<FuzzyTreeKey> = (self.old.children(old_parent)[alo..ahi].iter())
                .map(|&child| FuzzyTreeKey::of(&self.old, child))
                .collect();
            let b_keys: Vec<FuzzyTreeKey> = (new_children[blo..bhi].iter())
                .map(|&child| FuzzyTreeKey::of(&self.new, child))
                .collect();
            let fuzzy_junk = |key: &FuzzyTreeKey| key.is_junk();
            let mut fuzzy = SequenceMatcher::new(Some(&fuzzy_junk), a_keys, b_keys);
            fuzzy_blocks.extend(
                (fuzzy.matching_blocks().iter()).map(|&(a, b, size)| (alo + a, blo + b, size)),
            );
        }

        // The fuzzy pairs are aligned but not identical: recurse on them
        // after this level's edits are applied.
        let mut recursion_indices: Vec<(usize, usize)> =
            fuzzy_blocks.iter().flat_map(match_indices).collect();

        // From here on the two kinds of matches are treated the same.
        let merged_blocks = merge_blocks(&matching_blocks, &fuzzy_blocks);
        debug!(
            "aligned {:?}/{:?}: {} exact and {} fuzzy blocks",
            old_location,
            new_location,
            matching_blocks.len() - 1,
            recursion_indices.len(),
        );

        for op in adjusted_ops(opcodes_from_blocks(&merged_blocks)) {
            match op.tag {
                OpTag::Delete => {
                    assert_eq!(op.j1, op.j2, "delete opcode with a new-side range");
                    // Delete the range from right to left.
                    for index in (op.i1..op.i2).rev() {
                        let child = self
                            .old
                            .child(old_parent, index)
                            .expect("delete opcode out of range");
                        let location = extended(old_location, index);
                        self.delete(location, child);
                    }
                }
                OpTag::Insert => {
                    assert_eq!(op.i1, op.i2, "insert opcode with an old-side range");
                    // Insert the range from left to right.
                    for (offset, &child) in new_children[op.j1..op.j2].iter().enumerate() {
                        let location = extended(new_location, op.i1 + offset);
                        self.insert(location, child);
                    }
                }
                OpTag::Equal | OpTag::Replace => {
                    unreachable!("adjusted opcodes only contain deletes and inserts")
                }
            }
            recursion_indices = adjust_indices(recursion_indices, op.i1, op.i2, op.j1, op.j2);
        }

        for (old_index, new_index) in recursion_indices {
            self.diff_location(
                &extended(old_location, old_index),
                &extended(new_location, new_index),
            );
        }
    }

    /// Emits deletions for a whole subtree, children before parent, right to
    /// left, and detaches the node from the old tree.
    fn delete(&mut self, location: Vec<usize>, node: NodeId) {
        let children = self.old.children(node).to_vec();
        for (index, &child) in children.iter().enumerate().rev() {
            self.delete(extended(&location, index), child);
        }
        self.edit_script.push(EditScriptEntry::new(
            Action::Delete,
            location,
            NodeProperties::of(&self.old, node),
        ));
        self.old.detach(node);
    }

    /// Emits insertions for a whole subtree, parent before children, left to
    /// right, and mirrors them into the old tree so that later locations
    /// resolve correctly.
    fn insert(&mut self, location: Vec<usize>, node: NodeId) {
        self.edit_script.push(EditScriptEntry::new(
            Action::Insert,
            location.clone(),
            NodeProperties::of(&self.new, node),
        ));

        let (&child_index, parent_location) = location
            .split_last()
            .expect("insert location cannot be the root");
        let parent = self
            .old
            .resolve_location(parent_location)
            .expect("insert parent vanished during diffing");
        let data = self.new.data(node).clone();
        let copy = self.old.create(data);
        let next_sibling = self.old.child(parent, child_index);
        self.old.insert_before(parent, copy, next_sibling);

        let children = self.new.children(node).to_vec();
        for (index, &child) in children.iter().enumerate() {
            self.insert(extended(&location, index), child);
        }
    }
}

fn extended(location: &[usize], index: usize) -> Vec<usize> {
    let mut result = location.to_vec();
    result.push(index);
    result
}

/// The gaps between a list of matching blocks, as `(alo, ahi, blo, bhi)`
/// index ranges. The gap before each block is yielded, so the trailing
/// sentinel produces the final gap.
fn nonmatching_blocks(matching_blocks: &[MatchingBlock]) -> Vec<(usize, usize, usize, usize)> {
    let mut i = 0;
    let mut j = 0;
    let mut gaps = Vec::with_capacity(matching_blocks.len());
    for &(a, b, size) in matching_blocks {
        gaps.push((i, a, j, b));
        i = a + size;
        j = b + size;
    }
    gaps
}

/// Index pairs `(old_index, new_index)` for each position inside a match.
fn match_indices(block: &MatchingBlock) -> Vec<(usize, usize)> {
    let &(a, b, size) = block;
    (0..size).map(|k| (a + k, b + k)).collect()
}

/// Combines two block lists into a single sorted, non-overlapping list.
/// Both lists must end with the same sentinel, which is preserved.
fn merge_blocks(a_blocks: &[MatchingBlock], b_blocks: &[MatchingBlock]) -> Vec<MatchingBlock> {
    let a_sentinel = a_blocks.last().expect("empty matching block list");
    let b_sentinel = b_blocks.last().expect("empty matching block list");
    assert_eq!(a_sentinel.2, 0, "matching blocks must end with a sentinel");
    assert_eq!(b_sentinel.2, 0, "matching blocks must end with a sentinel");
    assert_eq!(a_sentinel, b_sentinel, "sentinel mismatch between block lists");

    let combined: Vec<MatchingBlock> = a_blocks
        .iter()
        .chain(b_blocks)
        .copied()
        .sorted_unstable()
        .dedup()
        .collect();
    let mut i = 0;
    let mut j = 0;
    for &(a, b, size) in &combined {
        assert!(i <= a && j <= b, "overlapping matching blocks");
        i = a + size;
        j = b + size;
    }
    combined
}

/// Turns an opcode stream into a series of pure insert and delete
/// operations, adjusting the old-side indices of the remaining opcodes to
/// account for the size of each applied insertion and deletion.
fn adjusted_ops(opcodes: Vec<Opcode>) -> Vec<Opcode> {
    let mut queue: VecDeque<Opcode> = opcodes.into();
    let mut result = Vec::new();
    while let Some(op) = queue.pop_front() {
        match op.tag {
            OpTag::Equal => continue,
            OpTag::Replace => {
                // Split the replace into a delete then an insert. Mind the
                // indices here, there is no typo.
                queue.push_front(Opcode {
                    tag: OpTag::Insert,
                    i1: op.i2,
                    i2: op.i2,
                    j1: op.j1,
                    j2: op.j2,
                });
                queue.push_front(Opcode {
                    tag: OpTag::Delete,
                    i1: op.i1,
                    i2: op.i2,
                    j1: op.j1,
                    j2: op.j1,
                });
                continue;
            }
            OpTag::Delete | OpTag::Insert => {}
        }
        let shift = match op.tag {
            OpTag::Delete => -((op.i2 - op.i1) as isize),
            OpTag::Insert => (op.j2 - op.j1) as isize,
            OpTag::Equal | OpTag::Replace => unreachable!(),
        };
        result.push(op);
        for rest in &mut queue {
            rest.i1 = shifted(rest.i1, shift);
            rest.i2 = shifted(rest.i2, shift);
        }
    }
    result
}

/// Rewrites recursion index pairs after an applied opcode: old-side indices
/// at or past the opcode's end shift by the net size change.
fn adjust_indices(
    indices: Vec<(usize, usize)>,
    i1: usize,
    i2: usize,
    j1: usize,
    j2: usize,
) -> Vec<(usize, usize)> {
    let shift = (j2 as isize - j1 as isize) - (i2 as isize - i1 as isize);
    indices
        .into_iter()
        .map(|(a, b)| if a >= i2 { (shifted(a, shift), b) } else { (a, b) })
        .collect()
}

fn shifted(value: usize, shift: isize) -> usize {
    usize::try_from(value as isize + shift).expect("opcode index shifted below zero")
}

//! Structural diffing of HTML and XML documents.
//!
//! ## Overview
//!
//! Diffgiraf takes two versions of a document and produces a single marked-up
//! document in which added subtrees are wrapped in `<ins>` and removed
//! subtrees in `<del>`. Stripping the `<ins>` contents of the result yields
//! the old version, stripping the `<del>` contents yields the new one (up to
//! whitespace normalization).
//!
//! The diff is computed by a hierarchical alignment of the two trees: sibling
//! sequences are matched level by level, first by whole-subtree equality and
//! then by text similarity, and everything left over becomes a positional
//! edit script. The script is replayed on the old tree and the touched nodes
//! are turned into well-formed inline change markup, including list and
//! table repair.
//!
//! ```no_run
//! use diffgiraf::{DiffSettings, diff};
//!
//! let changes = diff("<h1>one</h1>", "<h1>one</h1><h2>two</h2>", &DiffSettings::default())?;
//! assert_eq!(changes, "<h1>one</h1><ins><h2>two</h2></ins>");
//! # Ok::<(), diffgiraf::DiffError>(())
//! ```

use std::time::Instant;

use log::debug;

pub(crate) mod changes;
pub mod differ;
pub mod dom;
pub mod edit_script;
mod error;
pub mod keys;
pub(crate) mod markup;
pub mod parse;
pub mod script_runner;
pub mod serialize;
pub mod seq_match;
pub mod settings;
pub(crate) mod text_diff;
pub mod tokenize;
pub mod word_match;
#[cfg(test)]
pub(crate) mod test_utils;

pub use error::DiffError;
pub use settings::DiffSettings;
pub use text_diff::text_changes;

use keys::tree_text_ratio;

/// What the diff collapses to when the two documents fall below the
/// similarity cutoff.
pub const TOO_MANY_CHANGES_MESSAGE: &str =
    "<h2>The differences from the previous version are too large to show concisely.</h2>";

/// Diffs two documents and returns the changes as a single marked-up
/// document (the contents of its `<body>`, without the wrapper).
pub fn diff(old: &str, new: &str, settings: &DiffSettings) -> Result<String, DiffError> {
    let start = Instant::now();
    let old_dom = parse::parse_document(old, settings.html)?;
    let new_dom = parse::parse_document(new, settings.html)?;
    debug!(
        "parsed both documents ({} and {} nodes) in {:?}",
        old_dom.size(),
        new_dom.size(),
        start.elapsed(),
    );

    if settings.cutoff > 0.0 {
        let ratio = tree_text_ratio(&old_dom, old_dom.root(), &new_dom, new_dom.root());
        if ratio < settings.cutoff {
            debug!("similarity {ratio:.3} below cutoff {:.3}, giving up", settings.cutoff);
            return Ok(TOO_MANY_CHANGES_MESSAGE.to_owned());
        }
    }

    let changes_dom = changes::dom_diff(old_dom, new_dom, settings.html)?;
    let result = serialize::to_markup(&changes_dom, settings.pretty);
    debug!("diff computed in {:?}", start.elapsed());
    Ok(result)
}

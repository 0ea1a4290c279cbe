//! Read-only loading of decision trees from JSON files.

use std::fs;
use std::path::Path;

use tracing::{debug, instrument};

use crate::application::{ApplicationResult, IoResultExt, TreeResultExt};
use crate::domain::{DecisionTree, NodeRecord, TreeOptions};

/// Parse a tree file into its record; `null` content yields `None`.
#[instrument(level = "debug")]
pub fn read_tree_file(path: &Path) -> ApplicationResult<Option<NodeRecord>> {
    let content = fs::read_to_string(path).with_path_context("read tree file", path)?;
    let record = NodeRecord::parse(&content).in_file(path)?;
    if let Some(record) = &record {
        debug!("parsed {} records from {}", record.node_count(), path.display());
    }
    Ok(record)
}

/// Build a [`DecisionTree`] from a tree file.
///
/// A file holding `null` produces an empty tree.
#[instrument(level = "debug")]
pub fn load_tree(path: &Path, options: TreeOptions) -> ApplicationResult<DecisionTree> {
    let record = read_tree_file(path)?;
    let mut tree = DecisionTree::with_options(options);
    tree.from_record(record).in_file(path)?;
    debug!("loaded {} nodes from {}", tree.len(), path.display());
    Ok(tree)
}

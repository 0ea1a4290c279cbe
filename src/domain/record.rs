//! Structural records used to move a tree in and out of JSON.
//!
//! A record mirrors the node graph one to one:
//!
//! ```json
//! { "data": { "id": "r", "question": "Interested?", "isEndNode": false },
//!   "children": [ { "data": { ... }, "children": [] } ] }
//! ```
//!
//! An empty tree is encoded as `null`, never as an empty record.
//!
//! Records nest once per tree level, so parsing runs without serde_json's
//! recursion limit and both directions grow the stack on demand instead of
//! overflowing it.

use std::collections::HashSet;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use tracing::instrument;

use crate::domain::arena::NodeData;
use crate::domain::error::{DomainError, TreeResult};

/// One node of the serialized tree together with its children, in order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeRecord {
    pub data: NodeData,
    #[serde(default)]
    pub children: Vec<NodeRecord>,
}

impl NodeRecord {
    pub fn leaf(data: NodeData) -> Self {
        Self {
            data,
            children: Vec::new(),
        }
    }

    pub fn with_children(data: NodeData, children: Vec<NodeRecord>) -> Self {
        Self { data, children }
    }

    /// Parses a JSON document into an optional record (`null` means empty tree).
    ///
    /// Nesting depth is unbounded: whatever [`DecisionTree::to_json`] writes
    /// can be read back.
    ///
    /// [`DecisionTree::to_json`]: crate::domain::DecisionTree::to_json
    pub fn parse(json: &str) -> TreeResult<Option<Self>> {
        let mut de = serde_json::Deserializer::from_str(json);
        de.disable_recursion_limit();
        let record = Option::<Self>::deserialize(serde_stacker::Deserializer::new(&mut de))
            .map_err(malformed)?;
        de.end().map_err(malformed)?;
        Ok(record)
    }

    /// Checks what serde cannot express: non-empty ids and, if requested,
    /// uniqueness of ids across the whole record.
    #[instrument(level = "debug", skip(self), fields(root = %self.data.id))]
    pub fn validate(&self, unique_ids: bool) -> TreeResult<()> {
        let mut seen = HashSet::new();
        let mut stack = vec![self];
        while let Some(record) = stack.pop() {
            let id = record.data.id.as_str();
            if id.is_empty() {
                return Err(DomainError::MalformedRecord(
                    "node id must not be empty".to_string(),
                ));
            }
            if unique_ids && !seen.insert(id) {
                return Err(DomainError::DuplicateId(id.to_string()));
            }
            stack.extend(record.children.iter());
        }
        Ok(())
    }

    /// Total number of nodes in this record.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(record) = stack.pop() {
            count += 1;
            stack.extend(record.children.iter());
        }
        count
    }
}

fn malformed(e: serde_json::Error) -> DomainError {
    DomainError::MalformedRecord(e.to_string())
}

/// Free space below which serialization moves to a fresh stack segment.
const RED_ZONE: usize = 64 * 1024;
/// Size of each stack segment allocated on demand.
const STACK_SEGMENT: usize = 1024 * 1024;

impl Serialize for NodeRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        stacker::maybe_grow(RED_ZONE, STACK_SEGMENT, || {
            let mut state = serializer.serialize_struct("NodeRecord", 2)?;
            state.serialize_field("data", &self.data)?;
            state.serialize_field("children", &self.children)?;
            state.end()
        })
    }
}

// Flattens the subtree first so dropping a deep record does not recurse.
impl Drop for NodeRecord {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut record) = pending.pop() {
            pending.append(&mut record.children);
        }
    }
}

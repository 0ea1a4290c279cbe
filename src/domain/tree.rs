//! Decision tree manager: lookup, mutation, journey navigation, traversal
//! and (de)serialization over a [`TreeArena`].

use std::collections::VecDeque;

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::domain::arena::{NodeData, TreeArena, TreeNode};
use crate::domain::error::{DomainError, TreeResult};
use crate::domain::record::NodeRecord;

/// Behavior switches of a [`DecisionTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeOptions {
    /// Reject ids that already exist somewhere in the tree
    pub unique_ids: bool,
    /// Cut the current path at the first node removed by a structural edit
    pub prune_path_on_edit: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            unique_ids: true,
            prune_path_on_edit: true,
        }
    }
}

/// Summary numbers gathered in a single depth-first pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub nodes: usize,
    pub leaves: usize,
    pub end_nodes: usize,
    pub height: usize,
}

/// A decision tree plus the path of an in-progress journey through it.
///
/// All mutation goes through this type; callers only ever hold `Index`
/// handles and read nodes through [`DecisionTree::node`].
#[derive(Debug, Default)]
pub struct DecisionTree {
    nodes: TreeArena,
    current_path: Vec<Index>,
    options: TreeOptions,
}

impl DecisionTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: TreeOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn root(&self) -> Option<Index> {
        self.nodes.root()
    }

    pub fn node(&self, idx: Index) -> Option<&TreeNode> {
        self.nodes.get_node(idx)
    }

    pub fn data(&self, idx: Index) -> Option<&NodeData> {
        self.node(idx).map(|node| &node.data)
    }

    /// Children of `idx` in insertion order, empty for unknown handles.
    pub fn children(&self, idx: Index) -> &[Index] {
        self.node(idx)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    pub fn parent(&self, idx: Index) -> Option<Index> {
        self.node(idx).and_then(|node| node.parent)
    }

    pub fn contains(&self, idx: Index) -> bool {
        self.nodes.contains(idx)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------

    /// Replaces any existing tree by a new root built from `data`.
    ///
    /// The old nodes are gone afterwards, so a journey into them cannot be
    /// continued: call [`DecisionTree::start_journey`] again.
    #[instrument(level = "debug", skip(self, data), fields(id = %data.id))]
    pub fn set_root(&mut self, data: NodeData) -> Index {
        let idx = self.nodes.set_root(data);
        self.prune_current_path();
        idx
    }

    /// Breadth-first lookup; the shallowest, earliest inserted match wins.
    #[instrument(level = "trace", skip(self))]
    pub fn find_node_by_id(&self, id: &str) -> Option<Index> {
        let mut queue = VecDeque::new();
        queue.extend(self.nodes.root());

        while let Some(idx) = queue.pop_front() {
            let Some(node) = self.nodes.get_node(idx) else {
                continue;
            };
            if node.data.id == id {
                return Some(idx);
            }
            queue.extend(node.children.iter().copied());
        }
        None
    }

    #[instrument(level = "debug", skip(self, data), fields(id = %data.id))]
    pub fn add_node(&mut self, parent_id: &str, data: NodeData) -> TreeResult<Index> {
        let parent = self
            .find_node_by_id(parent_id)
            .ok_or_else(|| DomainError::ParentNotFound(parent_id.to_string()))?;
        if self.options.unique_ids && self.find_node_by_id(&data.id).is_some() {
            warn!("rejecting duplicate id '{}'", data.id);
            return Err(DomainError::DuplicateId(data.id));
        }
        let id = data.id.clone();
        let idx = self
            .nodes
            .add_child(parent, data)
            .ok_or_else(|| DomainError::ParentNotFound(parent_id.to_string()))?;
        debug!("added '{}' below '{}'", id, parent_id);
        Ok(idx)
    }

    /// Removes the node `id` and its entire subtree. The root cannot be
    /// removed this way.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_node(&mut self, id: &str) -> TreeResult<()> {
        let idx = self
            .find_node_by_id(id)
            .ok_or_else(|| DomainError::NodeNotFound(id.to_string()))?;
        let parent = self
            .parent(idx)
            .ok_or_else(|| DomainError::RootRemoval(id.to_string()))?;
        if !self.nodes.remove_child(parent, id) {
            return Err(DomainError::NodeNotFound(id.to_string()));
        }
        self.prune_current_path();
        Ok(())
    }

    /// Drops every node and ends any journey.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.current_path.clear();
    }

    fn prune_current_path(&mut self) {
        if !self.options.prune_path_on_edit {
            return;
        }
        let stale = self
            .current_path
            .iter()
            .position(|&idx| !self.nodes.contains(idx));
        if let Some(position) = stale {
            debug!(
                "pruning journey path from {} to {} steps",
                self.current_path.len(),
                position
            );
            self.current_path.truncate(position);
        }
    }

    // ------------------------------------------------------------
    // Journey navigation
    // ------------------------------------------------------------

    /// (Re)starts a journey at the root, discarding any previous path.
    #[instrument(level = "debug", skip(self))]
    pub fn start_journey(&mut self) -> TreeResult<Index> {
        let root = self.nodes.root().ok_or(DomainError::EmptyTree)?;
        self.current_path = vec![root];
        Ok(root)
    }

    /// Moves to the direct child `id` of the current node.
    ///
    /// On failure the path is left unchanged.
    #[instrument(level = "debug", skip(self))]
    pub fn navigate_to_child(&mut self, id: &str) -> TreeResult<Index> {
        let current = *self
            .current_path
            .last()
            .ok_or(DomainError::NoActiveJourney)?;
        let child = self
            .children(current)
            .iter()
            .copied()
            .find(|&child| self.data(child).is_some_and(|data| data.id == id));

        match child {
            Some(child) => {
                self.current_path.push(child);
                Ok(child)
            }
            None => Err(DomainError::ChildNotFound {
                id: id.to_string(),
                current: self
                    .data(current)
                    .map(|data| data.id.clone())
                    .unwrap_or_default(),
            }),
        }
    }

    /// Steps back one level and returns the node that is current afterwards.
    #[instrument(level = "debug", skip(self))]
    pub fn go_back(&mut self) -> TreeResult<Index> {
        if self.current_path.len() <= 1 {
            return Err(DomainError::NavigationBoundary);
        }
        self.current_path.pop();
        self.current_path
            .last()
            .copied()
            .ok_or(DomainError::NavigationBoundary)
    }

    /// Copy of the journey path, root first.
    pub fn current_path(&self) -> Vec<Index> {
        self.current_path.clone()
    }

    pub fn current_node(&self) -> Option<Index> {
        self.current_path.last().copied()
    }

    pub fn is_journey_active(&self) -> bool {
        !self.current_path.is_empty()
    }

    // ------------------------------------------------------------
    // Traversal and statistics
    // ------------------------------------------------------------

    /// Pre-order walk from the root (depth 0); children in stored order.
    pub fn depth_first_traversal<F>(&self, mut visit: F)
    where
        F: FnMut(Index, &TreeNode, usize),
    {
        for (idx, node, depth) in self.nodes.iter() {
            visit(idx, node, depth);
        }
    }

    /// Level-order walk from the root (depth 0).
    pub fn breadth_first_traversal<F>(&self, mut visit: F)
    where
        F: FnMut(Index, &TreeNode, usize),
    {
        let mut queue = VecDeque::new();
        queue.extend(self.nodes.root().map(|root| (root, 0)));

        while let Some((idx, depth)) = queue.pop_front() {
            if let Some(node) = self.nodes.get_node(idx) {
                visit(idx, node, depth);
                queue.extend(node.children.iter().map(|&child| (child, depth + 1)));
            }
        }
    }

    /// Leaf nodes in depth-first pre-order.
    pub fn leaf_nodes(&self) -> Vec<Index> {
        self.nodes.leaf_nodes()
    }

    /// Nodes on the longest root-to-leaf path; 0 for an empty tree.
    pub fn tree_height(&self) -> usize {
        self.nodes.depth()
    }

    #[instrument(level = "debug", skip(self))]
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        self.depth_first_traversal(|_, node, depth| {
            stats.nodes += 1;
            stats.height = stats.height.max(depth + 1);
            if node.is_leaf() {
                stats.leaves += 1;
            }
            if node.is_end_node() {
                stats.end_nodes += 1;
            }
        });
        stats
    }

    /// Ancestry of `idx`, root first and `idx` last; empty for unknown handles.
    pub fn path_to(&self, idx: Index) -> Vec<Index> {
        let mut path = Vec::new();
        let mut cursor = self.contains(idx).then_some(idx);
        while let Some(current) = cursor {
            path.push(current);
            cursor = self.parent(current);
        }
        path.reverse();
        path
    }

    // ------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------

    /// Structural record of the whole tree, `None` when empty.
    pub fn to_record(&self) -> Option<NodeRecord> {
        self.nodes
            .fold(|node, children| NodeRecord::with_children(node.data.clone(), children))
    }

    /// Bottom-up fold over the tree, see [`TreeArena::fold`].
    pub fn fold<T, F>(&self, build: F) -> Option<T>
    where
        F: FnMut(&TreeNode, Vec<T>) -> T,
    {
        self.nodes.fold(build)
    }

    /// Replaces the tree by the one described in `record` and ends any journey.
    ///
    /// `None` is a no-op. The record is validated and rebuilt completely
    /// before the current tree is touched.
    #[instrument(level = "debug", skip(self, record))]
    pub fn from_record(&mut self, record: Option<NodeRecord>) -> TreeResult<()> {
        let Some(record) = record else {
            return Ok(());
        };
        record.validate(self.options.unique_ids)?;

        let mut nodes = TreeArena::new();
        let root = nodes.set_root(record.data.clone());
        let mut pending = vec![(root, &record)];
        while let Some((parent, parent_record)) = pending.pop() {
            for child in &parent_record.children {
                let idx = nodes
                    .add_child(parent, child.data.clone())
                    .ok_or_else(|| DomainError::ParentNotFound(parent_record.data.id.clone()))?;
                pending.push((idx, child));
            }
        }

        debug!("loaded tree with {} nodes", nodes.len());
        self.nodes = nodes;
        self.current_path.clear();
        Ok(())
    }

    /// Pretty JSON of the tree; `null` for an empty tree.
    pub fn to_json(&self) -> TreeResult<String> {
        serde_json::to_string_pretty(&self.to_record())
            .map_err(|e| DomainError::MalformedRecord(e.to_string()))
    }

    pub fn from_json(&mut self, json: &str) -> TreeResult<()> {
        let record = NodeRecord::parse(json)?;
        self.from_record(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    //      r
    //     / \
    //    a   b
    //    |
    //    c
    fn sample() -> DecisionTree {
        let mut tree = DecisionTree::new();
        tree.set_root(NodeData::new("r", "Root?"));
        tree.add_node("r", NodeData::new("a", "A?")).unwrap();
        tree.add_node("r", NodeData::new("b", "B?")).unwrap();
        tree.add_node("a", NodeData::new("c", "")).unwrap();
        tree
    }

    fn ids(tree: &DecisionTree, handles: &[Index]) -> Vec<String> {
        handles
            .iter()
            .map(|&idx| tree.data(idx).unwrap().id.clone())
            .collect()
    }

    #[test]
    fn test_find_on_empty_tree() {
        assert_eq!(DecisionTree::new().find_node_by_id("r"), None);
    }

    #[test]
    fn test_find_prefers_shallow_match() {
        let mut tree = DecisionTree::with_options(TreeOptions {
            unique_ids: false,
            ..TreeOptions::default()
        });
        let root = tree.set_root(NodeData::new("r", ""));
        let a = tree.add_node("r", NodeData::new("a", "")).unwrap();
        let deep = tree.add_node("a", NodeData::new("x", "deep")).unwrap();
        let shallow = tree.add_node("r", NodeData::new("x", "shallow")).unwrap();
        assert_eq!(tree.find_node_by_id("x"), Some(shallow));
        assert_ne!(tree.find_node_by_id("x"), Some(deep));
        assert_eq!(tree.find_node_by_id("r"), Some(root));
        assert_eq!(tree.find_node_by_id("a"), Some(a));
    }

    #[test]
    fn test_add_node_rejects_duplicates() {
        let mut tree = sample();
        assert_eq!(
            tree.add_node("b", NodeData::new("c", "")),
            Err(DomainError::DuplicateId("c".to_string()))
        );
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_add_node_unknown_parent() {
        let mut tree = sample();
        assert_eq!(
            tree.add_node("zz", NodeData::new("d", "")),
            Err(DomainError::ParentNotFound("zz".to_string()))
        );
    }

    #[test]
    fn test_breadth_first_order() {
        let tree = sample();
        let mut visited = Vec::new();
        tree.breadth_first_traversal(|_, node, depth| visited.push((node.data.id.clone(), depth)));
        let expected: Vec<(String, usize)> = [("r", 0), ("a", 1), ("b", 1), ("c", 2)]
            .iter()
            .map(|(id, d)| (id.to_string(), *d))
            .collect();
        assert_eq!(visited, expected);
    }

    #[test]
    fn test_depth_first_order() {
        let tree = sample();
        let mut visited = Vec::new();
        tree.depth_first_traversal(|_, node, depth| visited.push((node.data.id.clone(), depth)));
        let expected: Vec<(String, usize)> = [("r", 0), ("a", 1), ("c", 2), ("b", 1)]
            .iter()
            .map(|(id, d)| (id.to_string(), *d))
            .collect();
        assert_eq!(visited, expected);
    }

    #[test]
    fn test_traversals_on_empty_tree_are_noops() {
        let tree = DecisionTree::new();
        let mut calls = 0;
        tree.depth_first_traversal(|_, _, _| calls += 1);
        tree.breadth_first_traversal(|_, _, _| calls += 1);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_leaves_height_and_stats() {
        let tree = sample();
        assert_eq!(ids(&tree, &tree.leaf_nodes()), vec!["c", "b"]);
        assert_eq!(tree.tree_height(), 3);
        assert_eq!(
            tree.stats(),
            TreeStats {
                nodes: 4,
                leaves: 2,
                end_nodes: 0,
                height: 3
            }
        );
    }

    #[test]
    fn test_remove_prunes_path_below_removed_node() {
        let mut tree = sample();
        tree.start_journey().unwrap();
        tree.navigate_to_child("a").unwrap();
        tree.navigate_to_child("c").unwrap();

        tree.remove_node("a").unwrap();

        assert_eq!(ids(&tree, &tree.current_path()), vec!["r"]);
    }

    #[test]
    fn test_remove_keeps_path_without_pruning() {
        let mut tree = DecisionTree::with_options(TreeOptions {
            prune_path_on_edit: false,
            ..TreeOptions::default()
        });
        tree.from_record(sample().to_record()).unwrap();
        tree.start_journey().unwrap();
        let a = tree.navigate_to_child("a").unwrap();

        tree.remove_node("a").unwrap();

        assert_eq!(tree.current_node(), Some(a));
        assert!(!tree.contains(a));
        assert!(matches!(
            tree.navigate_to_child("c"),
            Err(DomainError::ChildNotFound { .. })
        ));
    }

    #[test]
    fn test_set_root_ends_journey() {
        let mut tree = sample();
        tree.start_journey().unwrap();
        tree.set_root(NodeData::new("n", ""));
        assert!(!tree.is_journey_active());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_path_to() {
        let tree = sample();
        let c = tree.find_node_by_id("c").unwrap();
        assert_eq!(ids(&tree, &tree.path_to(c)), vec!["r", "a", "c"]);
    }

    #[test]
    fn test_empty_tree_json_is_null() {
        let tree = DecisionTree::new();
        assert_eq!(tree.to_json().unwrap(), "null");
        assert_eq!(tree.to_record(), None);
    }

    #[test]
    fn test_from_record_none_is_noop() {
        let mut tree = sample();
        tree.start_journey().unwrap();
        tree.from_record(None).unwrap();
        assert_eq!(tree.len(), 4);
        assert!(tree.is_journey_active());
    }

    #[test]
    fn test_from_json_failure_keeps_tree() {
        let mut tree = sample();
        let err = tree.from_json(r#"{"data": {"id": "x"}}"#).unwrap_err();
        assert!(matches!(err, DomainError::MalformedRecord(_)));
        assert_eq!(tree.len(), 4);
        assert!(tree.find_node_by_id("c").is_some());
    }
}

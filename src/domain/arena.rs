use generational_arena::{Arena, Index};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, instrument};

/// Data payload of a single decision point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    /// Identifier, expected to be unique across the whole tree
    pub id: String,
    /// Display text, may be empty for leaf prompts
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Marks the node as a journey terminus
    #[serde(default)]
    pub is_end_node: bool,
    /// Completion message, only meaningful for end nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_message: Option<String>,
}

impl NodeData {
    pub fn new(id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            description: None,
            is_end_node: false,
            end_message: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Flags the node as an end node carrying `message`.
    pub fn end(mut self, message: impl Into<String>) -> Self {
        self.is_end_node = true;
        self.end_message = Some(message.into());
        self
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.question.is_empty() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{}: {}", self.id, self.question)
        }
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in insertion order
    pub children: Vec<Index>,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_end_node(&self) -> bool {
        self.data.is_end_node
    }
}

/// Arena-based storage for one decision tree.
///
/// Parent links are plain indices, so ownership stays tree shaped: a node is
/// owned by the arena and reachable through its parent's `children`.
/// Removing a node frees its whole subtree; the generation check of
/// `Index` makes every handle into the freed subtree resolve to `None`.
#[derive(Debug)]
pub struct TreeArena {
    arena: Arena<TreeNode>,
    root: Option<Index>,
}

impl Default for TreeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Replaces the whole tree by a single root node.
    #[instrument(level = "trace", skip(self))]
    pub fn set_root(&mut self, data: NodeData) -> Index {
        self.clear();
        let idx = self.arena.insert(TreeNode {
            data,
            parent: None,
            children: Vec::new(),
        });
        self.root = Some(idx);
        idx
    }

    /// Appends a new child after the existing children of `parent`.
    ///
    /// Returns `None` if `parent` is not a live node of this arena.
    #[instrument(level = "trace", skip(self))]
    pub fn add_child(&mut self, parent: Index, data: NodeData) -> Option<Index> {
        if !self.arena.contains(parent) {
            return None;
        }
        let child_idx = self.arena.insert(TreeNode {
            data,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.arena.get_mut(parent)?.children.push(child_idx);
        Some(child_idx)
    }

    /// Removes the first child of `parent` whose id equals `id`, together
    /// with its entire subtree.
    #[instrument(level = "trace", skip(self))]
    pub fn remove_child(&mut self, parent: Index, id: &str) -> bool {
        let Some(parent_node) = self.arena.get(parent) else {
            return false;
        };
        let position = parent_node.children.iter().position(|&child| {
            self.arena
                .get(child)
                .is_some_and(|node| node.data.id == id)
        });
        let Some(position) = position else {
            return false;
        };

        let child_idx = match self.arena.get_mut(parent) {
            Some(parent_node) => parent_node.children.remove(position),
            None => return false,
        };
        let doomed: Vec<Index> = self.iter_from(child_idx).map(|(idx, _, _)| idx).collect();
        for idx in &doomed {
            self.arena.remove(*idx);
        }
        debug!("removed '{}' and {} descendants", id, doomed.len() - 1);
        true
    }

    /// Frees every node. Nodes are removed one by one so the arena
    /// generation advances and previously issued handles stay stale.
    pub fn clear(&mut self) {
        let live: Vec<Index> = self.arena.iter().map(|(idx, _)| idx).collect();
        for idx in live {
            self.arena.remove(idx);
        }
        self.root = None;
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn contains(&self, idx: Index) -> bool {
        self.arena.contains(idx)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Pre-order iterator over the whole tree, yielding `(index, node, depth)`.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, self.root)
    }

    /// Pre-order iterator over the subtree rooted at `start`, depths relative to `start`.
    pub fn iter_from(&self, start: Index) -> TreeIterator<'_> {
        TreeIterator::new(self, Some(start))
    }

    /// Number of nodes on the longest root-to-leaf path, 0 for an empty tree.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.iter().map(|(_, _, depth)| depth + 1).max().unwrap_or(0)
    }

    /// Builds one value per node, children before parents, and returns the
    /// root's value. `build` receives the children's values in stored order.
    ///
    /// Runs without recursion, so arbitrarily deep trees are fine.
    pub fn fold<T, F>(&self, mut build: F) -> Option<T>
    where
        F: FnMut(&TreeNode, Vec<T>) -> T,
    {
        let preorder: Vec<(Index, &TreeNode)> =
            self.iter().map(|(idx, node, _)| (idx, node)).collect();
        let mut built: HashMap<Index, T> = HashMap::with_capacity(preorder.len());
        // reverse pre-order visits every child before its parent
        for (idx, node) in preorder.into_iter().rev() {
            let children = node
                .children
                .iter()
                .filter_map(|child| built.remove(child))
                .collect();
            built.insert(idx, build(node, children));
        }
        self.root.and_then(|root| built.remove(&root))
    }

    /// Collects all leaf nodes in depth-first pre-order.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<Index> {
        self.iter()
            .filter(|(_, node, _)| node.is_leaf())
            .map(|(idx, _, _)| idx)
            .collect()
    }
}

pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<(Index, usize)>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena, start: Option<Index>) -> Self {
        let stack = start.map(|idx| vec![(idx, 0)]).unwrap_or_default();
        Self { arena, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode, usize);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, depth)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push((child, depth + 1));
                }
                return Some((current_idx, node, depth));
            }
        }
        None
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
    fn sample() -> (TreeArena, [Index; 4]) {
        let mut arena = TreeArena::new();
        let r = arena.set_root(NodeData::new("r", "Root?"));
        let a = arena.add_child(r, NodeData::new("a", "A?")).unwrap();
        let b = arena.add_child(r, NodeData::new("b", "B?")).unwrap();
        let c = arena.add_child(a, NodeData::new("c", "")).unwrap();
        (arena, [r, a, b, c])
    }

    #[test]
    fn test_add_child_links_both_directions() {
        let (arena, [r, a, b, c]) = sample();
        assert_eq!(arena.get_node(r).unwrap().children, vec![a, b]);
        assert_eq!(arena.get_node(a).unwrap().parent, Some(r));
        assert_eq!(arena.get_node(c).unwrap().parent, Some(a));
        assert_eq!(arena.get_node(r).unwrap().parent, None);
    }

    #[test]
    fn test_add_child_to_removed_parent_fails() {
        let (mut arena, [r, a, _, _]) = sample();
        assert!(arena.remove_child(r, "a"));
        assert!(arena.add_child(a, NodeData::new("x", "")).is_none());
    }

    #[test]
    fn test_remove_child_cascades() {
        let (mut arena, [r, a, b, c]) = sample();
        assert!(arena.remove_child(r, "a"));
        assert!(!arena.contains(a));
        assert!(!arena.contains(c));
        assert_eq!(arena.get_node(r).unwrap().children, vec![b]);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_remove_child_unknown_id_is_noop() {
        let (mut arena, [r, _, _, c]) = sample();
        assert!(!arena.remove_child(r, "c"));
        assert!(!arena.remove_child(c, "r"));
        assert_eq!(arena.len(), 4);
    }

    #[test]
    fn test_remove_child_takes_first_match_only() {
        let mut arena = TreeArena::new();
        let r = arena.set_root(NodeData::new("r", ""));
        let first = arena.add_child(r, NodeData::new("dup", "first")).unwrap();
        let second = arena.add_child(r, NodeData::new("dup", "second")).unwrap();
        assert!(arena.remove_child(r, "dup"));
        assert!(!arena.contains(first));
        assert_eq!(arena.get_node(r).unwrap().children, vec![second]);
    }

    #[test]
    fn test_iter_is_preorder_with_depth() {
        let (arena, [r, a, b, c]) = sample();
        let visited: Vec<(Index, usize)> = arena.iter().map(|(i, _, d)| (i, d)).collect();
        assert_eq!(visited, vec![(r, 0), (a, 1), (c, 2), (b, 1)]);
    }

    #[test]
    fn test_depth_and_leaves() {
        let (arena, [_, _, b, c]) = sample();
        assert_eq!(arena.depth(), 3);
        assert_eq!(arena.leaf_nodes(), vec![c, b]);
        assert_eq!(TreeArena::new().depth(), 0);
    }

    #[test]
    fn test_fold_builds_children_first_in_order() {
        let (arena, _) = sample();
        let folded = arena.fold(|node, children: Vec<String>| {
            if children.is_empty() {
                node.data.id.clone()
            } else {
                format!("{}({})", node.data.id, children.join(","))
            }
        });
        assert_eq!(folded.as_deref(), Some("r(a(c),b)"));
        assert_eq!(TreeArena::new().fold(|_, _: Vec<()>| ()), None);
    }

    #[test]
    fn test_depth_of_deep_chain() {
        let mut arena = TreeArena::new();
        let mut parent = arena.set_root(NodeData::new("n0", ""));
        for level in 1..50_000 {
            parent = arena
                .add_child(parent, NodeData::new(format!("n{level}"), ""))
                .unwrap();
        }
        assert_eq!(arena.depth(), 50_000);
        assert_eq!(arena.fold(|_, children: Vec<usize>| children.len() + 1), Some(2));
    }

    #[test]
    fn test_set_root_discards_old_tree() {
        let (mut arena, [r, a, _, _]) = sample();
        let new_root = arena.set_root(NodeData::new("n", ""));
        assert!(!arena.contains(r));
        assert!(!arena.contains(a));
        assert_eq!(arena.root(), Some(new_root));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_node_data_flags() {
        let data = NodeData::new("n", "No").end("Bye");
        assert!(data.is_end_node);
        assert_eq!(data.end_message.as_deref(), Some("Bye"));
        assert_eq!(data.to_string(), "n: No");
        assert_eq!(NodeData::new("leaf", "").to_string(), "leaf");
    }
}

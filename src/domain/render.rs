use termtree::Tree;
use tracing::instrument;

use crate::domain::arena::TreeNode;
use crate::domain::tree::DecisionTree;

pub trait TreeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

fn label(node: &TreeNode) -> String {
    match (node.is_end_node(), node.data.end_message.as_deref()) {
        (true, Some(message)) => format!("{} [end: {}]", node.data, message),
        (true, None) => format!("{} [end]", node.data),
        _ => node.data.to_string(),
    }
}

impl TreeConvert for DecisionTree {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        self.fold(|node, leaves: Vec<Tree<String>>| {
            let mut tree = Tree::new(label(node));
            for leaf in leaves {
                tree.push(leaf);
            }
            tree
        })
        .unwrap_or_else(|| Tree::new("Empty tree".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::arena::NodeData;

    #[test]
    fn test_to_tree_string_marks_end_nodes() {
        let mut tree = DecisionTree::new();
        tree.set_root(NodeData::new("R", "Interested?"));
        tree.add_node("R", NodeData::new("Y", "Yes")).unwrap();
        tree.add_node("R", NodeData::new("N", "No").end("Bye")).unwrap();

        let rendered = tree.to_tree_string().to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "R: Interested?");
        assert!(lines[1].ends_with("Y: Yes"));
        assert!(lines[2].ends_with("N: No [end: Bye]"));
    }

    #[test]
    fn test_to_tree_string_keeps_sibling_order_below_root() {
        let mut tree = DecisionTree::new();
        tree.set_root(NodeData::new("r", ""));
        tree.add_node("r", NodeData::new("a", "")).unwrap();
        tree.add_node("a", NodeData::new("c", "")).unwrap();
        tree.add_node("r", NodeData::new("b", "")).unwrap();

        let rendered = tree.to_tree_string().to_string();
        let ids: Vec<&str> = rendered
            .lines()
            .map(|line| line.trim_start_matches(|c: char| !c.is_alphanumeric()))
            .collect();
        assert_eq!(ids, vec!["r", "a", "c", "b"]);
    }

    #[test]
    fn test_empty_tree_renders_placeholder() {
        assert_eq!(
            DecisionTree::new().to_tree_string().to_string().trim_end(),
            "Empty tree"
        );
    }
}

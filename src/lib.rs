//! Decision trees that are traversed one choice at a time.
//!
//! The [`domain::DecisionTree`] owns the node graph and the path of the
//! journey in progress. Rendering, form collection and confirmation are left
//! to callers: they read nodes through `Index` handles and send every change
//! through the tree's operations.
//!
//! ```
//! use dectree::domain::{DecisionTree, NodeData};
//!
//! let mut tree = DecisionTree::new();
//! tree.set_root(NodeData::new("R", "Interested?"));
//! tree.add_node("R", NodeData::new("Y", "Yes")).unwrap();
//! tree.add_node("R", NodeData::new("N", "No").end("Bye")).unwrap();
//!
//! tree.start_journey().unwrap();
//! let n = tree.navigate_to_child("N").unwrap();
//! assert_eq!(tree.data(n).unwrap().end_message.as_deref(), Some("Bye"));
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod util;

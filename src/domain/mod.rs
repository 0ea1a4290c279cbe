//! Domain layer: decision tree core
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod error;
pub mod record;
pub mod render;
pub mod tree;

pub use arena::{NodeData, TreeArena, TreeNode};
pub use error::{DomainError, TreeResult};
pub use record::NodeRecord;
pub use render::TreeConvert;
pub use tree::{DecisionTree, TreeOptions, TreeStats};

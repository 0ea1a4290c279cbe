//! Application layer: loading trees from files
//!
//! This layer feeds file contents into the domain and adds path context to failures.

pub mod error;
pub mod error_ext;
pub mod loader;

pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::{IoResultExt, TreeResultExt};
pub use loader::{load_tree, read_tree_file};

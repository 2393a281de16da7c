//! Tree traversal
//!
//! - domain: `Cursor` (frames + message channel) and `TreePath` snapshots
//! - ports: the `TreeVisitor` trait
//! - infrastructure: default descent that preserves identity of unchanged subtrees

pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use domain::{Cursor, TreePath};
pub use infrastructure::{visit_ref, visit_tree};
pub use ports::TreeVisitor;

pub mod cursor;
pub mod tree_path;

pub use cursor::Cursor;
pub use tree_path::TreePath;

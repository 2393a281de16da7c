pub mod block_splicer;
pub mod exception_scope;
pub mod import_set;
pub mod replace;

pub use block_splicer::BlockSplicer;
pub use exception_scope::ExceptionScope;
pub use import_set::{register_import, take_imports, ImportSet, IMPORTS_KEY};
pub use replace::{replace_all_in, replace_in};

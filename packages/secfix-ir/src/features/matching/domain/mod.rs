pub mod file_separator;
pub mod signature;
pub mod sink_models;

pub use file_separator::{ends_with_separator, is_file_separator};
pub use signature::{ArgPattern, MethodSignature, NamePattern, SignatureError, TypePattern};
pub use sink_models::{SinkModel, SinkTarget, CREATE_FILE_SINKS};

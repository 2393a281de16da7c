//! Call shape matching
//!
//! - domain: signature descriptors, sink models, separator recognition
//! - ports: the `ShapeMatcher` trait
//! - infrastructure: descriptor-backed default matcher

pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use domain::{MethodSignature, SignatureError, SinkModel, SinkTarget, CREATE_FILE_SINKS};
pub use infrastructure::SignatureMatcher;
pub use ports::ShapeMatcher;

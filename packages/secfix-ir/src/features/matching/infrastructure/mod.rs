pub mod signature_matcher;

pub use signature_matcher::SignatureMatcher;

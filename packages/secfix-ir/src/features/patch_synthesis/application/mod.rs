pub mod drain;

pub use drain::{drain_and_apply, record_fix, PatchSynthesizer};

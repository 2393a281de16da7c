pub mod local_flow;

pub use local_flow::LocalFlow;

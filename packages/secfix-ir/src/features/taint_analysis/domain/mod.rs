pub mod flow;
pub mod flow_state;

pub use flow::{FlowKind, FlowNode, Guard, SinkFlow};
pub use flow_state::FlowState;

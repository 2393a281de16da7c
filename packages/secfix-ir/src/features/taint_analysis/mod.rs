// Local taint-flow analysis
//
// Hexagonal Architecture:
// - domain: flow vocabulary (FlowKind, FlowNode, Guard, SinkFlow) and per-path FlowState
// - ports: the FlowSpec predicate triple
// - infrastructure: the LocalFlow engine

pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use domain::{FlowKind, FlowNode, FlowState, Guard, SinkFlow};
pub use infrastructure::LocalFlow;
pub use ports::{FlowSpec, FnFlowSpec};

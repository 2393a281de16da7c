//! Flow query vocabulary

use std::sync::Arc;

use crate::features::traversal::TreePath;
use crate::shared::models::Expression;

/// How values propagate through expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowKind {
    /// The same value: assignments, reads, parentheses, casts, ternary arms,
    /// for-each elements
    Value,
    /// Anything derived from the value: additionally string concatenation,
    /// call receivers and arguments into results
    Taint,
}

/// An expression together with the path it was found at
#[derive(Debug, Clone)]
pub struct FlowNode {
    pub expr: Arc<Expression>,
    pub path: TreePath,
}

impl FlowNode {
    pub fn new(expr: Arc<Expression>, path: TreePath) -> Self {
        Self { expr, path }
    }

    /// The node itself, cheaper than comparing paths
    pub fn is(&self, other: &Arc<Expression>) -> bool {
        Arc::ptr_eq(&self.expr, other)
    }
}

/// Atomic condition of an `if`, loop or ternary after decomposition through
/// `!`, `&&`, `||` and parentheses
#[derive(Debug, Clone)]
pub struct Guard {
    pub expression: Arc<Expression>,
    pub path: TreePath,
}

/// Result of one flow query
#[derive(Debug, Clone)]
pub struct SinkFlow {
    /// Path of the expression the query started at
    pub source: TreePath,

    /// Sinks reached, in discovery order
    pub sinks: Vec<FlowNode>,
}

impl SinkFlow {
    pub fn empty(source: TreePath) -> Self {
        Self {
            source,
            sinks: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn sink_expressions(&self) -> impl Iterator<Item = &Arc<Expression>> {
        self.sinks.iter().map(|s| &s.expr)
    }
}

//! Flow specification port
//!
//! A [`FlowSpec`] supplies the three predicates of one flow query. Predicates
//! are pure; the engine may call them any number of times in any order.

use super::domain::{FlowKind, FlowNode, Guard};

pub trait FlowSpec {
    fn kind(&self) -> FlowKind {
        FlowKind::Value
    }

    fn is_source(&self, node: &FlowNode) -> bool;

    fn is_sink(&self, node: &FlowNode) -> bool;

    /// `true` when taking `branch` of `guard` neutralizes the flowing value
    fn is_sanitizer_guard(&self, _guard: &Guard, _branch: bool) -> bool {
        false
    }
}

type Predicate<'a> = Box<dyn Fn(&FlowNode) -> bool + 'a>;
type GuardPredicate<'a> = Box<dyn Fn(&Guard, bool) -> bool + 'a>;

/// Flow specification assembled from closures
pub struct FnFlowSpec<'a> {
    kind: FlowKind,
    source: Predicate<'a>,
    sink: Predicate<'a>,
    sanitizer: Option<GuardPredicate<'a>>,
}

impl<'a> FnFlowSpec<'a> {
    pub fn new(
        kind: FlowKind,
        source: impl Fn(&FlowNode) -> bool + 'a,
        sink: impl Fn(&FlowNode) -> bool + 'a,
    ) -> Self {
        Self {
            kind,
            source: Box::new(source),
            sink: Box::new(sink),
            sanitizer: None,
        }
    }

    pub fn value(
        source: impl Fn(&FlowNode) -> bool + 'a,
        sink: impl Fn(&FlowNode) -> bool + 'a,
    ) -> Self {
        Self::new(FlowKind::Value, source, sink)
    }

    pub fn taint(
        source: impl Fn(&FlowNode) -> bool + 'a,
        sink: impl Fn(&FlowNode) -> bool + 'a,
    ) -> Self {
        Self::new(FlowKind::Taint, source, sink)
    }

    /// Builder: Set the sanitizer guard predicate
    pub fn sanitized_by(mut self, guard: impl Fn(&Guard, bool) -> bool + 'a) -> Self {
        self.sanitizer = Some(Box::new(guard));
        self
    }
}

impl FlowSpec for FnFlowSpec<'_> {
    fn kind(&self) -> FlowKind {
        self.kind
    }

    fn is_source(&self, node: &FlowNode) -> bool {
        (self.source)(node)
    }

    fn is_sink(&self, node: &FlowNode) -> bool {
        (self.sink)(node)
    }

    fn is_sanitizer_guard(&self, guard: &Guard, branch: bool) -> bool {
        self.sanitizer
            .as_ref()
            .map(|f| f(guard, branch))
            .unwrap_or(false)
    }
}

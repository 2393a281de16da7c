//! Shape matcher port
//!
//! Answers "is this call of shape S" for flow specifications and visitors.
//! The positional helpers are provided on top of [`ShapeMatcher::matches`].

use std::sync::Arc;

use super::domain::{MethodSignature, SinkModel, SinkTarget};
use crate::features::traversal::TreePath;
use crate::shared::models::{ExprKind, Expression};

pub trait ShapeMatcher: Send + Sync {
    /// `true` when `expr` is a call or instance creation matching `signature`
    fn matches(&self, expr: &Expression, signature: &MethodSignature) -> bool;

    fn matches_any(&self, expr: &Expression, signatures: &[MethodSignature]) -> bool {
        signatures.iter().any(|s| self.matches(expr, s))
    }

    /// The node at the end of `path` is argument `index` of a call matching `signature`
    fn is_argument_of(&self, path: &TreePath, signature: &MethodSignature, index: usize) -> bool {
        enclosing_call(path)
            .map(|(call, value)| {
                call.arguments()
                    .get(index)
                    .map(|arg| Arc::ptr_eq(arg, value))
                    .unwrap_or(false)
                    && self.matches(call, signature)
            })
            .unwrap_or(false)
    }

    /// The node at the end of `path` is the receiver of a call matching `signature`
    fn is_receiver_of(&self, path: &TreePath, signature: &MethodSignature) -> bool {
        enclosing_call(path)
            .map(|(call, value)| match &call.kind {
                ExprKind::MethodInvocation(m) => {
                    m.select
                        .as_ref()
                        .map(|s| Arc::ptr_eq(s, value))
                        .unwrap_or(false)
                        && self.matches(call, signature)
                }
                _ => false,
            })
            .unwrap_or(false)
    }

    /// The node at the end of `path` is the operand named by a sink model
    fn is_sink_of(&self, path: &TreePath, models: &[SinkModel]) -> bool {
        models.iter().any(|model| match model.target {
            SinkTarget::Argument(index) => self.is_argument_of(path, &model.signature, index),
            SinkTarget::Receiver => self.is_receiver_of(path, &model.signature),
        })
    }
}

/// Parent call of the path's value, skipping parentheses between them
fn enclosing_call(path: &TreePath) -> Option<(&Arc<Expression>, &Arc<Expression>)> {
    let nodes = path.nodes();
    let mut index = nodes.len().checked_sub(1)?;
    let mut value = nodes[index].as_expression()?;
    while index > 0 {
        let parent = nodes[index - 1].as_expression()?;
        match &parent.kind {
            ExprKind::Parens(_) => {
                value = parent;
                index -= 1;
            }
            ExprKind::MethodInvocation(_) | ExprKind::NewClass(_) => return Some((parent, value)),
            _ => return None,
        }
    }
    None
}


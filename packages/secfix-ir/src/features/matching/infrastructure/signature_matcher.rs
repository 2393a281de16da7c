/*
 * Signature Matcher
 *
 * Default ShapeMatcher: a call matches when its attributed method type
 * satisfies the parsed descriptor. Calls without attribution never match.
 */

use super::super::domain::MethodSignature;
use super::super::ports::ShapeMatcher;
use crate::shared::models::Expression;

#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureMatcher;

impl SignatureMatcher {
    pub fn new() -> Self {
        Self
    }
}

impl ShapeMatcher for SignatureMatcher {
    fn matches(&self, expr: &Expression, signature: &MethodSignature) -> bool {
        expr.method_type()
            .map(|method| signature.matches_method_type(method))
            .unwrap_or(false)
    }
}

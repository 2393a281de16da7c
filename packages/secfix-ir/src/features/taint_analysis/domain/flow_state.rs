//! Per-path local variable state

use rustc_hash::FxHashSet;

/// Locals carrying the flowing value on one control path
///
/// A local is live when it is tainted and no sanitizer guard on the path
/// covered it since it was last assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowState {
    tainted: FxHashSet<String>,
    sanitized: FxHashSet<String>,
}

impl FlowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_live(&self, name: &str) -> bool {
        self.tainted.contains(name) && !self.sanitized.contains(name)
    }

    pub fn is_tainted(&self, name: &str) -> bool {
        self.tainted.contains(name)
    }

    /// Assign a tainted value
    pub fn taint(&mut self, name: &str) {
        self.tainted.insert(name.to_string());
        self.sanitized.remove(name);
    }

    /// Assign a clean value
    pub fn clear(&mut self, name: &str) {
        self.tainted.remove(name);
        self.sanitized.remove(name);
    }

    pub fn assign(&mut self, name: &str, tainted: bool) {
        if tainted {
            self.taint(name);
        } else {
            self.clear(name);
        }
    }

    /// Cover a tainted local by a guard; clean locals are left alone
    pub fn sanitize(&mut self, name: &str) {
        if self.tainted.contains(name) {
            self.sanitized.insert(name.to_string());
        }
    }

    pub fn live_count(&self) -> usize {
        self.tainted
            .iter()
            .filter(|n| !self.sanitized.contains(*n))
            .count()
    }

    /// Join two paths: tainted sets union, and a local stays sanitized only
    /// when it is live on neither side
    pub fn join(&self, other: &FlowState) -> FlowState {
        let tainted: FxHashSet<String> = self.tainted.union(&other.tainted).cloned().collect();
        let sanitized = tainted
            .iter()
            .filter(|n| !self.is_live(n) && !other.is_live(n))
            .cloned()
            .collect();
        FlowState { tainted, sanitized }
    }

    /// Join of optional states; `None` is an unreachable path
    pub fn merge(a: Option<FlowState>, b: Option<FlowState>) -> Option<FlowState> {
        match (a, b) {
            (Some(a), Some(b)) => Some(a.join(&b)),
            (Some(s), None) | (None, Some(s)) => Some(s),
            (None, None) => None,
        }
    }
}

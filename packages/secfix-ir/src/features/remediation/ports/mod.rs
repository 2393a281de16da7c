//! Collaborators of a remediation pass
//!
//! Every vulnerability visitor gets the same bundle: the shape matcher it asks
//! "is this call of shape S", the flow limits for its local flow queries and
//! the synthesizer that commits recorded fixes when a block visit ends.

use std::sync::Arc;

use crate::config::FlowConfig;
use crate::errors::Result;
use crate::features::matching::{ShapeMatcher, SignatureMatcher};
use crate::features::patch_synthesis::PatchSynthesizer;
use crate::features::taint_analysis::LocalFlow;
use crate::features::traversal::{Cursor, TreePath, TreeVisitor};
use crate::shared::models::Block;

/// Visitor instantiated for one catalog entry
pub type RemediationVisitor = Box<dyn TreeVisitor>;

#[derive(Clone)]
pub struct PassServices {
    pub matcher: Arc<dyn ShapeMatcher>,
    pub synthesizer: Arc<PatchSynthesizer>,
    pub flow: FlowConfig,
}

impl PassServices {
    pub fn new(flow: FlowConfig) -> Self {
        Self {
            matcher: Arc::new(SignatureMatcher::new()),
            synthesizer: Arc::new(PatchSynthesizer::default()),
            flow,
        }
    }

    /// Builder: Set the shape matcher
    pub fn with_matcher(mut self, matcher: Arc<dyn ShapeMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Builder: Set the synthesizer
    pub fn with_synthesizer(mut self, synthesizer: Arc<PatchSynthesizer>) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    /// Flow query at `start` with the configured limits
    pub fn flow_from(&self, start: TreePath) -> LocalFlow {
        LocalFlow::starting_at(start).with_config(self.flow.clone())
    }

    /// Commit the fixes recorded on the cursor's block frame
    pub fn commit(&self, cursor: &mut Cursor, original: &Arc<Block>, current: Arc<Block>) -> Result<Arc<Block>> {
        self.synthesizer.drain_and_apply(cursor, original, current)
    }
}

impl Default for PassServices {
    fn default() -> Self {
        Self::new(FlowConfig::default())
    }
}

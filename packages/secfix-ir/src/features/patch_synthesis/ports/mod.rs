//! Patch synthesis ports
//!
//! The synthesizer renders fragments itself; placing them into a block and
//! collecting the imports they need are delegated to these two seams.

use std::sync::Arc;

use super::domain::Fragment;
use crate::errors::Result;
use crate::shared::models::{Block, Statement};

/// Where a fragment goes, relative to an anchor statement of the block
#[derive(Debug, Clone)]
pub enum Coordinate {
    Before(Arc<Statement>),
    After(Arc<Statement>),
    Replace(Arc<Statement>),
}

impl Coordinate {
    pub fn anchor(&self) -> &Arc<Statement> {
        match self {
            Self::Before(s) | Self::After(s) | Self::Replace(s) => s,
        }
    }
}

pub trait TemplateSplicer: Send + Sync {
    /// Insert `fragment` at `coordinate`, returning the rebuilt block.
    ///
    /// Fails when the anchor is not a statement of `block` or the fragment
    /// kind cannot go at that coordinate.
    fn splice(&self, block: &Arc<Block>, fragment: Fragment, coordinate: &Coordinate) -> Result<Arc<Block>>;
}

pub trait ImportRegistrar {
    /// Request `fqn` to be imported by the compilation unit
    fn maybe_add_import(&mut self, fqn: &str);
}

//! Transfer operations recorded between graphics passes.

use std::sync::Arc;

use crate::resources::Texture;

/// A copy-type operation.
#[derive(Debug, Clone)]
pub enum TransferOperation {
    /// Resolve a multisampled texture into a single-sampled one of the same
    /// size and format.
    Resolve {
        /// Multisampled source.
        src: Arc<Texture>,
        /// Single-sampled destination.
        dst: Arc<Texture>,
    },
}

impl TransferOperation {
    /// The texture this operation writes.
    pub fn destination(&self) -> &Arc<Texture> {
        match self {
            Self::Resolve { dst, .. } => dst,
        }
    }
}

/// A pass made of transfer operations only.
#[derive(Debug)]
pub struct TransferPass {
    name: String,
    operations: Vec<TransferOperation>,
}

impl TransferPass {
    /// Create a new empty transfer pass.
    pub fn new(name: String) -> Self {
        Self {
            name,
            operations: Vec::new(),
        }
    }

    /// Get the pass name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append an operation.
    pub fn add_operation(&mut self, operation: TransferOperation) {
        self.operations.push(operation);
    }

    /// Get the recorded operations.
    pub fn operations(&self) -> &[TransferOperation] {
        &self.operations
    }

    /// Check whether the pass has anything to do.
    pub fn has_transfers(&self) -> bool {
        !self.operations.is_empty()
    }
}

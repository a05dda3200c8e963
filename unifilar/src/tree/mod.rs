//! Tree operations and the two passes that keep derived data consistent:
//! circuit renumbering and pole propagation.
//!
//! Both passes mutate the panel in place and never create or delete
//! nodes. Re-run them after every structural edit; numbering follows the
//! physical order of the children, so reordering changes it.

pub mod labels;
pub mod numbering;
pub mod ops;
pub mod poles;

use thiserror::Error;

use crate::model::{DeviceKind, NodeId};

pub use numbering::recalculate_circuit_numbering;
pub use ops::{PreOrder, TreeOps};
pub use poles::{propagate_poles_from_main, PropagationOutcome};

/// Structural violations. These are programming errors and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("Node {id} ({kind}) cannot have children")]
    InvalidParent { id: NodeId, kind: DeviceKind },

    #[error("Operation on node {id} would create a cycle")]
    CycleDetected { id: NodeId },

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Duplicate node id: {0}")]
    DuplicateId(NodeId),
}

use thiserror::Error;

use crate::node::NodeId;

/// Structural errors raised by [`SceneTree`](crate::SceneTree) operations.
///
/// A failing operation leaves the tree exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("node {0:?} cannot be attached to itself")]
    SelfAttach(NodeId),

    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("node {0:?} does not exist")]
    MissingNode(NodeId),

    #[error("the root node cannot be reparented or destroyed")]
    RootNode,
}

pub type Result<T> = std::result::Result<T, SceneError>;

use std::fmt;

use vdom_core::NodeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A component node reached the live tree without being normalized.
    UnresolvedComponent { name: &'static str },
    Node(NodeError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::UnresolvedComponent { name } => {
                write!(f, "component `{name}` must be normalized before rendering")
            }
            RenderError::Node(err) => write!(f, "live tree error: {err}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Node(err) => Some(err),
            RenderError::UnresolvedComponent { .. } => None,
        }
    }
}

impl From<NodeError> for RenderError {
    fn from(err: NodeError) -> Self {
        RenderError::Node(err)
    }
}

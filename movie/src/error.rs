use network::{LinkID, NodeID};

/// Problems that make it impossible to render the movie at all. Nothing gets written when one of
/// these happens.
#[derive(Debug, thiserror::Error)]
pub enum MovieError {
    #[error("link {link} references unknown node {node}")]
    MissingNode { link: LinkID, node: NodeID },
    #[error("no nodes are loaded, so there's nowhere to anchor the movie's time window")]
    NoNodes,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

//! Routing error taxonomy.
//!
//! Every recursion level wraps the failure of its child with its own
//! rendered definition and the child's position, so the outermost error
//! describes the full path down to the offending node.

use std::fmt;
use thiserror::Error;

/// Error type returned by producers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Which kind of tree node an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Route,
    Router,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Route => f.write_str("route"),
            NodeKind::Router => f.write_str("router"),
        }
    }
}

/// The phase a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Resolve,
    Apply,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Resolve => f.write_str("resolve"),
            Stage::Apply => f.write_str("apply"),
        }
    }
}

/// Errors raised while resolving or applying a routing tree.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// A producer was required but absent.
    #[error("{0} resolve: absent producer")]
    AbsentProducer(NodeKind),

    /// A handler slot was absent.
    #[error("{node} resolve: nil handler at index {index} ({context})")]
    NilHandler {
        node: NodeKind,
        index: usize,
        context: String,
    },

    /// The producer itself reported a failure.
    #[error("{node} resolve: producer error ({context}): {source}")]
    Producer {
        node: NodeKind,
        context: String,
        source: BoxError,
    },

    /// Registration was attempted without an engine target.
    #[error("{node} apply: nil target ({context})")]
    NilTarget { node: NodeKind, context: String },

    /// A nested route or router failed.
    #[error("router {stage}: {child} error at index {index} ({context}): {source}")]
    Child {
        stage: Stage,
        child: NodeKind,
        index: usize,
        context: String,
        source: Box<RoutingError>,
    },

    /// Failure of one phase of a combined resolve-then-apply.
    #[error("{node} {stage} error: {source}")]
    Stage {
        node: NodeKind,
        stage: Stage,
        source: Box<RoutingError>,
    },
}

impl RoutingError {
    pub(crate) fn child(
        stage: Stage,
        child: NodeKind,
        index: usize,
        context: String,
        source: RoutingError,
    ) -> Self {
        RoutingError::Child {
            stage,
            child,
            index,
            context,
            source: Box::new(source),
        }
    }

    pub(crate) fn stage(node: NodeKind, stage: Stage, source: RoutingError) -> Self {
        RoutingError::Stage {
            node,
            stage,
            source: Box::new(source),
        }
    }

    /// The innermost error, past all child and stage wrappers.
    pub fn root_cause(&self) -> &RoutingError {
        let mut current = self;
        loop {
            match current {
                RoutingError::Child { source, .. } | RoutingError::Stage { source, .. } => {
                    current = source.as_ref();
                }
                other => return other,
            }
        }
    }

    /// Positions from the outermost router down to the failing node.
    pub fn child_path(&self) -> Vec<(NodeKind, usize)> {
        let mut path = Vec::new();
        let mut current = self;
        loop {
            match current {
                RoutingError::Child {
                    child,
                    index,
                    source,
                    ..
                } => {
                    path.push((*child, *index));
                    current = source.as_ref();
                }
                RoutingError::Stage { source, .. } => current = source.as_ref(),
                _ => return path,
            }
        }
    }

    /// The phase the failure occurred in.
    pub fn phase(&self) -> Stage {
        match self {
            RoutingError::Stage { stage, .. } | RoutingError::Child { stage, .. } => *stage,
            RoutingError::NilTarget { .. } => Stage::Apply,
            _ => Stage::Resolve,
        }
    }
}

//! Routing result types and error definitions.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable index of a node inside a route tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The implicit root every top-level registration hangs from.
    pub const ROOT: NodeId = NodeId(0);

    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors raised while building route trees or parsing locations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// A `:` segment without a parameter name.
    #[error("empty parameter name in pattern '{0}'")]
    EmptyParamName(String),

    /// The node id does not belong to this tree.
    #[error("unknown route node {0}")]
    UnknownNode(NodeId),

    /// A named parent route was not registered.
    #[error("route '{route}' references unknown parent '{parent}'")]
    UnknownParent { route: String, parent: String },

    /// Two routes share one name.
    #[error("duplicate route name '{0}'")]
    DuplicateName(String),

    /// The location could not be parsed as a URL or path.
    #[error("invalid location '{input}': {reason}")]
    InvalidLocation { input: String, reason: url::ParseError },
}

/// Result type for routing operations.
pub type RouteResult<T> = Result<T, RouteError>;

/// Outcome of testing one path against one route node.
///
/// `params` and `remainder` are only meaningful when `matched` is true; a
/// miss always carries empty values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMatch {
    /// Bound named segments.
    pub params: HashMap<String, String>,
    /// Unconsumed segments, `/`-prefixed, or empty when fully consumed.
    pub remainder: String,
    /// Whether the path matched.
    pub matched: bool,
}

impl RouteMatch {
    /// A successful match.
    pub fn hit(params: HashMap<String, String>, remainder: String) -> Self {
        Self {
            params,
            remainder,
            matched: true,
        }
    }

    /// A failed match.
    pub fn miss() -> Self {
        Self::default()
    }

    /// Look up a bound parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Split into the `(params, remainder, matched)` triple.
    pub fn into_parts(self) -> (HashMap<String, String>, String, bool) {
        (self.params, self.remainder, self.matched)
    }
}

/// Result of evaluating one terminal route during a resolve pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteOutcome {
    /// The terminal node evaluated.
    pub node: NodeId,
    /// Configured route name, if any.
    pub name: Option<String>,
    /// Full pattern from the root to the node, e.g. `/models/*/:id`.
    pub pattern: String,
    /// Match details.
    #[serde(flatten)]
    pub result: RouteMatch,
}

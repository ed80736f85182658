//! Route tree arena.
//!
//! # Responsibilities
//! - Own every route node in one arena addressed by `NodeId`
//! - Attach compiled pattern chains below a parent node
//! - Test a path against the chain leading to a node and its subtree
//!
//! # Design Decisions
//! - Nodes are appended, never removed; ids stay valid for the tree's lifetime
//! - Children keep insertion order and the first matching subtree wins
//! - Registering an equal pattern at the same position reuses the node

use std::collections::HashMap;

use crate::routing::matcher::{self, Pattern};
use crate::routing::types::{NodeId, RouteError, RouteMatch};

#[derive(Debug, Clone)]
struct NodeData {
    /// `None` only for the root.
    pattern: Option<Pattern>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    terminal: bool,
    name: Option<String>,
}

impl NodeData {
    fn is_endpoint(&self) -> bool {
        self.terminal || self.children.is_empty()
    }

    fn is_tail(&self) -> bool {
        self.pattern.as_ref().is_some_and(Pattern::is_tail)
    }
}

/// A successful walk: the endpoint reached plus what was bound on the way.
#[derive(Debug)]
struct Found {
    node: NodeId,
    params: HashMap<String, String>,
    remainder: String,
}

/// Arena holding a build-once, query-many route tree.
#[derive(Debug, Clone)]
pub struct RouteTree {
    nodes: Vec<NodeData>,
}

impl Default for RouteTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTree {
    /// Create a tree holding only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                pattern: None,
                parent: None,
                children: Vec::new(),
                terminal: false,
                name: None,
            }],
        }
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    fn data(&self, id: NodeId) -> Result<&NodeData, RouteError> {
        self.nodes.get(id.0).ok_or(RouteError::UnknownNode(id))
    }

    /// Compile `pattern` and attach it below `parent`, returning the leaf.
    ///
    /// An empty pattern returns `parent` itself, marked terminal.
    pub fn register(&mut self, parent: NodeId, pattern: &str) -> Result<NodeId, RouteError> {
        self.data(parent)?;
        let chain = matcher::parse_pattern(pattern)?;

        let mut current = parent;
        for pattern in chain {
            current = match self.find_child(current, &pattern) {
                Some(existing) => existing,
                None => self.push(current, pattern),
            };
        }
        self.nodes[current.0].terminal = true;
        Ok(current)
    }

    fn find_child(&self, parent: NodeId, pattern: &Pattern) -> Option<NodeId> {
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|child| self.nodes[child.0].pattern.as_ref() == Some(pattern))
    }

    fn push(&mut self, parent: NodeId, pattern: Pattern) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            pattern: Some(pattern),
            parent: Some(parent),
            children: Vec::new(),
            terminal: false,
            name: None,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Attach a name to a node.
    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> Result<(), RouteError> {
        self.data(id)?;
        self.nodes[id.0].name = Some(name.into());
        Ok(())
    }

    /// Borrow a node view.
    pub fn node(&self, id: NodeId) -> Result<RouteNode<'_>, RouteError> {
        self.data(id)?;
        Ok(RouteNode { tree: self, id })
    }

    /// Terminal nodes in registration order.
    pub fn terminals(&self) -> impl Iterator<Item = RouteNode<'_>> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, data)| data.terminal)
            .map(move |(i, _)| RouteNode {
                tree: self,
                id: NodeId(i),
            })
    }

    /// Patterns from the top-level ancestor down to `id`.
    fn chain(&self, id: NodeId) -> Vec<&Pattern> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let data = &self.nodes[current.0];
            if let Some(pattern) = &data.pattern {
                chain.push(pattern);
            }
            cursor = data.parent;
        }
        chain.reverse();
        chain
    }

    fn test_at(&self, id: NodeId, path: &str) -> Option<Found> {
        let segments = matcher::segments(path);
        let mut params = HashMap::new();
        let mut cursor = 0;

        // Ancestors are fixed; only the node's own subtree is searched.
        let mut ancestors = Vec::new();
        let mut up = self.nodes[id.0].parent;
        while let Some(current) = up {
            ancestors.push(current);
            up = self.nodes[current.0].parent;
        }
        for ancestor in ancestors.into_iter().rev() {
            if let Some(pattern) = &self.nodes[ancestor.0].pattern {
                cursor = pattern.step(&segments, cursor, &mut params)?;
            }
        }

        match &self.nodes[id.0].pattern {
            Some(_) => self.descend(id, &segments, cursor, &params),
            None => self.settle(id, &segments, cursor, &params),
        }
    }

    /// Match `id`'s own pattern, then settle whatever is left.
    fn descend(
        &self,
        id: NodeId,
        segments: &[&str],
        cursor: usize,
        params: &HashMap<String, String>,
    ) -> Option<Found> {
        let pattern = self.nodes[id.0].pattern.as_ref()?;
        let mut scoped = params.clone();
        let next = pattern.step(segments, cursor, &mut scoped)?;
        self.settle(id, segments, next, &scoped)
    }

    /// Finish a walk at `id` once its own pattern has been consumed.
    fn settle(
        &self,
        id: NodeId,
        segments: &[&str],
        cursor: usize,
        params: &HashMap<String, String>,
    ) -> Option<Found> {
        let data = &self.nodes[id.0];
        if cursor == segments.len() && data.is_endpoint() {
            return Some(Found {
                node: id,
                params: params.clone(),
                remainder: String::new(),
            });
        }

        for &child in &data.children {
            if let Some(found) = self.descend(child, segments, cursor, params) {
                return Some(found);
            }
        }

        if data.is_tail() {
            return Some(Found {
                node: id,
                params: params.clone(),
                remainder: matcher::remainder(&segments[cursor..]),
            });
        }
        None
    }
}

/// Borrowed view of one node in a [`RouteTree`].
#[derive(Debug, Clone, Copy)]
pub struct RouteNode<'a> {
    tree: &'a RouteTree,
    id: NodeId,
}

impl<'a> RouteNode<'a> {
    /// Arena id of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    fn data(&self) -> &'a NodeData {
        &self.tree.nodes[self.id.0]
    }

    /// The node's own pattern; `None` for the root.
    pub fn pattern(&self) -> Option<&'a Pattern> {
        self.data().pattern.as_ref()
    }

    /// Configured name, if any.
    pub fn name(&self) -> Option<&'a str> {
        self.data().name.as_deref()
    }

    /// Whether a registration ended at this node.
    pub fn is_terminal(&self) -> bool {
        self.data().terminal
    }

    /// Parent node, `None` for the root.
    pub fn parent(&self) -> Option<RouteNode<'a>> {
        self.data().parent.map(|id| RouteNode { tree: self.tree, id })
    }

    /// Children in registration order.
    pub fn children(&self) -> impl Iterator<Item = RouteNode<'a>> + 'a {
        let tree = self.tree;
        self.data()
            .children
            .iter()
            .map(move |&id| RouteNode { tree, id })
    }

    /// Canonical pattern from the root down to this node.
    pub fn full_pattern(&self) -> String {
        matcher::render(&self.tree.chain(self.id))
    }

    /// Test a path against this node's chain and subtree.
    pub fn test(&self, path: &str) -> RouteMatch {
        match self.tree.test_at(self.id, path) {
            Some(found) => RouteMatch::hit(found.params, found.remainder),
            None => RouteMatch::miss(),
        }
    }

    /// Like [`test`](Self::test), also reporting which endpoint was reached.
    pub fn locate(&self, path: &str) -> Option<(NodeId, RouteMatch)> {
        self.tree
            .test_at(self.id, path)
            .map(|found| (found.node, RouteMatch::hit(found.params, found.remainder)))
    }
}

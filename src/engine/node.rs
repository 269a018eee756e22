//! Parse tree storage.
//!
//! Nodes live in a single arena owned by the `ParseTree`. Child lists are
//! ordered vectors of `NodeId`s (the only ownership edges); `parent` is a plain
//! index back into the same arena, so there are no reference cycles.
//!
//! Nodes created for a failed alternative stay allocated but become
//! unreachable from the root; every query here walks from a given node
//! downwards, so unreachable nodes never affect results.
//!
//! All subtree queries use an explicit stack: grammar nesting (and therefore
//! tree depth) is bounded only by the recursion guard, not by the native stack.

use super::expected::ExpectedSet;
use crate::{BLANK, Grammar};
use la_arena::{Arena, Idx};
use std::ops::{Index, IndexMut, Range};

pub type NodeId = Idx<NodeData>;

bitflags::bitflags! {
    /// Per-node state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// The node's own grammar reported a match.
        const MATCHED   = 1 << 0;
        /// Wrapper created by a named grammar or literal; removed by normalization.
        const TRANSIENT = 1 << 1;
        /// Literal wrapper; renamed to `TERMINAL` instead of being spliced away.
        const LITERAL   = 1 << 2;
        /// Already handed to the compiler by the walker.
        const CONSUMED  = 1 << 3;
    }
}

/// One attempt to match a named production at a position.
#[derive(Clone)]
pub struct NodeData {
    pub(crate) name: &'static str,
    pub(crate) parent: Option<NodeId>,
    pub(crate) start: usize,
    /// Cursor; advances only while this node's grammar matches.
    pub(crate) point: usize,
    pub(crate) children: Vec<NodeId>,
    /// `None` when the name resolved in no registry tier.
    pub(crate) grammar: Option<Grammar>,
    pub(crate) literal: Option<String>,
    pub(crate) syntax: Option<&'static str>,
    pub(crate) flags: NodeFlags,
    pub(crate) expected: ExpectedSet,
    pub(crate) consumed_children: usize,
}

impl NodeData {
    pub(crate) fn new(
        name: &'static str,
        parent: Option<NodeId>,
        start: usize,
        grammar: Option<Grammar>,
        flags: NodeFlags,
        syntax: Option<&'static str>,
    ) -> Self {
        Self {
            name,
            parent,
            start,
            point: start,
            children: Vec::new(),
            grammar,
            literal: None,
            syntax,
            flags,
            expected: ExpectedSet::default(),
            consumed_children: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn point(&self) -> usize {
        self.point
    }

    pub fn literal(&self) -> Option<&str> {
        self.literal.as_deref()
    }

    /// Syntax description attached by a named grammar or literal.
    pub fn syntax(&self) -> Option<&'static str> {
        self.syntax
    }

    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    pub fn is_transient(&self) -> bool {
        self.flags.contains(NodeFlags::TRANSIENT)
    }

    pub fn is_consumed(&self) -> bool {
        self.flags.contains(NodeFlags::CONSUMED)
    }

    pub fn consumed_children(&self) -> usize {
        self.consumed_children
    }

    /// Diagnostics recorded directly on this node (children excluded).
    pub fn own_expected(&self) -> &ExpectedSet {
        &self.expected
    }
}

impl std::fmt::Debug for NodeData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeData")
            .field("name", &self.name)
            .field("span", &(self.start..self.point))
            .field("children", &self.children.len())
            .field("grammar", &self.grammar.map(|_| "<function>"))
            .field("literal", &self.literal)
            .field("flags", &self.flags)
            .finish()
    }
}

/// Arena-backed parse tree.
#[derive(Debug, Clone)]
pub struct ParseTree {
    nodes: Arena<NodeData>,
    root: NodeId,
}

impl ParseTree {
    pub(crate) fn new(root: NodeData) -> Self {
        let mut nodes = Arena::new();
        let root = nodes.alloc(root);
        Self { nodes, root }
    }

    pub(crate) fn alloc(&mut self, data: NodeData) -> NodeId {
        self.nodes.alloc(data)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { tree: self, id }
    }

    pub fn root_node(&self) -> NodeRef<'_> {
        self.node(self.root)
    }

    /// Number of nodes ever allocated, including discarded attempts.
    pub fn allocated(&self) -> usize {
        self.nodes.len()
    }

    /// `id` followed by all of its descendants, depth-first, left to right.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self[next].children.iter().rev().copied());
        }
        out
    }

    /// A node is valid when its own match succeeded and every descendant is valid.
    pub fn is_valid(&self, id: NodeId) -> bool {
        self.descendants(id).into_iter().all(|n| self[n].flags.contains(NodeFlags::MATCHED))
    }

    /// Own literal followed by each child's value, in order.
    pub fn value(&self, id: NodeId) -> String {
        let mut value = String::new();
        for n in self.descendants(id) {
            if let Some(literal) = &self[n].literal {
                value.push_str(literal);
            }
        }
        value
    }

    /// Furthest cursor position reached in the subtree.
    pub fn end(&self, id: NodeId) -> usize {
        self.descendants(id).into_iter().map(|n| self[n].point).max().unwrap_or(self[id].point)
    }

    /// Count of non-empty matched nodes in the subtree: every node weighs 1
    /// except the `BLANK` sentinel.
    pub fn weight(&self, id: NodeId) -> usize {
        self.descendants(id).into_iter().filter(|&n| self[n].name != BLANK).count()
    }

    /// Diagnostics of the whole subtree, merged.
    pub fn expected(&self, id: NodeId) -> ExpectedSet {
        let mut expected = ExpectedSet::default();
        for n in self.descendants(id) {
            expected.merge(&self[n].expected);
        }
        expected
    }

    /// First descendant of `id` named `name`, depth-first.
    pub fn find_child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(id).into_iter().skip(1).find(|&n| self[n].name == name)
    }

    /// Nearest strict ancestor of `id` named `name`.
    pub fn find_ancestor(&self, id: NodeId, name: &str) -> Option<NodeId> {
        let mut cursor = self[id].parent;
        while let Some(parent) = cursor {
            if self[parent].name == name {
                return Some(parent);
            }
            cursor = self[parent].parent;
        }
        None
    }
}

impl Index<NodeId> for ParseTree {
    type Output = NodeData;

    fn index(&self, id: NodeId) -> &NodeData {
        &self.nodes[id]
    }
}

impl IndexMut<NodeId> for ParseTree {
    fn index_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id]
    }
}

/// Read-only view of one node with tree navigation.
#[derive(Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t ParseTree,
    id: NodeId,
}

impl<'t> NodeRef<'t> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn data(&self) -> &'t NodeData {
        &self.tree[self.id]
    }

    pub fn name(&self) -> &'static str {
        self.data().name
    }

    /// The lexeme this node consumed.
    pub fn value(&self) -> String {
        self.tree.value(self.id)
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'t>> + 't {
        let tree = self.tree;
        self.data().children.iter().map(move |&id| NodeRef { tree, id })
    }

    pub fn child_count(&self) -> usize {
        self.data().children.len()
    }

    pub fn parent(&self) -> Option<NodeRef<'t>> {
        self.data().parent.map(|id| NodeRef { tree: self.tree, id })
    }

    /// First descendant named `name`.
    pub fn child(&self, name: &str) -> Option<NodeRef<'t>> {
        self.tree.find_child(self.id, name).map(|id| NodeRef { tree: self.tree, id })
    }

    /// Nearest ancestor named `name`.
    pub fn ancestor(&self, name: &str) -> Option<NodeRef<'t>> {
        self.tree.find_ancestor(self.id, name).map(|id| NodeRef { tree: self.tree, id })
    }

    pub fn is_valid(&self) -> bool {
        self.tree.is_valid(self.id)
    }

    pub fn start(&self) -> usize {
        self.data().start
    }

    pub fn end(&self) -> usize {
        self.tree.end(self.id)
    }

    pub fn span(&self) -> Range<usize> {
        self.start()..self.end()
    }

    pub fn weight(&self) -> usize {
        self.tree.weight(self.id)
    }

    pub fn expected(&self) -> ExpectedSet {
        self.tree.expected(self.id)
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef").field("name", &self.name()).field("span", &self.span()).finish()
    }
}

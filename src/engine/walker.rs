//! Post-order traversal of a normalized tree.
//!
//! The walker owns the tree and a cursor (`current`, the last node eaten).
//! Order is post-order, left to right:
//!
//! ```text
//!          S
//!        /   \
//!       A     D          first node of a subtree: follow first children
//!      / \    |          node after X: first node of X's next sibling,
//!     a   b   d          otherwise X's parent
//!
//! order: a b A d D S
//! ```
//!
//! Each `eat` marks the node consumed, bumps its parent's consumed-child count
//! and hands the node to the [`Compiler`]. The compiler receives the walker
//! itself, so it can look ahead (`peek`, `read`) or pull nodes forward
//! (`eat`, `consume`) from inside its callback. Running off the end is not an
//! error: the walker keeps answering `None` and no callback fires.

use super::debug_enabled;
use super::node::{NodeFlags, NodeId, NodeRef, ParseTree};

/// Semantic callback driven by a [`Walker`].
///
/// `language` is the identifier of the language the tree was parsed with;
/// `data` is an opaque per-traversal object owned by the caller.
pub trait Compiler {
    type Data;

    fn trigger(&mut self, language: &str, node: NodeId, data: &mut Self::Data, walker: &mut Walker);
}

/// Traversal session over a normalized [`ParseTree`].
#[derive(Debug, Clone)]
pub struct Walker {
    tree: ParseTree,
    language: &'static str,
    current: Option<NodeId>,
}

impl Walker {
    pub fn new(tree: ParseTree, language: &'static str) -> Self {
        Self { tree, language, current: None }
    }

    /// Advance to the next node, hand it to `compiler`, and return it.
    pub fn eat<C: Compiler + ?Sized>(&mut self, compiler: &mut C, data: &mut C::Data) -> Option<NodeId> {
        let id = self.advance()?;
        compiler.trigger(self.language, id, data, self);
        Some(id)
    }

    /// Advance to the next node and mark it consumed without triggering the
    /// compiler.
    pub fn skip(&mut self) -> Option<NodeId> {
        self.advance()
    }

    /// Eat every remaining node; returns how many were eaten.
    pub fn execute<C: Compiler + ?Sized>(&mut self, compiler: &mut C, data: &mut C::Data) -> usize {
        let mut eaten = 0;
        while self.eat(compiler, data).is_some() {
            eaten += 1;
        }
        eaten
    }

    /// Eat nodes until one named `stop` has been eaten, and return it.
    /// Returns `None` when traversal ends first.
    pub fn consume<C: Compiler + ?Sized>(
        &mut self,
        stop: &str,
        compiler: &mut C,
        data: &mut C::Data,
    ) -> Option<NodeId> {
        loop {
            let id = self.eat(compiler, data)?;
            if self.tree[id].name == stop {
                return Some(id);
            }
        }
    }

    /// The node the next `eat` would return.
    pub fn peek(&self) -> Option<NodeId> {
        self.next_after(self.current)
    }

    /// First upcoming node named `stop`, without moving the walker.
    pub fn read(&self, stop: &str) -> Option<NodeId> {
        let mut cursor = self.current;
        loop {
            let next = self.next_after(cursor)?;
            if self.tree[next].name == stop {
                return Some(next);
            }
            cursor = Some(next);
        }
    }

    /// First descendant of `node` named `name`, depth-first.
    pub fn child(&self, node: NodeId, name: &str) -> Option<NodeId> {
        self.tree.find_child(node, name)
    }

    /// Nearest strict ancestor of `node` named `name`.
    pub fn parent(&self, node: NodeId, name: &str) -> Option<NodeId> {
        self.tree.find_ancestor(node, name)
    }

    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        self.tree.node(id)
    }

    /// Last node eaten, or `None` before traversal starts.
    pub fn current(&self) -> Option<NodeId> {
        self.current
    }

    pub fn tree(&self) -> &ParseTree {
        &self.tree
    }

    pub fn language(&self) -> &'static str {
        self.language
    }

    pub fn into_tree(self) -> ParseTree {
        self.tree
    }

    fn advance(&mut self) -> Option<NodeId> {
        let id = self.peek()?;
        self.current = Some(id);
        self.tree[id].flags.insert(NodeFlags::CONSUMED);
        if let Some(parent) = self.tree[id].parent {
            self.tree[parent].consumed_children += 1;
        }
        if debug_enabled() {
            let data = &self.tree[id];
            eprintln!("[walk:eat] node=\"{}\" span={}..{}", data.name, data.start, data.point);
        }
        Some(id)
    }

    fn next_after(&self, cursor: Option<NodeId>) -> Option<NodeId> {
        match cursor {
            None => Some(first_leaf(&self.tree, self.tree.root())),
            Some(id) => after(&self.tree, id),
        }
    }
}

/// Descend through first children until a childless node is found.
fn first_leaf(tree: &ParseTree, mut id: NodeId) -> NodeId {
    while let Some(&first) = tree[id].children.first() {
        id = first;
    }
    id
}

/// Post-order successor of `id`.
fn after(tree: &ParseTree, id: NodeId) -> Option<NodeId> {
    let parent = tree[id].parent?;
    let siblings = &tree[parent].children;
    match siblings.iter().position(|&s| s == id) {
        Some(pos) if pos + 1 < siblings.len() => Some(first_leaf(tree, siblings[pos + 1])),
        _ => Some(parent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::node::NodeData;

    struct Recorder;

    impl Compiler for Recorder {
        type Data = Vec<(String, &'static str)>;

        fn trigger(&mut self, language: &str, node: NodeId, data: &mut Self::Data, walker: &mut Walker) {
            data.push((language.to_string(), walker.node(node).name()));
        }
    }

    /// S(A(a, b), D(d))
    fn sample() -> (ParseTree, Vec<NodeId>) {
        let mut tree = ParseTree::new(NodeData::new("S", None, 0, None, NodeFlags::MATCHED, None));
        let mut ids = vec![tree.root()];
        for (name, parent) in [("A", 0), ("a", 1), ("b", 1), ("D", 0), ("d", 4)] {
            let parent = ids[parent];
            let id = tree.alloc(NodeData::new(name, Some(parent), 0, None, NodeFlags::MATCHED, None));
            tree[parent].children.push(id);
            ids.push(id);
        }
        (tree, ids)
    }

    fn names(walker: &Walker, ids: &[NodeId]) -> Vec<&'static str> {
        ids.iter().map(|&id| walker.node(id).name()).collect()
    }

    #[test]
    fn execute_visits_every_node_in_post_order() {
        let (tree, _) = sample();
        let mut walker = Walker::new(tree, "test");
        let mut seen = Vec::new();

        let eaten = walker.execute(&mut Recorder, &mut seen);

        assert_eq!(eaten, 6);
        let order: Vec<_> = seen.iter().map(|(_, name)| *name).collect();
        assert_eq!(order, vec!["a", "b", "A", "d", "D", "S"]);
        assert!(seen.iter().all(|(language, _)| language == "test"));
        assert!(walker.tree().descendants(walker.tree().root()).iter().all(|&id| walker.tree()[id].is_consumed()));
    }

    #[test]
    fn exhausted_walker_returns_none_without_triggering() {
        let (tree, _) = sample();
        let mut walker = Walker::new(tree, "test");
        let mut seen = Vec::new();
        walker.execute(&mut Recorder, &mut seen);

        assert_eq!(walker.eat(&mut Recorder, &mut seen), None);
        assert_eq!(walker.eat(&mut Recorder, &mut seen), None);
        assert_eq!(seen.len(), 6);
        assert_eq!(walker.current(), Some(walker.tree().root()));
    }

    #[test]
    fn consume_stops_after_the_named_node() {
        let (tree, ids) = sample();
        let mut walker = Walker::new(tree, "test");
        let mut seen = Vec::new();

        let stop = walker.consume("A", &mut Recorder, &mut seen);

        assert_eq!(stop, Some(ids[1]));
        assert_eq!(seen.len(), 3);
        assert_eq!(walker.tree()[ids[0]].consumed_children(), 1);
        assert_eq!(walker.consume("missing", &mut Recorder, &mut seen), None);
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn peek_and_read_do_not_move_the_walker() {
        let (tree, ids) = sample();
        let mut walker = Walker::new(tree, "test");

        assert_eq!(walker.read("D"), Some(ids[4]));
        assert_eq!(walker.peek(), Some(ids[2]));
        assert_eq!(walker.current(), None);
        assert!(!walker.tree()[ids[2]].is_consumed());

        walker.skip();
        walker.skip();
        assert_eq!(names(&walker, &[walker.peek().unwrap()]), vec!["A"]);
        assert_eq!(walker.read("a"), None);
        assert_eq!(walker.read("S"), Some(ids[0]));
        assert_eq!(walker.current(), Some(ids[3]));
    }

    #[test]
    fn lookups_search_down_and_up() {
        let (tree, ids) = sample();
        let walker = Walker::new(tree, "test");

        assert_eq!(walker.child(ids[0], "d"), Some(ids[5]));
        assert_eq!(walker.child(ids[1], "d"), None);
        assert_eq!(walker.parent(ids[5], "S"), Some(ids[0]));
        assert_eq!(walker.parent(ids[0], "S"), None);
    }

    #[test]
    fn compiler_can_pull_nodes_from_inside_its_callback() {
        struct Grouping;

        impl Compiler for Grouping {
            type Data = Vec<Vec<&'static str>>;

            fn trigger(&mut self, _: &str, node: NodeId, data: &mut Self::Data, walker: &mut Walker) {
                if walker.node(node).name() != "a" {
                    return;
                }
                let mut group = vec!["a"];
                while let Some(next) = walker.skip() {
                    group.push(walker.node(next).name());
                    if walker.node(next).name() == "A" {
                        break;
                    }
                }
                data.push(group);
            }
        }

        let (tree, _) = sample();
        let mut walker = Walker::new(tree, "test");
        let mut groups = Vec::new();
        walker.execute(&mut Grouping, &mut groups);

        assert_eq!(groups, vec![vec!["a", "b", "A"]]);
    }
}

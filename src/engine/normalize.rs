//! Tree normalization.
//!
//! The raw tree carries a transient wrapper node for every named-grammar and
//! literal invocation. This pass, run once after evaluation, shapes it into
//! the tree handed to the walker:
//!
//! ```text
//! raw                                 normalized
//! ASSIGNMENT                          ASSIGNMENT
//! ├─ VARIABLE                         ├─ VARIABLE
//! ├─ LITERAL  (transient, literal)    ├─ TERMINAL "="
//! └─ EXPRESSION_TAIL (transient)      ├─ OPERATOR
//!    ├─ OPERATOR                      └─ TERM
//!    └─ TERM
//! ```
//!
//! Literal wrappers are renamed in place to `TERMINAL` and kept as leaves.
//! Every other transient child is replaced, in its parent's child list, by its
//! own children (reparented) and its literal is appended to the parent's.
//! A node is rescanned until no direct child is transient before the pass
//! descends into it, so one run leaves no transient node anywhere and a second
//! run changes nothing.

use super::debug_enabled;
use super::node::{NodeFlags, NodeId, ParseTree};
use crate::TERMINAL;

/// What a normalization pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    /// Wrapper nodes removed from the tree.
    pub spliced: usize,
    /// Literal wrappers renamed to `TERMINAL`.
    pub terminals: usize,
}

impl ParseTree {
    /// Collapse transient wrapper nodes in place, top-down from the root.
    pub fn normalize(&mut self) -> NormalizeStats {
        let mut stats = NormalizeStats::default();
        let mut stack = vec![self.root()];

        while let Some(id) = stack.pop() {
            let mut pos = 0;
            while let Some(&child) = self[id].children.get(pos) {
                if !self[child].is_transient() {
                    pos += 1;
                } else if self[child].flags.contains(NodeFlags::LITERAL) {
                    self.rename_terminal(child);
                    stats.terminals += 1;
                    pos += 1;
                } else {
                    self.splice(id, pos);
                    stats.spliced += 1;
                }
            }
            stack.extend(self[id].children.iter().rev().copied());
        }

        if debug_enabled() {
            eprintln!("[normalize] spliced={} terminals={}", stats.spliced, stats.terminals);
        }
        stats
    }

    fn rename_terminal(&mut self, id: NodeId) {
        let data = &mut self[id];
        data.name = TERMINAL;
        data.flags.remove(NodeFlags::TRANSIENT);
    }

    /// Replace the child at `pos` of `parent` with that child's children.
    fn splice(&mut self, parent: NodeId, pos: usize) {
        let wrapper = self[parent].children[pos];
        let grandchildren = std::mem::take(&mut self[wrapper].children);
        for &id in &grandchildren {
            self[id].parent = Some(parent);
        }
        if let Some(literal) = self[wrapper].literal.take() {
            self[parent].literal.get_or_insert_with(String::new).push_str(&literal);
        }
        self[wrapper].parent = None;
        self[parent].children.splice(pos..=pos, grandchildren);
    }

    /// Whether any node reachable from the root is still transient.
    pub fn has_transient(&self) -> bool {
        self.descendants(self.root()).into_iter().any(|id| self[id].is_transient())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::node::NodeData;

    fn node(name: &'static str, flags: NodeFlags) -> NodeData {
        NodeData::new(name, None, 0, None, flags, None)
    }

    fn attach(tree: &mut ParseTree, parent: NodeId, data: NodeData) -> NodeId {
        let id = tree.alloc(data);
        tree[id].parent = Some(parent);
        tree[parent].children.push(id);
        id
    }

    fn names(tree: &ParseTree, id: NodeId) -> Vec<&'static str> {
        tree[id].children.iter().map(|&c| tree[c].name).collect()
    }

    #[test]
    fn nested_wrappers_collapse_into_their_parent() {
        let mut tree = ParseTree::new(node("ROOT", NodeFlags::MATCHED));
        let root = tree.root();
        let outer = attach(&mut tree, root, node("OUTER", NodeFlags::TRANSIENT));
        let inner = attach(&mut tree, outer, node("INNER", NodeFlags::TRANSIENT));
        attach(&mut tree, inner, node("A", NodeFlags::MATCHED));
        attach(&mut tree, outer, node("B", NodeFlags::MATCHED));
        attach(&mut tree, root, node("C", NodeFlags::MATCHED));

        let stats = tree.normalize();

        assert_eq!(names(&tree, root), vec!["A", "B", "C"]);
        assert_eq!(stats, NormalizeStats { spliced: 2, terminals: 0 });
        for &child in tree[root].children() {
            assert_eq!(tree[child].parent(), Some(root));
        }
    }

    #[test]
    fn literal_wrappers_become_terminals() {
        let mut tree = ParseTree::new(node("ROOT", NodeFlags::MATCHED));
        let root = tree.root();
        let wrapper = attach(&mut tree, root, node("WRAP", NodeFlags::TRANSIENT));
        let literal = attach(&mut tree, wrapper, node(crate::LITERAL, NodeFlags::TRANSIENT | NodeFlags::LITERAL));
        tree[literal].literal = Some("=".to_string());

        tree.normalize();

        assert_eq!(names(&tree, root), vec![TERMINAL]);
        assert!(!tree[literal].is_transient());
        assert_eq!(tree.value(root), "=");
    }

    #[test]
    fn spliced_literal_moves_to_the_parent() {
        let mut tree = ParseTree::new(node("ROOT", NodeFlags::MATCHED));
        let root = tree.root();
        let wrapper = attach(&mut tree, root, node("NUMBER_WRAP", NodeFlags::TRANSIENT));
        tree[wrapper].literal = Some("42".to_string());

        tree.normalize();

        assert!(tree[root].children().is_empty());
        assert_eq!(tree[root].literal(), Some("42"));
    }

    #[test]
    fn second_pass_changes_nothing() {
        let mut tree = ParseTree::new(node("ROOT", NodeFlags::MATCHED));
        let root = tree.root();
        let wrapper = attach(&mut tree, root, node("WRAP", NodeFlags::TRANSIENT));
        let keep = attach(&mut tree, wrapper, node("KEEP", NodeFlags::MATCHED));
        attach(&mut tree, keep, node("DEEP", NodeFlags::TRANSIENT));

        tree.normalize();
        assert!(!tree.has_transient());

        let before = names(&tree, root);
        assert_eq!(tree.normalize(), NormalizeStats::default());
        assert_eq!(names(&tree, root), before);
    }
}

//! Traversal and structural edits over a forest of device trees.
//!
//! Pre-order (node first, then children in array order, depth first) is
//! the ordering contract every other pass relies on. Children are never
//! sorted or reordered here.

use std::collections::HashSet;

use super::TreeError;
use crate::model::{DeviceNode, NodeId};

/// Depth-first pre-order iterator.
pub struct PreOrder<'a> {
    stack: Vec<&'a DeviceNode>,
}

impl<'a> PreOrder<'a> {
    pub fn new(roots: &'a [DeviceNode]) -> Self {
        Self {
            stack: roots.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a DeviceNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

impl DeviceNode {
    /// Append `child` as the last child of this node.
    pub fn insert_child(&mut self, child: DeviceNode) -> Result<(), TreeError> {
        if self.is_final() {
            return Err(TreeError::InvalidParent {
                id: self.id.clone(),
                kind: self.kind,
            });
        }
        self.children_mut().push(child);
        Ok(())
    }

    /// Pre-order walk of this subtree, starting with `self`.
    pub fn iter_pre_order(&self) -> PreOrder<'_> {
        PreOrder::new(std::slice::from_ref(self))
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.iter_pre_order().any(|n| &n.id == id)
    }
}

fn walk(node: &DeviceNode, visit: &mut dyn FnMut(&DeviceNode)) {
    visit(node);
    for child in node.children() {
        walk(child, visit);
    }
}

fn find_in_mut<'a>(nodes: &'a mut [DeviceNode], id: &NodeId) -> Option<&'a mut DeviceNode> {
    for node in nodes.iter_mut() {
        if &node.id == id {
            return Some(node);
        }
        if let Some(found) = find_in_mut(node.children_mut(), id) {
            return Some(found);
        }
    }
    None
}

fn remove_from(nodes: &mut Vec<DeviceNode>, id: &NodeId) -> Option<DeviceNode> {
    if let Some(pos) = nodes.iter().position(|n| &n.id == id) {
        return Some(nodes.remove(pos));
    }
    nodes
        .iter_mut()
        .find_map(|node| remove_from(node.children_mut(), id))
}

fn subtree_depth(node: &DeviceNode) -> usize {
    1 + node.children().iter().map(subtree_depth).max().unwrap_or(0)
}

/// Operations over an ordered forest of device trees.
pub trait TreeOps {
    fn roots(&self) -> &[DeviceNode];

    fn roots_mut(&mut self) -> &mut Vec<DeviceNode>;

    /// Visit every node in pre-order.
    fn traverse_pre_order(&self, visit: &mut dyn FnMut(&DeviceNode)) {
        for root in self.roots() {
            walk(root, visit);
        }
    }

    fn iter_pre_order(&self) -> PreOrder<'_> {
        PreOrder::new(self.roots())
    }

    /// Final circuits in pre-order.
    fn final_circuits(&self) -> Vec<&DeviceNode> {
        self.iter_pre_order().filter(|n| n.is_final()).collect()
    }

    fn find(&self, id: &NodeId) -> Option<&DeviceNode> {
        self.iter_pre_order().find(|n| &n.id == id)
    }

    fn find_mut(&mut self, id: &NodeId) -> Option<&mut DeviceNode> {
        find_in_mut(self.roots_mut(), id)
    }

    fn contains(&self, id: &NodeId) -> bool {
        self.find(id).is_some()
    }

    /// Direct parent of `id`; `None` for roots and unknown ids.
    fn parent_of(&self, id: &NodeId) -> Option<&DeviceNode> {
        self.iter_pre_order()
            .find(|n| n.children().iter().any(|c| &c.id == id))
    }

    fn node_count(&self) -> usize {
        self.iter_pre_order().count()
    }

    /// Number of levels of the deepest tree; 0 for an empty forest.
    fn depth(&self) -> usize {
        self.roots().iter().map(subtree_depth).max().unwrap_or(0)
    }

    /// Append `node` (with its subtree) under `parent`.
    ///
    /// Fails without modifying the forest if the parent is missing or a
    /// final circuit, or if any id of the new subtree is already in use.
    fn insert_child(&mut self, parent: &NodeId, node: DeviceNode) -> Result<(), TreeError> {
        if node.contains(parent) {
            return Err(TreeError::CycleDetected { id: parent.clone() });
        }
        let mut incoming = HashSet::new();
        for n in node.iter_pre_order() {
            if !incoming.insert(&n.id) || self.contains(&n.id) {
                return Err(TreeError::DuplicateId(n.id.clone()));
            }
        }
        let target = self
            .find_mut(parent)
            .ok_or_else(|| TreeError::NodeNotFound(parent.clone()))?;
        target.insert_child(node)
    }

    /// Remove `id` and its entire subtree. Unknown ids are a no-op.
    fn delete_node(&mut self, id: &NodeId) -> Option<DeviceNode> {
        remove_from(self.roots_mut(), id)
    }

    /// Detach the subtree rooted at `id` and append it under `new_parent`.
    /// The forest is unchanged when an error is returned.
    fn move_node(&mut self, id: &NodeId, new_parent: &NodeId) -> Result<(), TreeError> {
        let node = self
            .find(id)
            .ok_or_else(|| TreeError::NodeNotFound(id.clone()))?;
        if node.contains(new_parent) {
            return Err(TreeError::CycleDetected { id: id.clone() });
        }
        let target = self
            .find(new_parent)
            .ok_or_else(|| TreeError::NodeNotFound(new_parent.clone()))?;
        if target.is_final() {
            return Err(TreeError::InvalidParent {
                id: target.id.clone(),
                kind: target.kind,
            });
        }

        let subtree = self
            .delete_node(id)
            .ok_or_else(|| TreeError::NodeNotFound(id.clone()))?;
        let target = self
            .find_mut(new_parent)
            .ok_or_else(|| TreeError::NodeNotFound(new_parent.clone()))?;
        target.insert_child(subtree)
    }
}

impl TreeOps for Vec<DeviceNode> {
    fn roots(&self) -> &[DeviceNode] {
        self
    }

    fn roots_mut(&mut self) -> &mut Vec<DeviceNode> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AmpRating, DeviceKind, Poles, Sensitivity, UsageCategory};

    fn amps(a: u16) -> AmpRating {
        AmpRating::new(a).unwrap()
    }

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    fn circuit(name: &str) -> DeviceNode {
        DeviceNode::final_circuit(name, Poles::Two, amps(10), UsageCategory::Lighting)
    }

    /// iga
    /// ├── d1
    /// │   ├── b1 ── c1
    /// │   └── b2 ── c2
    /// └── d2
    ///     └── b3 ── c3
    fn sample_forest() -> Vec<DeviceNode> {
        let d1 = DeviceNode::differential("d1", Poles::Two, amps(40), Some(Sensitivity::Ma30))
            .with_child(DeviceNode::breaker("b1", Poles::Two, amps(10)).with_child(circuit("c1")))
            .with_child(DeviceNode::breaker("b2", Poles::Two, amps(16)).with_child(circuit("c2")));
        let d2 = DeviceNode::differential("d2", Poles::Two, amps(40), Some(Sensitivity::Ma30))
            .with_child(DeviceNode::breaker("b3", Poles::Two, amps(20)).with_child(circuit("c3")));
        vec![DeviceNode::main_breaker("iga", Poles::Two, amps(40))
            .with_child(d1)
            .with_child(d2)]
    }

    fn ids(forest: &Vec<DeviceNode>) -> Vec<String> {
        forest.iter_pre_order().map(|n| n.id.to_string()).collect()
    }

    #[test]
    fn test_pre_order_matches_recursive_walk() {
        let forest = sample_forest();
        let mut visited = Vec::new();
        forest.traverse_pre_order(&mut |n| visited.push(n.id.to_string()));

        assert_eq!(
            visited,
            vec!["iga", "d1", "b1", "c1", "b2", "c2", "d2", "b3", "c3"]
        );
        assert_eq!(visited, ids(&forest));
    }

    #[test]
    fn test_insert_appends_last() {
        let mut forest = sample_forest();
        forest
            .insert_child(&id("b1"), circuit("c9"))
            .expect("breaker accepts children");

        let b1 = forest.find(&id("b1")).unwrap();
        let children: Vec<&str> = b1.children().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(children, vec!["c1", "c9"]);
    }

    #[test]
    fn test_insert_under_final_circuit_fails() {
        let mut forest = sample_forest();
        let err = forest.insert_child(&id("c1"), circuit("c9")).unwrap_err();
        assert_eq!(
            err,
            TreeError::InvalidParent {
                id: id("c1"),
                kind: DeviceKind::FinalCircuit
            }
        );
        assert_eq!(forest.node_count(), 9);
    }

    #[test]
    fn test_insert_rejects_duplicates_and_unknown_parent() {
        let mut forest = sample_forest();
        assert_eq!(
            forest.insert_child(&id("b1"), circuit("c2")),
            Err(TreeError::DuplicateId(id("c2")))
        );
        assert_eq!(
            forest.insert_child(&id("nope"), circuit("c9")),
            Err(TreeError::NodeNotFound(id("nope")))
        );
    }

    #[test]
    fn test_insert_subtree_containing_parent_is_cycle() {
        let mut forest = sample_forest();
        let looped = DeviceNode::breaker("b1", Poles::Two, amps(10));
        assert_eq!(
            forest.insert_child(&id("b1"), looped),
            Err(TreeError::CycleDetected { id: id("b1") })
        );
    }

    #[test]
    fn test_delete_cascades_and_is_idempotent() {
        let mut forest = sample_forest();
        let removed = forest.delete_node(&id("d1")).expect("d1 exists");
        assert_eq!(removed.iter_pre_order().count(), 5);
        assert_eq!(ids(&forest), vec!["iga", "d2", "b3", "c3"]);

        assert!(forest.delete_node(&id("d1")).is_none());
        assert!(forest.delete_node(&id("unknown")).is_none());
        assert_eq!(forest.node_count(), 4);
    }

    #[test]
    fn test_delete_root() {
        let mut forest = sample_forest();
        forest.delete_node(&id("iga"));
        assert!(forest.is_empty());
        assert_eq!(forest.depth(), 0);
    }

    #[test]
    fn test_move_node() {
        let mut forest = sample_forest();
        forest.move_node(&id("b3"), &id("d1")).unwrap();
        assert_eq!(
            ids(&forest),
            vec!["iga", "d1", "b1", "c1", "b2", "c2", "b3", "c3", "d2"]
        );
        assert_eq!(forest.parent_of(&id("b3")).unwrap().id.as_str(), "d1");
    }

    #[test]
    fn test_move_into_own_subtree_is_cycle() {
        let mut forest = sample_forest();
        let before = forest.clone();

        assert_eq!(
            forest.move_node(&id("d1"), &id("b2")),
            Err(TreeError::CycleDetected { id: id("d1") })
        );
        assert_eq!(
            forest.move_node(&id("d1"), &id("d1")),
            Err(TreeError::CycleDetected { id: id("d1") })
        );
        assert!(matches!(
            forest.move_node(&id("b1"), &id("c2")),
            Err(TreeError::InvalidParent { .. })
        ));
        assert_eq!(forest, before);
    }

    #[test]
    fn test_queries() {
        let forest = sample_forest();
        assert_eq!(forest.depth(), 4);
        assert_eq!(forest.final_circuits().len(), 3);
        assert!(forest.parent_of(&id("iga")).is_none());
        assert_eq!(forest.parent_of(&id("c3")).unwrap().id.as_str(), "b3");
    }
}

//! Per-kind dispatch over process nodes.
//!
//! Code that treats each node kind differently (rendering, export, statistics) implements
//! [`Visitor`] and hands it to [`ProcessNode::visit`] or
//! [`ProcessModel::visit_nodes`](super::ProcessModel::visit_nodes).

use super::node::{Activity, JoinSplit, NodeKind, ProcessNode};

pub trait Visitor {
    type Output;

    fn visit_start_node(&mut self, node: &ProcessNode) -> Self::Output;

    fn visit_activity(&mut self, node: &ProcessNode, activity: &Activity) -> Self::Output;

    fn visit_split(&mut self, node: &ProcessNode, split: &JoinSplit) -> Self::Output;

    fn visit_join(&mut self, node: &ProcessNode, join: &JoinSplit) -> Self::Output;

    fn visit_end_node(&mut self, node: &ProcessNode) -> Self::Output;
}

impl ProcessNode {
    /// Calls the method of `visitor` matching the kind of this node.
    pub fn visit<V: Visitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        match self.kind() {
            NodeKind::Start => visitor.visit_start_node(self),
            NodeKind::Activity(activity) => visitor.visit_activity(self, activity),
            NodeKind::Split(split) => visitor.visit_split(self, split),
            NodeKind::Join(join) => visitor.visit_join(self, join),
            NodeKind::End => visitor.visit_end_node(self),
        }
    }
}

//! The process graph: nodes, their links and the model that owns them.
//!
//! A [`ProcessModel`] owns its nodes in an arena and hands out [`NodeKey`]s. Links
//! between nodes are stored on both ends as [`NodeRef`]s, and every link edit made through
//! the model updates both ends together or not at all. References that only carry an id
//! (read from XML, or recorded on a node before it joined the model) stay pending until
//! [`ProcessModel::resolve_refs`] links them.

pub mod data;
pub mod node;
pub mod visitor;

mod links;
mod normalize;
mod resolve;

pub use data::*;
pub use node::{Activity, Endpoint, JoinSplit, NodeKey, NodeKind, NodeRef, ProcessNode};
pub use normalize::{DefaultSplitFactory, SplitFactory};
pub use visitor::Visitor;

use crate::config::{FanOutPolicy, ModelConfig};
use crate::error::ModelError;
use ahash::{AHashMap, AHashSet};
use node::Side;
use std::collections::BTreeSet;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct ProcessModel {
    name: Option<String>,
    uuid: Option<Uuid>,
    owner: Option<String>,
    roles: BTreeSet<String>,
    imports: Vec<XmlResultType>,
    exports: Vec<XmlDefineType>,
    arena: Vec<Option<ProcessNode>>,
    index: AHashMap<String, NodeKey>,
    config: ModelConfig,
}

pub struct ProcessModelBuilder {
    name: Option<String>,
    uuid: Option<Uuid>,
    owner: Option<String>,
    roles: BTreeSet<String>,
    config: ModelConfig,
}

impl ProcessModelBuilder {
    pub fn new() -> Self {
        Self {
            name: None,
            uuid: None,
            owner: None,
            roles: BTreeSet::new(),
            config: ModelConfig::default(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = Some(uuid);
        self
    }

    /// Assigns a freshly generated random uuid.
    pub fn random_uuid(self) -> Self {
        self.uuid(Uuid::new_v4())
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn fan_out(mut self, policy: FanOutPolicy) -> Self {
        self.config.fan_out = policy;
        self
    }

    pub fn config(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> ProcessModel {
        ProcessModel {
            name: self.name,
            uuid: self.uuid,
            owner: self.owner,
            roles: self.roles,
            config: self.config,
            ..ProcessModel::default()
        }
    }
}

impl Default for ProcessModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ProcessModelBuilder {
        ProcessModelBuilder::new()
    }

    pub fn with_config(config: ModelConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    // Metadata

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn uuid(&self) -> Option<Uuid> {
        self.uuid
    }

    pub fn set_uuid(&mut self, uuid: Option<Uuid>) {
        self.uuid = uuid;
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn set_owner(&mut self, owner: Option<String>) {
        self.owner = owner;
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    pub fn set_roles<I, S>(&mut self, roles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
    }

    pub fn add_role(&mut self, role: impl Into<String>) -> bool {
        self.roles.insert(role.into())
    }

    pub fn imports(&self) -> &[XmlResultType] {
        &self.imports
    }

    pub fn imports_mut(&mut self) -> &mut Vec<XmlResultType> {
        &mut self.imports
    }

    pub fn exports(&self) -> &[XmlDefineType] {
        &self.exports
    }

    pub fn exports_mut(&mut self) -> &mut Vec<XmlDefineType> {
        &mut self.exports
    }

    // Node collection

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Keys of all owned nodes, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.arena
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| NodeKey::new(index))
    }

    /// All owned nodes, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &ProcessNode> + '_ {
        self.arena.iter().flatten()
    }

    pub fn node(&self, key: NodeKey) -> Option<&ProcessNode> {
        self.arena.get(key.index()).and_then(Option::as_ref)
    }

    /// Mutable access to a node. Link and id edits still have to go through the model.
    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut ProcessNode> {
        self.arena.get_mut(key.index()).and_then(Option::as_mut)
    }

    pub fn key_of(&self, id: &str) -> Option<NodeKey> {
        self.index.get(id).copied()
    }

    pub fn node_by_id(&self, id: &str) -> Option<&ProcessNode> {
        self.key_of(id).and_then(|key| self.node(key))
    }

    /// Looks a reference up. Resolved references are answered from their key directly;
    /// pending ones are looked up by id.
    pub fn get_node(&self, reference: &NodeRef) -> Option<&ProcessNode> {
        self.resolve_ref(reference).and_then(|key| self.node(key))
    }

    pub(crate) fn resolve_ref(&self, reference: &NodeRef) -> Option<NodeKey> {
        match reference {
            NodeRef::Resolved { key, .. } if self.node(*key).is_some() => Some(*key),
            other => self.key_of(other.as_str()),
        }
    }

    pub fn start_nodes(&self) -> impl Iterator<Item = &ProcessNode> + '_ {
        self.nodes()
            .filter(|node| matches!(node.kind(), NodeKind::Start))
    }

    pub fn end_node_count(&self) -> usize {
        self.nodes()
            .filter(|node| matches!(node.kind(), NodeKind::End))
            .count()
    }

    /// Takes ownership of `node` and returns its key.
    ///
    /// A node without id gets one generated from the configured prefix of its kind. Links
    /// the node carries become pending references; they are linked by
    /// [`ProcessModel::resolve_refs`].
    pub fn add_node(&mut self, mut node: ProcessNode) -> Result<NodeKey, ModelError> {
        let id = match node.id() {
            Some(id) => id.to_string(),
            None => self.generate_id(self.config.id_prefix.for_kind(node.kind())),
        };
        if self.index.contains_key(&id) {
            return Err(ModelError::DuplicateNodeId(id));
        }

        let key = NodeKey::new(self.arena.len());
        node.set_id_unchecked(id.clone());
        node.demote_links();
        node.set_key(Some(key));
        if self.config.fan_out == FanOutPolicy::Deferred
            && node.kind().max_successors() == Some(1)
        {
            node.links_mut(Side::Successors).set_max(None);
        }

        self.arena.push(Some(node));
        self.index.insert(id, key);
        Ok(key)
    }

    /// Detaches a node from the model.
    ///
    /// Every link to or from the node is removed on both ends; the node comes back with
    /// empty link sets and no key.
    pub fn remove_node(&mut self, key: NodeKey) -> Result<ProcessNode, ModelError> {
        let id = self.require(key)?.display_id().to_string();

        for slot in self.arena.iter_mut().flatten() {
            for side in [Side::Predecessors, Side::Successors] {
                let stale = slot
                    .links(side)
                    .iter()
                    .position(|reference| reference.key() == Some(key));
                if let Some(position) = stale {
                    slot.links_mut(side).remove_at(position)?;
                }
            }
        }

        let mut node = self.arena[key.index()]
            .take()
            .ok_or_else(|| ModelError::NodeNotFound(id.clone()))?;
        self.index.remove(&id);
        node.reset_links();
        node.set_key(None);
        Ok(node)
    }

    /// Moves a node into `target`, dropping its links in this model.
    pub fn move_node(
        &mut self,
        key: NodeKey,
        target: &mut ProcessModel,
    ) -> Result<NodeKey, ModelError> {
        let id = self.require(key)?.display_id().to_string();
        if target.index.contains_key(&id) {
            return Err(ModelError::DuplicateNodeId(id));
        }
        let node = self.remove_node(key)?;
        target.add_node(node)
    }

    /// Changes the id of an owned node and of every resolved reference to it.
    pub fn rename_node(&mut self, key: NodeKey, new_id: impl Into<String>) -> Result<(), ModelError> {
        let new_id = new_id.into();
        let old_id = self.require(key)?.display_id().to_string();
        if old_id == new_id {
            return Ok(());
        }
        if self.index.contains_key(&new_id) {
            return Err(ModelError::DuplicateNodeId(new_id));
        }

        for slot in self.arena.iter_mut().flatten() {
            for side in [Side::Predecessors, Side::Successors] {
                for reference in slot.links_mut(side).items_mut() {
                    if let NodeRef::Resolved { key: target, id } = reference {
                        if *target == key {
                            *id = new_id.clone();
                        }
                    }
                }
            }
        }

        self.index.remove(&old_id);
        self.index.insert(new_id.clone(), key);
        self.require_mut(key)?.set_id_unchecked(new_id);
        Ok(())
    }

    /// Dispatches `visitor` over every node, in insertion order.
    pub fn visit_nodes<V: Visitor>(&self, visitor: &mut V) -> Vec<V::Output> {
        self.nodes().map(|node| node.visit(&mut *visitor)).collect()
    }

    fn generate_id(&self, prefix: &str) -> String {
        self.generate_id_avoiding(prefix, &AHashSet::new())
    }

    /// A fresh id that is neither owned by the model nor in `reserved`.
    pub(crate) fn generate_id_avoiding(&self, prefix: &str, reserved: &AHashSet<String>) -> String {
        (self.arena.len() + 1..)
            .map(|n| format!("{prefix}{n}"))
            .find(|candidate| !self.index.contains_key(candidate) && !reserved.contains(candidate))
            .unwrap_or_else(|| prefix.to_string())
    }

    pub(crate) fn require(&self, key: NodeKey) -> Result<&ProcessNode, ModelError> {
        self.node(key)
            .ok_or_else(|| ModelError::NodeNotFound(key.to_string()))
    }

    pub(crate) fn require_mut(&mut self, key: NodeKey) -> Result<&mut ProcessNode, ModelError> {
        self.node_mut(key)
            .ok_or_else(|| ModelError::NodeNotFound(key.to_string()))
    }
}

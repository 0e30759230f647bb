use super::ProcessModel;
use super::node::{Endpoint, NodeKey, NodeRef, ProcessNode, Side};
use crate::error::ModelError;
use crate::identifiable::Identifier;
use ahash::AHashSet;

/// The other end of a link edit once the endpoint has been looked at.
enum Target {
    Owned(NodeKey),
    Pending(Identifier),
    Detached(Box<ProcessNode>),
}

impl Target {
    fn id(&self, model: &ProcessModel) -> Option<String> {
        match self {
            Target::Owned(key) => model.node(*key).and_then(|n| n.id()).map(str::to_string),
            Target::Pending(id) => Some(id.as_str().to_string()),
            Target::Detached(node) => node.id().map(str::to_string),
        }
    }
}

impl ProcessModel {
    /// Links `predecessor` in front of `node`.
    ///
    /// Adding an existing link is a no-op returning `Ok(false)`. When either end is full
    /// the edit fails with [`ModelError::IllegalProcessModel`] and nothing changes. A
    /// reference to an id the model does not know yet is recorded as pending on `node`.
    pub fn add_predecessor(
        &mut self,
        node: NodeKey,
        predecessor: impl Into<Endpoint>,
    ) -> Result<bool, ModelError> {
        let target = self.target(predecessor.into())?;
        self.link_target(node, Side::Predecessors, target)
    }

    /// Links `successor` behind `node`. A detached successor joins the model.
    pub fn add_successor(
        &mut self,
        node: NodeKey,
        successor: impl Into<Endpoint>,
    ) -> Result<bool, ModelError> {
        let target = self.target(successor.into())?;
        self.link_target(node, Side::Successors, target)
    }

    /// Unlinks the predecessor with the given id from `node`, on both ends.
    pub fn remove_predecessor(&mut self, node: NodeKey, predecessor: &str) -> Result<bool, ModelError> {
        self.unlink_id(node, Side::Predecessors, predecessor)
    }

    /// Unlinks the successor with the given id from `node`, on both ends.
    pub fn remove_successor(&mut self, node: NodeKey, successor: &str) -> Result<bool, ModelError> {
        self.unlink_id(node, Side::Successors, successor)
    }

    /// Removes the link `from -> to` on both ends.
    pub fn disconnect(&mut self, from: NodeKey, to: NodeKey) -> Result<bool, ModelError> {
        let to_id = self.require(to)?.display_id().to_string();
        self.unlink_id(from, Side::Successors, &to_id)
    }

    /// Replaces the predecessors of `node` with `predecessors`.
    ///
    /// Links already present are kept, missing ones added and the rest removed. Fails
    /// with [`ModelError::IllegalArgument`] when the new set is larger than the node
    /// accepts; every other end is checked before anything is changed. Detached nodes
    /// without an id get a generated one, as in [`ProcessModel::add_node`].
    pub fn set_predecessors<I, E>(&mut self, node: NodeKey, predecessors: I) -> Result<(), ModelError>
    where
        I: IntoIterator<Item = E>,
        E: Into<Endpoint>,
    {
        self.set_links(node, Side::Predecessors, predecessors)
    }

    /// Replaces the successors of `node` with `successors`. See
    /// [`ProcessModel::set_predecessors`].
    pub fn set_successors<I, E>(&mut self, node: NodeKey, successors: I) -> Result<(), ModelError>
    where
        I: IntoIterator<Item = E>,
        E: Into<Endpoint>,
    {
        self.set_links(node, Side::Successors, successors)
    }

    fn target(&self, endpoint: Endpoint) -> Result<Target, ModelError> {
        match endpoint {
            Endpoint::Key(key) => {
                self.require(key)?;
                Ok(Target::Owned(key))
            }
            Endpoint::Ref(reference) => Ok(match self.resolve_ref(&reference) {
                Some(key) => Target::Owned(key),
                None => Target::Pending(Identifier::new(reference.as_str())),
            }),
            Endpoint::Detached(node) => Ok(match node.id().and_then(|id| self.key_of(id)) {
                Some(_) => return Err(ModelError::DuplicateNodeId(node.display_id().to_string())),
                None => Target::Detached(node),
            }),
        }
    }

    /// Whether `node` can take one more entry on `side` for a link to `other`.
    fn has_room_for(&self, node: &ProcessNode, side: Side, other: Option<&str>) -> bool {
        let set = node.links(side);
        other.is_some_and(|id| set.contains_id(Some(id))) || set.has_room()
    }

    fn link_target(&mut self, node: NodeKey, side: Side, target: Target) -> Result<bool, ModelError> {
        match target {
            Target::Owned(other) => self.link_owned(node, side, other),
            Target::Pending(id) => {
                let current = self.require(node)?;
                if current.links(side).contains_id(Some(id.as_str())) {
                    return Ok(false);
                }
                if !current.links(side).has_room() {
                    return Err(current.capacity_error(side, id.as_str()));
                }
                Ok(self.require_mut(node)?.links_mut(side).add(NodeRef::Unresolved(id))?)
            }
            Target::Detached(detached) => {
                let current = self.require(node)?;
                let node_id = current.display_id().to_string();
                if !self.has_room_for(current, side, detached.id()) {
                    return Err(current.capacity_error(side, detached.display_id()));
                }
                if !self.has_room_for(&detached, side.opposite(), Some(&node_id)) {
                    return Err(detached.capacity_error(side.opposite(), &node_id));
                }
                let other = self.add_node(*detached)?;
                self.link_owned(node, side, other)
            }
        }
    }

    /// Links two owned nodes, `other` being on `side` of `node`.
    pub(crate) fn link_owned(
        &mut self,
        node: NodeKey,
        side: Side,
        other: NodeKey,
    ) -> Result<bool, ModelError> {
        let (from, to) = match side {
            Side::Predecessors => (other, node),
            Side::Successors => (node, other),
        };
        self.connect(from, to)
    }

    /// Links `from -> to` on both ends, validating both before touching either.
    pub(crate) fn connect(&mut self, from: NodeKey, to: NodeKey) -> Result<bool, ModelError> {
        let from_node = self.require(from)?;
        let to_node = self.require(to)?;
        let from_id = from_node.display_id().to_string();
        let to_id = to_node.display_id().to_string();

        let has_successor = from_node.successors().contains_id(Some(&to_id));
        let has_predecessor = to_node.predecessors().contains_id(Some(&from_id));
        if has_successor
            && has_predecessor
            && from_node.successors().get(Some(&to_id)).is_some_and(NodeRef::is_resolved)
            && to_node.predecessors().get(Some(&from_id)).is_some_and(NodeRef::is_resolved)
        {
            return Ok(false);
        }
        if !has_successor && !from_node.successors().has_room() {
            return Err(from_node.capacity_error(Side::Successors, &to_id));
        }
        if !has_predecessor && !to_node.predecessors().has_room() {
            return Err(to_node.capacity_error(Side::Predecessors, &from_id));
        }

        let added_successor = upsert_resolved(self.require_mut(from)?, Side::Successors, to, to_id)?;
        let added_predecessor =
            upsert_resolved(self.require_mut(to)?, Side::Predecessors, from, from_id)?;
        Ok(added_successor || added_predecessor)
    }

    fn unlink_id(&mut self, node: NodeKey, side: Side, other_id: &str) -> Result<bool, ModelError> {
        let current = self.require(node)?;
        let Some(reference) = current.links(side).get(Some(other_id)) else {
            return Ok(false);
        };
        let other = self.resolve_ref(reference);
        let node_id = current.display_id().to_string();

        self.require_mut(node)?.links_mut(side).remove_id(Some(other_id))?;
        if let Some(other) = other {
            self.require_mut(other)?
                .links_mut(side.opposite())
                .remove_id(Some(&node_id))?;
        }
        Ok(true)
    }

    fn set_links<I, E>(&mut self, node: NodeKey, side: Side, endpoints: I) -> Result<(), ModelError>
    where
        I: IntoIterator<Item = E>,
        E: Into<Endpoint>,
    {
        let current = self.require(node)?;
        let node_id = current.display_id().to_string();

        let mut seen = AHashSet::new();
        let mut wanted = Vec::new();
        for endpoint in endpoints {
            let mut target = self.target(endpoint.into())?;
            if let Target::Detached(detached) = &mut target {
                if detached.id().is_none() {
                    let prefix = self.config.id_prefix.for_kind(detached.kind());
                    detached.set_id_unchecked(self.generate_id_avoiding(prefix, &seen));
                }
            }
            let id = target.id(self).ok_or_else(|| {
                ModelError::IllegalArgument("cannot link a node without id".to_string())
            })?;
            if seen.insert(id.clone()) {
                wanted.push((id, target));
            }
        }

        if let Some(max) = current.links(side).max_len() {
            if wanted.len() > max {
                return Err(ModelError::IllegalArgument(format!(
                    "{} node '{node_id}' accepts at most {max} {}(s), {} given",
                    current.kind(),
                    side.singular(),
                    wanted.len()
                )));
            }
        }

        for (id, target) in &wanted {
            let blocked = match target {
                Target::Owned(other) => {
                    let other = self.require(*other)?;
                    (!self.has_room_for(other, side.opposite(), Some(&node_id)))
                        .then(|| other.capacity_error(side.opposite(), &node_id))
                }
                Target::Detached(other) => (!self.has_room_for(other, side.opposite(), Some(&node_id)))
                    .then(|| other.capacity_error(side.opposite(), &node_id)),
                Target::Pending(_) => None,
            };
            if let Some(error) = blocked {
                return Err(error);
            }
            if matches!(target, Target::Detached(_)) && self.key_of(id).is_some() {
                return Err(ModelError::DuplicateNodeId(id.clone()));
            }
        }

        let stale: Vec<String> = current
            .links(side)
            .iter()
            .map(|reference| reference.as_str().to_string())
            .filter(|id| !seen.contains(id))
            .collect();
        for id in stale {
            self.unlink_id(node, side, &id)?;
        }
        for (_, target) in wanted {
            self.link_target(node, side, target)?;
        }
        Ok(())
    }
}

/// Makes `set` on `side` of `node` hold a resolved reference to `key`, upgrading a
/// pending reference with the same id. Returns whether an entry was added.
fn upsert_resolved(
    node: &mut ProcessNode,
    side: Side,
    key: NodeKey,
    id: String,
) -> Result<bool, ModelError> {
    let set = node.links_mut(side);
    match set.position(Some(&id)) {
        Some(position) => {
            set.replace_at(position, NodeRef::Resolved { key, id })?;
            Ok(false)
        }
        None => Ok(set.add(NodeRef::Resolved { key, id })?),
    }
}

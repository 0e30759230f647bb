use super::ProcessModel;
use super::node::{NodeKey, NodeKind, Side};
use crate::error::ModelError;
use crate::identifiable::Identifier;
use ahash::{AHashMap, AHashSet};
use tracing::{debug, warn};

impl ProcessModel {
    /// Links every pending reference whose id names a node of this model.
    ///
    /// Pending references become resolved on both ends; the missing reciprocal entry is
    /// added. Every link is checked against the capacity of both ends first: when one
    /// would overflow the call fails with [`ModelError::IllegalProcessModel`] and nothing
    /// changes. References to unknown ids are left in place and logged. Calling this twice
    /// in a row changes nothing the second time. Returns the number of links completed.
    pub fn resolve_refs(&mut self) -> Result<usize, ModelError> {
        let keys: Vec<NodeKey> = self.keys().collect();
        self.resolve_pending(&keys)
    }

    /// [`ProcessModel::resolve_refs`] for the references held by a single node.
    pub fn resolve_node_refs(&mut self, key: NodeKey) -> Result<usize, ModelError> {
        self.require(key)?;
        self.resolve_pending(&[key])
    }

    fn resolve_pending(&mut self, keys: &[NodeKey]) -> Result<usize, ModelError> {
        let links = self.pending_links(keys)?;
        self.check_pending_capacity(&links)?;

        for &(from, to) in &links {
            self.connect(from, to)?;
            debug!(
                from = %self.require(from)?.display_id(),
                to = %self.require(to)?.display_id(),
                "resolved deferred link"
            );
        }
        Ok(links.len())
    }

    /// Pending references held by `keys` as `(from, to)` pairs, each link once.
    fn pending_links(&self, keys: &[NodeKey]) -> Result<Vec<(NodeKey, NodeKey)>, ModelError> {
        let mut seen = AHashSet::new();
        let mut links = Vec::new();
        for &key in keys {
            let node = self.require(key)?;
            for side in [Side::Predecessors, Side::Successors] {
                for reference in node.links(side).iter().filter(|r| !r.is_resolved()) {
                    let Some(other) = self.key_of(reference.as_str()) else {
                        warn!(
                            node = %node.display_id(),
                            reference = %reference.as_str(),
                            "{} reference does not name a node of the model",
                            side.singular()
                        );
                        continue;
                    };
                    let link = match side {
                        Side::Predecessors => (other, key),
                        Side::Successors => (key, other),
                    };
                    if seen.insert(link) {
                        links.push(link);
                    }
                }
            }
        }
        Ok(links)
    }

    /// Fails with the first capacity error `links` would cause, counting every link
    /// against the entries both ends would hold once all of them are made.
    fn check_pending_capacity(&self, links: &[(NodeKey, NodeKey)]) -> Result<(), ModelError> {
        let mut planned: AHashMap<(NodeKey, Side), AHashSet<&str>> = AHashMap::new();
        for &(from, to) in links {
            for (key, side, other) in [(from, Side::Successors, to), (to, Side::Predecessors, from)] {
                let node = self.require(key)?;
                let other_id = self.require(other)?.display_id();
                let ids = planned
                    .entry((key, side))
                    .or_insert_with(|| node.links(side).iter().map(|r| r.as_str()).collect());
                let overflows = node.links(side).max_len().is_some_and(|max| {
                    ids.insert(other_id) && ids.len() > max
                });
                if overflows {
                    return Err(node.capacity_error(side, other_id));
                }
            }
        }
        Ok(())
    }

    /// Every reference that does not name a node of the model, with the node holding it.
    pub fn unresolved_refs(&self) -> Vec<(NodeKey, Identifier)> {
        self.keys()
            .filter_map(|key| self.node(key).map(|node| (key, node)))
            .flat_map(|(key, node)| {
                node.predecessors()
                    .iter()
                    .chain(node.successors().iter())
                    .filter(move |reference| self.resolve_ref(reference).is_none())
                    .map(move |reference| (key, Identifier::new(reference.as_str())))
            })
            .collect()
    }

    /// Whether `candidate` is somewhere in the transitive predecessors of `node`.
    ///
    /// Only resolvable references are followed. Fails with
    /// [`ModelError::CycleDetected`] when the walk runs into a cycle before finding
    /// `candidate`.
    pub fn is_predecessor_of(&self, candidate: NodeKey, node: NodeKey) -> Result<bool, ModelError> {
        self.require(candidate)?;
        self.require(node)?;

        // 0: unvisited, 1: on the current path, 2: done
        let mut state = vec![0u8; self.arena.len()];
        let mut stack: Vec<(NodeKey, Vec<NodeKey>)> = Vec::new();
        state[node.index()] = 1;
        stack.push((node, self.predecessor_keys(node)));

        while let Some((current, pending)) = stack.last_mut() {
            let Some(next) = pending.pop() else {
                state[current.index()] = 2;
                stack.pop();
                continue;
            };
            if next == candidate {
                return Ok(true);
            }
            match state[next.index()] {
                0 => {
                    state[next.index()] = 1;
                    let predecessors = self.predecessor_keys(next);
                    stack.push((next, predecessors));
                }
                1 => {
                    return Err(ModelError::CycleDetected(
                        self.require(next)?.display_id().to_string(),
                    ));
                }
                _ => {}
            }
        }
        Ok(false)
    }

    fn predecessor_keys(&self, key: NodeKey) -> Vec<NodeKey> {
        self.node(key)
            .map(|node| {
                node.predecessors()
                    .iter()
                    .filter_map(|reference| self.resolve_ref(reference))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Collects structural problems without changing anything: dangling references,
    /// links recorded on one end only, link counts beyond what the node kind allows and
    /// join/split bounds with `min > max`.
    pub fn validate(&self) -> Vec<ModelError> {
        let mut problems = Vec::new();
        for node in self.nodes() {
            let node_id = node.display_id();
            for side in [Side::Predecessors, Side::Successors] {
                let links = node.links(side);
                let limit = match side {
                    Side::Predecessors => node.kind().max_predecessors(),
                    Side::Successors => node.kind().max_successors(),
                };
                if let Some(max) = limit.filter(|max| links.len() > *max) {
                    problems.push(ModelError::IllegalProcessModel(format!(
                        "{} node '{node_id}' has {} {}s, at most {max} allowed",
                        node.kind(),
                        links.len(),
                        side.singular()
                    )));
                }

                for reference in links {
                    let other = self.resolve_ref(reference).and_then(|key| self.node(key));
                    match other {
                        None => problems.push(ModelError::UnresolvedReference {
                            node_id: node_id.to_string(),
                            reference: reference.as_str().to_string(),
                        }),
                        Some(other) if !other.links(side.opposite()).contains_id(Some(node_id)) => {
                            problems.push(ModelError::IllegalProcessModel(format!(
                                "'{node_id}' lists '{}' as {} but not the other way round",
                                other.display_id(),
                                side.singular()
                            )));
                        }
                        Some(_) => {}
                    }
                }
            }

            if let NodeKind::Split(bounds) | NodeKind::Join(bounds) = node.kind() {
                if bounds.min > bounds.max {
                    problems.push(ModelError::IllegalArgument(format!(
                        "{} node '{node_id}' has min {} above max {}",
                        node.kind(),
                        bounds.min,
                        bounds.max
                    )));
                }
            }
        }
        problems
    }
}

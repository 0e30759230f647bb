use super::ProcessModel;
use super::node::{NodeKey, ProcessNode};
use crate::error::ModelError;
use tracing::debug;

/// Creates the split inserted by [`ProcessModel::normalize`].
///
/// An implementation must add the split to `model` and link it in front of every node in
/// `successors`. The node that fanned out is linked to the returned split afterwards.
pub trait SplitFactory {
    fn create_split(
        &mut self,
        model: &mut ProcessModel,
        successors: &[NodeKey],
    ) -> Result<NodeKey, ModelError>;
}

/// Inserts AND splits: every branch is taken (`min = max = number of branches`).
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSplitFactory;

impl SplitFactory for DefaultSplitFactory {
    fn create_split(
        &mut self,
        model: &mut ProcessModel,
        successors: &[NodeKey],
    ) -> Result<NodeKey, ModelError> {
        let branches = u32::try_from(successors.len()).map_err(|_| {
            ModelError::IllegalArgument(format!("{} branches do not fit a split", successors.len()))
        })?;
        let split = model.add_node(ProcessNode::split(branches, branches))?;
        for successor in successors {
            model.add_successor(split, *successor)?;
        }
        Ok(split)
    }
}

impl ProcessModel {
    /// Rewrites the graph so that only split nodes have more than one successor.
    ///
    /// References are resolved first; if any of them stays dangling the call fails with
    /// [`ModelError::UnresolvedReference`] before anything else is changed. Every other
    /// node with several successors is then unlinked from its branches, which are handed to
    /// `factory` to build a split, and the split becomes the node's only successor. Nodes
    /// that already are splits are left alone. Inserted splits are not examined again.
    ///
    /// Returns the keys of the inserted splits; a second call right after returns none.
    pub fn normalize<F: SplitFactory + ?Sized>(
        &mut self,
        factory: &mut F,
    ) -> Result<Vec<NodeKey>, ModelError> {
        self.resolve_refs()?;
        if let Some((key, reference)) = self.unresolved_refs().into_iter().next() {
            return Err(ModelError::UnresolvedReference {
                node_id: self.require(key)?.display_id().to_string(),
                reference: reference.into_inner(),
            });
        }

        let mut inserted = Vec::new();
        let keys: Vec<NodeKey> = self.keys().collect();
        for key in keys {
            let node = self.require(key)?;
            if node.is_split() || node.successors().len() <= 1 {
                continue;
            }
            let branches: Vec<NodeKey> = node
                .successors()
                .iter()
                .filter_map(|reference| self.resolve_ref(reference))
                .collect();

            for branch in &branches {
                self.disconnect(key, *branch)?;
            }
            let split = factory.create_split(self, &branches)?;
            self.connect(key, split)?;

            debug!(
                node = %self.require(key)?.display_id(),
                split = %self.require(split)?.display_id(),
                branches = branches.len(),
                "inserted split"
            );
            inserted.push(split);
        }
        Ok(inserted)
    }
}

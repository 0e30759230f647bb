use super::data::{XmlDefineType, XmlResultType};
use crate::error::ModelError;
use crate::identifiable::{Identifiable, IdentifiableSet, Identifier};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable position of a node inside the arena of one [`ProcessModel`](super::ProcessModel).
///
/// Keys are never reused within a model, so a key of a removed node simply stops
/// resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey(usize);

impl NodeKey {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An entry of a predecessor or successor set.
///
/// A reference starts out `Unresolved` when only the id of the other node is known
/// (for instance right after reading XML) and becomes `Resolved` once the owning model
/// has linked both ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRef {
    Unresolved(Identifier),
    Resolved { key: NodeKey, id: String },
}

impl NodeRef {
    pub fn key(&self) -> Option<NodeKey> {
        match self {
            NodeRef::Resolved { key, .. } => Some(*key),
            NodeRef::Unresolved(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, NodeRef::Resolved { .. })
    }

    pub fn as_str(&self) -> &str {
        match self {
            NodeRef::Unresolved(id) => id.as_str(),
            NodeRef::Resolved { id, .. } => id,
        }
    }
}

impl Identifiable for NodeRef {
    fn id(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl From<Identifier> for NodeRef {
    fn from(id: Identifier) -> Self {
        NodeRef::Unresolved(id)
    }
}

impl From<&str> for NodeRef {
    fn from(id: &str) -> Self {
        NodeRef::Unresolved(Identifier::from(id))
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The other end of a link edit on a [`ProcessModel`](super::ProcessModel).
#[derive(Debug, Clone)]
pub enum Endpoint {
    /// A node already owned by the model.
    Key(NodeKey),
    /// A reference by id; it links immediately when the id is known to the model and is
    /// kept as a pending reference otherwise.
    Ref(NodeRef),
    /// A node not yet owned by any model. It joins the model as part of the edit.
    Detached(Box<ProcessNode>),
}

impl From<NodeKey> for Endpoint {
    fn from(key: NodeKey) -> Self {
        Endpoint::Key(key)
    }
}

impl From<NodeRef> for Endpoint {
    fn from(reference: NodeRef) -> Self {
        Endpoint::Ref(reference)
    }
}

impl From<Identifier> for Endpoint {
    fn from(id: Identifier) -> Self {
        Endpoint::Ref(NodeRef::Unresolved(id))
    }
}

impl From<&str> for Endpoint {
    fn from(id: &str) -> Self {
        Endpoint::Ref(NodeRef::from(id))
    }
}

impl From<ProcessNode> for Endpoint {
    fn from(node: ProcessNode) -> Self {
        Endpoint::Detached(Box::new(node))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub name: Option<String>,
    pub condition: Option<String>,
}

/// Gating bounds of a join or split: how many incoming (join) or outgoing (split)
/// branches must be satisfied (`min`) and may be taken (`max`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSplit {
    pub min: u32,
    pub max: u32,
}

impl JoinSplit {
    pub fn new(min: u32, max: u32) -> Result<Self, ModelError> {
        if min > max {
            return Err(ModelError::IllegalArgument(format!(
                "min ({min}) must not exceed max ({max})"
            )));
        }
        Ok(Self { min, max })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Start,
    Activity(Activity),
    Split(JoinSplit),
    Join(JoinSplit),
    End,
}

impl NodeKind {
    /// The element name of the kind in the XML form of a model.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Start => "start",
            NodeKind::Activity(_) => "activity",
            NodeKind::Split(_) => "split",
            NodeKind::Join(_) => "join",
            NodeKind::End => "end",
        }
    }

    /// `None` means unbounded.
    pub fn max_predecessors(&self) -> Option<usize> {
        match self {
            NodeKind::Start => Some(0),
            NodeKind::Activity(_) | NodeKind::Split(_) | NodeKind::End => Some(1),
            NodeKind::Join(_) => None,
        }
    }

    /// `None` means unbounded.
    pub fn max_successors(&self) -> Option<usize> {
        match self {
            NodeKind::End => Some(0),
            NodeKind::Start | NodeKind::Activity(_) | NodeKind::Join(_) => Some(1),
            NodeKind::Split(_) => None,
        }
    }

    pub fn is_split(&self) -> bool {
        matches!(self, NodeKind::Split(_))
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Side {
    Predecessors,
    Successors,
}

impl Side {
    pub(crate) fn opposite(self) -> Self {
        match self {
            Side::Predecessors => Side::Successors,
            Side::Successors => Side::Predecessors,
        }
    }

    pub(crate) fn singular(self) -> &'static str {
        match self {
            Side::Predecessors => "predecessor",
            Side::Successors => "successor",
        }
    }
}

/// A node of a process graph.
///
/// A node is either detached (built up on its own, links are pending references by id)
/// or owned by exactly one [`ProcessModel`](super::ProcessModel). Link and id edits on an
/// owned node go through the model, which keeps both ends of every link in step.
#[derive(Debug, Clone)]
pub struct ProcessNode {
    id: Option<String>,
    label: Option<String>,
    x: f64,
    y: f64,
    kind: NodeKind,
    predecessors: IdentifiableSet<NodeRef>,
    successors: IdentifiableSet<NodeRef>,
    results: Vec<XmlResultType>,
    defines: Vec<XmlDefineType>,
    key: Option<NodeKey>,
}

impl ProcessNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            id: None,
            label: None,
            x: f64::NAN,
            y: f64::NAN,
            predecessors: IdentifiableSet::for_max(kind.max_predecessors()),
            successors: IdentifiableSet::for_max(kind.max_successors()),
            kind,
            results: Vec::new(),
            defines: Vec::new(),
            key: None,
        }
    }

    pub fn start() -> Self {
        Self::new(NodeKind::Start)
    }

    pub fn activity() -> Self {
        Self::new(NodeKind::Activity(Activity::default()))
    }

    pub fn split(min: u32, max: u32) -> Self {
        Self::new(NodeKind::Split(JoinSplit { min, max }))
    }

    pub fn join(min: u32, max: u32) -> Self {
        Self::new(NodeKind::Join(JoinSplit { min, max }))
    }

    pub fn end() -> Self {
        Self::new(NodeKind::End)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.set_position(x, y);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        if let NodeKind::Activity(activity) = &mut self.kind {
            activity.name = Some(name.into());
        }
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Changes the id of a detached node. Owned nodes are renamed through
    /// [`ProcessModel::rename_node`](super::ProcessModel::rename_node).
    pub fn set_id(&mut self, id: impl Into<String>) -> Result<(), ModelError> {
        self.ensure_detached("set_id")?;
        self.id = Some(id.into());
        Ok(())
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }

    /// Horizontal position; `NaN` when unset.
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Vertical position; `NaN` when unset.
    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    pub fn has_position(&self) -> bool {
        !self.x.is_nan() && !self.y.is_nan()
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn as_activity(&self) -> Option<&Activity> {
        match &self.kind {
            NodeKind::Activity(activity) => Some(activity),
            _ => None,
        }
    }

    pub fn as_activity_mut(&mut self) -> Option<&mut Activity> {
        match &mut self.kind {
            NodeKind::Activity(activity) => Some(activity),
            _ => None,
        }
    }

    pub fn join_split(&self) -> Option<&JoinSplit> {
        match &self.kind {
            NodeKind::Split(bounds) | NodeKind::Join(bounds) => Some(bounds),
            _ => None,
        }
    }

    pub fn join_split_mut(&mut self) -> Option<&mut JoinSplit> {
        match &mut self.kind {
            NodeKind::Split(bounds) | NodeKind::Join(bounds) => Some(bounds),
            _ => None,
        }
    }

    pub fn is_split(&self) -> bool {
        self.kind.is_split()
    }

    pub fn predecessors(&self) -> &IdentifiableSet<NodeRef> {
        &self.predecessors
    }

    pub fn successors(&self) -> &IdentifiableSet<NodeRef> {
        &self.successors
    }

    /// A read-only copy of the predecessor set.
    pub fn predecessor_snapshot(&self) -> IdentifiableSet<NodeRef> {
        self.predecessors.clone().read_only()
    }

    /// A read-only copy of the successor set.
    pub fn successor_snapshot(&self) -> IdentifiableSet<NodeRef> {
        self.successors.clone().read_only()
    }

    pub fn max_predecessor_count(&self) -> Option<usize> {
        self.kind.max_predecessors()
    }

    pub fn max_successor_count(&self) -> Option<usize> {
        self.kind.max_successors()
    }

    pub fn results(&self) -> &[XmlResultType] {
        &self.results
    }

    pub fn results_mut(&mut self) -> &mut Vec<XmlResultType> {
        &mut self.results
    }

    pub fn defines(&self) -> &[XmlDefineType] {
        &self.defines
    }

    pub fn defines_mut(&mut self) -> &mut Vec<XmlDefineType> {
        &mut self.defines
    }

    /// The key of this node in its owning model, `None` while detached.
    pub fn key(&self) -> Option<NodeKey> {
        self.key
    }

    pub fn is_attached(&self) -> bool {
        self.key.is_some()
    }

    /// Records a pending predecessor reference on a detached node.
    ///
    /// The reciprocal successor link is made when the node joins a model and the model
    /// resolves its references.
    pub fn add_predecessor(&mut self, id: impl Into<Identifier>) -> Result<bool, ModelError> {
        self.add_pending(Side::Predecessors, id.into())
    }

    /// Records a pending successor reference on a detached node.
    pub fn add_successor(&mut self, id: impl Into<Identifier>) -> Result<bool, ModelError> {
        self.add_pending(Side::Successors, id.into())
    }

    pub fn remove_predecessor(&mut self, id: &str) -> Result<bool, ModelError> {
        self.ensure_detached("remove_predecessor")?;
        Ok(self.predecessors.remove_id(Some(id))?)
    }

    pub fn remove_successor(&mut self, id: &str) -> Result<bool, ModelError> {
        self.ensure_detached("remove_successor")?;
        Ok(self.successors.remove_id(Some(id))?)
    }

    fn add_pending(&mut self, side: Side, id: Identifier) -> Result<bool, ModelError> {
        self.ensure_detached(match side {
            Side::Predecessors => "add_predecessor",
            Side::Successors => "add_successor",
        })?;
        let set = self.links(side);
        if set.contains_id(Some(id.as_str())) {
            return Ok(false);
        }
        if !set.has_room() {
            return Err(self.capacity_error(side, id.as_str()));
        }
        Ok(self.links_mut(side).add(NodeRef::Unresolved(id))?)
    }

    fn ensure_detached(&self, op: &str) -> Result<(), ModelError> {
        if self.key.is_some() {
            return Err(ModelError::IllegalState(format!(
                "'{op}' on node '{}' which is owned by a model; edit it through the model",
                self.display_id()
            )));
        }
        Ok(())
    }

    pub(crate) fn display_id(&self) -> &str {
        self.id.as_deref().unwrap_or("<unset>")
    }

    pub(crate) fn capacity_error(&self, side: Side, other: &str) -> ModelError {
        let max = self.links(side).max_len().unwrap_or(usize::MAX);
        ModelError::IllegalProcessModel(format!(
            "{} node '{}' accepts at most {max} {}(s), cannot link '{other}'",
            self.kind,
            self.display_id(),
            side.singular()
        ))
    }

    pub(crate) fn links(&self, side: Side) -> &IdentifiableSet<NodeRef> {
        match side {
            Side::Predecessors => &self.predecessors,
            Side::Successors => &self.successors,
        }
    }

    pub(crate) fn links_mut(&mut self, side: Side) -> &mut IdentifiableSet<NodeRef> {
        match side {
            Side::Predecessors => &mut self.predecessors,
            Side::Successors => &mut self.successors,
        }
    }

    pub(crate) fn set_key(&mut self, key: Option<NodeKey>) {
        self.key = key;
    }

    pub(crate) fn set_id_unchecked(&mut self, id: String) {
        self.id = Some(id);
    }

    /// Turns every resolved link back into a pending reference by id.
    pub(crate) fn demote_links(&mut self) {
        for side in [Side::Predecessors, Side::Successors] {
            for reference in self.links_mut(side).items_mut() {
                if let NodeRef::Resolved { id, .. } = reference {
                    *reference = NodeRef::Unresolved(Identifier::new(std::mem::take(id)));
                }
            }
        }
    }

    /// Drops every link and restores the structural limits of the kind.
    pub(crate) fn reset_links(&mut self) {
        self.predecessors = IdentifiableSet::for_max(self.kind.max_predecessors());
        self.successors = IdentifiableSet::for_max(self.kind.max_successors());
    }
}

impl Identifiable for ProcessNode {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

use crate::handle::Handle;
use thiserror::Error;

/// Errors raised by the mutators of an [`IdentifiableSet`](crate::identifiable::IdentifiableSet).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    #[error("Cannot add '{id}': the set holds at most {max} element(s)")]
    IllegalState { id: String, max: usize },

    #[error("Unsupported operation '{0}' on a read-only set")]
    UnsupportedOperation(&'static str),

    #[error("Index {index} is out of bounds for a set of {len} element(s)")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// Errors that can occur while editing, resolving or normalizing a process model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Illegal process model: {0}")]
    IllegalProcessModel(String),

    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("Node '{0}' not found in the process model")]
    NodeNotFound(String),

    #[error("A node with id '{0}' already exists in the process model")]
    DuplicateNodeId(String),

    #[error(
        "Node '{node_id}' references '{reference}', which does not resolve to a node in the model"
    )]
    UnresolvedReference { node_id: String, reference: String },

    #[error("The predecessors of node '{0}' form a cycle")]
    CycleDetected(String),

    #[error(transparent)]
    Collection(#[from] CollectionError),
}

/// Errors raised by handle map lookups and iteration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandleError {
    #[error("Handle {0} does not address a live slot of the map")]
    OutOfBounds(Handle),

    #[error("Stale handle {handle}: the slot is at generation {current}")]
    GenerationMismatch { handle: Handle, current: u32 },

    #[error("The handle map was structurally modified during iteration")]
    ConcurrentModification,

    #[error("The handle map lock was poisoned")]
    LockPoisoned,

    #[error("Invalid handle map configuration: {0}")]
    InvalidConfig(String),
}

/// Errors that can occur while reading or writing the XML form of a process model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XmlError {
    #[error("Failed to parse process model XML: {0}")]
    Parse(String),

    #[error("Failed to write process model XML: {0}")]
    Write(String),

    #[error("Unhandled element '{name}' inside '{parent}'")]
    UnhandledElement { parent: String, name: String },

    #[error("Element '{element}' is missing the required attribute '{name}'")]
    MissingAttribute { element: String, name: String },

    #[error("Invalid value '{value}' for attribute '{name}'")]
    InvalidValue { name: String, value: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Errors that can occur while loading a configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to parse configuration JSON: {0}")]
    Json(String),

    #[error("Could not read configuration file '{path}': {message}")]
    Io { path: String, message: String },

    #[error(transparent)]
    Handle(#[from] HandleError),
}

//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the procgraph
//! crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use procgraph::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let xml = std::fs::read_to_string("path/to/model.xml")?;
//! let mut model = read_model(&xml)?;
//!
//! for problem in model.validate() {
//!     println!("{problem}");
//! }
//! model.normalize(&mut DefaultSplitFactory)?;
//! println!("{}", write_model(&model)?);
//! # Ok(())
//! # }
//! ```

// Graph model
pub use crate::model::{
    DefaultSplitFactory, Endpoint, NodeKey, NodeKind, NodeRef, ProcessModel, ProcessNode,
    SplitFactory, Visitor,
};

// Handles
pub use crate::handle::{Handle, HandleAware, HandleMap, MemHandleMap};

// Sets of identifiable things
pub use crate::identifiable::{Identifiable, IdentifiableSet, Identifier};

// Configuration
pub use crate::config::{Config, FanOutPolicy, ModelConfig};

// XML
pub use crate::xml::{read_model, read_model_with, write_model};

// Error types
pub use crate::error::{CollectionError, ConfigError, HandleError, ModelError, XmlError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

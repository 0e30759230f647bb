//! # procgraph - Process Graph Model and Generational Handle Storage
//!
//! **procgraph** holds the structural core of a process engine: a graph of process nodes
//! (start, activity, split, join, end) whose predecessor and successor links are always
//! recorded on both ends, and a generational handle map that hands out reusable,
//! stale-proof handles for values stored in memory.
//!
//! ## Core Workflow
//!
//! 1.  **Build or read a model**: Use `ProcessModel::builder` and `add_node` / `add_successor`,
//!     or read one from XML with `xml::read_model`.
//! 2.  **Resolve**: References that only name a node by id are linked with `resolve_refs`.
//! 3.  **Normalize**: `normalize` inserts explicit splits wherever a node other than a split
//!     fans out to several successors.
//! 4.  **Address values by handle**: Store runtime objects in a `MemHandleMap` and keep the
//!     returned `Handle`; a handle of a removed value never validates again.
//!
//! ## Quick Start
//!
//! ```rust
//! use procgraph::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut model = ProcessModel::builder()
//!         .name("fan-out")
//!         .fan_out(FanOutPolicy::Deferred)
//!         .build();
//!
//!     let work = model.add_node(ProcessNode::activity().with_id("work"))?;
//!     model.add_successor(work, ProcessNode::end().with_id("done"))?;
//!     model.add_successor(work, ProcessNode::end().with_id("failed"))?;
//!
//!     let splits = model.normalize(&mut DefaultSplitFactory)?;
//!     assert_eq!(splits.len(), 1);
//!     assert_eq!(model.node(work).map(|n| n.successors().len()), Some(1));
//!
//!     let handles = MemHandleMap::new();
//!     let handle = handles.put("instance state")?;
//!     assert_eq!(handles.get(handle)?, "instance state");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod handle;
pub mod identifiable;
pub mod model;
pub mod prelude;
pub mod xml;

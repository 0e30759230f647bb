//! Handle-addressable storage.
//!
//! A [`Handle`] packs a slot generation in its upper 32 bits and a handle number in its
//! lower 32 bits. The generation of a slot is bumped whenever its value is removed, so a
//! handle issued for an earlier tenant of a slot never validates again, even after the
//! slot has been handed out anew.

pub mod iter;
pub mod mem;

pub use iter::Iter;
pub use mem::{DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR, MemHandleMap};

use crate::error::HandleError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque `(generation, number)` pair addressing a value in a handle map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(u64);

impl Handle {
    /// A handle that no map ever issues.
    pub const INVALID: Handle = Handle(u64::MAX);

    pub fn new(generation: u32, number: u32) -> Self {
        Self(((generation as u64) << 32) | number as u64)
    }

    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub fn number(self) -> u32 {
        self.0 as u32
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for Handle {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<Handle> for u64 {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.generation(), self.number())
    }
}

/// Values that want to know the handle they are stored under.
pub trait HandleAware {
    fn handle(&self) -> Option<Handle>;
    fn set_handle(&mut self, handle: Handle);
}

/// The contract shared by every handle map, in memory or persistent.
pub trait HandleMap<V> {
    fn put(&self, value: V) -> Result<Handle, HandleError>;

    fn get(&self, handle: Handle) -> Result<V, HandleError>
    where
        V: Clone;

    /// Replaces the value stored under `handle`, returning the previous one.
    fn set(&self, handle: Handle, value: V) -> Result<V, HandleError>;

    /// Removes the value stored under `handle`. A stale handle is not an error: the call
    /// reports `false` and changes nothing.
    fn remove(&self, handle: Handle) -> Result<bool, HandleError>;

    fn contains(&self, handle: Handle) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&self) -> Result<(), HandleError>;
}

/// A handle map whose operations participate in a caller-supplied transaction.
///
/// Persistent implementations use `T` to enlist each operation in a database
/// transaction; the in-memory map accepts any `T` and ignores it.
pub trait TransactionedHandleMap<V, T> {
    fn put(&self, transaction: &mut T, value: V) -> Result<Handle, HandleError>;

    fn get(&self, transaction: &mut T, handle: Handle) -> Result<V, HandleError>
    where
        V: Clone;

    fn set(&self, transaction: &mut T, handle: Handle, value: V) -> Result<V, HandleError>;

    fn remove(&self, transaction: &mut T, handle: Handle) -> Result<bool, HandleError>;

    fn contains(&self, transaction: &mut T, handle: Handle) -> bool;
}

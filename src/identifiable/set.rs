use super::Identifiable;
use crate::error::CollectionError;
use std::fmt;

/// An ordered collection holding at most one element per id.
///
/// The maximum size is fixed at construction: [`IdentifiableSet::empty`] never accepts
/// an element, [`IdentifiableSet::singleton`] holds at most one, and
/// [`IdentifiableSet::new`] grows without bound. Adding beyond the maximum is an error,
/// never a silent truncation. Lookups by id are linear scans, which is fine for the
/// handful of links a process node carries.
#[derive(Clone, PartialEq)]
pub struct IdentifiableSet<T> {
    items: Vec<T>,
    max: Option<usize>,
    read_only: bool,
}

impl<T: Identifiable> IdentifiableSet<T> {
    /// A general, unbounded set.
    pub fn new() -> Self {
        Self::for_max(None)
    }

    /// A set that rejects every addition.
    pub fn empty() -> Self {
        Self::for_max(Some(0))
    }

    /// A set holding at most one element.
    pub fn singleton() -> Self {
        Self::for_max(Some(1))
    }

    pub fn with_max(max: usize) -> Self {
        Self::for_max(Some(max))
    }

    /// Picks the variant for the given maximum cardinality (`None` is unbounded).
    pub fn for_max(max: Option<usize>) -> Self {
        let items = match max {
            Some(0) => Vec::new(),
            Some(n) => Vec::with_capacity(n.min(4)),
            None => Vec::new(),
        };
        Self {
            items,
            max,
            read_only: false,
        }
    }

    /// Adds `item` unless an element with the same id is already present.
    ///
    /// Returns `Ok(false)` without touching the set for a duplicate id. Fails with
    /// [`CollectionError::IllegalState`] when a new element would exceed the maximum.
    pub fn add(&mut self, item: T) -> Result<bool, CollectionError> {
        self.check_writable("add")?;
        if self.contains_id(item.id()) {
            return Ok(false);
        }
        if let Some(max) = self.max {
            if self.items.len() >= max {
                return Err(CollectionError::IllegalState {
                    id: item.id().unwrap_or("<unset>").to_string(),
                    max,
                });
            }
        }
        self.items.push(item);
        Ok(true)
    }

    /// Returns the element whose id equals `id`; `None` looks up the element without id.
    pub fn get(&self, id: Option<&str>) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains_id(&self, id: Option<&str>) -> bool {
        self.position(id).is_some()
    }

    pub fn position(&self, id: Option<&str>) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    pub fn get_at(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn remove_at(&mut self, index: usize) -> Result<T, CollectionError> {
        self.check_writable("remove")?;
        if index >= self.items.len() {
            return Err(CollectionError::IndexOutOfBounds {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    /// Removes the element sharing the id of `item`. Returns whether anything was removed.
    pub fn remove<I: Identifiable + ?Sized>(&mut self, item: &I) -> Result<bool, CollectionError> {
        self.remove_id(item.id())
    }

    pub fn remove_id(&mut self, id: Option<&str>) -> Result<bool, CollectionError> {
        self.check_writable("remove")?;
        match self.position(id) {
            Some(index) => {
                self.items.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Swaps the element at `index` for `item`, which must keep the id unique.
    pub fn replace_at(&mut self, index: usize, item: T) -> Result<T, CollectionError> {
        self.check_writable("replace")?;
        let len = self.items.len();
        if index >= len {
            return Err(CollectionError::IndexOutOfBounds { index, len });
        }
        if let Some(other) = self.position(item.id()) {
            if other != index {
                return Err(CollectionError::IllegalState {
                    id: item.id().unwrap_or("<unset>").to_string(),
                    max: self.max.unwrap_or(len),
                });
            }
        }
        Ok(std::mem::replace(&mut self.items[index], item))
    }

    pub fn clear(&mut self) -> Result<(), CollectionError> {
        self.check_writable("clear")?;
        self.items.clear();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The maximum number of elements, `None` when unbounded.
    pub fn max_len(&self) -> Option<usize> {
        self.max
    }

    pub fn has_room(&self) -> bool {
        self.max.is_none_or(|max| self.items.len() < max)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = Option<&str>> {
        self.items.iter().map(Identifiable::id)
    }

    /// Returns a view of this set whose mutators all fail with
    /// [`CollectionError::UnsupportedOperation`]. Wrapping twice is a no-op.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub(crate) fn set_max(&mut self, max: Option<usize>) {
        self.max = max;
    }

    pub(crate) fn items_mut(&mut self) -> &mut [T] {
        &mut self.items
    }

    fn check_writable(&self, op: &'static str) -> Result<(), CollectionError> {
        if self.read_only {
            Err(CollectionError::UnsupportedOperation(op))
        } else {
            Ok(())
        }
    }
}

impl<T: Identifiable> Default for IdentifiableSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for IdentifiableSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

impl<'a, T> IntoIterator for &'a IdentifiableSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T> IntoIterator for IdentifiableSet<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

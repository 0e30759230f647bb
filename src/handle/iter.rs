use super::{Handle, MemHandleMap};
use crate::error::HandleError;

/// A fail-fast cursor over the live entries of a [`MemHandleMap`].
///
/// Yields `(handle, value)` pairs from the oldest slot of the map's window to the newest.
/// The map is locked for each step only, so other code may touch the map between steps;
/// a structural change made behind the iterator's back surfaces as
/// [`HandleError::ConcurrentModification`] and ends the iteration.
pub struct Iter<'a, V> {
    map: &'a MemHandleMap<V>,
    expected_magic: u64,
    cursor: u32,
    end: u32,
    current: Option<Handle>,
    failure: Option<HandleError>,
    done: bool,
}

impl<'a, V: Clone> Iter<'a, V> {
    pub(super) fn new(map: &'a MemHandleMap<V>) -> Self {
        let mut iter = Self {
            map,
            expected_magic: 0,
            cursor: 0,
            end: 0,
            current: None,
            failure: None,
            done: false,
        };
        match map.lock() {
            Ok(slots) => {
                iter.expected_magic = slots.change_magic();
                iter.cursor = slots.window_start();
                iter.end = slots.window_end();
                iter.done = slots.len() == 0;
            }
            Err(e) => iter.failure = Some(e),
        }
        iter
    }

    /// The handle of the entry most recently returned by `next`.
    pub fn current(&self) -> Option<Handle> {
        self.current
    }

    /// Removes the entry most recently returned by `next` and keeps iterating after it.
    ///
    /// Returns `Ok(false)` when there is no current entry.
    pub fn remove_current(&mut self) -> Result<bool, HandleError> {
        let Some(handle) = self.current.take() else {
            return Ok(false);
        };
        let map = self.map;
        let mut slots = map.lock()?;
        if slots.change_magic() != self.expected_magic {
            self.done = true;
            return Err(HandleError::ConcurrentModification);
        }
        let removed = slots.remove(handle);
        self.expected_magic = slots.change_magic();
        if slots.len() == 0 {
            self.done = true;
        }
        Ok(removed)
    }
}

impl<V: Clone> Iterator for Iter<'_, V> {
    type Item = Result<(Handle, V), HandleError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(failure) = self.failure.take() {
            self.done = true;
            return Some(Err(failure));
        }
        if self.done {
            return None;
        }

        let map = self.map;
        let slots = match map.lock() {
            Ok(slots) => slots,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        if slots.change_magic() != self.expected_magic {
            self.done = true;
            return Some(Err(HandleError::ConcurrentModification));
        }

        while self.cursor != self.end {
            let number = self.cursor;
            self.cursor = self.cursor.wrapping_add(1);
            let Some(index) = slots.index_from_handle(number) else {
                continue;
            };
            if let Some(value) = slots.value_at(index) {
                let handle = Handle::new(slots.generation_at(index), number);
                self.current = Some(handle);
                return Some(Ok((handle, value.clone())));
            }
        }

        self.current = None;
        self.done = true;
        None
    }
}

impl<V: Clone> std::iter::FusedIterator for Iter<'_, V> {}

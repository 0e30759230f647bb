use super::{Handle, HandleAware, HandleMap, Iter, TransactionedHandleMap};
use crate::config::HandleMapConfig;
use crate::error::HandleError;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, trace};

pub const DEFAULT_CAPACITY: usize = 8;
pub const DEFAULT_LOAD_FACTOR: f32 = 0.9;

/// Slot storage of a [`MemHandleMap`], always accessed under the map's lock.
///
/// The slots form a ring. The live window starts at `barrier` (the oldest slot that may
/// still hold a value) and runs forward to `next` (the next never-claimed slot). When
/// `barrier >= next` and the map is not empty the window wraps around the end of the
/// ring; `barrier == next` with a non-empty map means the ring is saturated.
///
/// `offset` is the handle number of slot 0 in the lap `next` is in. Window slots at or
/// past `next` belong to the previous lap and carry numbers one capacity lower.
pub(super) struct Slots<V> {
    values: Vec<Option<V>>,
    generations: Vec<u32>,
    next: usize,
    barrier: usize,
    offset: u32,
    size: usize,
    change_magic: u64,
}

impl<V> Slots<V> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            values: std::iter::repeat_with(|| None).take(capacity).collect(),
            generations: vec![0; capacity],
            next: 0,
            barrier: 0,
            offset: 0,
            size: 0,
            change_magic: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.values.len()
    }

    pub(super) fn len(&self) -> usize {
        self.size
    }

    pub(super) fn change_magic(&self) -> u64 {
        self.change_magic
    }

    fn has_room_ahead(&self) -> bool {
        self.size == 0 || self.next != self.barrier
    }

    fn window_len(&self) -> usize {
        if self.size == 0 {
            0
        } else if self.barrier < self.next {
            self.next - self.barrier
        } else {
            self.capacity() - self.barrier + self.next
        }
    }

    /// Handle number of the oldest window slot.
    pub(super) fn window_start(&self) -> u32 {
        self.window_end().wrapping_sub(self.window_len() as u32)
    }

    /// Handle number one past the newest window slot.
    pub(super) fn window_end(&self) -> u32 {
        self.offset.wrapping_add(self.next as u32)
    }

    fn slot_to_handle_number(&self, index: usize) -> u32 {
        if index < self.next {
            self.offset.wrapping_add(index as u32)
        } else {
            self.offset
                .wrapping_add(index as u32)
                .wrapping_sub(self.capacity() as u32)
        }
    }

    /// Maps a handle number back to its slot, `None` when it lies outside the live window.
    pub(super) fn index_from_handle(&self, number: u32) -> Option<usize> {
        if self.size == 0 {
            return None;
        }
        let capacity = self.capacity() as i64;
        let relative = number.wrapping_sub(self.offset) as i32 as i64;
        let wrapped = self.barrier >= self.next;
        if (0..self.next as i64).contains(&relative) {
            let index = relative as usize;
            (wrapped || index >= self.barrier).then_some(index)
        } else if (-capacity..0).contains(&relative) {
            let index = (relative + capacity) as usize;
            (wrapped && index >= self.barrier).then_some(index)
        } else {
            None
        }
    }

    fn find_next_free_index(&self) -> Option<usize> {
        let capacity = self.capacity();
        (0..self.window_len())
            .map(|step| (self.barrier + step) % capacity)
            .find(|&index| self.values[index].is_none())
    }

    /// Reserves a slot for a new value and returns it with the handle it will carry.
    fn claim(&mut self, load_factor: f32) -> (usize, Handle) {
        loop {
            if self.has_room_ahead() {
                let index = self.next;
                let number = self.offset.wrapping_add(index as u32);
                if self.size == 0 {
                    self.barrier = index;
                }
                self.next += 1;
                if self.next == self.capacity() {
                    self.next = 0;
                    self.offset = self.offset.wrapping_add(self.capacity() as u32);
                }
                self.size += 1;
                self.change_magic += 1;
                return (index, Handle::new(self.generations[index], number));
            }

            let capacity = self.capacity();
            if self.size >= capacity || self.size as f32 >= load_factor * capacity as f32 {
                self.expand();
                continue;
            }

            if let Some(index) = self.find_next_free_index() {
                let handle = Handle::new(self.generations[index], self.slot_to_handle_number(index));
                trace!(slot = index, %handle, "reusing freed handle map slot");
                self.size += 1;
                self.change_magic += 1;
                return (index, handle);
            }

            // A saturated ring below capacity always has a hole; grow rather than spin.
            self.expand();
        }
    }

    /// Doubles the capacity, laying the live window out linearly from slot 0.
    ///
    /// The window keeps its handle numbers, so every issued handle stays valid.
    fn expand(&mut self) {
        let capacity = self.capacity();
        let new_capacity = (capacity * 2).max(1);
        let len = self.window_len();
        let start = self.window_start();

        let mut values: Vec<Option<V>> =
            std::iter::repeat_with(|| None).take(new_capacity).collect();
        let mut generations = vec![0; new_capacity];
        for step in 0..len {
            let old = (self.barrier + step) % capacity;
            values[step] = self.values[old].take();
            generations[step] = self.generations[old];
        }

        self.values = values;
        self.generations = generations;
        self.offset = start;
        self.barrier = 0;
        self.next = len;
        self.change_magic += 1;
        debug!(capacity, new_capacity, live = self.size, "expanded handle map");
    }

    fn validate(&self, handle: Handle) -> Result<usize, HandleError> {
        let index = self
            .index_from_handle(handle.number())
            .ok_or(HandleError::OutOfBounds(handle))?;
        let current = self.generations[index];
        if current != handle.generation() {
            return Err(HandleError::GenerationMismatch { handle, current });
        }
        if self.values[index].is_none() {
            return Err(HandleError::OutOfBounds(handle));
        }
        Ok(index)
    }

    pub(super) fn value_at(&self, index: usize) -> Option<&V> {
        self.values.get(index).and_then(Option::as_ref)
    }

    pub(super) fn generation_at(&self, index: usize) -> u32 {
        self.generations[index]
    }

    fn get(&self, handle: Handle) -> Result<&V, HandleError> {
        let index = self.validate(handle)?;
        self.values[index]
            .as_ref()
            .ok_or(HandleError::OutOfBounds(handle))
    }

    fn set(&mut self, handle: Handle, value: V) -> Result<V, HandleError> {
        let index = self.validate(handle)?;
        self.values[index]
            .replace(value)
            .ok_or(HandleError::OutOfBounds(handle))
    }

    pub(super) fn remove(&mut self, handle: Handle) -> bool {
        let Ok(index) = self.validate(handle) else {
            return false;
        };
        self.values[index] = None;
        self.generations[index] = self.generations[index].wrapping_add(1);
        self.size -= 1;
        self.change_magic += 1;
        self.update_barrier();
        true
    }

    fn update_barrier(&mut self) {
        if self.size == 0 {
            self.offset = self.window_end();
            self.next = 0;
            self.barrier = 0;
            debug!(offset = self.offset, "handle map drained, ring reset");
            return;
        }
        let capacity = self.capacity();
        while self.values[self.barrier].is_none() {
            self.barrier = (self.barrier + 1) % capacity;
        }
    }

    fn clear(&mut self) {
        let capacity = self.capacity();
        for step in 0..self.window_len() {
            let index = (self.barrier + step) % capacity;
            if self.values[index].take().is_some() {
                self.generations[index] = self.generations[index].wrapping_add(1);
            }
        }
        self.offset = self.window_end();
        self.size = 0;
        self.next = 0;
        self.barrier = 0;
        self.change_magic += 1;
    }
}

/// An in-memory handle map backed by a ring of reusable slots.
///
/// Every operation takes the single lock of the map, so a map can be shared between
/// threads behind an `Arc`. Lookups are O(1); `put` is O(1) unless the ring is saturated,
/// in which case it either reuses a freed slot (a forward scan) or doubles the capacity.
pub struct MemHandleMap<V> {
    slots: Mutex<Slots<V>>,
    load_factor: f32,
}

impl<V> MemHandleMap<V> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Mutex::new(Slots::with_capacity(capacity.max(1))),
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }

    pub fn with_config(config: &HandleMapConfig) -> Result<Self, HandleError> {
        config.validate()?;
        Ok(Self {
            slots: Mutex::new(Slots::with_capacity(config.initial_capacity)),
            load_factor: config.load_factor,
        })
    }

    pub(super) fn lock(&self) -> Result<MutexGuard<'_, Slots<V>>, HandleError> {
        self.slots.lock().map_err(|_| HandleError::LockPoisoned)
    }

    /// Stores `value` and returns the handle addressing it.
    pub fn put(&self, value: V) -> Result<Handle, HandleError> {
        let mut slots = self.lock()?;
        let (index, handle) = slots.claim(self.load_factor);
        slots.values[index] = Some(value);
        Ok(handle)
    }

    /// Looks `handle` up and returns a clone of the stored value.
    ///
    /// Fails with [`HandleError::OutOfBounds`] when the handle does not map into the live
    /// window and with [`HandleError::GenerationMismatch`] when the slot has moved on to a
    /// newer generation.
    pub fn get(&self, handle: Handle) -> Result<V, HandleError>
    where
        V: Clone,
    {
        self.lock()?.get(handle).cloned()
    }

    /// Runs `f` on the value stored under `handle` without cloning it.
    pub fn with_value<R>(&self, handle: Handle, f: impl FnOnce(&V) -> R) -> Result<R, HandleError> {
        let slots = self.lock()?;
        slots.get(handle).map(f)
    }

    pub fn set(&self, handle: Handle, value: V) -> Result<V, HandleError> {
        self.lock()?.set(handle, value)
    }

    /// Removes the value stored under `handle`. Returns `Ok(false)` for a stale handle.
    pub fn remove(&self, handle: Handle) -> Result<bool, HandleError> {
        Ok(self.lock()?.remove(handle))
    }

    /// Whether `handle` addresses a live value. A poisoned map holds none, see
    /// [`MemHandleMap::is_poisoned`].
    pub fn contains(&self, handle: Handle) -> bool {
        self.lock()
            .map(|slots| slots.validate(handle).is_ok())
            .unwrap_or(false)
    }

    /// Number of live values, `0` once the map is poisoned.
    pub fn len(&self) -> usize {
        self.lock().map(|slots| slots.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slot capacity, `0` once the map is poisoned.
    pub fn capacity(&self) -> usize {
        self.lock().map(|slots| slots.capacity()).unwrap_or(0)
    }

    /// Whether a thread panicked while holding the map's lock.
    ///
    /// A poisoned map is closed: every fallible operation fails with
    /// [`HandleError::LockPoisoned`] and the plain queries above answer as if it were
    /// empty. Check this to tell the two apart.
    pub fn is_poisoned(&self) -> bool {
        self.slots.is_poisoned()
    }

    pub fn load_factor(&self) -> f32 {
        self.load_factor
    }

    /// Drops every value. All outstanding handles become stale.
    pub fn clear(&self) -> Result<(), HandleError> {
        self.lock()?.clear();
        Ok(())
    }

    /// Iterates the live values from oldest to newest.
    ///
    /// Any `put` or `remove` that does not go through the iterator itself invalidates it:
    /// the next step yields [`HandleError::ConcurrentModification`].
    pub fn iter(&self) -> Iter<'_, V>
    where
        V: Clone,
    {
        Iter::new(self)
    }
}

impl<V: HandleAware> MemHandleMap<V> {
    /// Stores `value` after telling it the handle it is stored under.
    pub fn put_aware(&self, mut value: V) -> Result<Handle, HandleError> {
        let mut slots = self.lock()?;
        let (index, handle) = slots.claim(self.load_factor);
        value.set_handle(handle);
        slots.values[index] = Some(value);
        Ok(handle)
    }
}

impl<V> Default for MemHandleMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> HandleMap<V> for MemHandleMap<V> {
    fn put(&self, value: V) -> Result<Handle, HandleError> {
        MemHandleMap::put(self, value)
    }

    fn get(&self, handle: Handle) -> Result<V, HandleError>
    where
        V: Clone,
    {
        MemHandleMap::get(self, handle)
    }

    fn set(&self, handle: Handle, value: V) -> Result<V, HandleError> {
        MemHandleMap::set(self, handle, value)
    }

    fn remove(&self, handle: Handle) -> Result<bool, HandleError> {
        MemHandleMap::remove(self, handle)
    }

    fn contains(&self, handle: Handle) -> bool {
        MemHandleMap::contains(self, handle)
    }

    fn len(&self) -> usize {
        MemHandleMap::len(self)
    }

    fn clear(&self) -> Result<(), HandleError> {
        MemHandleMap::clear(self)
    }
}

impl<V, T> TransactionedHandleMap<V, T> for MemHandleMap<V> {
    fn put(&self, _transaction: &mut T, value: V) -> Result<Handle, HandleError> {
        MemHandleMap::put(self, value)
    }

    fn get(&self, _transaction: &mut T, handle: Handle) -> Result<V, HandleError>
    where
        V: Clone,
    {
        MemHandleMap::get(self, handle)
    }

    fn set(&self, _transaction: &mut T, handle: Handle, value: V) -> Result<V, HandleError> {
        MemHandleMap::set(self, handle, value)
    }

    fn remove(&self, _transaction: &mut T, handle: Handle) -> Result<bool, HandleError> {
        MemHandleMap::remove(self, handle)
    }

    fn contains(&self, _transaction: &mut T, handle: Handle) -> bool {
        MemHandleMap::contains(self, handle)
    }
}

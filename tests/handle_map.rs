//! Tests for the generational in-memory handle map.
use procgraph::config::HandleMapConfig;
use procgraph::handle::TransactionedHandleMap;
use procgraph::prelude::*;
use std::sync::Arc;
use std::thread;

#[test]
fn test_handle_packs_generation_and_number() {
    let handle = Handle::new(3, 7);
    assert_eq!(handle.generation(), 3);
    assert_eq!(handle.number(), 7);
    assert_eq!(handle.as_u64(), (3 << 32) | 7);
    assert_eq!(Handle::from(handle.as_u64()), handle);
    assert_eq!(handle.to_string(), "3:7");
}

#[test]
fn test_put_get_round_trip() {
    let map = MemHandleMap::new();
    let handle = map.put("value".to_string()).unwrap();
    assert_eq!(map.get(handle).unwrap(), "value");
    assert!(map.contains(handle));
    assert_eq!(map.len(), 1);
}

#[test]
fn test_removed_handle_no_longer_resolves() {
    let map = MemHandleMap::new();
    let keep = map.put(1).unwrap();
    let handle = map.put(2).unwrap();

    assert_eq!(map.remove(handle), Ok(true));
    assert!(matches!(
        map.get(handle),
        Err(HandleError::GenerationMismatch { current: 1, .. })
    ));
    // Removing twice is not an error, it just does nothing.
    assert_eq!(map.remove(handle), Ok(false));
    assert_eq!(map.get(keep), Ok(1));
}

#[test]
fn test_freed_slot_is_reused_with_next_generation() {
    let map = MemHandleMap::with_capacity(4);
    let handles: Vec<Handle> = (0..4).map(|i| map.put(i).unwrap()).collect();
    assert!(handles.iter().all(|h| h.generation() == 0));

    assert_eq!(map.remove(handles[1]), Ok(true));
    let reused = map.put(4).unwrap();

    assert_eq!(reused.number(), handles[1].number());
    assert_eq!(reused.generation(), 1);
    assert_eq!(map.capacity(), 4);
    assert_eq!(
        map.get(handles[1]),
        Err(HandleError::GenerationMismatch {
            handle: handles[1],
            current: 1
        })
    );
    assert_eq!(map.get(reused), Ok(4));
}

#[test]
fn test_generation_increases_on_every_reuse() {
    let map = MemHandleMap::with_capacity(1);
    let mut previous: Vec<Handle> = Vec::new();
    for round in 0..5u32 {
        let handle = map.put(round).unwrap();
        assert_eq!(handle.generation(), round);
        for old in &previous {
            assert!(map.get(*old).is_err(), "handle {old} still resolves");
        }
        assert_eq!(map.remove(handle), Ok(true));
        previous.push(handle);
    }
    assert!(map.is_empty());
}

#[test]
fn test_expansion_keeps_handles_valid() {
    let map = MemHandleMap::new();
    let handles: Vec<Handle> = (0..20).map(|i| map.put(i).unwrap()).collect();
    assert!(map.capacity() >= 20);
    for (i, handle) in handles.iter().enumerate() {
        assert_eq!(map.get(*handle), Ok(i));
    }
}

#[test]
fn test_load_factor_triggers_expansion_instead_of_reuse() {
    let config = HandleMapConfig {
        initial_capacity: 4,
        load_factor: 0.5,
    };
    let map = MemHandleMap::with_config(&config).unwrap();
    let handles: Vec<Handle> = (0..4).map(|i| map.put(i).unwrap()).collect();
    map.remove(handles[1]).unwrap();

    // Three of four slots are taken, above the load factor: grow rather than reuse.
    let next = map.put(10).unwrap();
    assert_eq!(map.capacity(), 8);
    assert_eq!(next, Handle::new(0, 4));
    for handle in [handles[0], handles[2], handles[3]] {
        assert!(map.contains(handle));
    }
    assert!(!map.contains(handles[1]));
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = HandleMapConfig {
        initial_capacity: 0,
        load_factor: 0.9,
    };
    assert!(matches!(
        MemHandleMap::<u8>::with_config(&config),
        Err(HandleError::InvalidConfig(_))
    ));
}

#[test]
fn test_set_replaces_value() {
    let map = MemHandleMap::new();
    let handle = map.put("old").unwrap();
    assert_eq!(map.set(handle, "new"), Ok("old"));
    assert_eq!(map.get(handle), Ok("new"));
    assert_eq!(map.with_value(handle, |v| v.len()), Ok(3));
}

#[test]
fn test_handle_outside_window_is_out_of_bounds() {
    let map: MemHandleMap<u8> = MemHandleMap::new();
    assert_eq!(
        map.get(Handle::new(0, 42)),
        Err(HandleError::OutOfBounds(Handle::new(0, 42)))
    );
    assert_eq!(map.remove(Handle::INVALID), Ok(false));
}

#[test]
fn test_clear_invalidates_everything() {
    let map = MemHandleMap::new();
    let handles: Vec<Handle> = (0..3).map(|i| map.put(i).unwrap()).collect();
    map.clear().unwrap();
    assert!(map.is_empty());
    assert!(handles.iter().all(|h| !map.contains(*h)));

    let fresh = map.put(7).unwrap();
    assert_eq!(map.get(fresh), Ok(7));
    assert_eq!(fresh.generation(), 1);
}

#[test]
fn test_iteration_yields_live_entries_in_order() {
    let map = MemHandleMap::with_capacity(4);
    let handles: Vec<Handle> = (0..4).map(|i| map.put(i * 10).unwrap()).collect();
    map.remove(handles[2]).unwrap();

    let entries: Vec<(Handle, i32)> = map.iter().collect::<std::result::Result<_, _>>().unwrap();
    assert_eq!(
        entries,
        vec![(handles[0], 0), (handles[1], 10), (handles[3], 30)]
    );
}

#[test]
fn test_iteration_fails_after_outside_modification() {
    let map = MemHandleMap::new();
    map.put(1).unwrap();
    map.put(2).unwrap();

    let mut iter = map.iter();
    assert!(matches!(iter.next(), Some(Ok((_, 1)))));
    map.put(3).unwrap();
    assert_eq!(iter.next(), Some(Err(HandleError::ConcurrentModification)));
    assert_eq!(iter.next(), None);
}

#[test]
fn test_iterator_remove_current() {
    let map = MemHandleMap::new();
    let handles: Vec<Handle> = (0..5).map(|i| map.put(i).unwrap()).collect();

    let mut iter = map.iter();
    let mut seen = Vec::new();
    while let Some(entry) = iter.next() {
        let (handle, value) = entry.unwrap();
        seen.push(value);
        if value % 2 == 0 {
            assert_eq!(iter.current(), Some(handle));
            assert_eq!(iter.remove_current(), Ok(true));
        }
    }

    assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    assert_eq!(map.len(), 2);
    assert!(map.contains(handles[1]));
    assert!(map.contains(handles[3]));
    assert!(!map.contains(handles[4]));
}

#[test]
fn test_iterator_stops_when_map_drains() {
    let map = MemHandleMap::new();
    map.put("only").unwrap();

    let mut iter = map.iter();
    assert!(matches!(iter.next(), Some(Ok((_, "only")))));
    assert_eq!(iter.remove_current(), Ok(true));
    assert_eq!(iter.next(), None);
    assert_eq!(iter.remove_current(), Ok(false));
}

#[derive(Clone, Debug)]
struct Instance {
    name: &'static str,
    handle: Option<Handle>,
}

impl HandleAware for Instance {
    fn handle(&self) -> Option<Handle> {
        self.handle
    }

    fn set_handle(&mut self, handle: Handle) {
        self.handle = Some(handle);
    }
}

#[test]
fn test_handle_aware_values_learn_their_handle() {
    let map = MemHandleMap::new();
    let handle = map
        .put_aware(Instance {
            name: "order-1",
            handle: None,
        })
        .unwrap();

    let stored = map.get(handle).unwrap();
    assert_eq!(stored.name, "order-1");
    assert_eq!(stored.handle(), Some(handle));
}

#[test]
fn test_trait_objects_and_transactions() {
    fn store<M: HandleMap<String>>(map: &M) -> Handle {
        map.put("via trait".to_string()).unwrap()
    }

    let map = MemHandleMap::new();
    let handle = store(&map);
    assert_eq!(HandleMap::get(&map, handle).unwrap(), "via trait");

    let mut transaction = ();
    let other = TransactionedHandleMap::put(&map, &mut transaction, "in tx".to_string()).unwrap();
    assert!(TransactionedHandleMap::contains(&map, &mut transaction, other));
    assert_eq!(
        TransactionedHandleMap::remove(&map, &mut transaction, other),
        Ok(true)
    );
    assert_eq!(HandleMap::len(&map), 1);
}

#[test]
fn test_map_is_shared_between_threads() {
    let map = Arc::new(MemHandleMap::new());
    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let map = Arc::clone(&map);
            thread::spawn(move || {
                (0..50)
                    .map(|i| map.put(worker * 100 + i).unwrap())
                    .collect::<Vec<Handle>>()
            })
        })
        .collect();

    let handles: Vec<Handle> = workers
        .into_iter()
        .flat_map(|worker| worker.join().unwrap())
        .collect();

    assert_eq!(map.len(), 200);
    for handle in handles {
        assert!(map.contains(handle));
    }
}

#[test]
fn test_poisoned_map_is_closed() {
    let map = Arc::new(MemHandleMap::new());
    let handle = map.put(7).unwrap();
    assert!(!map.is_poisoned());

    let panicking = Arc::clone(&map);
    let outcome = thread::spawn(move || {
        panicking.with_value(handle, |_| -> () { panic!("worker failed") })
    })
    .join();
    assert!(outcome.is_err());

    assert!(map.is_poisoned());
    assert_eq!(map.get(handle), Err(HandleError::LockPoisoned));
    assert_eq!(map.put(8), Err(HandleError::LockPoisoned));
    assert!(!map.contains(handle));
    assert_eq!(map.len(), 0);
    assert!(map.is_empty());
    assert_eq!(map.capacity(), 0);
}

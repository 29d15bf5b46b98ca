//! Multi-threaded tests of the memory container protocol

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use ucontainer::{ActorId, ContainerError, MemoryManager, RecordingMapper, Region};

const A: ActorId = ActorId::new(101);
const B: ActorId = ActorId::new(102);

#[test]
fn concurrent_creates_share_one_container() {
    const ACTORS: u64 = 8;
    let manager = Arc::new(MemoryManager::new());
    let barrier = Arc::new(Barrier::new(ACTORS as usize));

    let handles: Vec<_> = (0..ACTORS)
        .map(|id| {
            let manager = Arc::clone(&manager);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                manager.create(ActorId::new(id), 3).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = manager.stats();
    assert_eq!(stats.containers, 1);
    assert_eq!(stats.members, ACTORS as usize);
    assert_eq!(manager.info(3).unwrap().members.len(), ACTORS as usize);
}

#[test]
fn members_alias_the_same_storage() {
    let manager = Arc::new(MemoryManager::new());
    manager.create(A, 1).unwrap();
    manager.create(B, 1).unwrap();

    // Each member has its own address space
    let space_a = RecordingMapper::new();
    let space_b = RecordingMapper::new();
    let first = manager.map(A, 0, Region::new(0x4000_0000, 4096), &space_a).unwrap();
    let second = manager.map(B, 0, Region::new(0x7000_0000, 4096), &space_b).unwrap();

    assert_eq!(first, second);
    assert_eq!(space_a.descriptor_at(0x4000_0000), Some(first));
    assert_eq!(space_b.descriptor_at(0x7000_0000), Some(first));

    let writer = {
        let manager = Arc::clone(&manager);
        thread::spawn(move || {
            manager
                .with_object(A, 0, |bytes| bytes[..5].copy_from_slice(b"hello"))
                .unwrap();
        })
    };
    writer.join().unwrap();

    let seen = manager.with_object(B, 0, |bytes| bytes[..5].to_vec()).unwrap();
    assert_eq!(seen, b"hello");
    assert_eq!(manager.stats().objects, 1);
}

#[test]
fn lock_excludes_other_members() {
    let manager = Arc::new(MemoryManager::new());
    manager.create(A, 1).unwrap();
    manager.create(B, 1).unwrap();
    manager.lock(A, 4).unwrap();

    let waiter = {
        let manager = Arc::clone(&manager);
        thread::spawn(move || manager.lock(B, 4))
    };

    thread::sleep(Duration::from_millis(50));
    let lock = manager.lock_of(A, 4).unwrap();
    assert_eq!(lock.holder(), Some(A));
    assert!(!waiter.is_finished());

    manager.unlock(A, 4).unwrap();
    waiter.join().unwrap().unwrap();
    assert_eq!(lock.holder(), Some(B));
    manager.unlock(B, 4).unwrap();
}

#[test]
fn lock_waits_do_not_block_other_containers() {
    let manager = Arc::new(MemoryManager::new());
    manager.create(A, 1).unwrap();
    manager.create(B, 1).unwrap();
    manager.lock(A, 0).unwrap();

    let waiter = {
        let manager = Arc::clone(&manager);
        thread::spawn(move || manager.lock(B, 0))
    };
    thread::sleep(Duration::from_millis(20));

    // Administration of another container proceeds while B waits
    let other = ActorId::new(200);
    let mapper = RecordingMapper::new();
    manager.create(other, 2).unwrap();
    manager.map(other, 0, Region::new(0, 64), &mapper).unwrap();
    manager.lock(other, 0).unwrap();
    manager.unlock(other, 0).unwrap();

    manager.unlock(A, 0).unwrap();
    waiter.join().unwrap().unwrap();
}

#[test]
fn lock_survives_free() {
    let manager = MemoryManager::new();
    let mapper = RecordingMapper::new();
    manager.create(A, 1).unwrap();
    manager.map(A, 6, Region::new(0, 128), &mapper).unwrap();
    manager.lock(A, 6).unwrap();
    let before = manager.lock_of(A, 6).unwrap();
    manager.unlock(A, 6).unwrap();

    manager.free(A, 6).unwrap();
    manager.lock(A, 6).unwrap();
    let after = manager.lock_of(A, 6).unwrap();

    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(manager.stats().objects, 0);
    assert_eq!(manager.stats().locks, 1);

    // A fresh map of the freed id allocates new zeroed storage
    manager.map(A, 6, Region::new(0x10000, 128), &mapper).unwrap();
    let zeroed = manager.with_object(A, 6, |bytes| bytes.iter().all(|b| *b == 0)).unwrap();
    assert!(zeroed);
}

#[test]
fn destroy_aborts_lock_waiters() {
    let manager = Arc::new(MemoryManager::new());
    manager.create(A, 1).unwrap();
    manager.create(B, 1).unwrap();
    manager.lock(A, 2).unwrap();

    let waiter = {
        let manager = Arc::clone(&manager);
        thread::spawn(move || manager.lock(B, 2))
    };
    thread::sleep(Duration::from_millis(20));

    let summary = manager.destroy(1).unwrap();
    assert_eq!(summary.locks_retired, 1);

    let result = waiter.join().unwrap();
    assert!(matches!(result, Err(ContainerError::LockAborted { object: 2 })));
    assert_eq!(manager.container_of(A), None);
}

#[test]
fn leaving_member_keeps_its_lock() {
    let manager = Arc::new(MemoryManager::new());
    manager.create(A, 1).unwrap();
    manager.create(B, 1).unwrap();
    manager.lock(A, 0).unwrap();
    manager.delete(A).unwrap();

    let lock = manager.lock_of(B, 0).unwrap();
    assert_eq!(lock.holder(), Some(A));
    assert!(!manager.try_lock(B, 0).unwrap());
}

#[test]
fn failed_operations_leave_state_unchanged() {
    let manager = MemoryManager::new();
    let mapper = RecordingMapper::new();
    manager.create(A, 1).unwrap();
    manager.map(A, 1, Region::new(0, 64), &mapper).unwrap();
    let before = manager.stats();

    assert!(manager.unlock(A, 1).unwrap_err().is_not_found());
    assert!(manager.free(A, 2).unwrap_err().is_not_found());
    assert!(manager.free(B, 1).unwrap_err().is_not_found());
    assert!(manager.delete(B).unwrap_err().is_not_found());

    assert_eq!(manager.stats(), before);
}

#[test]
fn teardown_releases_each_object_once() {
    let manager = MemoryManager::new();
    let mapper = RecordingMapper::new();
    manager.create(A, 1).unwrap();
    manager.create(B, 2).unwrap();

    // Locks before objects in one container, objects before locks in the other
    manager.lock(A, 0).unwrap();
    manager.lock(A, 1).unwrap();
    manager.map(A, 0, Region::new(0, 4096), &mapper).unwrap();
    manager.map(A, 1, Region::new(0x1000, 4096), &mapper).unwrap();
    manager.map(B, 0, Region::new(0x2000, 4096), &mapper).unwrap();
    manager.lock(B, 0).unwrap();
    manager.free(A, 1).unwrap();

    let summary = manager.teardown();
    assert_eq!(summary.containers, 2);
    assert_eq!(summary.objects, 2);
    assert_eq!(summary.bytes_released, 2 * 4096);
    assert_eq!(summary.locks_retired, 3);

    let again = manager.teardown();
    assert_eq!(again.objects, 0);
    assert_eq!(again.bytes_released, 0);
}

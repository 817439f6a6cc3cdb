use crate::InvocationGuard;

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};

/// WHAT: Second acquire fails while the first permit is alive
/// WHY: At most one replay save may run at a time
#[test]
fn given_held_permit_when_acquiring_again_then_rejected() {
    // Given: A guard with one outstanding permit
    let guard = Arc::new(InvocationGuard::new());
    let permit = guard.try_acquire();
    assert!(permit.is_some());

    // When: Acquiring again
    let second = guard.try_acquire();

    // Then: Rejected and still busy
    assert!(second.is_none());
    assert!(guard.is_busy());
}

/// WHAT: Dropping the permit releases the guard
/// WHY: Release must happen on every exit path without explicit calls
#[test]
fn given_permit_when_dropped_then_guard_can_be_acquired_again() {
    let guard = Arc::new(InvocationGuard::new());

    let permit = guard.try_acquire();
    drop(permit);

    assert!(!guard.is_busy());
    assert!(guard.try_acquire().is_some());
}

/// WHAT: Permit is released during unwinding
/// WHY: An unexpected fault must not leave the guard stuck
#[test]
fn given_panic_while_holding_permit_then_guard_released() {
    let guard = Arc::new(InvocationGuard::new());
    let cloned = Arc::clone(&guard);

    let result = std::panic::catch_unwind(move || {
        let _permit = cloned.try_acquire();
        #[allow(clippy::panic)]
        {
            panic!("fault inside guarded section");
        }
    });

    assert!(result.is_err());
    assert!(!guard.is_busy());
}

/// WHAT: Exactly one of many racing threads wins
/// WHY: try_acquire must be an atomic check-and-set
#[test]
#[allow(clippy::unwrap_used)]
fn given_racing_threads_when_acquiring_then_exactly_one_wins() {
    let guard = Arc::new(InvocationGuard::new());
    let winners = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(std::sync::Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let guard = Arc::clone(&guard);
            let winners = Arc::clone(&winners);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                if let Some(permit) = guard.try_acquire() {
                    winners.fetch_add(1, Ordering::SeqCst);
                    // Hold until every thread has tried.
                    thread::sleep(std::time::Duration::from_millis(50));
                    drop(permit);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(winners.load(Ordering::SeqCst), 1);
    assert!(!guard.is_busy());
}

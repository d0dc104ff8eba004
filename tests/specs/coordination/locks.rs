//! Event locking between workstations
//!
//! Verify mutual exclusion and viewer-relative lock status over the socket.

use crate::prelude::*;

#[tokio::test]
async fn lock_cycle_between_two_workstations() {
    let hz = TestDaemon::start("node-a").await;
    let a = hz.workstation("WS-A");
    let b = hz.workstation("WS-B");

    assert!(matches!(a.acquire("E1").await, LockResponse::Info { .. }));
    assert_eq!(b.lock_status("E1").await, LockStatus::LockedByOther);
    assert_eq!(a.lock_status("E1").await, LockStatus::LockedByMe);

    assert_eq!(
        b.release("E1").await,
        LockResponse::Refused {
            refusal: LockRefusal::NotOwner {
                holder: Some(a.id.clone()),
            },
        }
    );
    assert_eq!(a.release("E1").await, LockResponse::Released { count: 1 });

    assert_eq!(a.lock_status("E1").await, LockStatus::Lockable);
    assert_eq!(b.lock_status("E1").await, LockStatus::Lockable);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_workstations_get_exactly_one_lock() {
    let hz = TestDaemon::start("node-a").await;
    let socket = hz.socket();

    let handles: Vec<_> = (0..6)
        .map(|n| {
            let socket = socket.clone();
            tokio::spawn(async move {
                let ws = Workstation::connect(&format!("WS-{n}"), &socket);
                matches!(ws.acquire("E7").await, LockResponse::Info { .. })
            })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);

    let mut owners = 0;
    for n in 0..6 {
        let ws = hz.workstation(&format!("WS-{n}"));
        if ws.lock_status("E7").await == LockStatus::LockedByMe {
            owners += 1;
        }
    }
    assert_eq!(owners, 1);
}

#[tokio::test]
async fn ending_a_session_frees_its_locks() {
    let hz = TestDaemon::start("node-a").await;
    let a = hz.workstation("WS-A");
    let b = hz.workstation("WS-B");
    a.acquire("E1").await;
    a.acquire("E2").await;

    let released = a
        .send(LockRequest::ReleaseAll {
            workstation: a.id.clone(),
        })
        .await;

    assert_eq!(released, LockResponse::Released { count: 2 });
    assert!(matches!(b.acquire("E2").await, LockResponse::Info { .. }));
}

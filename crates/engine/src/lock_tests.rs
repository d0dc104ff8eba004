// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hz_core::LockStatus;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Barrier;

fn ws(name: &str) -> WorkstationId {
    WorkstationId::new(name)
}

fn ev(id: &str) -> EventId {
    EventId::new(id)
}

#[test]
fn acquire_query_release_cycle() {
    let locks = LockManager::default();
    let (e1, a, b) = (ev("E1"), ws("WS-A"), ws("WS-B"));

    locks.acquire(&e1, &a).unwrap();
    assert_eq!(locks.query(&e1, &b).lock_status, LockStatus::LockedByOther);
    assert_eq!(locks.query(&e1, &a).lock_status, LockStatus::LockedByMe);

    let err = locks.release(&e1, &b).unwrap_err();
    assert_eq!(
        err,
        LockError::NotOwner {
            event_id: e1.clone(),
            workstation: b.clone(),
            holder: Some(a.clone()),
        }
    );

    locks.release(&e1, &a).unwrap();
    assert_eq!(locks.query(&e1, &a), LockInfo::lockable());
    assert_eq!(locks.query(&e1, &b), LockInfo::lockable());
}

#[test]
fn acquire_is_idempotent_for_the_holder() {
    let locks = LockManager::default();
    locks.acquire(&ev("E1"), &ws("WS-A")).unwrap();
    let info = locks.acquire(&ev("E1"), &ws("WS-A")).unwrap();
    assert_eq!(info.lock_status, LockStatus::LockedByMe);
}

#[test]
fn acquire_held_by_other_conflicts() {
    let locks = LockManager::default();
    locks.acquire(&ev("E1"), &ws("WS-A")).unwrap();

    let err = locks.acquire(&ev("E1"), &ws("WS-B")).unwrap_err();
    assert_eq!(
        err,
        LockError::Conflict {
            event_id: ev("E1"),
            holder: ws("WS-A"),
        }
    );
}

#[test]
fn release_of_unlocked_event_is_not_owner() {
    let locks = LockManager::default();
    let err = locks.release(&ev("E1"), &ws("WS-A")).unwrap_err();
    assert!(matches!(err, LockError::NotOwner { holder: None, .. }));
}

#[yare::parameterized(
    single_shard = { 1 },
    few_shards   = { 4 },
    many_shards  = { 64 },
)]
fn concurrent_acquires_have_one_winner(shards: usize) {
    let locks = Arc::new(LockManager::new(shards));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let locks = Arc::clone(&locks);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                locks.acquire(&ev("E1"), &ws(&format!("WS-{n}"))).is_ok()
            })
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|won| *won)
        .count();
    assert_eq!(winners, 1);

    let me = (0..8)
        .filter(|n| {
            locks.query(&ev("E1"), &ws(&format!("WS-{n}"))).lock_status == LockStatus::LockedByMe
        })
        .count();
    assert_eq!(me, 1);
}

#[test]
fn different_events_lock_independently() {
    let locks = LockManager::new(2);
    for n in 0..20 {
        locks
            .acquire(&ev(&format!("E{n}")), &ws(if n % 2 == 0 { "WS-A" } else { "WS-B" }))
            .unwrap();
    }
    assert_eq!(locks.held_by(&ws("WS-A")).len(), 10);
    assert_eq!(locks.held_by(&ws("WS-B")).len(), 10);
}

#[test]
fn release_all_drops_only_that_workstation() {
    let locks = LockManager::default();
    locks.acquire(&ev("E1"), &ws("WS-A")).unwrap();
    locks.acquire(&ev("E2"), &ws("WS-A")).unwrap();
    locks.acquire(&ev("E3"), &ws("WS-B")).unwrap();

    assert_eq!(locks.release_all(&ws("WS-A")), vec![ev("E1"), ev("E2")]);
    assert!(locks.held_by(&ws("WS-A")).is_empty());
    assert_eq!(locks.holder(&ev("E3")), Some(ws("WS-B")));
}

#[test]
fn break_lock_reports_previous_holder() {
    let locks = LockManager::default();
    locks.acquire(&ev("E1"), &ws("WS-A")).unwrap();

    assert_eq!(locks.break_lock(&ev("E1"), &ws("WS-B")), Some(ws("WS-A")));
    assert_eq!(locks.query(&ev("E1"), &ws("WS-A")), LockInfo::lockable());
    assert_eq!(locks.break_lock(&ev("E1"), &ws("WS-B")), None);
}

#[test]
fn state_changes_are_posted_as_actions() {
    let registry = Arc::new(ActionRegistry::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    for action in [actions::ACQUIRED, actions::RELEASED, actions::BROKEN] {
        let seen = Arc::clone(&seen);
        registry.register(action, move |args: &Value| {
            seen.lock().push((action, args["eventId"].clone()));
            Ok(())
        });
    }
    let locks = LockManager::default().with_actions(Arc::clone(&registry));

    locks.acquire(&ev("E1"), &ws("WS-A")).unwrap();
    locks.acquire(&ev("E1"), &ws("WS-A")).unwrap();
    let _ = locks.acquire(&ev("E1"), &ws("WS-B"));
    locks.release(&ev("E1"), &ws("WS-A")).unwrap();
    locks.acquire(&ev("E2"), &ws("WS-A")).unwrap();
    locks.break_lock(&ev("E2"), &ws("WS-B"));

    let seen = seen.lock();
    let names: Vec<_> = seen.iter().map(|(name, _)| *name).collect();
    assert_eq!(
        names,
        vec!["lock.acquired", "lock.released", "lock.acquired", "lock.broken"]
    );
    assert_eq!(seen[3].1, "E2");
}

#[test]
fn handler_may_query_locks_from_inside_a_post() {
    let registry = Arc::new(ActionRegistry::new());
    let locks = Arc::new(LockManager::default().with_actions(Arc::clone(&registry)));
    let observed = Arc::new(Mutex::new(None));

    let weak = Arc::downgrade(&locks);
    let slot = Arc::clone(&observed);
    registry.register(actions::ACQUIRED, move |_: &Value| {
        if let Some(locks) = weak.upgrade() {
            *slot.lock() = Some(locks.query(&ev("E1"), &ws("WS-B")).lock_status);
        }
        Ok(())
    });

    locks.acquire(&ev("E1"), &ws("WS-A")).unwrap();
    assert_eq!(*observed.lock(), Some(LockStatus::LockedByOther));
}

//! Concurrency tests: the registry is shared across threads with no external
//! locking, and the parent graph stays acyclic even under racing edge
//! mutations.

use std::sync::Arc;
use std::thread;

use rolekit::{Action, Registry};

#[test]
fn concurrent_grants_on_different_permissions_of_one_role() {
    let registry = Arc::new(Registry::new());
    for i in 0..8 {
        registry
            .register_permission(format!("perm{i}"), "Resource", &[Action::CRUD])
            .unwrap();
    }
    registry.register_role("worker", "Worker role").unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = registry.clone();
            thread::spawn(move || {
                let id = format!("perm{i}");
                for _ in 0..100 {
                    registry.permit_id("worker", &id, &[Action::CRUD]).unwrap();
                    registry
                        .revoke_id("worker", &id, &[Action::CREATE, Action::UPDATE])
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for i in 0..8 {
        let id = format!("perm{i}");
        assert!(registry.is_granted_id("worker", &id, &[Action::READ, Action::DELETE]));
        assert!(!registry.is_granted_id("worker", &id, &[Action::CREATE]));
    }
}

#[test]
fn racing_reverse_edges_cannot_close_a_cycle() {
    for _ in 0..50 {
        let registry = Arc::new(Registry::new());
        registry.register_role("a", "Role A").unwrap();
        registry.register_role("b", "Role B").unwrap();

        let forward = {
            let registry = registry.clone();
            thread::spawn(move || registry.add_parent("a", "b").is_ok())
        };
        let reverse = {
            let registry = registry.clone();
            thread::spawn(move || registry.add_parent("b", "a").is_ok())
        };
        let forward_ok = forward.join().unwrap();
        let reverse_ok = reverse.join().unwrap();

        // Whichever edge took the lock first wins; the other is a cycle.
        assert!(forward_ok ^ reverse_ok);
        let a = registry.role("a").unwrap();
        let b = registry.role("b").unwrap();
        assert!(!(a.has_parent("b") && b.has_parent("a")));
    }
}

#[test]
fn concurrent_registration_admits_exactly_one() {
    let registry = Arc::new(Registry::new());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = registry.clone();
            thread::spawn(move || registry.register_role("admin", "Admin role").is_ok())
        })
        .collect();
    let successes = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|registered| *registered)
        .count();

    assert_eq!(successes, 1);
    assert!(registry.role_exists("admin"));
}

//! Concurrent writers against one on-disk store.
//!
//! Each recipient's mutation is a single-row update keyed
//! `(message_id, recipient_id)`, so writers for different recipients of the
//! same message must commit independently without clobbering each other.
//! Threads use separate connections, as concurrent request handlers would.

use muster_core::db::{open_store, store};
use muster_core::model::MessageFields;
use std::collections::BTreeSet;
use std::path::Path;
use std::thread;

fn seed_broadcast(path: &Path, message_id: &str, users: &[String]) {
    let mut conn = open_store(path).expect("open store");
    let fields = MessageFields {
        id: message_id.to_string(),
        title: "Festival volunteers needed".to_string(),
        body: "Sign up for a Saturday slot.".to_string(),
        created_at_us: 1_000,
        ..MessageFields::default()
    };
    let recipients: BTreeSet<String> = users.iter().cloned().collect();
    store::insert_message(&mut conn, &fields, &recipients).expect("insert");
}

#[test]
fn concurrent_deletes_by_different_recipients_commit_independently() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("store.sqlite3");
    let users = vec!["vol-a".to_string(), "vol-b".to_string()];
    seed_broadcast(&path, "nt-c1", &users);

    thread::scope(|scope| {
        for user in &users {
            let path = path.clone();
            scope.spawn(move || {
                let conn = open_store(&path).expect("open store");
                let updated =
                    store::mark_deleted_from_system(&conn, "nt-c1", user, 2_000).expect("delete");
                assert!(updated, "row for {user} must exist");
            });
        }
    });

    let conn = open_store(&path).expect("open store");
    for user in &users {
        let state = store::get_recipient_state(&conn, "nt-c1", user)
            .expect("query")
            .expect("state row");
        assert!(state.deleted_from_system, "delete lost for {user}");
        assert!(!state.removed_from_bell);
        assert!(!state.read_in_bell && !state.read_in_system);
    }
}

#[test]
fn many_recipients_mutating_the_same_message_never_interfere() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("store.sqlite3");
    let users: Vec<String> = (0..8).map(|i| format!("vol-{i:02}")).collect();
    seed_broadcast(&path, "nt-c2", &users);

    // Even-numbered volunteers read, odd-numbered remove from the bell.
    thread::scope(|scope| {
        for (i, user) in users.iter().enumerate() {
            let path = path.clone();
            scope.spawn(move || {
                let conn = open_store(&path).expect("open store");
                let updated = if i % 2 == 0 {
                    store::mark_read(&conn, "nt-c2", user, 3_000).expect("read")
                } else {
                    store::mark_removed_from_bell(&conn, "nt-c2", user, 3_000).expect("remove")
                };
                assert!(updated);
            });
        }
    });

    let conn = open_store(&path).expect("open store");
    for (i, user) in users.iter().enumerate() {
        let state = store::get_recipient_state(&conn, "nt-c2", user)
            .expect("query")
            .expect("state row");
        if i % 2 == 0 {
            assert!(state.read_in_bell && state.read_in_system, "read lost for {user}");
            assert!(!state.removed_from_bell);
        } else {
            assert!(state.removed_from_bell, "removal lost for {user}");
            assert!(!state.read_in_bell && !state.read_in_system);
        }
    }
}

#[test]
fn same_recipient_concurrent_reads_settle_on_read_state() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("store.sqlite3");
    seed_broadcast(&path, "nt-c3", &["vol-a".to_string()]);

    // Last write wins is acceptable; both writes raise the same flags, so
    // any interleaving must converge on the read state.
    thread::scope(|scope| {
        for _ in 0..4 {
            let path = path.clone();
            scope.spawn(move || {
                let conn = open_store(&path).expect("open store");
                assert!(store::mark_read(&conn, "nt-c3", "vol-a", 4_000).expect("read"));
            });
        }
    });

    let conn = open_store(&path).expect("open store");
    let state = store::get_recipient_state(&conn, "nt-c3", "vol-a")
        .expect("query")
        .expect("state row");
    assert!(state.read_in_bell && state.read_in_system);
    assert_eq!(state.last_interaction_at_us, Some(4_000));
}

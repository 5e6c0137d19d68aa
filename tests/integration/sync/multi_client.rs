use std::sync::Arc;
use std::time::{Duration, Instant};

use boardsync::sync::{LocalCache, MemoryCache, RemoteError, SyncStatus};
use boardsync::{ClientContext, Credential, MemoryRemote, NewCard};

use crate::fixtures::{Peer, options, options_with_cache};

#[test]
fn edits_propagate_between_clients() {
    let remote = MemoryRemote::new();
    let mut alice = Peer::connect(options("alice", &remote));
    let mut bob = Peer::connect(options("bob", &remote));

    alice
        .engine
        .apply(|state| state.add_project("Roadmap", 1))
        .unwrap();
    assert_eq!(remote.write_count(), 0, "write waits for the debounce window");
    assert_eq!(alice.engine.status().sync, SyncStatus::LocalAhead);

    alice.flush();
    assert_eq!(remote.write_count(), 1);
    assert_eq!(alice.engine.status().sync, SyncStatus::Synced);

    bob.pump();
    assert_eq!(bob.project_names(), vec!["Roadmap".to_string()]);
    assert_eq!(bob.engine.state(), alice.engine.state());
}

#[test]
fn own_echo_does_not_clobber_newer_local_edits() {
    let remote = MemoryRemote::new();
    let mut alice = Peer::connect(options("alice", &remote));

    alice
        .engine
        .apply(|state| state.add_project("First", 1))
        .unwrap();
    alice.engine.fire_due(Instant::now() + Duration::from_secs(5));
    alice
        .engine
        .apply(|state| state.add_project("Second", 2))
        .unwrap();

    // the echo of the first write arrives after the second edit
    alice.pump();
    assert_eq!(
        alice.project_names(),
        vec!["First".to_string(), "Second".to_string()]
    );
}

#[test]
fn burst_of_edits_is_one_write() {
    let remote = MemoryRemote::new();
    let mut alice = Peer::connect(options("alice", &remote));
    let t0 = Instant::now();

    for (offset, name) in [(0, "A"), (100, "B"), (200, "C")] {
        alice
            .engine
            .apply_at(
                |state| state.add_project(name, 0),
                t0 + Duration::from_millis(offset),
            )
            .unwrap();
    }

    alice.engine.fire_due(t0 + Duration::from_millis(699));
    assert_eq!(remote.write_count(), 0);
    alice.engine.fire_due(t0 + Duration::from_millis(700));
    assert_eq!(remote.write_count(), 1);

    let doc = remote.document().expect("remote document");
    assert_eq!(doc["projects"].as_array().map(Vec::len), Some(3));
}

#[test]
fn late_joiner_adopts_remote_state_over_its_cache() {
    let remote = MemoryRemote::new();
    let mut alice = Peer::connect(options("alice", &remote));
    alice
        .engine
        .apply(|state| {
            let pid = state.add_project("Shared", 1)?;
            state
                .project_mut(&pid)?
                .add_card(NewCard::titled("Ship it"), 2)
        })
        .unwrap();
    alice.flush();

    let stale = r#"{"schema_version":3,"projects":[{"id":"prj-old","name":"Stale"}]}"#;
    let cache = Arc::new(MemoryCache::with_document(stale));
    let carol = Peer::connect(options_with_cache("carol", &remote, cache.clone()));

    assert_eq!(carol.project_names(), vec!["Shared".to_string()]);
    let cached = cache.read().unwrap().expect("cache rewritten");
    assert!(cached.contains("Ship it"));
}

#[test]
fn offline_edits_stay_local() {
    let remote = MemoryRemote::new();
    let mut alice = Peer::connect(options("alice", &remote));
    remote.set_offline(true);

    alice
        .engine
        .apply(|state| state.add_project("Offline", 1))
        .unwrap();
    alice.flush();

    let status = alice.engine.status();
    assert_eq!(remote.write_count(), 0);
    assert_eq!(status.writer.failed, 1);
    assert!(matches!(
        status.writer.last_error,
        Some(RemoteError::Unavailable { .. })
    ));
    assert_eq!(status.sync, SyncStatus::LocalAhead);
    assert_eq!(alice.project_names(), vec!["Offline".to_string()]);

    remote.set_offline(false);
    alice
        .engine
        .apply(|state| state.add_project("Back online", 2))
        .unwrap();
    alice.flush();
    assert_eq!(remote.write_count(), 1);
    assert_eq!(alice.engine.status().sync, SyncStatus::Synced);
}

#[test]
fn writes_need_the_expected_credential() {
    let remote = MemoryRemote::with_token("s3cret");
    let mut guest = Peer::connect(options("guest", &remote));
    guest
        .engine
        .apply(|state| state.add_project("Nope", 1))
        .unwrap();
    guest.flush();
    assert_eq!(
        guest.engine.status().writer.last_error,
        Some(RemoteError::Unauthorized)
    );

    let mut member_opts = options("member", &remote);
    member_opts.client = ClientContext::named("member").with_credential(Credential::bearer("s3cret"));
    let mut member = Peer::connect(member_opts);
    member
        .engine
        .apply(|state| state.add_project("Yes", 1))
        .unwrap();
    member.flush();
    assert_eq!(remote.write_count(), 1);
    assert!(member.engine.status().writer.last_error.is_none());
}

#[test]
fn closed_remote_keeps_local_state() {
    let remote = MemoryRemote::new();
    let mut alice = Peer::connect(options("alice", &remote));
    alice
        .engine
        .apply(|state| state.add_project("Keep", 1))
        .unwrap();

    remote.close();
    alice.pump();
    assert_eq!(alice.project_names(), vec!["Keep".to_string()]);
}

#[test]
fn adopted_remote_change_supersedes_pending_local_write() {
    let remote = MemoryRemote::new();
    let mut alice = Peer::connect(options("alice", &remote));
    let mut bob = Peer::connect(options("bob", &remote));

    alice
        .engine
        .apply(|state| state.add_project("AliceEdit", 1))
        .unwrap();
    assert!(alice.engine.status().pending_write);

    bob.engine
        .apply(|state| state.add_project("BobEdit", 2))
        .unwrap();
    bob.flush();

    alice.pump();
    assert!(!alice.engine.status().pending_write);
    alice.flush();
    bob.pump();

    let remote_names: Vec<String> = remote
        .document()
        .and_then(|doc| doc["projects"].as_array().cloned())
        .unwrap_or_default()
        .iter()
        .filter_map(|project| project["name"].as_str().map(str::to_string))
        .collect();
    assert_eq!(remote_names, vec!["BobEdit".to_string()]);
    assert_eq!(alice.project_names(), remote_names);
    assert_eq!(bob.project_names(), remote_names);
    assert_eq!(remote.write_count(), 1);
    assert_eq!(alice.engine.status().sync, SyncStatus::Synced);
}

use std::time::{Duration, Instant};

use boardsync::MemoryRemote;
use boardsync::core::time::now_ms;
use boardsync::sync::{DEFAULT_FRESHNESS_MS, PresenceRecord, PresenceStore};

use crate::fixtures::{Peer, options, with_presence};

fn identities(records: &[PresenceRecord]) -> Vec<&str> {
    records.iter().map(|r| r.identity.as_str()).collect()
}

#[test]
fn peers_see_each_other_and_leave_on_shutdown() {
    let remote = MemoryRemote::new();
    let mut alice = Peer::connect(with_presence(options("alice", &remote), &remote));
    let bob = Peer::connect(with_presence(options("bob", &remote), &remote));

    alice.pump();
    assert_eq!(identities(&alice.engine.peers(now_ms())), vec!["alice", "bob"]);

    drop(bob);
    alice.pump();
    assert_eq!(identities(&alice.engine.peers(now_ms())), vec!["alice"]);
    assert_eq!(remote.presence_records().len(), 1);
}

#[test]
fn stale_records_are_hidden() {
    let remote = MemoryRemote::new();
    let now = now_ms();
    remote
        .upsert(PresenceRecord::new("ghost", "board", now - 2 * DEFAULT_FRESHNESS_MS))
        .unwrap();
    remote
        .upsert(PresenceRecord::new("elsewhere", "other-board", now))
        .unwrap();

    let mut alice = Peer::connect(with_presence(options("alice", &remote), &remote));
    alice.pump();
    assert_eq!(identities(&alice.engine.peers(now_ms())), vec!["alice"]);

    // a heartbeat brings the record back inside the window
    remote
        .upsert(PresenceRecord::new("ghost", "board", now_ms()))
        .unwrap();
    alice.pump();
    assert_eq!(identities(&alice.engine.peers(now_ms())), vec!["alice", "ghost"]);
}

#[test]
fn heartbeat_refreshes_last_seen() {
    let remote = MemoryRemote::new();
    let mut alice = Peer::connect(with_presence(options("alice", &remote), &remote));
    let joined = remote.presence_records()[0].last_seen_ms;

    let deadline = alice.engine.next_deadline().expect("heartbeat scheduled");
    assert!(deadline > Instant::now());

    std::thread::sleep(Duration::from_millis(5));
    alice.engine.fire_due(deadline);
    let refreshed = remote.presence_records()[0].last_seen_ms;
    assert!(refreshed > joined);
    assert!(alice.engine.next_deadline().expect("next beat") > deadline);
}

use std::fs;
use std::sync::Arc;

use boardsync::sync::{Engine, FileCache, LocalCache};
use boardsync::{CardPatch, MemoryRemote, NewCard, Priority};

use crate::fixtures::{Peer, options_with_cache};

#[test]
fn state_survives_a_restart_while_offline() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cache/state.json");
    let remote = MemoryRemote::new();
    remote.set_offline(true);

    let before = {
        let cache = Arc::new(FileCache::new(&path));
        let mut peer = Peer::connect(options_with_cache("alice", &remote, cache));
        peer.engine
            .apply(|state| {
                let pid = state.add_project("Launch", 1)?;
                let project = state.project_mut(&pid)?;
                let card = project.add_card(NewCard::titled("Write notes"), 2)?;
                project.update_card(
                    &card,
                    CardPatch {
                        priority: Some(Priority::High),
                        ..CardPatch::default()
                    },
                )
            })
            .unwrap();
        peer.engine.state().clone()
    };
    assert!(path.exists(), "cache written on mutation");

    let restarted = Engine::start(options_with_cache(
        "alice",
        &remote,
        Arc::new(FileCache::new(&path)),
    ));
    assert_eq!(restarted.state(), &before);
}

#[test]
fn legacy_cache_is_migrated_on_start() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.json");
    fs::write(
        &path,
        r#"{
            "projects": [{
                "title": "Old board",
                "columns": [{"id": "todo", "title": "To Do"}],
                "tasks": [
                    {"id": "t1", "name": "Legacy", "status": "to do", "priority": 0, "tags": ["ops"]}
                ]
            }],
            "activeProjectId": "missing"
        }"#,
    )
    .unwrap();

    let remote = MemoryRemote::new();
    remote.set_offline(true);
    let engine = Engine::start(options_with_cache(
        "alice",
        &remote,
        Arc::new(FileCache::new(&path)),
    ));

    let state = engine.state();
    assert_eq!(state.projects.len(), 1);
    let project = &state.projects[0];
    assert_eq!(project.name, "Old board");
    let card = &project.cards[0];
    assert_eq!(card.title, "Legacy");
    assert_eq!(card.column.as_str(), "todo");
    assert_eq!(card.priority, Priority::Critical);
    assert!(project.label("ops").is_some());
    assert_eq!(state.active_project, None);
}

#[test]
fn unreadable_cache_starts_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.json");
    fs::write(&path, "definitely not json").unwrap();

    let remote = MemoryRemote::new();
    remote.set_offline(true);
    let cache = Arc::new(FileCache::new(&path));
    let engine = Engine::start(options_with_cache("alice", &remote, cache.clone()));
    assert!(engine.state().projects.is_empty());

    drop(engine);
    let rewritten = cache.read().unwrap().expect("cache rewritten on shutdown");
    assert!(rewritten.contains("schema_version"));
}

use architekt_core::{DesignStore, Diagram, Editor, FileStore, Position, StoreError};

fn sample() -> Diagram {
    let mut editor = Editor::new();
    let lb = editor.add_node("load-balancer", Position::new(0.0, 0.0)).unwrap().id.clone();
    let web = editor.add_node("web-server", Position::new(150.0, 0.0)).unwrap().id.clone();
    let edge = editor.connect(&lb, &web).unwrap().id.clone();
    editor
        .update_edge_style(
            &edge,
            architekt_core::EdgeStyleUpdate {
                animated: Some(true),
                dashed: Some(true),
            },
        )
        .unwrap();
    editor.diagram().clone()
}

#[tokio::test]
async fn saved_designs_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let diagram = sample();

    let id = store.save("alice", "Web tier", &diagram).await.unwrap();
    let path = dir.path().join("users/alice/designs").join(format!("{id}.json"));
    assert!(path.exists());

    let raw = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["name"], "Web tier");
    assert_eq!(value["edges"][0]["style"]["strokeDasharray"], "5,5");

    assert_eq!(store.load("alice", &id).await.unwrap(), diagram);
}

#[tokio::test]
async fn concurrent_saves_get_distinct_ids() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let diagram = sample();

    let (a, b, c, d) = tokio::join!(
        store.save("alice", "One", &diagram),
        store.save("alice", "Two", &diagram),
        store.save("alice", "Three", &diagram),
        store.save("alice", "Four", &diagram),
    );
    let mut ids = vec![a.unwrap(), b.unwrap(), c.unwrap(), d.unwrap()];
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);

    let mut names: Vec<String> = store
        .list("alice")
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    names.sort();
    assert_eq!(names, ["Four", "One", "Three", "Two"]);
}

#[tokio::test]
async fn owners_do_not_see_each_other() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let id = store.save("alice", "Mine", &sample()).await.unwrap();

    assert!(store.list("bob").await.unwrap().is_empty());
    assert!(matches!(store.load("bob", &id).await, Err(StoreError::NotFound { .. })));
}

#[tokio::test]
async fn list_skips_corrupt_files_and_orders_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let first = store.save("alice", "First", &Diagram::default()).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = store.save("alice", "Second", &Diagram::default()).await.unwrap();

    let designs = dir.path().join("users/alice/designs");
    std::fs::write(designs.join("broken.json"), "{ nope").unwrap();
    std::fs::write(designs.join(".pending.json.tmp"), "").unwrap();

    let listed = store.list("alice").await.unwrap();
    let ids: Vec<&str> = listed.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, [second.as_str(), first.as_str()]);

    assert!(matches!(
        store.load("alice", "broken").await,
        Err(StoreError::Corrupt { .. })
    ));
}

#[tokio::test]
async fn delete_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let id = store.save("alice", "Gone soon", &sample()).await.unwrap();

    store.delete("alice", &id).await.unwrap();
    store.delete("alice", &id).await.unwrap();
    assert!(store.list("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn path_like_keys_are_refused() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    assert!(matches!(
        store.save("../etc", "x", &Diagram::default()).await,
        Err(StoreError::InvalidKey(_))
    ));
    assert!(matches!(
        store.load("alice", "../../secret").await,
        Err(StoreError::InvalidKey(_))
    ));
}

mod common;

use common::make_items;
use serde_json::json;
use trackmill::item::{Item, ItemResult};
use trackmill::runtime::Checkpoint;
use trackmill::store::ItemStore;

fn checkpoint_with(results: Vec<ItemResult>) -> Checkpoint {
    Checkpoint::from_results("local_path", results)
}

#[test]
fn everything_pends_without_a_checkpoint() {
    let store = ItemStore::from_items(make_items(5));
    let pending = store.pending(None);
    assert_eq!(pending.len(), 5);
    let ids: Vec<_> = pending.iter().map(|item| item.id.to_string()).collect();
    assert_eq!(ids, vec!["t1", "t2", "t3", "t4", "t5"]);
}

#[test]
fn completed_items_are_excluded_in_input_order() {
    let items = make_items(5);
    let checkpoint = checkpoint_with(vec![
        ItemResult::completed(items[1].clone(), json!("/audio/t2.mp3")),
        ItemResult::completed(items[3].clone(), json!("/audio/t4.mp3")),
    ]);

    let store = ItemStore::from_items(items);
    let ids: Vec<_> = store
        .pending(Some(&checkpoint))
        .iter()
        .map(|item| item.id.to_string())
        .collect();
    assert_eq!(ids, vec!["t1", "t3", "t5"]);
}

#[test]
fn absent_outcomes_are_terminal() {
    let items = make_items(3);
    let checkpoint = checkpoint_with(vec![
        ItemResult::completed(items[0].clone(), json!("/audio/t1.mp3")),
        ItemResult::failed(items[1].clone(), "yt-dlp exited with 1"),
    ]);

    let store = ItemStore::from_items(items);
    let ids: Vec<_> = store
        .pending(Some(&checkpoint))
        .iter()
        .map(|item| item.id.to_string())
        .collect();
    // t2 failed explicitly: recorded, never retried automatically.
    assert_eq!(ids, vec!["t3"]);
}

#[test]
fn pending_is_idempotent() {
    let items = make_items(4);
    let checkpoint = checkpoint_with(vec![ItemResult::completed(
        items[0].clone(),
        json!("/audio/t1.mp3"),
    )]);
    let store = ItemStore::from_items(items);

    let first = store.pending(Some(&checkpoint));
    let second = store.pending(Some(&checkpoint));
    assert_eq!(first, second);
}

#[test]
fn full_checkpoint_leaves_nothing_pending() {
    let items = make_items(3);
    let results = items
        .iter()
        .map(|item| ItemResult::completed(item.clone(), json!(format!("/audio/{}.mp3", item.id))))
        .collect();
    let checkpoint = checkpoint_with(results);

    let store = ItemStore::from_items(items);
    assert!(store.pending(Some(&checkpoint)).is_empty());
}

#[test]
fn numeric_and_string_ids_share_identity() {
    let from_list: Item = serde_json::from_value(json!({"id": 42, "title": "Llama"})).unwrap();
    let from_checkpoint: Item =
        serde_json::from_value(json!({"id": "42", "title": "Llama"})).unwrap();
    let checkpoint = checkpoint_with(vec![ItemResult::completed(
        from_checkpoint,
        json!("/audio/42.mp3"),
    )]);

    let store = ItemStore::from_items(vec![from_list]);
    assert!(store.pending(Some(&checkpoint)).is_empty());
}

#[tokio::test]
async fn load_reads_a_json_array() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("work_list.json");
    tokio::fs::write(
        &path,
        r#"[{"id": "a", "title": "One"}, {"id": "b", "artist": "Two"}]"#,
    )
    .await
    .unwrap();

    let store = ItemStore::load(&path).await.unwrap();
    assert_eq!(store.len(), 2);
    assert_eq!(store.items()[0].title.as_deref(), Some("One"));
}

#[tokio::test]
async fn load_rejects_malformed_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("work_list.json");
    tokio::fs::write(&path, "{not json").await.unwrap();

    assert!(ItemStore::load(&path).await.is_err());
}

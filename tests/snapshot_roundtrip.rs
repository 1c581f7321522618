// Snapshot persistence scenarios

use skipkv::skiplist::{load_snapshot, AutoSaveActor, SkipList, Snapshotter};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn snapshot_roundtrip_compares_equal() {
    let dir = tempfile::tempdir().unwrap();
    let snapshotter = Snapshotter::new(dir.path());

    let original: SkipList<i64, String> = SkipList::new(10);
    original.insert(1, "one".to_string());
    original.insert(2, "two".to_string());
    original.insert(7, "seven".to_string());

    let path = snapshotter.save(&original, "out").unwrap();
    assert!(path.file_name().unwrap().to_string_lossy().starts_with("out_"));

    let restored: SkipList<i64, String> = SkipList::new(10);
    let outcome = load_snapshot(&restored, &path).unwrap();
    assert_eq!(outcome.loaded, 3);
    assert!(original.equal_bottom_level(&restored));
}

#[test]
fn snapshot_of_empty_list_roundtrips() {
    let dir = tempfile::tempdir().unwrap();
    let snapshotter = Snapshotter::new(dir.path());

    let empty: SkipList<i64, String> = SkipList::new(4);
    let path = snapshotter.save(&empty, "empty").unwrap();

    let restored: SkipList<i64, String> = SkipList::new(4);
    let outcome = load_snapshot(&restored, &path).unwrap();
    assert_eq!(outcome.loaded, 0);
    assert!(empty.equal_bottom_level(&restored));
}

#[test]
fn load_recovers_from_mixed_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.json");
    std::fs::write(
        &path,
        r#"[
            {"key": 10, "value": "ten"},
            "just a string",
            {"key": 3.5, "value": "float key"},
            {"key": 11, "value": "eleven", "unknown": [1, 2, 3]}
        ]"#,
    )
    .unwrap();

    let list: SkipList<i64, String> = SkipList::new(8);
    let outcome = load_snapshot(&list, &path).unwrap();
    assert_eq!(outcome.loaded, 2);
    assert_eq!(outcome.skipped, 2);
    assert_eq!(list.size(), 2);
}

#[test]
fn autosave_writes_loadable_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let list: Arc<SkipList<i64, String>> = Arc::new(SkipList::new(10));
    list.insert(1, "one".to_string());
    list.insert(2, "two".to_string());

    {
        let _actor = AutoSaveActor::spawn(
            Arc::clone(&list),
            Snapshotter::new(dir.path()),
            "bg",
            Duration::from_millis(100),
        );
        std::thread::sleep(Duration::from_millis(350));
    }

    let snapshot = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| {
            p.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("bg_autosave_")
        })
        .expect("autosave file present");

    let restored: SkipList<i64, String> = SkipList::new(10);
    load_snapshot(&restored, &snapshot).unwrap();
    assert!(list.equal_bottom_level(&restored));
}

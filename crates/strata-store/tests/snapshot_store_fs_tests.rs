//! SnapshotStore over a filesystem bucket

use serde_json::json;
use std::fs;
use strata_core::{ExErrorKind, ObjectStore, RunTimestamp, Snapshot};
use strata_store::{ArchiveOutcome, FsObjectStore, SnapshotStore};
use tempfile::TempDir;

fn ts(value: &str) -> RunTimestamp {
    RunTimestamp::parse(value).unwrap()
}

fn setup() -> (TempDir, SnapshotStore<FsObjectStore>) {
    let dir = TempDir::new().unwrap();
    let objects = FsObjectStore::open(dir.path()).unwrap();
    (dir, SnapshotStore::new(objects))
}

fn orders(n: i64) -> Snapshot {
    Snapshot::new(vec![
        ("id".to_string(), (1..=n).map(|i| json!(i)).collect()),
        (
            "created_at".to_string(),
            (1..=n).map(|i| json!(format!("2024-01-{:02}", i))).collect(),
        ),
    ])
    .unwrap()
}

#[test]
fn test_bucket_layout_on_disk() {
    let (dir, store) = setup();
    let t0 = ts("2024-08-19 09:30");

    store.put("orders", &t0, &orders(3)).unwrap();
    store.set_marker(&t0).unwrap();

    let snapshot_path = dir.path().join("latest").join("2024-08-19 09:30").join("orders.json");
    let body = fs::read_to_string(snapshot_path).unwrap();
    assert!(body.starts_with("{\n    \"id\": ["));
    assert_eq!(fs::read_to_string(dir.path().join("latest_date")).unwrap(), "2024-08-19 09:30");
}

#[test]
fn test_archive_then_delete_moves_snapshot() {
    let (_dir, store) = setup();
    let t0 = ts("2024-08-19 09:30");
    store.put("orders", &t0, &orders(3)).unwrap();
    let before = store
        .objects()
        .get("latest/2024-08-19 09:30/orders.json")
        .unwrap()
        .unwrap();

    assert_eq!(store.archive("orders", &t0).unwrap(), ArchiveOutcome::Archived);
    store.delete("orders", &t0).unwrap();

    let archived = store
        .objects()
        .get("archive/2024-08-19 09:30/orders.json")
        .unwrap();
    assert_eq!(archived, Some(before));
    assert_eq!(store.get("orders", &t0).unwrap(), None);
    assert!(store.list_keys("latest/").unwrap().is_empty());
}

#[test]
fn test_carry_forward_is_byte_identical() {
    let (_dir, store) = setup();
    let (t0, t1) = (ts("2024-08-19 09:30"), ts("2024-08-20 09:30"));
    store.put("staff", &t0, &orders(2)).unwrap();

    store.carry_forward("staff", &t0, &t1).unwrap();

    let objects = store.objects();
    assert_eq!(
        objects.get("latest/2024-08-19 09:30/staff.json").unwrap(),
        objects.get("latest/2024-08-20 09:30/staff.json").unwrap()
    );
}

#[test]
fn test_carry_forward_missing_source() {
    let (_dir, store) = setup();
    let err = store
        .carry_forward("staff", &ts("2024-08-19 09:30"), &ts("2024-08-20 09:30"))
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
    assert_eq!(err.table(), Some("staff"));
}

#[test]
fn test_zero_row_snapshot_round_trip() {
    let (_dir, store) = setup();
    let t0 = ts("2024-08-19 09:30");
    let empty = Snapshot::with_columns(["id", "created_at"]).unwrap();

    store.put("staff", &t0, &empty).unwrap();
    store.put("nothing", &t0, &Snapshot::empty()).unwrap();

    assert_eq!(store.get("staff", &t0).unwrap(), Some(empty));
    assert_eq!(store.get("nothing", &t0).unwrap(), Some(Snapshot::empty()));
    assert_eq!(store.list_live_tables(&t0).unwrap(), vec!["nothing", "staff"]);
}

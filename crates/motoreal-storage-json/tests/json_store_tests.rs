use std::fs;

use motoreal_core::{
    storage::{KeyValueStore, StoreKey},
    CoreError, DataRepository,
};
use motoreal_domain::{BillingCycle, Ownership, RentTerms, Snapshot, Vehicle};
use motoreal_storage_json::{JsonFileStore, SnapshotBackups, StoragePaths};
use tempfile::tempdir;

fn rented(plate: &str) -> Vehicle {
    Vehicle::new(
        "Mobi",
        plate,
        Ownership::Rented(RentTerms::new(1800.0, BillingCycle::Monthly, None)),
    )
}

#[test]
fn json_store_writes_one_file_per_key() {
    let dir = tempdir().expect("tempdir");
    let paths = StoragePaths::under(dir.path());
    let store = JsonFileStore::new(paths.data_root.clone()).expect("create store");

    assert!(store.read(StoreKey::Vehicles).unwrap().is_none());
    store.write(StoreKey::Vehicles, "[]").expect("write");
    assert_eq!(store.read(StoreKey::Vehicles).unwrap().as_deref(), Some("[]"));

    let path = paths.data_root.join("vehicles.json");
    assert!(path.exists());
    assert!(!paths.data_root.join("vehicles.json.tmp").exists());

    store.remove(StoreKey::Vehicles).expect("remove");
    assert!(!path.exists());
}

#[test]
fn repository_persists_through_json_files() {
    let dir = tempdir().expect("tempdir");
    let data_root = dir.path().join("data");

    let vehicle_id = {
        let store = JsonFileStore::new(data_root.clone()).unwrap();
        let mut repository = DataRepository::open(Box::new(store)).expect("open");
        repository.add_vehicle(rented("ABC1234")).expect("add vehicle")
    };

    for key in ["categories", "accounts", "vehicles"] {
        assert!(data_root.join(format!("{key}.json")).exists(), "{key} missing");
    }

    let store = JsonFileStore::new(data_root).unwrap();
    let repository = DataRepository::open(Box::new(store)).expect("reopen");
    let vehicle = repository.snapshot().vehicle(vehicle_id).expect("vehicle");
    assert_eq!(vehicle.plate, "ABC1234");
}

#[test]
fn malformed_file_is_reported_with_its_key() {
    let dir = tempdir().expect("tempdir");
    let data_root = dir.path().join("data");
    fs::create_dir_all(&data_root).unwrap();
    fs::write(data_root.join("transactions.json"), "[{\"broken\": ").unwrap();

    let store = JsonFileStore::new(data_root).unwrap();
    match DataRepository::open(Box::new(store)) {
        Err(CoreError::Serde(message)) => assert!(message.contains("transactions")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("malformed data must not load"),
    }
}

#[test]
fn backups_round_trip_snapshots() {
    let dir = tempdir().expect("tempdir");
    let backups = SnapshotBackups::new(dir.path().join("backups")).expect("backups");

    let mut snapshot = Snapshot::seeded();
    snapshot.vehicles.push(rented("QWE1D23"));
    let info = backups
        .create(&snapshot, Some("before reset"))
        .expect("create backup");

    assert!(info.id.starts_with("snapshot_"));
    assert!(info.id.ends_with("_before-reset.json"));
    assert_eq!(info.note.as_deref(), Some("before-reset"));
    assert!(info.created_at.is_some());

    let listed = backups.list().expect("list");
    assert_eq!(listed.len(), 1);
    let found = backups.find("1").expect("find by position");
    assert_eq!(found.id, info.id);
    let found = backups
        .find(info.id.trim_end_matches(".json"))
        .expect("find by stem");

    let restored = backups.load(&found).expect("load");
    assert_eq!(restored.vehicles, snapshot.vehicles);
}

#[test]
fn backups_respect_retention() {
    let dir = tempdir().expect("tempdir");
    let backups = SnapshotBackups::with_retention(dir.path().join("backups"), 3).unwrap();
    let snapshot = Snapshot::seeded();

    for _ in 0..6 {
        backups.create(&snapshot, None).expect("create");
    }
    assert_eq!(backups.list().unwrap().len(), 3);
    assert!(backups.find("missing").is_err());
}

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;

use crate::{
    account_service::AccountService,
    billing::BillKind,
    category_service::CategoryService,
    storage::{KeyValueStore, MemoryStore, StoreKey},
    sync::{CloudBackend, SyncHandle},
    transaction_service::TransactionService,
    user_service::UserService,
    vehicle_service::VehicleService,
    CoreError, DataRepository,
};
use motoreal_domain::{
    category::ids, Account, AccountType, BillingCycle, CategoryItem, CategoryType,
    FinancingTerms, InsurancePlan, Ownership, OwnershipType, RentTerms, Snapshot, Transaction,
    TransactionType, Vehicle, PROFESSIONAL_ACCOUNT_ID,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn financed_vehicle(plate: &str) -> Vehicle {
    Vehicle::new(
        "Onix",
        plate,
        Ownership::Financed(FinancingTerms::new(900.0, None, 48)),
    )
}

fn rented_vehicle(plate: &str) -> Vehicle {
    Vehicle::new(
        "Kwid",
        plate,
        Ownership::Rented(RentTerms::new(450.0, BillingCycle::Weekly, Some(1))),
    )
}

#[derive(Default)]
struct RecordingBackend {
    uploads: Mutex<Vec<Snapshot>>,
}

impl RecordingBackend {
    fn uploads(&self) -> Vec<Snapshot> {
        self.uploads.lock().unwrap().clone()
    }
}

impl CloudBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn upload(&self, snapshot: &Snapshot) -> Result<(), CoreError> {
        self.uploads.lock().unwrap().push(snapshot.clone());
        Ok(())
    }

    fn download(&self) -> Result<Option<Snapshot>, CoreError> {
        Ok(self.uploads.lock().unwrap().last().cloned())
    }
}

struct FailingBackend;

impl CloudBackend for FailingBackend {
    fn name(&self) -> &str {
        "failing"
    }

    fn upload(&self, _snapshot: &Snapshot) -> Result<(), CoreError> {
        Err(CoreError::Sync("endpoint unreachable".into()))
    }

    fn download(&self) -> Result<Option<Snapshot>, CoreError> {
        Err(CoreError::Sync("endpoint unreachable".into()))
    }
}

#[test]
fn vehicle_service_normalizes_and_rejects_duplicate_plates() {
    let mut snapshot = Snapshot::seeded();
    let id = VehicleService::add(&mut snapshot, financed_vehicle("abc-1d23")).expect("add vehicle");
    assert_eq!(snapshot.vehicle(id).unwrap().plate, "ABC1D23");

    let err = VehicleService::add(&mut snapshot, rented_vehicle("ABC1D23")).unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let err = VehicleService::add(&mut snapshot, rented_vehicle("AB12345")).unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert_eq!(snapshot.vehicles.len(), 1);
}

#[test]
fn vehicle_service_archives_but_keeps_history() {
    let mut snapshot = Snapshot::seeded();
    let id = VehicleService::add(&mut snapshot, rented_vehicle("QWE1234")).unwrap();
    TransactionService::add(
        &mut snapshot,
        Transaction::new(id, TransactionType::Income, ids::UBER, 120.0, date(2025, 3, 1)),
    )
    .unwrap();

    VehicleService::archive(&mut snapshot, id).expect("archive");
    assert_eq!(snapshot.active_vehicles().count(), 0);
    assert_eq!(snapshot.transactions.len(), 1);
    assert!(VehicleService::archive(&mut snapshot, id).is_err());
}

#[test]
fn update_vehicle_allows_keeping_its_own_plate() {
    let mut snapshot = Snapshot::seeded();
    let id = VehicleService::add(&mut snapshot, rented_vehicle("QWE1234")).unwrap();
    VehicleService::add(&mut snapshot, rented_vehicle("RTY5678")).unwrap();

    let mut edited = snapshot.vehicle(id).unwrap().clone();
    edited.model = "Kwid Zen".into();
    VehicleService::update(&mut snapshot, edited.clone()).expect("same plate is fine");
    assert_eq!(snapshot.vehicle(id).unwrap().model, "Kwid Zen");

    edited.plate = "rty5678".into();
    assert!(VehicleService::update(&mut snapshot, edited).is_err());
}

#[test]
fn mark_installment_paid_requires_financing() {
    let mut snapshot = Snapshot::seeded();
    let rented = VehicleService::add(&mut snapshot, rented_vehicle("QWE1234")).unwrap();
    let err = VehicleService::mark_installment_paid(&mut snapshot, rented).unwrap_err();
    assert!(matches!(err, CoreError::InvalidOperation(_)));

    let financed = VehicleService::add(&mut snapshot, financed_vehicle("ABC1234")).unwrap();
    assert_eq!(
        VehicleService::mark_installment_paid(&mut snapshot, financed).unwrap(),
        1
    );
}

#[test]
fn account_balances_follow_added_and_deleted_transactions() {
    let mut snapshot = Snapshot::seeded();
    let vehicle = VehicleService::add(&mut snapshot, rented_vehicle("QWE1234")).unwrap();
    let account = AccountService::add(&mut snapshot, Account::new("Carteira", AccountType::Cash, 50.0))
        .expect("add account");

    let income = TransactionService::add(
        &mut snapshot,
        Transaction::new(vehicle, TransactionType::Income, ids::UBER, 300.0, date(2025, 4, 2))
            .with_account(account.clone()),
    )
    .unwrap();
    TransactionService::add(
        &mut snapshot,
        Transaction::new(vehicle, TransactionType::Expense, ids::FUEL, 120.0, date(2025, 4, 2))
            .with_account(account.clone()),
    )
    .unwrap();
    assert_eq!(snapshot.account(&account).unwrap().balance, 230.0);

    TransactionService::remove(&mut snapshot, income).unwrap();
    assert_eq!(snapshot.account(&account).unwrap().balance, -70.0);
}

#[test]
fn transaction_service_rejects_invalid_input() {
    let mut snapshot = Snapshot::seeded();
    let vehicle = VehicleService::add(&mut snapshot, rented_vehicle("QWE1234")).unwrap();

    let zero = Transaction::new(vehicle, TransactionType::Income, ids::UBER, 0.0, date(2025, 4, 2));
    assert!(matches!(
        TransactionService::add(&mut snapshot, zero),
        Err(CoreError::Validation(_))
    ));

    let wrong_type =
        Transaction::new(vehicle, TransactionType::Expense, ids::UBER, 10.0, date(2025, 4, 2));
    assert!(matches!(
        TransactionService::add(&mut snapshot, wrong_type),
        Err(CoreError::Validation(_))
    ));

    let unknown_category =
        Transaction::new(vehicle, TransactionType::Expense, "TOLLS", 10.0, date(2025, 4, 2));
    assert!(matches!(
        TransactionService::add(&mut snapshot, unknown_category),
        Err(CoreError::CategoryNotFound(_))
    ));
    assert!(snapshot.transactions.is_empty());
}

#[test]
fn link_account_applies_balance_once() {
    let mut snapshot = Snapshot::seeded();
    let vehicle = VehicleService::add(&mut snapshot, rented_vehicle("QWE1234")).unwrap();
    let txn = TransactionService::add(
        &mut snapshot,
        Transaction::new(vehicle, TransactionType::Income, ids::NINETY_NINE, 80.0, date(2025, 4, 3)),
    )
    .unwrap();

    TransactionService::link_account(&mut snapshot, txn, PROFESSIONAL_ACCOUNT_ID).expect("link");
    assert_eq!(snapshot.account(PROFESSIONAL_ACCOUNT_ID).unwrap().balance, 80.0);

    let err = TransactionService::link_account(&mut snapshot, txn, PROFESSIONAL_ACCOUNT_ID)
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidOperation(_)));
    assert_eq!(snapshot.account(PROFESSIONAL_ACCOUNT_ID).unwrap().balance, 80.0);
}

#[test]
fn resolve_id_accepts_unique_prefixes() {
    let mut snapshot = Snapshot::seeded();
    let vehicle = VehicleService::add(&mut snapshot, rented_vehicle("QWE1234")).unwrap();
    let id = TransactionService::add(
        &mut snapshot,
        Transaction::new(vehicle, TransactionType::Income, ids::UBER, 10.0, date(2025, 4, 3)),
    )
    .unwrap();

    let prefix = &id.to_string()[..8];
    assert_eq!(TransactionService::resolve_id(&snapshot, prefix).unwrap(), id);
    assert!(TransactionService::resolve_id(&snapshot, "zzzz").is_err());
}

#[test]
fn pay_bill_records_financing_installment() {
    let mut snapshot = Snapshot::seeded();
    let vehicle = VehicleService::add(&mut snapshot, financed_vehicle("ABC1234")).unwrap();

    let id = TransactionService::pay_bill(
        &mut snapshot,
        vehicle,
        BillKind::Financing,
        Some(PROFESSIONAL_ACCOUNT_ID.to_string()),
        date(2025, 5, 10),
    )
    .expect("pay financing");

    let txn = snapshot.transaction(id).unwrap();
    assert_eq!(txn.category, ids::FINANCING);
    assert_eq!(txn.amount, 900.0);
    assert_eq!(txn.description.as_deref(), Some("Parcela 1/48"));
    assert_eq!(snapshot.vehicle(vehicle).unwrap().financing().unwrap().paid_months, 1);
    assert_eq!(snapshot.account(PROFESSIONAL_ACCOUNT_ID).unwrap().balance, -900.0);
}

#[test]
fn pay_bill_uses_rent_and_insurance_labels() {
    let mut snapshot = Snapshot::seeded();
    let vehicle = VehicleService::add(
        &mut snapshot,
        rented_vehicle("QWE1234").with_insurance(InsurancePlan::new(180.0, None)),
    )
    .unwrap();

    let rent = TransactionService::pay_bill(&mut snapshot, vehicle, BillKind::Rent, None, date(2025, 5, 5))
        .unwrap();
    let insurance =
        TransactionService::pay_bill(&mut snapshot, vehicle, BillKind::Insurance, None, date(2025, 5, 5))
            .unwrap();

    assert_eq!(
        snapshot.transaction(rent).unwrap().description.as_deref(),
        Some("Aluguel Semanal")
    );
    let insurance = snapshot.transaction(insurance).unwrap();
    assert_eq!(insurance.description.as_deref(), Some("Parcela Seguro"));
    assert_eq!(insurance.amount, 180.0);

    let err = TransactionService::pay_bill(&mut snapshot, vehicle, BillKind::Financing, None, date(2025, 5, 5))
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidOperation(_)));
}

#[test]
fn category_service_protects_system_categories() {
    let mut snapshot = Snapshot::seeded();
    let err = CategoryService::remove(&mut snapshot, ids::FUEL).unwrap_err();
    assert!(matches!(err, CoreError::InvalidOperation(_)));

    let id = CategoryService::add(
        &mut snapshot,
        CategoryItem::custom("Pedágio", CategoryType::Expense, "#0ea5e9"),
    )
    .unwrap();
    assert!(CategoryService::add(
        &mut snapshot,
        CategoryItem::custom("pedágio", CategoryType::Expense, "#0ea5e9"),
    )
    .is_err());

    let removed = CategoryService::remove(&mut snapshot, &id).unwrap();
    assert_eq!(removed.label, "Pedágio");
}

#[test]
fn visible_categories_follow_ownership() {
    let snapshot = Snapshot::seeded();
    let ids_for = |ownership| {
        CategoryService::visible(&snapshot, Some(TransactionType::Expense), Some(ownership))
            .into_iter()
            .map(|c| c.id.clone())
            .collect::<Vec<_>>()
    };

    let rented = ids_for(OwnershipType::Rented);
    assert!(rented.contains(&ids::RENT.to_string()));
    assert!(!rented.contains(&ids::FINANCING.to_string()));

    let financed = ids_for(OwnershipType::Financed);
    assert!(financed.contains(&ids::FINANCING.to_string()));
    assert!(!financed.contains(&ids::RENT.to_string()));

    let income: Vec<_> = CategoryService::visible(&snapshot, Some(TransactionType::Income), None)
        .into_iter()
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(income, vec![ids::UBER, ids::NINETY_NINE, ids::OTHER]);
}

#[test]
fn category_resolution_matches_labels() {
    let snapshot = Snapshot::seeded();
    assert_eq!(CategoryService::resolve(&snapshot, "combustível").unwrap().id, ids::FUEL);
    assert_eq!(CategoryService::resolve(&snapshot, "uber").unwrap().id, ids::UBER);
    assert!(CategoryService::resolve(&snapshot, "pizza").is_err());
}

#[test]
fn user_service_onboards_and_sets_goal() {
    let mut snapshot = Snapshot::seeded();
    assert!(UserService::set_goal(&mut snapshot, Some(3000.0)).is_err());
    assert!(UserService::onboard(&mut snapshot, "Ana", "not-an-email", None).is_err());

    UserService::onboard(&mut snapshot, "Ana", "ana@example.com", None).unwrap();
    UserService::set_goal(&mut snapshot, Some(3000.0)).unwrap();
    let user = snapshot.user.as_ref().unwrap();
    assert!(user.onboarding_completed);
    assert_eq!(user.goal(), Some(3000.0));
    assert!(UserService::set_goal(&mut snapshot, Some(-5.0)).is_err());
}

#[test]
fn repository_seeds_defaults_into_empty_store() {
    let store = Arc::new(MemoryStore::new());
    let repository = DataRepository::open(Box::new(Arc::clone(&store))).expect("open");

    assert_eq!(repository.snapshot().categories.len(), 8);
    assert_eq!(repository.accounts().len(), 2);
    assert!(store.read(StoreKey::Categories).unwrap().is_some());
    assert!(store.read(StoreKey::Accounts).unwrap().is_some());
    assert!(store.read(StoreKey::Vehicles).unwrap().is_none());
}

#[test]
fn repository_round_trips_saved_vehicle() {
    let store = Arc::new(MemoryStore::new());
    let mut repository = DataRepository::open(Box::new(Arc::clone(&store))).unwrap();
    let id = repository
        .add_vehicle(financed_vehicle("ABC1D23").with_insurance(InsurancePlan::new(150.0, Some(20))))
        .unwrap();
    let saved = repository.snapshot().vehicle(id).unwrap().clone();

    let reopened = DataRepository::open(Box::new(store)).unwrap();
    assert_eq!(reopened.snapshot().vehicle(id), Some(&saved));
}

#[test]
fn repository_reports_malformed_key() {
    let store = MemoryStore::new();
    store.write(StoreKey::Vehicles, "{ not json").unwrap();

    match DataRepository::open(Box::new(store)) {
        Err(CoreError::Serde(message)) => assert!(message.starts_with("vehicles")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("malformed data must not load"),
    }
}

#[test]
fn repository_clear_data_restores_defaults() {
    let mut repository = DataRepository::open(Box::new(MemoryStore::new())).unwrap();
    repository.save_user("Ana", "ana@example.com", Some(2500.0)).unwrap();
    let vehicle = repository.add_vehicle(rented_vehicle("QWE1234")).unwrap();
    repository
        .add_transaction(
            Transaction::new(vehicle, TransactionType::Income, ids::UBER, 99.0, date(2025, 2, 2))
                .with_account(PROFESSIONAL_ACCOUNT_ID),
        )
        .unwrap();

    repository.clear_data().unwrap();
    let snapshot = repository.snapshot();
    assert!(snapshot.user.is_none());
    assert!(snapshot.vehicles.is_empty());
    assert!(snapshot.transactions.is_empty());
    assert_eq!(snapshot.account(PROFESSIONAL_ACCOUNT_ID).unwrap().balance, 0.0);
}

#[test]
fn debounced_sync_uploads_latest_snapshot_once_on_flush() {
    let backend = Arc::new(RecordingBackend::default());
    let handle = SyncHandle::spawn(backend.clone(), Duration::from_secs(60)).unwrap();
    let mut repository = DataRepository::open(Box::new(MemoryStore::new())).unwrap();
    repository.attach_sync(handle);

    repository.add_vehicle(rented_vehicle("AAA1111")).unwrap();
    repository.add_vehicle(rented_vehicle("BBB2222")).unwrap();
    repository.add_vehicle(rented_vehicle("CCC3333")).unwrap();
    assert!(backend.uploads().is_empty());

    repository.sync().unwrap().flush();
    let uploads = backend.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].vehicles.len(), 3);
}

#[test]
fn debounced_sync_fires_after_quiet_period() {
    let backend = Arc::new(RecordingBackend::default());
    let handle = SyncHandle::spawn(backend.clone(), Duration::from_millis(20)).unwrap();
    handle.schedule(Snapshot::seeded());

    std::thread::sleep(Duration::from_millis(400));
    assert_eq!(backend.uploads().len(), 1);
    assert_eq!(handle.stats().uploads, 1);
}

#[test]
fn dropping_sync_handle_flushes_pending_snapshot() {
    let backend = Arc::new(RecordingBackend::default());
    {
        let handle = SyncHandle::spawn(backend.clone(), Duration::from_secs(60)).unwrap();
        handle.schedule(Snapshot::seeded());
    }
    assert_eq!(backend.uploads().len(), 1);
}

#[test]
fn sync_failures_do_not_affect_local_writes() {
    let store = Arc::new(MemoryStore::new());
    let handle = SyncHandle::spawn(Arc::new(FailingBackend), Duration::from_secs(60)).unwrap();
    let mut repository = DataRepository::open(Box::new(Arc::clone(&store))).unwrap();
    repository.attach_sync(handle);

    repository.add_vehicle(rented_vehicle("QWE1234")).expect("local write succeeds");
    repository.sync().unwrap().flush();

    let stats = repository.sync().unwrap().stats();
    assert_eq!(stats.failures, 1);
    assert!(stats.last_error.is_some());
    assert!(store.read(StoreKey::Vehicles).unwrap().is_some());
}

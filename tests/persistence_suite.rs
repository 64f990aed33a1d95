use chrono::{Duration, NaiveDate};
use tempfile::TempDir;
use uuid::Uuid;

use credit_control::{
    control::{Channel, ControlBook, Invoice, Partner, Policy, PolicyLevel},
    services::RunService,
    storage::{JsonStorage, StorageBackend},
};

fn storage_with_temp_dir() -> (JsonStorage, TempDir) {
    let temp = TempDir::new().expect("temp dir");
    let storage = JsonStorage::new(Some(temp.path().to_path_buf())).expect("json storage");
    (storage, temp)
}

#[test]
fn a_generated_book_round_trips_through_json() {
    let (storage, _guard) = storage_with_temp_dir();

    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let mut book = ControlBook::new("Receivables");
    let account = Uuid::new_v4();
    let mut policy = Policy::new("3 time policy");
    policy.assign_account(account);
    policy
        .push_level(PolicyLevel::new("First", 15, Channel::Email))
        .unwrap();
    let policy_id = book.add_policy(policy);
    let partner_id = book.add_partner(Partner::new("Acme"));
    let mut invoice = Invoice::new(
        "INV-1",
        partner_id,
        account,
        today - Duration::days(90),
        320.0,
    );
    invoice.post();
    let invoice_id = book.add_invoice(invoice);

    let run_id = RunService::create_run(&mut book, today, vec![policy_id]).unwrap();
    RunService::generate_credit_lines(&mut book, run_id).unwrap();

    storage.save(&book, "receivables").expect("save book");
    let loaded = storage.load("receivables").expect("load book");

    assert_eq!(loaded.id, book.id);
    assert_eq!(loaded.lines_for_invoice(invoice_id).len(), 1);
    assert_eq!(loaded.last_run_date(policy_id), Some(today));
    assert_eq!(
        loaded.run(run_id).unwrap().report,
        book.run(run_id).unwrap().report
    );
}

#[test]
fn list_books_returns_canonical_names_sorted() {
    let (storage, _guard) = storage_with_temp_dir();
    storage.save(&ControlBook::new("Zeta"), "Zeta").unwrap();
    storage
        .save(&ControlBook::new("Alpha Ops"), "Alpha Ops")
        .unwrap();

    let names = storage.list_books().unwrap();
    assert_eq!(names, vec!["alpha_ops".to_string(), "zeta".to_string()]);
}

#[test]
fn saving_twice_overwrites_the_same_file() {
    let (storage, _guard) = storage_with_temp_dir();
    let mut book = ControlBook::new("Receivables");
    storage.save(&book, "receivables").unwrap();
    book.add_partner(Partner::new("Late Payer"));
    storage.save(&book, "receivables").unwrap();

    let loaded = storage.load("receivables").unwrap();
    assert_eq!(loaded.partners.len(), 1);
    assert_eq!(storage.list_books().unwrap().len(), 1);
}

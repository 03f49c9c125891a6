use fncm::db::Database;
use fncm::error::FncmError;
use fncm::models::{NewClient, NewFood, NewOrder};
use fncm::validation::InputValidator;
use chrono::Local;
use tempfile::{tempdir, TempDir};

fn setup() -> (TempDir, Database) {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let db = Database::new(temp_dir.path().join("test.db")).expect("Failed to create database");
    (temp_dir, db)
}

#[test]
fn test_add_profile_sanitizes_name() {
    let (_dir, db) = setup();

    let profile = db.add_profile("  weekly_deliveries ").expect("Failed to add profile");
    assert_eq!(profile.name.as_str(), "Weekly_Deliveries");

    let names: Vec<String> = db.list_profiles().unwrap().iter().map(ToString::to_string).collect();
    assert_eq!(names, vec!["Weekly_Deliveries"]);
}

#[test]
fn test_add_profile_rejects_duplicates_and_bad_names() {
    let (_dir, db) = setup();
    db.add_profile("market").unwrap();

    assert!(matches!(db.add_profile("MARKET"), Err(FncmError::Duplicate(_))));
    assert!(matches!(db.add_profile("   "), Err(FncmError::Validation(_))));
    assert!(matches!(db.add_profile("My Café!"), Err(FncmError::Validation(_))));
    assert!(matches!(
        db.add_profile("x; DROP TABLE clients"),
        Err(FncmError::Validation(_))
    ));

    assert_eq!(db.list_profiles().unwrap().len(), 1);
}

#[test]
fn test_create_profile_is_idempotent() {
    let (_dir, db) = setup();
    let name = InputValidator::sanitize_profile_name("bakery", &[] as &[&str]).unwrap();

    let first = db.create_profile(&name).unwrap();
    let second = db.create_profile(&name).unwrap();

    assert_eq!(first.id, second.id);
    assert!(db.profile_exists(&name).unwrap());
    assert_eq!(db.list_profiles().unwrap(), vec![name]);
}

#[test]
fn test_list_profiles_is_sorted_registry() {
    let (_dir, db) = setup();
    for name in ["zeta", "alpha", "Mid_1"] {
        db.add_profile(name).unwrap();
    }

    let names: Vec<String> = db.list_profiles().unwrap().iter().map(ToString::to_string).collect();
    assert_eq!(names, vec!["Alpha", "Mid_1", "Zeta"]);
}

#[test]
fn test_get_profile_is_case_insensitive() {
    let (_dir, db) = setup();
    db.add_profile("catering").unwrap();

    let profile = db.get_profile("CATERING").unwrap().expect("Profile should be found");
    assert_eq!(profile.name.as_str(), "Catering");
    assert!(db.get_profile("Other").unwrap().is_none());
}

#[test]
fn test_drop_profile_keeps_clients_and_food() {
    let (_dir, db) = setup();
    let profile = db.add_profile("events").unwrap();
    let client = db
        .insert_client(&NewClient {
            first_name: "Louis".to_string(),
            last_name: "Pasteur".to_string(),
            address: "Dole".to_string(),
            phone_number: "0102030405".to_string(),
        })
        .unwrap();
    let item = db
        .insert_food(&NewFood {
            food_name: "Cheese".to_string(),
            color: None,
        })
        .unwrap();
    db.insert_order(
        &profile.name,
        &NewOrder {
            client_id: client.id,
            food_id: item.id,
            food_quantity: 2,
            date: Local::now().date_naive(),
        },
    )
    .unwrap();

    assert!(db.drop_profile(&profile.name).unwrap());
    assert!(!db.drop_profile(&profile.name).unwrap());

    assert!(db.list_profiles().unwrap().is_empty());
    assert!(db.get_client(client.id).unwrap().is_some());
    assert!(db.get_food(item.id).unwrap().is_some());

    let conn = db.get_connection().unwrap();
    let orphaned: i64 = conn
        .query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))
        .unwrap();
    assert_eq!(orphaned, 0);
}

#[test]
fn test_orders_of_dropped_profile_are_not_reachable() {
    let (_dir, db) = setup();
    let profile = db.add_profile("temp").unwrap();
    db.drop_profile(&profile.name).unwrap();

    let err = db.list_orders(&profile.name, 10).expect_err("Profile is gone");
    assert!(matches!(err, FncmError::NotFound(_)));
}

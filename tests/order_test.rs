use chrono::{Duration, Local, NaiveDate};
use fncm::color::{Foreground, Rgb};
use fncm::db::{retention_cutoff, Database, DEFAULT_ORDER_LIMIT, DEFAULT_RETENTION_DAYS};
use fncm::error::FncmError;
use fncm::models::{Client, Food, NewClient, NewFood, NewOrder, Profile};
use fncm::validation::InputValidator;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rusqlite::params;
use tempfile::{tempdir, TempDir};

struct Fixture {
    _dir: TempDir,
    db: Database,
    profile: Profile,
}

fn setup() -> Fixture {
    let dir = tempdir().expect("Failed to create temp directory");
    let db = Database::new(dir.path().join("test.db")).expect("Failed to create database");
    let profile = db.add_profile("deliveries").expect("Failed to add profile");
    Fixture { _dir: dir, db, profile }
}

fn add_client(db: &Database, first_name: &str, last_name: &str) -> Client {
    db.insert_client(&NewClient {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        address: "3 Market Street".to_string(),
        phone_number: "555-0100".to_string(),
    })
    .expect("Failed to add client")
}

fn add_food(db: &Database, name: &str, color: Option<Rgb>) -> Food {
    db.insert_food(&NewFood {
        food_name: name.to_string(),
        color,
    })
    .expect("Failed to add food")
}

/// Insert rows directly, bypassing the "not in the past" rule.
fn seed_orders(db: &Database, profile: &Profile, rows: &[(i64, i64, NaiveDate)]) {
    let mut conn = db.get_connection().unwrap();
    let tx = conn.transaction().unwrap();
    for (client_id, food_id, date) in rows {
        tx.execute(
            "INSERT INTO orders (profile_id, client_id, food_id, food_quantity, date) VALUES (?1, ?2, ?3, 1, ?4)",
            params![profile.id, client_id, food_id, date],
        )
        .unwrap();
    }
    tx.commit().unwrap();
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[test]
fn test_insert_and_list_order() {
    let f = setup();
    let client = add_client(&f.db, "emile", "zola");
    let item = add_food(&f.db, "baguette", Some(Rgb::new(250, 220, 160)));

    let order = f
        .db
        .insert_order(
            &f.profile.name,
            &NewOrder {
                client_id: client.id,
                food_id: item.id,
                food_quantity: 3,
                date: today(),
            },
        )
        .expect("Failed to add order");
    assert_eq!(order.profile, f.profile.name);

    let rows = f.db.list_orders(&f.profile.name, DEFAULT_ORDER_LIMIT).unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.id, order.id);
    assert_eq!(row.first_name, "Emile");
    assert_eq!(row.last_name, "Zola");
    assert_eq!(row.food_name, "Baguette");
    assert_eq!(row.food_quantity, 3);
    assert_eq!(row.date, today());
    assert_eq!(row.foreground(), Some(Foreground::Black));
}

#[test]
fn test_insert_order_rejects_bad_input() {
    let f = setup();
    let client = add_client(&f.db, "Victor", "Hugo");
    let item = add_food(&f.db, "Soup", None);
    let order = |client_id, food_id, food_quantity, date| NewOrder {
        client_id,
        food_id,
        food_quantity,
        date,
    };

    let zero = f.db.insert_order(&f.profile.name, &order(client.id, item.id, 0, today()));
    assert!(matches!(zero, Err(FncmError::Validation(_))));

    let yesterday = today() - Duration::days(1);
    let past = f.db.insert_order(&f.profile.name, &order(client.id, item.id, 1, yesterday));
    assert!(matches!(past, Err(FncmError::Validation(_))));

    let far_future = NaiveDate::from_ymd_opt(10_000, 1, 1).unwrap();
    let five_digit_year = f.db.insert_order(&f.profile.name, &order(client.id, item.id, 1, far_future));
    assert!(matches!(five_digit_year, Err(FncmError::Validation(_))));

    let no_client = f.db.insert_order(&f.profile.name, &order(client.id + 100, item.id, 1, today()));
    assert!(matches!(no_client, Err(FncmError::NotFound(_))));

    let no_food = f.db.insert_order(&f.profile.name, &order(client.id, item.id + 100, 1, today()));
    assert!(matches!(no_food, Err(FncmError::NotFound(_))));

    assert!(f.db.list_orders(&f.profile.name, DEFAULT_ORDER_LIMIT).unwrap().is_empty());
}

#[test]
fn test_list_orders_sorts_by_date_then_name() {
    let f = setup();
    let zoe_adams = add_client(&f.db, "Zoe", "Adams");
    let anna_brown = add_client(&f.db, "Anna", "Brown");
    let anna_adams = add_client(&f.db, "Anna", "Adams");
    let item = add_food(&f.db, "Milk", None);
    let day = today() + Duration::days(3);

    seed_orders(
        &f.db,
        &f.profile,
        &[
            (zoe_adams.id, item.id, day),
            (anna_brown.id, item.id, day),
            (zoe_adams.id, item.id, day - Duration::days(1)),
            (anna_adams.id, item.id, day),
        ],
    );

    let rows = f.db.list_orders(&f.profile.name, DEFAULT_ORDER_LIMIT).unwrap();
    let listed: Vec<(NaiveDate, String)> = rows
        .iter()
        .map(|r| (r.date, format!("{} {}", r.first_name, r.last_name)))
        .collect();

    assert_eq!(
        listed,
        vec![
            (day - Duration::days(1), "Zoe Adams".to_string()),
            (day, "Anna Adams".to_string()),
            (day, "Anna Brown".to_string()),
            (day, "Zoe Adams".to_string()),
        ]
    );
}

#[test]
fn test_list_orders_keeps_most_recent_when_over_limit() {
    let f = setup();
    let client = add_client(&f.db, "Marcel", "Proust");
    let item = add_food(&f.db, "Madeleine", None);
    let start = today();

    let mut rows: Vec<(i64, i64, NaiveDate)> = (0..1100)
        .map(|i| (client.id, item.id, start + Duration::days(i)))
        .collect();
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    rows.shuffle(&mut rng);
    seed_orders(&f.db, &f.profile, &rows);

    let listed = f.db.list_orders(&f.profile.name, DEFAULT_ORDER_LIMIT).unwrap();
    assert_eq!(listed.len(), 1000);
    assert_eq!(listed[0].date, start + Duration::days(100));
    assert_eq!(listed[999].date, start + Duration::days(1099));
    assert!(listed.windows(2).all(|w| w[0].date < w[1].date));

    let small = f.db.list_orders(&f.profile.name, 5).unwrap();
    let dates: Vec<NaiveDate> = small.iter().map(|r| r.date).collect();
    let expected: Vec<NaiveDate> = (1095..1100).map(|i| start + Duration::days(i)).collect();
    assert_eq!(dates, expected);
}

#[test]
fn test_limit_cutting_a_date_keeps_names_in_ascending_order() {
    let f = setup();
    let item = add_food(&f.db, "Cake", None);
    let day = today();

    let names = [("Anna", "Adams"), ("Anna", "Brown"), ("Bruno", "Adams"), ("Chloe", "Diaz"), ("Zoe", "Adams")];
    let mut rows: Vec<(i64, i64, NaiveDate)> = names
        .iter()
        .map(|(first, last)| (add_client(&f.db, first, last).id, item.id, day))
        .collect();
    let early = add_client(&f.db, "Early", "Bird");
    rows.push((early.id, item.id, day - Duration::days(1)));
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    rows.shuffle(&mut rng);
    seed_orders(&f.db, &f.profile, &rows);

    // Three of the five orders on the newest date fit under the limit
    let listed: Vec<String> = f
        .db
        .list_orders(&f.profile.name, 3)
        .unwrap()
        .iter()
        .map(|r| format!("{} {}", r.first_name, r.last_name))
        .collect();
    assert_eq!(listed, vec!["Anna Adams", "Anna Brown", "Bruno Adams"]);

    let all = f.db.list_orders(&f.profile.name, 6).unwrap();
    assert_eq!(all.len(), 6);
    assert_eq!(all[0].first_name, "Early");
    assert_eq!(all[5].first_name, "Zoe");
}

#[test]
fn test_list_orders_is_scoped_to_profile() {
    let f = setup();
    let other = f.db.add_profile("other").unwrap();
    let client = add_client(&f.db, "Jules", "Verne");
    let item = add_food(&f.db, "Fish", None);

    seed_orders(&f.db, &f.profile, &[(client.id, item.id, today())]);
    seed_orders(&f.db, &other, &[(client.id, item.id, today()), (client.id, item.id, today())]);

    assert_eq!(f.db.list_orders(&f.profile.name, 100).unwrap().len(), 1);
    assert_eq!(f.db.list_orders(&other.name, 100).unwrap().len(), 2);
}

#[test]
fn test_delete_order() {
    let f = setup();
    let other = f.db.add_profile("second").unwrap();
    let client = add_client(&f.db, "Albert", "Camus");
    let item = add_food(&f.db, "Olives", None);
    let order = f
        .db
        .insert_order(
            &f.profile.name,
            &NewOrder {
                client_id: client.id,
                food_id: item.id,
                food_quantity: 1,
                date: today(),
            },
        )
        .unwrap();

    // An order can only be deleted through its own profile
    let wrong = f.db.delete_order(&other.name, order.id);
    assert!(matches!(wrong, Err(FncmError::NotFound(_))));

    f.db.delete_order(&f.profile.name, order.id).expect("Failed to delete order");
    assert!(f.db.list_orders(&f.profile.name, 100).unwrap().is_empty());

    let again = f.db.delete_order(&f.profile.name, order.id);
    assert!(matches!(again, Err(FncmError::NotFound(_))));
}

#[test]
fn test_purge_old_orders_boundary() {
    let f = setup();
    let client = add_client(&f.db, "Colette", "Willy");
    let item = add_food(&f.db, "Pie", None);
    let now = today();

    seed_orders(
        &f.db,
        &f.profile,
        &[
            (client.id, item.id, now - Duration::days(400)),
            (client.id, item.id, now - Duration::days(365)),
            (client.id, item.id, now - Duration::days(364)),
            (client.id, item.id, now),
        ],
    );

    let cutoff = retention_cutoff(now, DEFAULT_RETENTION_DAYS);
    assert_eq!(cutoff, now - Duration::days(365));

    let removed = f.db.purge_old_orders(&f.profile.name, cutoff).unwrap();
    assert_eq!(removed, 2);

    let dates: Vec<NaiveDate> = f
        .db
        .list_orders(&f.profile.name, 100)
        .unwrap()
        .iter()
        .map(|r| r.date)
        .collect();
    assert_eq!(dates, vec![now - Duration::days(364), now]);

    assert_eq!(f.db.purge_old_orders(&f.profile.name, cutoff).unwrap(), 0);
}

#[test]
fn test_purge_keeps_order_entered_with_five_digit_year() {
    let f = setup();
    let client = add_client(&f.db, "Jules", "Verne");
    let item = add_food(&f.db, "Tea", None);

    assert!(InputValidator::parse_order_date("+10000-01-01").is_err());
    let order = f
        .db
        .insert_order(
            &f.profile.name,
            &NewOrder {
                client_id: client.id,
                food_id: item.id,
                food_quantity: 1,
                date: NaiveDate::from_ymd_opt(10_000, 1, 1).unwrap(),
            },
        );
    assert!(order.is_err());

    let cutoff = retention_cutoff(today(), DEFAULT_RETENTION_DAYS);
    seed_orders(&f.db, &f.profile, &[(client.id, item.id, today())]);
    assert_eq!(f.db.purge_old_orders(&f.profile.name, cutoff).unwrap(), 0);
    assert_eq!(f.db.list_orders(&f.profile.name, 10).unwrap().len(), 1);
}

#[test]
fn test_purge_leaves_other_profiles_alone() {
    let f = setup();
    let other = f.db.add_profile("archive").unwrap();
    let client = add_client(&f.db, "George", "Sand");
    let item = add_food(&f.db, "Jam", None);
    let old = today() - Duration::days(500);

    seed_orders(&f.db, &f.profile, &[(client.id, item.id, old)]);
    seed_orders(&f.db, &other, &[(client.id, item.id, old)]);

    let cutoff = retention_cutoff(today(), DEFAULT_RETENTION_DAYS);
    assert_eq!(f.db.purge_old_orders(&f.profile.name, cutoff).unwrap(), 1);
    assert_eq!(f.db.list_orders(&other.name, 100).unwrap().len(), 1);
}

#[test]
fn test_deleting_client_or_food_cascades_to_orders() {
    let f = setup();
    let other = f.db.add_profile("weekend").unwrap();
    let client = add_client(&f.db, "Honore", "Balzac");
    let keeper = add_client(&f.db, "Gustave", "Flaubert");
    let coffee = add_food(&f.db, "Coffee", Some(Rgb::new(60, 40, 20)));
    let tea = add_food(&f.db, "Tea", None);

    seed_orders(
        &f.db,
        &f.profile,
        &[(client.id, coffee.id, today()), (keeper.id, tea.id, today())],
    );
    seed_orders(&f.db, &other, &[(client.id, tea.id, today()), (keeper.id, coffee.id, today())]);

    let deleted = f.db.delete_client(client.id).unwrap();
    assert_eq!(deleted.orders_removed, 2);
    assert_eq!(f.db.list_orders(&f.profile.name, 100).unwrap().len(), 1);
    assert_eq!(f.db.list_orders(&other.name, 100).unwrap().len(), 1);

    let deleted = f.db.delete_food(coffee.id).unwrap();
    assert_eq!(deleted.orders_removed, 1);
    assert!(f.db.list_orders(&other.name, 100).unwrap().is_empty());

    let remaining = f.db.list_orders(&f.profile.name, 100).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].food_name, "Tea");
    assert_eq!(remaining[0].foreground(), None);
}

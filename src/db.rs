use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, Local, NaiveDate};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::color::Rgb;
use crate::error::{FncmError, Result};
use crate::models::{Client, Deleted, Food, NewClient, NewFood, NewOrder, Order, OrderRow, Profile, ProfileName};
use crate::schema::{clients, food, orders, profiles, BASE_SCHEMA, CONNECTION_PRAGMAS};
use crate::validation::InputValidator;

/// Most recent orders shown when a profile is opened.
pub const DEFAULT_ORDER_LIMIT: usize = 1000;

/// Orders dated this many days ago or earlier are purged.
pub const DEFAULT_RETENTION_DAYS: u32 = 365;

/// Last date that falls outside the retention window.
#[must_use]
pub fn retention_cutoff(today: NaiveDate, retention_days: u32) -> NaiveDate {
    today - Duration::days(i64::from(retention_days))
}

/// Handle on the SQLite file.
///
/// No connection is held: every operation opens its own, runs its
/// statements, commits and closes it again.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Open (or create) the database file and apply the base schema
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let db = Self { path };
        db.ensure_base_schema()?;
        debug!(path = %db.path.display(), "Database ready");
        Ok(db)
    }

    /// Location of the database file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a fresh connection with foreign keys enforced
    pub fn get_connection(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.execute_batch(CONNECTION_PRAGMAS)?;
        Ok(conn)
    }

    // ========== Schema Operations ==========

    /// Create the fixed tables, the profiles registry and indexes if absent
    pub fn ensure_base_schema(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.execute_batch(BASE_SCHEMA)?;
        Ok(())
    }

    /// Register a profile; a no-op if it already exists
    pub fn create_profile(&self, name: &ProfileName) -> Result<Profile> {
        let conn = self.get_connection()?;

        let inserted = conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {} ({}, {}) VALUES (?1, ?2)",
                profiles::TABLE,
                profiles::NAME,
                profiles::CREATED_AT
            ),
            params![name.as_str(), Local::now().naive_local()],
        )?;

        if inserted > 0 {
            info!(profile = %name, "Added profile to the database");
        }

        Self::find_profile(&conn, name.as_str())?
            .ok_or_else(|| FncmError::NotFound(format!("Profile ({name}) could not be read back")))
    }

    /// Sanitize a user-entered name against existing profiles and create it
    pub fn add_profile(&self, raw_name: &str) -> Result<Profile> {
        let existing = self.list_profiles()?;
        let name = InputValidator::sanitize_profile_name(raw_name, &existing)?;
        self.create_profile(&name)
    }

    /// Remove a profile together with its orders.
    ///
    /// Returns false if there was no such profile. Clients and food are
    /// never touched.
    pub fn drop_profile(&self, name: &ProfileName) -> Result<bool> {
        let conn = self.get_connection()?;
        let removed = conn.execute(
            &format!("DELETE FROM {} WHERE {} = ?1", profiles::TABLE, profiles::NAME),
            params![name.as_str()],
        )?;

        if removed > 0 {
            info!(profile = %name, "Deleted profile and its orders");
        }
        Ok(removed > 0)
    }

    /// All registered profile names, sorted
    pub fn list_profiles(&self) -> Result<Vec<ProfileName>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} ORDER BY {}",
            profiles::NAME,
            profiles::TABLE,
            profiles::NAME
        ))?;

        let names = stmt.query_map([], |row| row.get::<_, String>(0).map(ProfileName::from_trusted))?;
        names.collect::<std::result::Result<Vec<_>, _>>().map_err(FncmError::from)
    }

    /// Look up a profile by an existing name (case-insensitive)
    pub fn get_profile(&self, name: &str) -> Result<Option<Profile>> {
        let conn = self.get_connection()?;
        Self::find_profile(&conn, name)
    }

    /// Whether a profile with this name is registered
    pub fn profile_exists(&self, name: &ProfileName) -> Result<bool> {
        Ok(self.get_profile(name.as_str())?.is_some())
    }

    fn find_profile(conn: &Connection, name: &str) -> Result<Option<Profile>> {
        let profile = conn
            .query_row(
                &format!(
                    "SELECT {}, {}, {} FROM {} WHERE {} = ?1",
                    profiles::ID,
                    profiles::NAME,
                    profiles::CREATED_AT,
                    profiles::TABLE,
                    profiles::NAME
                ),
                params![name],
                |row| {
                    Ok(Profile {
                        id: row.get(0)?,
                        name: ProfileName::from_trusted(row.get(1)?),
                        created_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(profile)
    }

    fn require_profile(conn: &Connection, name: &ProfileName) -> Result<Profile> {
        Self::find_profile(conn, name.as_str())?
            .ok_or_else(|| FncmError::NotFound(format!("Profile ({name}) does not exist")))
    }

    // ========== Client Operations ==========

    /// Exact, case-sensitive match on the stored first and last name
    pub fn client_exists(&self, first_name: &str, last_name: &str) -> Result<bool> {
        let conn = self.get_connection()?;
        Self::client_exists_in(&conn, first_name, last_name)
    }

    fn client_exists_in(conn: &Connection, first_name: &str, last_name: &str) -> Result<bool> {
        let exists: bool = conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?1 AND {} = ?2)",
                clients::TABLE,
                clients::FIRST_NAME,
                clients::LAST_NAME
            ),
            params![first_name, last_name],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Add a client after normalizing its fields.
    ///
    /// Fails with `Duplicate` when a client with the same first and last
    /// name already exists.
    pub fn insert_client(&self, new_client: &NewClient) -> Result<Client> {
        let first_name = InputValidator::normalize_name(&new_client.first_name);
        let last_name = InputValidator::normalize_name(&new_client.last_name);
        let address = InputValidator::normalize_text(&new_client.address);
        let phone_number = InputValidator::normalize_text(&new_client.phone_number);

        InputValidator::require("First name", &first_name)?;
        InputValidator::require("Last name", &last_name)?;
        InputValidator::require("Address", &address)?;
        InputValidator::require("Phone number", &phone_number)?;

        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;

        if Self::client_exists_in(&tx, &first_name, &last_name)? {
            return Err(FncmError::Duplicate(format!(
                "Client with given first name ({first_name}) and last name ({last_name}) already exists"
            )));
        }

        tx.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}) VALUES (?1, ?2, ?3, ?4)",
                clients::TABLE,
                clients::FIRST_NAME,
                clients::LAST_NAME,
                clients::ADDRESS,
                clients::PHONE_NUMBER
            ),
            params![first_name, last_name, address, phone_number],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        let client = Client {
            id,
            first_name,
            last_name,
            address,
            phone_number,
        };
        info!(
            id,
            first_name = %client.first_name,
            last_name = %client.last_name,
            address = %client.address,
            phone_number = %client.phone_number,
            "Added client"
        );
        Ok(client)
    }

    /// All clients, by last then first name
    pub fn list_clients(&self) -> Result<Vec<Client>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} ORDER BY {}, {}, {}",
            clients::TABLE,
            clients::LAST_NAME,
            clients::FIRST_NAME,
            clients::ID
        ))?;

        let rows = stmt.query_map([], Self::map_client)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(FncmError::from)
    }

    /// Get a client by ID
    pub fn get_client(&self, id: i64) -> Result<Option<Client>> {
        let conn = self.get_connection()?;
        Self::find_client(&conn, id)
    }

    fn find_client(conn: &Connection, id: i64) -> Result<Option<Client>> {
        let client = conn
            .query_row(
                &format!("SELECT * FROM {} WHERE {} = ?1", clients::TABLE, clients::ID),
                params![id],
                Self::map_client,
            )
            .optional()?;
        Ok(client)
    }

    /// Delete a client and every order that references it
    pub fn delete_client(&self, id: i64) -> Result<Deleted<Client>> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;

        let client = Self::find_client(&tx, id)?
            .ok_or_else(|| FncmError::NotFound(format!("Client with id {id} does not exist")))?;
        let orders_removed = Self::count_orders_referencing(&tx, orders::CLIENT_ID, id)?;

        tx.execute(
            &format!("DELETE FROM {} WHERE {} = ?1", clients::TABLE, clients::ID),
            params![id],
        )?;
        tx.commit()?;

        info!(
            id,
            first_name = %client.first_name,
            last_name = %client.last_name,
            orders_removed,
            "Deleted client"
        );
        Ok(Deleted { record: client, orders_removed })
    }

    fn map_client(row: &Row) -> rusqlite::Result<Client> {
        Ok(Client {
            id: row.get(clients::ID)?,
            first_name: row.get(clients::FIRST_NAME)?,
            last_name: row.get(clients::LAST_NAME)?,
            address: row.get(clients::ADDRESS)?,
            phone_number: row.get(clients::PHONE_NUMBER)?,
        })
    }

    // ========== Food Operations ==========

    /// Whether a food item with exactly this name exists
    pub fn food_exists(&self, food_name: &str) -> Result<bool> {
        let conn = self.get_connection()?;
        Self::food_exists_in(&conn, food_name)
    }

    fn food_exists_in(conn: &Connection, food_name: &str) -> Result<bool> {
        let exists: bool = conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?1)",
                food::TABLE,
                food::FOOD_NAME
            ),
            params![food_name],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Add a food item, with or without a color
    pub fn insert_food(&self, new_food: &NewFood) -> Result<Food> {
        let food_name = InputValidator::normalize_name(&new_food.food_name);
        InputValidator::require("Food name", &food_name)?;

        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;

        if Self::food_exists_in(&tx, &food_name)? {
            return Err(FncmError::Duplicate(format!(
                "The food with given name ({food_name}) already exists"
            )));
        }

        let (red, green, blue) = match new_food.color {
            Some(c) => (Some(c.red), Some(c.green), Some(c.blue)),
            None => (None, None, None),
        };
        tx.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}) VALUES (?1, ?2, ?3, ?4)",
                food::TABLE,
                food::FOOD_NAME,
                food::RED,
                food::GREEN,
                food::BLUE
            ),
            params![food_name, red, green, blue],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        let item = Food {
            id,
            food_name,
            color: new_food.color,
        };
        match item.color {
            Some(color) => info!(id, food_name = %item.food_name, %color, "Added food"),
            None => info!(id, food_name = %item.food_name, "Added food"),
        }
        Ok(item)
    }

    /// All food items, by name
    pub fn list_food(&self) -> Result<Vec<Food>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} ORDER BY {}",
            food::TABLE,
            food::FOOD_NAME
        ))?;

        let rows = stmt.query_map([], Self::map_food)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(FncmError::from)
    }

    /// Get a food item by ID
    pub fn get_food(&self, id: i64) -> Result<Option<Food>> {
        let conn = self.get_connection()?;
        Self::find_food(&conn, id)
    }

    fn find_food(conn: &Connection, id: i64) -> Result<Option<Food>> {
        let item = conn
            .query_row(
                &format!("SELECT * FROM {} WHERE {} = ?1", food::TABLE, food::ID),
                params![id],
                Self::map_food,
            )
            .optional()?;
        Ok(item)
    }

    /// Delete a food item and every order that references it
    pub fn delete_food(&self, id: i64) -> Result<Deleted<Food>> {
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;

        let item = Self::find_food(&tx, id)?
            .ok_or_else(|| FncmError::NotFound(format!("Food with id {id} does not exist")))?;
        let orders_removed = Self::count_orders_referencing(&tx, orders::FOOD_ID, id)?;

        tx.execute(
            &format!("DELETE FROM {} WHERE {} = ?1", food::TABLE, food::ID),
            params![id],
        )?;
        tx.commit()?;

        info!(id, food_name = %item.food_name, orders_removed, "Deleted food");
        Ok(Deleted { record: item, orders_removed })
    }

    fn map_food(row: &Row) -> rusqlite::Result<Food> {
        let color = Self::map_color(row, food::RED, food::GREEN, food::BLUE)?;
        Ok(Food {
            id: row.get(food::ID)?,
            food_name: row.get(food::FOOD_NAME)?,
            color,
        })
    }

    fn map_color(row: &Row, red: &str, green: &str, blue: &str) -> rusqlite::Result<Option<Rgb>> {
        Rgb::from_columns(row.get(red)?, row.get(green)?, row.get(blue)?)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(e)))
    }

    // ========== Order Operations ==========

    /// Add an order to a profile's ledger
    pub fn insert_order(&self, profile: &ProfileName, new_order: &NewOrder) -> Result<Order> {
        InputValidator::validate_quantity(new_order.food_quantity)?;
        InputValidator::validate_order_date(new_order.date, Local::now().date_naive())?;

        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;

        let owner = Self::require_profile(&tx, profile)?;
        if Self::find_client(&tx, new_order.client_id)?.is_none() {
            return Err(FncmError::NotFound(format!(
                "Client with id {} does not exist",
                new_order.client_id
            )));
        }
        if Self::find_food(&tx, new_order.food_id)?.is_none() {
            return Err(FncmError::NotFound(format!(
                "Food with id {} does not exist",
                new_order.food_id
            )));
        }

        tx.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}) VALUES (?1, ?2, ?3, ?4, ?5)",
                orders::TABLE,
                orders::PROFILE_ID,
                orders::CLIENT_ID,
                orders::FOOD_ID,
                orders::FOOD_QUANTITY,
                orders::DATE
            ),
            params![
                owner.id,
                new_order.client_id,
                new_order.food_id,
                new_order.food_quantity,
                new_order.date
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        info!(
            profile = %owner.name,
            id,
            client_id = new_order.client_id,
            food_id = new_order.food_id,
            food_quantity = new_order.food_quantity,
            date = %new_order.date,
            "Added order"
        );
        Ok(Order {
            id,
            profile: owner.name,
            client_id: new_order.client_id,
            food_id: new_order.food_id,
            food_quantity: new_order.food_quantity,
            date: new_order.date,
        })
    }

    /// The most recent `limit` orders of a profile, oldest first.
    ///
    /// Rows are picked by date descending (ties by first then last name
    /// ascending) and then returned ascending by (date, first name, last
    /// name).
    pub fn list_orders(&self, profile: &ProfileName, limit: usize) -> Result<Vec<OrderRow>> {
        let conn = self.get_connection()?;
        let owner = Self::require_profile(&conn, profile)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let mut stmt = conn.prepare(
            "SELECT o.id, o.date, c.first_name, c.last_name, c.address, c.phone_number,
                    f.food_name, o.food_quantity, f.red_color, f.green_color, f.blue_color
             FROM orders o
             JOIN clients c ON c.id = o.client_id
             JOIN food f ON f.id = o.food_id
             WHERE o.profile_id = ?1
             ORDER BY o.date DESC, c.first_name ASC, c.last_name ASC, o.id DESC
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![owner.id, limit], |row| {
            Ok(OrderRow {
                id: row.get("id")?,
                date: row.get("date")?,
                first_name: row.get("first_name")?,
                last_name: row.get("last_name")?,
                address: row.get("address")?,
                phone_number: row.get("phone_number")?,
                food_name: row.get("food_name")?,
                food_quantity: row.get("food_quantity")?,
                color: Self::map_color(row, food::RED, food::GREEN, food::BLUE)?,
            })
        })?;

        let mut results = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        results.reverse();
        results.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        debug!(profile = %owner.name, count = results.len(), "Listed orders");
        Ok(results)
    }

    /// Delete one order from a profile's ledger
    pub fn delete_order(&self, profile: &ProfileName, id: i64) -> Result<()> {
        let conn = self.get_connection()?;
        let owner = Self::require_profile(&conn, profile)?;

        let removed = conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?1 AND {} = ?2",
                orders::TABLE,
                orders::ID,
                orders::PROFILE_ID
            ),
            params![id, owner.id],
        )?;

        if removed == 0 {
            return Err(FncmError::NotFound(format!(
                "Order with id {id} does not exist in profile ({})",
                owner.name
            )));
        }

        info!(profile = %owner.name, id, "Deleted order");
        Ok(())
    }

    /// Delete every order of a profile dated on or before `cutoff`
    pub fn purge_old_orders(&self, profile: &ProfileName, cutoff: NaiveDate) -> Result<usize> {
        let conn = self.get_connection()?;
        let owner = Self::require_profile(&conn, profile)?;

        let removed = conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?1 AND {} <= ?2",
                orders::TABLE,
                orders::PROFILE_ID,
                orders::DATE
            ),
            params![owner.id, cutoff],
        )?;

        if removed > 0 {
            info!(profile = %owner.name, %cutoff, removed, "Purged old orders");
        }
        Ok(removed)
    }

    fn count_orders_referencing(conn: &Connection, column: &str, id: i64) -> Result<usize> {
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE {} = ?1", orders::TABLE, column),
            params![id],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

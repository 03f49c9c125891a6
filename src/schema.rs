//! Database schema definitions
//!
//! Table and column name constants used with rusqlite, plus the DDL that
//! creates them. Every statement is idempotent so the schema can be applied
//! on each start.

/// Clients table schema
pub mod clients {
    /// Table name
    pub const TABLE: &str = "clients";
    /// Primary key column
    pub const ID: &str = "id";
    /// Title-cased first name column
    pub const FIRST_NAME: &str = "first_name";
    /// Title-cased last name column
    pub const LAST_NAME: &str = "last_name";
    /// Postal address column
    pub const ADDRESS: &str = "address";
    /// Phone number column
    pub const PHONE_NUMBER: &str = "phone_number";
}

/// Food table schema
pub mod food {
    /// Table name
    pub const TABLE: &str = "food";
    /// Primary key column
    pub const ID: &str = "id";
    /// Unique food name column
    pub const FOOD_NAME: &str = "food_name";
    /// Red channel column (nullable)
    pub const RED: &str = "red_color";
    /// Green channel column (nullable)
    pub const GREEN: &str = "green_color";
    /// Blue channel column (nullable)
    pub const BLUE: &str = "blue_color";
}

/// Profiles registry schema
pub mod profiles {
    /// Table name
    pub const TABLE: &str = "profiles";
    /// Primary key column
    pub const ID: &str = "id";
    /// Sanitized profile name column
    pub const NAME: &str = "name";
    /// Creation timestamp column
    pub const CREATED_AT: &str = "created_at";
}

/// Orders table schema, shared by all profiles
pub mod orders {
    /// Table name
    pub const TABLE: &str = "orders";
    /// Primary key column
    pub const ID: &str = "id";
    /// Foreign key to the owning profile
    pub const PROFILE_ID: &str = "profile_id";
    /// Foreign key to clients
    pub const CLIENT_ID: &str = "client_id";
    /// Foreign key to food
    pub const FOOD_ID: &str = "food_id";
    /// Ordered quantity column
    pub const FOOD_QUANTITY: &str = "food_quantity";
    /// ISO 8601 delivery date column
    pub const DATE: &str = "date";
}

/// Pragmas applied to every new connection.
pub const CONNECTION_PRAGMAS: &str = "PRAGMA foreign_keys = ON;";

/// Base schema: fixed tables, the profiles registry and the orders ledger.
pub const BASE_SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS clients (
    id INTEGER PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    address TEXT NOT NULL,
    phone_number TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_first_name ON clients(first_name);
CREATE INDEX IF NOT EXISTS idx_last_name ON clients(last_name);
CREATE INDEX IF NOT EXISTS idx_phone_number ON clients(phone_number);

CREATE TABLE IF NOT EXISTS food (
    id INTEGER PRIMARY KEY,
    food_name TEXT NOT NULL UNIQUE,
    red_color INTEGER,
    green_color INTEGER,
    blue_color INTEGER,
    CHECK (
        (red_color IS NULL AND green_color IS NULL AND blue_color IS NULL)
        OR (
            red_color IS NOT NULL AND green_color IS NOT NULL AND blue_color IS NOT NULL
            AND red_color BETWEEN 0 AND 255
            AND green_color BETWEEN 0 AND 255
            AND blue_color BETWEEN 0 AND 255
        )
    )
);

CREATE TABLE IF NOT EXISTS profiles (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS orders (
    id INTEGER PRIMARY KEY,
    profile_id INTEGER NOT NULL,
    client_id INTEGER NOT NULL,
    food_id INTEGER NOT NULL,
    food_quantity INTEGER NOT NULL CHECK (food_quantity >= 1),
    date TEXT NOT NULL,
    FOREIGN KEY (profile_id) REFERENCES profiles(id) ON DELETE CASCADE,
    FOREIGN KEY (client_id) REFERENCES clients(id) ON DELETE CASCADE,
    FOREIGN KEY (food_id) REFERENCES food(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_orders_profile_date ON orders(profile_id, date);
CREATE INDEX IF NOT EXISTS idx_orders_client ON orders(client_id);
CREATE INDEX IF NOT EXISTS idx_orders_food ON orders(food_id);
";

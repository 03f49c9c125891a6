use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info, warn};

use fncm::config::AppConfig;
use fncm::db::retention_cutoff;
use fncm::export::{write_clients_table, write_food_table, write_orders, write_orders_to_file};
use fncm::logging::{init_logging, OperationTimer};
use fncm::models::OutputFormat;
use fncm::{Database, FncmError, InputValidator, NewClient, NewFood, NewOrder, ProfileName, Rgb};

#[derive(Parser)]
#[command(author, version, about = "Food and Clientèle Manager", long_about = None)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overrides the configuration
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage clients
    Client {
        #[command(subcommand)]
        action: ClientAction,
    },
    /// Manage food items
    Food {
        #[command(subcommand)]
        action: FoodAction,
    },
    /// Manage profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Manage the orders of a profile
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
enum ClientAction {
    /// Add a client
    Add {
        /// First name
        #[arg(long)]
        first_name: String,

        /// Last name
        #[arg(long)]
        last_name: String,

        /// Postal address
        #[arg(long)]
        address: String,

        /// Phone number
        #[arg(long)]
        phone: String,
    },
    /// List clients
    List,
    /// Delete a client and its orders
    Delete {
        /// Client ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum FoodAction {
    /// Add a food item
    Add {
        /// Food name
        #[arg(long)]
        name: String,

        /// Display color, `r,g,b` or `#rrggbb`
        #[arg(long)]
        color: Option<String>,
    },
    /// List food items
    List,
    /// Delete a food item and its orders
    Delete {
        /// Food ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Create a profile
    Add {
        /// Profile name (letters, digits and underscores)
        name: String,
    },
    /// List profiles
    List,
    /// Delete a profile and its orders
    Delete {
        /// Profile name
        name: String,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Add an order to a profile
    Add {
        /// Profile name
        #[arg(short, long)]
        profile: String,

        /// Client ID
        #[arg(long)]
        client: Option<i64>,

        /// Food ID
        #[arg(long)]
        food: Option<i64>,

        /// Quantity
        #[arg(short, long, default_value = "1")]
        quantity: u32,

        /// Delivery date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Open a profile: purge old orders, then list the most recent ones
    List {
        /// Profile name
        #[arg(short, long)]
        profile: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: Format,
    },
    /// Delete an order from a profile
    Delete {
        /// Profile name
        #[arg(short, long)]
        profile: String,

        /// Order ID
        id: i64,
    },
    /// Export the orders of a profile to a file
    Export {
        /// Profile name
        #[arg(short, long)]
        profile: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: Format,

        /// Output file, defaults to `<profile>.<ext>`
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Csv,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Table => Self::Table,
            Format::Csv => Self::Csv,
            Format::Json => Self::Json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration
    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            let _ = writeln!(std::io::stderr(), "Error: {e}");
            return ExitCode::FAILURE;
        },
    };

    // Initialize logging
    let _guard = match init_logging(&config.logging, &config.get_log_level()) {
        Ok(guard) => guard,
        Err(e) => {
            let _ = writeln!(std::io::stderr(), "Error: {e}");
            return ExitCode::FAILURE;
        },
    };

    info!("Starting fncm");

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_failure(&e, std::io::stderr());
            ExitCode::FAILURE
        },
    }
}

/// Print a failed command to the user and log it.
///
/// Rejected input is logged as a warning, anything else as an error.
fn report_failure<W: Write>(e: &anyhow::Error, mut writer: W) {
    match e.downcast_ref::<FncmError>() {
        Some(user_error) if user_error.is_user_error() => {
            let _ = writeln!(writer, "Error: {user_error}");
            warn!("{user_error}");
        },
        _ => {
            let _ = writeln!(writer, "Error: {e:#}");
            error!("{e:#}");
        },
    }
}

fn run(cli: &Cli, config: &AppConfig) -> Result<()> {
    if matches!(cli.command, Commands::Config) {
        write!(std::io::stdout().lock(), "{}", config.to_yaml()?)?;
        return Ok(());
    }

    let db_path = cli
        .database
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.database.path));
    let db = Database::new(&db_path).with_context(|| format!("Failed to open database {}", db_path.display()))?;

    match &cli.command {
        Commands::Client { action } => run_client(&db, action),
        Commands::Food { action } => run_food(&db, action),
        Commands::Profile { action } => run_profile(&db, action),
        Commands::Order { action } => run_order(&db, config, action),
        Commands::Config => Ok(()),
    }
}

fn run_client(db: &Database, action: &ClientAction) -> Result<()> {
    let mut out = std::io::stdout().lock();
    match action {
        ClientAction::Add {
            first_name,
            last_name,
            address,
            phone,
        } => {
            let _timer = OperationTimer::new("client add");
            let client = db.insert_client(&NewClient {
                first_name: first_name.clone(),
                last_name: last_name.clone(),
                address: address.clone(),
                phone_number: phone.clone(),
            })?;
            writeln!(
                out,
                "Client ({}, {}, {}) added with id {}",
                client.full_name(),
                client.address,
                client.phone_number,
                client.id
            )?;
        },
        ClientAction::List => write_clients_table(&db.list_clients()?, out)?,
        ClientAction::Delete { id } => {
            let deleted = db.delete_client(*id)?;
            writeln!(
                out,
                "Client ({}) deleted along with {} order(s)",
                deleted.record.full_name(),
                deleted.orders_removed
            )?;
        },
    }
    Ok(())
}

fn run_food(db: &Database, action: &FoodAction) -> Result<()> {
    let mut out = std::io::stdout().lock();
    match action {
        FoodAction::Add { name, color } => {
            let _timer = OperationTimer::new("food add");
            let color = color.as_deref().map(str::parse::<Rgb>).transpose()?;
            let item = db.insert_food(&NewFood {
                food_name: name.clone(),
                color,
            })?;
            writeln!(out, "Food ({}) added with id {}", item.food_name, item.id)?;
        },
        FoodAction::List => write_food_table(&db.list_food()?, out)?,
        FoodAction::Delete { id } => {
            let deleted = db.delete_food(*id)?;
            writeln!(
                out,
                "Food ({}) deleted along with {} order(s)",
                deleted.record.food_name, deleted.orders_removed
            )?;
        },
    }
    Ok(())
}

fn run_profile(db: &Database, action: &ProfileAction) -> Result<()> {
    let mut out = std::io::stdout().lock();
    match action {
        ProfileAction::Add { name } => {
            let profile = db.add_profile(name)?;
            writeln!(out, "Profile ({}) added", profile.name)?;
        },
        ProfileAction::List => {
            for name in db.list_profiles()? {
                writeln!(out, "{name}")?;
            }
        },
        ProfileAction::Delete { name } => {
            let profile = open_profile(db, name)?;
            db.drop_profile(&profile)?;
            writeln!(out, "Profile ({profile}) deleted")?;
        },
    }
    Ok(())
}

fn run_order(db: &Database, config: &AppConfig, action: &OrderAction) -> Result<()> {
    let mut out = std::io::stdout().lock();
    let today = Local::now().date_naive();
    match action {
        OrderAction::Add {
            profile,
            client,
            food,
            quantity,
            date,
        } => {
            let profile = open_profile(db, profile)?;
            let (Some(client_id), Some(food_id)) = (*client, *food) else {
                return Err(FncmError::NotFound(
                    "The client/food has not been chosen; choose one".to_string(),
                )
                .into());
            };
            let date = match date {
                Some(date) => InputValidator::parse_order_date(date)?,
                None => today,
            };
            let order = db.insert_order(
                &profile,
                &NewOrder {
                    client_id,
                    food_id,
                    food_quantity: *quantity,
                    date,
                },
            )?;
            writeln!(
                out,
                "Order {} for {}x food {} on {} added to profile ({})",
                order.id, order.food_quantity, order.food_id, order.date, order.profile
            )?;
        },
        OrderAction::List { profile, format } => {
            let _timer = OperationTimer::new("order list");
            let profile = open_profile(db, profile)?;
            db.purge_old_orders(&profile, retention_cutoff(today, config.orders.retention_days))?;
            let orders = db.list_orders(&profile, config.orders.list_limit)?;
            write_orders(&orders, (*format).into(), out)?;
        },
        OrderAction::Delete { profile, id } => {
            let profile = open_profile(db, profile)?;
            db.delete_order(&profile, *id)?;
            writeln!(out, "Order {id} deleted from profile ({profile})")?;
        },
        OrderAction::Export {
            profile,
            format,
            output,
        } => {
            let _timer = OperationTimer::new("order export");
            let profile = open_profile(db, profile)?;
            let format = OutputFormat::from(*format);
            let path = output
                .clone()
                .unwrap_or_else(|| PathBuf::from(format!("{profile}.{}", format.extension())));
            let orders = db.list_orders(&profile, config.orders.list_limit)?;
            write_orders_to_file(&orders, format, &path)?;
            info!(profile = %profile, count = orders.len(), path = %path.display(), "Exported orders");
            writeln!(out, "Exported {} order(s) to {}", orders.len(), path.display())?;
        },
    }
    Ok(())
}

/// Resolve a user-typed profile name to a registered one
fn open_profile(db: &Database, name: &str) -> Result<ProfileName> {
    let profile = db
        .get_profile(InputValidator::normalize_text(name).as_str())?
        .ok_or_else(|| FncmError::NotFound(format!("Profile ({}) does not exist", name.trim())))?;
    Ok(profile.name)
}

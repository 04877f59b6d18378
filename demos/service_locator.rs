//! Demonstrates using Registry as a service locator with settings injection.
//!
//! Registry fits this well because:
//! - Services are declared once, by name and interface
//! - Nothing is built until it's asked for
//! - Each service reads its own configuration, from the environment by default
//!
//! Run with: cargo run --example service_locator
//! Try:      DATABASE_HOST=db.internal DATABASE_PORT=6432 cargo run --example service_locator

use sovran_registry::{
    Implementation, Injectable, Registry, RegistryBuilder, RegistryError, Settings,
    TomlSettingsProvider, SETTINGS_PROVIDER,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .init();

    // Build the container from its declaration table
    let services = app_services().build()?;
    println!("Registered services: {:?}", services.names()?);

    // Services can be fetched anywhere the registry is available
    let users = UserService::new(&services);
    users.create_user("alice")?;
    users.create_user("bob")?;

    // Swap configuration source without touching the services
    let overrides: TomlSettingsProvider = r#"
[database]
host = "replica.internal"
port = 5433

[logger]
prefix = "replica"
"#
    .parse()?;
    services.bind(SETTINGS_PROVIDER, overrides.into_implementation())?;

    println!("\nAfter switching to TOML settings:");
    users.create_user("carol")?;

    // Plain values live next to the services
    services.set_attribute("build", "2026.10".to_string())?;
    println!("\nBuild: {}", services.attribute::<String>("build")?);

    Ok(())
}

fn app_services() -> RegistryBuilder {
    Registry::builder()
        .declare("database", Implementation::<dyn Database>::of::<PostgresDatabase>())
        .declare("logger", Implementation::<dyn Logger>::of::<ConsoleLogger>())
}

// ============================================================================
// Interfaces and implementations
// ============================================================================

trait Database: Send + Sync {
    fn insert(&self, table: &str, row: &str) -> String;
}

struct PostgresDatabase {
    host: String,
    port: u16,
    database: String,
}

impl Database for PostgresDatabase {
    fn insert(&self, table: &str, row: &str) -> String {
        format!(
            "INSERT {} INTO {}.{} on {}:{}",
            row, self.database, table, self.host, self.port
        )
    }
}

impl Injectable for PostgresDatabase {
    fn inject(settings: &Settings<'_>) -> Result<Self, RegistryError> {
        Ok(Self {
            host: settings.or("database.host", "localhost".to_string())?,
            port: settings.or("database.port", 5432)?,
            database: settings.or("database.name", "myapp".to_string())?,
        })
    }
}

impl From<PostgresDatabase> for Box<dyn Database> {
    fn from(database: PostgresDatabase) -> Self {
        Box::new(database)
    }
}

trait Logger: Send + Sync {
    fn log(&self, message: &str);
}

struct ConsoleLogger {
    prefix: String,
}

impl Logger for ConsoleLogger {
    fn log(&self, message: &str) {
        println!("[{}] {}", self.prefix, message);
    }
}

impl Injectable for ConsoleLogger {
    fn inject(settings: &Settings<'_>) -> Result<Self, RegistryError> {
        Ok(Self {
            prefix: settings.or("logger.prefix", "app".to_string())?,
        })
    }
}

impl From<ConsoleLogger> for Box<dyn Logger> {
    fn from(logger: ConsoleLogger) -> Self {
        Box::new(logger)
    }
}

// ============================================================================
// A consumer that fetches its dependencies from the registry
// ============================================================================

struct UserService<'a> {
    services: &'a Registry,
}

impl<'a> UserService<'a> {
    fn new(services: &'a Registry) -> Self {
        Self { services }
    }

    fn create_user(&self, username: &str) -> Result<(), RegistryError> {
        let logger = self.services.resolve::<dyn Logger>("logger")?;
        logger.log(&format!("Creating user: {}", username));

        let database = self.services.resolve::<dyn Database>("database")?;
        println!("  -> {}", database.insert("users", username));
        Ok(())
    }
}

//! # sovran-registry
//!
//! A small dependency registry that builds implementations lazily and injects their
//! settings.
//!
//! `sovran-registry` lets you declare named slots for an interface (usually a trait object),
//! bind a concrete implementation to each slot, and get a freshly built instance every time
//! you resolve it. Implementations read their configuration through a pluggable
//! [`SettingsProvider`], which reads environment variables unless you bind something else.
//!
//! ## Key Features
//!
//! - **Lazy**: Nothing is built until it's resolved, and every resolution builds a new instance
//! - **Checked bindings**: An implementation can only be bound to the interface it converts into
//! - **Settings injection**: Implementations declare in code which settings they read and their defaults
//! - **Pluggable settings**: Environment variables by default, TOML documents or your own provider otherwise
//! - **Thread-safe**: Registry state sits behind a `Mutex` and is never locked while building
//!
//! ## Usage Examples
//!
//! ### Registering and Resolving
//!
//! ```rust
//! use sovran_registry::{Implementation, Injectable, Registry, RegistryError, Settings};
//!
//! trait Storage: Send + Sync {
//!     fn describe(&self) -> String;
//! }
//!
//! struct DiskStorage {
//!     root: String,
//!     quota_mb: u32,
//! }
//!
//! impl Storage for DiskStorage {
//!     fn describe(&self) -> String {
//!         format!("{} ({} MB)", self.root, self.quota_mb)
//!     }
//! }
//!
//! impl From<DiskStorage> for Box<dyn Storage> {
//!     fn from(storage: DiskStorage) -> Self {
//!         Box::new(storage)
//!     }
//! }
//!
//! impl Injectable for DiskStorage {
//!     fn inject(settings: &Settings<'_>) -> Result<Self, RegistryError> {
//!         Ok(Self {
//!             root: settings.or("storage.root", "/var/lib/app".to_string())?,
//!             quota_mb: settings.or("storage.quota-mb", 512)?,
//!         })
//!     }
//! }
//!
//! fn main() -> Result<(), RegistryError> {
//!     let registry = Registry::new();
//!     registry.register("storage", Some(Implementation::<dyn Storage>::of::<DiskStorage>()))?;
//!
//!     // Built on demand; STORAGE_ROOT and STORAGE_QUOTA-MB are read here
//!     let storage = registry.resolve::<dyn Storage>("storage")?;
//!     println!("Storage: {}", storage.describe());
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Swapping the Settings Provider
//!
//! ```rust
//! use sovran_registry::{Registry, TomlSettingsProvider, SETTINGS_PROVIDER};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = Registry::new();
//!
//!     let settings: TomlSettingsProvider = "[storage]\nroot = \"/tmp/app\"".parse()?;
//!     registry.bind(SETTINGS_PROVIDER, settings.into_implementation())?;
//!
//!     let provider = registry.settings_provider()?;
//!     let root = provider.get_setting_value(
//!         "storage.root",
//!         sovran_registry::SettingType::String,
//!         None,
//!     )?;
//!     assert_eq!(root.to_string(), "/tmp/app");
//!     Ok(())
//! }
//! ```
//!
//! ### Error Handling
//!
//! ```rust
//! use sovran_registry::{Registry, RegistryError};
//!
//! trait Mailer: Send + Sync {}
//!
//! let registry = Registry::new();
//! registry.register::<dyn Mailer>("mailer", None).unwrap();
//!
//! match registry.resolve::<dyn Mailer>("mailer") {
//!     Ok(_) => println!("Mailer ready"),
//!     Err(RegistryError::NotFound { name }) => println!("{} was never registered", name),
//!     Err(RegistryError::NoImplementation { name }) => println!("{} has nothing bound", name),
//!     Err(e) => println!("Other error: {}", e),
//! }
//!
//! // Registered slots only accept implementation bindings
//! assert!(matches!(
//!     registry.set_attribute("mailer", 5),
//!     Err(RegistryError::InvalidAssignment { .. })
//! ));
//!
//! // Asking for the wrong interface is an error, not a panic
//! assert!(matches!(
//!     registry.resolve::<dyn Mailer>("settings_provider"),
//!     Err(RegistryError::InterfaceMismatch { .. })
//! ));
//! ```

mod any_value;
mod binding;
mod env;
mod error;
mod registry;
mod settings;
mod toml;

pub use binding::{
    AnyImplementation, Declaration, Implementation, ImplementationBinding, Injectable,
    InterfaceBinding, TypeInfo,
};
pub use env::EnvironmentSettingsProvider;
pub use error::{RegistryError, SettingError};
pub use registry::{Registry, RegistryBuilder, RegistryEntry, Settings, SETTINGS_PROVIDER};
pub use settings::{
    check_identifier, coerce, Setting, SettingDescriptor, SettingType, SettingValue,
    SettingsProvider,
};
pub use toml::TomlSettingsProvider;

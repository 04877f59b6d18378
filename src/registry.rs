use crate::any_value::AnyValue;
use crate::binding::{
    AnyImplementation, Declaration, Implementation, ImplementationBinding, InterfaceBinding,
    TypeInfo,
};
use crate::env::EnvironmentSettingsProvider;
use crate::error::{RegistryError, SettingError};
use crate::settings::{Setting, SettingDescriptor, SettingsProvider};
use std::any::{type_name, Any};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Name of the slot every registry resolves settings through.
pub const SETTINGS_PROVIDER: &str = "settings_provider";

/// A snapshot of one registered slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub interface: InterfaceBinding,
    pub implementation: Option<ImplementationBinding>,
}

#[derive(Debug)]
struct Entry {
    interface: InterfaceBinding,
    implementation: Option<AnyImplementation>,
}

impl Entry {
    fn snapshot(&self) -> RegistryEntry {
        RegistryEntry {
            interface: self.interface.clone(),
            implementation: self
                .implementation
                .as_ref()
                .map(|implementation| *implementation.binding()),
        }
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    entries: BTreeMap<String, Entry>,
    attributes: HashMap<String, AnyValue>,
}

/// A registry of named interfaces and the implementations bound to them.
///
/// Implementations are built lazily: nothing is constructed until [`resolve`](Self::resolve)
/// is called, and every call builds a fresh instance. While an implementation is being
/// built it reads its settings through whatever is bound to [`SETTINGS_PROVIDER`], which
/// defaults to [`EnvironmentSettingsProvider`].
///
/// Names that aren't registered interfaces can hold plain attributes, set with
/// [`set_attribute`](Self::set_attribute).
///
/// The registry state sits behind a mutex, so a `Registry` can be shared across threads;
/// the lock is released before any implementation is built.
#[derive(Debug)]
pub struct Registry {
    state: Mutex<RegistryState>,
}

impl Registry {
    /// Creates a registry holding only the `settings_provider` slot.
    pub fn new() -> Self {
        let mut state = RegistryState::default();
        let settings_provider =
            Implementation::<dyn SettingsProvider>::of::<EnvironmentSettingsProvider>();
        state.entries.insert(
            SETTINGS_PROVIDER.to_string(),
            Entry {
                interface: InterfaceBinding {
                    name: SETTINGS_PROVIDER.to_string(),
                    interface_type: TypeInfo::of::<dyn SettingsProvider>(),
                },
                implementation: Some(settings_provider.into()),
            },
        );
        Self {
            state: Mutex::new(state),
        }
    }

    /// Starts a declaration table for a registry with more slots than the default one.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    fn lock(&self) -> Result<MutexGuard<'_, RegistryState>, RegistryError> {
        self.state.lock().map_err(|_| RegistryError::LockError)
    }

    /// Registers `name` as a slot for `interface_type`, replacing any previous entry.
    ///
    /// A plain attribute previously set under `name` is dropped.
    ///
    /// # Errors
    ///
    /// - Returns `RegistryError::IncompatibleImplementation` if `implementation` wasn't built
    ///   for `interface_type`
    /// - Returns `RegistryError::LockError` if the internal lock cannot be acquired
    pub fn register_interface(
        &self,
        name: impl Into<String>,
        interface_type: TypeInfo,
        implementation: Option<AnyImplementation>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if let Some(implementation) = &implementation {
            check_compatible(&name, &interface_type, implementation)?;
        }

        let mut state = self.lock()?;
        state.attributes.remove(&name);
        debug!(
            name = %name,
            interface = interface_type.name(),
            implementation = ?implementation
                .as_ref()
                .map(|implementation| implementation.binding().implementation_type.name()),
            "registering interface"
        );
        state.entries.insert(
            name.clone(),
            Entry {
                interface: InterfaceBinding {
                    name,
                    interface_type,
                },
                implementation,
            },
        );
        Ok(())
    }

    /// Registers `name` as a slot for interface `I`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sovran_registry::{Implementation, Injectable, Registry, RegistryError, Settings};
    ///
    /// trait Clock: Send + Sync {
    ///     fn now(&self) -> u64;
    /// }
    ///
    /// struct FixedClock(u64);
    ///
    /// impl Clock for FixedClock {
    ///     fn now(&self) -> u64 {
    ///         self.0
    ///     }
    /// }
    ///
    /// impl From<FixedClock> for Box<dyn Clock> {
    ///     fn from(clock: FixedClock) -> Self {
    ///         Box::new(clock)
    ///     }
    /// }
    ///
    /// impl Injectable for FixedClock {
    ///     fn inject(settings: &Settings<'_>) -> Result<Self, RegistryError> {
    ///         Ok(FixedClock(settings.or("clock.fixed-at", 42)?))
    ///     }
    /// }
    ///
    /// let registry = Registry::new();
    /// registry.register("clock", Some(Implementation::<dyn Clock>::of::<FixedClock>()))?;
    ///
    /// let clock = registry.resolve::<dyn Clock>("clock")?;
    /// assert_eq!(clock.now(), 42);
    /// # Ok::<(), RegistryError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::LockError` if the internal lock cannot be acquired.
    pub fn register<I: ?Sized + 'static>(
        &self,
        name: impl Into<String>,
        implementation: Option<Implementation<I>>,
    ) -> Result<(), RegistryError> {
        self.register_interface(name, TypeInfo::of::<I>(), implementation.map(Into::into))
    }

    /// Binds a new implementation to an already registered slot.
    ///
    /// # Errors
    ///
    /// - Returns `RegistryError::NotFound` if `name` is not a registered interface
    /// - Returns `RegistryError::IncompatibleImplementation` if `implementation` wasn't built
    ///   for the slot's interface
    /// - Returns `RegistryError::LockError` if the internal lock cannot be acquired
    pub fn bind(
        &self,
        name: &str,
        implementation: impl Into<AnyImplementation>,
    ) -> Result<(), RegistryError> {
        let implementation = implementation.into();
        let mut state = self.lock()?;
        let entry = state
            .entries
            .get_mut(name)
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })?;
        check_compatible(name, &entry.interface.interface_type, &implementation)?;

        debug!(
            name,
            implementation = implementation.binding().implementation_type.name(),
            "binding implementation"
        );
        entry.implementation = Some(implementation);
        Ok(())
    }

    /// Builds a fresh instance of whatever is bound to `name`.
    ///
    /// # Errors
    ///
    /// - Returns `RegistryError::NotFound` if `name` was never registered
    /// - Returns `RegistryError::NoImplementation` if no implementation is bound
    /// - Returns `RegistryError::InterfaceMismatch` if `name` is registered for another interface
    /// - Returns any error raised while reading settings or constructing the implementation
    pub fn resolve<I: ?Sized + 'static>(&self, name: &str) -> Result<Box<I>, RegistryError> {
        let implementation = {
            let state = self.lock()?;
            let entry = state
                .entries
                .get(name)
                .ok_or_else(|| RegistryError::NotFound {
                    name: name.to_string(),
                })?;
            let implementation =
                entry
                    .implementation
                    .as_ref()
                    .ok_or_else(|| RegistryError::NoImplementation {
                        name: name.to_string(),
                    })?;
            if !entry.interface.interface_type.is::<I>() {
                return Err(RegistryError::InterfaceMismatch {
                    name: name.to_string(),
                    registered: entry.interface.interface_type.name(),
                    requested: type_name::<I>(),
                });
            }
            implementation.clone()
        };

        let typed = implementation
            .downcast::<I>()
            .ok_or_else(|| RegistryError::InterfaceMismatch {
                name: name.to_string(),
                registered: implementation.binding().interface_type.name(),
                requested: type_name::<I>(),
            })?;

        debug!(
            name,
            implementation = typed.implementation_type().name(),
            "resolving interface"
        );
        typed.instantiate(&Settings::new(self))
    }

    /// Builds the settings provider currently bound to [`SETTINGS_PROVIDER`].
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Self::resolve).
    pub fn settings_provider(&self) -> Result<Box<dyn SettingsProvider>, RegistryError> {
        self.resolve::<dyn SettingsProvider>(SETTINGS_PROVIDER)
    }

    /// Stores a plain value under a name that isn't a registered interface.
    ///
    /// # Errors
    ///
    /// - Returns `RegistryError::InvalidAssignment` if `name` is a registered interface
    /// - Returns `RegistryError::LockError` if the internal lock cannot be acquired
    pub fn set_attribute<V: Any + Send + Sync>(
        &self,
        name: impl Into<String>,
        value: V,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        let mut state = self.lock()?;
        if state.entries.contains_key(&name) {
            return Err(RegistryError::InvalidAssignment { name });
        }

        let value = AnyValue::new(value);
        debug!(name = %name, value_type = value.type_name(), "setting attribute");
        state.attributes.insert(name, value);
        Ok(())
    }

    /// Returns a clone of a plain attribute.
    ///
    /// # Errors
    ///
    /// - Returns `RegistryError::NotFound` if no attribute is set under `name`
    /// - Returns `RegistryError::TypeMismatch` if the attribute is not a `V`
    /// - Returns `RegistryError::LockError` if the internal lock cannot be acquired
    pub fn attribute<V: Clone + 'static>(&self, name: &str) -> Result<V, RegistryError> {
        self.with_attribute(name, |value: &V| value.clone())
    }

    /// Calls `f` with a reference to a plain attribute.
    ///
    /// The registry stays locked while `f` runs, so `f` must not call back into it.
    ///
    /// # Errors
    ///
    /// Same as [`attribute`](Self::attribute).
    pub fn with_attribute<V: 'static, F, R>(&self, name: &str, f: F) -> Result<R, RegistryError>
    where
        F: FnOnce(&V) -> R,
    {
        let state = self.lock()?;
        let value = state
            .attributes
            .get(name)
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })?;
        let value = value
            .downcast_ref::<V>()
            .ok_or_else(|| RegistryError::TypeMismatch {
                name: name.to_string(),
            })?;
        Ok(f(value))
    }

    /// Checks if `name` is a registered interface.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::LockError` if the internal lock cannot be acquired.
    pub fn contains(&self, name: &str) -> Result<bool, RegistryError> {
        Ok(self.lock()?.entries.contains_key(name))
    }

    /// Names of all registered interfaces, sorted.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::LockError` if the internal lock cannot be acquired.
    pub fn names(&self) -> Result<Vec<String>, RegistryError> {
        Ok(self.lock()?.entries.keys().cloned().collect())
    }

    /// A snapshot of the entry registered under `name`.
    ///
    /// # Errors
    ///
    /// - Returns `RegistryError::NotFound` if `name` was never registered
    /// - Returns `RegistryError::LockError` if the internal lock cannot be acquired
    pub fn entry(&self, name: &str) -> Result<RegistryEntry, RegistryError> {
        self.lock()?
            .entries
            .get(name)
            .map(Entry::snapshot)
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })
    }

    /// Snapshots of every registered entry, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::LockError` if the internal lock cannot be acquired.
    pub fn entries(&self) -> Result<Vec<RegistryEntry>, RegistryError> {
        Ok(self.lock()?.entries.values().map(Entry::snapshot).collect())
    }

    /// Number of registered interfaces.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::LockError` if the internal lock cannot be acquired.
    pub fn len(&self) -> Result<usize, RegistryError> {
        Ok(self.lock()?.entries.len())
    }

    /// # Errors
    ///
    /// Returns `RegistryError::LockError` if the internal lock cannot be acquired.
    pub fn is_empty(&self) -> Result<bool, RegistryError> {
        Ok(self.lock()?.entries.is_empty())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

fn check_compatible(
    name: &str,
    interface_type: &TypeInfo,
    implementation: &AnyImplementation,
) -> Result<(), RegistryError> {
    let binding = implementation.binding();
    if binding.satisfies(interface_type) {
        Ok(())
    } else {
        Err(RegistryError::IncompatibleImplementation {
            name: name.to_string(),
            implementation: binding.implementation_type.name(),
            interface: interface_type.name(),
        })
    }
}

/// A declaration table that builds a [`Registry`].
///
/// The built-in `settings_provider` slot is always declared first; a later declaration with
/// the same name replaces it. To extend a registry layout, write a function that returns a
/// builder and keep declaring on top of it.
///
/// ```
/// use sovran_registry::{Implementation, Registry, RegistryBuilder, RegistryError};
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
///
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         "hello".to_string()
///     }
/// }
///
/// impl From<English> for Box<dyn Greeter> {
///     fn from(greeter: English) -> Self {
///         Box::new(greeter)
///     }
/// }
///
/// fn base() -> RegistryBuilder {
///     Registry::builder().declare(
///         "greeter",
///         Implementation::<dyn Greeter>::from_fn(|_| Ok(English)),
///     )
/// }
///
/// let registry = base().attribute("retries", 3u32).build()?;
/// assert_eq!(registry.resolve::<dyn Greeter>("greeter")?.greet(), "hello");
/// assert_eq!(registry.attribute::<u32>("retries")?, 3);
/// # Ok::<(), RegistryError>(())
/// ```
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    declarations: Vec<Declaration>,
    attributes: Vec<(String, AnyValue)>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare<I: ?Sized + 'static>(
        self,
        name: impl Into<String>,
        implementation: Implementation<I>,
    ) -> Self {
        self.declaration(Declaration::new(name, implementation))
    }

    pub fn declaration(mut self, declaration: Declaration) -> Self {
        self.declarations.push(declaration);
        self
    }

    pub fn declarations(mut self, declarations: impl IntoIterator<Item = Declaration>) -> Self {
        self.declarations.extend(declarations);
        self
    }

    /// A plain attribute, set after all declarations are registered.
    pub fn attribute<V: Any + Send + Sync>(mut self, name: impl Into<String>, value: V) -> Self {
        self.attributes.push((name.into(), AnyValue::new(value)));
        self
    }

    /// Creates the registry and registers every declaration in order.
    ///
    /// # Errors
    ///
    /// - Returns `RegistryError::IncompatibleImplementation` for an erased declaration whose
    ///   implementation doesn't satisfy its interface
    /// - Returns `RegistryError::InvalidAssignment` if an attribute shares a declared name
    pub fn build(self) -> Result<Registry, RegistryError> {
        let registry = Registry::new();
        for declaration in self.declarations {
            registry.register_interface(
                declaration.name,
                declaration.interface_type,
                Some(declaration.implementation),
            )?;
        }

        {
            let mut state = registry.lock()?;
            for (name, value) in self.attributes {
                if state.entries.contains_key(&name) {
                    return Err(RegistryError::InvalidAssignment { name });
                }
                state.attributes.insert(name, value);
            }
        }
        Ok(registry)
    }
}

/// Settings access handed to implementations while they are being built.
///
/// Every lookup resolves the registry's current `settings_provider` again, so a rebinding
/// takes effect on the next lookup.
#[derive(Debug, Clone, Copy)]
pub struct Settings<'a> {
    registry: &'a Registry,
}

impl<'a> Settings<'a> {
    pub(crate) fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// The registry doing the resolution, for implementations that fetch other interfaces
    /// themselves.
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Reads the setting `descriptor` points at.
    ///
    /// # Errors
    ///
    /// - Returns `RegistryError::Setting` if the provider rejects the lookup, the value
    ///   doesn't fit in `T`, or the default has no exact provider value
    /// - Returns any error raised while resolving the settings provider itself
    pub fn get<T: Setting + Clone>(
        &self,
        descriptor: &SettingDescriptor<T>,
    ) -> Result<T, RegistryError> {
        self.lookup(&descriptor.identifier, descriptor.default_value.clone())
    }

    /// Reads a setting that has no default.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub fn required<T: Setting>(&self, identifier: &str) -> Result<T, RegistryError> {
        self.lookup(identifier, None)
    }

    /// Reads a setting, falling back to `default_value` when the provider has none.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub fn or<T: Setting>(&self, identifier: &str, default_value: T) -> Result<T, RegistryError> {
        self.lookup(identifier, Some(default_value))
    }

    fn lookup<T: Setting>(
        &self,
        identifier: &str,
        default_value: Option<T>,
    ) -> Result<T, RegistryError> {
        let default_value = default_value
            .map(Setting::into_value)
            .transpose()
            .map_err(|value| SettingError::ConversionFailure {
                identifier: identifier.to_string(),
                value,
                setting_type: T::TYPE,
            })?;

        let provider = self.registry.settings_provider()?;
        let value = provider.get_setting_value(identifier, T::TYPE, default_value)?;

        let raw = value.to_string();
        T::from_value(value).ok_or_else(|| {
            SettingError::ConversionFailure {
                identifier: identifier.to_string(),
                value: raw,
                setting_type: T::TYPE,
            }
            .into()
        })
    }
}

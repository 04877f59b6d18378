use crate::error::RegistryError;
use crate::registry::Settings;
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Runtime identity of a type, interface or implementation.
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
}

impl TypeInfo {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A named slot and the interface anything bound to it must satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceBinding {
    pub name: String,
    pub interface_type: TypeInfo,
}

/// A concrete type bound to a slot, and the interface it was built to satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImplementationBinding {
    pub implementation_type: TypeInfo,
    pub interface_type: TypeInfo,
}

impl ImplementationBinding {
    pub fn satisfies(&self, interface_type: &TypeInfo) -> bool {
        self.interface_type == *interface_type
    }
}

/// A type the registry can build, reading whatever settings it needs.
///
/// `inject` is called on every resolution. Each setting it reads is looked up through the
/// registry's current `settings_provider`; anything it doesn't read is up to the type's
/// own defaults.
///
/// ```
/// use sovran_registry::{Injectable, RegistryError, Settings};
///
/// struct Pool {
///     size: u32,
///     name: String,
/// }
///
/// impl Injectable for Pool {
///     fn inject(settings: &Settings<'_>) -> Result<Self, RegistryError> {
///         Ok(Self {
///             size: settings.or("db.pool-size", 8)?,
///             name: "primary".to_string(),
///         })
///     }
/// }
/// ```
pub trait Injectable: Sized {
    fn inject(settings: &Settings<'_>) -> Result<Self, RegistryError>;
}

/// A typed implementation binding for interface `I`.
///
/// Holding an `Implementation<I>` is proof that it builds something usable as `I`: the
/// constructors require the concrete type to convert into `Box<I>`.
pub struct Implementation<I: ?Sized> {
    implementation_type: TypeInfo,
    factory: Arc<dyn Fn(&Settings<'_>) -> Result<Box<I>, RegistryError> + Send + Sync>,
}

impl<I: ?Sized + 'static> Implementation<I> {
    /// Binds `C`, built through its [`Injectable`] impl.
    pub fn of<C>() -> Self
    where
        C: Injectable + Into<Box<I>> + 'static,
    {
        Self {
            implementation_type: TypeInfo::of::<C>(),
            factory: Arc::new(|settings: &Settings<'_>| {
                C::inject(settings).map(Into::<Box<I>>::into)
            }),
        }
    }

    /// Binds `C`, built by `factory`.
    pub fn from_fn<C, F>(factory: F) -> Self
    where
        C: Into<Box<I>> + 'static,
        F: Fn(&Settings<'_>) -> Result<C, RegistryError> + Send + Sync + 'static,
    {
        Self {
            implementation_type: TypeInfo::of::<C>(),
            factory: Arc::new(move |settings: &Settings<'_>| {
                factory(settings).map(Into::<Box<I>>::into)
            }),
        }
    }

    pub fn implementation_type(&self) -> TypeInfo {
        self.implementation_type
    }

    pub fn binding(&self) -> ImplementationBinding {
        ImplementationBinding {
            implementation_type: self.implementation_type,
            interface_type: TypeInfo::of::<I>(),
        }
    }

    pub(crate) fn instantiate(&self, settings: &Settings<'_>) -> Result<Box<I>, RegistryError> {
        (self.factory)(settings)
    }
}

impl<I: ?Sized> Clone for Implementation<I> {
    fn clone(&self) -> Self {
        Self {
            implementation_type: self.implementation_type,
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<I: ?Sized> fmt::Debug for Implementation<I> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Implementation")
            .field("implementation_type", &self.implementation_type)
            .finish_non_exhaustive()
    }
}

/// An implementation binding with its interface erased.
///
/// Used where the interface is only known at run time; the registry checks
/// [`ImplementationBinding::satisfies`] before accepting it.
#[derive(Clone)]
pub struct AnyImplementation {
    binding: ImplementationBinding,
    implementation: Arc<dyn Any + Send + Sync>,
}

impl AnyImplementation {
    pub fn binding(&self) -> &ImplementationBinding {
        &self.binding
    }

    pub(crate) fn downcast<I: ?Sized + 'static>(&self) -> Option<&Implementation<I>> {
        self.implementation.downcast_ref::<Implementation<I>>()
    }
}

impl<I: ?Sized + 'static> From<Implementation<I>> for AnyImplementation {
    fn from(implementation: Implementation<I>) -> Self {
        Self {
            binding: implementation.binding(),
            implementation: Arc::new(implementation),
        }
    }
}

impl fmt::Debug for AnyImplementation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("AnyImplementation")
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

/// One row of a registry's declaration table.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub(crate) name: String,
    pub(crate) interface_type: TypeInfo,
    pub(crate) implementation: AnyImplementation,
}

impl Declaration {
    pub fn new<I: ?Sized + 'static>(
        name: impl Into<String>,
        implementation: Implementation<I>,
    ) -> Self {
        Self {
            name: name.into(),
            interface_type: TypeInfo::of::<I>(),
            implementation: implementation.into(),
        }
    }

    /// A declaration whose compatibility is only checked when the registry is built.
    pub fn erased(
        name: impl Into<String>,
        interface_type: TypeInfo,
        implementation: impl Into<AnyImplementation>,
    ) -> Self {
        Self {
            name: name.into(),
            interface_type,
            implementation: implementation.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    trait Shape: Send + Sync {
        fn area(&self) -> f64;
    }

    trait Named {}

    struct Square;

    impl Shape for Square {
        fn area(&self) -> f64 {
            4.0
        }
    }

    impl From<Square> for Box<dyn Shape> {
        fn from(square: Square) -> Self {
            Box::new(square)
        }
    }

    impl Injectable for Square {
        fn inject(_settings: &Settings<'_>) -> Result<Self, RegistryError> {
            Ok(Square)
        }
    }

    #[test]
    fn test_type_info_identity() {
        assert_eq!(TypeInfo::of::<dyn Shape>(), TypeInfo::of::<dyn Shape>());
        assert_ne!(TypeInfo::of::<dyn Shape>(), TypeInfo::of::<dyn Named>());
        assert!(TypeInfo::of::<Square>().is::<Square>());
        assert!(TypeInfo::of::<Square>().name().ends_with("Square"));
        assert_eq!(TypeInfo::of::<Square>().id(), TypeId::of::<Square>());
    }

    #[test]
    fn test_erasure_keeps_binding() {
        let implementation = Implementation::<dyn Shape>::of::<Square>();
        let erased = AnyImplementation::from(implementation);

        assert!(erased.binding().satisfies(&TypeInfo::of::<dyn Shape>()));
        assert!(!erased.binding().satisfies(&TypeInfo::of::<dyn Named>()));
        assert!(erased.binding().implementation_type.is::<Square>());
        assert!(erased.downcast::<dyn Named>().is_none());

        let registry = Registry::new();
        let shape = erased
            .downcast::<dyn Shape>()
            .unwrap()
            .instantiate(&Settings::new(&registry))
            .unwrap();
        assert_eq!(shape.area(), 4.0);
    }

    #[test]
    fn test_declaration_records_interface() {
        let declaration = Declaration::new("shape", Implementation::<dyn Shape>::of::<Square>());
        assert_eq!(declaration.name(), "shape");
        assert!(declaration.interface_type.is::<dyn Shape>());
    }
}

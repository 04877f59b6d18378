use crate::settings::SettingType;
use thiserror::Error;

/// Errors raised while looking up or converting a setting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingError {
    /// The identifier contains characters outside `[A-Za-z0-9.-]`, or nothing but separators
    #[error("setting identifier '{identifier}' is not in the identifier format")]
    InvalidIdentifier { identifier: String },

    /// No value was found and no default was supplied
    #[error("no value for setting '{identifier}' could be found")]
    NotFound {
        identifier: String,
        setting_type: SettingType,
    },

    /// The provider cannot produce values of the requested type
    #[error("{setting_type} requested for '{identifier}' is not supported by the settings provider")]
    UnsupportedType {
        identifier: String,
        setting_type: SettingType,
    },

    /// A raw value was found but could not be converted
    #[error("could not convert '{value}' to {setting_type} for setting '{identifier}'")]
    ConversionFailure {
        identifier: String,
        value: String,
        setting_type: SettingType,
    },
}

impl SettingError {
    /// The identifier the failing lookup was made for.
    pub fn identifier(&self) -> &str {
        match self {
            SettingError::InvalidIdentifier { identifier }
            | SettingError::NotFound { identifier, .. }
            | SettingError::UnsupportedType { identifier, .. }
            | SettingError::ConversionFailure { identifier, .. } => identifier,
        }
    }

    /// The requested type, if the failure happened after the identifier was accepted.
    pub fn setting_type(&self) -> Option<&SettingType> {
        match self {
            SettingError::InvalidIdentifier { .. } => None,
            SettingError::NotFound { setting_type, .. }
            | SettingError::UnsupportedType { setting_type, .. }
            | SettingError::ConversionFailure { setting_type, .. } => Some(setting_type),
        }
    }
}

/// Errors that can occur when registering, binding or resolving interfaces
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Failed to acquire the registry lock
    #[error("failed to acquire registry lock")]
    LockError,

    /// Nothing is registered (or set) under the name
    #[error("'{name}' could not be found in the registry")]
    NotFound { name: String },

    /// The interface is registered but has no implementation bound
    #[error("interface '{name}' has no implementation bound")]
    NoImplementation { name: String },

    /// The implementation was not built for the interface it is being bound to
    #[error("implementation {implementation} bound to '{name}' does not satisfy interface {interface}")]
    IncompatibleImplementation {
        name: String,
        implementation: &'static str,
        interface: &'static str,
    },

    /// A plain value was written to a name that holds an interface binding
    #[error("'{name}' is a registered interface and only accepts implementation bindings")]
    InvalidAssignment { name: String },

    /// The caller asked for a different interface than the one registered
    #[error("'{name}' is registered as {registered}, not {requested}")]
    InterfaceMismatch {
        name: String,
        registered: &'static str,
        requested: &'static str,
    },

    /// A plain attribute was read back as the wrong type
    #[error("attribute '{name}' does not hold a value of the requested type")]
    TypeMismatch { name: String },

    /// An implementation failed to construct itself
    #[error("failed to construct {implementation}: {source}")]
    Construction {
        implementation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A setting required by an implementation could not be resolved
    #[error(transparent)]
    Setting(#[from] SettingError),
}

impl RegistryError {
    /// Wraps an implementation's own failure.
    pub fn construction<C: ?Sized>(
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        RegistryError::Construction {
            implementation: std::any::type_name::<C>(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setting_error_accessors() {
        let err = SettingError::ConversionFailure {
            identifier: "foo".to_string(),
            value: "1.0".to_string(),
            setting_type: SettingType::Integer,
        };
        assert_eq!(err.identifier(), "foo");
        assert_eq!(err.setting_type(), Some(&SettingType::Integer));
        assert_eq!(
            err.to_string(),
            "could not convert '1.0' to integer for setting 'foo'"
        );

        let err = SettingError::InvalidIdentifier {
            identifier: "B.C%".to_string(),
        };
        assert_eq!(err.identifier(), "B.C%");
        assert!(err.setting_type().is_none());
    }

    #[test]
    fn test_setting_error_converts_into_registry_error() {
        let err: RegistryError = SettingError::NotFound {
            identifier: "foo.bar".to_string(),
            setting_type: SettingType::String,
        }
        .into();
        assert!(matches!(
            err,
            RegistryError::Setting(SettingError::NotFound { .. })
        ));
        assert_eq!(err.to_string(), "no value for setting 'foo.bar' could be found");
    }

    #[test]
    fn test_construction_names_the_implementation() {
        struct Broken;
        let err = RegistryError::construction::<Broken>("socket closed");
        assert!(err.to_string().contains("Broken"));
        assert!(err.to_string().ends_with("socket closed"));
    }
}

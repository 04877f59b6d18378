use crate::binding::Injectable;
use crate::error::{RegistryError, SettingError};
use crate::registry::Settings;
use crate::settings::{
    check_identifier, coerce, default_or_not_found, SettingType, SettingValue, SettingsProvider,
};
use std::env;
use tracing::trace;

/// Reads settings from process environment variables.
///
/// An identifier maps to a variable name by upper-casing it and replacing every `.` with
/// `_`; dashes are kept, so `a.b-c` is read from `A_B-C`. A variable set to the empty string
/// counts as found.
///
/// This is the provider every [`Registry`](crate::Registry) binds to `settings_provider`
/// unless told otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentSettingsProvider;

impl EnvironmentSettingsProvider {
    pub fn new() -> Self {
        Self
    }

    /// The environment variable an identifier is read from.
    ///
    /// # Errors
    ///
    /// Returns `SettingError::InvalidIdentifier` if the identifier is malformed.
    pub fn variable_name(identifier: &str) -> Result<String, SettingError> {
        check_identifier(identifier)?;
        Ok(identifier.to_ascii_uppercase().replace('.', "_"))
    }
}

impl SettingsProvider for EnvironmentSettingsProvider {
    fn get_setting_value(
        &self,
        identifier: &str,
        setting_type: SettingType,
        default_value: Option<SettingValue>,
    ) -> Result<SettingValue, SettingError> {
        let variable = Self::variable_name(identifier)?;

        match env::var_os(&variable) {
            Some(raw) => {
                trace!(identifier, variable = %variable, "setting found in environment");
                let raw = raw.into_string().map_err(|raw| SettingError::ConversionFailure {
                    identifier: identifier.to_string(),
                    value: raw.to_string_lossy().into_owned(),
                    setting_type,
                })?;
                coerce(identifier, &raw, setting_type)
            }
            None => {
                trace!(identifier, variable = %variable, "setting not set in environment");
                default_or_not_found(identifier, setting_type, default_value)
            }
        }
    }
}

impl Injectable for EnvironmentSettingsProvider {
    fn inject(_settings: &Settings<'_>) -> Result<Self, RegistryError> {
        Ok(Self::new())
    }
}

impl From<EnvironmentSettingsProvider> for Box<dyn SettingsProvider> {
    fn from(provider: EnvironmentSettingsProvider) -> Self {
        Box::new(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_name_mapping() {
        assert_eq!(
            EnvironmentSettingsProvider::variable_name("foo.bar").unwrap(),
            "FOO_BAR"
        );
        assert_eq!(
            EnvironmentSettingsProvider::variable_name("a.b-c").unwrap(),
            "A_B-C"
        );
        assert_eq!(
            EnvironmentSettingsProvider::variable_name(".abc5").unwrap(),
            "_ABC5"
        );
    }

    #[test]
    fn test_invalid_identifier_is_rejected_before_lookup() {
        let provider = EnvironmentSettingsProvider::new();
        let result = provider.get_setting_value(
            "PATH/",
            SettingType::String,
            Some(SettingValue::String("fallback".into())),
        );
        assert_eq!(
            result,
            Err(SettingError::InvalidIdentifier {
                identifier: "PATH/".to_string()
            })
        );
    }
}

use crate::binding::Implementation;
use crate::error::SettingError;
use crate::settings::{
    check_identifier, coerce, default_or_not_found, SettingType, SettingValue, SettingsProvider,
};
use std::str::FromStr;
use std::sync::Arc;
use toml_edit::{DocumentMut, Item, TomlError, Value};
use tracing::trace;

/// Reads settings from a TOML document.
///
/// Each dot-separated segment of an identifier selects a table, so `server.http-port`
/// reads key `http-port` from table `[server]`. Native TOML integers, floats and booleans
/// convert directly; TOML strings are coerced the same way environment values are.
///
/// ```
/// use sovran_registry::{SettingType, SettingValue, SettingsProvider, TomlSettingsProvider};
///
/// let provider: TomlSettingsProvider = "[server]\nhttp-port = 8080".parse()?;
/// let port = provider.get_setting_value("server.http-port", SettingType::Integer, None)?;
/// assert_eq!(port, SettingValue::Integer(8080));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct TomlSettingsProvider {
    document: Arc<DocumentMut>,
}

impl TomlSettingsProvider {
    pub fn new(document: DocumentMut) -> Self {
        Self {
            document: Arc::new(document),
        }
    }

    /// An implementation binding that hands out this document on every resolution.
    pub fn into_implementation(self) -> Implementation<dyn SettingsProvider> {
        Implementation::from_fn(move |_| Ok(self.clone()))
    }

    fn lookup(&self, identifier: &str) -> Option<&Item> {
        identifier
            .split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(self.document.as_item(), |item, segment| item.get(segment))
    }
}

impl FromStr for TomlSettingsProvider {
    type Err = TomlError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(source.parse::<DocumentMut>()?))
    }
}

impl SettingsProvider for TomlSettingsProvider {
    fn get_setting_value(
        &self,
        identifier: &str,
        setting_type: SettingType,
        default_value: Option<SettingValue>,
    ) -> Result<SettingValue, SettingError> {
        check_identifier(identifier)?;

        let Some(item) = self.lookup(identifier).filter(|item| !item.is_none()) else {
            trace!(identifier, "setting not present in document");
            return default_or_not_found(identifier, setting_type, default_value);
        };
        trace!(identifier, "setting found in document");

        if let SettingType::Other(_) = setting_type {
            return Err(SettingError::UnsupportedType {
                identifier: identifier.to_string(),
                setting_type,
            });
        }

        let conversion_failure = || SettingError::ConversionFailure {
            identifier: identifier.to_string(),
            value: item.to_string().trim().to_string(),
            setting_type,
        };

        let value = item.as_value().ok_or_else(conversion_failure)?;
        match (value, setting_type) {
            (Value::String(raw), _) => coerce(identifier, raw.value(), setting_type),
            (Value::Integer(value), SettingType::Integer) => Ok(SettingValue::Integer(*value.value())),
            (Value::Integer(value), SettingType::Float) => {
                Ok(SettingValue::Float(*value.value() as f64))
            }
            (Value::Float(value), SettingType::Float) => Ok(SettingValue::Float(*value.value())),
            (Value::Boolean(value), SettingType::Boolean) => {
                Ok(SettingValue::Boolean(*value.value()))
            }
            (Value::Integer(value), SettingType::String) => {
                Ok(SettingValue::String(value.value().to_string()))
            }
            (Value::Float(value), SettingType::String) => {
                Ok(SettingValue::String(value.value().to_string()))
            }
            (Value::Boolean(value), SettingType::String) => {
                Ok(SettingValue::String(value.value().to_string()))
            }
            (Value::Datetime(value), SettingType::String) => {
                Ok(SettingValue::String(value.value().to_string()))
            }
            _ => Err(conversion_failure()),
        }
    }
}

impl From<TomlSettingsProvider> for Box<dyn SettingsProvider> {
    fn from(provider: TomlSettingsProvider) -> Self {
        Box::new(provider)
    }
}

use crate::error::SettingError;
use std::fmt;

/// The type a setting is requested as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingType {
    Integer,
    Float,
    Boolean,
    String,
    /// A type no built-in provider knows how to produce, named for error reporting
    Other(&'static str),
}

impl fmt::Display for SettingType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SettingType::Integer => write!(f, "integer"),
            SettingType::Float => write!(f, "float"),
            SettingType::Boolean => write!(f, "boolean"),
            SettingType::String => write!(f, "string"),
            SettingType::Other(name) => write!(f, "{}", name),
        }
    }
}

/// A setting value after coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
}

impl SettingValue {
    /// The type this value was coerced to.
    pub fn setting_type(&self) -> SettingType {
        match self {
            SettingValue::Integer(_) => SettingType::Integer,
            SettingValue::Float(_) => SettingType::Float,
            SettingValue::Boolean(_) => SettingType::Boolean,
            SettingValue::String(_) => SettingType::String,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SettingValue::Integer(value) => write!(f, "{}", value),
            SettingValue::Float(value) => write!(f, "{}", value),
            SettingValue::Boolean(value) => write!(f, "{}", value),
            SettingValue::String(value) => write!(f, "{}", value),
        }
    }
}

/// A Rust type that can be read from a settings provider.
///
/// Implemented for `String`, `bool`, the common integer types and both float types.
/// Integer types narrower than `i64` fail conversion when the value doesn't fit.
pub trait Setting: Sized {
    /// The type requested from the provider.
    const TYPE: SettingType;

    /// Converts a provider value, or `None` if it cannot be represented.
    fn from_value(value: SettingValue) -> Option<Self>;

    /// Converts a default into the provider's value space.
    ///
    /// Fails with the rendered default when it has no exact `SettingValue`.
    fn into_value(self) -> Result<SettingValue, String>;
}

impl Setting for String {
    const TYPE: SettingType = SettingType::String;

    fn from_value(value: SettingValue) -> Option<Self> {
        match value {
            SettingValue::String(value) => Some(value),
            _ => None,
        }
    }

    fn into_value(self) -> Result<SettingValue, String> {
        Ok(SettingValue::String(self))
    }
}

impl Setting for bool {
    const TYPE: SettingType = SettingType::Boolean;

    fn from_value(value: SettingValue) -> Option<Self> {
        match value {
            SettingValue::Boolean(value) => Some(value),
            _ => None,
        }
    }

    fn into_value(self) -> Result<SettingValue, String> {
        Ok(SettingValue::Boolean(self))
    }
}

impl Setting for f64 {
    const TYPE: SettingType = SettingType::Float;

    fn from_value(value: SettingValue) -> Option<Self> {
        match value {
            SettingValue::Float(value) => Some(value),
            _ => None,
        }
    }

    fn into_value(self) -> Result<SettingValue, String> {
        Ok(SettingValue::Float(self))
    }
}

impl Setting for f32 {
    const TYPE: SettingType = SettingType::Float;

    fn from_value(value: SettingValue) -> Option<Self> {
        match value {
            SettingValue::Float(value) => Some(value as f32),
            _ => None,
        }
    }

    fn into_value(self) -> Result<SettingValue, String> {
        Ok(SettingValue::Float(f64::from(self)))
    }
}

macro_rules! integer_setting {
    ($($ty:ty),*) => {
        $(
            impl Setting for $ty {
                const TYPE: SettingType = SettingType::Integer;

                fn from_value(value: SettingValue) -> Option<Self> {
                    match value {
                        SettingValue::Integer(value) => <$ty>::try_from(value).ok(),
                        _ => None,
                    }
                }

                fn into_value(self) -> Result<SettingValue, String> {
                    i64::try_from(self)
                        .map(SettingValue::Integer)
                        .map_err(|_| self.to_string())
                }
            }
        )*
    };
}

integer_setting!(i64, i32, u16, u32, u64, usize);

/// Where a value comes from, and what to fall back to when it's absent.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingDescriptor<T> {
    pub identifier: String,
    pub default_value: Option<T>,
}

impl<T: Setting> SettingDescriptor<T> {
    /// A setting with no default; lookup fails if the provider has no value.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            default_value: None,
        }
    }

    pub fn with_default(mut self, default_value: T) -> Self {
        self.default_value = Some(default_value);
        self
    }
}

/// Resolves named settings to typed values.
///
/// Implementations must validate the identifier with [`check_identifier`], look up a raw
/// value in their backing source, and then either coerce it to `setting_type` or fall back
/// to `default_value`:
///
/// - found, unsupported type → [`SettingError::UnsupportedType`]
/// - found, unconvertible → [`SettingError::ConversionFailure`]
/// - absent, no default → [`SettingError::NotFound`]
/// - absent, default given → the default, unchanged
pub trait SettingsProvider: Send + Sync {
    fn get_setting_value(
        &self,
        identifier: &str,
        setting_type: SettingType,
        default_value: Option<SettingValue>,
    ) -> Result<SettingValue, SettingError>;
}

/// Checks that `identifier` is non-empty and ASCII alphanumeric once `.` and `-` are removed.
///
/// # Examples
///
/// ```
/// use sovran_registry::check_identifier;
///
/// assert!(check_identifier("db.pool-size").is_ok());
/// assert!(check_identifier(".-").is_err());
/// assert!(check_identifier("a/b").is_err());
/// ```
pub fn check_identifier(identifier: &str) -> Result<(), SettingError> {
    let mut remaining = identifier.chars().filter(|c| *c != '.' && *c != '-').peekable();
    let valid = remaining.peek().is_some() && remaining.all(|c| c.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(SettingError::InvalidIdentifier {
            identifier: identifier.to_string(),
        })
    }
}

/// Coerces a raw string value to `setting_type`.
///
/// Booleans are `true` for any non-empty string, so `"False"` is `true` and only `""` is
/// `false`. Numbers are parsed in base 10 after trimming surrounding whitespace.
pub fn coerce(
    identifier: &str,
    raw: &str,
    setting_type: SettingType,
) -> Result<SettingValue, SettingError> {
    let conversion_failure = || SettingError::ConversionFailure {
        identifier: identifier.to_string(),
        value: raw.to_string(),
        setting_type,
    };

    match setting_type {
        SettingType::Integer => raw
            .trim()
            .parse::<i64>()
            .map(SettingValue::Integer)
            .map_err(|_| conversion_failure()),
        SettingType::Float => raw
            .trim()
            .parse::<f64>()
            .map(SettingValue::Float)
            .map_err(|_| conversion_failure()),
        SettingType::Boolean => Ok(SettingValue::Boolean(!raw.is_empty())),
        SettingType::String => Ok(SettingValue::String(raw.to_string())),
        SettingType::Other(_) => Err(SettingError::UnsupportedType {
            identifier: identifier.to_string(),
            setting_type,
        }),
    }
}

/// Falls back to `default_value` for a setting the provider has no value for.
pub(crate) fn default_or_not_found(
    identifier: &str,
    setting_type: SettingType,
    default_value: Option<SettingValue>,
) -> Result<SettingValue, SettingError> {
    default_value.ok_or_else(|| SettingError::NotFound {
        identifier: identifier.to_string(),
        setting_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        for identifier in ["a", "abc", ".abc5", "A.B.", "A.B.C.5", "A.C", "AB", "A-B"] {
            assert!(
                check_identifier(identifier).is_ok(),
                "{} should be valid",
                identifier
            );
        }
    }

    #[test]
    fn test_invalid_identifiers() {
        for identifier in ["", ".", "-", ".-.", "A/", "B.C%", "a b", "a_b", "é"] {
            match check_identifier(identifier) {
                Err(SettingError::InvalidIdentifier { identifier: reported }) => {
                    assert_eq!(reported, identifier)
                }
                other => panic!("{:?} should be rejected, got {:?}", identifier, other),
            }
        }
    }

    #[test]
    fn test_coerce_supported_types() {
        assert_eq!(
            coerce("foo", "5", SettingType::Integer),
            Ok(SettingValue::Integer(5))
        );
        assert_eq!(
            coerce("foo", "-12", SettingType::Integer),
            Ok(SettingValue::Integer(-12))
        );
        assert_eq!(
            coerce("foo", "some string", SettingType::String),
            Ok(SettingValue::String("some string".to_string()))
        );
        assert_eq!(
            coerce("foo", "1.9", SettingType::Float),
            Ok(SettingValue::Float(1.9))
        );
        assert_eq!(
            coerce("foo", "10", SettingType::Float),
            Ok(SettingValue::Float(10.0))
        );
    }

    #[test]
    fn test_coerce_boolean_is_non_empty() {
        assert_eq!(
            coerce("foo", "some string", SettingType::Boolean),
            Ok(SettingValue::Boolean(true))
        );
        assert_eq!(
            coerce("foo", "False", SettingType::Boolean),
            Ok(SettingValue::Boolean(true))
        );
        assert_eq!(
            coerce("foo", "0", SettingType::Boolean),
            Ok(SettingValue::Boolean(true))
        );
        assert_eq!(
            coerce("foo", "", SettingType::Boolean),
            Ok(SettingValue::Boolean(false))
        );
    }

    #[test]
    fn test_coerce_failures() {
        for (raw, setting_type) in [
            ("True", SettingType::Integer),
            ("1.0", SettingType::Integer),
            ("some string", SettingType::Float),
            ("", SettingType::Integer),
        ] {
            match coerce("foo", raw, setting_type) {
                Err(SettingError::ConversionFailure {
                    identifier,
                    value,
                    setting_type: reported,
                }) => {
                    assert_eq!(identifier, "foo");
                    assert_eq!(value, raw);
                    assert_eq!(reported, setting_type);
                }
                other => panic!("expected conversion failure, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_coerce_unsupported_type() {
        let result = coerce("foo", "5", SettingType::Other("Endpoint"));
        assert_eq!(
            result,
            Err(SettingError::UnsupportedType {
                identifier: "foo".to_string(),
                setting_type: SettingType::Other("Endpoint"),
            })
        );
    }

    #[test]
    fn test_narrowing_integer_settings() {
        assert_eq!(u16::from_value(SettingValue::Integer(8080)), Some(8080));
        assert_eq!(u16::from_value(SettingValue::Integer(70_000)), None);
        assert_eq!(u32::from_value(SettingValue::Integer(-1)), None);
        assert_eq!(i64::from_value(SettingValue::String("5".into())), None);
        assert_eq!(5usize.into_value(), Ok(SettingValue::Integer(5)));
        assert_eq!(u64::MAX.into_value(), Err(u64::MAX.to_string()));
        assert_eq!(
            true.into_value().map(|value| value.setting_type()),
            Ok(SettingType::Boolean)
        );
    }

    #[test]
    fn test_descriptor_builder() {
        let descriptor = SettingDescriptor::new("server.port").with_default(8080u16);
        assert_eq!(descriptor.identifier, "server.port");
        assert_eq!(descriptor.default_value, Some(8080));
    }
}

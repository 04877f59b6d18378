use std::any::{type_name, Any};

/// A plain attribute value stored alongside the registry's interface slots.
#[derive(Debug)]
pub(crate) struct AnyValue {
    type_name: &'static str,
    value: Box<dyn Any + Send + Sync>,
}

impl AnyValue {
    pub(crate) fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: type_name::<T>(),
            value: Box::new(value),
        }
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Get a reference to the contained value if it is of type T
    pub(crate) fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downcast() {
        let value = AnyValue::new(5i32);
        assert_eq!(value.downcast_ref::<i32>(), Some(&5));
        assert!(value.downcast_ref::<i64>().is_none());
        assert_eq!(value.type_name(), "i32");
    }
}

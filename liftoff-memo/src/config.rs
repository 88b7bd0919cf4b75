use liftoff_core::HarnessError;
use serde_json::Value;
use std::sync::OnceLock;

/// The caller's config, set once by `init`.
#[derive(Debug, Default)]
pub struct ConfigCell {
    value: OnceLock<Value>,
}

impl ConfigCell {
    /// Create an uninitialized cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `config` if no config was stored yet.
    ///
    /// Returns `false` when the cell already held a config; the argument is
    /// dropped in that case.
    pub fn init(&self, config: Value) -> bool {
        self.value.set(config).is_ok()
    }

    /// The stored config, or [`HarnessError::NotInitialized`].
    pub fn get(&self) -> Result<&Value, HarnessError> {
        self.value.get().ok_or(HarnessError::NotInitialized)
    }

    /// Whether `init` has run.
    pub fn is_initialized(&self) -> bool {
        self.value.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_before_init() {
        let cell = ConfigCell::new();
        assert_eq!(cell.get(), Err(HarnessError::NotInitialized));
        assert!(!cell.is_initialized());
    }

    #[test]
    fn first_init_wins() {
        let cell = ConfigCell::new();
        assert!(cell.init(json!({"settings": 1})));
        assert!(!cell.init(json!({"settings": 2})));
        assert_eq!(cell.get().unwrap(), &json!({"settings": 1}));
    }
}

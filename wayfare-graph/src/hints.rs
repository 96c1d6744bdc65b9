use std::collections::HashMap;
use std::sync::Arc;

/// A single hint value.
#[derive(Debug, Clone, PartialEq)]
pub enum HintValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

/// An immutable, string-keyed bag of per-request hints.
///
/// Hosts put request flags in here (`avoid_eds_roads`, `car_type_id`, ...)
/// and read back routing-algorithm hints the binder sets (`ch.disable`,
/// `alternative_route.max_paths`, ...).
///
/// The bag is never mutated in place: the `with_*` methods return a new bag
/// sharing nothing with the original. This keeps a request's hints stable
/// for its whole lifetime even while a binder derives a new request from it.
#[derive(Debug, Clone, Default)]
pub struct RequestHints {
    values: Arc<HashMap<String, HintValue>>,
}

impl RequestHints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the boolean under `key`, or `default` if absent or of a
    /// different type.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(HintValue::Bool(value)) => *value,
            _ => default,
        }
    }

    /// Returns the integer under `key`, or `default` if absent or of a
    /// different type.
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.values.get(key) {
            Some(HintValue::Int(value)) => *value,
            _ => default,
        }
    }

    /// Returns the float under `key`, or `default` if absent.
    ///
    /// Integers are widened; any other type falls back to `default`.
    pub fn get_float(&self, key: &str, default: f64) -> f64 {
        match self.values.get(key) {
            Some(HintValue::Float(value)) => *value,
            #[allow(clippy::cast_precision_loss)]
            Some(HintValue::Int(value)) => *value as f64,
            _ => default,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    #[must_use]
    pub fn with_bool(&self, key: &str, value: bool) -> Self {
        self.with(key, HintValue::Bool(value))
    }

    #[must_use]
    pub fn with_int(&self, key: &str, value: i64) -> Self {
        self.with(key, HintValue::Int(value))
    }

    #[must_use]
    pub fn with_float(&self, key: &str, value: f64) -> Self {
        self.with(key, HintValue::Float(value))
    }

    fn with(&self, key: &str, value: HintValue) -> Self {
        let mut values: HashMap<String, HintValue> = (*self.values).clone();
        values.insert(key.to_owned(), value);
        Self {
            values: Arc::new(values),
        }
    }
}

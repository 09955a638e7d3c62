//! Request-scoped, layered key/value context.

use screenkit_types::{Locale, Value, ValueMap};

/// Reserved context keys
pub mod keys {
    /// Ordered list of ancestor widget names for the widget being rendered
    pub const WIDGET_TRAIL: &str = "_WIDGETTRAIL_";
    pub const LOCALE: &str = "locale";
    pub const TIME_ZONE: &str = "timeZone";
    /// Logical name of the global map; see [`super::Context::global`]
    pub const GLOBAL_CONTEXT: &str = "globalContext";
    /// Legacy page map mirrored by set actions
    pub const PAGE: &str = "page";
    pub const PARAMETERS: &str = "parameters";
}

/// Anything a field path can be resolved against: a context or a plain map.
pub trait FieldStore {
    fn lookup(&self, key: &str) -> Option<&Value>;
    fn lookup_mut(&mut self, key: &str) -> Option<&mut Value>;
    fn store(&mut self, key: String, value: Value);
}

impl FieldStore for ValueMap {
    fn lookup(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }

    fn lookup_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.get_mut(key)
    }

    fn store(&mut self, key: String, value: Value) {
        self.insert(key, value);
    }
}

/// A stack of request layers over an optional, separate global map.
///
/// Reads search the layers top-down, then the global map. Plain writes go to
/// the top layer. The global map is only written when explicitly addressed
/// through [`Context::global_mut`].
#[derive(Debug, Clone)]
pub struct Context {
    layers: Vec<ValueMap>,
    global: Option<ValueMap>,
}

impl Context {
    /// A context without a global map
    pub fn new() -> Self {
        Self {
            layers: vec![ValueMap::new()],
            global: None,
        }
    }

    /// A context with an empty global map under the request layers
    pub fn with_global() -> Self {
        Self {
            layers: vec![ValueMap::new()],
            global: Some(ValueMap::new()),
        }
    }

    pub fn from_map(map: ValueMap) -> Self {
        Self {
            layers: vec![map],
            global: None,
        }
    }

    /// Push a fresh layer; writes land there until it is popped.
    pub fn push(&mut self) {
        self.layers.push(ValueMap::new());
    }

    /// Pop the top layer. The base layer is never removed.
    pub fn pop(&mut self) -> Option<ValueMap> {
        if self.layers.len() > 1 {
            self.layers.pop()
        } else {
            None
        }
    }

    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| layer.get(key))
            .or_else(|| self.global.as_ref().and_then(|g| g.get(key)))
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        if let Some(idx) = self.layers.iter().rposition(|l| l.contains_key(key)) {
            return self.layers[idx].get_mut(key);
        }
        self.global.as_mut().and_then(|g| g.get_mut(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.top_mut().insert(key.into(), value.into());
    }

    /// Remove a key from the top layer only
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.top_mut().remove(key)
    }

    /// Copy every entry of `map` into the top layer
    pub fn extend(&mut self, map: ValueMap) {
        self.top_mut().extend(map);
    }

    /// The top (writable) layer
    pub fn local(&self) -> &ValueMap {
        // layers is never empty
        &self.layers[self.layers.len() - 1]
    }

    pub fn has_global(&self) -> bool {
        self.global.is_some()
    }

    pub fn global(&self) -> Option<&ValueMap> {
        self.global.as_ref()
    }

    pub fn global_mut(&mut self) -> Option<&mut ValueMap> {
        self.global.as_mut()
    }

    /// All visible entries in one map: global first, then layers bottom-up,
    /// so the entry a read would see wins.
    pub fn flatten(&self) -> ValueMap {
        let mut out = self.global.clone().unwrap_or_default();
        for layer in &self.layers {
            out.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        out
    }

    pub fn widget_trail(&self) -> Vec<String> {
        match self.get(keys::WIDGET_TRAIL) {
            Some(Value::List(items)) => items.iter().map(|v| v.to_string()).collect(),
            _ => Vec::new(),
        }
    }

    pub fn set_widget_trail<I, S>(&mut self, trail: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = trail
            .into_iter()
            .map(|s| Value::String(s.into()))
            .collect::<Vec<_>>();
        self.insert(keys::WIDGET_TRAIL, Value::List(items));
    }

    pub fn locale(&self) -> Option<Locale> {
        self.get(keys::LOCALE)
            .and_then(Value::as_str)
            .and_then(Locale::parse)
    }

    pub fn set_locale(&mut self, locale: &Locale) {
        self.insert(keys::LOCALE, locale.tag());
    }

    pub fn time_zone(&self) -> Option<&str> {
        self.get(keys::TIME_ZONE).and_then(Value::as_str)
    }

    fn top_mut(&mut self) -> &mut ValueMap {
        let idx = self.layers.len() - 1;
        &mut self.layers[idx]
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldStore for Context {
    fn lookup(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }

    fn lookup_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.get_mut(key)
    }

    fn store(&mut self, key: String, value: Value) {
        self.top_mut().insert(key, value);
    }
}

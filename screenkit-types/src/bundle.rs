use crate::locale::Locale;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// One loaded resource bundle: the resolved messages of a resource for a locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBundle {
    resource: String,
    locale: Option<Locale>,
    entries: HashMap<String, String>,
}

impl ResourceBundle {
    pub fn new(
        resource: impl Into<String>,
        locale: Option<Locale>,
        entries: HashMap<String, String>,
    ) -> Self {
        Self {
            resource: resource.into(),
            locale,
            entries,
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn locale(&self) -> Option<&Locale> {
        self.locale.as_ref()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A shared, layered view over several resource bundles.
///
/// Lookups search the layers top to bottom, so earlier bundles win on key
/// collisions. Cloning a `BundleMap` clones the handle: both clones see
/// layers added through either one, and [`BundleMap::same_as`] compares
/// handle identity rather than contents.
#[derive(Clone)]
pub struct BundleMap {
    layers: Arc<RwLock<Vec<Arc<ResourceBundle>>>>,
}

impl BundleMap {
    pub fn new(top: Arc<ResourceBundle>) -> Self {
        Self {
            layers: Arc::new(RwLock::new(vec![top])),
        }
    }

    /// Append a bundle as the lowest-priority layer.
    ///
    /// Returns `false` without changing anything when a layer for the same
    /// resource and locale is already present.
    pub fn add_bottom(&self, bundle: Arc<ResourceBundle>) -> bool {
        let mut layers = self.layers.write();
        let present = layers
            .iter()
            .any(|l| l.resource() == bundle.resource() && l.locale() == bundle.locale());
        if present {
            return false;
        }
        layers.push(bundle);
        true
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.layers
            .read()
            .iter()
            .find_map(|layer| layer.get(key).map(str::to_string))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.layers.read().iter().any(|l| l.contains_key(key))
    }

    /// Resource names in lookup order
    pub fn resources(&self) -> Vec<String> {
        self.layers
            .read()
            .iter()
            .map(|l| l.resource().to_string())
            .collect()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.read().len()
    }

    /// Whether both handles point at the same underlying layer stack
    pub fn same_as(&self, other: &BundleMap) -> bool {
        Arc::ptr_eq(&self.layers, &other.layers)
    }

    /// Collapse the layers into one map, upper layers winning.
    pub fn flatten(&self) -> HashMap<String, String> {
        let mut out = HashMap::new();
        for layer in self.layers.read().iter().rev() {
            for (k, v) in &layer.entries {
                out.insert(k.clone(), v.clone());
            }
        }
        out
    }
}

impl PartialEq for BundleMap {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl fmt::Debug for BundleMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleMap")
            .field("resources", &self.resources())
            .finish()
    }
}

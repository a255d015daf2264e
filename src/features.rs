//! The feature index the map layer exposes: features keyed by region id, each
//! carrying a bag of named properties. Geometry is never read here.

use ahash::AHashMap;
use anyhow::{Result, anyhow, bail};
use serde_json::{Map, Number, Value};

/// Property the loader writes the active statistic into.
pub const STAT_PROPERTY: &str = "stat_variable";

/// Property names consulted (in order) for a human-readable feature label.
const DISPLAY_NAME_PROPERTIES: [&str; 2] = ["NAME", "name"];

/// Read/write access to features supplied by the map layer.
pub trait FeatureStore {
    fn contains(&self, id: &str) -> bool;

    fn property(&self, id: &str, name: &str) -> Option<&Value>;

    /// Returns `false` when no feature has this id.
    fn set_property(&mut self, id: &str, name: &str, value: Value) -> bool;

    fn remove_property(&mut self, id: &str, name: &str) -> Option<Value>;

    /// All feature ids, in a stable order.
    fn ids(&self) -> Vec<String>;

    /// Current statistic of a feature; `None` when unset or not a finite number.
    fn stat_value(&self, id: &str) -> Option<f64> {
        self.property(id, STAT_PROPERTY).and_then(Value::as_f64)
    }

    /// Store a statistic. NaN has no JSON representation and is stored as null,
    /// which reads back as "no value".
    fn set_stat_value(&mut self, id: &str, value: f64) -> bool {
        let v = Number::from_f64(value).map_or(Value::Null, Value::Number);
        self.set_property(id, STAT_PROPERTY, v)
    }

    fn display_name(&self, id: &str) -> String {
        DISPLAY_NAME_PROPERTIES
            .iter()
            .find_map(|p| self.property(id, p).and_then(Value::as_str))
            .unwrap_or(id)
            .to_string()
    }
}

/// In-memory feature index, typically built from GeoJSON feature collections.
#[derive(Debug, Clone, Default)]
pub struct MemoryFeatureStore {
    features: AHashMap<String, Map<String, Value>>,
    order: Vec<String>,
}

impl MemoryFeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from one `FeatureCollection`, indexing by `id_property`.
    pub fn from_geojson(doc: &Value, id_property: &str) -> Result<Self> {
        let mut store = Self::new();
        store.add_geojson(doc, id_property)?;
        Ok(store)
    }

    /// Index the features of a `FeatureCollection` by the given property.
    ///
    /// Falls back to the feature's top-level `id` when the property is
    /// missing. Duplicate ids keep the first feature. Returns how many
    /// features were added.
    pub fn add_geojson(&mut self, doc: &Value, id_property: &str) -> Result<usize> {
        if doc.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
            bail!("expected a GeoJSON FeatureCollection");
        }
        let features = doc
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("FeatureCollection has no features array"))?;

        let mut added = 0usize;
        for feature in features {
            let props = feature
                .get("properties")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            let id = props
                .get(id_property)
                .or_else(|| feature.get("id"))
                .and_then(id_text);
            let Some(id) = id else {
                log::debug!("feature without {:?} property skipped", id_property);
                continue;
            };
            if self.insert(id, props) {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Add a feature. Returns `false` (and keeps the existing one) on a duplicate id.
    pub fn insert(&mut self, id: impl Into<String>, properties: Map<String, Value>) -> bool {
        let id = id.into();
        if self.features.contains_key(&id) {
            log::warn!("duplicate feature id {:?}, keeping the first", id);
            return false;
        }
        self.order.push(id.clone());
        self.features.insert(id, properties);
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn id_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl FeatureStore for MemoryFeatureStore {
    fn contains(&self, id: &str) -> bool {
        self.features.contains_key(id)
    }

    fn property(&self, id: &str, name: &str) -> Option<&Value> {
        self.features.get(id)?.get(name)
    }

    fn set_property(&mut self, id: &str, name: &str, value: Value) -> bool {
        match self.features.get_mut(id) {
            Some(props) => {
                props.insert(name.to_string(), value);
                true
            }
            None => false,
        }
    }

    fn remove_property(&mut self, id: &str, name: &str) -> Option<Value> {
        self.features.get_mut(id)?.remove(name)
    }

    fn ids(&self) -> Vec<String> {
        self.order.clone()
    }
}

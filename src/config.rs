use crate::error::ChoroplethError;
use crate::region::RegionAliases;
use crate::style::ColorScale;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A GeoJSON layer and the property its features are indexed by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub source: String,
    pub id_property: String,
}

impl LayerConfig {
    pub fn new(source: impl Into<String>, id_property: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            id_property: id_property.into(),
        }
    }
}

/// World countries, US states, and Chinese provinces.
pub fn default_layers() -> Vec<LayerConfig> {
    vec![
        LayerConfig::new(
            "https://raw.githubusercontent.com/johan/world.geo.json/master/countries.geo.json",
            "name",
        ),
        LayerConfig::new(
            "https://storage.googleapis.com/mapsdevsite/json/states.js",
            "NAME",
        ),
        LayerConfig::new(
            "https://raw.githubusercontent.com/d3cn/data/master/json/geo/china/china-province.geojson",
            "NAME",
        ),
    ]
}

/// Settings for one map deployment. Every field has a default, so a config
/// file only needs the keys it changes.
///
/// ```json
/// { "scale": { "mode": "logarithmic", "opacity": "scaled" }, "locale": "de" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub scale: ColorScale,
    pub locale: String,
    pub layers: Vec<LayerConfig>,
    pub region_aliases: RegionAliases,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            scale: ColorScale::default(),
            locale: "en".to_string(),
            layers: default_layers(),
            region_aliases: RegionAliases::default(),
        }
    }
}

impl MapConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let cfg: MapConfig = serde_json::from_str(text).context("parse map config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("load config {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), ChoroplethError> {
        self.scale.validate()?;
        if let Some(l) = self.layers.iter().find(|l| l.id_property.trim().is_empty()) {
            return Err(ChoroplethError::Config(format!(
                "layer {} has an empty id_property",
                l.source
            )));
        }
        Ok(())
    }
}

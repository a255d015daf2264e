//! choropleth_rs
//!
//! Map regional statistics onto choropleth styles. Pairs with the `choro` CLI.
//!
//! ### Features
//! - Normalize `(locality, country)` pairs into the region keys a map layer indexes by
//! - Track the running min/max of the loaded variable
//! - Linear or logarithmic HSL color ramps, hover-aware outlines
//! - Load JSON statistics tables from HTTP or disk, with stale-load protection
//!
//! ### Example
//! ```no_run
//! use choropleth_rs::{Client, ColorScale, HoverState, MemoryFeatureStore, StatDataLoader};
//! use choropleth_rs::features::FeatureStore;
//!
//! let client = Client::new()?;
//! let layer = client.fetch_json("countries.geo.json")?;
//! let mut store = MemoryFeatureStore::from_geojson(&layer, "name")?;
//!
//! let mut loader = StatDataLoader::default();
//! let outcome = loader.load(&client, "cases.json", &mut store)?;
//! println!("min={} max={}", outcome.min(), outcome.max());
//!
//! let scale = ColorScale::default();
//! let style = scale.style(store.stat_value("France"), loader.range(), HoverState::Normal);
//! println!("{}", style.fill_color);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod api;
pub mod config;
pub mod display;
pub mod error;
pub mod features;
pub mod loader;
pub mod models;
pub mod region;
pub mod stats;
pub mod style;

pub use api::Client;
pub use error::ChoroplethError;
pub use features::MemoryFeatureStore;
pub use loader::StatDataLoader;
pub use models::{RegionKey, StatRow};
pub use region::RegionKeyResolver;
pub use stats::StatRange;
pub use style::{ColorScale, HoverState, StyleDescriptor};

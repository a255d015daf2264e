// Live tests (opt-in): cargo test --features online
#![cfg(feature = "online")]

use choropleth_rs::Client;
use choropleth_rs::config::default_layers;
use choropleth_rs::features::{FeatureStore, MemoryFeatureStore};

#[test]
fn default_country_layer_indexes_by_name() {
    let client = Client::new().unwrap();
    let countries = &default_layers()[0];
    let doc = client.fetch_json(&countries.source).unwrap();
    let store = MemoryFeatureStore::from_geojson(&doc, &countries.id_property).unwrap();
    assert!(store.len() > 100);
    assert!(store.contains("France"));
    assert!(store.contains("United Kingdom"));
}

#[test]
fn default_state_layer_uses_full_names() {
    let client = Client::new().unwrap();
    let states = &default_layers()[1];
    let doc = client.fetch_json(&states.source).unwrap();
    let store = MemoryFeatureStore::from_geojson(&doc, &states.id_property).unwrap();
    assert!(store.contains("California"));
    assert!(store.contains("Washington"));
}

#[test]
fn default_province_layer_uses_chinese_names() {
    let client = Client::new().unwrap();
    let provinces = &default_layers()[2];
    let doc = client.fetch_json(&provinces.source).unwrap();
    let store = MemoryFeatureStore::from_geojson(&doc, &provinces.id_property).unwrap();
    assert!(store.contains("福建"));
}

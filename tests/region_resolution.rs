use choropleth_rs::error::ChoroplethError;
use choropleth_rs::features::MemoryFeatureStore;
use choropleth_rs::region::{CHINA_PROVINCES, NORTH_AMERICAN_SUBDIVISIONS, RegionKeyResolver};
use serde_json::Map;

fn store(ids: &[&str]) -> MemoryFeatureStore {
    let mut s = MemoryFeatureStore::new();
    for id in ids {
        s.insert(*id, Map::new());
    }
    s
}

#[test]
fn documented_examples() {
    let r = RegionKeyResolver::default();
    let s = store(&["福建", "California", "United Kingdom"]);
    assert_eq!(r.resolve("Fujian", "Mainland China", &s).unwrap().as_str(), "福建");
    assert_eq!(r.resolve("X, CA", "", &s).unwrap().as_str(), "California");
    assert_eq!(r.resolve("London", "UK", &s).unwrap().as_str(), "United Kingdom");
    assert_eq!(
        r.resolve("Y, ZZ", "", &s),
        Err(ChoroplethError::UnresolvedRegion {
            locality: "Y, ZZ".into(),
            country: "".into()
        })
    );
}

#[test]
fn every_table_entry_resolves_when_present() {
    let r = RegionKeyResolver::default();
    let ids: Vec<&str> = CHINA_PROVINCES
        .iter()
        .map(|(_, zh)| *zh)
        .chain(NORTH_AMERICAN_SUBDIVISIONS.iter().map(|(_, full)| *full))
        .collect();
    let s = store(&ids);
    for (en, zh) in CHINA_PROVINCES {
        assert_eq!(r.resolve(en, "Mainland China", &s).unwrap().as_str(), *zh);
    }
    for (abbrev, full) in NORTH_AMERICAN_SUBDIVISIONS {
        let locality = format!("Some City, {abbrev}");
        assert_eq!(r.resolve(&locality, "", &s).unwrap().as_str(), *full);
    }
}

#[test]
fn primary_wins_over_fallback() {
    let r = RegionKeyResolver::default();
    let s = store(&["London", "United Kingdom"]);
    assert_eq!(r.resolve("London", "UK", &s).unwrap().as_str(), "London");
}

#[test]
fn china_rows_do_not_fall_back_for_unknown_provinces() {
    let r = RegionKeyResolver::default();
    let s = store(&["Mainland China"]);
    assert!(r.resolve("Unknown Province", "Mainland China", &s).is_err());
    // A known province missing from the layer falls back to the country feature.
    assert_eq!(
        r.resolve("Fujian", "Mainland China", &s).unwrap().as_str(),
        "Mainland China"
    );
}

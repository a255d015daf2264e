use choropleth_rs::features::{FeatureStore, MemoryFeatureStore};
use choropleth_rs::stats::StatRange;
use choropleth_rs::style::{ColorScale, Hsl, HoverState, OpacityMode, ScaleMode};
use serde_json::Map;

#[test]
fn reference_gradient_midpoint() {
    let scale = ColorScale::new(ScaleMode::Linear)
        .with_endpoints(Hsl::new(5.0, 69.0, 54.0), Hsl::new(151.0, 83.0, 34.0));
    let range = StatRange::from_bounds(0.0, 100.0);
    assert_eq!(scale.position(50.0, &range), Ok(0.5));
    let style = scale.style(Some(50.0), &range, HoverState::Normal);
    assert!(style.fill_color.starts_with("hsl(78, "));
    assert_eq!(style.fill, Hsl::new(78.0, 76.0, 44.0));
}

#[test]
fn endpoints_map_to_low_and_high_colors() {
    let scale = ColorScale::default();
    let range = StatRange::from_bounds(10.0, 20.0);
    let low = scale.style(Some(10.0), &range, HoverState::Normal);
    let high = scale.style(Some(20.0), &range, HoverState::Normal);
    assert_eq!(low.fill, scale.low);
    assert_eq!(high.fill, scale.high);
}

#[test]
fn custom_endpoints_may_run_hue_backwards() {
    let scale = ColorScale::default()
        .with_endpoints(Hsl::new(300.0, 50.0, 50.0), Hsl::new(200.0, 50.0, 50.0));
    let range = StatRange::from_bounds(0.0, 4.0);
    let s = scale.style(Some(1.0), &range, HoverState::Normal);
    assert_eq!(s.fill_color, "hsl(275, 50%, 50%)");
}

#[test]
fn log_mode_spreads_skewed_data() {
    let range = StatRange::from_bounds(1.0, 1000.0);
    let linear = ColorScale::new(ScaleMode::Linear);
    let log = ColorScale::new(ScaleMode::Logarithmic);
    let lt = linear.position(10.0, &range).unwrap();
    let gt = log.position(10.0, &range).unwrap();
    assert!(lt < 0.01);
    assert!((gt - 1.0 / 3.0).abs() < 1e-9);
}

#[test]
fn scaled_opacity_tracks_position() {
    let scale = ColorScale::new(ScaleMode::Linear).with_opacity(OpacityMode::Scaled);
    let range = StatRange::from_bounds(0.0, 10.0);
    let lo = scale.style(Some(0.0), &range, HoverState::Normal);
    let hi = scale.style(Some(10.0), &range, HoverState::Normal);
    assert!((lo.fill_opacity - 0.4).abs() < 1e-12);
    assert!((hi.fill_opacity - 0.9).abs() < 1e-12);
}

#[test]
fn features_without_values_stay_hidden() {
    let mut store = MemoryFeatureStore::new();
    store.insert("Texas", Map::new());
    store.insert("Ohio", Map::new());
    store.set_stat_value("Ohio", 3.0);

    let scale = ColorScale::default();
    let range = StatRange::from_bounds(1.0, 5.0);
    for hover in [HoverState::Normal, HoverState::Hovered] {
        assert!(!scale.style(store.stat_value("Texas"), &range, hover).visible);
        assert!(scale.style(store.stat_value("Ohio"), &range, hover).visible);
    }
}

#[test]
fn style_serializes_with_map_layer_field_names() {
    let scale = ColorScale::default();
    let s = scale.style(Some(1.0), &StatRange::from_bounds(0.0, 2.0), HoverState::Hovered);
    let v = serde_json::to_value(&s).unwrap();
    assert_eq!(v["stroke_color"], "#fff");
    assert_eq!(v["z_index"], 2);
    assert_eq!(v["visible"], true);
    assert!(v.get("fill").is_none());
}

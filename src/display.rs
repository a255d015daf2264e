//! Text for the legend and the hover readout: locale-aware number formatting,
//! the current min/max, and the caret position of a hovered region.

use crate::features::FeatureStore;
use crate::stats::StatRange;
use num_format::{Locale, ToFormattedString};
use serde::{Deserialize, Serialize};

/// Fraction digits kept when formatting values (trailing zeros are trimmed).
const MAX_FRACTION_DIGITS: i32 = 3;

/// Map a user-provided locale tag to a `num_format::Locale`.
///
/// Supported tags (case-insensitive): `en`, `us`, `en_US`, `de`, `de_DE`, `german`,
/// `fr`, `es`, `it`, `pt`, `nl`. Defaults to English.
pub fn map_locale(tag: &str) -> &'static Locale {
    match tag.to_lowercase().as_str() {
        "de" | "de_de" | "german" => &Locale::de,
        "fr" | "fr_fr" => &Locale::fr,
        "es" | "es_es" => &Locale::es,
        "it" | "it_it" => &Locale::it,
        "pt" | "pt_pt" | "pt_br" => &Locale::pt,
        "nl" | "nl_nl" => &Locale::nl,
        _ => &Locale::en, // default
    }
}

/// Format with grouping separators and at most three fraction digits,
/// e.g. `1234567.8912` -> `1,234,567.891` (en) or `1.234.567,891` (de).
/// Magnitudes past `u128::MAX` fall back to scientific notation.
pub fn format_value(value: f64, locale: &Locale) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "∞" } else { "-∞" }.to_string();
    }
    if value.abs() >= u128::MAX as f64 {
        return format!("{value:e}");
    }

    let scale = 10f64.powi(MAX_FRACTION_DIGITS);
    let rounded = (value * scale).round() / scale;
    let abs = rounded.abs();
    let int = abs.trunc();
    let frac = ((abs - int) * scale).round() as u32;

    let mut out = String::new();
    if rounded < 0.0 {
        out.push_str(locale.minus_sign());
    }
    out.push_str(&(int as u128).to_formatted_string(locale));
    if frac > 0 {
        let digits = format!("{:0width$}", frac, width = MAX_FRACTION_DIGITS as usize);
        out.push_str(locale.decimal());
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}

/// Min/max labels shown beside the color ramp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub min: f64,
    pub max: f64,
    pub min_text: String,
    pub max_text: String,
}

impl Legend {
    /// `None` until at least one value has been observed.
    pub fn from_range(range: &StatRange, locale: &Locale) -> Option<Self> {
        let (min, max) = range.bounds()?;
        Some(Self {
            min,
            max,
            min_text: format_value(min, locale),
            max_text: format_value(max, locale),
        })
    }
}

/// What the data box shows while a region is hovered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoverReadout {
    pub id: String,
    pub name: String,
    pub value: f64,
    pub value_text: String,
    /// Caret offset along the legend, `(value - min) / (max - min) * 100`.
    pub offset_percent: f64,
}

impl HoverReadout {
    /// Readout for a feature, or `None` when it has no value.
    pub fn for_feature<S: FeatureStore + ?Sized>(
        store: &S,
        id: &str,
        range: &StatRange,
        locale: &Locale,
    ) -> Option<Self> {
        let value = store.stat_value(id)?;
        // A single observed value sits at the top of the ramp, like its fill.
        let offset_percent = range.position(value).map_or(100.0, |p| p * 100.0);
        Some(Self {
            id: id.to_string(),
            name: store.display_name(id),
            value,
            value_text: format_value(value, locale),
            offset_percent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::MemoryFeatureStore;
    use serde_json::{Map, json};

    #[test]
    fn formats_like_locale_strings() {
        let locale = map_locale("en");
        assert_eq!(format_value(1234567.0, locale), "1,234,567");
        assert_eq!(format_value(1234567.8912, locale), "1,234,567.891");
        assert_eq!(format_value(0.5, locale), "0.5");
        assert_eq!(format_value(-42.25, locale), "-42.25");
        assert_eq!(format_value(2.0004, locale), "2");
        let german = map_locale("DE_de");
        assert_eq!(format_value(1234567.5, german), "1.234.567,5");
    }

    #[test]
    fn huge_values_use_scientific_notation() {
        let locale = map_locale("en");
        assert_eq!(format_value(1e39, locale), "1e39");
        assert_eq!(format_value(-2.5e300, locale), "-2.5e300");
        assert_eq!(format_value(f64::MAX, locale), format!("{:e}", f64::MAX));
        // Below the cutoff the grouped form is kept.
        assert_eq!(format_value(1e15, locale), "1,000,000,000,000,000");
    }

    #[test]
    fn legend_waits_for_data() {
        let locale = map_locale("en");
        assert!(Legend::from_range(&StatRange::new(), locale).is_none());
        let l = Legend::from_range(&StatRange::from_bounds(3.0, 80000.0), locale).unwrap();
        assert_eq!(l.min_text, "3");
        assert_eq!(l.max_text, "80,000");
    }

    #[test]
    fn hover_readout_offsets() {
        let mut store = MemoryFeatureStore::new();
        let mut props = Map::new();
        props.insert("NAME".into(), json!("California"));
        store.insert("California", props);
        store.insert("Nevada", Map::new());
        store.set_stat_value("California", 25.0);

        let range = StatRange::from_bounds(0.0, 100.0);
        let r = HoverReadout::for_feature(&store, "California", &range, map_locale("en")).unwrap();
        assert_eq!(r.name, "California");
        assert_eq!(r.offset_percent, 25.0);
        assert!(HoverReadout::for_feature(&store, "Nevada", &range, map_locale("en")).is_none());
    }
}

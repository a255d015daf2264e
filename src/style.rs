//! Map a feature's value to its visual encoding.
//!
//! Styling is a pure function of `(value, range, hover)`: the fill color is
//! interpolated channel-wise in HSL space between a low and a high endpoint,
//! either linearly or on a log scale.

use crate::error::ChoroplethError;
use crate::stats::StatRange;
use serde::{Deserialize, Serialize};

pub const STROKE_COLOR: &str = "#fff";
pub const NORMAL_STROKE_WEIGHT: f64 = 0.5;
pub const NORMAL_Z_INDEX: u32 = 1;
pub const HOVER_STROKE_WEIGHT: f64 = 2.0;
pub const HOVER_Z_INDEX: u32 = 2;
pub const DEFAULT_FILL_OPACITY: f64 = 0.75;

/// HSL triple. Hue in degrees (not wrapped), saturation and lightness in percent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Hsl {
    pub h_deg: f64,
    pub s: f64,
    pub l: f64,
}

impl Hsl {
    pub const fn new(h_deg: f64, s: f64, l: f64) -> Self {
        Self { h_deg, s, l }
    }

    /// Channel-wise `self + (other - self) * t`.
    pub fn lerp(self, other: Hsl, t: f64) -> Hsl {
        let mix = |a: f64, b: f64| a + (b - a) * t;
        Hsl {
            h_deg: mix(self.h_deg, other.h_deg),
            s: mix(self.s, other.s),
            l: mix(self.l, other.l),
        }
    }

    /// CSS form, e.g. `hsl(78, 76%, 44%)`. Channels are printed as-is.
    pub fn to_css(self) -> String {
        format!("hsl({}, {}%, {}%)", self.h_deg, self.s, self.l)
    }

    pub fn to_rgb8(self) -> Rgb8 {
        hsl_to_rgb8(self)
    }
}

impl From<[f64; 3]> for Hsl {
    fn from(c: [f64; 3]) -> Self {
        Hsl::new(c[0], c[1], c[2])
    }
}

impl From<Hsl> for [f64; 3] {
    fn from(c: Hsl) -> Self {
        [c.h_deg, c.s, c.l]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Color of the smallest datum.
pub const DEFAULT_LOW: Hsl = Hsl::new(5.0, 69.0, 54.0);
/// Color of the largest datum.
pub const DEFAULT_HIGH: Hsl = Hsl::new(151.0, 83.0, 34.0);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    #[default]
    Linear,
    Logarithmic,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpacityMode {
    /// Same opacity for every visible feature.
    Fixed(f64),
    /// Opacity follows the gradient position: `t / 2 + 0.4`.
    Scaled,
}

impl Default for OpacityMode {
    fn default() -> Self {
        OpacityMode::Fixed(DEFAULT_FILL_OPACITY)
    }
}

impl OpacityMode {
    fn at(self, t: f64) -> f64 {
        match self {
            OpacityMode::Fixed(a) => a,
            OpacityMode::Scaled => t / 2.0 + 0.4,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoverState {
    #[default]
    Normal,
    Hovered,
}

impl HoverState {
    /// `(stroke weight, z-index)`; hovering raises and thickens the outline.
    fn outline(self) -> (f64, u32) {
        match self {
            HoverState::Normal => (NORMAL_STROKE_WEIGHT, NORMAL_Z_INDEX),
            HoverState::Hovered => (HOVER_STROKE_WEIGHT, HOVER_Z_INDEX),
        }
    }
}

/// Everything the map layer needs to paint one feature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StyleDescriptor {
    pub stroke_weight: f64,
    pub stroke_color: String,
    pub z_index: u32,
    pub fill_color: String,
    pub fill_opacity: f64,
    pub visible: bool,
    #[serde(skip)]
    pub fill: Hsl,
}

impl StyleDescriptor {
    /// Fill as `#RRGGBB`, for sinks that do not understand CSS `hsl()`.
    pub fn fill_hex(&self) -> String {
        self.fill.to_rgb8().to_hex()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorScale {
    pub mode: ScaleMode,
    pub low: Hsl,
    pub high: Hsl,
    pub opacity: OpacityMode,
}

impl Default for ColorScale {
    fn default() -> Self {
        Self {
            mode: ScaleMode::Linear,
            low: DEFAULT_LOW,
            high: DEFAULT_HIGH,
            opacity: OpacityMode::default(),
        }
    }
}

impl ColorScale {
    pub fn new(mode: ScaleMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn with_endpoints(mut self, low: Hsl, high: Hsl) -> Self {
        self.low = low;
        self.high = high;
        self
    }

    pub fn with_opacity(mut self, opacity: OpacityMode) -> Self {
        self.opacity = opacity;
        self
    }

    /// Check settings that would otherwise produce unusable styles.
    pub fn validate(&self) -> Result<(), ChoroplethError> {
        if let OpacityMode::Fixed(a) = self.opacity {
            if !(0.0..=1.0).contains(&a) {
                return Err(ChoroplethError::Config(format!(
                    "fill opacity {a} is outside [0, 1]"
                )));
            }
        }
        let finite = |c: Hsl| c.h_deg.is_finite() && c.s.is_finite() && c.l.is_finite();
        if !finite(self.low) || !finite(self.high) {
            return Err(ChoroplethError::Config(
                "color endpoints must be finite".into(),
            ));
        }
        Ok(())
    }

    /// Position of `value` along the gradient, clamped to `[0, 1]`.
    pub fn position(&self, value: f64, range: &StatRange) -> Result<f64, ChoroplethError> {
        let (min, max) = range.bounds().ok_or(ChoroplethError::EmptyRange)?;
        let t = match self.mode {
            ScaleMode::Linear => {
                if min == max {
                    return Err(ChoroplethError::DegenerateRange { value: min });
                }
                (value - min) / (max - min)
            }
            ScaleMode::Logarithmic => {
                if value <= 0.0 {
                    return Err(ChoroplethError::NonPositiveLogInput { value });
                }
                if min <= 0.0 {
                    return Err(ChoroplethError::NonPositiveLogInput { value: min });
                }
                if min == max {
                    return Err(ChoroplethError::DegenerateRange { value: min });
                }
                (value.ln() - min.ln()) / (max.ln() - min.ln())
            }
        };
        Ok(t.clamp(0.0, 1.0))
    }

    /// Style one feature. `None` or NaN values are never visible.
    pub fn style(&self, value: Option<f64>, range: &StatRange, hover: HoverState) -> StyleDescriptor {
        let (stroke_weight, z_index) = hover.outline();
        let hidden = || StyleDescriptor {
            stroke_weight,
            stroke_color: STROKE_COLOR.to_string(),
            z_index,
            fill_color: self.low.to_css(),
            fill_opacity: 0.0,
            visible: false,
            fill: self.low,
        };

        let Some(value) = value.filter(|v| !v.is_nan()) else {
            return hidden();
        };
        let t = match self.position(value, range) {
            Ok(t) => t,
            Err(ChoroplethError::DegenerateRange { .. }) => 1.0,
            Err(e) => {
                log::debug!("hiding value {value}: {e}");
                return hidden();
            }
        };

        let fill = self.low.lerp(self.high, t);
        StyleDescriptor {
            stroke_weight,
            stroke_color: STROKE_COLOR.to_string(),
            z_index,
            fill_color: fill.to_css(),
            fill_opacity: self.opacity.at(t),
            visible: true,
            fill,
        }
    }
}

// HSL -> RGB conversion (linear; sufficient for map fills)
fn hsl_to_rgb8(hsl: Hsl) -> Rgb8 {
    let h = hsl.h_deg.rem_euclid(360.0) / 360.0;
    let s = clamp01(hsl.s / 100.0);
    let l = clamp01(hsl.l / 100.0);

    if s == 0.0 {
        let v = (l * 255.0).round() as u8;
        return Rgb8 { r: v, g: v, b: v };
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 1.0 / 2.0 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    }

    let r = hue_to_rgb(p, q, h + 1.0 / 3.0);
    let g = hue_to_rgb(p, q, h);
    let b = hue_to_rgb(p, q, h - 1.0 / 3.0);

    Rgb8 {
        r: (r * 255.0).round() as u8,
        g: (g * 255.0).round() as u8,
        b: (b * 255.0).round() as u8,
    }
}

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(min: f64, max: f64) -> StatRange {
        StatRange::from_bounds(min, max)
    }

    #[test]
    fn midpoint_of_default_gradient() {
        let scale = ColorScale::default();
        let s = scale.style(Some(50.0), &range(0.0, 100.0), HoverState::Normal);
        assert!(s.visible);
        assert_eq!(s.fill_color, "hsl(78, 76%, 44%)");
        assert_eq!(s.fill_opacity, 0.75);
        assert_eq!(s.stroke_color, "#fff");
        assert_eq!((s.stroke_weight, s.z_index), (0.5, 1));
    }

    #[test]
    fn linear_channels_stay_between_endpoints() {
        let scale = ColorScale::default();
        let r = range(-20.0, 180.0);
        for i in 0..=40 {
            let v = -20.0 + 5.0 * i as f64;
            let t = scale.position(v, &r).unwrap();
            assert!((0.0..=1.0).contains(&t));
            let f = scale.style(Some(v), &r, HoverState::Normal).fill;
            assert!(f.h_deg >= 5.0 && f.h_deg <= 151.0);
            assert!(f.s >= 69.0 && f.s <= 83.0);
            assert!(f.l >= 34.0 && f.l <= 54.0);
        }
    }

    #[test]
    fn hover_raises_outline() {
        let scale = ColorScale::default();
        let s = scale.style(Some(1.0), &range(0.0, 2.0), HoverState::Hovered);
        assert_eq!((s.stroke_weight, s.z_index), (2.0, 2));
    }

    #[test]
    fn unset_and_nan_are_hidden_in_any_hover_state() {
        let scale = ColorScale::default();
        for hover in [HoverState::Normal, HoverState::Hovered] {
            assert!(!scale.style(None, &range(0.0, 1.0), hover).visible);
            assert!(!scale.style(Some(f64::NAN), &range(0.0, 1.0), hover).visible);
            assert!(!scale.style(None, &StatRange::new(), hover).visible);
        }
    }

    #[test]
    fn log_scale_positions_and_scaled_opacity() {
        let scale = ColorScale::new(ScaleMode::Logarithmic).with_opacity(OpacityMode::Scaled);
        let r = range(1.0, 10_000.0);
        assert!((scale.position(100.0, &r).unwrap() - 0.5).abs() < 1e-12);
        let s = scale.style(Some(100.0), &r, HoverState::Normal);
        assert!((s.fill_opacity - 0.65).abs() < 1e-12);
        let top = scale.style(Some(10_000.0), &r, HoverState::Normal);
        assert!((top.fill_opacity - 0.9).abs() < 1e-12);
    }

    #[test]
    fn log_scale_hides_non_positive_values() {
        let scale = ColorScale::new(ScaleMode::Logarithmic);
        let r = range(1.0, 100.0);
        assert_eq!(
            scale.position(0.0, &r),
            Err(ChoroplethError::NonPositiveLogInput { value: 0.0 })
        );
        assert!(!scale.style(Some(-3.0), &r, HoverState::Normal).visible);
        // A non-positive lower bound poisons every value.
        assert!(!scale.style(Some(5.0), &range(0.0, 100.0), HoverState::Normal).visible);
    }

    #[test]
    fn degenerate_range_shows_high_color() {
        let scale = ColorScale::default();
        let r = range(7.0, 7.0);
        assert_eq!(
            scale.position(7.0, &r),
            Err(ChoroplethError::DegenerateRange { value: 7.0 })
        );
        let s = scale.style(Some(7.0), &r, HoverState::Normal);
        assert!(s.visible);
        assert_eq!(s.fill, DEFAULT_HIGH);
    }

    #[test]
    fn out_of_range_values_clamp() {
        let scale = ColorScale::default();
        assert_eq!(scale.position(500.0, &range(0.0, 100.0)), Ok(1.0));
        assert_eq!(scale.position(-5.0, &range(0.0, 100.0)), Ok(0.0));
    }

    #[test]
    fn hex_conversion() {
        assert_eq!(Hsl::new(0.0, 100.0, 50.0).to_rgb8().to_hex(), "#FF0000");
        assert_eq!(Hsl::new(480.0, 100.0, 50.0).to_rgb8().to_hex(), "#00FF00");
        assert_eq!(Hsl::new(0.0, 0.0, 100.0).to_rgb8().to_hex(), "#FFFFFF");
    }

    #[test]
    fn validate_rejects_bad_opacity() {
        let scale = ColorScale::default().with_opacity(OpacityMode::Fixed(1.5));
        assert!(matches!(scale.validate(), Err(ChoroplethError::Config(_))));
        assert!(ColorScale::default().validate().is_ok());
    }
}

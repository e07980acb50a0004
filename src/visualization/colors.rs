//! Colour scales shared by the charts

use plotters::style::RGBColor;

/// Colour of low feature values and negative contributions
pub const LOW_BLUE: RGBColor = RGBColor(0x00, 0x8b, 0xfb);
/// Colour of high feature values and positive contributions
pub const HIGH_RED: RGBColor = RGBColor(0xff, 0x00, 0x51);
/// Row guides and neutral strokes
pub const GUIDE_GRAY: RGBColor = RGBColor(0xcc, 0xcc, 0xcc);

/// Linear blue → red gradient, `t` clamped to `[0, 1]`
pub fn gradient(t: f64) -> RGBColor {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    RGBColor(
        mix(LOW_BLUE.0, HIGH_RED.0),
        mix(LOW_BLUE.1, HIGH_RED.1),
        mix(LOW_BLUE.2, HIGH_RED.2),
    )
}

/// `#rrggbb` form for hand-written SVG/HTML
pub fn hex(color: RGBColor) -> String {
    format!("#{:02x}{:02x}{:02x}", color.0, color.1, color.2)
}

/// Percentile with linear interpolation between closest ranks.
///
/// `sorted` must be ascending and non-empty; `q` is in percent.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Maps feature values onto `[0, 1]` for colouring, clipped to the 5th–95th
/// percentile so outliers do not wash out the scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueNormalizer {
    pub vmin: f64,
    pub vmax: f64,
}

impl ValueNormalizer {
    pub fn fit(values: &[f64]) -> Self {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return Self { vmin: 0.0, vmax: 1.0 };
        }
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mut vmin = percentile(&sorted, 5.0);
        let mut vmax = percentile(&sorted, 95.0);
        if vmin == vmax {
            vmin = percentile(&sorted, 1.0);
            vmax = percentile(&sorted, 99.0);
            if vmin == vmax {
                vmin = sorted[0];
                vmax = sorted[sorted.len() - 1];
            }
        }
        Self { vmin: vmin.min(vmax), vmax }
    }

    pub fn normalize(&self, value: f64) -> f64 {
        if self.vmax <= self.vmin {
            return 0.5;
        }
        ((value - self.vmin) / (self.vmax - self.vmin)).clamp(0.0, 1.0)
    }

    pub fn color(&self, value: f64) -> RGBColor {
        gradient(self.normalize(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_endpoints() {
        assert_eq!(gradient(0.0), LOW_BLUE);
        assert_eq!(gradient(1.0), HIGH_RED);
        assert_eq!(gradient(7.0), HIGH_RED);
        assert_eq!(hex(HIGH_RED), "#ff0051");
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&sorted, 50.0), 3.0);
        assert!((percentile(&sorted, 5.0) - 1.2).abs() < 1e-12);
        assert_eq!(percentile(&sorted, 100.0), 5.0);
    }

    #[test]
    fn test_normalizer_clips_outliers() {
        let mut values: Vec<f64> = (0..100).map(|v| v as f64).collect();
        values.push(10_000.0);
        let norm = ValueNormalizer::fit(&values);
        assert!(norm.vmax < 100.0);
        assert_eq!(norm.normalize(10_000.0), 1.0);
        assert_eq!(norm.normalize(-5.0), 0.0);
    }

    #[test]
    fn test_constant_values() {
        let norm = ValueNormalizer::fit(&[3.0, 3.0, 3.0]);
        assert_eq!(norm.normalize(3.0), 0.5);
    }
}

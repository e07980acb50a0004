//! Global SHAP summary charts: beeswarm and mean |SHAP| bars

use super::chart::{draw_colorbar, draw_label, padded_range, plot_err, COLORBAR_WIDTH, FONT};
use super::colors::{ValueNormalizer, GUIDE_GRAY, LOW_BLUE};
use crate::error::{Result, XaiError};
use crate::explainability::ShapValues;
use plotters::prelude::*;

/// Number of bins used to stack overlapping beeswarm points
const SWARM_BINS: f64 = 100.0;
/// Vertical half-extent of one feature row in axis units
const ROW_HEIGHT: f64 = 0.4;

/// Summary chart geometry
#[derive(Debug, Clone, Copy)]
pub struct SummaryPlot {
    pub width: u32,
    /// Pixels per feature row
    pub row_pixels: u32,
    pub point_radius: u32,
}

impl Default for SummaryPlot {
    fn default() -> Self {
        Self {
            width: 800,
            row_pixels: 60,
            point_radius: 3,
        }
    }
}

impl SummaryPlot {
    fn height(&self, n_features: usize) -> u32 {
        150 + self.row_pixels * n_features as u32
    }

    /// Beeswarm of every SHAP value, one row per feature with the most
    /// important feature on top, coloured by the feature's own value.
    pub fn render_beeswarm(&self, shap: &ShapValues) -> Result<String> {
        check_non_empty(shap)?;

        let n_features = shap.n_features();
        let order = shap.importance_order();
        let (x_min, x_max) = padded_range(shap.values().iter().copied());
        let height = self.height(n_features);

        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(plot_err)?;
            let (main, legend) = root.split_horizontally(self.width - COLORBAR_WIDTH);

            let mut chart = ChartBuilder::on(&main)
                .margin(15)
                .x_label_area_size(50)
                .y_label_area_size(80)
                .build_cartesian_2d(x_min..x_max, -0.5..(n_features as f64 - 0.5))
                .map_err(plot_err)?;

            chart
                .configure_mesh()
                .disable_mesh()
                .disable_y_axis()
                .x_desc("SHAP value (impact on model output)")
                .axis_desc_style((FONT, 15))
                .label_style((FONT, 13))
                .draw()
                .map_err(plot_err)?;

            for (rank, &feature) in order.iter().enumerate() {
                let pos = (n_features - 1 - rank) as f64;
                chart
                    .draw_series(LineSeries::new(
                        vec![(x_min, pos), (x_max, pos)],
                        GUIDE_GRAY.stroke_width(1),
                    ))
                    .map_err(plot_err)?;

                let label_at = chart.backend_coord(&(x_min, pos));
                draw_label(&root, &shap.feature_names()[feature], (label_at.0 - 8, label_at.1), 14)?;
            }

            chart
                .draw_series(LineSeries::new(
                    vec![(0.0, -0.5), (0.0, n_features as f64 - 0.5)],
                    BLACK.mix(0.6).stroke_width(1),
                ))
                .map_err(plot_err)?;

            for (rank, &feature) in order.iter().enumerate() {
                let pos = (n_features - 1 - rank) as f64;
                let column = shap.values().column(feature).to_vec();
                let feature_values = shap.data().column(feature).to_vec();
                let normalizer = ValueNormalizer::fit(&feature_values);
                let offsets = swarm_offsets(&column);

                chart
                    .draw_series(column.iter().zip(offsets.iter()).zip(feature_values.iter()).map(
                        |((&s, &dy), &v)| {
                            Circle::new((s, pos + dy), self.point_radius, normalizer.color(v).mix(0.85).filled())
                        },
                    ))
                    .map_err(plot_err)?;
            }

            draw_colorbar(&legend, "Feature value")?;
            root.present().map_err(plot_err)?;
        }
        Ok(svg)
    }

    /// Horizontal bars of mean |SHAP| per feature, largest on top
    pub fn render_bar(&self, shap: &ShapValues) -> Result<String> {
        check_non_empty(shap)?;

        let n_features = shap.n_features();
        let importance = shap.mean_abs();
        let order = shap.importance_order();
        let max = importance.iter().copied().fold(0.0f64, f64::max);
        let x_max = if max > 0.0 { max * 1.2 } else { 1.0 };

        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width, self.height(n_features)))
                .into_drawing_area();
            root.fill(&WHITE).map_err(plot_err)?;

            let mut chart = ChartBuilder::on(&root)
                .margin(15)
                .margin_right(30)
                .x_label_area_size(50)
                .y_label_area_size(80)
                .build_cartesian_2d(0.0..x_max, -0.5..(n_features as f64 - 0.5))
                .map_err(plot_err)?;

            chart
                .configure_mesh()
                .disable_mesh()
                .disable_y_axis()
                .x_desc("mean(|SHAP value|) (average impact on model output magnitude)")
                .axis_desc_style((FONT, 15))
                .label_style((FONT, 13))
                .draw()
                .map_err(plot_err)?;

            let bars: Vec<(f64, f64)> = order
                .iter()
                .enumerate()
                .map(|(rank, &feature)| ((n_features - 1 - rank) as f64, importance[feature]))
                .collect();

            chart
                .draw_series(bars.iter().map(|&(pos, value)| {
                    Rectangle::new([(0.0, pos - 0.35), (value, pos + 0.35)], LOW_BLUE.filled())
                }))
                .map_err(plot_err)?;

            let value_style = TextStyle::from((FONT, 12).into_font()).color(&LOW_BLUE);
            chart
                .draw_series(bars.iter().map(|&(pos, value)| {
                    Text::new(format!("+{:.2}", value), (value + x_max * 0.01, pos + 0.12), value_style.clone())
                }))
                .map_err(plot_err)?;

            for (&feature, &(pos, _)) in order.iter().zip(bars.iter()) {
                let label_at = chart.backend_coord(&(0.0, pos));
                draw_label(&root, &shap.feature_names()[feature], (label_at.0 - 8, label_at.1), 14)?;
            }

            root.present().map_err(plot_err)?;
        }
        Ok(svg)
    }
}

fn check_non_empty(shap: &ShapValues) -> Result<()> {
    if shap.n_samples() == 0 || shap.n_features() == 0 {
        return Err(XaiError::PlotError("no SHAP values to plot".to_string()));
    }
    Ok(())
}

/// Vertical offsets that stack points with similar SHAP values side by side.
///
/// Values are quantized into bins; the k-th point of a bin is placed on
/// alternating sides at distance `ceil(k / 2)`, then everything is scaled to
/// fit inside the row.
pub(crate) fn swarm_offsets(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }

    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let bins: Vec<i64> = values
        .iter()
        .map(|v| (SWARM_BINS * (v - lo) / (hi - lo + 1e-8)).round() as i64)
        .collect();

    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by_key(|&i| bins[i]);

    let mut offsets = vec![0.0; values.len()];
    let mut layer = 0usize;
    let mut last_bin = None;
    for &i in &order {
        if last_bin != Some(bins[i]) {
            layer = 0;
        }
        let side = if layer % 2 == 1 { 1.0 } else { -1.0 };
        offsets[i] = (layer as f64 / 2.0).ceil() * side;
        layer += 1;
        last_bin = Some(bins[i]);
    }

    let widest = offsets.iter().map(|o| o + 1.0).fold(1.0f64, f64::max);
    let scale = 0.9 * ROW_HEIGHT / widest;
    offsets.iter_mut().for_each(|o| *o *= scale);
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn shap() -> ShapValues {
        ShapValues::new(
            array![[1.0, -0.2], [-2.0, 0.1], [0.5, 0.0]],
            array![[10.0, 1.0], [20.0, 2.0], [30.0, 3.0]],
            450.0,
            vec!["AT".to_string(), "V".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn test_swarm_offsets_stay_in_row() {
        let values = [0.0, 0.0, 0.0, 0.0, 1.0];
        let offsets = swarm_offsets(&values);
        assert!(offsets.iter().all(|o| o.abs() <= ROW_HEIGHT));
        // The lone point in its bin stays on the row centre
        assert_eq!(offsets[4], 0.0);
        // Stacked points spread to both sides
        assert!(offsets.iter().any(|&o| o > 0.0));
        assert!(offsets.iter().any(|&o| o < 0.0));
    }

    #[test]
    fn test_beeswarm_svg() {
        let svg = SummaryPlot::default().render_beeswarm(&shap()).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("AT"));
        assert!(svg.contains("Feature value"));
        assert!(svg.contains("<circle"));
    }

    #[test]
    fn test_bar_svg() {
        let svg = SummaryPlot::default().render_bar(&shap()).unwrap();
        assert!(svg.contains("+1.17"));
        assert!(svg.contains("V"));
    }

    #[test]
    fn test_empty_is_plot_error() {
        let empty = ShapValues::new(
            ndarray::Array2::zeros((0, 1)),
            ndarray::Array2::zeros((0, 1)),
            0.0,
            vec!["AT".to_string()],
        )
        .unwrap();
        assert!(matches!(
            SummaryPlot::default().render_beeswarm(&empty),
            Err(XaiError::PlotError(_))
        ));
    }
}

//! SHAP dependence plots

use super::chart::{draw_colorbar, padded_range, plot_err, COLORBAR_WIDTH, FONT};
use super::colors::{ValueNormalizer, LOW_BLUE};
use crate::error::{Result, XaiError};
use crate::explainability::ShapValues;
use plotters::prelude::*;

/// Dependence chart geometry
#[derive(Debug, Clone, Copy)]
pub struct DependencePlot {
    pub width: u32,
    pub height: u32,
    pub point_radius: u32,
}

impl Default for DependencePlot {
    fn default() -> Self {
        Self {
            width: 760,
            height: 500,
            point_radius: 3,
        }
    }
}

impl DependencePlot {
    /// Scatter of `feature`'s value against its SHAP value.
    ///
    /// Points are coloured by `interaction` when given; pass the first entry of
    /// [`approximate_interactions`] to reproduce the automatic choice.
    pub fn render(&self, shap: &ShapValues, feature: usize, interaction: Option<usize>) -> Result<String> {
        let n_features = shap.n_features();
        if feature >= n_features {
            return Err(XaiError::IndexOutOfBounds { index: feature, len: n_features });
        }
        if shap.n_samples() == 0 {
            return Err(XaiError::PlotError("no SHAP values to plot".to_string()));
        }
        let interaction = interaction.filter(|&j| j < n_features && j != feature);

        let names = shap.feature_names();
        let xs = shap.data().column(feature).to_vec();
        let ys = shap.values().column(feature).to_vec();
        let (x_min, x_max) = padded_range(xs.iter().copied());
        let (y_min, y_max) = padded_range(ys.iter().copied());

        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE).map_err(plot_err)?;

            let (main, legend) = if interaction.is_some() {
                let (main, legend) = root.split_horizontally(self.width - COLORBAR_WIDTH);
                (main, Some(legend))
            } else {
                (root.clone(), None)
            };

            let mut chart = ChartBuilder::on(&main)
                .margin(15)
                .x_label_area_size(50)
                .y_label_area_size(70)
                .build_cartesian_2d(x_min..x_max, y_min..y_max)
                .map_err(plot_err)?;

            chart
                .configure_mesh()
                .light_line_style(WHITE)
                .bold_line_style(RGBColor(0xee, 0xee, 0xee))
                .x_desc(names[feature].as_str())
                .y_desc(format!("SHAP value for {}", names[feature]))
                .axis_desc_style((FONT, 15))
                .label_style((FONT, 13))
                .draw()
                .map_err(plot_err)?;

            match (interaction, legend) {
                (Some(j), Some(legend)) => {
                    let colour_values = shap.data().column(j).to_vec();
                    let normalizer = ValueNormalizer::fit(&colour_values);
                    chart
                        .draw_series(xs.iter().zip(ys.iter()).zip(colour_values.iter()).map(|((&x, &y), &c)| {
                            Circle::new((x, y), self.point_radius, normalizer.color(c).mix(0.85).filled())
                        }))
                        .map_err(plot_err)?;
                    draw_colorbar(&legend, names[j].as_str())?;
                }
                _ => {
                    chart
                        .draw_series(xs.iter().zip(ys.iter()).map(|(&x, &y)| {
                            Circle::new((x, y), self.point_radius, LOW_BLUE.mix(0.85).filled())
                        }))
                        .map_err(plot_err)?;
                }
            }

            root.present().map_err(plot_err)?;
        }
        Ok(svg)
    }
}

/// Features ordered by how strongly they seem to interact with `index`.
///
/// Rows are sorted by the feature's value and cut into consecutive bins of
/// `max(min(n / 10, 50), 1)` rows. Within each bin the absolute correlation
/// between the feature's SHAP values and each other feature is accumulated;
/// higher totals come first. `index` itself is never returned.
pub fn approximate_interactions(index: usize, shap: &ShapValues) -> Result<Vec<usize>> {
    let n_features = shap.n_features();
    if index >= n_features {
        return Err(XaiError::IndexOutOfBounds { index, len: n_features });
    }

    let n = shap.n_samples();
    let data = shap.data();
    let mut sorted_rows: Vec<usize> = (0..n).collect();
    sorted_rows.sort_by(|&a, &b| data[[a, index]].total_cmp(&data[[b, index]]));

    let shap_ref: Vec<f64> = sorted_rows.iter().map(|&r| shap.values()[[r, index]]).collect();
    let bin = (n / 10).min(50).max(1);

    let mut scores: Vec<(usize, f64)> = (0..n_features)
        .filter(|&j| j != index)
        .map(|j| {
            let other: Vec<f64> = sorted_rows.iter().map(|&r| data[[r, j]]).collect();
            if other.iter().map(|v| v.abs()).sum::<f64>() < 1e-8 {
                return (j, 0.0);
            }
            let score = shap_ref
                .chunks(bin)
                .zip(other.chunks(bin))
                .filter_map(|(s, o)| correlation(s, o))
                .map(f64::abs)
                .sum::<f64>();
            (j, score)
        })
        .collect();

    scores.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(scores.into_iter().map(|(j, _)| j).collect())
}

/// Pearson correlation, `None` when either side is constant
fn correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b.iter()) {
        let (da, db) = (x - mean_a, y - mean_b);
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    if var_a <= 0.0 || var_b <= 0.0 {
        return None;
    }
    let r = cov / (var_a.sqrt() * var_b.sqrt());
    r.is_finite().then_some(r)
}

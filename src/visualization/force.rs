//! Self-contained HTML explanation of a single prediction

use super::colors::{hex, HIGH_RED, LOW_BLUE};
use crate::error::{Result, XaiError};
use crate::explainability::{FeatureContribution, LocalExplanation};

const LABEL_WIDTH: f64 = 190.0;
const MARGIN: f64 = 30.0;

/// Renders a [`LocalExplanation`] as a standalone HTML page: a waterfall from
/// the base value to the prediction, a contribution table, and the
/// explanation itself as embedded JSON.
#[derive(Debug, Clone)]
pub struct ForcePlot {
    pub width: u32,
    pub row_height: u32,
    /// Name of the model output shown next to `f(x)`
    pub output_name: String,
}

impl Default for ForcePlot {
    fn default() -> Self {
        Self {
            width: 960,
            row_height: 34,
            output_name: "model output".to_string(),
        }
    }
}

impl ForcePlot {
    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = name.into();
        self
    }

    pub fn render(&self, explanation: &LocalExplanation) -> Result<String> {
        if explanation.contributions.is_empty() {
            return Err(XaiError::PlotError("explanation has no contributions".to_string()));
        }

        let json = serde_json::to_string(explanation)
            .map_err(|e| XaiError::SerializationError(e.to_string()))?
            .replace("</", "<\\/");

        let mut html = String::with_capacity(16 * 1024);
        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(&format!(
            "<title>Local explanation: instance {}</title>\n",
            explanation.instance_index
        ));
        html.push_str(STYLE);
        html.push_str("</head>\n<body>\n");
        html.push_str(&format!(
            "<h1>Why the model predicts {:.2} for test instance {}</h1>\n",
            explanation.prediction, explanation.instance_index
        ));
        html.push_str(&format!(
            "<p class=\"summary\">Base value <b>{:.2}</b> &rarr; f(x) = <b>{:.2}</b> {} \
             (<span class=\"pos\">red</span> pushes the prediction higher, \
             <span class=\"neg\">blue</span> pushes it lower)</p>\n",
            explanation.base_value,
            explanation.prediction,
            escape_html(&self.output_name)
        ));
        html.push_str(&push_summary(explanation));
        html.push_str(&self.waterfall_svg(explanation));
        html.push_str(&contribution_table(explanation));
        html.push_str(&format!(
            "<script type=\"application/json\" id=\"explanation-data\">{}</script>\n",
            json
        ));
        html.push_str("</body>\n</html>\n");
        Ok(html)
    }

    fn waterfall_svg(&self, explanation: &LocalExplanation) -> String {
        let rows = explanation.sorted_contributions();
        let width = self.width as f64;
        let row_h = self.row_height as f64;
        let height = row_h * (rows.len() as f64 + 2.0) + MARGIN;

        // Running totals: base → base + c1 → ... → prediction
        let mut ends = Vec::with_capacity(rows.len());
        let mut running = explanation.base_value;
        for c in &rows {
            let start = running;
            running += c.contribution;
            ends.push((start, running));
        }

        let (lo, hi) = ends
            .iter()
            .flat_map(|&(a, b)| [a, b])
            .chain([explanation.base_value, explanation.prediction])
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let span = if hi - lo > 1e-12 { hi - lo } else { 1.0 };
        let (lo, hi) = (lo - span * 0.1, hi + span * 0.1);

        let plot_left = LABEL_WIDTH;
        let plot_right = width - MARGIN;
        let scale_x = |v: f64| plot_left + (v - lo) / (hi - lo) * (plot_right - plot_left);

        let mut svg = format!(
            "<svg class=\"waterfall\" xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
            w = width,
            h = height
        );

        let base_x = scale_x(explanation.base_value);
        let pred_x = scale_x(explanation.prediction);
        let bottom = row_h * (rows.len() as f64 + 1.0);
        svg.push_str(&format!(
            "<line class=\"ref\" x1=\"{x:.1}\" y1=\"{t:.1}\" x2=\"{x:.1}\" y2=\"{b:.1}\"/>\n\
             <text class=\"axis\" x=\"{x:.1}\" y=\"{ty:.1}\" text-anchor=\"middle\">base value {v:.2}</text>\n",
            x = base_x,
            t = row_h * 0.6,
            b = bottom,
            ty = row_h * 0.45,
            v = explanation.base_value
        ));

        for (row, (c, &(start, end))) in rows.iter().zip(ends.iter()).enumerate() {
            let y = row_h * (row as f64 + 1.0);
            let (x0, x1) = (scale_x(start.min(end)), scale_x(start.max(end)));
            let color = if c.contribution >= 0.0 { hex(HIGH_RED) } else { hex(LOW_BLUE) };
            let label = format!("{} = {:.2}", escape_html(&c.feature_name), c.feature_value);
            let value = format!("{:+.2}", c.contribution);

            svg.push_str(&format!(
                "<g class=\"bar\">\n<title>{label}: {value} (running total {end:.2})</title>\n\
                 <text class=\"label\" x=\"{lx:.1}\" y=\"{ly:.1}\" text-anchor=\"end\">{label}</text>\n\
                 <rect x=\"{x0:.1}\" y=\"{ry:.1}\" width=\"{rw:.1}\" height=\"{rh:.1}\" fill=\"{color}\"/>\n\
                 <text class=\"value\" x=\"{vx:.1}\" y=\"{ly:.1}\" fill=\"{color}\">{value}</text>\n</g>\n",
                label = label,
                value = value,
                end = end,
                lx = plot_left - 10.0,
                ly = y + row_h * 0.62,
                x0 = x0,
                ry = y + row_h * 0.15,
                rw = (x1 - x0).max(1.0),
                rh = row_h * 0.7,
                color = color,
                vx = x1 + 6.0,
            ));

            if row + 1 < rows.len() {
                let connector_x = scale_x(end);
                svg.push_str(&format!(
                    "<line class=\"step\" x1=\"{x:.1}\" y1=\"{a:.1}\" x2=\"{x:.1}\" y2=\"{b:.1}\"/>\n",
                    x = connector_x,
                    a = y + row_h * 0.85,
                    b = y + row_h * 1.15
                ));
            }
        }

        svg.push_str(&format!(
            "<line class=\"ref\" x1=\"{x:.1}\" y1=\"{t:.1}\" x2=\"{x:.1}\" y2=\"{b:.1}\"/>\n\
             <text class=\"axis strong\" x=\"{x:.1}\" y=\"{ty:.1}\" text-anchor=\"middle\">f(x) = {v:.2}</text>\n",
            x = pred_x,
            t = row_h,
            b = bottom + row_h * 0.2,
            ty = bottom + row_h * 0.75,
            v = explanation.prediction
        ));

        svg.push_str("</svg>\n");
        svg
    }
}

/// One line per direction: which features raise the prediction and which lower it
fn push_summary(explanation: &LocalExplanation) -> String {
    let describe = |label: &str, class: &str, features: Vec<&FeatureContribution>| {
        if features.is_empty() {
            return String::new();
        }
        let total: f64 = features.iter().map(|c| c.contribution).sum();
        let names: Vec<String> = features.iter().map(|c| escape_html(&c.feature_name)).collect();
        format!(
            "<li><span class=\"{}\">{} {:+.2}</span>: {}</li>\n",
            class,
            label,
            total,
            names.join(", ")
        )
    };

    let mut list = String::from("<ul class=\"pushes\">\n");
    list.push_str(&describe("Higher", "pos", explanation.positive_contributors()));
    list.push_str(&describe("Lower", "neg", explanation.negative_contributors()));
    list.push_str("</ul>\n");
    list
}

fn contribution_table(explanation: &LocalExplanation) -> String {
    let mut table = String::from(
        "<table>\n<thead><tr><th>Feature</th><th>Value</th><th>SHAP value</th></tr></thead>\n<tbody>\n",
    );
    for c in explanation.sorted_contributions() {
        let class = if c.contribution >= 0.0 { "pos" } else { "neg" };
        table.push_str(&format!(
            "<tr><td>{}</td><td>{:.2}</td><td class=\"{}\">{:+.4}</td></tr>\n",
            escape_html(&c.feature_name),
            c.feature_value,
            class,
            c.contribution
        ));
    }
    table.push_str(&format!(
        "</tbody>\n<tfoot><tr><td>Base value</td><td></td><td>{:.4}</td></tr>\
         <tr><td>Prediction</td><td></td><td>{:.4}</td></tr></tfoot>\n</table>\n",
        explanation.base_value, explanation.prediction
    ));
    table
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const STYLE: &str = r#"<style>
body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; margin: 24px; color: #222; }
h1 { font-size: 20px; font-weight: 600; }
.summary { color: #444; }
.pos { color: #ff0051; }
.neg { color: #008bfb; }
ul.pushes { padding-left: 18px; color: #444; }
svg.waterfall text { font-size: 13px; }
svg.waterfall .axis { fill: #555; }
svg.waterfall .strong { font-weight: 600; fill: #222; }
svg.waterfall .ref { stroke: #888; stroke-dasharray: 4 3; }
svg.waterfall .step { stroke: #bbb; }
svg.waterfall .bar rect { opacity: 0.85; }
svg.waterfall .bar:hover rect { opacity: 1; stroke: #222; }
table { border-collapse: collapse; margin-top: 16px; }
th, td { padding: 4px 12px; text-align: right; border-bottom: 1px solid #eee; }
th:first-child, td:first-child { text-align: left; }
tfoot td { font-weight: 600; }
</style>
"#;

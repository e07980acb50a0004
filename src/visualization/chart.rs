//! Shared chart pieces: error mapping, axis ranges, row labels and colour bars

use super::colors::gradient;
use crate::error::XaiError;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

pub(crate) const FONT: &str = "sans-serif";

/// Width reserved on the right of a chart for its colour bar
pub(crate) const COLORBAR_WIDTH: u32 = 90;

pub(crate) fn plot_err<E: std::fmt::Display>(e: E) -> XaiError {
    XaiError::PlotError(e.to_string())
}

/// `[min, max]` of finite values widened by 5% on each side
pub(crate) fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if !lo.is_finite() {
        return (-1.0, 1.0);
    }
    if hi - lo < 1e-12 {
        return (lo - 1.0, hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

/// Right-aligned label at pixel `(x, y)` of `area`
pub(crate) fn draw_label(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    text: &str,
    (x, y): (i32, i32),
    size: u32,
) -> crate::error::Result<()> {
    let style = TextStyle::from((FONT, size).into_font())
        .color(&BLACK)
        .pos(Pos::new(HPos::Right, VPos::Center));
    area.draw(&Text::new(text.to_string(), (x, y), style))
        .map_err(plot_err)
}

/// Vertical blue → red bar with `low`/`high` end labels and a rotated title
pub(crate) fn draw_colorbar(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    title: &str,
) -> crate::error::Result<()> {
    let (_, height) = area.dim_in_pixel();
    let top = 40i32;
    let bottom = height as i32 - 60;
    let steps = 64;
    let step = (bottom - top) as f64 / steps as f64;

    for i in 0..steps {
        let y0 = top + (i as f64 * step).floor() as i32;
        let y1 = top + ((i + 1) as f64 * step).ceil() as i32;
        let color = gradient(1.0 - i as f64 / (steps - 1) as f64);
        area.draw(&Rectangle::new([(12, y0), (24, y1)], color.filled()))
            .map_err(plot_err)?;
    }

    let end_style = TextStyle::from((FONT, 12).into_font())
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    area.draw(&Text::new("High".to_string(), (18, top - 12), end_style.clone()))
        .map_err(plot_err)?;
    area.draw(&Text::new("Low".to_string(), (18, bottom + 12), end_style))
        .map_err(plot_err)?;

    let title_style = TextStyle::from((FONT, 13).into_font().transform(FontTransform::Rotate270))
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    area.draw(&Text::new(title.to_string(), (44, (top + bottom) / 2), title_style))
        .map_err(plot_err)
}

//! SVG → PNG rasterization

use crate::error::{Result, XaiError};
use resvg::tiny_skia;
use resvg::usvg::{self, fontdb};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Renders SVG documents to PNG files at a fixed pixel scale.
///
/// The system font database is loaded once and shared by every render.
#[derive(Clone)]
pub struct Rasterizer {
    scale: f32,
    fontdb: Arc<fontdb::Database>,
}

impl Rasterizer {
    pub fn new(scale: f32) -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        if db.faces().next().is_none() {
            warn!("No system fonts found, chart text will not be rendered");
        }

        Self {
            scale: if scale.is_finite() && scale > 0.0 { scale } else { 1.0 },
            fontdb: Arc::new(db),
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Rasterize `svg` into an in-memory PNG
    pub fn to_png(&self, svg: &str) -> Result<Vec<u8>> {
        let mut options = usvg::Options::default();
        options.fontdb = Arc::clone(&self.fontdb);

        let tree = usvg::Tree::from_str(svg, &options)
            .map_err(|e| XaiError::PlotError(format!("invalid SVG: {}", e)))?;

        let size = tree.size();
        let width = (size.width() * self.scale).ceil() as u32;
        let height = (size.height() * self.scale).ceil() as u32;
        let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
            XaiError::PlotError(format!("cannot allocate a {}x{} canvas", width, height))
        })?;
        pixmap.fill(tiny_skia::Color::WHITE);

        resvg::render(
            &tree,
            tiny_skia::Transform::from_scale(self.scale, self.scale),
            &mut pixmap.as_mut(),
        );

        pixmap
            .encode_png()
            .map_err(|e| XaiError::PlotError(format!("PNG encoding failed: {}", e)))
    }

    /// Rasterize `svg` and write it to `path`
    pub fn save_png(&self, svg: &str, path: &Path) -> Result<()> {
        let png = self.to_png(svg)?;
        std::fs::write(path, &png).map_err(|e| XaiError::ArtifactWriteError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), bytes = png.len(), "PNG written");
        Ok(())
    }
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new(1.0)
    }
}

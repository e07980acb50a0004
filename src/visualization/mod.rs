//! Visualization module: SHAP charts rendered to SVG and rasterized to PNG,
//! plus the standalone HTML force plot.

mod chart;
pub mod colors;
pub mod dependence;
pub mod force;
pub mod raster;
pub mod summary;

pub use dependence::{approximate_interactions, DependencePlot};
pub use force::ForcePlot;
pub use raster::Rasterizer;
pub use summary::SummaryPlot;

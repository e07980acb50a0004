//! Dataset loading
//!
//! Reads the combined-cycle power plant measurements (`AT, V, AP, RH → PE`)
//! from a workbook or delimited file and validates the fixed schema.

mod loader;
mod table;

pub use loader::{DatasetLoader, InputFormat};
pub use table::ObservationTable;

pub mod config;
pub mod constants;
pub mod error;
pub mod generator;
pub mod geometry_processor;
pub mod grid_index;
pub mod h3_utils;
pub mod hull;
pub mod hull_geometry;
pub mod input;
pub mod merger;
pub mod output;
pub mod polar;
pub mod raster;

#[cfg(test)]
mod test_support;

pub use config::HullConfig;
pub use error::{HullError, Result};
pub use generator::HullGenerator;
pub use geometry_processor::{GeometryProcessor, HolePolicy, SimplifyConfig};
pub use grid_index::{CellId, GeoPoint, GridIndex};
pub use hull::{AddOutcome, Hull, HullMode, HullState, HullStats};
pub use hull_geometry::HullGeometry;
pub use input::{CsvProcessor, GeoTiffProcessor, InputFileProcessor};
pub use merger::MultiFileHullMerger;
pub use output::{HullWriter, OutputFormat};

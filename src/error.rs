/// Error types for hull generation.

use thiserror::Error;

/// Hull generation errors.
#[derive(Error, Debug)]
pub enum HullError {
    /// A hull generation was requested with no pending cells.
    #[error("Cannot generate a hull from an empty cell set")]
    EmptyCellSet,

    /// A geometry operation produced no polygons where one was required.
    #[error("Geometry is empty: {0}")]
    EmptyGeometry(String),

    /// A geometry operation produced a shape other than Polygon/MultiPolygon.
    #[error("Unexpected geometry type: {0}")]
    UnexpectedGeometry(String),

    /// Coordinate rejected by the grid index.
    #[error("Invalid coordinate (lat {latitude}, lon {longitude}): {message}")]
    InvalidCoordinate {
        latitude: f64,
        longitude: f64,
        message: String,
    },

    /// Cell id not recognized by the grid index.
    #[error("Invalid cell id {0:#x}")]
    InvalidCell(u64),

    /// Configuration rejected by validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Malformed delimited-text record.
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Required GeoTIFF tag absent from the image.
    #[error("Missing GeoTIFF tag: {0}")]
    MissingTag(&'static str),

    /// Raster layout or sample format this crate cannot read.
    #[error("Unsupported raster: {0}")]
    UnsupportedRaster(String),

    /// WKT parse error.
    #[error("WKT parse error: {0}")]
    Wkt(String),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for hull operations.
pub type Result<T> = std::result::Result<T, HullError>;

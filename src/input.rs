/// Point source adapters
///
/// Each adapter drains one input file into a hull and finishes it. A source
/// without any usable point leaves the hull absent.

use crate::constants::{DEFAULT_DELIMITERS, DEFAULT_PIXEL_AREA};
use crate::error::{HullError, Result};
use crate::grid_index::GeoPoint;
use crate::hull::Hull;
use crate::hull_geometry::HullGeometry;
use crate::raster::{GeoTiffRaster, RasterPoints, RasterSource};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

static DEFAULT_DELIMITER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(DEFAULT_DELIMITERS).expect("valid regex"));

pub trait InputFileProcessor {
    /// Feed every point of `path` into the hull and return the finished hull
    fn process(&mut self, path: &Path) -> Result<Option<&HullGeometry>>;
}

/// Delimited text, one `longitude<delimiter>latitude` pair per line
pub struct CsvProcessor {
    delimiters: Regex,
    hull: Hull,
}

impl CsvProcessor {
    pub fn new(hull: Hull) -> Self {
        Self {
            delimiters: DEFAULT_DELIMITER_RE.clone(),
            hull,
        }
    }

    /// Split lines on any match of `pattern` instead of a comma
    pub fn with_delimiters(mut self, pattern: &str) -> Result<Self> {
        self.delimiters = Regex::new(pattern)
            .map_err(|e| HullError::InvalidConfig(format!("bad delimiter pattern: {}", e)))?;
        Ok(self)
    }

    pub fn hull(&self) -> &Hull {
        &self.hull
    }

    pub fn parse_line(&self, line: &str, line_number: usize) -> Result<GeoPoint> {
        let mut fields = self.delimiters.split(line.trim()).map(str::trim);
        let mut next_number = |axis: &str| -> Result<f64> {
            let field = fields.next().ok_or_else(|| HullError::Parse {
                line: line_number,
                message: format!("missing {}", axis),
            })?;
            field.parse::<f64>().map_err(|e| HullError::Parse {
                line: line_number,
                message: format!("bad {} {:?}: {}", axis, field, e),
            })
        };

        let longitude = next_number("longitude")?;
        let latitude = next_number("latitude")?;
        Ok(GeoPoint::new(latitude, longitude))
    }

    pub fn process_reader<R: BufRead>(&mut self, reader: R) -> Result<Option<&HullGeometry>> {
        let mut points = 0usize;
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let point = self.parse_line(&line, index + 1)?;
            self.hull.add_point(point)?;
            points += 1;
        }
        debug!(points, "read delimited points");
        self.hull.finish()
    }
}

impl InputFileProcessor for CsvProcessor {
    fn process(&mut self, path: &Path) -> Result<Option<&HullGeometry>> {
        info!(path = %path.display(), "processing delimited file");
        let reader = BufReader::new(File::open(path)?);
        self.process_reader(reader)
    }
}

/// Single-band GeoTIFF; every pixel that is not 0 or 255 is a point
pub struct GeoTiffProcessor {
    pixel_area: u32,
    hull: Hull,
}

impl GeoTiffProcessor {
    pub fn new(hull: Hull) -> Self {
        Self {
            pixel_area: DEFAULT_PIXEL_AREA,
            hull,
        }
    }

    /// Side in pixels of the square windows the raster is read in
    pub fn with_pixel_area(mut self, pixel_area: u32) -> Result<Self> {
        if pixel_area == 0 {
            return Err(HullError::InvalidConfig(
                "pixel area must be at least 1".to_string(),
            ));
        }
        self.pixel_area = pixel_area;
        Ok(self)
    }

    pub fn pixel_area(&self) -> u32 {
        self.pixel_area
    }

    pub fn hull(&self) -> &Hull {
        &self.hull
    }

    pub fn process_raster<S: RasterSource>(&mut self, source: S) -> Result<Option<&HullGeometry>> {
        let mut points = 0usize;
        for point in RasterPoints::new(source, self.pixel_area)? {
            self.hull.add_point(point?)?;
            points += 1;
        }
        debug!(points, "read raster points");
        self.hull.finish()
    }
}

impl InputFileProcessor for GeoTiffProcessor {
    fn process(&mut self, path: &Path) -> Result<Option<&HullGeometry>> {
        info!(path = %path.display(), "processing GeoTIFF");
        let raster = GeoTiffRaster::open(path)?;
        self.process_raster(raster)
    }
}

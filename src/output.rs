/// Hull output files
///
/// Hulls are written as a bare GeoJSON geometry or as WKT. Writers never
/// overwrite: the target file must not exist yet.

use crate::error::{HullError, Result};
use crate::hull_geometry::HullGeometry;
use geo::MapCoords;
use geo_types::{Coord, Geometry};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use tracing::info;
use wkt::ToWkt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    GeoJson,
    Wkt,
}

impl OutputFormat {
    /// File extension, without the dot
    pub fn ext(&self) -> &'static str {
        match self {
            OutputFormat::GeoJson => "geojson",
            OutputFormat::Wkt => "wkt",
        }
    }

    pub fn encode(&self, geometry: &Geometry<f64>) -> String {
        match self {
            OutputFormat::GeoJson => {
                geojson::Geometry::new(geojson::Value::from(geometry)).to_string()
            }
            OutputFormat::Wkt => geometry.wkt_string(),
        }
    }

    pub fn decode(&self, text: &str) -> Result<HullGeometry> {
        let geometry: Geometry<f64> = match self {
            OutputFormat::GeoJson => {
                let geojson: geojson::GeoJson = text.parse()?;
                Geometry::try_from(geojson)?
            }
            OutputFormat::Wkt => {
                let wkt = wkt::Wkt::<f64>::from_str(text.trim())
                    .map_err(|e| HullError::Wkt(format!("{:?}", e)))?;
                Geometry::try_from(wkt).map_err(|e| HullError::Wkt(format!("{:?}", e)))?
            }
        };
        HullGeometry::try_from(geometry)
    }

    pub fn read(&self, path: &Path) -> Result<HullGeometry> {
        let text = fs::read_to_string(path)?;
        self.decode(&text)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ext())
    }
}

impl FromStr for OutputFormat {
    type Err = HullError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "geojson" | "json" => Ok(OutputFormat::GeoJson),
            "wkt" => Ok(OutputFormat::Wkt),
            other => Err(HullError::InvalidConfig(format!(
                "unknown output format {:?}",
                other
            ))),
        }
    }
}

/// Writes hulls in one format, optionally with latitude and longitude swapped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HullWriter {
    format: OutputFormat,
    swap_axes: bool,
}

impl HullWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            swap_axes: false,
        }
    }

    pub fn with_swapped_axes(mut self, swap_axes: bool) -> Self {
        self.swap_axes = swap_axes;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn encode(&self, hull: &HullGeometry) -> String {
        let geometry = hull.to_geometry();
        if self.swap_axes {
            self.format.encode(&geometry.map_coords(|c| Coord { x: c.y, y: c.x }))
        } else {
            self.format.encode(&geometry)
        }
    }

    /// Write `hull` to a new file at `path`; fails if the file exists
    pub fn write(&self, hull: &HullGeometry, path: &Path) -> Result<()> {
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        file.write_all(self.encode(hull).as_bytes())?;
        info!(
            path = %path.display(),
            format = %self.format,
            vertices = hull.vertex_count(),
            "wrote hull"
        );
        Ok(())
    }
}

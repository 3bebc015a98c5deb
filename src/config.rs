/// Run configuration
///
/// Loaded from a JSON file; every field has a default so a partial file (or
/// `{}`) is valid. The builders here are the one place that turns settings
/// into processors, hulls and writers.

use crate::constants::{
    DEFAULT_DELIMITERS, DEFAULT_H3_RESOLUTION, DEFAULT_PIXEL_AREA, MAX_H3_RESOLUTION,
};
use crate::error::{HullError, Result};
use crate::geometry_processor::{GeometryProcessor, HolePolicy, SimplifyConfig};
use crate::hull::{Hull, HullMode};
use crate::input::{CsvProcessor, GeoTiffProcessor};
use crate::merger::MultiFileHullMerger;
use crate::output::{HullWriter, OutputFormat};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HullConfig {
    /// H3 resolution, 0..=15
    pub resolution: u8,
    pub keep_holes: bool,
    /// Distinct cells per incremental generation; `None` builds the hull once
    pub buffer_size: Option<usize>,
    pub simplify: Option<SimplifyConfig>,
    /// Raster window side, in pixels
    pub pixel_area: u32,
    /// Regex separating longitude and latitude in delimited input
    pub delimiters: String,
    pub output: OutputFormat,
    pub swap_axes: bool,
}

impl Default for HullConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_H3_RESOLUTION,
            keep_holes: false,
            buffer_size: None,
            simplify: None,
            pixel_area: DEFAULT_PIXEL_AREA,
            delimiters: DEFAULT_DELIMITERS.to_string(),
            output: OutputFormat::GeoJson,
            swap_axes: false,
        }
    }
}

impl HullConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: HullConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.resolution > MAX_H3_RESOLUTION {
            return Err(HullError::InvalidConfig(format!(
                "resolution must be between 0 and {}, got {}",
                MAX_H3_RESOLUTION, self.resolution
            )));
        }
        if self.buffer_size == Some(0) {
            return Err(HullError::InvalidConfig(
                "buffer size must be at least 1".to_string(),
            ));
        }
        if self.pixel_area == 0 {
            return Err(HullError::InvalidConfig(
                "pixel area must be at least 1".to_string(),
            ));
        }
        if let Some(simplify) = &self.simplify {
            simplify.validate()?;
        }
        Regex::new(&self.delimiters)
            .map_err(|e| HullError::InvalidConfig(format!("bad delimiter pattern: {}", e)))?;
        Ok(())
    }

    pub fn hole_policy(&self) -> HolePolicy {
        if self.keep_holes {
            HolePolicy::Keep
        } else {
            HolePolicy::Remove
        }
    }

    pub fn hull_mode(&self) -> HullMode {
        match self.buffer_size {
            Some(buffer_size) => HullMode::Buffered { buffer_size },
            None => HullMode::Complete,
        }
    }

    pub fn geometry_processor(&self) -> Result<GeometryProcessor> {
        let processor = GeometryProcessor::h3(self.resolution)?.with_hole_policy(self.hole_policy());
        match self.simplify {
            Some(simplify) => processor.with_simplification(simplify),
            None => Ok(processor),
        }
    }

    pub fn hull(&self) -> Result<Hull> {
        Hull::new(self.geometry_processor()?, self.hull_mode())
    }

    pub fn csv_processor(&self) -> Result<CsvProcessor> {
        CsvProcessor::new(self.hull()?).with_delimiters(&self.delimiters)
    }

    pub fn geotiff_processor(&self) -> Result<GeoTiffProcessor> {
        GeoTiffProcessor::new(self.hull()?).with_pixel_area(self.pixel_area)
    }

    /// Merger reading files in the configured output format
    pub fn merger(&self) -> Result<MultiFileHullMerger> {
        Ok(MultiFileHullMerger::new(self.output, self.geometry_processor()?))
    }

    pub fn writer(&self) -> HullWriter {
        HullWriter::new(self.output).with_swapped_axes(self.swap_axes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_MAX_HULL_VERTICES;
    use std::io::Write;

    #[test]
    fn test_empty_object_gives_defaults() {
        let config = HullConfig::from_json_str("{}").unwrap();
        assert_eq!(config, HullConfig::default());
        assert_eq!(config.resolution, 8);
        assert_eq!(config.hull_mode(), HullMode::Complete);
        assert_eq!(config.hole_policy(), HolePolicy::Remove);
    }

    #[test]
    fn test_partial_simplify_section_uses_defaults() {
        let config = HullConfig::from_json_str(
            r#"{ "buffer_size": 500, "keep_holes": true, "simplify": { "max_vertices": 64 }, "output": "wkt" }"#,
        )
        .unwrap();

        let simplify = config.simplify.unwrap();
        assert_eq!(simplify.max_vertices, 64);
        assert_eq!(simplify.distance_tolerance, SimplifyConfig::default().distance_tolerance);
        assert_eq!(config.hull_mode(), HullMode::Buffered { buffer_size: 500 });
        assert_eq!(config.hole_policy(), HolePolicy::Keep);
        assert_eq!(config.output, OutputFormat::Wkt);
        assert_ne!(simplify.max_vertices, DEFAULT_MAX_HULL_VERTICES);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for json in [
            r#"{ "resolution": 16 }"#,
            r#"{ "buffer_size": 0 }"#,
            r#"{ "pixel_area": 0 }"#,
            r#"{ "delimiters": "[" }"#,
            r#"{ "simplify": { "max_vertices": 2 } }"#,
            r#"{ "simplify": { "delta_distance_tolerance": 0.0 } }"#,
        ] {
            assert!(
                matches!(HullConfig::from_json_str(json), Err(HullError::InvalidConfig(_))),
                "{} should be rejected",
                json
            );
        }
    }

    #[test]
    fn test_unknown_field_is_a_json_error() {
        assert!(matches!(
            HullConfig::from_json_str(r#"{ "resolutoin": 7 }"#),
            Err(HullError::Json(_))
        ));
    }

    #[test]
    fn test_load_from_file_and_build() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "resolution": 6, "pixel_area": 256, "delimiters": "[,;]" }}"#).unwrap();

        let config = HullConfig::load(file.path()).unwrap();
        let processor = config.geotiff_processor().unwrap();

        assert_eq!(processor.pixel_area(), 256);
        assert!(config.csv_processor().is_ok());
        assert!(config.merger().is_ok());
        assert_eq!(config.writer().format(), OutputFormat::GeoJson);
    }
}

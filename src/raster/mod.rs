/// Windowed raster point extraction
///
/// A raster is read one square window at a time. Every pixel whose first
/// sample is not a no-data sentinel becomes one geographic point, positioned
/// with the affine transform derived from the raster's georeferencing.

use crate::constants::{NO_DATA_HIGH, NO_DATA_LOW};
use crate::error::{HullError, Result};
use crate::grid_index::GeoPoint;
use glam::{DAffine2, DVec2};
use tracing::debug;

pub mod geotiff;
pub mod window;

pub use geotiff::GeoTiffRaster;
pub use window::{Window, WindowGrid};

/// Size and georeferencing of a raster
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterMetadata {
    pub width: u32,
    pub height: u32,
    /// Degrees per pixel along x (longitude) and y (latitude)
    pub pixel_scale: DVec2,
    /// Pixel position (column, row) of the tie point
    pub tie_point_raster: DVec2,
    /// Longitude and latitude of the tie point
    pub tie_point_model: DVec2,
}

/// Pixel-to-geocoordinate mapping for a north-up raster.
///
/// `lon = tie_lon + (x - tie_x) * scale_x`, `lat = tie_lat - (y - tie_y) * scale_y`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelTransform(DAffine2);

impl PixelTransform {
    pub fn from_metadata(metadata: &RasterMetadata) -> Result<Self> {
        let scale = metadata.pixel_scale;
        if !scale.is_finite() || scale.x == 0.0 || scale.y == 0.0 {
            return Err(HullError::UnsupportedRaster(format!(
                "pixel scale must be finite and non-zero, got ({}, {})",
                scale.x, scale.y
            )));
        }

        let linear = DVec2::new(scale.x, -scale.y);
        let translation = metadata.tie_point_model - metadata.tie_point_raster * linear;
        Ok(Self(DAffine2::from_cols(
            DVec2::new(linear.x, 0.0),
            DVec2::new(0.0, linear.y),
            translation,
        )))
    }

    /// Geographic position of the pixel corner at (`x`, `y`)
    pub fn pixel_to_geo(&self, x: u32, y: u32) -> GeoPoint {
        let model = self.0.transform_point2(DVec2::new(x as f64, y as f64));
        GeoPoint::new(model.y, model.x)
    }
}

pub fn is_no_data(sample: u16) -> bool {
    sample == NO_DATA_LOW || sample == NO_DATA_HIGH
}

/// First-sample values of one window, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBlock {
    pub window: Window,
    pub samples: Vec<u16>,
}

pub trait RasterSource {
    fn metadata(&self) -> &RasterMetadata;

    /// Decode every pixel of `window` in one call
    fn read_window(&mut self, window: &Window) -> Result<RasterBlock>;
}

/// Lazy stream of the data pixels of a raster as geographic points.
///
/// Only one window block is held at a time. The first read error is yielded
/// and ends the stream.
pub struct RasterPoints<S: RasterSource> {
    source: S,
    transform: PixelTransform,
    windows: WindowGrid,
    block: Option<RasterBlock>,
    cursor: usize,
    done: bool,
}

impl<S: RasterSource> RasterPoints<S> {
    pub fn new(source: S, window_side: u32) -> Result<Self> {
        let metadata = *source.metadata();
        let transform = PixelTransform::from_metadata(&metadata)?;
        let windows = WindowGrid::new(metadata.width, metadata.height, window_side);
        debug!(
            width = metadata.width,
            height = metadata.height,
            windows = windows.window_count(),
            "scanning raster"
        );
        Ok(Self {
            source,
            transform,
            windows,
            block: None,
            cursor: 0,
            done: false,
        })
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

impl<S: RasterSource> Iterator for RasterPoints<S> {
    type Item = Result<GeoPoint>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if let Some(block) = &self.block {
                while self.cursor < block.samples.len() {
                    let offset = self.cursor;
                    self.cursor += 1;
                    if is_no_data(block.samples[offset]) {
                        continue;
                    }
                    let (x, y) = block.window.pixel_at(offset);
                    return Some(Ok(self.transform.pixel_to_geo(x, y)));
                }
                self.block = None;
            }

            let Some(window) = self.windows.next() else {
                self.done = true;
                return None;
            };
            match self.source.read_window(&window) {
                Ok(block) => {
                    debug!(x = window.x, y = window.y, "read raster window");
                    self.block = Some(block);
                    self.cursor = 0;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

pub const DEFAULT_H3_RESOLUTION: u8 = 8;
pub const MAX_H3_RESOLUTION: u8 = 15;

// Douglas-Peucker defaults, in degrees
pub const DEFAULT_DISTANCE_TOLERANCE: f64 = 0.007;
pub const DEFAULT_DELTA_DISTANCE_TOLERANCE: f64 = 0.001;
pub const DEFAULT_MAX_HULL_VERTICES: usize = 10_000;
pub const MIN_HULL_VERTICES: usize = 4; // closed triangle

// raster scanning
pub const DEFAULT_PIXEL_AREA: u32 = 10_000; // window side in pixels
pub const NO_DATA_LOW: u16 = 0;
pub const NO_DATA_HIGH: u16 = 255;

// GeoTIFF tag ids
pub const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
pub const TAG_MODEL_TIEPOINT: u16 = 33922;

pub const DEFAULT_DELIMITERS: &str = ",";

pub const LONGITUDE_SPAN: f64 = 360.0;
pub const MAX_LONGITUDE: f64 = 180.0;
pub const MAX_LATITUDE: f64 = 90.0;

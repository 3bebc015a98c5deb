/// Grid index abstraction
///
/// The hull pipeline never does hex-grid math itself. It maps points to cells,
/// cells to boundaries and cells to their neighbors through [`GridIndex`], so the
/// H3 backend can be swapped for a deterministic fake in tests.

use crate::error::Result;
use geo_types::Coord;
use serde::{Deserialize, Serialize};

/// Geographic coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl From<GeoPoint> for Coord<f64> {
    fn from(point: GeoPoint) -> Self {
        Coord {
            x: point.longitude,
            y: point.latitude,
        }
    }
}

impl From<Coord<f64>> for GeoPoint {
    fn from(coord: Coord<f64>) -> Self {
        GeoPoint {
            latitude: coord.y,
            longitude: coord.x,
        }
    }
}

/// Opaque identifier of one grid cell at the index's resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(pub u64);

impl From<u64> for CellId {
    fn from(raw: u64) -> Self {
        CellId(raw)
    }
}

impl From<CellId> for u64 {
    fn from(cell: CellId) -> Self {
        cell.0
    }
}

/// Spatial grid service used by the geometry processor.
///
/// Implementations are pure functions of their inputs, so they are shared
/// across the rayon pool during projection.
pub trait GridIndex: Send + Sync {
    /// Cell containing `point` at the configured resolution
    fn cell_for(&self, point: GeoPoint) -> Result<CellId>;

    /// Boundary vertices of `cell`; the ring is not required to be closed
    fn boundary(&self, cell: CellId) -> Result<Vec<GeoPoint>>;

    /// Cells within one step of `cell`, including `cell` itself
    fn neighbors(&self, cell: CellId) -> Result<Vec<CellId>>;
}

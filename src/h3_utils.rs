/// H3 grid index backed by h3o
///
/// Resolution is fixed per instance: every point handed to one hull is
/// bucketed into cells of the same size.

use crate::constants::MAX_H3_RESOLUTION;
use crate::error::{HullError, Result};
use crate::grid_index::{CellId, GeoPoint, GridIndex};
use h3o::{CellIndex, LatLng, Resolution};

/// H3 implementation of [`GridIndex`]
#[derive(Debug, Clone, Copy)]
pub struct H3Grid {
    resolution: Resolution,
}

impl H3Grid {
    pub fn new(resolution: Resolution) -> Self {
        Self { resolution }
    }

    /// Build from a raw resolution level (0 coarsest, 15 finest)
    pub fn from_level(level: u8) -> Result<Self> {
        let resolution = Resolution::try_from(level).map_err(|_| {
            HullError::InvalidConfig(format!(
                "H3 resolution must be between 0 and {}, got {}",
                MAX_H3_RESOLUTION, level
            ))
        })?;
        Ok(Self::new(resolution))
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn cell_index(cell: CellId) -> Result<CellIndex> {
        CellIndex::try_from(cell.0).map_err(|_| HullError::InvalidCell(cell.0))
    }
}

impl GridIndex for H3Grid {
    fn cell_for(&self, point: GeoPoint) -> Result<CellId> {
        let latlng = LatLng::new(point.latitude, point.longitude).map_err(|e| {
            HullError::InvalidCoordinate {
                latitude: point.latitude,
                longitude: point.longitude,
                message: e.to_string(),
            }
        })?;
        Ok(CellId(u64::from(latlng.to_cell(self.resolution))))
    }

    fn boundary(&self, cell: CellId) -> Result<Vec<GeoPoint>> {
        let cell_index = Self::cell_index(cell)?;
        Ok(cell_index
            .boundary()
            .iter()
            .map(|latlng| GeoPoint {
                latitude: latlng.lat(),
                longitude: latlng.lng(),
            })
            .collect())
    }

    fn neighbors(&self, cell: CellId) -> Result<Vec<CellId>> {
        let cell_index = Self::cell_index(cell)?;
        Ok(cell_index
            .grid_disk::<Vec<_>>(1)
            .into_iter()
            .map(|neighbor| CellId(u64::from(neighbor)))
            .collect())
    }
}

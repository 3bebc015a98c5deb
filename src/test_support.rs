/// Deterministic square grid for unit tests
///
/// Cells are axis-aligned squares of `side` degrees. Boundary longitudes are
/// wrapped into [-180, 180] the way a real grid index reports them, so cells
/// spanning the antimeridian come back with a longitude jump.

use crate::error::{HullError, Result};
use crate::grid_index::{CellId, GeoPoint, GridIndex};

#[derive(Debug, Clone, Copy)]
pub struct SquareGrid {
    side: f64,
    origin: f64,
}

impl SquareGrid {
    pub fn new(side: f64) -> Self {
        Self::with_origin(side, 0.0)
    }

    /// Grid whose columns start at `origin` longitude instead of 0
    pub fn with_origin(side: f64, origin: f64) -> Self {
        Self { side, origin }
    }

    pub fn cell_at(&self, column: i64, row: i64) -> CellId {
        let column = column as i32 as u32 as u64;
        let row = row as i32 as u32 as u64;
        CellId((column << 32) | row)
    }

    fn column_row(&self, cell: CellId) -> (i64, i64) {
        ((cell.0 >> 32) as u32 as i32 as i64, cell.0 as u32 as i32 as i64)
    }
}

fn wrap_longitude(longitude: f64) -> f64 {
    if longitude > 180.0 {
        longitude - 360.0
    } else if longitude < -180.0 {
        longitude + 360.0
    } else {
        longitude
    }
}

impl GridIndex for SquareGrid {
    fn cell_for(&self, point: GeoPoint) -> Result<CellId> {
        if !point.latitude.is_finite() || !point.longitude.is_finite() {
            return Err(HullError::InvalidCoordinate {
                latitude: point.latitude,
                longitude: point.longitude,
                message: "non-finite".to_string(),
            });
        }
        let column = ((point.longitude - self.origin) / self.side).floor() as i64;
        let row = (point.latitude / self.side).floor() as i64;
        Ok(self.cell_at(column, row))
    }

    fn boundary(&self, cell: CellId) -> Result<Vec<GeoPoint>> {
        let (column, row) = self.column_row(cell);
        let west = self.origin + column as f64 * self.side;
        let east = self.origin + (column + 1) as f64 * self.side;
        let south = row as f64 * self.side;
        let north = (row + 1) as f64 * self.side;
        Ok(vec![
            GeoPoint::new(south, wrap_longitude(west)),
            GeoPoint::new(south, wrap_longitude(east)),
            GeoPoint::new(north, wrap_longitude(east)),
            GeoPoint::new(north, wrap_longitude(west)),
        ])
    }

    fn neighbors(&self, cell: CellId) -> Result<Vec<CellId>> {
        let (column, row) = self.column_row(cell);
        let mut neighbors = Vec::with_capacity(9);
        for dc in -1..=1 {
            for dr in -1..=1 {
                neighbors.push(self.cell_at(column + dc, row + dr));
            }
        }
        Ok(neighbors)
    }
}

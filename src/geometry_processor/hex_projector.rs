/// Hex cell projector
///
/// Turns a cell id into the closed lon/lat ring of its boundary.

use crate::error::{HullError, Result};
use crate::grid_index::{CellId, GridIndex};
use geo_types::{Coord, LineString};

/// Closed boundary ring (x = longitude, y = latitude) of `cell`
pub fn cell_ring(grid: &dyn GridIndex, cell: CellId) -> Result<LineString<f64>> {
    let boundary = grid.boundary(cell)?;
    if boundary.len() < 3 {
        return Err(HullError::InvalidCell(cell.0));
    }

    let mut coords: Vec<Coord<f64>> = boundary.into_iter().map(Coord::from).collect();
    if coords.first() != coords.last() {
        coords.push(coords[0]);
    }
    Ok(LineString::new(coords))
}

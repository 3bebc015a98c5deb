/// Geometry processor
///
/// Drives the grid index, the polar normalizer and the geometry engine:
/// cells become boundary polygons, polygons are normalized and unioned with
/// whatever hull was accumulated so far, holes are stripped or kept, and the
/// result is optionally simplified down to a vertex budget.

use crate::error::{HullError, Result};
use crate::grid_index::{CellId, GeoPoint, GridIndex};
use crate::h3_utils::H3Grid;
use crate::hull_geometry::HullGeometry;
use crate::polar::{AntimeridianSplitter, PolarNormalizer, Unsplittable, crosses_antimeridian};
use geo::BooleanOps;
use geo_types::{LineString, MultiPolygon, Polygon};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

pub mod hex_projector;
pub mod simplify;

pub use hex_projector::cell_ring;
pub use simplify::{SimplifyConfig, simplify_to_budget};

/// What happens to interior rings of the merged hull
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolePolicy {
    /// Coverage is solid; enclosed gaps are filled
    #[default]
    Remove,
    /// Enclosed gaps are meaningful and kept as interior rings
    Keep,
}

/// Normalized cell polygons ready for union
#[derive(Debug, Clone, Default)]
pub struct Projection {
    pub polygons: Vec<Polygon<f64>>,
    /// Polygons dropped because the normalizer could not split them
    pub skipped: usize,
}

/// Result of merging new parts into the accumulated hull
#[derive(Debug, Clone)]
pub struct Merged {
    pub geometry: HullGeometry,
    pub skipped: usize,
}

pub struct GeometryProcessor {
    grid: Box<dyn GridIndex>,
    normalizer: Box<dyn PolarNormalizer>,
    hole_policy: HolePolicy,
    simplify: Option<SimplifyConfig>,
}

impl GeometryProcessor {
    /// Processor that strips holes and does not simplify
    pub fn new(grid: Box<dyn GridIndex>, normalizer: Box<dyn PolarNormalizer>) -> Self {
        Self {
            grid,
            normalizer,
            hole_policy: HolePolicy::Remove,
            simplify: None,
        }
    }

    /// H3-backed processor at `resolution` with antimeridian splitting
    pub fn h3(resolution: u8) -> Result<Self> {
        Ok(Self::new(
            Box::new(H3Grid::from_level(resolution)?),
            Box::new(AntimeridianSplitter::new()),
        ))
    }

    pub fn with_hole_policy(mut self, hole_policy: HolePolicy) -> Self {
        self.hole_policy = hole_policy;
        self
    }

    /// Turn on convergent simplification after every merge
    pub fn with_simplification(mut self, config: SimplifyConfig) -> Result<Self> {
        config.validate()?;
        self.simplify = Some(config);
        Ok(self)
    }

    pub fn hole_policy(&self) -> HolePolicy {
        self.hole_policy
    }

    pub fn simplification(&self) -> Option<&SimplifyConfig> {
        self.simplify.as_ref()
    }

    pub fn cell_for(&self, point: GeoPoint) -> Result<CellId> {
        self.grid.cell_for(point)
    }

    /// Project cells into normalized polygons.
    ///
    /// When holes are removed, cells whose whole neighbor disk is present
    /// cannot shape the outer boundary and are left out. That shortcut is
    /// disabled for batches touching the antimeridian or a pole, where the
    /// split would open the boundary ring and expose the missing interior.
    pub fn project(&self, cells: &HashSet<CellId>) -> Result<Projection> {
        if cells.is_empty() {
            return Err(HullError::EmptyCellSet);
        }

        let rings: Vec<(CellId, LineString<f64>)> = cells
            .par_iter()
            .map(|&cell| cell_ring(self.grid.as_ref(), cell).map(|ring| (cell, ring)))
            .collect::<Result<_>>()?;

        let rings = if self.hole_policy == HolePolicy::Remove
            && !rings.iter().any(|(_, ring)| crosses_antimeridian(ring))
        {
            self.boundary_cells(rings, cells)?
        } else {
            rings
        };

        let normalized: Vec<std::result::Result<HullGeometry, Unsplittable>> = rings
            .into_par_iter()
            .map(|(_, ring)| self.normalizer.normalize(&Polygon::new(ring, vec![])))
            .collect();

        let mut projection = Projection::default();
        for result in normalized {
            match result {
                Ok(geometry) => projection.polygons.extend(geometry.into_polygons()),
                Err(unsplittable) => {
                    warn!(%unsplittable, "skipping cell polygon");
                    projection.skipped += 1;
                }
            }
        }

        debug!(
            cells = cells.len(),
            polygons = projection.polygons.len(),
            skipped = projection.skipped,
            "projected cells"
        );
        Ok(projection)
    }

    /// Union `new_parts` with `existing`, apply the hole policy, normalize,
    /// then simplify to the vertex budget if one is configured.
    pub fn merge(
        &self,
        new_parts: Vec<Polygon<f64>>,
        existing: Option<HullGeometry>,
    ) -> Result<Merged> {
        if new_parts.is_empty() {
            return match existing {
                Some(geometry) => Ok(Merged {
                    geometry,
                    skipped: 0,
                }),
                None => Err(HullError::EmptyGeometry(
                    "no new polygons and no existing hull to merge".to_string(),
                )),
            };
        }

        let mut parts = new_parts;
        if let Some(existing) = existing {
            parts.extend(existing.into_polygons());
        }

        let merged = HullGeometry::from_polygons(union_all(&parts).0)?;
        let merged = match self.hole_policy {
            HolePolicy::Keep => merged,
            HolePolicy::Remove => fill_holes(merged)?,
        };

        let (normalized, skipped) = self.normalize_geometry(merged)?;
        let geometry = match &self.simplify {
            Some(config) => simplify_to_budget(normalized, config),
            None => normalized,
        };

        Ok(Merged { geometry, skipped })
    }

    fn boundary_cells(
        &self,
        rings: Vec<(CellId, LineString<f64>)>,
        cells: &HashSet<CellId>,
    ) -> Result<Vec<(CellId, LineString<f64>)>> {
        rings
            .into_par_iter()
            .filter_map(|(cell, ring)| match self.has_missing_neighbor(cell, cells) {
                Ok(true) => Some(Ok((cell, ring))),
                Ok(false) => None,
                Err(e) => Some(Err(e)),
            })
            .collect()
    }

    fn has_missing_neighbor(&self, cell: CellId, cells: &HashSet<CellId>) -> Result<bool> {
        Ok(self
            .grid
            .neighbors(cell)?
            .iter()
            .any(|neighbor| !cells.contains(neighbor)))
    }

    fn normalize_geometry(&self, geometry: HullGeometry) -> Result<(HullGeometry, usize)> {
        let mut polygons = Vec::new();
        let mut skipped = 0;
        for polygon in geometry.into_polygons() {
            match self.normalizer.normalize(&polygon) {
                Ok(normalized) => polygons.extend(normalized.into_polygons()),
                Err(unsplittable) => {
                    warn!(%unsplittable, "skipping merged polygon");
                    skipped += 1;
                }
            }
        }
        Ok((HullGeometry::from_polygons(polygons)?, skipped))
    }
}

/// Strip interior rings.
///
/// An island inside a stripped hole would end up overlapping its former
/// surroundings, so multi-part hulls that had holes are unioned once more.
fn fill_holes(geometry: HullGeometry) -> Result<HullGeometry> {
    let had_holes = geometry.interior_ring_count() > 0;
    let solid = geometry.without_holes();
    if !had_holes || solid.polygons().len() < 2 {
        return Ok(solid);
    }
    HullGeometry::from_polygons(union_all(solid.polygons()).0)
}

/// Union of every polygon in `polygons`.
///
/// Pairs are unioned level by level, so each overlay works on operands of
/// similar size instead of growing one accumulator polygon by polygon.
pub fn union_all(polygons: &[Polygon<f64>]) -> MultiPolygon<f64> {
    let mut level: Vec<MultiPolygon<f64>> = polygons
        .iter()
        .map(|polygon| MultiPolygon::new(vec![polygon.clone()]))
        .collect();

    while level.len() > 1 {
        level = level
            .par_chunks(2)
            .map(|pair| {
                pair[1..]
                    .iter()
                    .fold(pair[0].clone(), |acc, other| acc.union(other))
            })
            .collect();
    }
    level.pop().unwrap_or_else(|| MultiPolygon::new(vec![]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::SquareGrid;
    use approx::assert_abs_diff_eq;
    use geo::Area;
    use more_asserts::assert_le;

    fn square_processor() -> GeometryProcessor {
        GeometryProcessor::new(Box::new(SquareGrid::new(1.0)), Box::new(AntimeridianSplitter))
    }

    fn block(grid: &SquareGrid, columns: std::ops::Range<i64>, rows: std::ops::Range<i64>) -> HashSet<CellId> {
        let mut cells = HashSet::new();
        for column in columns {
            for row in rows.clone() {
                cells.insert(grid.cell_at(column, row));
            }
        }
        cells
    }

    #[test]
    fn test_union_all_joins_overlapping_and_keeps_disjoint() {
        let grid = SquareGrid::new(1.0);
        let processor = square_processor().with_hole_policy(HolePolicy::Keep);
        let mut cells = block(&grid, 0..3, 0..3);
        cells.extend(block(&grid, 10..11, 0..1));
        let polygons = processor.project(&cells).unwrap().polygons;
        assert_eq!(polygons.len(), 10);

        let union = union_all(&polygons);

        assert_eq!(union.0.len(), 2);
        assert_abs_diff_eq!(union.unsigned_area(), 10.0, epsilon = 1e-9);
        assert!(union_all(&[]).0.is_empty());
    }

    #[test]
    fn test_empty_cell_set_is_rejected() {
        let processor = square_processor();
        assert!(matches!(processor.project(&HashSet::new()), Err(HullError::EmptyCellSet)));
    }

    #[test]
    fn test_interior_cells_are_not_projected_when_removing_holes() {
        let grid = SquareGrid::new(1.0);
        let cells = block(&grid, 0..5, 0..5);
        let processor = square_processor();

        let projection = processor.project(&cells).unwrap();

        // 25 cells, 9 of them interior
        assert_eq!(projection.polygons.len(), 16);
        assert_eq!(projection.skipped, 0);
    }

    #[test]
    fn test_all_cells_projected_when_keeping_holes() {
        let grid = SquareGrid::new(1.0);
        let cells = block(&grid, 0..5, 0..5);
        let processor = square_processor().with_hole_policy(HolePolicy::Keep);

        let projection = processor.project(&cells).unwrap();
        assert_eq!(projection.polygons.len(), 25);
    }

    #[test]
    fn test_merge_of_boundary_ring_fills_solid_block() {
        let grid = SquareGrid::new(1.0);
        let cells = block(&grid, 0..5, 0..5);
        let processor = square_processor();

        let projection = processor.project(&cells).unwrap();
        let merged = processor.merge(projection.polygons, None).unwrap();

        assert_eq!(merged.geometry.geometry_type(), "Polygon");
        assert_eq!(merged.geometry.interior_ring_count(), 0);
        assert_abs_diff_eq!(merged.geometry.unsigned_area(), 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_merge_unions_with_existing_geometry() {
        let grid = SquareGrid::new(1.0);
        let processor = square_processor();

        let first = processor.project(&block(&grid, 0..2, 0..2)).unwrap();
        let existing = processor.merge(first.polygons, None).unwrap().geometry;

        let second = processor.project(&block(&grid, 2..4, 0..2)).unwrap();
        let merged = processor.merge(second.polygons, Some(existing)).unwrap();

        assert_eq!(merged.geometry.geometry_type(), "Polygon");
        assert_abs_diff_eq!(merged.geometry.unsigned_area(), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_disjoint_blocks_stay_multipolygon() {
        let grid = SquareGrid::new(1.0);
        let mut cells = block(&grid, 0..2, 0..2);
        cells.extend(block(&grid, 10..12, 0..2));
        let processor = square_processor();

        let projection = processor.project(&cells).unwrap();
        let merged = processor.merge(projection.polygons, None).unwrap();

        assert_eq!(merged.geometry.geometry_type(), "MultiPolygon");
        assert_eq!(merged.geometry.polygons().len(), 2);
    }

    #[test]
    fn test_island_inside_filled_hole_is_absorbed() {
        let grid = SquareGrid::new(1.0);
        // 7 x 7 frame, one cell thick, with a single cell island in the middle
        let mut cells = block(&grid, 0..7, 0..7);
        for column in 1..6 {
            for row in 1..6 {
                cells.remove(&grid.cell_at(column, row));
            }
        }
        cells.insert(grid.cell_at(3, 3));
        let processor = square_processor();

        let projection = processor.project(&cells).unwrap();
        let merged = processor.merge(projection.polygons, None).unwrap();

        assert_eq!(merged.geometry.geometry_type(), "Polygon");
        assert_abs_diff_eq!(merged.geometry.unsigned_area(), 49.0, epsilon = 1e-9);
    }

    #[test]
    fn test_keep_holes_preserves_gap() {
        let grid = SquareGrid::new(1.0);
        let mut cells = block(&grid, 0..3, 0..3);
        cells.remove(&grid.cell_at(1, 1));
        let processor = square_processor().with_hole_policy(HolePolicy::Keep);

        let projection = processor.project(&cells).unwrap();
        let merged = processor.merge(projection.polygons, None).unwrap();

        assert_eq!(merged.geometry.interior_ring_count(), 1);
        assert_abs_diff_eq!(merged.geometry.unsigned_area(), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_merge_with_nothing_new_keeps_existing() {
        let grid = SquareGrid::new(1.0);
        let processor = square_processor();
        let projection = processor.project(&block(&grid, 0..2, 0..2)).unwrap();
        let existing = processor.merge(projection.polygons, None).unwrap().geometry;

        let merged = processor.merge(vec![], Some(existing.clone())).unwrap();
        assert_eq!(merged.geometry, existing);

        assert!(matches!(processor.merge(vec![], None), Err(HullError::EmptyGeometry(_))));
    }

    #[test]
    fn test_simplifying_processor_respects_budget() {
        let grid = SquareGrid::new(0.1);
        // staircase diagonal band produces a jagged outline
        let mut cells = HashSet::new();
        for step in 0..60 {
            for width in 0..4 {
                cells.insert(grid.cell_at(step + width, step));
            }
        }
        let processor = GeometryProcessor::new(Box::new(grid), Box::new(AntimeridianSplitter))
            .with_simplification(SimplifyConfig::new(0.0, 0.01, 12))
            .unwrap();

        let projection = processor.project(&cells).unwrap();
        let merged = processor.merge(projection.polygons, None).unwrap();

        assert_le!(merged.geometry.vertex_count(), 12);
    }

    #[test]
    fn test_cells_straddling_antimeridian_are_split() {
        // columns start at x.5, so column 179 spans 179.5..180.5 and wraps
        let grid = SquareGrid::with_origin(1.0, 0.5);
        let mut cells = HashSet::new();
        for row in 0..2 {
            cells.insert(grid.cell_at(178, row));
            cells.insert(grid.cell_at(179, row));
        }
        let processor = GeometryProcessor::new(Box::new(grid), Box::new(AntimeridianSplitter));

        let projection = processor.project(&cells).unwrap();
        let merged = processor.merge(projection.polygons, None).unwrap();

        assert_eq!(merged.geometry.geometry_type(), "MultiPolygon");
        assert_abs_diff_eq!(merged.geometry.unsigned_area(), 4.0, epsilon = 1e-9);
        for polygon in merged.geometry.polygons() {
            for coord in polygon.exterior().coords() {
                assert!(coord.x >= -180.0 && coord.x <= 180.0);
            }
        }
    }
}

/// Vertex-budget simplification
///
/// Douglas-Peucker is run repeatedly on the merged hull with a growing
/// tolerance until the coordinate count fits the configured budget.

use crate::constants::{
    DEFAULT_DELTA_DISTANCE_TOLERANCE, DEFAULT_DISTANCE_TOLERANCE, DEFAULT_MAX_HULL_VERTICES,
    MIN_HULL_VERTICES,
};
use crate::error::{HullError, Result};
use crate::hull_geometry::HullGeometry;
use geo::{Area, BoundingRect, Simplify};
use geo_types::{Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Settings for the convergent simplification loop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifyConfig {
    /// Douglas-Peucker tolerance for the first pass, in degrees
    pub distance_tolerance: f64,
    /// Added to the tolerance after every pass that still exceeds the budget
    pub delta_distance_tolerance: f64,
    /// Maximum coordinates allowed in the output hull
    pub max_vertices: usize,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            distance_tolerance: DEFAULT_DISTANCE_TOLERANCE,
            delta_distance_tolerance: DEFAULT_DELTA_DISTANCE_TOLERANCE,
            max_vertices: DEFAULT_MAX_HULL_VERTICES,
        }
    }
}

impl SimplifyConfig {
    pub fn new(distance_tolerance: f64, delta_distance_tolerance: f64, max_vertices: usize) -> Self {
        Self {
            distance_tolerance,
            delta_distance_tolerance,
            max_vertices,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.distance_tolerance.is_finite() || self.distance_tolerance < 0.0 {
            return Err(HullError::InvalidConfig(format!(
                "distance tolerance must be a non-negative number, got {}",
                self.distance_tolerance
            )));
        }
        if !self.delta_distance_tolerance.is_finite() || self.delta_distance_tolerance <= 0.0 {
            return Err(HullError::InvalidConfig(format!(
                "delta distance tolerance must be positive, got {}",
                self.delta_distance_tolerance
            )));
        }
        if self.max_vertices < MIN_HULL_VERTICES {
            return Err(HullError::InvalidConfig(format!(
                "max vertices must be at least {}, got {}",
                MIN_HULL_VERTICES, self.max_vertices
            )));
        }
        Ok(())
    }
}

/// Simplify `geometry` until its vertex count is within `config.max_vertices`.
///
/// Rings that collapse under the growing tolerance are dropped. A pass that
/// removes nothing doubles the tolerance instead of stepping it. Once the
/// tolerance spans the whole hull and still removes nothing, the smallest
/// rings are dropped until the rest fits. If every ring collapses, or not
/// even the largest exterior fits, the largest polygon is reduced to a
/// triangle.
pub fn simplify_to_budget(geometry: HullGeometry, config: &SimplifyConfig) -> HullGeometry {
    let starting_vertices = geometry.vertex_count();
    let extent = extent_of(&geometry);
    let mut tolerance = config.distance_tolerance;
    let mut current = geometry;
    let mut passes = 0;

    while current.vertex_count() > config.max_vertices {
        passes += 1;
        let Some(next) = simplify_pass(&current, tolerance) else {
            current = HullGeometry::Polygon(largest_triangle(&current));
            break;
        };

        if next.vertex_count() < current.vertex_count() {
            current = next;
            tolerance += config.delta_distance_tolerance;
        } else if tolerance < extent {
            tolerance = (tolerance + config.delta_distance_tolerance)
                .max(tolerance * 2.0)
                .max(extent / 1024.0);
        } else {
            current = keep_largest_rings(&current, config.max_vertices);
            break;
        }
    }

    debug!(
        starting_vertices,
        final_vertices = current.vertex_count(),
        passes,
        "simplified hull to vertex budget"
    );
    current
}

fn simplify_pass(geometry: &HullGeometry, tolerance: f64) -> Option<HullGeometry> {
    let polygons: Vec<Polygon<f64>> = geometry
        .polygons()
        .iter()
        .filter_map(|polygon| {
            let (exterior, interiors) = polygon.simplify(&tolerance).into_inner();
            if is_collapsed(&exterior) {
                return None;
            }
            let interiors = interiors
                .into_iter()
                .filter(|ring| !is_collapsed(ring))
                .collect();
            Some(Polygon::new(exterior, interiors))
        })
        .collect();

    HullGeometry::from_polygons(polygons).ok()
}

fn is_collapsed(ring: &LineString<f64>) -> bool {
    ring.0.len() < MIN_HULL_VERTICES || ring_area(ring) == 0.0
}

fn ring_area(ring: &LineString<f64>) -> f64 {
    Polygon::new(ring.clone(), vec![]).unsigned_area()
}

/// Diagonal of the bounding box; no tolerance beyond it can remove more
fn extent_of(geometry: &HullGeometry) -> f64 {
    geometry
        .to_geometry()
        .bounding_rect()
        .map(|rect| rect.width().hypot(rect.height()))
        .filter(|extent| extent.is_finite())
        .unwrap_or(0.0)
}

/// Keep the largest exteriors that fit `max_vertices`, then the largest holes
/// of the kept polygons in what is left.
fn keep_largest_rings(geometry: &HullGeometry, max_vertices: usize) -> HullGeometry {
    let mut polygons: Vec<&Polygon<f64>> = geometry.polygons().iter().collect();
    polygons.sort_by(|a, b| ring_area(b.exterior()).total_cmp(&ring_area(a.exterior())));

    let mut used = 0;
    let mut kept: Vec<&Polygon<f64>> = Vec::new();
    for polygon in polygons {
        let size = polygon.exterior().0.len();
        if used + size <= max_vertices {
            used += size;
            kept.push(polygon);
        }
    }

    let mut holes: Vec<(usize, &LineString<f64>)> = kept
        .iter()
        .copied()
        .enumerate()
        .flat_map(|(index, polygon)| polygon.interiors().iter().map(move |ring| (index, ring)))
        .collect();
    holes.sort_by(|a, b| ring_area(b.1).total_cmp(&ring_area(a.1)));

    let mut kept_holes: Vec<Vec<LineString<f64>>> = vec![Vec::new(); kept.len()];
    for (index, ring) in holes {
        if used + ring.0.len() <= max_vertices {
            used += ring.0.len();
            kept_holes[index].push(ring.clone());
        }
    }

    let polygons = kept
        .into_iter()
        .zip(kept_holes)
        .map(|(polygon, holes)| Polygon::new(polygon.exterior().clone(), holes))
        .collect();
    HullGeometry::from_polygons(polygons)
        .unwrap_or_else(|_| HullGeometry::Polygon(largest_triangle(geometry)))
}

/// Widest triangle spanned by the exterior of the largest polygon
fn largest_triangle(geometry: &HullGeometry) -> Polygon<f64> {
    let largest = geometry
        .polygons()
        .iter()
        .max_by(|a, b| a.unsigned_area().total_cmp(&b.unsigned_area()))
        .map(|p| p.exterior().0.clone())
        .unwrap_or_default();

    let coords = &largest[..largest.len().saturating_sub(1)];
    let Some(&a) = coords.first() else {
        return Polygon::new(LineString::new(vec![]), vec![]);
    };
    let b = coords
        .iter()
        .copied()
        .max_by(|p, q| distance(a, *p).total_cmp(&distance(a, *q)))
        .unwrap_or(a);
    let c = coords
        .iter()
        .copied()
        .max_by(|p, q| offset_from_line(a, b, *p).total_cmp(&offset_from_line(a, b, *q)))
        .unwrap_or(b);

    Polygon::new(LineString::new(vec![a, b, c]), vec![])
}

fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

// twice the triangle area; proportional to distance from line ab
fn offset_from_line(a: Coord<f64>, b: Coord<f64>, p: Coord<f64>) -> f64 {
    ((b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)).abs()
}

/// Antimeridian and pole normalization
///
/// Grid cell boundaries come back as plain longitude/latitude rings. A ring
/// that crosses the antimeridian jumps from +180 to -180 between two vertices,
/// which a planar geometry engine reads as a polygon stretched around the
/// whole globe. A ring that circles a pole never closes in longitude at all.
/// [`AntimeridianSplitter`] rewrites both cases into polygons that stay inside
/// [-180, 180] x [-90, 90].

use crate::constants::{LONGITUDE_SPAN, MAX_LATITUDE, MAX_LONGITUDE};
use crate::hull_geometry::HullGeometry;
use geo::{Area, BooleanOps, MapCoords, Translate};
use geo_types::{Coord, LineString, Polygon, Rect};
use std::fmt;

/// A polygon the normalizer cannot turn into valid lon/lat geometry.
///
/// Callers skip the polygon rather than aborting the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Unsplittable {
    pub reason: String,
}

impl Unsplittable {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Unsplittable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsplittable polygon: {}", self.reason)
    }
}

/// Rewrites one polygon into an antimeridian/pole-correct equivalent
pub trait PolarNormalizer: Send + Sync {
    fn normalize(&self, polygon: &Polygon<f64>) -> Result<HullGeometry, Unsplittable>;
}

/// Splits polygons at the antimeridian and caps polygons enclosing a pole
#[derive(Debug, Clone, Copy, Default)]
pub struct AntimeridianSplitter;

impl AntimeridianSplitter {
    pub fn new() -> Self {
        Self
    }
}

impl PolarNormalizer for AntimeridianSplitter {
    fn normalize(&self, polygon: &Polygon<f64>) -> Result<HullGeometry, Unsplittable> {
        let exterior = polygon.exterior();
        if exterior.0.len() < 4 {
            return Err(Unsplittable::new("exterior ring has fewer than 4 coordinates"));
        }
        let all_rings = std::iter::once(exterior).chain(polygon.interiors());
        if all_rings.clone().flat_map(|ring| ring.0.iter()).any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(Unsplittable::new("non-finite coordinate"));
        }
        if !all_rings.clone().any(crosses_antimeridian) {
            return Ok(HullGeometry::Polygon(clamp_latitudes(polygon)));
        }

        let (unwrapped, winding) = unwrap_ring(exterior);
        let shell = if winding == 0 {
            unwrapped
        } else if winding.abs() == 1 {
            cap_pole(unwrapped, pole_latitude(exterior))
        } else {
            return Err(Unsplittable::new(format!(
                "exterior ring wraps the globe {} times",
                winding.abs()
            )));
        };

        let reference = shell.0[0].x;
        let mut holes = Vec::with_capacity(polygon.interiors().len());
        for interior in polygon.interiors() {
            let (hole, hole_winding) = unwrap_ring(interior);
            if hole_winding != 0 {
                return Err(Unsplittable::new("interior ring encloses a pole"));
            }
            holes.push(shift_near(hole, reference));
        }

        let frame = Polygon::new(shell, holes);
        let mut parts = Vec::new();
        for offset in [-LONGITUDE_SPAN, 0.0, LONGITUDE_SPAN] {
            let window = Rect::new(
                Coord {
                    x: -MAX_LONGITUDE + offset,
                    y: -MAX_LATITUDE,
                },
                Coord {
                    x: MAX_LONGITUDE + offset,
                    y: MAX_LATITUDE,
                },
            )
            .to_polygon();
            let clipped = frame.intersection(&window);
            parts.extend(
                clipped
                    .0
                    .into_iter()
                    .filter(|part| part.unsigned_area() > 0.0)
                    .map(|part| clamp_latitudes(&part.translate(-offset, 0.0))),
            );
        }

        HullGeometry::from_polygons(parts)
            .map_err(|_| Unsplittable::new("no area left after splitting"))
    }
}

/// Pull latitudes nudged past a pole by overlay snapping back to +/-90
fn clamp_latitudes(polygon: &Polygon<f64>) -> Polygon<f64> {
    polygon.map_coords(|c| Coord {
        x: c.x,
        y: c.y.clamp(-MAX_LATITUDE, MAX_LATITUDE),
    })
}

/// True when any edge jumps more than half the globe in longitude
pub fn crosses_antimeridian(ring: &LineString<f64>) -> bool {
    ring.0
        .windows(2)
        .any(|edge| (edge[1].x - edge[0].x).abs() > MAX_LONGITUDE)
}

/// Make longitudes continuous along the ring.
///
/// Returns the unwrapped ring and how many full turns around the globe the
/// ring makes: 0 for an ordinary polygon, +/-1 for one circling a pole.
fn unwrap_ring(ring: &LineString<f64>) -> (LineString<f64>, i32) {
    let mut offset = 0.0;
    let mut coords = Vec::with_capacity(ring.0.len());
    let mut previous: Option<Coord<f64>> = None;
    for &coord in &ring.0 {
        if let Some(prev) = previous {
            let delta = coord.x - prev.x;
            if delta > MAX_LONGITUDE {
                offset -= LONGITUDE_SPAN;
            } else if delta < -MAX_LONGITUDE {
                offset += LONGITUDE_SPAN;
            }
        }
        coords.push(Coord {
            x: coord.x + offset,
            y: coord.y,
        });
        previous = Some(coord);
    }
    let winding = (offset / LONGITUDE_SPAN).round() as i32;
    (LineString::new(coords), winding)
}

/// Close an open pole-circling path through the pole.
///
/// The unwrapped path ends one full turn away from where it started; walking
/// up to the pole and back along the pole line closes it into a simple ring.
fn cap_pole(path: LineString<f64>, pole: f64) -> LineString<f64> {
    let mut coords = path.0;
    let first = coords[0];
    let last = coords[coords.len() - 1];
    coords.push(Coord { x: last.x, y: pole });
    coords.push(Coord { x: first.x, y: pole });
    coords.push(first);
    LineString::new(coords)
}

fn pole_latitude(ring: &LineString<f64>) -> f64 {
    let mean = ring.0.iter().map(|c| c.y).sum::<f64>() / ring.0.len() as f64;
    if mean >= 0.0 { MAX_LATITUDE } else { -MAX_LATITUDE }
}

/// Shift a ring by whole turns so it starts within half a turn of `reference`
fn shift_near(ring: LineString<f64>, reference: f64) -> LineString<f64> {
    let start = ring.0[0].x;
    let turns = ((reference - start) / LONGITUDE_SPAN).round();
    if turns == 0.0 {
        return ring;
    }
    LineString::new(
        ring.0
            .into_iter()
            .map(|c| Coord {
                x: c.x + turns * LONGITUDE_SPAN,
                y: c.y,
            })
            .collect(),
    )
}

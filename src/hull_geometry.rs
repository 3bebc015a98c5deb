/// Hull geometry value type
///
/// Every stage of the pipeline produces either a single polygon or a
/// multi-polygon. Anything else coming out of the geometry engine or a file is
/// an invariant violation.

use crate::error::{HullError, Result};
use geo::{Area, CoordsIter};
use geo_types::{Geometry, LineString, MultiPolygon, Polygon};

/// Polygon or multi-polygon produced by hull generation
#[derive(Debug, Clone, PartialEq)]
pub enum HullGeometry {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl HullGeometry {
    /// Collapse a list of polygons into the narrowest shape.
    ///
    /// One polygon stays a `Polygon`; several become a `MultiPolygon`.
    pub fn from_polygons(mut polygons: Vec<Polygon<f64>>) -> Result<Self> {
        match polygons.len() {
            0 => Err(HullError::EmptyGeometry(
                "no polygons to build a hull from".to_string(),
            )),
            1 => Ok(HullGeometry::Polygon(polygons.remove(0))),
            _ => Ok(HullGeometry::MultiPolygon(MultiPolygon::new(polygons))),
        }
    }

    pub fn polygons(&self) -> &[Polygon<f64>] {
        match self {
            HullGeometry::Polygon(polygon) => std::slice::from_ref(polygon),
            HullGeometry::MultiPolygon(multi) => &multi.0,
        }
    }

    pub fn into_polygons(self) -> Vec<Polygon<f64>> {
        match self {
            HullGeometry::Polygon(polygon) => vec![polygon],
            HullGeometry::MultiPolygon(multi) => multi.0,
        }
    }

    pub fn geometry_type(&self) -> &'static str {
        match self {
            HullGeometry::Polygon(_) => "Polygon",
            HullGeometry::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// Number of coordinates over every ring, closing coordinates included
    pub fn vertex_count(&self) -> usize {
        match self {
            HullGeometry::Polygon(polygon) => polygon.coords_count(),
            HullGeometry::MultiPolygon(multi) => multi.coords_count(),
        }
    }

    pub fn interior_ring_count(&self) -> usize {
        self.polygons().iter().map(|p| p.interiors().len()).sum()
    }

    /// Planar area in square degrees
    pub fn unsigned_area(&self) -> f64 {
        match self {
            HullGeometry::Polygon(polygon) => polygon.unsigned_area(),
            HullGeometry::MultiPolygon(multi) => multi.unsigned_area(),
        }
    }

    /// Drop every interior ring, treating coverage as solid
    pub fn without_holes(self) -> Self {
        match self {
            HullGeometry::Polygon(polygon) => HullGeometry::Polygon(exterior_only(polygon)),
            HullGeometry::MultiPolygon(multi) => HullGeometry::MultiPolygon(MultiPolygon::new(
                multi.0.into_iter().map(exterior_only).collect(),
            )),
        }
    }

    pub fn to_geometry(&self) -> Geometry<f64> {
        self.clone().into()
    }
}

fn exterior_only(polygon: Polygon<f64>) -> Polygon<f64> {
    let (exterior, _) = polygon.into_inner();
    Polygon::new(exterior, Vec::<LineString<f64>>::new())
}

impl From<HullGeometry> for Geometry<f64> {
    fn from(hull: HullGeometry) -> Self {
        match hull {
            HullGeometry::Polygon(polygon) => Geometry::Polygon(polygon),
            HullGeometry::MultiPolygon(multi) => Geometry::MultiPolygon(multi),
        }
    }
}

impl TryFrom<Geometry<f64>> for HullGeometry {
    type Error = HullError;

    fn try_from(geometry: Geometry<f64>) -> Result<Self> {
        match geometry {
            Geometry::Polygon(polygon) => Ok(HullGeometry::Polygon(polygon)),
            Geometry::MultiPolygon(multi) if multi.0.is_empty() => Err(
                HullError::EmptyGeometry("multi-polygon has no members".to_string()),
            ),
            Geometry::MultiPolygon(multi) => Ok(HullGeometry::MultiPolygon(multi)),
            other => Err(HullError::UnexpectedGeometry(
                geometry_type_name(&other).to_string(),
            )),
        }
    }
}

fn geometry_type_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{point, polygon};

    fn square_with_hole() -> Polygon<f64> {
        polygon!(
            exterior: [
                (x: 0.0, y: 0.0),
                (x: 4.0, y: 0.0),
                (x: 4.0, y: 4.0),
                (x: 0.0, y: 4.0),
            ],
            interiors: [
                [
                    (x: 1.0, y: 1.0),
                    (x: 2.0, y: 1.0),
                    (x: 2.0, y: 2.0),
                    (x: 1.0, y: 2.0),
                ],
            ],
        )
    }

    #[test]
    fn test_without_holes_strips_interiors() {
        let hull = HullGeometry::Polygon(square_with_hole());
        assert_eq!(hull.interior_ring_count(), 1);

        let solid = hull.without_holes();
        assert_eq!(solid.interior_ring_count(), 0);
        assert_eq!(solid.unsigned_area(), 16.0);
    }

    #[test]
    fn test_without_holes_is_idempotent() {
        let solid = HullGeometry::Polygon(square_with_hole()).without_holes();
        let again = solid.clone().without_holes();
        assert_eq!(solid, again);
    }

    #[test]
    fn test_vertex_count_includes_closing_coordinates() {
        let hull = HullGeometry::Polygon(square_with_hole());
        assert_eq!(hull.vertex_count(), 10);
    }

    #[test]
    fn test_from_polygons_narrows_shape() {
        let one = HullGeometry::from_polygons(vec![square_with_hole()]).unwrap();
        assert_eq!(one.geometry_type(), "Polygon");

        let two =
            HullGeometry::from_polygons(vec![square_with_hole(), square_with_hole()]).unwrap();
        assert_eq!(two.geometry_type(), "MultiPolygon");

        assert!(matches!(
            HullGeometry::from_polygons(vec![]),
            Err(HullError::EmptyGeometry(_))
        ));
    }

    #[test]
    fn test_rejects_non_areal_geometry() {
        let err = HullGeometry::try_from(Geometry::Point(point!(x: 1.0, y: 2.0))).unwrap_err();
        assert!(matches!(err, HullError::UnexpectedGeometry(ref name) if name == "Point"));
    }
}

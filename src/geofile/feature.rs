use geo::Coord;
use geojson::JsonObject;

use crate::geometry::ring::{ring_coords, RingDefect};

/// Geometry slot of an exported feature as the drawing layer handed it over.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    /// `null`, absent, or a geometry object too broken to say what it was.
    Missing,
    Parsed(geojson::Geometry),
    /// Declared as Polygon or MultiPolygon but the coordinates did not parse.
    MalformedPolygon(String),
}

/// A drawn or imported subcatchment. The pipeline only ever reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: FeatureGeometry,
    pub attributes: JsonObject,
}

impl From<geojson::Geometry> for Feature {
    fn from(value: geojson::Geometry) -> Self {
        Self {
            geometry: FeatureGeometry::Parsed(value),
            attributes: JsonObject::new(),
        }
    }
}

/// Polygon rings read from a feature, exterior ring first within each polygon.
#[derive(Debug, Clone, PartialEq)]
pub enum PolygonalGeometry {
    Polygon(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Vec<Vec<Coord>>>),
}

impl PolygonalGeometry {
    /// All rings in stored order, polygons of a MultiPolygon one after the other.
    pub fn rings(&self) -> Vec<&[Coord]> {
        match self {
            PolygonalGeometry::Polygon(rings) => rings.iter().map(Vec::as_slice).collect(),
            PolygonalGeometry::MultiPolygon(polygons) => polygons
                .iter()
                .flat_map(|rings| rings.iter().map(Vec::as_slice))
                .collect(),
        }
    }

    pub fn to_geo(&self) -> geo::MultiPolygon {
        fn polygon(rings: &[Vec<Coord>]) -> Option<geo::Polygon> {
            let (exterior, interiors) = rings.split_first()?;
            Some(geo::Polygon::new(
                geo::LineString::new(exterior.clone()),
                interiors
                    .iter()
                    .map(|ring| geo::LineString::new(ring.clone()))
                    .collect(),
            ))
        }
        match self {
            PolygonalGeometry::Polygon(rings) => polygon(rings).into_iter().collect(),
            PolygonalGeometry::MultiPolygon(polygons) => {
                polygons.iter().filter_map(|rings| polygon(rings)).collect()
            }
        }
    }
}

impl Feature {
    /// The feature's polygon rings, or `None` when there is nothing polygonal to export
    /// (missing geometry, another geometry type, or no coordinates at all).
    ///
    /// A polygon whose rings are not lists of coordinate pairs is an error rather than `None`.
    pub fn polygonal_geometry(&self) -> Result<Option<PolygonalGeometry>, RingDefect> {
        let geometry = match &self.geometry {
            FeatureGeometry::Missing => return Ok(None),
            FeatureGeometry::MalformedPolygon(reason) => {
                return Err(RingDefect::Unparsable(reason.clone()))
            }
            FeatureGeometry::Parsed(geometry) => geometry,
        };
        match &geometry.value {
            geojson::Value::Polygon(rings) if !rings.is_empty() => {
                Ok(Some(PolygonalGeometry::Polygon(read_rings(rings, 0)?)))
            }
            geojson::Value::MultiPolygon(polygons) => {
                let mut ring_offset = 0;
                let mut read = Vec::with_capacity(polygons.len());
                for rings in polygons.iter().filter(|rings| !rings.is_empty()) {
                    read.push(read_rings(rings, ring_offset)?);
                    ring_offset += rings.len();
                }
                Ok((!read.is_empty()).then_some(PolygonalGeometry::MultiPolygon(read)))
            }
            _ => Ok(None),
        }
    }
}

fn read_rings(
    rings: &[Vec<geojson::Position>],
    ring_offset: usize,
) -> Result<Vec<Vec<Coord>>, RingDefect> {
    rings
        .iter()
        .enumerate()
        .map(|(index, ring)| ring_coords(ring, ring_offset + index))
        .collect()
}

pub fn geometry_type_name(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

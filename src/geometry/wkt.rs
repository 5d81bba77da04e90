use std::fmt;

use crate::error::GeometryError;
use crate::geofile::feature::geometry_type_name;

use super::ring::{ring_coords, to_closed_ring};

/// Well-Known Text of a single ring polygon.
///
/// Only [`polygon_to_wkt`] constructs it, so the text is always `POLYGON((x y, ...))` built from
/// numbers and can be embedded in a query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolygonWkt(String);

impl PolygonWkt {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PolygonWkt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Convert the exterior ring of a GeoJSON Polygon to WKT.
///
/// Holes are not carried over. Coordinates are written in the order supplied and the ring is
/// closed if needed; no winding correction happens here.
pub fn polygon_to_wkt(geometry: &geojson::Geometry) -> Result<PolygonWkt, GeometryError> {
    let rings = match &geometry.value {
        geojson::Value::Polygon(rings) => rings,
        other => {
            return Err(GeometryError::InvalidGeometry(format!(
                "expected a Polygon, got a {}",
                geometry_type_name(other)
            )))
        }
    };
    let exterior = rings
        .first()
        .filter(|ring| !ring.is_empty())
        .ok_or_else(|| GeometryError::InvalidGeometry("polygon has no coordinates".to_string()))?;
    if rings.len() > 1 {
        log::debug!("Ignoring {} interior ring(s) for WKT", rings.len() - 1);
    }

    let coords = ring_coords(exterior, 0)
        .map_err(|defect| GeometryError::InvalidGeometry(defect.to_string()))?;
    let ring = to_closed_ring(&coords)
        .map_err(|err| GeometryError::InvalidGeometry(err.to_string()))?;

    let points: Vec<String> = ring
        .coords()
        .map(|coord| format!("{} {}", coord.x, coord.y))
        .collect();
    Ok(PolygonWkt(format!("POLYGON(({}))", points.join(", "))))
}

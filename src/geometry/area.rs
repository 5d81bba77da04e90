use geo::{ChamberlainDuquetteArea, LineString, MultiPolygon, Polygon};

/// 1 m² expressed in acres.
pub const ACRES_PER_SQUARE_METER: f64 = 0.000247105;

/// Spherical area in square meters of lon/lat (EPSG:4326) polygons.
///
/// Each ring is measured unsigned and holes are subtracted from their exterior, so the result
/// does not depend on how the rings are wound.
pub fn area_sqm(geometry: &MultiPolygon) -> f64 {
    geometry
        .iter()
        .map(|polygon| {
            let holes: f64 = polygon.interiors().iter().map(ring_area).sum();
            (ring_area(polygon.exterior()) - holes).max(0.0)
        })
        .sum()
}

fn ring_area(ring: &LineString) -> f64 {
    Polygon::new(ring.clone(), vec![]).chamberlain_duquette_unsigned_area()
}

pub fn sqm_to_acres(square_meters: f64) -> f64 {
    square_meters * ACRES_PER_SQUARE_METER
}

/// Round half away from zero to the given number of decimals.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

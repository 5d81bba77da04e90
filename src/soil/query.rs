use crate::geometry::wkt::PolygonWkt;

/// Response format requested from the soil database: JSON rows, first row holds column names.
pub const SDA_RESPONSE_FORMAT: &str = "JSON+COLUMNHEADERS";

/// SQL selecting the map units under a polygon.
///
/// The upstream protocol has no parameter binding, so the WKT is interpolated into the text. This
/// is safe only because [`PolygonWkt`] can only be produced from numeric coordinates.
pub fn build_query(wkt: &PolygonWkt) -> String {
    format!(
        "SELECT mu.mukey, mu.muname, mu.hydgrp \
         FROM mapunit mu \
         WHERE mu.mupolygonkey IN (\
         SELECT mupolygonkey \
         FROM SDA_Get_Mupolygon_From_Geometry('EPSG:4326', '{}'))",
        wkt
    )
}

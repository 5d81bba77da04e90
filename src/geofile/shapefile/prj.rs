/// ESRI WKT of EPSG:4326. Every export is written in this CRS, coordinates are never reprojected.
pub const WGS84_PRJ: &str = "GEOGCS[\"GCS_WGS_1984\",\
DATUM[\"D_WGS_1984\",SPHEROID[\"WGS_1984\",6378137,298.257223563]],\
PRIMEM[\"Greenwich\",0],\
UNIT[\"Degree\",0.017453292519943295]]";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prj_is_single_line_wgs84() {
        assert!(WGS84_PRJ.starts_with("GEOGCS[\"GCS_WGS_1984\",DATUM["));
        assert!(!WGS84_PRJ.contains('\n'));
        assert_eq!(
            WGS84_PRJ.matches('[').count(),
            WGS84_PRJ.matches(']').count()
        );
    }
}

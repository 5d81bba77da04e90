//! Reading the export input handed over by the drawing layer.
//!
//! Accepted shapes are a FeatureCollection, a bare list of features, or a single Feature. Reading
//! is lenient: broken geometries are kept as [`FeatureGeometry::Missing`] or
//! [`FeatureGeometry::MalformedPolygon`] so the exporters can decide what to drop.

use geojson::JsonObject;
use serde_json::Value;

use crate::error::{EncodingError, GeometryError};

use super::feature::{Feature, FeatureGeometry};

pub fn read_features_from_str(contents: &str) -> Result<Vec<Feature>, EncodingError> {
    let value: Value = serde_json::from_str(contents)?;
    read_features(&value)
}

pub fn read_features(input: &Value) -> Result<Vec<Feature>, EncodingError> {
    let features = match input {
        Value::Array(features) => features.iter().map(read_feature).collect(),
        Value::Object(object) => match object.get("type").and_then(Value::as_str) {
            Some("FeatureCollection") => match object.get("features") {
                Some(Value::Array(features)) => features.iter().map(read_feature).collect(),
                _ => {
                    return Err(EncodingError::NotAFeatureCollection(
                        "a FeatureCollection without a features list",
                    ))
                }
            },
            Some("Feature") => vec![read_feature(input)],
            _ => return Err(EncodingError::NotAFeatureCollection("an object")),
        },
        other => return Err(EncodingError::NotAFeatureCollection(json_type_name(other))),
    };
    log::debug!("Read {} feature(s) from export input", features.len());
    Ok(features)
}

fn read_feature(value: &Value) -> Feature {
    let attributes = value
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_else(JsonObject::new);
    let geometry = match value.get("geometry") {
        None | Some(Value::Null) => FeatureGeometry::Missing,
        Some(geometry) => read_geometry(geometry),
    };
    Feature {
        geometry,
        attributes,
    }
}

fn read_geometry(value: &Value) -> FeatureGeometry {
    match serde_json::from_value::<geojson::Geometry>(value.clone()) {
        Ok(geometry) => FeatureGeometry::Parsed(geometry),
        Err(err) => {
            let declared_polygon = matches!(
                value.get("type").and_then(Value::as_str),
                Some("Polygon" | "MultiPolygon")
            );
            let has_coordinates = !matches!(value.get("coordinates"), None | Some(Value::Null));
            if declared_polygon && has_coordinates {
                FeatureGeometry::MalformedPolygon(err.to_string())
            } else {
                log::debug!("Treating unreadable geometry as missing: {}", err);
                FeatureGeometry::Missing
            }
        }
    }
}

/// The geometry to run a soil query for: either a Feature's geometry or a bare geometry object.
pub fn read_query_geometry(input: &Value) -> Result<geojson::Geometry, GeometryError> {
    let geometry = match input.get("type").and_then(Value::as_str) {
        Some("Feature") => input.get("geometry").filter(|geometry| !geometry.is_null()),
        _ => Some(input),
    }
    .ok_or_else(|| GeometryError::InvalidGeometry("feature has no geometry".to_string()))?;
    serde_json::from_value(geometry.clone())
        .map_err(|err| GeometryError::InvalidGeometry(err.to_string()))
}

pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_read_features_from_collection() {
        let input = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"id": "S1", "cn": 74},
                    "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}
                },
                {"type": "Feature", "properties": null, "geometry": null},
                {
                    "type": "Feature",
                    "properties": {},
                    "geometry": {"type": "Polygon", "coordinates": [[[0, 0], "east", [1, 1]]]}
                },
                {"type": "Feature", "geometry": {"type": "Polygon"}}
            ]
        });
        let features = read_features(&input).unwrap();
        assert_eq!(4, features.len());
        assert!(matches!(features[0].geometry, FeatureGeometry::Parsed(_)));
        assert_eq!(Some(&json!("S1")), features[0].attributes.get("id"));
        assert_eq!(FeatureGeometry::Missing, features[1].geometry);
        assert!(features[1].attributes.is_empty());
        assert!(matches!(
            features[2].geometry,
            FeatureGeometry::MalformedPolygon(_)
        ));
        assert_eq!(FeatureGeometry::Missing, features[3].geometry);
    }

    #[test]
    fn test_read_features_accepts_list_and_single_feature() {
        let feature = json!({"type": "Feature", "properties": {}, "geometry": null});
        assert_eq!(2, read_features(&json!([feature, feature])).unwrap().len());
        assert_eq!(1, read_features(&feature).unwrap().len());
    }

    #[test]
    fn test_read_features_rejects_other_input() {
        assert!(matches!(
            read_features(&json!("features")),
            Err(EncodingError::NotAFeatureCollection(_))
        ));
        assert!(matches!(
            read_features(&json!({"type": "FeatureCollection", "features": 3})),
            Err(EncodingError::NotAFeatureCollection(_))
        ));
        assert!(matches!(
            read_features_from_str("{not json"),
            Err(EncodingError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_read_query_geometry() {
        let polygon = json!({"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]});
        let feature = json!({"type": "Feature", "properties": {}, "geometry": polygon});
        assert_eq!(
            read_query_geometry(&polygon).unwrap(),
            read_query_geometry(&feature).unwrap()
        );
        assert!(read_query_geometry(&json!({"type": "Feature", "geometry": null})).is_err());
    }
}

//! CSV and Shapefile export pipelines. Each call is independent and returns a fresh artifact.

use std::{fs, io, path::Path, path::PathBuf};

use geojson::JsonObject;
use serde_json::Value;

use crate::attributes::record::{build_record, AttributeRecord};
use crate::error::{EncodingError, HydroError};
use crate::geofile::csv::encode_csv;
use crate::geofile::feature::Feature;
use crate::geofile::geojson::{json_type_name, read_features};
use crate::geofile::shapefile::bundle::encode_shapefile_bundle;
use crate::geometry::area::area_sqm;

pub const CSV_FILENAME: &str = "subcatchments.csv";
pub const CSV_MEDIA_TYPE: &str = "text/csv";
pub const SHAPEFILE_ARCHIVE_FILENAME: &str = "hydrocad_gis.zip";
pub const ZIP_MEDIA_TYPE: &str = "application/zip";

/// Encoded export ready to be sent or saved.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub filename: &'static str,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn write_to_dir(&self, dir: &Path) -> io::Result<PathBuf> {
        let output_filepath = dir.join(self.filename);
        fs::write(&output_filepath, &self.bytes)?;
        Ok(output_filepath)
    }
}

/// One CSV row source: the attribute bag and, for drawn features, the measured area in m².
struct SubcatchmentInput {
    attributes: JsonObject,
    measured_sqm: Option<f64>,
}

impl From<&Feature> for SubcatchmentInput {
    fn from(feature: &Feature) -> Self {
        let measured_sqm = feature
            .polygonal_geometry()
            .ok()
            .flatten()
            .map(|geometry| area_sqm(&geometry.to_geo()));
        Self {
            attributes: feature.attributes.clone(),
            measured_sqm,
        }
    }
}

/// Accepts `{"subcatchments": [...]}`, a bare list of attribute bags, or a FeatureCollection.
fn read_subcatchments(input: &Value) -> Result<Vec<SubcatchmentInput>, EncodingError> {
    let bags = match input {
        Value::Object(object) if object.contains_key("subcatchments") => {
            match &object["subcatchments"] {
                Value::Array(bags) => bags,
                other => return Err(EncodingError::NotAList(json_type_name(other))),
            }
        }
        Value::Object(object)
            if object.get("type").and_then(Value::as_str) == Some("FeatureCollection") =>
        {
            return Ok(read_features(input)?
                .iter()
                .map(SubcatchmentInput::from)
                .collect())
        }
        Value::Array(bags) => bags,
        other => return Err(EncodingError::NotAList(json_type_name(other))),
    };
    Ok(bags
        .iter()
        .map(|bag| SubcatchmentInput {
            // A non-object entry has no usable attributes and gets all defaults.
            attributes: bag.as_object().cloned().unwrap_or_default(),
            measured_sqm: None,
        })
        .collect())
}

pub fn subcatchment_records(input: &Value) -> Result<Vec<AttributeRecord>, EncodingError> {
    let records = read_subcatchments(input)?
        .iter()
        .enumerate()
        .map(|(index, subcatchment)| {
            let record = build_record(&subcatchment.attributes, index);
            match subcatchment.measured_sqm {
                Some(area_sqm) => record.with_measured_area(area_sqm),
                None => record,
            }
        })
        .collect();
    Ok(records)
}

pub fn export_csv(input: &Value) -> Result<ExportArtifact, HydroError> {
    let records = subcatchment_records(input)?;
    log::info!("Exporting {} subcatchment(s) to CSV", records.len());
    Ok(ExportArtifact {
        filename: CSV_FILENAME,
        media_type: CSV_MEDIA_TYPE,
        bytes: encode_csv(&records)?,
    })
}

pub fn export_shapefile(features: &[Feature]) -> Result<ExportArtifact, HydroError> {
    Ok(ExportArtifact {
        filename: SHAPEFILE_ARCHIVE_FILENAME,
        media_type: ZIP_MEDIA_TYPE,
        bytes: encode_shapefile_bundle(features)?,
    })
}

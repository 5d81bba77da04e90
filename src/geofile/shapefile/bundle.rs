//! Shapefile export: filter the features, lay out the four components, zip them.
//!
//! Everything is built in memory and validated before the first byte is written, so a failed
//! export never yields a partial archive.

use std::io::{Cursor, Write};

use rayon::prelude::*;
use shapefile::dbase::FieldValue;
use zip::write::SimpleFileOptions;

use crate::attributes::record::{build_record, AttributeRecord};
use crate::error::ExportError;
use crate::geofile::feature::Feature;
use crate::geometry::area::{area_sqm, round_to};

use super::dbf::{encode_table, FieldDescriptor};
use super::prj::WGS84_PRJ;
use super::shp::{encode_polygons, PolygonShape};

/// Folder inside the archive holding the components.
pub const ARCHIVE_FOLDER: &str = "hydrocad_subcatchments";
/// Base name shared by the `.shp`, `.shx`, `.dbf` and `.prj` files.
pub const SHAPEFILE_BASE_NAME: &str = "subcatchments";

pub const SUBCATCHMENT_FIELDS: [FieldDescriptor; 7] = [
    FieldDescriptor::text("ID", 64),
    FieldDescriptor::number("Area_sqm", 18, 2),
    FieldDescriptor::number("Area_ac", 18, 4),
    FieldDescriptor::text("HSG", 3),
    FieldDescriptor::number("CN", 3, 0),
    FieldDescriptor::number("Tc_min", 10, 2),
    FieldDescriptor::text("Desc", 254),
];

/// A feature that survived filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFeature {
    /// Position in the caller's feature list.
    pub index: usize,
    pub shape: PolygonShape,
    pub area_sqm: f64,
    pub record: AttributeRecord,
}

impl ExportFeature {
    fn row(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Character(Some(self.record.id.clone())),
            FieldValue::Numeric(Some(round_to(self.area_sqm, 2))),
            FieldValue::Numeric(Some(self.record.area_ac)),
            FieldValue::Character(Some(self.record.hsg.as_str().to_string())),
            FieldValue::Numeric(Some(self.record.curve_number as f64)),
            FieldValue::Numeric(Some(self.record.tc_min)),
            FieldValue::Character(Some(self.record.description.clone())),
        ]
    }
}

fn prepare_feature(index: usize, feature: &Feature) -> Result<Option<ExportFeature>, ExportError> {
    let geometry = feature
        .polygonal_geometry()
        .map_err(|defect| ExportError::InvalidRingStructure {
            feature: index,
            defect,
        })?;
    let Some(geometry) = geometry else {
        log::debug!("Feature {} has no polygon geometry, skipping it", index);
        return Ok(None);
    };

    let area_sqm = area_sqm(&geometry.to_geo());
    if area_sqm == 0.0 {
        log::warn!("Feature {} encloses no area", index);
    }
    let record = build_record(&feature.attributes, index).with_measured_area(area_sqm);
    Ok(Some(ExportFeature {
        index,
        shape: PolygonShape::new(geometry.rings()),
        area_sqm,
        record,
    }))
}

/// Drop features without polygon geometry, then check something is left.
///
/// An invalid ring structure fails the whole export; the first offending feature is reported.
pub fn prepare_features(features: &[Feature]) -> Result<Vec<ExportFeature>, ExportError> {
    let prepared: Vec<Result<Option<ExportFeature>, ExportError>> = features
        .par_iter()
        .enumerate()
        .map(|(index, feature)| prepare_feature(index, feature))
        .collect();
    let prepared = prepared.into_iter().collect::<Result<Vec<_>, _>>()?;

    let survivors: Vec<ExportFeature> = prepared.into_iter().flatten().collect();
    if survivors.len() != features.len() {
        log::warn!(
            "Out of {} features, only {} have polygon geometry and will be exported.",
            features.len(),
            survivors.len()
        );
    }
    if survivors.is_empty() {
        return Err(ExportError::NoValidFeatures);
    }
    Ok(survivors)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapefileComponents {
    pub shp: Vec<u8>,
    pub shx: Vec<u8>,
    pub dbf: Vec<u8>,
    pub prj: &'static str,
}

pub fn encode_components(features: &[ExportFeature]) -> Result<ShapefileComponents, ExportError> {
    let shapes: Vec<PolygonShape> = features.iter().map(|feature| feature.shape.clone()).collect();
    let rows: Vec<Vec<FieldValue>> = features.iter().map(ExportFeature::row).collect();
    let geometry = encode_polygons(&shapes);
    Ok(ShapefileComponents {
        shp: geometry.shp,
        shx: geometry.shx,
        dbf: encode_table(&SUBCATCHMENT_FIELDS, &rows)?,
        prj: WGS84_PRJ,
    })
}

/// Zip the components under `hydrocad_subcatchments/subcatchments.*`.
pub fn bundle_components(components: &ShapefileComponents) -> Result<Vec<u8>, ExportError> {
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let mut archive = zip::ZipWriter::new(Cursor::new(Vec::new()));
    archive.add_directory(ARCHIVE_FOLDER, options)?;
    for (extension, contents) in [
        ("shp", components.shp.as_slice()),
        ("shx", components.shx.as_slice()),
        ("dbf", components.dbf.as_slice()),
        ("prj", components.prj.as_bytes()),
    ] {
        archive.start_file(
            format!("{}/{}.{}", ARCHIVE_FOLDER, SHAPEFILE_BASE_NAME, extension),
            options,
        )?;
        archive.write_all(contents)?;
    }
    Ok(archive.finish()?.into_inner())
}

pub fn encode_shapefile_bundle(features: &[Feature]) -> Result<Vec<u8>, ExportError> {
    let prepared = prepare_features(features)?;
    log::info!("Encoding {} subcatchment(s) as a shapefile", prepared.len());
    bundle_components(&encode_components(&prepared)?)
}

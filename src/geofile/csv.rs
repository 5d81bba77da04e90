use serde::Serialize;

use crate::attributes::record::AttributeRecord;
use crate::error::EncodingError;
use crate::geometry::area::round_to;

/// Column order of the subcatchment table.
pub const CSV_HEADER: [&str; 6] = [
    "Subcatchment",
    "Area (ac)",
    "Curve Number",
    "Tc (min)",
    "Description",
    "Slope (%)",
];

#[derive(Serialize)]
struct CsvRow<'a> {
    subcatchment: &'a str,
    area_ac: f64,
    curve_number: u8,
    tc_min: f64,
    description: &'a str,
    slope_percent: f64,
}

impl<'a> From<&'a AttributeRecord> for CsvRow<'a> {
    fn from(record: &'a AttributeRecord) -> Self {
        Self {
            subcatchment: &record.id,
            area_ac: round_to(record.area_ac, 2),
            curve_number: record.curve_number,
            tc_min: record.tc_min,
            description: &record.description,
            slope_percent: record.slope_percent,
        }
    }
}

/// Encode records as CSV: header row first, then one row per record in input order.
///
/// Fields are quoted only when they contain the delimiter, a quote or a line break.
pub fn encode_csv(records: &[AttributeRecord]) -> Result<Vec<u8>, EncodingError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.serialize(CsvRow::from(record))?;
    }
    writer
        .into_inner()
        .map_err(|err| EncodingError::Csv(err.into_error().into()))
}

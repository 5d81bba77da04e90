//! Error taxonomy for the export and soil query pipelines.
//!
//! Every hard failure carries a stable kind (see [`HydroError::kind`]) so the calling layer can
//! pick a user-facing message without matching on prose.

use thiserror::Error;

use crate::geometry::ring::RingDefect;

/// Caller supplied geometry that cannot be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("Ring has {0} point(s) once closed, at least 4 are required")]
    InsufficientVertices(usize),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
}

#[derive(Debug, Error)]
pub enum SoilQueryError {
    #[error("Column '{0}' not found in soil database response")]
    MissingColumn(String),

    #[error("Unexpected response structure from soil database: {0}")]
    MalformedResponse(String),

    #[error("Soil database at {endpoint} is unreachable")]
    Unreachable {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Soil database at {endpoint} answered with HTTP status {status}")]
    HttpStatus { endpoint: String, status: u16 },

    #[error("Could not set up the soil database client")]
    Client(#[source] reqwest::Error),

    #[error("Soil database endpoint is not configured, set the {0} environment variable")]
    MissingEndpoint(&'static str),
}

/// Failures of the Shapefile export. None of them leave a partial archive behind.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No valid polygon features to export")]
    NoValidFeatures,

    #[error("Feature {feature} has an invalid ring structure: {defect}")]
    InvalidRingStructure {
        feature: usize,
        #[source]
        defect: RingDefect,
    },

    #[error("Could not write the attribute table")]
    AttributeTable(#[from] shapefile::dbase::Error),

    #[error("Invalid attribute field name '{name}': {reason}")]
    FieldName {
        name: &'static str,
        reason: &'static str,
    },

    #[error("Could not assemble the shapefile archive")]
    Archive(#[from] zip::result::ZipError),

    #[error("Could not write the shapefile archive")]
    Io(#[from] std::io::Error),
}

/// The caller handed over input of the wrong shape.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("Expected a list of subcatchment records, got {0}")]
    NotAList(&'static str),

    #[error("Expected a GeoJSON FeatureCollection, Feature or list of features, got {0}")]
    NotAFeatureCollection(&'static str),

    #[error("Input is not valid JSON")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Could not write CSV")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum HydroError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    SoilQuery(#[from] SoilQueryError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

impl HydroError {
    /// Stable discriminant of the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            HydroError::Geometry(GeometryError::InsufficientVertices(_)) => "InsufficientVertices",
            HydroError::Geometry(GeometryError::InvalidGeometry(_)) => "InvalidGeometry",
            HydroError::SoilQuery(err) => match err {
                SoilQueryError::MissingColumn(_) => "MissingColumn",
                SoilQueryError::MalformedResponse(_) => "MalformedResponse",
                SoilQueryError::Unreachable { .. } => "Unreachable",
                SoilQueryError::HttpStatus { .. } => "HttpStatus",
                SoilQueryError::Client(_) => "Client",
                SoilQueryError::MissingEndpoint(_) => "MissingEndpoint",
            },
            HydroError::Export(err) => match err {
                ExportError::NoValidFeatures => "NoValidFeatures",
                ExportError::InvalidRingStructure { .. } => "InvalidRingStructure",
                ExportError::AttributeTable(_) => "AttributeTable",
                ExportError::FieldName { .. } => "FieldName",
                ExportError::Archive(_) => "Archive",
                ExportError::Io(_) => "Io",
            },
            HydroError::Encoding(err) => match err {
                EncodingError::NotAList(_) => "NotAList",
                EncodingError::NotAFeatureCollection(_) => "NotAFeatureCollection",
                EncodingError::InvalidJson(_) => "InvalidJson",
                EncodingError::Csv(_) => "Csv",
            },
        }
    }

    /// HTTP-style status class: 4xx for caller input, 5xx for upstream and internal faults.
    pub fn status_code(&self) -> u16 {
        match self {
            HydroError::Geometry(_) => 400,
            HydroError::SoilQuery(err) => match err {
                SoilQueryError::Unreachable { .. }
                | SoilQueryError::HttpStatus { .. }
                | SoilQueryError::MissingColumn(_)
                | SoilQueryError::MalformedResponse(_) => 502,
                SoilQueryError::Client(_) | SoilQueryError::MissingEndpoint(_) => 500,
            },
            HydroError::Export(err) => match err {
                ExportError::NoValidFeatures | ExportError::InvalidRingStructure { .. } => 400,
                ExportError::AttributeTable(_)
                | ExportError::FieldName { .. }
                | ExportError::Archive(_)
                | ExportError::Io(_) => 500,
            },
            HydroError::Encoding(err) => match err {
                EncodingError::Csv(_) => 500,
                _ => 400,
            },
        }
    }

    /// Message safe to show to a user. Internal faults get a generic text, the original error
    /// stays reachable through `source()` for diagnostics.
    pub fn user_message(&self) -> String {
        match self.status_code() {
            500 => "Internal error while processing the request.".to_string(),
            _ => self.to_string(),
        }
    }
}

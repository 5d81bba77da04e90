use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::attributes::record::Hsg;
use crate::error::SoilQueryError;
use crate::geofile::geojson::json_type_name;

/// Column holding the hydrologic soil group.
pub const HSG_COLUMN: &str = "hydgrp";

/// Tabular soil database response: data rows plus the header name to column index map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SoilQueryResult {
    rows: Vec<Vec<Value>>,
    columns: HashMap<String, usize>,
}

impl SoilQueryResult {
    /// Parse `{"Table": [[header...], [row...], ...]}`.
    pub fn from_response(response: &Value) -> Result<Self, SoilQueryError> {
        let table = match response.get("Table") {
            Some(Value::Array(table)) => table,
            Some(other) => {
                return Err(SoilQueryError::MalformedResponse(format!(
                    "Table is {}, expected a list of rows",
                    json_type_name(other)
                )))
            }
            None => {
                return Err(SoilQueryError::MalformedResponse(
                    "no Table field".to_string(),
                ))
            }
        };

        let mut rows = table.iter().enumerate().map(|(index, row)| match row {
            Value::Array(cells) => Ok(cells.clone()),
            other => Err(SoilQueryError::MalformedResponse(format!(
                "row {} is {}, expected a list of cells",
                index,
                json_type_name(other)
            ))),
        });

        let mut columns = HashMap::new();
        if let Some(header) = rows.next() {
            for (index, name) in header?.iter().enumerate() {
                if let Value::String(name) = name {
                    // Duplicate names resolve to the first occurrence.
                    columns.entry(name.clone()).or_insert(index);
                }
            }
        }
        let rows = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rows, columns })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    /// Non-null `hydgrp` values in row order. No data rows is a successful empty result.
    pub fn hydrologic_groups(&self) -> Result<Vec<String>, SoilQueryError> {
        if self.rows.is_empty() {
            return Ok(Vec::new());
        }
        let column = self
            .column_index(HSG_COLUMN)
            .ok_or_else(|| SoilQueryError::MissingColumn(HSG_COLUMN.to_string()))?;

        let mut groups = Vec::new();
        for (index, row) in self.rows.iter().enumerate() {
            match row.get(column) {
                None | Some(Value::Null) => {}
                Some(Value::String(group)) => groups.push(group.clone()),
                Some(value @ (Value::Number(_) | Value::Bool(_))) => groups.push(value.to_string()),
                Some(other) => {
                    return Err(SoilQueryError::MalformedResponse(format!(
                        "{} in data row {} is {}, expected a scalar",
                        HSG_COLUMN,
                        index + 1,
                        json_type_name(other)
                    )))
                }
            }
        }
        Ok(groups)
    }
}

pub fn resolve_hsg(response: &Value) -> Result<Vec<String>, SoilQueryError> {
    SoilQueryResult::from_response(response)?.hydrologic_groups()
}

/// Soil group standing for the whole polygon.
///
/// Provisional policy: the first value wins. Several soil types under one polygon are neither
/// weighted nor reconciled.
pub fn representative_hsg(groups: &[String]) -> Hsg {
    groups
        .first()
        .map(|group| Hsg::parse(group))
        .unwrap_or_default()
}

/// Soil query answer as returned to the caller.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HsgReport {
    pub hsg_data: Vec<String>,
    pub representative_hsg: String,
}

impl From<Vec<String>> for HsgReport {
    fn from(hsg_data: Vec<String>) -> Self {
        let representative_hsg = representative_hsg(&hsg_data).to_string();
        Self {
            hsg_data,
            representative_hsg,
        }
    }
}

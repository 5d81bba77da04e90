//! Canonical subcatchment attributes built from a free-form attribute bag.
//!
//! Building never fails: a missing or unreadable value falls back to the field's default, so an
//! export succeeds for whatever the user has drawn.

use std::fmt;

use geojson::JsonObject;
use serde_json::Value;

use crate::geometry::area::{round_to, sqm_to_acres};

/// Hydrologic soil group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Hsg {
    A,
    B,
    C,
    D,
    AD,
    BD,
    CD,
    #[default]
    NotAvailable,
}

impl Hsg {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hsg::A => "A",
            Hsg::B => "B",
            Hsg::C => "C",
            Hsg::D => "D",
            Hsg::AD => "A/D",
            Hsg::BD => "B/D",
            Hsg::CD => "C/D",
            Hsg::NotAvailable => "N/A",
        }
    }

    /// Case-insensitive, surrounding whitespace ignored. Anything unknown is `N/A`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "A" => Hsg::A,
            "B" => Hsg::B,
            "C" => Hsg::C,
            "D" => Hsg::D,
            "A/D" => Hsg::AD,
            "B/D" => Hsg::BD,
            "C/D" => Hsg::CD,
            _ => Hsg::NotAvailable,
        }
    }
}

impl fmt::Display for Hsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeRecord {
    pub id: String,
    pub area_ac: f64,
    pub curve_number: u8,
    pub tc_min: f64,
    pub slope_percent: f64,
    pub hsg: Hsg,
    pub description: String,
}

/// Declaration order matches the rows of [`DEFAULTING_TABLE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    AreaAc,
    CurveNumber,
    TcMin,
    SlopePercent,
    Hsg,
    Description,
}

struct FieldRule {
    field: Field,
    keys: &'static [&'static str],
}

/// Accepted keys per field, in lookup order. The first present (non-null, non-blank) key wins;
/// when its value cannot be coerced the field takes its default, later keys are not consulted.
/// The drawing layer, the CSV form and imported shapefiles spell the same attribute differently.
///
/// | field         | default                  |
/// |---------------|--------------------------|
/// | id            | `Sub-<index + 1>`        |
/// | area_ac       | 0, also when negative    |
/// | curve_number  | 0, also outside 0..=100  |
/// | tc_min        | 0, also when negative    |
/// | slope_percent | 0                        |
/// | hsg           | `N/A`                    |
/// | description   | `Generated Feature <id>` |
const DEFAULTING_TABLE: [FieldRule; 7] = [
    FieldRule {
        field: Field::Id,
        keys: &["id", "ID", "Subcatchment", "name"],
    },
    FieldRule {
        field: Field::AreaAc,
        keys: &["area", "area_ac", "Area_ac"],
    },
    FieldRule {
        field: Field::CurveNumber,
        keys: &["cn", "CN", "curve_number", "CurveNumber"],
    },
    FieldRule {
        field: Field::TcMin,
        keys: &["tc", "tc_min", "Tc_min"],
    },
    FieldRule {
        field: Field::SlopePercent,
        keys: &["slope", "slope_percent", "Slope_percent"],
    },
    FieldRule {
        field: Field::Hsg,
        keys: &["hsg", "HSG", "hydgrp"],
    },
    FieldRule {
        field: Field::Description,
        keys: &["description", "Description", "Desc"],
    },
];

fn rule(field: Field) -> &'static FieldRule {
    &DEFAULTING_TABLE[field as usize]
}

/// Values of the field's accepted keys in table order, blanks and nulls skipped.
fn candidates<'a>(raw: &'a JsonObject, field: Field) -> impl Iterator<Item = &'a Value> + 'a {
    rule(field)
        .keys
        .iter()
        .filter_map(move |key| raw.get(*key))
        .filter(|value| match value {
            Value::Null => false,
            Value::String(text) => !text.trim().is_empty(),
            _ => true,
        })
}

fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn number_field(raw: &JsonObject, field: Field, accept: impl Fn(f64) -> bool) -> f64 {
    candidates(raw, field)
        .next()
        .and_then(coerce_number)
        .filter(|value| accept(*value))
        .unwrap_or(0.0)
}

/// Project an attribute bag onto the canonical record. `index` is the feature's position in the
/// caller's list, counted from 0.
pub fn build_record(raw: &JsonObject, index: usize) -> AttributeRecord {
    let id = candidates(raw, Field::Id)
        .next()
        .and_then(coerce_text)
        .unwrap_or_else(|| format!("Sub-{}", index + 1));

    let area_ac = number_field(raw, Field::AreaAc, |value| value >= 0.0);
    let curve_number =
        number_field(raw, Field::CurveNumber, |value| (0.0..=100.0).contains(&value)).round() as u8;
    let tc_min = number_field(raw, Field::TcMin, |value| value >= 0.0);
    let slope_percent = number_field(raw, Field::SlopePercent, |_| true);

    let hsg = candidates(raw, Field::Hsg)
        .next()
        .and_then(Value::as_str)
        .map(Hsg::parse)
        .unwrap_or_default();

    let description = candidates(raw, Field::Description)
        .next()
        .and_then(coerce_text)
        .unwrap_or_else(|| format!("Generated Feature {}", id));

    AttributeRecord {
        id,
        area_ac,
        curve_number,
        tc_min,
        slope_percent,
        hsg,
        description,
    }
}

impl AttributeRecord {
    /// Fill a missing area from the measured geometry area.
    pub fn with_measured_area(mut self, area_sqm: f64) -> Self {
        if self.area_ac <= 0.0 {
            self.area_ac = round_to(sqm_to_acres(area_sqm), 2);
        }
        self
    }
}

//! dBase III attribute table (`.dbf`).

use std::io::Cursor;

use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};

use crate::error::ExportError;

/// Last update date (years since 1900, month, day). Fixed so identical input gives identical bytes.
const LAST_UPDATE: [u8; 3] = [100, 1, 1];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Character,
    Numeric { decimals: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    pub length: u8,
}

impl FieldDescriptor {
    pub const fn text(name: &'static str, length: u8) -> Self {
        Self {
            name,
            kind: FieldKind::Character,
            length,
        }
    }

    pub const fn number(name: &'static str, length: u8, decimals: u8) -> Self {
        Self {
            name,
            kind: FieldKind::Numeric { decimals },
            length,
        }
    }

    /// Fit a value into the field width.
    ///
    /// `dbase` crops anything too long byte-wise, which would cut a character in half or turn
    /// `123456` into `12345`. Text is cut on a character boundary instead, and a number that does
    /// not fit is left blank.
    fn fit(&self, value: &FieldValue) -> FieldValue {
        let width = self.length as usize;
        match (self.kind, value) {
            (FieldKind::Character, FieldValue::Character(Some(text))) => {
                FieldValue::Character(Some(truncate_text(text, width).to_string()))
            }
            (FieldKind::Numeric { decimals }, FieldValue::Numeric(Some(number))) => {
                let fits = number.is_finite()
                    && format!("{:.*}", decimals as usize, number).len() <= width;
                if !fits {
                    log::warn!(
                        "Value {} does not fit field {}, leaving it blank",
                        number,
                        self.name
                    );
                }
                FieldValue::Numeric(fits.then_some(*number))
            }
            _ => value.clone(),
        }
    }
}

fn truncate_text(text: &str, width: usize) -> &str {
    let mut end = text.len().min(width);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

fn table_builder(fields: &[FieldDescriptor]) -> Result<TableWriterBuilder, ExportError> {
    let mut builder = TableWriterBuilder::new();
    for field in fields {
        let name = FieldName::try_from(field.name).map_err(|reason| ExportError::FieldName {
            name: field.name,
            reason,
        })?;
        builder = match field.kind {
            FieldKind::Character => builder.add_character_field(name, field.length),
            FieldKind::Numeric { decimals } => {
                builder.add_numeric_field(name, field.length, decimals)
            }
        };
    }
    Ok(builder)
}

/// Encode a table with one row per record. Every row holds one value per field, in field order.
pub fn encode_table(
    fields: &[FieldDescriptor],
    rows: &[Vec<FieldValue>],
) -> Result<Vec<u8>, ExportError> {
    let mut table = Cursor::new(Vec::new());
    {
        let mut writer = table_builder(fields)?.build_with_dest(&mut table);
        for row in rows {
            debug_assert_eq!(fields.len(), row.len());
            let mut record = Record::default();
            for (field, value) in fields.iter().zip(row) {
                record.insert(field.name.to_string(), field.fit(value));
            }
            writer.write_record(&record)?;
        }
        writer.close()?;
    }
    let mut bytes = table.into_inner();
    if let Some(last_update) = bytes.get_mut(1..4) {
        last_update.copy_from_slice(&LAST_UPDATE);
    }
    Ok(bytes)
}

//! Header and row emission for a planned [`ColumnModel`].
//!
//! Rows are 1-based and chosen by the caller; the session advances its own
//! cursor around these calls.

use crate::address::CellRange;
use crate::coerce::DEFAULT_SEPARATOR;
use crate::error::{SchemaError, SheetError};
use crate::layout::ColumnModel;
use crate::record::{Remarks, SheetRecord};
use crate::tag::{FieldDescriptor, Level};
use crate::traits::{Alignment, SheetBackend};
use crate::value::{CellValue, FieldValue};

/// Write one header cell per emitted descriptor on `row`.
pub fn write_header(
    model: &ColumnModel,
    sheet: &mut dyn SheetBackend,
    row: u32,
) -> Result<(), SheetError> {
    for desc in model.header_cells() {
        let Some(col) = model.output_column(desc) else {
            continue;
        };
        let text = CellValue::Text(desc.header_name.clone());
        write_cell(sheet, row, col, desc.font.as_ref(), text, DEFAULT_SEPARATOR)?;
    }
    Ok(())
}

/// Write `record` on `row`.
///
/// Every map key must have been planned; a key missing from the model is a
/// schema error rather than a silently dropped cell. The same holds for a
/// filled field whose column the model does not place.
pub fn write_row<T: SheetRecord>(
    record: &T,
    model: &ColumnModel,
    sheet: &mut dyn SheetBackend,
    row: u32,
) -> Result<(), SheetError> {
    for desc in model.iter().filter(|d| d.level == Level::Declared) {
        if desc.skip {
            continue;
        }
        let Some(value) = record.field_value(&desc.field_name) else {
            continue;
        };
        match value {
            FieldValue::Scalar(value) => {
                let Some(col) = model.output_column(desc) else {
                    if is_blank(&value) {
                        continue;
                    }
                    return Err(SchemaError::MissingColumn {
                        field: desc.field_name.clone(),
                    }
                    .into());
                };
                write_cell(sheet, row, col, desc.font.as_ref(), value, separator(desc))?;
            }
            FieldValue::Map(entries) => {
                for (key, value) in entries {
                    let child = model.expanded(&desc.field_name, &key).ok_or_else(|| {
                        SchemaError::UnplannedExpandKey {
                            field: desc.field_name.clone(),
                            key: key.clone(),
                        }
                    })?;
                    let Some(col) = model.output_column(child) else {
                        continue;
                    };
                    write_cell(sheet, row, col, desc.font.as_ref(), value, separator(desc))?;
                }
            }
        }
    }
    Ok(())
}

/// Merged banner starting at `row`, covering `remarks.height` rows and
/// `remarks.width` columns. Returns the last row it occupies.
pub fn write_remarks(
    remarks: &Remarks,
    sheet: &mut dyn SheetBackend,
    row: u32,
) -> Result<u32, SheetError> {
    let height = remarks.height.max(1);
    let width = remarks.width.max(1);
    let range = CellRange::new(row, 1, row + height - 1, width);
    sheet.merge(range)?;
    sheet.set_value(row, 1, CellValue::Text(remarks.text.clone()))?;
    sheet.set_alignment(range, Alignment::top_left())?;
    Ok(range.end_row)
}

/// Sentinel written instead of headers when there are no records.
pub fn write_no_data(
    sheet: &mut dyn SheetBackend,
    row: u32,
    text: &str,
    width: u32,
) -> Result<(), SheetError> {
    sheet.set_value(row, 1, CellValue::Text(text.to_string()))?;
    if width > 1 {
        sheet.merge(CellRange::new(row, 1, row, width))?;
    }
    Ok(())
}

fn is_blank(value: &CellValue) -> bool {
    match value {
        CellValue::List(items) => items.is_empty(),
        other => other.is_empty(),
    }
}

fn separator(desc: &FieldDescriptor) -> &str {
    desc.split.as_deref().unwrap_or(DEFAULT_SEPARATOR)
}

fn write_cell(
    sheet: &mut dyn SheetBackend,
    row: u32,
    col: u32,
    font: Option<&crate::tag::Font>,
    value: CellValue,
    sep: &str,
) -> Result<(), SheetError> {
    if is_blank(&value) {
        return Ok(());
    }
    let value = match value {
        CellValue::List(_) => CellValue::Text(value.to_text(sep)),
        other => other,
    };
    match font {
        Some(font) => sheet.set_rich_text(row, col, &value.to_string(), font),
        None => sheet.set_value(row, col, value),
    }
}

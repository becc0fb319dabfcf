//! Decode sheet rows into fresh records.

use crate::address::cell_name;
use crate::coerce::{DEFAULT_SEPARATOR, cell_to_value_split};
use crate::error::SheetError;
use crate::layout::{ColumnModel, plan_for_read};
use crate::record::SheetRecord;
use crate::tag::Level;

/// A physical row that survived blank-row filtering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextRow {
    /// 1-based row number in the sheet.
    pub number: u32,
    pub cells: Vec<String>,
}

/// Drop rows whose cells are all blank after trimming, keeping row numbers.
pub fn filter_blank(rows: Vec<Vec<String>>) -> Vec<TextRow> {
    rows.into_iter()
        .enumerate()
        .filter(|(_, cells)| cells.iter().any(|c| !c.trim().is_empty()))
        .map(|(idx, cells)| TextRow {
            number: idx as u32 + 1,
            cells,
        })
        .collect()
}

/// Rows before the header row: one for a matching remarks banner, plus the
/// gather header's rows.
fn header_offset<T: SheetRecord>(prototype: &T, rows: &[TextRow]) -> usize {
    let mut start = 0;
    if let Some(remarks) = prototype.remarks() {
        let banner = rows
            .first()
            .is_some_and(|row| row.cells.len() == 1 && row.cells[0].trim() == remarks.text.trim());
        if banner {
            #[cfg(feature = "tracing")]
            tracing::debug!("skipping remarks banner");
            start += 1;
        }
    }
    if let Some(gather) = prototype.gather_header() {
        let skip = gather.gather_rows() as usize;
        #[cfg(feature = "tracing")]
        tracing::debug!(rows = skip, "skipping gather header");
        start += skip;
    }
    start
}

/// Column model bound to the header row already present in `rows`, used to
/// append records under it. `None` when no row sits where the header belongs
/// or when it names none of `T`'s columns.
pub(crate) fn existing_header<T: SheetRecord>(
    prototype: &T,
    rows: Vec<Vec<String>>,
) -> Result<Option<ColumnModel>, SheetError> {
    let mut model = plan_for_read::<T>()?;
    let rows = filter_blank(rows);
    let Some(header) = rows.get(header_offset(prototype, &rows)) else {
        return Ok(None);
    };
    model.reconcile(&header.cells);
    Ok(model.any_bound().then_some(model))
}

/// Read every data row of `rows` into a `T`.
///
/// The header row is matched by text, so columns may appear in any order and
/// unknown columns are ignored. The first unconvertible cell aborts the read.
pub fn read<T: SheetRecord>(sheet: &str, rows: Vec<Vec<String>>) -> Result<Vec<T>, SheetError> {
    read_with_model(sheet, rows).map(|(records, _)| records)
}

/// [`read`], also returning the column model reconciled against the header.
pub fn read_with_model<T: SheetRecord>(
    sheet: &str,
    rows: Vec<Vec<String>>,
) -> Result<(Vec<T>, ColumnModel), SheetError> {
    let rows = filter_blank(rows);
    if rows.is_empty() {
        return Err(SheetError::EmptySheet {
            sheet: sheet.to_string(),
        });
    }

    let start = header_offset(&T::default(), &rows);
    let Some(header) = rows.get(start) else {
        return Err(SheetError::EmptySheet {
            sheet: sheet.to_string(),
        });
    };

    let mut model = plan_for_read::<T>()?;
    model.reconcile(&header.cells);
    let bound = model.bound_columns();

    let mut out = Vec::with_capacity(rows.len() - start - 1);
    for row in &rows[start + 1..] {
        let mut record = T::default();
        for (idx, cell) in row.cells.iter().enumerate() {
            let col = idx as u32 + 1;
            let Some(desc) = bound.get(&col) else {
                continue;
            };
            // Map entries exist only for filled cells.
            if desc.level == Level::Expanded && cell.trim().is_empty() {
                continue;
            }
            let address = cell_name(row.number, col);
            let sep = desc.split.as_deref().unwrap_or(DEFAULT_SEPARATOR);
            let value = cell_to_value_split(&desc.kind, cell, &address, sep)?;
            let key = match desc.level {
                Level::Expanded => Some(desc.header_name.as_str()),
                Level::Declared => None,
            };
            if !record.set_field(&desc.field_name, key, value) {
                return Err(SheetError::FieldMismatch {
                    field: desc.field_name.clone(),
                    address,
                });
            }
        }
        out.push(record);
    }
    #[cfg(feature = "tracing")]
    tracing::debug!(sheet, records = out.len(), "read sheet");
    Ok((out, model))
}

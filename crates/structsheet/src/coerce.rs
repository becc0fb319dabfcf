//! Text → value conversion for cells read back from a sheet.
//!
//! Empty cells coerce to the zero value of every numeric and boolean kind so
//! sparse sheets round-trip; malformed non-empty text is always an error
//! carrying the cell address.

use crate::error::SheetError;
use crate::value::{CellKind, CellValue};
use std::str::FromStr;

/// Separator for list cells when a field does not name one.
pub const DEFAULT_SEPARATOR: &str = ",";

/// Convert trimmed cell text to a value of `kind`.
pub fn cell_to_value(kind: &CellKind, cell: &str, address: &str) -> Result<CellValue, SheetError> {
    cell_to_value_split(kind, cell, address, DEFAULT_SEPARATOR)
}

/// Like [`cell_to_value`], splitting list cells on `sep`.
pub fn cell_to_value_split(
    kind: &CellKind,
    cell: &str,
    address: &str,
    sep: &str,
) -> Result<CellValue, SheetError> {
    let cell = cell.trim();
    match kind {
        CellKind::Text => Ok(CellValue::Text(cell.to_string())),
        CellKind::Bool => parse_bool(cell, address),
        CellKind::I8 => signed::<i8>(cell, address, kind),
        CellKind::I16 => signed::<i16>(cell, address, kind),
        CellKind::I32 => signed::<i32>(cell, address, kind),
        CellKind::I64 => signed::<i64>(cell, address, kind),
        CellKind::U8 => unsigned::<u8>(cell, address, kind),
        CellKind::U16 => unsigned::<u16>(cell, address, kind),
        CellKind::U32 => unsigned::<u32>(cell, address, kind),
        CellKind::U64 => unsigned::<u64>(cell, address, kind),
        CellKind::F32 => float::<f32>(cell, address, kind),
        CellKind::F64 => float::<f64>(cell, address, kind),
        CellKind::Optional(inner) => cell_to_value_split(inner, cell, address, sep),
        CellKind::List(inner) => {
            if cell.is_empty() {
                return Ok(CellValue::List(Vec::new()));
            }
            let sep = if sep.is_empty() { DEFAULT_SEPARATOR } else { sep };
            cell.split(sep)
                .map(|item| cell_to_value_split(inner, item, address, sep))
                .collect::<Result<Vec<_>, _>>()
                .map(CellValue::List)
        }
        CellKind::Unsupported(name) => Err(SheetError::UnsupportedKind {
            kind: (*name).to_string(),
        }),
    }
}

fn parse_bool(cell: &str, address: &str) -> Result<CellValue, SheetError> {
    match cell.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Ok(CellValue::Bool(true)),
        "" | "false" | "f" | "0" => Ok(CellValue::Bool(false)),
        _ => Err(SheetError::conversion(address, cell, CellKind::Bool)),
    }
}

fn signed<T>(cell: &str, address: &str, kind: &CellKind) -> Result<CellValue, SheetError>
where
    T: FromStr + Into<i64>,
{
    if cell.is_empty() {
        return Ok(CellValue::Int(0));
    }
    cell.parse::<T>()
        .map(|v| CellValue::Int(v.into()))
        .map_err(|_| SheetError::conversion(address, cell, kind))
}

fn unsigned<T>(cell: &str, address: &str, kind: &CellKind) -> Result<CellValue, SheetError>
where
    T: FromStr + Into<u64>,
{
    if cell.is_empty() {
        return Ok(CellValue::UInt(0));
    }
    cell.parse::<T>()
        .map(|v| CellValue::UInt(v.into()))
        .map_err(|_| SheetError::conversion(address, cell, kind))
}

fn float<T>(cell: &str, address: &str, kind: &CellKind) -> Result<CellValue, SheetError>
where
    T: FromStr + Into<f64>,
{
    if cell.is_empty() {
        return Ok(CellValue::Float(0.0));
    }
    cell.parse::<T>()
        .map(|v| CellValue::Float(v.into()))
        .map_err(|_| SheetError::conversion(address, cell, kind))
}

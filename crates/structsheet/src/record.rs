//! Record types bound to sheets.
//!
//! `#[derive(SheetRecord)]` generates the implementation from `#[excel("...")]`
//! field attributes; hand-written impls are equally valid.

use crate::error::SheetError;
use crate::traits::SheetBackend;
use crate::value::{CellKind, CellValue, FieldValue};

/// How a field's value is laid out across cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldShape {
    /// One cell (scalars, options, split lists).
    Scalar,
    /// One cell per map key (expand fields).
    Map,
}

/// Static description of one declared field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub tag: &'static str,
    pub kind: CellKind,
    pub shape: FieldShape,
}

impl FieldSchema {
    pub fn scalar(name: &'static str, tag: &'static str, kind: CellKind) -> Self {
        Self {
            name,
            tag,
            kind,
            shape: FieldShape::Scalar,
        }
    }

    /// `kind` is the map's value kind.
    pub fn map(name: &'static str, tag: &'static str, kind: CellKind) -> Self {
        Self {
            name,
            tag,
            kind,
            shape: FieldShape::Map,
        }
    }

    /// A field without an annotation; it never reaches a sheet.
    pub fn skipped(name: &'static str) -> Self {
        Self {
            name,
            tag: "",
            kind: CellKind::Unsupported("skipped"),
            shape: FieldShape::Scalar,
        }
    }
}

/// Banner written above the headers and recognised again on read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Remarks {
    pub text: String,
    /// Rows covered by the merged banner.
    pub height: u32,
    /// Columns covered by the merged banner.
    pub width: u32,
}

pub trait HasRemarks {
    fn remarks(&self) -> Remarks;
}

/// Extra header rows (merged group banners and the like) placed above the
/// declared header row.
pub trait GatherHeader {
    /// Rows the gather header occupies, not counting the field header row.
    fn gather_rows(&self) -> u32;

    /// Write the gather header; its first row is `start_row`.
    fn write_gather_header(
        &self,
        sheet: &mut dyn SheetBackend,
        start_row: u32,
    ) -> Result<(), SheetError>;
}

/// A flat struct that can be written to and read from a sheet.
pub trait SheetRecord: Default {
    /// Declared fields, in declaration order.
    fn schema() -> Vec<FieldSchema>;

    fn field_value(&self, field: &str) -> Option<FieldValue>;

    /// Assign a converted cell. `key` is the expand key for map fields.
    /// Returns false when the field is unknown or rejects the value.
    fn set_field(&mut self, field: &str, key: Option<&str>, value: CellValue) -> bool;

    fn remarks(&self) -> Option<Remarks> {
        None
    }

    fn gather_header(&self) -> Option<&dyn GatherHeader> {
        None
    }
}

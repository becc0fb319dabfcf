//! Per-sheet binding state.

use crate::address::CellRange;
use crate::error::SheetError;
use crate::layout::{ColumnModel, plan_for_write};
use crate::reader;
use crate::record::{Remarks, SheetRecord};
use crate::traits::{Alignment, SheetBackend};
use crate::writer;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_NO_DATA_TEXT: &str = "no data";

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetConfig {
    /// Write the header section before the first data row.
    pub auto_header: bool,
    /// Text written instead of a header when a dataset is empty.
    pub no_data_text: String,
    /// Columns the no-data cell is merged across.
    pub no_data_width: u32,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            auto_header: true,
            no_data_text: DEFAULT_NO_DATA_TEXT.to_string(),
            no_data_width: 3,
        }
    }
}

/// One sheet bound to record types.
///
/// Owns the row cursor (last written row), the column model of the most recent
/// write or read, and whether the remarks banner has been written. A `Sheet`
/// is not meant to be shared; it borrows its backend mutably.
pub struct Sheet<B: SheetBackend> {
    backend: B,
    config: SheetConfig,
    model: ColumnModel,
    index: Option<usize>,
    row: u32,
    has_remarks: bool,
}

impl<B: SheetBackend> Sheet<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, SheetConfig::default())
    }

    pub fn with_config(backend: B, config: SheetConfig) -> Self {
        Self {
            backend,
            config,
            model: ColumnModel::default(),
            index: None,
            row: 0,
            has_remarks: false,
        }
    }

    pub(crate) fn at_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub(crate) fn starting_after(mut self, row: u32) -> Self {
        self.row = row;
        self
    }

    pub fn name(&self) -> &str {
        self.backend.name()
    }

    /// Position in the owning workbook, when there is one.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn config(&self) -> &SheetConfig {
        &self.config
    }

    pub fn set_auto_header(&mut self, on: bool) {
        self.config.auto_header = on;
    }

    /// Last row written so far (0 before any write).
    pub fn current_row(&self) -> u32 {
        self.row
    }

    pub fn has_remarks(&self) -> bool {
        self.has_remarks
    }

    /// Column model of the most recent write or read.
    pub fn column_model(&self) -> &ColumnModel {
        &self.model
    }

    /// Number of expand columns in the current model.
    pub fn expand_header_len(&self) -> usize {
        self.model.expand_len()
    }

    /// Write a merged remarks banner below the current row.
    pub fn add_remark(&mut self, remarks: &Remarks) -> Result<(), SheetError> {
        self.row = writer::write_remarks(remarks, &mut self.backend, self.row + 1)?;
        self.has_remarks = true;
        Ok(())
    }

    /// Center and wrap a range, typically a merged gather-header banner.
    pub fn center_range(&mut self, range: CellRange) -> Result<(), SheetError> {
        self.backend.set_alignment(range, Alignment::centered())
    }

    /// Write `records` below the current row.
    ///
    /// An empty slice writes the no-data sentinel. Otherwise the remarks banner
    /// (once per sheet), the gather header and the field header come first,
    /// unless auto-header is off, followed by one row per record in order.
    ///
    /// With auto-header off and a header row already in the sheet, records are
    /// appended under that header: each cell goes to the column whose header
    /// names it, and a value with no such column is a schema error.
    pub fn write<T: SheetRecord>(&mut self, records: &[T]) -> Result<(), SheetError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!(
            "write_sheet",
            sheet = self.backend.name(),
            records = records.len()
        )
        .entered();

        let Some(first) = records.first() else {
            self.row += 1;
            return writer::write_no_data(
                &mut self.backend,
                self.row,
                &self.config.no_data_text,
                self.config.no_data_width,
            );
        };

        let existing = if self.config.auto_header {
            None
        } else {
            reader::existing_header(first, self.backend.rows()?)?
        };

        if !self.has_remarks && existing.is_none() {
            if let Some(remarks) = first.remarks() {
                self.add_remark(&remarks)?;
            }
        }

        self.model = match existing {
            Some(model) => model,
            None => plan_for_write(records)?,
        };

        if self.config.auto_header {
            self.row += 1;
            if let Some(gather) = first.gather_header() {
                gather.write_gather_header(&mut self.backend, self.row)?;
                self.row += gather.gather_rows();
            }
            writer::write_header(&self.model, &mut self.backend, self.row)?;
        }

        for record in records {
            self.row += 1;
            writer::write_row(record, &self.model, &mut self.backend, self.row)?;
        }
        Ok(())
    }

    /// Read the sheet into freshly built records.
    pub fn read<T: SheetRecord>(&mut self) -> Result<Vec<T>, SheetError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("read_sheet", sheet = self.backend.name()).entered();
        let rows = self.backend.rows()?;
        let (records, model) = reader::read_with_model::<T>(self.backend.name(), rows)?;
        self.model = model;
        Ok(records)
    }
}

//! In-memory worksheet. Keeps logical values, fonts, merges and alignment so
//! tests and callers that never touch xlsx can still drive a [`Sheet`].
//!
//! [`Sheet`]: crate::Sheet

use crate::address::CellRange;
use crate::error::SheetError;
use crate::tag::Font;
use crate::traits::{Alignment, SheetBackend};
use crate::value::CellValue;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq)]
pub struct GridCell {
    pub value: CellValue,
    pub font: Option<Font>,
}

#[derive(Clone, Debug, Default)]
pub struct GridSheet {
    name: String,
    cells: BTreeMap<(u32, u32), GridCell>,
    merges: Vec<CellRange>,
    alignments: Vec<(CellRange, Alignment)>,
}

impl GridSheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Build a sheet from text rows; `rows[0]` is row 1.
    pub fn from_rows<R, C>(name: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let mut sheet = Self::new(name);
        for (r, row) in rows.into_iter().enumerate() {
            for (c, text) in row.into_iter().enumerate() {
                let text = text.into();
                if !text.is_empty() {
                    sheet.cells.insert(
                        (r as u32 + 1, c as u32 + 1),
                        GridCell {
                            value: CellValue::Text(text),
                            font: None,
                        },
                    );
                }
            }
        }
        sheet
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&GridCell> {
        self.cells.get(&(row, col))
    }

    pub fn value(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.cell(row, col).map(|c| &c.value)
    }

    /// Cell text as a reader would see it; blank for missing cells.
    pub fn text(&self, row: u32, col: u32) -> String {
        self.value(row, col).map(cell_text).unwrap_or_default()
    }

    pub fn merges(&self) -> &[CellRange] {
        &self.merges
    }

    pub fn alignment_at(&self, row: u32, col: u32) -> Option<Alignment> {
        self.alignments
            .iter()
            .rev()
            .find(|(range, _)| range.contains(row, col))
            .map(|(_, a)| *a)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.cells.keys().fold((0, 0), |(mr, mc), (r, c)| (mr.max(*r), mc.max(*c)))
    }
}

fn cell_text(value: &CellValue) -> String {
    match value {
        CellValue::Bool(true) => "TRUE".to_string(),
        CellValue::Bool(false) => "FALSE".to_string(),
        other => other.to_string(),
    }
}

impl SheetBackend for GridSheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_value(&mut self, row: u32, col: u32, value: CellValue) -> Result<(), SheetError> {
        if value.is_empty() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), GridCell { value, font: None });
        }
        Ok(())
    }

    fn set_rich_text(
        &mut self,
        row: u32,
        col: u32,
        text: &str,
        font: &Font,
    ) -> Result<(), SheetError> {
        self.cells.insert(
            (row, col),
            GridCell {
                value: CellValue::Text(text.to_string()),
                font: Some(font.clone()),
            },
        );
        Ok(())
    }

    fn merge(&mut self, range: CellRange) -> Result<(), SheetError> {
        self.merges.push(range);
        Ok(())
    }

    fn set_alignment(&mut self, range: CellRange, alignment: Alignment) -> Result<(), SheetError> {
        self.alignments.push((range, alignment));
        Ok(())
    }

    fn rows(&self) -> Result<Vec<Vec<String>>, SheetError> {
        let (max_row, _) = self.dimensions();
        let mut rows = vec![Vec::new(); max_row as usize];
        for ((r, c), cell) in &self.cells {
            let text = cell_text(&cell.value);
            if text.is_empty() {
                continue;
            }
            let row = &mut rows[*r as usize - 1];
            let idx = *c as usize - 1;
            if row.len() <= idx {
                row.resize(idx + 1, String::new());
            }
            row[idx] = text;
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_stop_at_last_cell_and_keep_gaps() {
        let mut sheet = GridSheet::new("s");
        sheet.set_value(1, 1, CellValue::Text("a".into())).unwrap();
        sheet.set_value(1, 3, CellValue::Int(3)).unwrap();
        sheet.set_value(3, 2, CellValue::Bool(true)).unwrap();
        let rows = sheet.rows().unwrap();
        assert_eq!(
            rows,
            vec![
                vec!["a".to_string(), String::new(), "3".to_string()],
                Vec::<String>::new(),
                vec![String::new(), "TRUE".to_string()],
            ]
        );
    }

    #[test]
    fn empty_value_clears_cell() {
        let mut sheet = GridSheet::from_rows("s", [["x", "y"]]);
        sheet.set_value(1, 2, CellValue::Empty).unwrap();
        assert_eq!(sheet.text(1, 2), "");
        assert_eq!(sheet.dimensions(), (1, 1));
    }

    #[test]
    fn later_alignment_wins() {
        let mut sheet = GridSheet::new("s");
        sheet
            .set_alignment(CellRange::new(1, 1, 2, 2), Alignment::top_left())
            .unwrap();
        sheet
            .set_alignment(CellRange::new(2, 2, 2, 2), Alignment::centered())
            .unwrap();
        assert_eq!(sheet.alignment_at(1, 1), Some(Alignment::top_left()));
        assert_eq!(sheet.alignment_at(2, 2), Some(Alignment::centered()));
        assert_eq!(sheet.alignment_at(3, 3), None);
    }
}

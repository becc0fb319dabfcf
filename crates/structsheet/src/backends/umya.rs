use crate::address::CellRange;
use crate::error::SheetError;
use crate::tag::Font;
use crate::traits::{Alignment, HorizontalAlign, SheetBackend, VerticalAlign};
use crate::value::CellValue;
use std::collections::BTreeMap;
use umya_spreadsheet::{
    HorizontalAlignmentValues, RichText, TextElement, VerticalAlignmentValues, Worksheet,
};

/// Integers beyond 2^53 lose digits as xlsx numbers, so they are stored as text.
const MAX_EXACT_INT: u64 = 1 << 53;

/// A worksheet inside an open umya workbook.
pub struct UmyaWorksheet<'a> {
    ws: &'a mut Worksheet,
}

impl<'a> UmyaWorksheet<'a> {
    pub fn new(ws: &'a mut Worksheet) -> Self {
        Self { ws }
    }

    pub fn worksheet(&self) -> &Worksheet {
        &*self.ws
    }

    pub fn worksheet_mut(&mut self) -> &mut Worksheet {
        &mut *self.ws
    }

    /// Last row holding a cell, 0 for an empty sheet.
    pub fn last_row(&self) -> u32 {
        self.ws
            .get_cell_collection()
            .iter()
            .map(|cell| *cell.get_coordinate().get_row_num())
            .max()
            .unwrap_or(0)
    }
}

fn umya_font(font: &Font) -> umya_spreadsheet::Font {
    let mut out = umya_spreadsheet::Font::default();
    if let Some(size) = font.size {
        out.set_size(size);
    }
    out.set_bold(font.bold);
    out.set_italic(font.italic);
    out.set_strikethrough(font.strike);
    if let Some(argb) = font.argb() {
        out.get_color_mut().set_argb(argb);
    }
    if let Some(family) = &font.family {
        out.set_name(family.clone());
    }
    if let Some(underline) = &font.underline {
        out.set_underline(underline.clone());
    }
    out
}

fn horizontal(align: HorizontalAlign) -> HorizontalAlignmentValues {
    match align {
        HorizontalAlign::General => HorizontalAlignmentValues::General,
        HorizontalAlign::Left => HorizontalAlignmentValues::Left,
        HorizontalAlign::Center => HorizontalAlignmentValues::Center,
        HorizontalAlign::Right => HorizontalAlignmentValues::Right,
    }
}

fn vertical(align: VerticalAlign) -> VerticalAlignmentValues {
    match align {
        VerticalAlign::Top => VerticalAlignmentValues::Top,
        VerticalAlign::Center => VerticalAlignmentValues::Center,
        VerticalAlign::Bottom => VerticalAlignmentValues::Bottom,
    }
}

impl SheetBackend for UmyaWorksheet<'_> {
    fn name(&self) -> &str {
        self.ws.get_name()
    }

    fn set_value(&mut self, row: u32, col: u32, value: CellValue) -> Result<(), SheetError> {
        // umya uses (col,row)
        let cell = self.ws.get_cell_mut((col, row));
        match value {
            CellValue::Empty => {
                cell.set_blank();
            }
            CellValue::Text(s) => {
                cell.set_value(s);
            }
            CellValue::Bool(b) => {
                cell.set_value_bool(b);
            }
            CellValue::Int(i) if i.unsigned_abs() > MAX_EXACT_INT => {
                cell.set_value_string(i.to_string());
            }
            CellValue::Int(i) => {
                cell.set_value_number(i as f64);
            }
            CellValue::UInt(u) if u > MAX_EXACT_INT => {
                cell.set_value_string(u.to_string());
            }
            CellValue::UInt(u) => {
                cell.set_value_number(u as f64);
            }
            CellValue::Float(f) => {
                cell.set_value_number(f);
            }
            list @ CellValue::List(_) => {
                cell.set_value(list.to_text(crate::coerce::DEFAULT_SEPARATOR));
            }
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
        let mut element = TextElement::default();
        element.set_text(text);
        element.set_run_properties(umya_font(font));
        let mut rich = RichText::default();
        rich.add_rich_text_elements(element);
        self.ws.get_cell_mut((col, row)).set_rich_text(rich);
        Ok(())
    }

    fn merge(&mut self, range: CellRange) -> Result<(), SheetError> {
        self.ws.add_merge_cells(range.to_string());
        Ok(())
    }

    fn set_alignment(&mut self, range: CellRange, alignment: Alignment) -> Result<(), SheetError> {
        for (row, col) in range.cells() {
            let style = self.ws.get_style_mut((col, row));
            let align = style.get_alignment_mut();
            align.set_horizontal(horizontal(alignment.horizontal));
            align.set_vertical(vertical(alignment.vertical));
            align.set_wrap_text(alignment.wrap_text);
        }
        Ok(())
    }

    fn rows(&self) -> Result<Vec<Vec<String>>, SheetError> {
        let mut by_row: BTreeMap<u32, BTreeMap<u32, String>> = BTreeMap::new();
        for cell in self.ws.get_cell_collection() {
            let coord = cell.get_coordinate();
            let text = cell.get_value();
            if text.is_empty() {
                continue;
            }
            by_row
                .entry(*coord.get_row_num())
                .or_default()
                .insert(*coord.get_col_num(), text.into_owned());
        }

        let last = by_row.keys().next_back().copied().unwrap_or(0);
        let mut rows = vec![Vec::new(); last as usize];
        for (row, cells) in by_row {
            let width = cells.keys().next_back().copied().unwrap_or(0) as usize;
            let mut out = vec![String::new(); width];
            for (col, text) in cells {
                out[col as usize - 1] = text;
            }
            rows[row as usize - 1] = out;
        }
        Ok(rows)
    }
}

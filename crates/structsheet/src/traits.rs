use crate::address::CellRange;
use crate::error::SheetError;
use crate::tag::Font;
use crate::value::CellValue;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HorizontalAlign {
    #[default]
    General,
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VerticalAlign {
    Top,
    Center,
    #[default]
    Bottom,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Alignment {
    pub horizontal: HorizontalAlign,
    pub vertical: VerticalAlign,
    pub wrap_text: bool,
}

impl Alignment {
    pub fn centered() -> Self {
        Self {
            horizontal: HorizontalAlign::Center,
            vertical: VerticalAlign::Center,
            wrap_text: true,
        }
    }

    pub fn top_left() -> Self {
        Self {
            horizontal: HorizontalAlign::Left,
            vertical: VerticalAlign::Top,
            wrap_text: true,
        }
    }
}

/// One worksheet as seen by the binding layer: typed cell writes, merges,
/// alignment, and rows of text for reading. Coordinates are 1-based.
pub trait SheetBackend {
    fn name(&self) -> &str;

    fn set_value(&mut self, row: u32, col: u32, value: CellValue) -> Result<(), SheetError>;

    fn set_rich_text(
        &mut self,
        row: u32,
        col: u32,
        text: &str,
        font: &Font,
    ) -> Result<(), SheetError>;

    fn merge(&mut self, range: CellRange) -> Result<(), SheetError>;

    fn set_alignment(&mut self, range: CellRange, alignment: Alignment) -> Result<(), SheetError>;

    /// Every row from row 1 to the last used row as cell text. Each row stops
    /// at its last non-empty cell; rows with no cells are empty vectors.
    fn rows(&self) -> Result<Vec<Vec<String>>, SheetError>;
}

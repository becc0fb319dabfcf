//! Bind plain structs to spreadsheet sheets.
//!
//! Fields carry `#[excel("Header,allowempty,expand:date,split:|,font{bold:true}")]`
//! annotations; `#[derive(SheetRecord)]` turns them into a descriptor table the
//! planner, writer and reader share. Map fields marked `expand` become one
//! column per key found in the data (on write) or in the header row (on read).
//!
//! ```ignore
//! use structsheet::{SheetRecord, Workbook};
//!
//! #[derive(Default, SheetRecord)]
//! struct Person {
//!     #[excel("Name")]
//!     name: String,
//!     #[excel("Age")]
//!     age: u32,
//! }
//!
//! let mut book = Workbook::new("people.xlsx");
//! book.add_sheet("People")?.write(&people)?;
//! book.save()?;
//! ```

extern crate self as structsheet;

pub mod address;
pub mod backends;
pub mod coerce;
pub mod error;
pub mod layout;
pub mod reader;
pub mod record;
pub mod session;
pub mod tag;
pub mod traits;
pub mod value;
#[cfg(feature = "umya")]
pub mod workbook;
pub mod writer;

pub use address::{CellRange, cell_name, column_letters};
pub use backends::GridSheet;
#[cfg(feature = "umya")]
pub use backends::UmyaWorksheet;
pub use error::{SchemaError, SheetError};
pub use layout::ColumnModel;
pub use record::{FieldSchema, FieldShape, GatherHeader, HasRemarks, Remarks, SheetRecord};
pub use session::{Sheet, SheetConfig};
pub use tag::{FieldDescriptor, Font, Level};
pub use traits::{Alignment, HorizontalAlign, SheetBackend, VerticalAlign};
pub use value::{CellKind, CellMap, CellType, CellValue, FieldValue};
#[cfg(feature = "umya")]
pub use workbook::{Download, Workbook, WorkbookConfig};

pub use structsheet_macros::SheetRecord;

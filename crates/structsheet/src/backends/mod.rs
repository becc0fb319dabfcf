pub mod grid;
#[cfg(feature = "umya")]
pub mod umya;

pub use grid::{GridCell, GridSheet};
#[cfg(feature = "umya")]
pub use umya::UmyaWorksheet;

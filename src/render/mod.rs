//! Render output: display list and answer sheets

mod answer_sheet;
mod display;

pub use answer_sheet::{AnswerRow, AnswerSheet};
pub use display::{banner_text, DisplayColumn, DisplayItem, DisplayList, DisplayPage};

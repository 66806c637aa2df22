//! Prova: layout and variant core for printable exams
//!
//! This crate turns an ordered list of rich-text questions into:
//! - A deterministic multi-column, multi-page placement, fragmenting
//!   questions between paragraphs and options when they do not fit
//! - Answer-shuffled variants ("tipos") with a remapped answer key
//!
//! Measuring is abstracted behind [`layout::HeightOracle`] so the engines run
//! the same in the browser and headless.

pub mod document;
mod error;
pub mod layout;
pub mod render;
pub mod variant;
pub mod wasm;

// Re-export WASM types for direct use
pub use wasm::WasmExam;

// Re-export primary types
pub use document::{
    expand, AnswerKey, Gabarito, Question, QuestionId, QuestionKind, SetSelections, Unit,
};
pub use error::{Error, Result};
pub use layout::{
    paginate, FixedOracle, HeaderVariant, HeightOracle, LayoutConfig, Measurements, Page,
    PlacementEntry, QuestionDecorator, TextMetricOracle,
};
pub use render::{AnswerSheet, DisplayItem, DisplayList, DisplayPage};
pub use variant::{derive_seed, generate, remap, OptionPermutation, Variant, VariantConfig};

use serde::{Deserialize, Serialize};

/// Rectangle in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// Everything the caller configures about an exam
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExamConfig {
    pub layout: LayoutConfig,
    pub variants: VariantConfig,
}

/// Output of one pagination run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResult {
    /// Exam version the result was computed from
    pub version: u64,
    /// Variant index (1 for the canonical exam)
    pub variant: u32,
    pub units: Vec<Unit>,
    pub measurements: Measurements,
    pub pages: Vec<Page>,
    /// Printed number of each unit
    pub printed: Vec<Option<u32>>,
    pub layout: LayoutConfig,
}

impl PaginationResult {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn display_list(&self) -> DisplayList {
        DisplayList::build(
            &self.units,
            &self.pages,
            &self.printed,
            &self.measurements,
            &self.layout,
            self.version,
        )
    }
}

/// The exam being assembled: questions, selections and configuration
///
/// Every committed change bumps the version; results carry the version they
/// were computed from so stale ones can be dropped.
#[derive(Debug, Clone, Default)]
pub struct Exam {
    questions: Vec<Question>,
    selections: SetSelections,
    config: ExamConfig,
    units: Vec<Unit>,
    version: u64,
}

impl Exam {
    /// Create an empty exam with the given configuration
    pub fn new(config: ExamConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Create an exam with initial questions
    pub fn with_questions(questions: Vec<Question>, config: ExamConfig) -> Self {
        let mut exam = Self::new(config);
        exam.set_questions(questions);
        exam
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn config(&self) -> &ExamConfig {
        &self.config
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    fn expand(&mut self) {
        self.units = expand(&self.questions, &self.selections);
        self.version += 1;
    }

    /// Replace the question list
    pub fn set_questions(&mut self, questions: Vec<Question>) {
        self.questions = questions;
        self.expand();
    }

    /// Choose which items of a set are printed, in print order
    pub fn select_items(&mut self, set: QuestionId, items: Vec<usize>) {
        self.selections.select(set, items);
        self.expand();
    }

    /// Go back to printing every item of a set
    pub fn clear_selection(&mut self, set: &QuestionId) {
        self.selections.clear(set);
        self.expand();
    }

    /// Commit the blank space after a unit; zero removes it
    pub fn commit_spacer(&mut self, unit: QuestionId, height: f32) {
        if height > 0.0 && height.is_finite() {
            self.config.layout.spacers.insert(unit, height);
        } else {
            self.config.layout.spacers.remove(&unit);
        }
        self.version += 1;
    }

    /// Commit the display width of an image
    pub fn commit_image_width(&mut self, src: impl Into<String>, width: f32) {
        let src = src.into();
        if width > 0.0 && width.is_finite() {
            self.config.layout.image_widths.insert(src, width);
        } else {
            self.config.layout.image_widths.remove(&src);
        }
        self.version += 1;
    }

    pub fn set_columns(&mut self, columns: u8) -> Result<()> {
        if !(1..=2).contains(&columns) {
            return Err(layout::PaginationError::InvalidColumns(columns).into());
        }
        self.config.layout.columns = columns;
        self.version += 1;
        Ok(())
    }

    pub fn set_header(&mut self, header: HeaderVariant) {
        self.config.layout.header = header;
        self.version += 1;
    }

    pub fn set_decorator(&mut self, decorator: QuestionDecorator) {
        self.config.layout.decorator = decorator;
        self.version += 1;
    }

    pub fn set_optimize_layout(&mut self, optimize: bool) {
        self.config.layout.optimize_layout = optimize;
        self.version += 1;
    }

    pub fn set_config(&mut self, config: ExamConfig) {
        self.config = config;
        self.version += 1;
    }

    /// Measure and paginate the exam, or one of its variants
    pub fn paginate<O: HeightOracle + ?Sized>(
        &self,
        oracle: &O,
        variant: Option<&Variant>,
    ) -> Result<PaginationResult> {
        let units = match variant {
            Some(variant) => variant.apply(&self.units)?,
            None => self.units.clone(),
        };
        let layout = &self.config.layout;
        let measurements = oracle.measure(&units, layout)?;
        let pages = paginate(&units, &measurements, layout)?;
        let printed = document::printed_numbers(&units);

        Ok(PaginationResult {
            version: self.version,
            variant: variant.map(|v| v.index).unwrap_or(1),
            units,
            measurements,
            pages,
            printed,
            layout: layout.clone(),
        })
    }

    /// Generate variants; the seed comes from the requesting user, if any
    pub fn variants(&self, count: u32, user_id: Option<&str>) -> Vec<Variant> {
        generate(&self.units, count, derive_seed(user_id), &self.config.variants)
    }

    /// Ids of numbered units in canonical printed order
    pub fn canonical_order(&self) -> Vec<QuestionId> {
        variant::printed_order(&self.units)
    }

    pub fn canonical_answer_key(&self) -> AnswerKey {
        document::canonical_answer_key(&self.units)
    }

    /// Answer key printed with `variant`
    pub fn answer_key(&self, variant: &Variant) -> Result<AnswerKey> {
        variant.check(&self.units)?;
        Ok(remap(
            &self.canonical_answer_key(),
            variant,
            &self.canonical_order(),
        )?)
    }

    pub fn answer_sheet(&self, variant: &Variant) -> Result<AnswerSheet> {
        Ok(AnswerSheet::new(variant.index, &self.answer_key(variant)?))
    }
}

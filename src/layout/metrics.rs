//! Headless height oracle built on font metrics and line breaking

use crate::document::{Block, BlockKind, OptionBlock, Unit};
use crate::layout::engine::{HeaderVariant, LayoutConfig, QuestionDecorator};
use crate::layout::font::FontMetrics;
use crate::layout::line_break::LineBreaker;
use crate::layout::oracle::{HeightOracle, MeasureError, Measurements};

/// Indentation width per list level
pub const INDENT_WIDTH: f32 = 24.0;

/// Room left of an option for its letter
pub const OPTION_GUTTER: f32 = 28.0;

const BLOCKQUOTE_INDENT: f32 = 16.0;
const TABLE_ROW_PADDING: f32 = 8.0;
const RULE_HEIGHT: f32 = 8.0;

/// Estimates rendered heights without a rendering surface
#[derive(Debug, Clone)]
pub struct TextMetricOracle {
    pub font: FontMetrics,
    /// Vertical gap above every unit
    pub unit_gap: f32,
    line_breaker: LineBreaker,
}

impl Default for TextMetricOracle {
    fn default() -> Self {
        Self::new(FontMetrics::default())
    }
}

impl TextMetricOracle {
    pub fn new(font: FontMetrics) -> Self {
        Self {
            font,
            unit_gap: 12.0,
            line_breaker: LineBreaker::new(),
        }
    }

    /// (first page, other pages)
    pub fn header_heights(header: HeaderVariant) -> (f32, f32) {
        match header {
            HeaderVariant::Full => (180.0, 40.0),
            HeaderVariant::Compact => (96.0, 24.0),
            HeaderVariant::Hidden => (0.0, 0.0),
        }
    }

    fn decorator_padding(decorator: QuestionDecorator) -> f32 {
        match decorator {
            QuestionDecorator::Inline => 0.0,
            QuestionDecorator::Boxed => 12.0,
        }
    }

    fn text_height(&self, text: &str, width: f32, line_height: f32) -> f32 {
        self.line_breaker.line_count(text, width, &self.font) as f32 * line_height
    }

    /// Height of one block laid out in `width`, spacing after included
    pub fn block_height(&self, block: &Block, width: f32, config: &LayoutConfig) -> f32 {
        let line_height = self.font.line_height * block.kind.line_height_multiplier();
        let spacing = self.font.line_height * block.kind.spacing_after();

        let body = match &block.kind {
            BlockKind::Image {
                src,
                width: natural_width,
                height: natural_height,
            } => {
                let shown = config
                    .image_width(src)
                    .filter(|w| *w > 0.0)
                    .unwrap_or(*natural_width)
                    .min(width);
                if *natural_width > 0.0 {
                    natural_height * shown / natural_width
                } else {
                    *natural_height
                }
            }
            BlockKind::Rule => RULE_HEIGHT,
            BlockKind::Table { .. } => block
                .text
                .split('\n')
                .map(|row| {
                    self.text_height(row, width - TABLE_ROW_PADDING * 2.0, line_height)
                        + TABLE_ROW_PADDING
                })
                .sum(),
            BlockKind::ListItem { indent_level, .. } => {
                let indent = INDENT_WIDTH * (*indent_level as f32 + 1.0);
                self.text_height(&block.text, width - indent, line_height)
            }
            BlockKind::Blockquote => {
                self.text_height(&block.text, width - BLOCKQUOTE_INDENT, line_height)
            }
            BlockKind::Paragraph | BlockKind::Heading { .. } | BlockKind::Code => {
                self.text_height(&block.text, width, line_height)
            }
        };

        body.max(0.0) + spacing
    }

    /// Height of one option next to its letter
    pub fn option_height(&self, option: &OptionBlock, width: f32, config: &LayoutConfig) -> f32 {
        let width = width - OPTION_GUTTER;
        if option.blocks.is_empty() {
            return self.font.line_height;
        }
        option
            .blocks
            .iter()
            .map(|block| self.block_height(block, width, config))
            .sum()
    }

    fn unit_sub_heights(&self, unit: &Unit, config: &LayoutConfig) -> Vec<f32> {
        let width = config.column_width();
        let mut heights: Vec<f32> = unit
            .text_blocks
            .iter()
            .map(|block| self.block_height(block, width, config))
            .chain(
                unit.options
                    .iter()
                    .map(|option| self.option_height(option, width, config)),
            )
            .collect();

        if let Some(first) = heights.first_mut() {
            *first += self.unit_gap + Self::decorator_padding(config.decorator);
        }
        heights
    }
}

impl HeightOracle for TextMetricOracle {
    fn measure(&self, units: &[Unit], config: &LayoutConfig) -> Result<Measurements, MeasureError> {
        let sub_heights = units
            .iter()
            .map(|unit| self.unit_sub_heights(unit, config))
            .collect();
        let (first_page, other_pages) = Self::header_heights(config.header);

        let measurements =
            Measurements::from_sub_heights(units, sub_heights, first_page, other_pages, config);
        measurements.validate(units)?;
        Ok(measurements)
    }
}

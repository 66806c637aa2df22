//! Block-level content of a question

use serde::Serialize;

/// Type of list marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ListMarker {
    Bullet,
    Numbered { ordinal: u32 },
}

/// The kind of block element
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BlockKind {
    /// Regular paragraph
    Paragraph,
    /// Heading with level (1-6)
    Heading { level: u8 },
    /// List item, one per `listItem` node
    #[serde(rename_all = "camelCase")]
    ListItem { indent_level: u8, marker: ListMarker },
    /// Image with its natural size in pixels
    Image { src: String, width: f32, height: f32 },
    /// Table measured as a stack of rows
    Table { rows: u16 },
    Blockquote,
    Code,
    /// Horizontal rule
    Rule,
}

impl Default for BlockKind {
    fn default() -> Self {
        BlockKind::Paragraph
    }
}

impl BlockKind {
    /// Get the line height multiplier for this block kind
    pub fn line_height_multiplier(&self) -> f32 {
        match self {
            BlockKind::Heading { level } => match level {
                1 => 1.5,
                2 => 1.4,
                3 => 1.3,
                _ => 1.2,
            },
            _ => 1.0,
        }
    }

    /// Get the spacing after this block (in line heights)
    pub fn spacing_after(&self) -> f32 {
        match self {
            BlockKind::Paragraph | BlockKind::Blockquote | BlockKind::Code => 0.5,
            BlockKind::Heading { .. } => 0.5,
            BlockKind::ListItem { .. } => 0.25,
            BlockKind::Image { .. } | BlockKind::Table { .. } => 0.5,
            BlockKind::Rule => 0.0,
        }
    }
}

/// A block-level sub-unit of a question: one paragraph, list item, image...
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub kind: BlockKind,
    /// Plain text extracted from the rich-text node
    pub text: String,
}

impl Block {
    /// Create a new paragraph block
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            text: text.into(),
        }
    }

    /// Create a new heading block
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Heading {
                level: level.clamp(1, 6),
            },
            text: text.into(),
        }
    }

    /// Create a new list item block
    pub fn list_item(indent_level: u8, marker: ListMarker, text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::ListItem {
                indent_level,
                marker,
            },
            text: text.into(),
        }
    }

    /// Create a new image block
    pub fn image(src: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            kind: BlockKind::Image {
                src: src.into(),
                width,
                height,
            },
            text: String::new(),
        }
    }
}

/// One alternative of a multiple-choice or true/false question
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionBlock {
    /// Position of this option in the canonical document (0-based)
    pub original_index: u8,
    /// Option content, usually a single paragraph
    pub blocks: Vec<Block>,
}

impl OptionBlock {
    pub fn new(original_index: u8, blocks: Vec<Block>) -> Self {
        Self {
            original_index,
            blocks,
        }
    }

    /// Plain text of the option, blocks joined by newlines
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .filter(|b| !b.text.is_empty())
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

//! Rich-text document tree as produced by the question editor

use super::block::{Block, BlockKind, ListMarker, OptionBlock};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Node of a ProseMirror-style document: `{ type, attrs, content, text }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RichNode {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attrs: Map<String, Value>,
    #[serde(default)]
    pub content: Vec<RichNode>,
    #[serde(default)]
    pub text: Option<String>,
}

impl RichNode {
    /// Parse a document value. Returns `None` unless the root is a `doc` node.
    pub fn parse_document(value: &Value) -> Option<RichNode> {
        let node = RichNode::deserialize(value).ok()?;
        (node.kind == "doc").then_some(node)
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }

    pub fn attr_f32(&self, key: &str) -> Option<f32> {
        match self.attrs.get(key)? {
            Value::Number(n) => n.as_f64().map(|v| v as f32),
            Value::String(s) => s.trim_end_matches("px").parse().ok(),
            _ => None,
        }
    }

    /// First direct child of the given type
    pub fn child(&self, kind: &str) -> Option<&RichNode> {
        self.content.iter().find(|c| c.is(kind))
    }

    /// Concatenated text of this subtree; block children are separated by newlines
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out.trim_end_matches('\n').to_string()
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
            return;
        }
        if self.is("hardBreak") {
            out.push('\n');
            return;
        }
        let inline = self.content.iter().all(|c| c.is("text") || c.is("hardBreak"));
        for child in &self.content {
            child.collect_text(out);
            if !inline && !out.ends_with('\n') {
                out.push('\n');
            }
        }
    }

    /// Flatten this node's block-level children into measurable blocks
    pub fn blocks(&self) -> Vec<Block> {
        let mut blocks = Vec::new();
        for child in &self.content {
            push_blocks(child, 0, &mut blocks);
        }
        blocks
    }

    /// Options of an `options` node, in document order
    pub fn options(&self) -> Vec<OptionBlock> {
        self.content
            .iter()
            .filter(|c| c.is("option"))
            .enumerate()
            .map(|(idx, option)| {
                let mut blocks = option.blocks();
                // Options written as bare text nodes
                if blocks.is_empty() {
                    let text = option.plain_text();
                    if !text.is_empty() {
                        blocks.push(Block::paragraph(text));
                    }
                }
                OptionBlock::new(idx.min(u8::MAX as usize) as u8, blocks)
            })
            .collect()
    }
}

fn push_blocks(node: &RichNode, indent: u8, out: &mut Vec<Block>) {
    match node.kind.as_str() {
        "paragraph" => out.push(Block::paragraph(node.plain_text())),
        "heading" => {
            let level = node.attr_f32("level").unwrap_or(1.0) as u8;
            out.push(Block::heading(level, node.plain_text()));
        }
        "bulletList" | "orderedList" => {
            let start = node.attr_f32("start").unwrap_or(1.0).max(1.0) as u32;
            for (idx, item) in node.content.iter().filter(|c| c.is("listItem")).enumerate() {
                let marker = if node.is("orderedList") {
                    ListMarker::Numbered {
                        ordinal: start + idx as u32,
                    }
                } else {
                    ListMarker::Bullet
                };
                let own_text = item
                    .content
                    .iter()
                    .filter(|c| !c.is("bulletList") && !c.is("orderedList"))
                    .map(RichNode::plain_text)
                    .collect::<Vec<_>>()
                    .join("\n");
                out.push(Block::list_item(indent, marker, own_text));
                for nested in item
                    .content
                    .iter()
                    .filter(|c| c.is("bulletList") || c.is("orderedList"))
                {
                    push_blocks(nested, indent.saturating_add(1), out);
                }
            }
        }
        "image" => {
            let src = node.attr_str("src").unwrap_or_default();
            out.push(Block::image(
                src,
                node.attr_f32("width").unwrap_or(0.0),
                node.attr_f32("height").unwrap_or(0.0),
            ));
        }
        "table" => {
            let rows: Vec<String> = node
                .content
                .iter()
                .filter(|c| c.is("tableRow"))
                .map(|row| {
                    row.content
                        .iter()
                        .map(|cell| cell.plain_text().replace('\n', " "))
                        .collect::<Vec<_>>()
                        .join(" | ")
                })
                .collect();
            out.push(Block {
                kind: BlockKind::Table {
                    rows: rows.len().min(u16::MAX as usize) as u16,
                },
                text: rows.join("\n"),
            });
        }
        "blockquote" => out.push(Block {
            kind: BlockKind::Blockquote,
            text: node.plain_text(),
        }),
        "codeBlock" => out.push(Block {
            kind: BlockKind::Code,
            text: node.plain_text(),
        }),
        "horizontalRule" => out.push(Block {
            kind: BlockKind::Rule,
            text: String::new(),
        }),
        // Options are measured separately from the statement
        "options" => {}
        // Wrappers such as `statement` contribute their children
        "statement" => {
            for child in &node.content {
                push_blocks(child, indent, out);
            }
        }
        "text" => {
            if let Some(text) = node.text.as_deref().filter(|t| !t.trim().is_empty()) {
                out.push(Block::paragraph(text));
            }
        }
        _ => {
            let text = node.plain_text();
            if !text.trim().is_empty() {
                log::trace!("unknown node type {:?} measured as paragraph", node.kind);
                out.push(Block::paragraph(text));
            }
        }
    }
}

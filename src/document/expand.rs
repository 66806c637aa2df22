//! Expansion of questions into measurable units

use super::block::{Block, OptionBlock};
use super::node::RichNode;
use super::unit::{Unit, UnitRole};
use super::{Gabarito, Question, QuestionId, QuestionKind, MAX_OPTIONS};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

/// Items chosen for each set question (1-based item indexes, in print order)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SetSelections(FxHashMap<QuestionId, Vec<usize>>);

impl SetSelections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection for a set
    pub fn select(&mut self, set: QuestionId, items: Vec<usize>) {
        self.0.insert(set, items);
    }

    /// Forget the selection; the set falls back to all of its items
    pub fn clear(&mut self, set: &QuestionId) {
        self.0.remove(set);
    }

    pub fn get(&self, set: &QuestionId) -> Option<&[usize]> {
        self.0.get(set).map(Vec::as_slice)
    }
}

/// Reasons a question is dropped from the exam
#[derive(Debug, Error, PartialEq)]
enum Malformed {
    #[error("document root is not a doc node")]
    NotADocument,
    #[error("statement has no content")]
    EmptyStatement,
    #[error("expected at least 2 options, found {0}")]
    TooFewOptions(usize),
    #[error("{0} options cannot be lettered A-Z")]
    TooManyOptions(usize),
    #[error("set has no base text")]
    EmptyBaseText,
    #[error("set has no usable items")]
    NoItems,
    #[error("none of the selected items exist in the set")]
    NoSelectedItems,
}

/// Statement and options of a question or set item
struct Parts {
    kind: QuestionKind,
    gabarito: Option<Gabarito>,
    text_blocks: Vec<Block>,
    options: Vec<OptionBlock>,
}

/// Expand questions into units, in order.
///
/// Malformed questions are logged and dropped so one bad document does not
/// block the print job.
pub fn expand(questions: &[Question], selections: &SetSelections) -> Vec<Unit> {
    let mut units = Vec::with_capacity(questions.len());

    for question in questions {
        let expanded = match question.kind {
            QuestionKind::Set => expand_set(question, selections),
            _ => expand_plain(question).map(|unit| vec![unit]),
        };

        match expanded {
            Ok(expanded) => units.extend(expanded),
            Err(reason) => log::warn!("skipping question {}: {}", question.id, reason),
        }
    }

    log::debug!("expanded {} questions into {} units", questions.len(), units.len());
    units
}

fn expand_plain(question: &Question) -> Result<Unit, Malformed> {
    let doc = RichNode::parse_document(&question.document).ok_or(Malformed::NotADocument)?;
    let parts = parts_of(&doc, question.kind, question.gabarito.clone())?;
    Ok(unit_from_parts(
        question.id.clone(),
        UnitRole::Standalone,
        None,
        parts,
    ))
}

fn expand_set(question: &Question, selections: &SetSelections) -> Result<Vec<Unit>, Malformed> {
    let doc = RichNode::parse_document(&question.document).ok_or(Malformed::NotADocument)?;

    let base_blocks = doc.child("baseText").map(RichNode::blocks).unwrap_or_default();
    if base_blocks.is_empty() {
        return Err(Malformed::EmptyBaseText);
    }

    // Item indexes are 1-based positions among the set's items
    let mut items: Vec<(usize, Parts)> = Vec::new();
    for (idx, node) in doc.content.iter().filter(|c| c.is("questionItem")).enumerate() {
        let index = idx + 1;
        match item_parts(node, question.gabarito.as_ref()) {
            Ok(parts) => items.push((index, parts)),
            Err(reason) => log::warn!("skipping item {} of set {}: {}", index, question.id, reason),
        }
    }
    if items.is_empty() {
        return Err(Malformed::NoItems);
    }

    let selected: Vec<usize> = match selections.get(&question.id) {
        Some(chosen) => {
            let mut selected = Vec::with_capacity(chosen.len());
            for &index in chosen {
                if selected.contains(&index) {
                    continue;
                }
                if items.iter().any(|(i, _)| *i == index) {
                    selected.push(index);
                } else {
                    log::warn!("set {} has no item {}", question.id, index);
                }
            }
            selected
        }
        None => items.iter().map(|(index, _)| *index).collect(),
    };
    if selected.is_empty() {
        return Err(Malformed::NoSelectedItems);
    }

    let mut by_index: FxHashMap<usize, Parts> = items.into_iter().collect();

    if selected.len() < 2 {
        // A lone item prints as an ordinary question with the base text inline
        let Some(mut parts) = by_index.remove(&selected[0]) else {
            return Err(Malformed::NoSelectedItems);
        };
        let mut text_blocks = base_blocks;
        text_blocks.append(&mut parts.text_blocks);
        parts.text_blocks = text_blocks;
        return Ok(vec![unit_from_parts(
            question.id.clone(),
            UnitRole::Standalone,
            None,
            parts,
        )]);
    }

    let mut units = Vec::with_capacity(selected.len() + 1);
    units.push(Unit {
        id: question.id.clone(),
        kind: QuestionKind::Set,
        role: UnitRole::SetBase,
        parent: None,
        gabarito: None,
        text_blocks: base_blocks,
        options: SmallVec::new(),
    });
    for index in selected {
        if let Some(parts) = by_index.remove(&index) {
            units.push(unit_from_parts(
                question.id.item(index),
                UnitRole::SetItem { index },
                Some(question.id.clone()),
                parts,
            ));
        }
    }
    Ok(units)
}

fn item_parts(node: &RichNode, inherited: Option<&Gabarito>) -> Result<Parts, Malformed> {
    let has_options = node
        .child("options")
        .map_or(false, |o| o.content.iter().any(|c| c.is("option")));
    let kind = node
        .attr_str("kind")
        .and_then(QuestionKind::from_attr)
        .filter(|k| *k != QuestionKind::Set)
        .unwrap_or(if has_options {
            QuestionKind::MultipleChoice
        } else {
            QuestionKind::Essay
        });

    let own = match node.attrs.get("gabarito") {
        Some(serde_json::Value::String(s)) => Gabarito::from_attr(kind, s),
        Some(value) => serde_json::from_value(value.clone()).ok(),
        None => None,
    };

    parts_of(node, kind, own.or_else(|| inherited.cloned()))
}

fn parts_of(
    node: &RichNode,
    kind: QuestionKind,
    gabarito: Option<Gabarito>,
) -> Result<Parts, Malformed> {
    let text_blocks = node.blocks();
    if text_blocks.is_empty() {
        return Err(Malformed::EmptyStatement);
    }

    let options = if kind.has_options() {
        let options = node.child("options").map(RichNode::options).unwrap_or_default();
        if options.len() < 2 {
            return Err(Malformed::TooFewOptions(options.len()));
        }
        if options.len() > MAX_OPTIONS {
            return Err(Malformed::TooManyOptions(options.len()));
        }
        options
    } else {
        Vec::new()
    };

    Ok(Parts {
        kind,
        gabarito,
        text_blocks,
        options,
    })
}

fn unit_from_parts(
    id: QuestionId,
    role: UnitRole,
    parent: Option<QuestionId>,
    parts: Parts,
) -> Unit {
    Unit {
        id,
        kind: parts.kind,
        role,
        parent,
        gabarito: parts.gabarito,
        text_blocks: parts.text_blocks,
        options: parts.options.into_iter().collect(),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use serde_json::{json, Value};

    fn paragraph(text: &str) -> Value {
        json!({"type": "paragraph", "content": [{"type": "text", "text": text}]})
    }

    fn options(count: usize) -> Value {
        let options: Vec<Value> = (0..count)
            .map(|i| json!({"type": "option", "content": [paragraph(&format!("option {}", i + 1))]}))
            .collect();
        json!({"type": "options", "content": options})
    }

    pub fn choice_question(id: &str, paragraphs: usize, answer: char) -> Question {
        let mut content: Vec<Value> = (0..paragraphs)
            .map(|i| paragraph(&format!("{} statement {}", id, i + 1)))
            .collect();
        content.push(options(4));
        Question::new(
            id,
            QuestionKind::MultipleChoice,
            Some(Gabarito::Choice(answer)),
            json!({"type": "doc", "content": content}),
        )
    }

    pub fn set_question(id: &str, items: usize) -> Question {
        let mut content = vec![json!({
            "type": "baseText",
            "content": [paragraph("shared text one"), paragraph("shared text two")]
        })];
        for i in 0..items {
            let letter = ["A", "B", "C", "D"][i % 4];
            content.push(json!({
                "type": "questionItem",
                "attrs": {"kind": "multipleChoice", "gabarito": letter},
                "content": [
                    {"type": "statement", "content": [paragraph(&format!("item {}", i + 1))]},
                    options(4)
                ]
            }));
        }
        Question::new(id, QuestionKind::Set, None, json!({"type": "doc", "content": content}))
    }
}

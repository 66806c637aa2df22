//! Content model: questions, their rich-text documents and measurable units

mod block;
mod expand;
mod node;
mod unit;

pub use block::{Block, BlockKind, ListMarker, OptionBlock};
pub use expand::{expand, SetSelections};
pub use node::RichNode;
pub use unit::{
    canonical_answer_key, printed_numbers, set_groups, AnswerKey, SetGroup, SubUnit, Unit,
    UnitRole,
};


use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a question, or `${parentId}#${itemIndex}` for a set item
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub String);

impl QuestionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Synthetic id of the 1-based `index`-th item of a set question
    pub fn item(&self, index: usize) -> Self {
        Self(format!("{}#{}", self.0, index))
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuestionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for QuestionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Question kind ("tipo" in the question bank)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionKind {
    #[serde(alias = "single", alias = "objetiva")]
    MultipleChoice,
    #[serde(alias = "certoErrado")]
    TrueFalse,
    #[serde(alias = "discursive", alias = "discursiva")]
    Essay,
    #[serde(alias = "conjunto")]
    Set,
}

impl QuestionKind {
    /// Whether units of this kind carry lettered options
    pub fn has_options(&self) -> bool {
        matches!(self, QuestionKind::MultipleChoice | QuestionKind::TrueFalse)
    }

    fn from_attr(value: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(value.to_string())).ok()
    }
}

/// Answer key entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Gabarito {
    /// Letter of the correct option
    Choice(char),
    /// Letter of the correct option of a true/false pair
    TrueFalse(char),
    /// Grading rubric for essay questions
    Essay(String),
}

impl Gabarito {
    /// Letter of the correct option, if this key points at one
    pub fn letter(&self) -> Option<char> {
        match self {
            Gabarito::Choice(c) | Gabarito::TrueFalse(c) => Some(*c),
            Gabarito::Essay(_) => None,
        }
    }

    /// Same key pointing at another letter; essay keys are returned as is
    pub fn with_letter(&self, letter: char) -> Self {
        match self {
            Gabarito::Choice(_) => Gabarito::Choice(letter),
            Gabarito::TrueFalse(_) => Gabarito::TrueFalse(letter),
            Gabarito::Essay(rubric) => Gabarito::Essay(rubric.clone()),
        }
    }

    /// Parse a key stored as a plain string attribute
    fn from_attr(kind: QuestionKind, value: &str) -> Option<Self> {
        let value = value.trim();
        match kind {
            QuestionKind::Essay => Some(Gabarito::Essay(value.to_string())),
            QuestionKind::MultipleChoice => single_letter(value).map(Gabarito::Choice),
            QuestionKind::TrueFalse => single_letter(value).map(Gabarito::TrueFalse),
            QuestionKind::Set => None,
        }
    }
}

impl fmt::Display for Gabarito {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gabarito::Choice(c) | Gabarito::TrueFalse(c) => write!(f, "{}", c),
            Gabarito::Essay(rubric) => f.write_str(rubric),
        }
    }
}

fn single_letter(value: &str) -> Option<char> {
    let mut chars = value.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    (chars.next().is_none() && letter.is_ascii_uppercase()).then_some(letter)
}

/// Options a question may carry, one per letter A-Z
pub const MAX_OPTIONS: usize = 26;

/// Letter printed for the option at `index` (0-based)
pub fn letter_for(index: usize) -> char {
    (b'A' + (index.min(MAX_OPTIONS - 1) as u8)) as char
}

/// Option index (0-based) printed with `letter`
pub fn index_for(letter: char) -> Option<usize> {
    let upper = letter.to_ascii_uppercase();
    upper
        .is_ascii_uppercase()
        .then(|| (upper as u8 - b'A') as usize)
}

/// A question as supplied by the question bank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    #[serde(alias = "tipo")]
    pub kind: QuestionKind,
    #[serde(default)]
    pub gabarito: Option<Gabarito>,
    /// Rich-text document, parsed lazily so a bad document only drops this question
    #[serde(default)]
    pub document: serde_json::Value,
}

impl Question {
    pub fn new(
        id: impl Into<QuestionId>,
        kind: QuestionKind,
        gabarito: Option<Gabarito>,
        document: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            gabarito,
            document,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_id() {
        let id = QuestionId::new("q42");
        assert_eq!(id.item(2).as_str(), "q42#2");
    }

    #[test]
    fn test_letters() {
        assert_eq!(letter_for(0), 'A');
        assert_eq!(letter_for(3), 'D');
        assert_eq!(index_for('c'), Some(2));
        assert_eq!(index_for('?'), None);
    }

    #[test]
    fn test_gabarito_letter() {
        assert_eq!(Gabarito::Choice('B').letter(), Some('B'));
        assert_eq!(Gabarito::Essay("x".into()).letter(), None);
        assert_eq!(Gabarito::TrueFalse('A').with_letter('B'), Gabarito::TrueFalse('B'));
        assert_eq!(
            Gabarito::from_attr(QuestionKind::MultipleChoice, " c "),
            Some(Gabarito::Choice('C'))
        );
        assert_eq!(Gabarito::from_attr(QuestionKind::MultipleChoice, "CD"), None);
    }

    #[test]
    fn test_question_deserialize() {
        let question: Question = serde_json::from_value(json!({
            "id": "q1",
            "tipo": "objetiva",
            "gabarito": {"type": "choice", "value": "D"},
            "document": {"type": "doc", "content": []}
        }))
        .unwrap();
        assert_eq!(question.kind, QuestionKind::MultipleChoice);
        assert_eq!(question.gabarito, Some(Gabarito::Choice('D')));
        assert_eq!(QuestionKind::from_attr("essay"), Some(QuestionKind::Essay));
    }
}

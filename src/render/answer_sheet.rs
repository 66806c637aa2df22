//! Printed answer sheet ("gabarito") of one variant

use crate::document::{AnswerKey, Gabarito};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRow {
    pub number: u32,
    pub answer: Gabarito,
}

/// Answer key rows in printed order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSheet {
    pub variant: u32,
    pub rows: Vec<AnswerRow>,
}

impl AnswerSheet {
    pub fn new(variant: u32, key: &AnswerKey) -> Self {
        Self {
            variant,
            rows: key
                .iter()
                .map(|(number, answer)| AnswerRow {
                    number: *number,
                    answer: answer.clone(),
                })
                .collect(),
        }
    }

    /// Letters of the lettered answers, in printed order ("CAEB...")
    pub fn letters(&self) -> String {
        self.rows.iter().filter_map(|row| row.answer.letter()).collect()
    }
}

impl fmt::Display for AnswerSheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tipo {}", self.variant)?;
        for row in &self.rows {
            match &row.answer {
                Gabarito::Essay(_) => writeln!(f, "{:>3}. (discursiva)", row.number)?,
                answer => writeln!(f, "{:>3}. {}", row.number, answer)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> AnswerKey {
        let mut key = AnswerKey::new();
        key.insert(2, Gabarito::Essay("explain".into()));
        key.insert(1, Gabarito::Choice('C'));
        key.insert(3, Gabarito::TrueFalse('A'));
        key
    }

    #[test]
    fn test_rows_follow_printed_numbers() {
        let sheet = AnswerSheet::new(2, &key());
        let numbers: Vec<u32> = sheet.rows.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(sheet.letters(), "CA");
    }

    #[test]
    fn test_text_rendering() {
        let text = AnswerSheet::new(1, &key()).to_string();
        assert_eq!(text, "Tipo 1\n  1. C\n  2. (discursiva)\n  3. A\n");
    }
}

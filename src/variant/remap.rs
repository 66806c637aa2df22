//! Per-variant answer keys

use super::Variant;
use crate::document::{AnswerKey, QuestionId, Unit};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// A key that cannot be resolved would print a wrong answer sheet, so every
/// gap is an error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemapError {
    #[error("printed number {0} has no question")]
    UnknownPrintedNumber(u32),
    #[error("answer {letter:?} of {question} is outside its options")]
    LetterOutOfRange { question: QuestionId, letter: char },
    #[error("question {0} is missing from the variant's question order")]
    MissingFromOrder(QuestionId),
    #[error("permutation of {question} covers {permutation} options, the question has {options}")]
    PermutationMismatch {
        question: QuestionId,
        permutation: usize,
        options: usize,
    },
}

/// Ids of numbered units in canonical printed order
pub fn printed_order(units: &[Unit]) -> Vec<QuestionId> {
    units
        .iter()
        .filter(|unit| unit.is_numbered())
        .map(|unit| unit.id.clone())
        .collect()
}

/// Translate the canonical key into `variant`'s key.
///
/// `ordered[n - 1]` is the question printed as number `n` in the canonical
/// exam.
pub fn remap(
    canonical: &AnswerKey,
    variant: &Variant,
    ordered: &[QuestionId],
) -> Result<AnswerKey, RemapError> {
    if variant.index == 1 && variant.is_identity() {
        return Ok(canonical.clone());
    }

    let numbers: FxHashMap<&QuestionId, u32> = variant
        .question_order
        .as_deref()
        .unwrap_or(ordered)
        .iter()
        .enumerate()
        .map(|(idx, id)| (id, idx as u32 + 1))
        .collect();

    let mut key = AnswerKey::new();
    for (&number, gabarito) in canonical {
        let question = number
            .checked_sub(1)
            .and_then(|idx| ordered.get(idx as usize))
            .ok_or(RemapError::UnknownPrintedNumber(number))?;
        let printed = *numbers
            .get(question)
            .ok_or_else(|| RemapError::MissingFromOrder(question.clone()))?;

        let answer = match (variant.permutation(question), gabarito.letter()) {
            (Some(permutation), Some(letter)) => {
                let shown = permutation
                    .translate(letter)
                    .ok_or_else(|| RemapError::LetterOutOfRange {
                        question: question.clone(),
                        letter,
                    })?;
                gabarito.with_letter(shown)
            }
            _ => gabarito.clone(),
        };
        key.insert(printed, answer);
    }

    Ok(key)
}

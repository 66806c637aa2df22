//! Measurable units and set grouping

use super::block::{Block, OptionBlock};
use super::{letter_for, Gabarito, QuestionId, QuestionKind};
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Printed question number -> answer
pub type AnswerKey = BTreeMap<u32, Gabarito>;

/// Position of a unit relative to set questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UnitRole {
    /// A plain question, or a set merged into one unit
    Standalone,
    /// Shared base text of a set; carries no answer key
    SetBase,
    /// One selected item of a set (1-based item index in the set document)
    SetItem { index: usize },
}

/// The atomic block the engines reason about
///
/// Sub-units are numbered from 1: `1..=N` are text blocks and
/// `N+1..=N+K` are options.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: QuestionId,
    pub kind: QuestionKind,
    pub role: UnitRole,
    /// Set question this unit was expanded from
    pub parent: Option<QuestionId>,
    pub gabarito: Option<Gabarito>,
    pub text_blocks: Vec<Block>,
    pub options: SmallVec<[OptionBlock; 5]>,
}

/// Borrowed view of one sub-unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubUnit<'a> {
    Text(&'a Block),
    Option { letter: char, option: &'a OptionBlock },
}

impl Unit {
    /// N + K
    pub fn sub_unit_count(&self) -> usize {
        self.text_blocks.len() + self.options.len()
    }

    /// N
    pub fn text_count(&self) -> usize {
        self.text_blocks.len()
    }

    /// Sub-unit by 1-based index
    pub fn sub_unit(&self, index: usize) -> Option<SubUnit<'_>> {
        let n = self.text_blocks.len();
        if index == 0 {
            None
        } else if index <= n {
            Some(SubUnit::Text(&self.text_blocks[index - 1]))
        } else {
            let position = index - n - 1;
            self.options.get(position).map(|option| SubUnit::Option {
                letter: letter_for(position),
                option,
            })
        }
    }

    pub fn is_set_base(&self) -> bool {
        self.role == UnitRole::SetBase
    }

    pub fn belongs_to_set(&self) -> bool {
        matches!(self.role, UnitRole::SetItem { .. })
    }

    /// Whether the unit gets a printed question number
    pub fn is_numbered(&self) -> bool {
        !self.is_set_base()
    }
}

/// Base text plus the item units that share it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetGroup {
    pub base: usize,
    pub items: Vec<usize>,
}

/// Derive set groups by scanning the emitted sequence
pub fn set_groups(units: &[Unit]) -> Vec<SetGroup> {
    let mut groups: Vec<SetGroup> = Vec::new();
    let mut open: Option<(usize, &QuestionId)> = None;

    for (idx, unit) in units.iter().enumerate() {
        match unit.role {
            UnitRole::SetBase => {
                groups.push(SetGroup {
                    base: idx,
                    items: Vec::new(),
                });
                open = Some((groups.len() - 1, &unit.id));
            }
            UnitRole::SetItem { .. } => match open {
                Some((group, base_id)) if unit.parent.as_ref() == Some(base_id) => {
                    groups[group].items.push(idx);
                }
                _ => {
                    log::warn!("set item {} is not preceded by its base text", unit.id);
                    open = None;
                }
            },
            UnitRole::Standalone => open = None,
        }
    }

    groups
}

/// 1-based printed numbers in document order; set bases get none
pub fn printed_numbers(units: &[Unit]) -> Vec<Option<u32>> {
    let mut next = 0;
    units
        .iter()
        .map(|unit| {
            unit.is_numbered().then(|| {
                next += 1;
                next
            })
        })
        .collect()
}

/// Printed number -> stored gabarito for every numbered unit that has one
pub fn canonical_answer_key(units: &[Unit]) -> AnswerKey {
    let mut key = AnswerKey::new();
    for (unit, number) in units.iter().zip(printed_numbers(units)) {
        let Some(number) = number else { continue };
        match &unit.gabarito {
            Some(gabarito) => {
                key.insert(number, gabarito.clone());
            }
            None => log::warn!("question {} (number {}) has no answer key", unit.id, number),
        }
    }
    key
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_sub_unit_numbering() {
        let unit = choice_unit("q1", 2, 4, 'A');
        assert_eq!(unit.sub_unit_count(), 6);
        assert!(unit.sub_unit(0).is_none());
        assert!(matches!(unit.sub_unit(2), Some(SubUnit::Text(_))));
        match unit.sub_unit(3) {
            Some(SubUnit::Option { letter, option }) => {
                assert_eq!(letter, 'A');
                assert_eq!(option.original_index, 0);
            }
            other => panic!("unexpected sub-unit {:?}", other),
        }
        assert!(matches!(unit.sub_unit(6), Some(SubUnit::Option { letter: 'D', .. })));
        assert!(unit.sub_unit(7).is_none());
    }

    #[test]
    fn test_set_groups_scan() {
        let mut units = vec![choice_unit("q1", 1, 4, 'A')];
        units.extend(set_units("s1", 2, &[1, 3]));
        units.push(choice_unit("q2", 1, 4, 'C'));

        let groups = set_groups(&units);
        assert_eq!(
            groups,
            vec![SetGroup {
                base: 1,
                items: vec![2, 3]
            }]
        );
    }

    #[test]
    fn test_orphan_item_is_not_grouped() {
        let mut units = set_units("s1", 1, &[1, 2]);
        units.remove(0);
        assert!(set_groups(&units).is_empty());
    }

    #[test]
    fn test_printed_numbers_skip_set_base() {
        let mut units = vec![choice_unit("q1", 1, 4, 'A')];
        units.extend(set_units("s1", 1, &[1, 2]));
        units.push(essay_unit("q2", 1));

        assert_eq!(
            printed_numbers(&units),
            vec![Some(1), None, Some(2), Some(3), Some(4)]
        );

        let key = canonical_answer_key(&units);
        assert_eq!(key.len(), 4);
        assert_eq!(key[&1], Gabarito::Choice('A'));
        assert_eq!(key[&2], Gabarito::Choice('B'));
        assert_eq!(key[&4], Gabarito::Essay("rubric".into()));
    }
}

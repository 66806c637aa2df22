//! Answer-shuffled exam variants ("tipos")
//!
//! Variant 1 is always the canonical exam. Every other variant permutes the
//! options of each eligible question, and optionally the question order,
//! from a pseudo-random stream that is a pure function of
//! `(seed, question id, variant index)`, so any variant can be reprinted
//! from its seed alone.

mod remap;

pub use remap::{printed_order, remap, RemapError};

use crate::document::{index_for, letter_for, QuestionId, QuestionKind, Unit, UnitRole, MAX_OPTIONS};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Stream key for the question-order shuffle
const ORDER_KEY: &str = "#order";

/// What a variant may shuffle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VariantConfig {
    pub shuffle_options: bool,
    /// True/false pairs keep their order unless set
    pub shuffle_true_false: bool,
    /// Permute questions too; a set keeps its base and items together
    pub shuffle_questions: bool,
}

impl Default for VariantConfig {
    fn default() -> Self {
        Self {
            shuffle_options: true,
            shuffle_true_false: false,
            shuffle_questions: false,
        }
    }
}

impl VariantConfig {
    fn shuffles(&self, unit: &Unit) -> bool {
        if unit.options.len() < 2 {
            return false;
        }
        match unit.kind {
            QuestionKind::MultipleChoice => self.shuffle_options,
            QuestionKind::TrueFalse => self.shuffle_true_false,
            QuestionKind::Essay | QuestionKind::Set => false,
        }
    }
}

/// Bijection from original option position to displayed position
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OptionPermutation(SmallVec<[u8; 8]>);

impl OptionPermutation {
    pub fn identity(len: usize) -> Self {
        Self((0..len.min(MAX_OPTIONS) as u8).collect())
    }

    /// Build from `displayed[original]`; `None` unless it is a bijection
    pub fn from_displayed(displayed: &[u8]) -> Option<Self> {
        if displayed.len() > MAX_OPTIONS {
            return None;
        }
        let mut seen = [false; MAX_OPTIONS];
        for &position in displayed {
            let position = position as usize;
            if position >= displayed.len() || seen[position] {
                return None;
            }
            seen[position] = true;
        }
        Some(Self(displayed.iter().copied().collect()))
    }

    /// Build from the original index shown at each displayed position
    pub fn from_display_order(order: &[usize]) -> Option<Self> {
        let mut displayed = vec![u8::MAX; order.len()];
        for (position, &original) in order.iter().enumerate() {
            *displayed.get_mut(original)? = position.min(u8::MAX as usize) as u8;
        }
        Self::from_displayed(&displayed)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn displayed_position(&self, original: usize) -> Option<usize> {
        self.0.get(original).map(|p| *p as usize)
    }

    pub fn original_at(&self, displayed: usize) -> Option<usize> {
        self.0.iter().position(|p| *p as usize == displayed)
    }

    /// Original option index at each displayed position
    pub fn display_order(&self) -> Vec<usize> {
        let mut order = vec![0; self.0.len()];
        for (original, &displayed) in self.0.iter().enumerate() {
            order[displayed as usize] = original;
        }
        order
    }

    /// Displayed letter of the option originally lettered `letter`
    pub fn translate(&self, letter: char) -> Option<char> {
        let original = index_for(letter)?;
        self.displayed_position(original).map(letter_for)
    }

    pub fn is_identity(&self) -> bool {
        self.0.iter().enumerate().all(|(i, p)| i == *p as usize)
    }
}

/// One printed version of the exam
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    /// 1-based
    pub index: u32,
    pub permutations: FxHashMap<QuestionId, OptionPermutation>,
    /// Numbered unit ids in printed order, when questions are shuffled
    pub question_order: Option<Vec<QuestionId>>,
}

impl Variant {
    pub fn identity() -> Self {
        Self {
            index: 1,
            permutations: FxHashMap::default(),
            question_order: None,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.question_order.is_none()
            && self
                .permutations
                .values()
                .all(OptionPermutation::is_identity)
    }

    pub fn permutation(&self, id: &QuestionId) -> Option<&OptionPermutation> {
        self.permutations.get(id)
    }

    /// Check that every permutation still covers the options of its unit
    pub fn check(&self, units: &[Unit]) -> Result<(), RemapError> {
        for unit in units {
            let Some(permutation) = self.permutations.get(&unit.id) else {
                continue;
            };
            if permutation.len() != unit.options.len() {
                return Err(RemapError::PermutationMismatch {
                    question: unit.id.clone(),
                    permutation: permutation.len(),
                    options: unit.options.len(),
                });
            }
        }
        Ok(())
    }

    /// Units as printed in this variant: options reordered, answer letters
    /// moved with them and, when shuffled, questions reordered
    pub fn apply(&self, units: &[Unit]) -> Result<Vec<Unit>, RemapError> {
        self.check(units)?;
        let ordered = match &self.question_order {
            Some(order) => reorder_blocks(units, order),
            None => units.to_vec(),
        };

        Ok(ordered
            .into_iter()
            .map(|unit| match self.permutations.get(&unit.id) {
                Some(permutation) => permute_options(unit, permutation),
                None => unit,
            })
            .collect())
    }
}

/// `permutation` must cover exactly the unit's options
fn permute_options(mut unit: Unit, permutation: &OptionPermutation) -> Unit {
    unit.options = permutation
        .display_order()
        .into_iter()
        .map(|original| unit.options[original].clone())
        .collect();

    if let Some(gabarito) = &unit.gabarito {
        if let Some(letter) = gabarito.letter().and_then(|l| permutation.translate(l)) {
            unit.gabarito = Some(gabarito.with_letter(letter));
        }
    }
    unit
}

/// Standalone units, and set bases with their items, as contiguous ranges
fn blocks(units: &[Unit]) -> Vec<std::ops::Range<usize>> {
    let mut blocks: Vec<std::ops::Range<usize>> = Vec::new();
    for (idx, unit) in units.iter().enumerate() {
        match (unit.role, blocks.last_mut()) {
            (UnitRole::SetItem { .. }, Some(last)) if last.end == idx => last.end = idx + 1,
            _ => blocks.push(idx..idx + 1),
        }
    }
    blocks
}

fn reorder_blocks(units: &[Unit], order: &[QuestionId]) -> Vec<Unit> {
    let rank: FxHashMap<&QuestionId, usize> = order.iter().enumerate().map(|(i, id)| (id, i)).collect();
    let mut blocks = blocks(units);
    // Blocks follow the rank of their first numbered unit; unknown ones keep
    // their place at the end
    blocks.sort_by_key(|range| {
        units[range.clone()]
            .iter()
            .find(|u| u.is_numbered())
            .and_then(|u| rank.get(&u.id).copied())
            .unwrap_or(usize::MAX)
    });
    blocks
        .into_iter()
        .flat_map(|range| units[range].iter().cloned())
        .collect()
}

/// Generate `num_variants` variants (at least one) of `units`
pub fn generate(units: &[Unit], num_variants: u32, seed: u64, config: &VariantConfig) -> Vec<Variant> {
    let count = num_variants.max(1);
    let mut variants = Vec::with_capacity(count as usize);
    variants.push(Variant::identity());

    for index in 2..=count {
        let permutations = units
            .iter()
            .filter(|unit| config.shuffles(unit))
            .filter_map(|unit| {
                let mut rng = ChaCha8Rng::seed_from_u64(mix(seed, unit.id.as_str(), index));
                let mut order: Vec<usize> = (0..unit.options.len()).collect();
                shuffle(&mut order, &mut rng);
                let permutation = OptionPermutation::from_display_order(&order);
                if permutation.is_none() {
                    log::warn!(
                        "{} has {} options and is left unshuffled",
                        unit.id,
                        unit.options.len()
                    );
                }
                permutation.map(|p| (unit.id.clone(), p))
            })
            .collect();

        let question_order = config.shuffle_questions.then(|| {
            let mut rng = ChaCha8Rng::seed_from_u64(mix(seed, ORDER_KEY, index));
            let mut blocks = blocks(units);
            shuffle(&mut blocks, &mut rng);
            blocks
                .into_iter()
                .flat_map(|range| units[range].iter())
                .filter(|unit| unit.is_numbered())
                .map(|unit| unit.id.clone())
                .collect()
        });

        variants.push(Variant {
            index,
            permutations,
            question_order,
        });
    }

    log::debug!("generated {} variants for {} units (seed {:#x})", count, units.len(), seed);
    variants
}

/// Fisher-Yates over the raw 64-bit stream
fn shuffle<T>(items: &mut [T], rng: &mut impl RngCore) {
    for i in (1..items.len()).rev() {
        let j = (rng.next_u64() % (i as u64 + 1)) as usize;
        items.swap(i, j);
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(hash: u64, bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(hash, |h, b| (h ^ *b as u64).wrapping_mul(FNV_PRIME))
}

/// Seed for a requesting identity; anonymous use gets 0
pub fn derive_seed(user_id: Option<&str>) -> u64 {
    match user_id {
        Some(id) => fnv1a(FNV_OFFSET, id.as_bytes()),
        None => 0,
    }
}

/// Seed of the stream for one key within one variant
pub fn mix(seed: u64, key: &str, variant: u32) -> u64 {
    let hash = fnv1a(FNV_OFFSET, &seed.to_le_bytes());
    let hash = fnv1a(hash, key.as_bytes());
    let hash = fnv1a(hash, &[0xff]);
    fnv1a(hash, &variant.to_le_bytes())
}

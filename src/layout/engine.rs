//! Pagination engine: greedy column-major flow with sub-unit fragmentation

use crate::document::{set_groups, QuestionId, Unit};
use crate::layout::oracle::{MeasureError, Measurements};
use crate::layout::pagination::{fragment_count, Column, Page, PlacementEntry};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Slack for comparing summed pixel heights
pub const EPSILON: f32 = 1e-3;

/// Page header layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeaderVariant {
    /// School, student and grade boxes on the first page
    #[default]
    Full,
    /// Single-line header
    Compact,
    Hidden,
}

/// Frame drawn around each question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionDecorator {
    #[default]
    Inline,
    Boxed,
}

/// Layout configuration, in CSS pixels at 96 DPI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    /// Slack reserved in every column to absorb measurement error
    pub safety_margin: f32,
    pub columns: u8,
    pub column_gap: f32,
    /// Allow breaking before a unit to avoid a tiny tail fragment
    pub optimize_layout: bool,
    /// Smallest tail fragment accepted when `optimize_layout` is set
    pub min_tail_fragment: f32,
    pub header: HeaderVariant,
    pub decorator: QuestionDecorator,
    /// Reserve the header height in every column instead of column 1 only
    pub header_spans_columns: bool,
    /// Produce one empty page for an empty exam so the header still shows
    pub emit_empty_page: bool,
    /// Committed spacer height after a unit
    pub spacers: FxHashMap<QuestionId, f32>,
    /// Committed display width of an image, by `src`
    pub image_widths: FxHashMap<String, f32>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            // A4
            page_width: 794.0,
            page_height: 1123.0,
            // 1.5cm
            margin_top: 57.0,
            margin_bottom: 57.0,
            margin_left: 57.0,
            margin_right: 57.0,
            safety_margin: 8.0,
            columns: 2,
            column_gap: 16.0,
            optimize_layout: false,
            min_tail_fragment: 24.0,
            header: HeaderVariant::Full,
            decorator: QuestionDecorator::Inline,
            header_spans_columns: false,
            emit_empty_page: true,
            spacers: FxHashMap::default(),
            image_widths: FxHashMap::default(),
        }
    }
}

impl LayoutConfig {
    /// Get usable content width
    pub fn content_width(&self) -> f32 {
        self.page_width - self.margin_left - self.margin_right
    }

    /// Get usable content height per page
    pub fn content_height(&self) -> f32 {
        self.page_height - self.margin_top - self.margin_bottom
    }

    /// Width of one column
    pub fn column_width(&self) -> f32 {
        let columns = self.columns.max(1) as f32;
        (self.content_width() - self.column_gap * (columns - 1.0)) / columns
    }

    pub fn spacer_after(&self, id: &QuestionId) -> f32 {
        self.spacers.get(id).copied().unwrap_or(0.0).max(0.0)
    }

    pub fn image_width(&self, src: &str) -> Option<f32> {
        self.image_widths.get(src).copied()
    }

    /// Capacity of a column before any entry is placed
    pub fn column_capacity(&self, page: usize, column: usize, measurements: &Measurements) -> f32 {
        let mut capacity = self.content_height() - self.safety_margin;
        if column == 0 || self.header_spans_columns {
            capacity -= measurements.header_height(page);
        }
        capacity
    }
}

/// Misconfigurations and inconsistent inputs; fatal for the run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaginationError {
    #[error("column {column} of page {page} has no usable capacity ({capacity}px)")]
    NoCapacity {
        page: usize,
        column: usize,
        capacity: f32,
    },
    #[error("unsupported column count {0}")]
    InvalidColumns(u8),
    #[error(transparent)]
    Measurements(#[from] MeasureError),
    #[error("set base at unit {base} is not followed by its items")]
    SetGroup { base: usize },
}

/// Place `units` into pages and columns.
///
/// Units are placed strictly in document order. A unit that does not fit
/// is cut between sub-units, never inside one.
pub fn paginate(
    units: &[Unit],
    measurements: &Measurements,
    config: &LayoutConfig,
) -> Result<Vec<Page>, PaginationError> {
    if !(1..=2).contains(&config.columns) {
        return Err(PaginationError::InvalidColumns(config.columns));
    }
    measurements.validate(units)?;
    for group in set_groups(units) {
        if group.items.is_empty() {
            return Err(PaginationError::SetGroup { base: group.base });
        }
    }

    if units.is_empty() && !config.emit_empty_page {
        return Ok(Vec::new());
    }

    let mut cursor = FlowCursor::new(config, measurements)?;
    for (idx, unit) in units.iter().enumerate() {
        place_unit(&mut cursor, idx, unit, measurements, config)?;
    }

    let pages = cursor.finish();
    log::debug!(
        "paginated {} units into {} pages ({} fragments)",
        units.len(),
        pages.len(),
        fragment_count(&pages)
    );
    Ok(pages)
}

fn place_unit(
    cursor: &mut FlowCursor<'_>,
    idx: usize,
    unit: &Unit,
    measurements: &Measurements,
    config: &LayoutConfig,
) -> Result<(), PaginationError> {
    let heights = &measurements.unit_sub_heights[idx];
    let count = heights.len();
    let mut from = 1;
    let mut first = true;

    loop {
        let rest: f32 = heights[from - 1..].iter().sum();
        let remaining = cursor.remaining();

        if fits(rest, remaining) {
            let entry = if first {
                PlacementEntry::Full { unit: idx }
            } else {
                PlacementEntry::Frag {
                    unit: idx,
                    from,
                    to: count,
                    first: false,
                }
            };
            cursor.place(entry, rest);
            break;
        }

        let (prefix, prefix_height) = fitting_prefix(&heights[from - 1..], remaining);

        if config.optimize_layout
            && first
            && prefix > 0
            && !cursor.column_is_empty()
            && rest - prefix_height < config.min_tail_fragment
            && fits(rest, cursor.next_capacity())
        {
            log::trace!("unit {} moved whole to avoid a short tail fragment", unit.id);
            cursor.advance()?;
            continue;
        }

        if prefix > 0 {
            let to = from + prefix - 1;
            cursor.place(
                PlacementEntry::Frag {
                    unit: idx,
                    from,
                    to,
                    first,
                },
                prefix_height,
            );
            first = false;
            from = to + 1;
            cursor.advance()?;
            continue;
        }

        if !cursor.column_is_empty() {
            cursor.advance()?;
            continue;
        }

        // A sub-unit taller than an empty column: it cannot be split, so it
        // gets the column to itself
        log::warn!(
            "sub-unit {} of {} ({}px) exceeds column capacity ({}px)",
            from,
            unit.id,
            heights[from - 1],
            remaining
        );
        let entry = if first && count == 1 {
            PlacementEntry::Full { unit: idx }
        } else {
            PlacementEntry::Frag {
                unit: idx,
                from,
                to: from,
                first,
            }
        };
        cursor.place(entry, heights[from - 1]);
        cursor.mark_overflowed();
        first = false;
        from += 1;
        if from > count {
            break;
        }
        cursor.advance()?;
    }

    cursor.consume_spacer(measurements.spacers_after[idx]);
    Ok(())
}

fn fits(height: f32, remaining: f32) -> bool {
    height <= remaining + EPSILON
}

/// Longest prefix of `heights` fitting in `remaining`, with its height
fn fitting_prefix(heights: &[f32], remaining: f32) -> (usize, f32) {
    let mut total = 0.0;
    let mut count = 0;
    for h in heights {
        if !fits(total + h, remaining) {
            break;
        }
        total += h;
        count += 1;
    }
    (count, total)
}

/// Current (page, column) slot of the flow
struct FlowCursor<'a> {
    config: &'a LayoutConfig,
    measurements: &'a Measurements,
    pages: Vec<Page>,
    column: usize,
}

impl<'a> FlowCursor<'a> {
    fn new(config: &'a LayoutConfig, measurements: &'a Measurements) -> Result<Self, PaginationError> {
        let mut cursor = Self {
            config,
            measurements,
            pages: Vec::new(),
            column: 0,
        };
        cursor.open_page()?;
        Ok(cursor)
    }

    fn open_page(&mut self) -> Result<(), PaginationError> {
        let index = self.pages.len();
        let mut capacities = Vec::with_capacity(self.config.columns as usize);
        for column in 0..self.config.columns as usize {
            let capacity = self.config.column_capacity(index, column, self.measurements);
            if capacity <= 0.0 {
                return Err(PaginationError::NoCapacity {
                    page: index,
                    column,
                    capacity,
                });
            }
            capacities.push(capacity);
        }
        self.pages.push(Page::new(index, capacities));
        self.column = 0;
        Ok(())
    }

    fn current(&self) -> &Column {
        &self.pages[self.pages.len() - 1].columns[self.column]
    }

    fn current_mut(&mut self) -> &mut Column {
        let page = self.pages.len() - 1;
        &mut self.pages[page].columns[self.column]
    }

    fn remaining(&self) -> f32 {
        self.current().remaining()
    }

    fn column_is_empty(&self) -> bool {
        self.current().is_empty()
    }

    /// Capacity of the slot `advance` would move to
    fn next_capacity(&self) -> f32 {
        let page = self.pages.len() - 1;
        if self.column + 1 < self.config.columns as usize {
            self.config.column_capacity(page, self.column + 1, self.measurements)
        } else {
            self.config.column_capacity(page + 1, 0, self.measurements)
        }
    }

    fn advance(&mut self) -> Result<(), PaginationError> {
        if self.column + 1 < self.config.columns as usize {
            self.column += 1;
        } else {
            self.open_page()?;
        }
        log::trace!("flow advanced to page {} column {}", self.pages.len(), self.column + 1);
        Ok(())
    }

    fn place(&mut self, entry: PlacementEntry, height: f32) {
        let column = self.current_mut();
        column.entries.push(entry);
        column.used += height;
    }

    fn mark_overflowed(&mut self) {
        self.current_mut().overflowed = true;
    }

    /// Spacers are clipped at the column end
    fn consume_spacer(&mut self, height: f32) {
        if height <= 0.0 {
            return;
        }
        let column = self.current_mut();
        let take = height.min(column.remaining().max(0.0));
        column.used += take;
    }

    fn finish(self) -> Vec<Page> {
        self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::fixtures::{choice_unit, essay_unit, set_units};
    use crate::layout::oracle::{FixedOracle, HeightOracle};

    fn config(columns: u8, height: f32) -> LayoutConfig {
        LayoutConfig {
            page_height: height,
            margin_top: 0.0,
            margin_bottom: 0.0,
            safety_margin: 0.0,
            columns,
            ..LayoutConfig::default()
        }
    }

    fn run(units: &[Unit], oracle: &FixedOracle, config: &LayoutConfig) -> Vec<Page> {
        let measurements = oracle.measure(units, config).unwrap();
        let pages = paginate(units, &measurements, config).unwrap();
        assert_invariants(units, &measurements, &pages);
        pages
    }

    /// Coverage, order and capacity must hold for every placement
    fn assert_invariants(units: &[Unit], m: &Measurements, pages: &[Page]) {
        let entries: Vec<&PlacementEntry> = pages.iter().flat_map(Page::entries).collect();

        let mut next_unit = 0;
        let mut next_sub = 1;
        for entry in &entries {
            let count = units[entry.unit()].sub_unit_count();
            if next_sub == 1 {
                assert_eq!(entry.unit(), next_unit, "units out of order");
                assert!(entry.is_first());
            } else {
                assert_eq!(entry.unit(), next_unit, "unit interleaved before completion");
            }
            let range = entry.range(count);
            assert_eq!(*range.start(), next_sub, "gap or overlap in {:?}", entry);
            assert!(range.end() >= range.start());
            if entry.is_last(count) {
                next_unit += 1;
                next_sub = 1;
            } else {
                next_sub = range.end() + 1;
            }
        }
        assert_eq!(next_unit, units.len(), "not every unit was placed");

        for page in pages {
            for column in &page.columns {
                let placed: f32 = column
                    .entries
                    .iter()
                    .map(|e| {
                        let subs = &m.unit_sub_heights[e.unit()];
                        e.range(subs.len()).map(|s| subs[s - 1]).sum::<f32>()
                    })
                    .sum();
                assert!(placed <= column.used + EPSILON);
                if !column.overflowed {
                    assert!(column.used <= column.capacity + EPSILON);
                }
            }
        }
    }

    fn three_questions() -> Vec<Unit> {
        vec![
            choice_unit("q1", 1, 4, 'A'),
            choice_unit("q2", 1, 4, 'B'),
            choice_unit("q3", 1, 4, 'C'),
        ]
    }

    #[test]
    fn test_layout_config_defaults() {
        let config = LayoutConfig::default();
        assert_eq!(config.content_width(), 680.0);
        assert_eq!(config.content_height(), 1009.0);
        assert_eq!(config.column_width(), 332.0);
    }

    #[test]
    fn test_layout_config_from_partial_json() {
        let config: LayoutConfig = serde_json::from_value(serde_json::json!({
            "columns": 1,
            "header": "compact",
            "spacers": {"q1": 40.0}
        }))
        .unwrap();
        assert_eq!(config.columns, 1);
        assert_eq!(config.header, HeaderVariant::Compact);
        assert_eq!(config.spacer_after(&QuestionId::new("q1")), 40.0);
        assert_eq!(config.page_height, 1123.0);
    }

    #[test]
    fn test_exact_fit_single_page() {
        // 3 units of 5 x 20px in a 300px column
        let pages = run(&three_questions(), &FixedOracle::uniform(20.0), &config(1, 300.0));
        assert_eq!(pages.len(), 1);
        assert_eq!(
            pages[0].column1(),
            &[
                PlacementEntry::Full { unit: 0 },
                PlacementEntry::Full { unit: 1 },
                PlacementEntry::Full { unit: 2 }
            ]
        );
        assert!(pages[0].column2().is_empty());
    }

    #[test]
    fn test_whole_units_move_to_next_page() {
        let pages = run(&three_questions(), &FixedOracle::uniform(20.0), &config(1, 200.0));
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].column1().len(), 2);
        assert_eq!(pages[1].column1(), &[PlacementEntry::Full { unit: 2 }]);
        assert_eq!(fragment_count(&pages), 0);
    }

    #[test]
    fn test_tall_unit_fragments_across_pages() {
        // 10 sub-units of 20px = 200px in an 80px column
        let units = vec![choice_unit("q1", 6, 4, 'A')];
        let pages = run(&units, &FixedOracle::uniform(20.0), &config(1, 80.0));

        assert_eq!(pages.len(), 3);
        assert_eq!(
            pages[0].column1(),
            &[PlacementEntry::Frag { unit: 0, from: 1, to: 4, first: true }]
        );
        assert_eq!(
            pages[1].column1(),
            &[PlacementEntry::Frag { unit: 0, from: 5, to: 8, first: false }]
        );
        assert_eq!(
            pages[2].column1(),
            &[PlacementEntry::Frag { unit: 0, from: 9, to: 10, first: false }]
        );
    }

    #[test]
    fn test_two_columns_fill_before_next_page() {
        let units = vec![choice_unit("q1", 6, 4, 'A')];
        let pages = run(&units, &FixedOracle::uniform(20.0), &config(2, 80.0));

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].column1().len(), 1);
        assert_eq!(pages[0].column2().len(), 1);
        assert_eq!(
            pages[1].column1(),
            &[PlacementEntry::Frag { unit: 0, from: 9, to: 10, first: false }]
        );
    }

    #[test]
    fn test_header_reserved_in_first_column_only() {
        let oracle = FixedOracle::uniform(20.0).with_headers(50.0, 10.0);
        let measurements = oracle.measure(&three_questions(), &config(2, 200.0)).unwrap();
        let pages = paginate(&three_questions(), &measurements, &config(2, 200.0)).unwrap();

        assert_eq!(pages[0].columns[0].capacity, 150.0);
        assert_eq!(pages[0].columns[1].capacity, 200.0);

        let spanning = LayoutConfig {
            header_spans_columns: true,
            ..config(2, 200.0)
        };
        assert_eq!(spanning.column_capacity(0, 1, &measurements), 150.0);
        assert_eq!(spanning.column_capacity(1, 1, &measurements), 190.0);
    }

    #[test]
    fn test_spacer_pushes_next_unit() {
        let units = vec![essay_unit("q1", 1), essay_unit("q2", 1)];
        let oracle = FixedOracle::new()
            .with_unit("q1", vec![40.0])
            .with_unit("q2", vec![20.0]);

        let pages = run(&units, &oracle, &config(1, 100.0));
        assert_eq!(pages.len(), 1);

        let mut spaced = config(1, 100.0);
        spaced.spacers.insert(QuestionId::new("q1"), 50.0);
        let pages = run(&units, &oracle, &spaced);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].columns[0].used, 90.0);
        assert_eq!(pages[1].column1(), &[PlacementEntry::Full { unit: 1 }]);
    }

    #[test]
    fn test_spacer_clipped_at_column_end() {
        let units = vec![essay_unit("q1", 1)];
        let oracle = FixedOracle::new().with_unit("q1", vec![80.0]);
        let mut spaced = config(1, 100.0);
        spaced.spacers.insert(QuestionId::new("q1"), 50.0);

        let pages = run(&units, &oracle, &spaced);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].columns[0].used, 100.0);
    }

    #[test]
    fn test_optimize_avoids_short_tail() {
        let units = vec![choice_unit("q1", 1, 2, 'A'), choice_unit("q2", 1, 2, 'A')];
        let oracle = FixedOracle::new()
            .with_unit("q1", vec![20.0, 20.0, 20.0])
            .with_unit("q2", vec![20.0, 15.0, 10.0]);

        let greedy = run(&units, &oracle, &config(1, 100.0));
        assert_eq!(
            greedy[0].column1()[1],
            PlacementEntry::Frag { unit: 1, from: 1, to: 2, first: true }
        );
        assert_eq!(
            greedy[1].column1(),
            &[PlacementEntry::Frag { unit: 1, from: 3, to: 3, first: false }]
        );

        let optimized = LayoutConfig {
            optimize_layout: true,
            ..config(1, 100.0)
        };
        let pages = run(&units, &oracle, &optimized);
        assert_eq!(pages[0].column1(), &[PlacementEntry::Full { unit: 0 }]);
        assert_eq!(pages[1].column1(), &[PlacementEntry::Full { unit: 1 }]);
    }

    #[test]
    fn test_optimize_keeps_long_tail() {
        let units = vec![choice_unit("q1", 1, 2, 'A'), choice_unit("q2", 1, 2, 'A')];
        let oracle = FixedOracle::new()
            .with_unit("q1", vec![20.0, 20.0, 20.0])
            .with_unit("q2", vec![20.0, 15.0, 30.0]);
        let optimized = LayoutConfig {
            optimize_layout: true,
            ..config(1, 100.0)
        };

        let pages = run(&units, &oracle, &optimized);
        assert!(pages[0].column1()[1].is_fragment());
    }

    #[test]
    fn test_oversized_sub_unit_gets_own_column() {
        let units = vec![essay_unit("q1", 1), essay_unit("q2", 1)];
        let oracle = FixedOracle::new()
            .with_unit("q1", vec![150.0])
            .with_unit("q2", vec![50.0]);

        let pages = run(&units, &oracle, &config(1, 100.0));
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].column1(), &[PlacementEntry::Full { unit: 0 }]);
        assert!(pages[0].columns[0].overflowed);
        assert_eq!(pages[1].column1(), &[PlacementEntry::Full { unit: 1 }]);
    }

    #[test]
    fn test_oversized_middle_sub_unit() {
        let units = vec![essay_unit("q1", 3)];
        let oracle = FixedOracle::new().with_unit("q1", vec![30.0, 150.0, 30.0]);

        let pages = run(&units, &oracle, &config(1, 100.0));
        assert_eq!(pages.len(), 3);
        assert_eq!(
            pages[1].column1(),
            &[PlacementEntry::Frag { unit: 0, from: 2, to: 2, first: false }]
        );
        assert!(pages[1].columns[0].overflowed);
        assert!(!pages[2].columns[0].overflowed);
    }

    #[test]
    fn test_mixed_exam_invariants_and_idempotence() {
        let mut units = vec![choice_unit("q1", 2, 4, 'A')];
        units.extend(set_units("s1", 6, &[1, 2, 3]));
        units.push(essay_unit("q2", 3));
        units.push(choice_unit("q3", 5, 5, 'E'));

        let oracle = FixedOracle::uniform(37.0).with_headers(120.0, 30.0);
        for optimize in [false, true] {
            let config = LayoutConfig {
                optimize_layout: optimize,
                ..config(2, 400.0)
            };
            let first = run(&units, &oracle, &config);
            let second = run(&units, &oracle, &config);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_empty_exam() {
        let m = Measurements::default();
        let pages = paginate(&[], &m, &config(2, 100.0)).unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_empty());

        let no_page = LayoutConfig {
            emit_empty_page: false,
            ..config(2, 100.0)
        };
        assert!(paginate(&[], &m, &no_page).unwrap().is_empty());
    }

    #[test]
    fn test_zero_capacity_is_fatal() {
        let units = three_questions();
        let bad = LayoutConfig {
            safety_margin: 100.0,
            ..config(1, 100.0)
        };
        let m = FixedOracle::uniform(20.0).measure(&units, &bad).unwrap();
        assert_eq!(
            paginate(&units, &m, &bad),
            Err(PaginationError::NoCapacity {
                page: 0,
                column: 0,
                capacity: 0.0
            })
        );
    }

    #[test]
    fn test_invalid_inputs() {
        let units = three_questions();
        let m = FixedOracle::uniform(20.0).measure(&units, &config(1, 100.0)).unwrap();
        assert_eq!(
            paginate(&units, &m, &config(3, 100.0)),
            Err(PaginationError::InvalidColumns(3))
        );
        assert!(matches!(
            paginate(&units[..2], &m, &config(1, 100.0)),
            Err(PaginationError::Measurements(MeasureError::UnitCount { .. }))
        ));
    }

    #[test]
    fn test_set_base_without_items_is_rejected() {
        let units = set_units("s1", 2, &[]);
        let m = FixedOracle::uniform(20.0).measure(&units, &config(1, 100.0)).unwrap();
        assert_eq!(
            paginate(&units, &m, &config(1, 100.0)),
            Err(PaginationError::SetGroup { base: 0 })
        );
    }
}

//! Display list: render-ready representation of a placement

use crate::document::{set_groups, BlockKind, SubUnit, Unit};
use crate::layout::{LayoutConfig, Measurements, Page, PlacementEntry};
use crate::Rect;
use serde::Serialize;

/// A display item to render, positioned relative to its column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DisplayItem {
    /// Printed number before the first fragment of a question
    #[serde(rename_all = "camelCase")]
    QuestionNumber { unit: usize, number: u32, y: f32 },
    /// Shared-text banner before the first fragment of a set base
    #[serde(rename_all = "camelCase")]
    SetBanner {
        unit: usize,
        first_number: u32,
        last_number: u32,
        text: String,
        y: f32,
    },
    /// Marker on a fragment continuing a unit from an earlier column
    #[serde(rename_all = "camelCase")]
    Continuation {
        unit: usize,
        number: Option<u32>,
        y: f32,
    },
    #[serde(rename_all = "camelCase")]
    Text {
        unit: usize,
        sub_unit: usize,
        block_kind: BlockKind,
        text: String,
        y: f32,
        height: f32,
    },
    #[serde(rename_all = "camelCase")]
    Choice {
        unit: usize,
        sub_unit: usize,
        letter: char,
        /// Position of the option in the canonical question
        original_index: u8,
        text: String,
        y: f32,
        height: f32,
    },
    /// Committed blank space after a unit
    Spacer { unit: usize, y: f32, height: f32 },
}

impl DisplayItem {
    pub fn unit(&self) -> usize {
        match self {
            DisplayItem::QuestionNumber { unit, .. }
            | DisplayItem::SetBanner { unit, .. }
            | DisplayItem::Continuation { unit, .. }
            | DisplayItem::Text { unit, .. }
            | DisplayItem::Choice { unit, .. }
            | DisplayItem::Spacer { unit, .. } => *unit,
        }
    }
}

/// Banner shown above the shared text of a set
pub fn banner_text(first: u32, last: u32) -> String {
    if first == last {
        format!("Texto para a questão {}", first)
    } else {
        format!("Texto para as questões {} a {}", first, last)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayColumn {
    pub bounds: Rect,
    pub overflowed: bool,
    pub items: Vec<DisplayItem>,
}

/// Display list for a single page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayPage {
    pub page_index: usize,
    pub bounds: Rect,
    pub header_height: f32,
    pub columns: Vec<DisplayColumn>,
}

/// Complete display list for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayList {
    pub version: u64,
    pub pages: Vec<DisplayPage>,
}

impl DisplayList {
    /// Build the display list of a placement.
    ///
    /// `printed[i]` is the printed number of unit `i` (none for set bases).
    pub fn build(
        units: &[Unit],
        pages: &[Page],
        printed: &[Option<u32>],
        measurements: &Measurements,
        config: &LayoutConfig,
        version: u64,
    ) -> Self {
        let mut banners = vec![None; units.len()];
        for group in set_groups(units) {
            let numbers = group.items.iter().filter_map(|i| printed.get(*i).copied().flatten());
            let first = numbers.clone().min();
            let last = numbers.max();
            if let (Some(first), Some(last)) = (first, last) {
                banners[group.base] = Some((first, last));
            }
        }

        let column_width = config.column_width();
        let pages = pages
            .iter()
            .map(|page| {
                let page_y = page.index as f32 * config.page_height;
                let header_height = measurements.header_height(page.index);

                let columns = page
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(col_idx, column)| {
                        let header = if col_idx == 0 || config.header_spans_columns {
                            header_height
                        } else {
                            0.0
                        };
                        let bounds = Rect::new(
                            config.margin_left + col_idx as f32 * (column_width + config.column_gap),
                            page_y + config.margin_top + header,
                            column_width,
                            column.capacity,
                        );

                        let mut builder = ColumnBuilder {
                            units,
                            printed,
                            banners: &banners,
                            measurements,
                            capacity: column.capacity,
                            y: 0.0,
                            items: Vec::new(),
                        };
                        for entry in &column.entries {
                            builder.push_entry(entry);
                        }

                        DisplayColumn {
                            bounds,
                            overflowed: column.overflowed,
                            items: builder.items,
                        }
                    })
                    .collect();

                DisplayPage {
                    page_index: page.index,
                    bounds: Rect::new(0.0, page_y, config.page_width, config.page_height),
                    header_height,
                    columns,
                }
            })
            .collect();

        DisplayList { version, pages }
    }

    /// All items in emission order
    pub fn items(&self) -> impl Iterator<Item = &DisplayItem> + '_ {
        self.pages
            .iter()
            .flat_map(|p| p.columns.iter())
            .flat_map(|c| c.items.iter())
    }
}

struct ColumnBuilder<'a> {
    units: &'a [Unit],
    printed: &'a [Option<u32>],
    banners: &'a [Option<(u32, u32)>],
    measurements: &'a Measurements,
    capacity: f32,
    y: f32,
    items: Vec<DisplayItem>,
}

impl ColumnBuilder<'_> {
    fn push_entry(&mut self, entry: &PlacementEntry) {
        let idx = entry.unit();
        let Some(unit) = self.units.get(idx) else {
            return;
        };
        let heights = self
            .measurements
            .unit_sub_heights
            .get(idx)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let number = self.printed.get(idx).copied().flatten();

        if !entry.is_first() {
            self.items.push(DisplayItem::Continuation {
                unit: idx,
                number,
                y: self.y,
            });
        } else if let Some((first, last)) = self.banners[idx] {
            self.items.push(DisplayItem::SetBanner {
                unit: idx,
                first_number: first,
                last_number: last,
                text: banner_text(first, last),
                y: self.y,
            });
        } else if let Some(number) = number {
            self.items.push(DisplayItem::QuestionNumber {
                unit: idx,
                number,
                y: self.y,
            });
        }

        for sub_unit in entry.range(unit.sub_unit_count()) {
            let height = heights.get(sub_unit - 1).copied().unwrap_or(0.0);
            match unit.sub_unit(sub_unit) {
                Some(SubUnit::Text(block)) => self.items.push(DisplayItem::Text {
                    unit: idx,
                    sub_unit,
                    block_kind: block.kind.clone(),
                    text: block.text.clone(),
                    y: self.y,
                    height,
                }),
                Some(SubUnit::Option { letter, option }) => self.items.push(DisplayItem::Choice {
                    unit: idx,
                    sub_unit,
                    letter,
                    original_index: option.original_index,
                    text: option.text(),
                    y: self.y,
                    height,
                }),
                None => {}
            }
            self.y += height;
        }

        let spacer = self.measurements.spacers_after.get(idx).copied().unwrap_or(0.0);
        if entry.is_last(unit.sub_unit_count()) && spacer > 0.0 {
            let height = spacer.min((self.capacity - self.y).max(0.0));
            if height > 0.0 {
                self.items.push(DisplayItem::Spacer {
                    unit: idx,
                    y: self.y,
                    height,
                });
                self.y += height;
            }
        }
    }
}

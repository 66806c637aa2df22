//! Height oracle: the measurement capability the pagination engine depends on

use crate::document::{QuestionId, Unit};
use crate::layout::LayoutConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Measurement failures; any of them aborts the pagination run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeasureError {
    #[error("measured {found} units, expected {expected}")]
    UnitCount { expected: usize, found: usize },
    #[error("unit {unit}: measured {found} sub-units, expected {expected}")]
    SubUnitCount {
        unit: QuestionId,
        expected: usize,
        found: usize,
    },
    #[error("unit {unit}: sub-unit {sub_unit} has invalid height {value}")]
    InvalidHeight {
        unit: QuestionId,
        sub_unit: usize,
        value: f32,
    },
    #[error("invalid header height {0}")]
    InvalidHeader(f32),
    #[error("measurement backend failed: {0}")]
    Backend(String),
}

/// Pixel heights of every unit and of the page furniture
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurements {
    /// Sum of the unit's sub-unit heights plus its committed spacer
    pub unit_heights: Vec<f32>,
    /// Height of each sub-unit, in sub-unit order
    pub unit_sub_heights: Vec<Vec<f32>>,
    /// Committed spacer after each unit (0 when none)
    #[serde(default)]
    pub spacers_after: Vec<f32>,
    pub first_page_header_height: f32,
    pub other_page_header_height: f32,
}

impl Measurements {
    /// Assemble measurements from per-sub-unit heights, adding the committed
    /// spacers from `config`
    pub fn from_sub_heights(
        units: &[Unit],
        unit_sub_heights: Vec<Vec<f32>>,
        first_page_header_height: f32,
        other_page_header_height: f32,
        config: &LayoutConfig,
    ) -> Self {
        let spacers_after: Vec<f32> = units
            .iter()
            .map(|unit| config.spacer_after(&unit.id))
            .collect();
        let unit_heights = unit_sub_heights
            .iter()
            .zip(spacers_after.iter().copied().chain(std::iter::repeat(0.0)))
            .map(|(subs, spacer)| subs.iter().sum::<f32>() + spacer)
            .collect();

        Self {
            unit_heights,
            unit_sub_heights,
            spacers_after,
            first_page_header_height,
            other_page_header_height,
        }
    }

    /// Check that the measurements describe `units` and hold usable heights
    pub fn validate(&self, units: &[Unit]) -> Result<(), MeasureError> {
        for count in [
            self.unit_sub_heights.len(),
            self.unit_heights.len(),
            self.spacers_after.len(),
        ] {
            if count != units.len() {
                return Err(MeasureError::UnitCount {
                    expected: units.len(),
                    found: count,
                });
            }
        }

        for header in [self.first_page_header_height, self.other_page_header_height] {
            if !header.is_finite() || header < 0.0 {
                return Err(MeasureError::InvalidHeader(header));
            }
        }

        for (unit, subs) in units.iter().zip(&self.unit_sub_heights) {
            if subs.len() != unit.sub_unit_count() {
                return Err(MeasureError::SubUnitCount {
                    unit: unit.id.clone(),
                    expected: unit.sub_unit_count(),
                    found: subs.len(),
                });
            }
            if let Some((idx, value)) = subs
                .iter()
                .enumerate()
                .find(|(_, h)| !h.is_finite() || **h < 0.0)
            {
                return Err(MeasureError::InvalidHeight {
                    unit: unit.id.clone(),
                    sub_unit: idx + 1,
                    value: *value,
                });
            }
        }

        for (unit, spacer) in units.iter().zip(&self.spacers_after) {
            if !spacer.is_finite() || *spacer < 0.0 {
                return Err(MeasureError::InvalidHeight {
                    unit: unit.id.clone(),
                    sub_unit: unit.sub_unit_count() + 1,
                    value: *spacer,
                });
            }
        }

        Ok(())
    }

    /// Height of the header reserved on page `page` (0-based)
    pub fn header_height(&self, page: usize) -> f32 {
        if page == 0 {
            self.first_page_header_height
        } else {
            self.other_page_header_height
        }
    }
}

/// Measures units under a layout configuration.
///
/// Implementations may touch a rendering surface, but must behave as a pure
/// function of `(units, config)` from the engine's point of view.
pub trait HeightOracle {
    fn measure(&self, units: &[Unit], config: &LayoutConfig) -> Result<Measurements, MeasureError>;
}

impl<T: HeightOracle + ?Sized> HeightOracle for &T {
    fn measure(&self, units: &[Unit], config: &LayoutConfig) -> Result<Measurements, MeasureError> {
        (**self).measure(units, config)
    }
}

/// Oracle returning precomputed heights, keyed by unit id
#[derive(Debug, Clone, Default)]
pub struct FixedOracle {
    heights: rustc_hash::FxHashMap<QuestionId, Vec<f32>>,
    /// Height used for every sub-unit of a unit with no entry
    pub default_sub_height: Option<f32>,
    pub first_page_header_height: f32,
    pub other_page_header_height: f32,
}

impl FixedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every sub-unit of every unit is `height` tall
    pub fn uniform(height: f32) -> Self {
        Self {
            default_sub_height: Some(height),
            ..Self::default()
        }
    }

    pub fn with_headers(mut self, first_page: f32, other_pages: f32) -> Self {
        self.first_page_header_height = first_page;
        self.other_page_header_height = other_pages;
        self
    }

    pub fn with_unit(mut self, id: impl Into<QuestionId>, sub_heights: Vec<f32>) -> Self {
        self.heights.insert(id.into(), sub_heights);
        self
    }
}

impl HeightOracle for FixedOracle {
    fn measure(&self, units: &[Unit], config: &LayoutConfig) -> Result<Measurements, MeasureError> {
        let mut sub_heights = Vec::with_capacity(units.len());
        for unit in units {
            let heights = match (self.heights.get(&unit.id), self.default_sub_height) {
                (Some(heights), _) => heights.clone(),
                (None, Some(h)) => vec![h; unit.sub_unit_count()],
                (None, None) => {
                    return Err(MeasureError::Backend(format!("no heights for unit {}", unit.id)))
                }
            };
            sub_heights.push(heights);
        }

        let measurements = Measurements::from_sub_heights(
            units,
            sub_heights,
            self.first_page_header_height,
            self.other_page_header_height,
            config,
        );
        measurements.validate(units)?;
        Ok(measurements)
    }
}

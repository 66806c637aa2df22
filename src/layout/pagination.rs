//! Placement results: pages, columns and placement entries

use serde::Serialize;
use smallvec::SmallVec;
use std::ops::RangeInclusive;

/// Where (part of) a unit was placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PlacementEntry {
    /// Unit placed whole
    Full {
        #[serde(rename = "unitIndex")]
        unit: usize,
    },
    /// Sub-units `from..=to` (1-based) of a unit
    Frag {
        #[serde(rename = "unitIndex")]
        unit: usize,
        from: usize,
        to: usize,
        #[serde(rename = "isFirstFragment")]
        first: bool,
    },
}

impl PlacementEntry {
    pub fn unit(&self) -> usize {
        match self {
            PlacementEntry::Full { unit } | PlacementEntry::Frag { unit, .. } => *unit,
        }
    }

    /// Sub-unit range covered, given the unit's sub-unit count
    pub fn range(&self, sub_unit_count: usize) -> RangeInclusive<usize> {
        match self {
            PlacementEntry::Full { .. } => 1..=sub_unit_count,
            PlacementEntry::Frag { from, to, .. } => *from..=*to,
        }
    }

    /// Whether this entry starts the unit
    pub fn is_first(&self) -> bool {
        match self {
            PlacementEntry::Full { .. } => true,
            PlacementEntry::Frag { first, .. } => *first,
        }
    }

    /// Whether this entry ends the unit
    pub fn is_last(&self, sub_unit_count: usize) -> bool {
        match self {
            PlacementEntry::Full { .. } => true,
            PlacementEntry::Frag { to, .. } => *to == sub_unit_count,
        }
    }

    pub fn is_fragment(&self) -> bool {
        matches!(self, PlacementEntry::Frag { .. })
    }
}

/// One column of a page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub entries: Vec<PlacementEntry>,
    /// Height consumed by entries and spacers
    pub used: f32,
    /// Height available to entries
    pub capacity: f32,
    /// A sub-unit taller than the column was forced in
    pub overflowed: bool,
}

impl Column {
    pub fn new(capacity: f32) -> Self {
        Self {
            entries: Vec::new(),
            used: 0.0,
            capacity,
            overflowed: false,
        }
    }

    pub fn remaining(&self) -> f32 {
        self.capacity - self.used
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One printed page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Page index (0-based)
    pub index: usize,
    pub columns: SmallVec<[Column; 2]>,
}

impl Page {
    pub fn new(index: usize, capacities: impl IntoIterator<Item = f32>) -> Self {
        Self {
            index,
            columns: capacities.into_iter().map(Column::new).collect(),
        }
    }

    pub fn column1(&self) -> &[PlacementEntry] {
        self.column(0)
    }

    /// Empty when the layout has a single column
    pub fn column2(&self) -> &[PlacementEntry] {
        self.column(1)
    }

    fn column(&self, idx: usize) -> &[PlacementEntry] {
        self.columns.get(idx).map(|c| c.entries.as_slice()).unwrap_or(&[])
    }

    /// All entries in emission order (column-major)
    pub fn entries(&self) -> impl Iterator<Item = &PlacementEntry> + '_ {
        self.columns.iter().flat_map(|c| c.entries.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(Column::is_empty)
    }
}

/// Number of fragment entries across all pages
pub fn fragment_count(pages: &[Page]) -> usize {
    pages
        .iter()
        .flat_map(Page::entries)
        .filter(|e| e.is_fragment())
        .count()
}

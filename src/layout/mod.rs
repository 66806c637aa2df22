//! Measurement and pagination

mod engine;
pub mod font;
mod line_break;
mod metrics;
mod oracle;
mod pagination;

pub use engine::{
    paginate, HeaderVariant, LayoutConfig, PaginationError, QuestionDecorator, EPSILON,
};
pub use font::FontMetrics;
pub use line_break::{LineBreaker, LineLayout};
pub use metrics::{TextMetricOracle, INDENT_WIDTH, OPTION_GUTTER};
pub use oracle::{FixedOracle, HeightOracle, MeasureError, Measurements};
pub use pagination::{fragment_count, Column, Page, PlacementEntry};

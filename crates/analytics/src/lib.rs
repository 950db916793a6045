//! # Fillscope Analytics
//!
//! Pure derivations over a position collection: performance KPIs, calendar-day
//! grouping and chart series.
//!
//! ## Architectural Principles
//!
//! - **No I/O:** this crate depends only on `core-types`. Fetching lives in
//!   `api-client` and orchestration in `pipeline`.
//! - **Stateless Calculation:** every component takes positions in and hands
//!   results out. Recomputing on a new snapshot is always safe.
//!
//! ## Public API
//!
//! - `KpiEngine` / `KpiSet`: the performance metrics.
//! - `CalendarIndex`: day membership and per-day filtering.
//! - `TimeSeriesProjector`: plot points for the chart layer.
//! - `analyze`: all three at once over one snapshot.

// Declare the modules that constitute this crate.
pub mod calendar;
pub mod engine;
pub mod report;
pub mod series;

// Re-export the key components to create a clean, public-facing API.
pub use calendar::CalendarIndex;
pub use engine::KpiEngine;
pub use report::KpiSet;
pub use series::{PlotPoint, PointKind, SeriesPoint, TimeSeriesProjector};

use chrono::{NaiveDate, TimeZone};
use core_types::Position;

/// Everything the dashboard renders for one position snapshot.
#[derive(Debug, Clone)]
pub struct Analysis<'a> {
    /// KPIs over filled positions; `None` when nothing has filled.
    pub kpis: Option<KpiSet>,
    pub series: Vec<PlotPoint>,
    /// Filled size per order, for the position-size line.
    pub size_series: Vec<SeriesPoint>,
    /// Fee-adjusted value per order, for the P&L bars.
    pub fee_adjusted_series: Vec<SeriesPoint>,
    pub calendar: CalendarIndex<'a>,
}

/// The subset of a snapshot that filled on one selected day.
#[derive(Debug, Clone)]
pub struct DaySelection<'a> {
    pub date: NaiveDate,
    pub positions: Vec<&'a Position>,
    pub kpis: Option<KpiSet>,
    /// Entry/exit markers for the selected positions, same order.
    pub series: Vec<PlotPoint>,
    pub size_series: Vec<SeriesPoint>,
    pub fee_adjusted_series: Vec<SeriesPoint>,
}

/// Derives KPIs, the chart series and the calendar index from one snapshot.
///
/// KPIs only consider positions that have filled; unfilled orders still show
/// up in the series.
pub fn analyze<'a, Tz: TimeZone>(positions: &'a [Position], tz: &Tz) -> Analysis<'a> {
    let projector = TimeSeriesProjector::new();
    Analysis {
        kpis: KpiEngine::new().compute(positions.iter().filter(|p| p.is_filled())),
        series: projector.project(positions),
        size_series: projector.size_series(positions),
        fee_adjusted_series: projector.fee_adjusted_series(positions),
        calendar: CalendarIndex::new(positions, tz),
    }
}

impl<'a> Analysis<'a> {
    /// Narrows the snapshot to `date` and derives its own KPIs and markers.
    pub fn select_day(&self, date: NaiveDate) -> DaySelection<'a> {
        let positions = self.calendar.positions_on(date);
        let projector = TimeSeriesProjector::new();
        DaySelection {
            date,
            kpis: KpiEngine::new().compute(positions.iter().copied()),
            series: projector.project(positions.iter().copied()),
            size_series: projector.size_series(positions.iter().copied()),
            fee_adjusted_series: projector.fee_adjusted_series(positions.iter().copied()),
            positions,
        }
    }
}

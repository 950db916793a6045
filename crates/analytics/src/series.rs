use chrono::{DateTime, Utc};
use core_types::{Position, Side};
use rust_decimal::Decimal;
use serde::Serialize;

/// Whether a plotted fill opened or closed exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PointKind {
    Entry,
    Exit,
}

impl From<Side> for PointKind {
    fn from(side: Side) -> Self {
        match side {
            Side::Buy => PointKind::Entry,
            Side::Sell | Side::Other => PointKind::Exit,
        }
    }
}

/// One marker on the positions-over-time chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotPoint {
    pub timestamp: DateTime<Utc>,
    pub value: Decimal,
    pub kind: PointKind,
}

/// One sample of a plain numeric series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: Decimal,
}

/// Maps positions onto chart-ready sequences.
///
/// Output order always matches input order; the collection is expected to be
/// chronological already. An empty input gives an empty series, which the
/// rendering side shows as "No Data".
#[derive(Debug, Default)]
pub struct TimeSeriesProjector {}

impl TimeSeriesProjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry/exit markers valued at `total_value_after_fees`, placed at the
    /// fill time (creation time for unfilled orders).
    pub fn project<'a, I>(&self, positions: I) -> Vec<PlotPoint>
    where
        I: IntoIterator<Item = &'a Position>,
    {
        positions
            .into_iter()
            .map(|p| PlotPoint {
                timestamp: p.event_time(),
                value: p.total_value_after_fees,
                kind: p.side.into(),
            })
            .collect()
    }

    /// Filled size per order, keyed by creation time.
    pub fn size_series<'a, I>(&self, positions: I) -> Vec<SeriesPoint>
    where
        I: IntoIterator<Item = &'a Position>,
    {
        positions
            .into_iter()
            .map(|p| SeriesPoint {
                timestamp: p.created_time,
                value: p.filled_size,
            })
            .collect()
    }

    /// `total_value_after_fees − filled_value` per order, keyed by creation time.
    pub fn fee_adjusted_series<'a, I>(&self, positions: I) -> Vec<SeriesPoint>
    where
        I: IntoIterator<Item = &'a Position>,
    {
        positions
            .into_iter()
            .map(|p| SeriesPoint {
                timestamp: p.created_time,
                value: p.total_value_after_fees.saturating_sub(p.filled_value),
            })
            .collect()
    }
}

use chrono::{NaiveDate, TimeZone};
use core_types::Position;
use std::collections::BTreeMap;

/// A read-only, day-keyed view over a position collection.
///
/// Each position is assigned to the calendar day of its `last_fill_time` in
/// the index's timezone; only the (year, month, day) fields count. Positions
/// that never filled belong to no day.
#[derive(Debug, Clone)]
pub struct CalendarIndex<'a> {
    positions: &'a [Position],
    days: Vec<Option<NaiveDate>>,
}

impl<'a> CalendarIndex<'a> {
    /// Builds an index that groups by calendar day in `tz`.
    pub fn new<Tz: TimeZone>(positions: &'a [Position], tz: &Tz) -> Self {
        let days = positions
            .iter()
            .map(|p| p.last_fill_time.map(|t| t.with_timezone(tz).date_naive()))
            .collect();
        Self { positions, days }
    }

    fn on(&self, date: NaiveDate) -> impl Iterator<Item = &'a Position> + '_ {
        self.positions
            .iter()
            .zip(&self.days)
            .filter(move |(_, day)| **day == Some(date))
            .map(|(p, _)| p)
    }

    /// Whether any position filled on `date`.
    pub fn has_position(&self, date: NaiveDate) -> bool {
        self.days.contains(&Some(date))
    }

    /// Positions that filled on `date`, in collection order.
    pub fn positions_on(&self, date: NaiveDate) -> Vec<&'a Position> {
        self.on(date).collect()
    }

    /// Distinct days with at least one fill, ascending.
    pub fn trading_days(&self) -> Vec<NaiveDate> {
        self.by_day().into_keys().collect()
    }

    /// Every filled position grouped under its day.
    pub fn by_day(&self) -> BTreeMap<NaiveDate, Vec<&'a Position>> {
        let mut grouped: BTreeMap<NaiveDate, Vec<&'a Position>> = BTreeMap::new();
        for (position, day) in self.positions.iter().zip(&self.days) {
            if let Some(day) = day {
                grouped.entry(*day).or_default().push(position);
            }
        }
        grouped
    }
}

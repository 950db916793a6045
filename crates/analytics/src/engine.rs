use crate::report::KpiSet;
use core_types::{Position, PositionStatus};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// A stateless calculator for deriving performance metrics from positions.
#[derive(Debug, Default)]
pub struct KpiEngine {}

impl KpiEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reduces a position collection into a `KpiSet`.
    ///
    /// Returns `None` for an empty collection: there is nothing to report, and
    /// that is not an error. Positions are consumed in the given order, which
    /// matters for `cumulative_pnl` and `max_drawdown`.
    pub fn compute<'a, I>(&self, positions: I) -> Option<KpiSet>
    where
        I: IntoIterator<Item = &'a Position>,
    {
        let positions: Vec<&Position> = positions.into_iter().collect();
        if positions.is_empty() {
            return None;
        }

        let pnls: Vec<Decimal> = positions.iter().map(|p| p.pnl()).collect();
        let total_filled = saturating_sum(positions.iter().map(|p| p.filled_value));
        let total_fees = saturating_sum(positions.iter().map(|p| p.total_fees));
        let net_pnl = total_filled.saturating_sub(total_fees);

        let mut report = KpiSet {
            net_pnl,
            pnl_percentage: Self::pnl_percentage(net_pnl, total_filled),
            realized_pnl: Decimal::ZERO,
            unrealized_pnl: Decimal::ZERO,
            total_positions: positions.len(),
            winning_positions: 0,
            losing_positions: 0,
            win_rate: Decimal::ZERO,
            average_gain: Decimal::ZERO,
            average_loss: Decimal::ZERO,
            risk_reward_ratio: None,
            sharpe_like_ratio: Self::sharpe_like_ratio(&positions, net_pnl, total_filled),
            max_drawdown: Decimal::ZERO,
            cumulative_pnl: Vec::with_capacity(positions.len()),
        };

        self.calculate_trade_stats(&pnls, &mut report);
        self.calculate_status_split(&positions, &pnls, &mut report);
        self.calculate_drawdown(&pnls, &mut report);

        tracing::debug!(
            positions = report.total_positions,
            net_pnl = %report.net_pnl,
            "Computed KPIs."
        );
        Some(report)
    }

    fn pnl_percentage(net_pnl: Decimal, total_filled: Decimal) -> f64 {
        if total_filled.is_zero() {
            return f64::NAN;
        }
        net_pnl
            .checked_div(total_filled)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .and_then(|pct| pct.to_f64())
            .unwrap_or_else(|| {
                // Out of Decimal range; the float result is still meaningful.
                let net = net_pnl.to_f64().unwrap_or(f64::NAN);
                let filled = total_filled.to_f64().unwrap_or(f64::NAN);
                net / filled * 100.0
            })
    }

    /// `net_pnl / sqrt(Σ (filled_value_i − Σ filled_value)²)`.
    ///
    /// Deliberately the dashboard's historical formula, not a textbook Sharpe
    /// ratio: deviations are taken from the sum, and there is no per-period
    /// normalization. A zero denominator yields `NaN`.
    fn sharpe_like_ratio(positions: &[&Position], net_pnl: Decimal, total_filled: Decimal) -> f64 {
        let total = total_filled.to_f64().unwrap_or(f64::NAN);
        let sum_sq: f64 = positions
            .iter()
            .map(|p| {
                let dev = p.filled_value.to_f64().unwrap_or(0.0) - total;
                dev * dev
            })
            .sum();

        let denominator = sum_sq.sqrt();
        if denominator == 0.0 || !denominator.is_finite() {
            return f64::NAN;
        }
        net_pnl.to_f64().unwrap_or(f64::NAN) / denominator
    }

    /// Win rate, average gain/loss and the risk/reward ratio.
    fn calculate_trade_stats(&self, pnls: &[Decimal], report: &mut KpiSet) {
        let mut gross_gain = Decimal::ZERO;
        let mut gross_loss = Decimal::ZERO;

        for pnl in pnls {
            if *pnl > Decimal::ZERO {
                gross_gain = gross_gain.saturating_add(*pnl);
                report.winning_positions += 1;
            } else if *pnl < Decimal::ZERO {
                gross_loss = gross_loss.saturating_add(pnl.abs());
                report.losing_positions += 1;
            }
        }

        report.win_rate = Decimal::from(report.winning_positions) / Decimal::from(pnls.len())
            * Decimal::ONE_HUNDRED;

        if report.winning_positions > 0 {
            report.average_gain = gross_gain / Decimal::from(report.winning_positions);
        }
        if report.losing_positions > 0 {
            report.average_loss = gross_loss / Decimal::from(report.losing_positions);
        }

        if !report.average_loss.is_zero() {
            // Only a vanishing average loss can overflow; the ratio is then unbounded.
            let ratio = report
                .average_gain
                .checked_div(report.average_loss)
                .unwrap_or(Decimal::MAX);
            report.risk_reward_ratio = Some(ratio);
        }
    }

    fn calculate_status_split(&self, positions: &[&Position], pnls: &[Decimal], report: &mut KpiSet) {
        for (position, pnl) in positions.iter().zip(pnls) {
            match position.status {
                PositionStatus::Closed => {
                    report.realized_pnl = report.realized_pnl.saturating_add(*pnl)
                }
                PositionStatus::Open => {
                    report.unrealized_pnl = report.unrealized_pnl.saturating_add(*pnl)
                }
                PositionStatus::Other => {}
            }
        }
    }

    /// Running P&L and the largest peak-to-trough drop along it.
    fn calculate_drawdown(&self, pnls: &[Decimal], report: &mut KpiSet) {
        let mut running = Decimal::ZERO;
        let mut peak: Option<Decimal> = None;
        let mut max_drawdown = Decimal::ZERO;

        for pnl in pnls {
            running = running.saturating_add(*pnl);
            report.cumulative_pnl.push(running);

            let peak = peak.get_or_insert(running);
            if running > *peak {
                *peak = running;
            }
            let drawdown = peak.saturating_sub(running);
            if drawdown > max_drawdown {
                max_drawdown = drawdown;
            }
        }

        report.max_drawdown = max_drawdown;
    }
}

/// Sums decimals, clamping at `Decimal::MAX`/`MIN` instead of panicking.
fn saturating_sum(values: impl Iterator<Item = Decimal>) -> Decimal {
    values.fold(Decimal::ZERO, Decimal::saturating_add)
}

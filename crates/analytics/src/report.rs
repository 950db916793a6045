use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Serialize, Serializer};

/// The fixed set of performance metrics derived from a position collection.
///
/// Monetary aggregates are exact decimals. Ratios that can be indeterminate
/// are `f64` (`NaN` when the denominator is zero) or `Option` (`None` for
/// `risk_reward_ratio` when nothing lost). Callers must branch on those
/// explicitly; they are values, not failures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSet {
    // I. Profitability
    pub net_pnl: Decimal,
    /// `net_pnl / Σ filled_value × 100`; `NaN` when nothing was filled.
    #[serde(serialize_with = "ratio")]
    pub pnl_percentage: f64,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,

    // II. Trade-level statistics
    pub total_positions: usize,
    pub winning_positions: usize,
    pub losing_positions: usize,
    pub win_rate: Decimal,
    pub average_gain: Decimal,
    pub average_loss: Decimal,
    pub risk_reward_ratio: Option<Decimal>,

    // III. Risk
    /// Non-standard: deviation of each filled value from the aggregate sum.
    #[serde(serialize_with = "ratio")]
    pub sharpe_like_ratio: f64,
    pub max_drawdown: Decimal,
    /// Running P&L, one entry per input position.
    pub cumulative_pnl: Vec<Decimal>,
}

/// JSON has no NaN. An indeterminate ratio is written as the string `"NaN"`
/// so it stays distinct from a null metric.
fn ratio<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.collect_str(value)
    }
}

impl KpiSet {
    /// The metric-name → value mapping shown on the dashboard.
    ///
    /// `None` is a null metric; `Some(NaN)` is an indeterminate one.
    pub fn named(&self) -> Vec<(&'static str, Option<f64>)> {
        let num = |d: Decimal| d.to_f64();
        vec![
            ("Net_PnL", num(self.net_pnl)),
            ("PnL_Percentage", Some(self.pnl_percentage)),
            ("Win_Rate", num(self.win_rate)),
            ("Risk_Reward_Ratio", self.risk_reward_ratio.and_then(num)),
            ("Sharpe_Ratio", Some(self.sharpe_like_ratio)),
            ("Max_Drawdown", num(self.max_drawdown)),
            ("Realized_PnL", num(self.realized_pnl)),
            ("Unrealized_PnL", num(self.unrealized_pnl)),
        ]
    }
}

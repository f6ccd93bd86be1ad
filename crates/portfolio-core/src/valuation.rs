//! Portfolio valuation math.
//!
//! Pure and deterministic: everything here works on plain numbers so the
//! same figures come out regardless of which store produced the inputs.

use serde::{Deserialize, Serialize};

/// Latest known market data for a symbol.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Quote {
    pub current_price: f64,
    pub day_change: f64,
}

/// Derived per-position figures.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PositionMetrics {
    pub current_value: f64,
    pub cost_basis: f64,
    pub gain_loss: f64,
    pub gain_loss_percent: f64,
    pub day_gain_loss: f64,
}

/// Aggregate portfolio figures.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PortfolioTotals {
    pub total_value: f64,
    pub total_cost: f64,
    pub total_gain_loss: f64,
    pub total_gain_loss_percent: f64,
    pub day_gain_loss: f64,
    pub day_gain_loss_percent: f64,
    pub position_count: usize,
}

/// Value a single holding against its latest quote.
pub fn value_position(shares: f64, avg_price: f64, quote: Quote) -> PositionMetrics {
    let current_value = shares * quote.current_price;
    let cost_basis = shares * avg_price;
    let gain_loss = current_value - cost_basis;
    let gain_loss_percent = if cost_basis > 0.0 {
        gain_loss / cost_basis * 100.0
    } else {
        0.0
    };

    PositionMetrics {
        current_value,
        cost_basis,
        gain_loss,
        gain_loss_percent,
        day_gain_loss: shares * quote.day_change,
    }
}

/// Sum per-position metrics into portfolio totals.
///
/// Total gain/loss percent uses total cost as denominator; day gain/loss
/// percent uses total value. Both are 0 when the denominator is 0.
pub fn summarize<'a>(metrics: impl IntoIterator<Item = &'a PositionMetrics>) -> PortfolioTotals {
    let mut totals = PortfolioTotals::default();

    for m in metrics {
        totals.total_value += m.current_value;
        totals.total_cost += m.cost_basis;
        totals.day_gain_loss += m.day_gain_loss;
        totals.position_count += 1;
    }

    totals.total_gain_loss = totals.total_value - totals.total_cost;
    totals.total_gain_loss_percent = if totals.total_cost > 0.0 {
        totals.total_gain_loss / totals.total_cost * 100.0
    } else {
        0.0
    };
    totals.day_gain_loss_percent = if totals.total_value > 0.0 {
        totals.day_gain_loss / totals.total_value * 100.0
    } else {
        0.0
    };

    totals
}

/// Whether a watchlist price alert has fired.
///
/// `alert_type` is "above" or "below"; anything else never triggers.
pub fn alert_triggered(current_price: f64, target_price: Option<f64>, alert_type: &str) -> bool {
    match (target_price, alert_type) {
        (Some(target), "above") => current_price >= target,
        (Some(target), "below") => current_price <= target,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn values_a_profitable_position() {
        let m = value_position(
            10.0,
            100.0,
            Quote {
                current_price: 120.0,
                day_change: 2.0,
            },
        );

        assert_relative_eq!(m.current_value, 1200.0);
        assert_relative_eq!(m.cost_basis, 1000.0);
        assert_relative_eq!(m.gain_loss, 200.0);
        assert_relative_eq!(m.gain_loss_percent, 20.0);
        assert_relative_eq!(m.day_gain_loss, 20.0);
    }

    #[test]
    fn zero_cost_basis_yields_zero_percent() {
        let m = value_position(
            10.0,
            0.0,
            Quote {
                current_price: 50.0,
                day_change: 0.0,
            },
        );

        assert_relative_eq!(m.gain_loss_percent, 0.0);
        assert_relative_eq!(m.gain_loss, 500.0);
    }

    #[test]
    fn empty_portfolio_summarizes_to_zeroes() {
        let totals = summarize(std::iter::empty::<&PositionMetrics>());

        assert_eq!(totals.position_count, 0);
        assert_relative_eq!(totals.total_value, 0.0);
        assert_relative_eq!(totals.total_gain_loss_percent, 0.0);
        assert_relative_eq!(totals.day_gain_loss_percent, 0.0);
    }

    #[test]
    fn totals_sum_per_position_figures() {
        let metrics = vec![
            value_position(
                10.0,
                100.0,
                Quote {
                    current_price: 110.0,
                    day_change: 1.0,
                },
            ),
            value_position(
                5.0,
                200.0,
                Quote {
                    current_price: 180.0,
                    day_change: -2.0,
                },
            ),
        ];

        let totals = summarize(metrics.iter());

        assert_eq!(totals.position_count, 2);
        assert_relative_eq!(totals.total_value, 1100.0 + 900.0);
        assert_relative_eq!(totals.total_cost, 1000.0 + 1000.0);
        assert_relative_eq!(totals.total_gain_loss, 0.0);
        assert_relative_eq!(totals.day_gain_loss, 10.0 - 10.0);
    }

    #[test]
    fn alert_directions() {
        assert!(alert_triggered(150.0, Some(140.0), "above"));
        assert!(!alert_triggered(150.0, Some(160.0), "above"));
        assert!(alert_triggered(150.0, Some(160.0), "below"));
        assert!(!alert_triggered(150.0, Some(140.0), "below"));
        assert!(!alert_triggered(150.0, None, "above"));
        assert!(!alert_triggered(150.0, Some(150.0), "sideways"));
    }

    proptest! {
        #[test]
        fn gain_loss_is_value_minus_basis(
            shares in 0.01f64..1e6,
            avg_price in 0.01f64..1e5,
            price in 0.01f64..1e5,
        ) {
            let m = value_position(shares, avg_price, Quote { current_price: price, day_change: 0.0 });
            prop_assert!((m.gain_loss - (m.current_value - m.cost_basis)).abs() < 1e-6);
        }

        #[test]
        fn percent_zero_iff_basis_zero(shares in 0.01f64..1e6, price in 0.01f64..1e5) {
            let m = value_position(shares, 0.0, Quote { current_price: price, day_change: 0.0 });
            prop_assert_eq!(m.gain_loss_percent, 0.0);
        }
    }
}

//! Analytics response shapes.
//!
//! The performance series is simulated placeholder data (the system has no
//! historical price feed); sector allocation and top performers are computed
//! from real position figures.

use chrono::{Days, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reporting period for the analytics endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
}

impl Period {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "1M" => Some(Period::OneMonth),
            "3M" => Some(Period::ThreeMonths),
            "6M" => Some(Period::SixMonths),
            "1Y" => Some(Period::OneYear),
            "2Y" => Some(Period::TwoYears),
            _ => None,
        }
    }

    pub fn days(&self) -> u64 {
        match self {
            Period::OneMonth => 30,
            Period::ThreeMonths => 90,
            Period::SixMonths => 180,
            Period::OneYear => 365,
            Period::TwoYears => 730,
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Period::OneMonth => "1M",
            Period::ThreeMonths => "3M",
            Period::SixMonths => "6M",
            Period::OneYear => "1Y",
            Period::TwoYears => "2Y",
        };
        write!(f, "{}", label)
    }
}

/// One point on the portfolio performance curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformancePoint {
    pub date: String,
    pub value: f64,
}

/// Placeholder risk figures; not derived from market data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub beta: f64,
    pub sharpe_ratio: f64,
    pub volatility: f64,
    pub max_drawdown: f64,
    pub var_95: f64,
}

impl RiskMetrics {
    pub fn placeholder() -> Self {
        Self {
            beta: 1.2,
            sharpe_ratio: 0.8,
            volatility: 15.5,
            max_drawdown: -8.2,
            var_95: -3.5,
        }
    }
}

/// Market value held in one sector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorSlice {
    pub sector: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopPerformer {
    pub symbol: String,
    pub name: String,
    pub gain_loss_percent: f64,
}

/// Generate a simulated daily value series ending at `end`, inclusive.
///
/// Each point is `base_value` plus uniform noise in [-5000, 10000]. The rng
/// is injected so tests can seed it.
pub fn simulated_performance<R: Rng>(
    period: Period,
    end: NaiveDate,
    base_value: f64,
    rng: &mut R,
) -> Vec<PerformancePoint> {
    let days = period.days();
    let mut series = Vec::with_capacity(days as usize + 1);

    for offset in (0..=days).rev() {
        let date = end
            .checked_sub_days(Days::new(offset))
            .unwrap_or(end)
            .format("%Y-%m-%d")
            .to_string();
        let value = base_value + rng.gen_range(-5000.0..=10000.0);
        series.push(PerformancePoint { date, value });
    }

    series
}

/// Aggregate market value per sector, sorted by sector name.
pub fn sector_allocation<'a>(
    positions: impl IntoIterator<Item = (&'a str, f64)>,
) -> Vec<SectorSlice> {
    let mut by_sector: BTreeMap<String, f64> = BTreeMap::new();
    for (sector, value) in positions {
        *by_sector.entry(sector.to_string()).or_default() += value;
    }

    by_sector
        .into_iter()
        .map(|(sector, value)| SectorSlice { sector, value })
        .collect()
}

/// Top `limit` holdings by gain/loss percent, descending.
pub fn top_performers(mut performers: Vec<TopPerformer>, limit: usize) -> Vec<TopPerformer> {
    performers.sort_by(|a, b| {
        b.gain_loss_percent
            .partial_cmp(&a.gain_loss_percent)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    performers.truncate(limit);
    performers
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn period_parsing() {
        assert_eq!(Period::from_str("1M"), Some(Period::OneMonth));
        assert_eq!(Period::from_str("2y"), Some(Period::TwoYears));
        assert_eq!(Period::from_str("5Y"), None);
        assert_eq!(Period::OneYear.days(), 365);
    }

    #[test]
    fn performance_series_spans_period() {
        let mut rng = StdRng::seed_from_u64(7);
        let end = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        let series = simulated_performance(Period::OneMonth, end, 100_000.0, &mut rng);

        assert_eq!(series.len(), 31);
        assert_eq!(series.first().unwrap().date, "2025-05-31");
        assert_eq!(series.last().unwrap().date, "2025-06-30");
        for point in &series {
            assert!(point.value >= 95_000.0 && point.value <= 110_000.0);
        }
    }

    #[test]
    fn sectors_aggregate_and_sort() {
        let slices = sector_allocation(vec![
            ("Technology", 1000.0),
            ("Energy", 500.0),
            ("Technology", 250.0),
        ]);

        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].sector, "Energy");
        assert_eq!(slices[1].sector, "Technology");
        assert!((slices[1].value - 1250.0).abs() < 1e-9);
    }

    #[test]
    fn top_performers_sorted_and_capped() {
        let performers = vec![
            TopPerformer {
                symbol: "A".into(),
                name: "A Corp".into(),
                gain_loss_percent: 5.0,
            },
            TopPerformer {
                symbol: "B".into(),
                name: "B Corp".into(),
                gain_loss_percent: 25.0,
            },
            TopPerformer {
                symbol: "C".into(),
                name: "C Corp".into(),
                gain_loss_percent: -10.0,
            },
        ];

        let top = top_performers(performers, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].symbol, "B");
        assert_eq!(top[1].symbol, "A");
    }
}

pub mod analytics;
pub mod merge;
pub mod valuation;

pub use analytics::{Period, PerformancePoint, RiskMetrics, SectorSlice, TopPerformer};
pub use merge::Lot;
pub use valuation::{PortfolioTotals, PositionMetrics, Quote};

pub mod engine;
pub mod metrics;
pub mod recommend;

pub use engine::{compute_dashboard, rm_dashboard, KpiDashboard, KpiOptions, RmPerformance, TeamSummary};
pub use metrics::{Metric, MetricProgress, MetricValues, PerformanceStatus, ProgressSet};
pub use recommend::{Recommendation, RecommendationThresholds};

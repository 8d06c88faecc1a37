use crate::kpi::metrics::{Metric, MetricProgress, ProgressSet};
use serde::Serialize;

/// Team percentage below which a metric gets a recommendation.
pub const RECOMMEND_BELOW_PERCENT: u64 = 80;

/// Daily rates above which a recommendation is marked urgent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecommendationThresholds {
    pub cp_onboarding_per_day: f64,
    pub active_cp_per_day: f64,
    pub meetings_per_day: f64,
    pub revenue_per_day: f64,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            cp_onboarding_per_day: 2.0,
            active_cp_per_day: 2.0,
            meetings_per_day: 3.0,
            revenue_per_day: 100_000.0,
        }
    }
}

impl RecommendationThresholds {
    pub fn from_env() -> Self {
        let mut out = Self::default();
        let read = |key: &str| {
            std::env::var(key)
                .ok()
                .and_then(|s| s.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite() && *v >= 0.0)
        };

        if let Some(v) = read("KPI_THRESHOLD_CP_ONBOARDING_PER_DAY") {
            out.cp_onboarding_per_day = v;
        }
        if let Some(v) = read("KPI_THRESHOLD_ACTIVE_CP_PER_DAY") {
            out.active_cp_per_day = v;
        }
        if let Some(v) = read("KPI_THRESHOLD_MEETINGS_PER_DAY") {
            out.meetings_per_day = v;
        }
        if let Some(v) = read("KPI_THRESHOLD_REVENUE_PER_DAY") {
            out.revenue_per_day = v;
        }

        out
    }

    pub fn for_metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::CpOnboarding => self.cp_onboarding_per_day,
            Metric::ActiveCp => self.active_cp_per_day,
            Metric::Meetings => self.meetings_per_day,
            Metric::Revenue => self.revenue_per_day,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Urgent,
    Steady,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub metric: Metric,
    pub percentage: u64,
    pub gap: f64,
    pub required_daily: f64,
    pub urgency: Urgency,
    pub action: String,
}

/// One recommendation per team metric that has a target and sits below
/// [`RECOMMEND_BELOW_PERCENT`].
pub fn recommendations(
    team: &ProgressSet,
    thresholds: &RecommendationThresholds,
) -> Vec<Recommendation> {
    team.iter()
        .filter(|p| p.target > 0.0 && p.percentage < RECOMMEND_BELOW_PERCENT)
        .map(|p| {
            let urgency = if p.required_daily > thresholds.for_metric(p.metric) {
                Urgency::Urgent
            } else {
                Urgency::Steady
            };
            Recommendation {
                metric: p.metric,
                percentage: p.percentage,
                gap: p.gap(),
                required_daily: p.required_daily,
                urgency,
                action: action_text(p, urgency),
            }
        })
        .collect()
}

fn action_text(p: &MetricProgress, urgency: Urgency) -> String {
    let rate = p.required_daily;
    match (p.metric, urgency) {
        (Metric::CpOnboarding, Urgency::Urgent) => format!(
            "Onboarding is far behind: {rate:.1} new channel partners are needed per day. Run a partner acquisition drive across all RMs."
        ),
        (Metric::CpOnboarding, Urgency::Steady) => format!(
            "Keep onboarding about {rate:.1} channel partners per day to close the gap."
        ),
        (Metric::ActiveCp, Urgency::Urgent) => format!(
            "Too few partners are transacting: {rate:.1} more active partners are needed per day. Re-engage dormant partners with RM follow-ups."
        ),
        (Metric::ActiveCp, Urgency::Steady) => format!(
            "Convert about {rate:.1} onboarded partners per day into their first sale."
        ),
        (Metric::Meetings, Urgency::Urgent) => format!(
            "Meeting volume is critical: {rate:.1} meetings are needed per day. Block calendar time for partner visits."
        ),
        (Metric::Meetings, Urgency::Steady) => format!(
            "Schedule about {rate:.1} partner meetings per day to stay on pace."
        ),
        (Metric::Revenue, Urgency::Urgent) => format!(
            "Revenue is far behind: {rate:.0} is needed per day. Prioritise high-value deals and pending closures."
        ),
        (Metric::Revenue, Urgency::Steady) => format!(
            "Close about {rate:.0} in sales per day to reach the revenue target."
        ),
    }
}

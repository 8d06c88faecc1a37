use crate::domain::entities::{non_negative, Target};
use crate::time::PeriodWindow;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    CpOnboarding,
    ActiveCp,
    Meetings,
    Revenue,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::CpOnboarding,
        Metric::ActiveCp,
        Metric::Meetings,
        Metric::Revenue,
    ];
}

/// One number per KPI metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricValues {
    pub cp_onboarding: f64,
    pub active_cp: f64,
    pub meetings: f64,
    pub revenue: f64,
}

impl MetricValues {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::CpOnboarding => self.cp_onboarding,
            Metric::ActiveCp => self.active_cp,
            Metric::Meetings => self.meetings,
            Metric::Revenue => self.revenue,
        }
    }

    pub fn from_target(target: &Target) -> Self {
        Self {
            cp_onboarding: non_negative(target.cp_onboarding_target),
            active_cp: non_negative(target.active_cp_target),
            meetings: non_negative(target.meetings_target),
            revenue: non_negative(target.revenue_target),
        }
    }

    pub fn add(&mut self, other: &MetricValues) {
        self.cp_onboarding += other.cp_onboarding;
        self.active_cp += other.active_cp;
        self.meetings += other.meetings;
        self.revenue += other.revenue;
    }
}

/// Achievement of one metric against its target within a period window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricProgress {
    pub metric: Metric,
    pub achieved: f64,
    pub target: f64,
    pub percentage: u64,
    /// Daily rate still needed to hit the target. Negative once exceeded.
    pub required_daily: f64,
    /// Daily rate achieved so far.
    pub current_daily: f64,
    /// `achieved + required_daily * days_remaining`.
    pub projected: f64,
    /// End-of-period value if the current daily rate holds.
    pub run_rate_projected: f64,
}

impl MetricProgress {
    pub fn compute(metric: Metric, achieved: f64, target: f64, window: &PeriodWindow) -> Self {
        let current_daily = achieved / window.elapsed_divisor();
        let required_daily = (target - achieved) / window.pace_divisor();
        let days_remaining = window.days_remaining as f64;
        Self {
            metric,
            achieved,
            target,
            percentage: percentage(achieved, target),
            required_daily,
            current_daily,
            projected: achieved + required_daily * days_remaining,
            run_rate_projected: achieved + current_daily * days_remaining,
        }
    }

    pub fn gap(&self) -> f64 {
        self.target - self.achieved
    }
}

/// `round(achieved / target * 100)`, with 0 for a zero or unusable target.
pub fn percentage(achieved: f64, target: f64) -> u64 {
    if !(target.is_finite() && target > 0.0) || !achieved.is_finite() {
        return 0;
    }
    let pct = (achieved / target * 100.0).round();
    if pct <= 0.0 {
        0
    } else {
        pct as u64
    }
}

/// The four metrics side by side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressSet {
    pub cp_onboarding: MetricProgress,
    pub active_cp: MetricProgress,
    pub meetings: MetricProgress,
    pub revenue: MetricProgress,
}

impl ProgressSet {
    pub fn compute(achieved: &MetricValues, target: &MetricValues, window: &PeriodWindow) -> Self {
        let progress = |m: Metric| MetricProgress::compute(m, achieved.get(m), target.get(m), window);
        Self {
            cp_onboarding: progress(Metric::CpOnboarding),
            active_cp: progress(Metric::ActiveCp),
            meetings: progress(Metric::Meetings),
            revenue: progress(Metric::Revenue),
        }
    }

    pub fn get(&self, metric: Metric) -> &MetricProgress {
        match metric {
            Metric::CpOnboarding => &self.cp_onboarding,
            Metric::ActiveCp => &self.active_cp,
            Metric::Meetings => &self.meetings,
            Metric::Revenue => &self.revenue,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricProgress> {
        Metric::ALL.into_iter().map(move |m| self.get(m))
    }

    pub fn avg_percentage(&self) -> f64 {
        let total: u64 = self.iter().map(|p| p.percentage).sum();
        total as f64 / Metric::ALL.len() as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PerformanceStatus {
    #[serde(rename = "Achieved")]
    Achieved,
    #[serde(rename = "At Risk")]
    AtRisk,
    #[serde(rename = "Behind")]
    Behind,
    #[serde(rename = "Off Track")]
    OffTrack,
}

impl PerformanceStatus {
    pub fn classify(avg_percentage: f64) -> Self {
        if avg_percentage >= 100.0 {
            Self::Achieved
        } else if avg_percentage >= 80.0 {
            Self::AtRisk
        } else if avg_percentage >= 50.0 {
            Self::Behind
        } else {
            Self::OffTrack
        }
    }
}

use crate::domain::entities::non_negative;
use crate::domain::{CrmSnapshot, EntityId, MeetingOutcome, RelationshipManager, RmStatus, Target};
use crate::kpi::metrics::{MetricValues, PerformanceStatus, ProgressSet};
use crate::kpi::recommend::{recommendations, Recommendation, RecommendationThresholds};
use crate::time::{self, period_key, PeriodWindow, Range};
use chrono::{FixedOffset, NaiveDateTime, Offset, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// RMs averaging below this percentage are flagged for attention.
pub const ATTENTION_BELOW_PERCENT: f64 = 50.0;

#[derive(Debug, Clone, Copy)]
pub struct KpiOptions {
    /// Zone that stored dates and `now` are interpreted in.
    pub utc_offset: FixedOffset,
    pub thresholds: RecommendationThresholds,
}

impl Default for KpiOptions {
    fn default() -> Self {
        Self {
            utc_offset: Utc.fix(),
            thresholds: RecommendationThresholds::default(),
        }
    }
}

impl KpiOptions {
    pub fn from_env() -> anyhow::Result<Self> {
        let minutes = match std::env::var("KPI_UTC_OFFSET_MINUTES") {
            Ok(s) if !s.trim().is_empty() => s
                .trim()
                .parse::<i32>()
                .map_err(|e| anyhow::anyhow!("KPI_UTC_OFFSET_MINUTES must be an integer: {e}"))?,
            _ => 0,
        };

        Ok(Self {
            utc_offset: time::period::offset_from_minutes(minutes)?,
            thresholds: RecommendationThresholds::from_env(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeBreakdown {
    pub interested: u64,
    pub not_interested: u64,
    pub follow_up: u64,
    pub deal_win: u64,
    pub other: u64,
}

impl OutcomeBreakdown {
    fn record(&mut self, outcome: Option<MeetingOutcome>) {
        match outcome.unwrap_or(MeetingOutcome::Other) {
            MeetingOutcome::Interested => self.interested += 1,
            MeetingOutcome::NotInterested => self.not_interested += 1,
            MeetingOutcome::FollowUp => self.follow_up += 1,
            MeetingOutcome::DealWin => self.deal_win += 1,
            MeetingOutcome::Other => self.other += 1,
        }
    }

    fn add(&mut self, other: &OutcomeBreakdown) {
        self.interested += other.interested;
        self.not_interested += other.not_interested;
        self.follow_up += other.follow_up;
        self.deal_win += other.deal_win;
        self.other += other.other;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RmPerformance {
    pub rm_id: Option<EntityId>,
    pub name: String,
    pub status: RmStatus,
    pub has_target: bool,
    pub achieved: MetricValues,
    pub target: MetricValues,
    pub progress: ProgressSet,
    pub avg_percentage: f64,
    pub performance_status: PerformanceStatus,
    pub commission: f64,
    pub outcomes: OutcomeBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSummary {
    pub rm_count: usize,
    pub achieved: MetricValues,
    pub target: MetricValues,
    pub progress: ProgressSet,
    pub avg_percentage: f64,
    pub performance_status: PerformanceStatus,
    pub commission: f64,
    pub outcomes: OutcomeBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRm {
    pub rm_id: Option<EntityId>,
    pub name: String,
    pub avg_percentage: f64,
    pub performance_status: PerformanceStatus,
}

impl From<&RmPerformance> for RankedRm {
    fn from(p: &RmPerformance) -> Self {
        Self {
            rm_id: p.rm_id.clone(),
            name: p.name.clone(),
            avg_percentage: p.avg_percentage,
            performance_status: p.performance_status,
        }
    }
}

/// Admin dashboard: every RM, the team roll-up and what to do about gaps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiDashboard {
    pub window: PeriodWindow,
    pub period_key: String,
    /// Ordered by `avg_percentage`, best first.
    pub rms: Vec<RmPerformance>,
    pub team: TeamSummary,
    pub recommendations: Vec<Recommendation>,
    pub top_performer: Option<RankedRm>,
    pub needs_attention: Vec<RankedRm>,
}

#[derive(Debug, Default)]
struct Tally<'a> {
    cp_onboarding: u64,
    active_cps: HashSet<&'a EntityId>,
    meetings: u64,
    revenue: f64,
    commission: f64,
    outcomes: OutcomeBreakdown,
}

/// Per-RM counts over the window, keyed by owning RM id.
fn tally_by_rm<'a>(
    snapshot: &'a CrmSnapshot,
    window: &PeriodWindow,
    offset: FixedOffset,
) -> HashMap<&'a EntityId, Tally<'a>> {
    let in_window = |raw: Option<&str>| {
        raw.and_then(|s| time::parse_instant(s, offset))
            .is_some_and(|t| window.contains(t))
    };

    let mut out: HashMap<&EntityId, Tally> = HashMap::new();

    for cp in &snapshot.channel_partners {
        let Some(rm_id) = cp.rm_id.as_ref() else { continue };
        if in_window(cp.onboard_date.as_deref()) {
            out.entry(rm_id).or_default().cp_onboarding += 1;
        }
    }

    for m in &snapshot.meetings {
        let Some(rm_id) = m.rm_id.as_ref() else { continue };
        if in_window(m.meeting_date.as_deref()) {
            let tally = out.entry(rm_id).or_default();
            tally.meetings += 1;
            tally.outcomes.record(m.outcome);
        }
    }

    for sale in &snapshot.sales {
        let Some(rm_id) = sale.rm_id.as_ref() else { continue };
        if in_window(sale.sale_date.as_deref()) {
            let tally = out.entry(rm_id).or_default();
            tally.revenue += non_negative(sale.sale_amount);
            tally.commission += non_negative(sale.commission_amount);
            if let Some(cp_id) = sale.cp_id.as_ref() {
                tally.active_cps.insert(cp_id);
            }
        }
    }

    out
}

/// First Target row per RM for the period key.
fn targets_for_period<'a>(targets: &'a [Target], key: &str) -> HashMap<&'a EntityId, &'a Target> {
    let mut out = HashMap::new();
    for t in targets.iter().filter(|t| t.matches_period(key)) {
        if let Some(rm_id) = t.rm_id.as_ref() {
            out.entry(rm_id).or_insert(t);
        }
    }
    out
}

fn rm_performance(
    rm: &RelationshipManager,
    tallies: &HashMap<&EntityId, Tally>,
    targets: &HashMap<&EntityId, &Target>,
    window: &PeriodWindow,
) -> RmPerformance {
    let tally = rm.id.as_ref().and_then(|id| tallies.get(id));
    let target_row = rm.id.as_ref().and_then(|id| targets.get(id)).copied();

    let achieved = tally.map_or_else(MetricValues::default, |t| MetricValues {
        cp_onboarding: t.cp_onboarding as f64,
        active_cp: t.active_cps.len() as f64,
        meetings: t.meetings as f64,
        revenue: t.revenue,
    });
    let target = target_row.map_or_else(MetricValues::default, MetricValues::from_target);

    let progress = ProgressSet::compute(&achieved, &target, window);
    let avg_percentage = progress.avg_percentage();

    RmPerformance {
        rm_id: rm.id.clone(),
        name: rm.name.clone(),
        status: rm.status,
        has_target: target_row.is_some(),
        achieved,
        target,
        progress,
        avg_percentage,
        performance_status: PerformanceStatus::classify(avg_percentage),
        commission: tally.map_or(0.0, |t| t.commission),
        outcomes: tally.map(|t| t.outcomes).unwrap_or_default(),
    }
}

fn by_avg_desc(a: &RmPerformance, b: &RmPerformance) -> Ordering {
    b.avg_percentage
        .partial_cmp(&a.avg_percentage)
        .unwrap_or(Ordering::Equal)
}

/// Computes the admin dashboard for `range` as of `now`.
///
/// Pure over its inputs: no I/O, and the same snapshot and `now` always give
/// the same result.
pub fn compute_dashboard(
    snapshot: &CrmSnapshot,
    range: Range,
    now: NaiveDateTime,
    opts: &KpiOptions,
) -> KpiDashboard {
    let window = PeriodWindow::resolve(range, now);
    let key = period_key(now);

    let tallies = tally_by_rm(snapshot, &window, opts.utc_offset);
    let targets = targets_for_period(&snapshot.targets, &key);

    let mut rms: Vec<RmPerformance> = snapshot
        .rms
        .iter()
        .map(|rm| rm_performance(rm, &tallies, &targets, &window))
        .collect();

    let mut team_achieved = MetricValues::default();
    let mut commission = 0.0;
    let mut outcomes = OutcomeBreakdown::default();
    for p in &rms {
        team_achieved.add(&p.achieved);
        commission += p.commission;
        outcomes.add(&p.outcomes);
    }

    let mut team_target = MetricValues::default();
    for t in targets.values() {
        team_target.add(&MetricValues::from_target(t));
    }

    let team_progress = ProgressSet::compute(&team_achieved, &team_target, &window);
    let team_avg = team_progress.avg_percentage();
    let team = TeamSummary {
        rm_count: rms.len(),
        achieved: team_achieved,
        target: team_target,
        progress: team_progress,
        avg_percentage: team_avg,
        performance_status: PerformanceStatus::classify(team_avg),
        commission,
        outcomes,
    };

    // Stable: ties keep store order.
    rms.sort_by(by_avg_desc);

    let top_performer = rms.first().map(RankedRm::from);
    let needs_attention = rms
        .iter()
        .filter(|p| p.avg_percentage < ATTENTION_BELOW_PERCENT)
        .map(RankedRm::from)
        .collect();

    KpiDashboard {
        window,
        period_key: key,
        recommendations: recommendations(&team.progress, &opts.thresholds),
        rms,
        team,
        top_performer,
        needs_attention,
    }
}

/// Single-RM view. `None` when no RM has `rm_id`.
pub fn rm_dashboard(
    snapshot: &CrmSnapshot,
    rm_id: &EntityId,
    range: Range,
    now: NaiveDateTime,
    opts: &KpiOptions,
) -> Option<RmPerformance> {
    let rm = snapshot.rms.iter().find(|rm| rm.id.as_ref() == Some(rm_id))?;
    let window = PeriodWindow::resolve(range, now);
    let key = period_key(now);

    let tallies = tally_by_rm(snapshot, &window, opts.utc_offset);
    let targets = targets_for_period(&snapshot.targets, &key);
    Some(rm_performance(rm, &tallies, &targets, &window))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kpi::metrics::Metric;
    use chrono::NaiveDate;
    use serde_json::json;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn snapshot(v: serde_json::Value) -> CrmSnapshot {
        serde_json::from_value(v).unwrap()
    }

    fn sunday() -> NaiveDateTime {
        at(2026, 3, 15)
    }

    fn week_example() -> CrmSnapshot {
        snapshot(json!({
            "rms": [{"id": 1, "name": "Asha", "status": "active"}],
            "sales": [
                {"id": 1, "rm_id": 1, "cp_id": 10, "sale_amount": 50000, "sale_date": "2026-03-10", "commission_amount": 500}
            ],
            "targets": [
                {"id": 1, "rm_id": "1", "period": "march-2026", "cp_onboarding_target": 0,
                 "active_cp_target": 0, "meetings_target": 0, "revenue_target": 200000}
            ]
        }))
    }

    #[test]
    fn week_revenue_example() {
        let dash = compute_dashboard(&week_example(), Range::Week, sunday(), &KpiOptions::default());

        assert_eq!(dash.window.start, at(2026, 3, 9));
        assert_eq!(dash.window.days_remaining, 1);
        assert_eq!(dash.period_key, "march-2026");

        let rm = &dash.rms[0];
        assert!(rm.has_target);
        assert_eq!(rm.achieved.revenue, 50_000.0);
        assert_eq!(rm.achieved.active_cp, 1.0);
        assert_eq!(rm.progress.revenue.percentage, 25);
        assert_eq!(rm.progress.revenue.required_daily, 150_000.0);
        assert_eq!(rm.commission, 500.0);

        // Zero targets yield 0%, never NaN or infinity.
        assert_eq!(rm.progress.cp_onboarding.percentage, 0);
        assert_eq!(rm.progress.active_cp.percentage, 0);
    }

    #[test]
    fn week_example_projects_to_target_at_required_pace() {
        let dash = compute_dashboard(&week_example(), Range::Week, sunday(), &KpiOptions::default());
        let revenue = &dash.team.progress.revenue;
        assert_eq!(revenue.required_daily, 150_000.0);
        // achieved + required_daily * days_remaining = 50000 + 150000 * 1
        assert_eq!(revenue.projected, 200_000.0);
        // Six days elapsed at 50000 total.
        assert!((revenue.run_rate_projected - (50_000.0 + 50_000.0 / 6.0)).abs() < 1e-6);
    }

    #[test]
    fn rows_dated_after_now_are_excluded() {
        let snap = snapshot(json!({
            "rms": [{"id": 1, "name": "Asha"}],
            "channel_partners": [{"id": 4, "rm_id": 1, "cp_name": "Late", "onboard_date": "2026-03-18"}],
            "meetings": [{"rm_id": 1, "cp_id": 4, "meeting_date": "2026-03-20T10:00:00", "outcome": "interested"}],
            "sales": [{"rm_id": 1, "cp_id": 4, "sale_amount": 70000, "sale_date": "2026-03-25"}]
        }));
        let dash = compute_dashboard(&snap, Range::Month, sunday(), &KpiOptions::default());
        let rm = &dash.rms[0];
        assert_eq!(rm.achieved.cp_onboarding, 0.0);
        assert_eq!(rm.achieved.meetings, 0.0);
        assert_eq!(rm.achieved.revenue, 0.0);
        assert_eq!(rm.achieved.active_cp, 0.0);
        assert_eq!(rm.outcomes, OutcomeBreakdown::default());
    }

    #[test]
    fn zero_target_with_no_activity_is_zero_percent() {
        let snap = snapshot(json!({
            "rms": [{"id": "7", "name": "Nikhil"}],
            "targets": [{"rm_id": 7, "period": "march-2026", "cp_onboarding_target": 0}]
        }));
        let dash = compute_dashboard(&snap, Range::Month, sunday(), &KpiOptions::default());
        let rm = &dash.rms[0];
        assert_eq!(rm.progress.cp_onboarding.percentage, 0);
        assert_eq!(rm.avg_percentage, 0.0);
        let text = serde_json::to_string(&dash).unwrap();
        assert!(!text.contains("NaN") && !text.contains("inf"));
    }

    #[test]
    fn boundary_sale_at_start_is_included_and_before_is_excluded() {
        let snap = snapshot(json!({
            "rms": [{"id": 1, "name": "Asha"}],
            "sales": [
                {"rm_id": 1, "cp_id": 1, "sale_amount": 100, "sale_date": "2026-03-09T00:00:00"},
                {"rm_id": 1, "cp_id": 2, "sale_amount": 1, "sale_date": "2026-03-08T23:59:59.999"}
            ]
        }));
        let dash = compute_dashboard(&snap, Range::Week, sunday(), &KpiOptions::default());
        assert_eq!(dash.rms[0].achieved.revenue, 100.0);
        assert_eq!(dash.rms[0].achieved.active_cp, 1.0);
    }

    #[test]
    fn malformed_dates_are_excluded_not_fatal() {
        let snap = snapshot(json!({
            "rms": [{"id": 1, "name": "Asha"}],
            "channel_partners": [
                {"id": 1, "rm_id": 1, "cp_name": "A", "onboard_date": "garbage"},
                {"id": 2, "rm_id": 1, "cp_name": "B"},
                {"id": 3, "rm_id": 1, "cp_name": "C", "onboard_date": "2026-03-12"}
            ],
            "meetings": [
                {"rm_id": 1, "cp_id": 1, "meeting_date": "31/31/2026", "outcome": "interested"}
            ]
        }));
        let dash = compute_dashboard(&snap, Range::Week, sunday(), &KpiOptions::default());
        assert_eq!(dash.rms[0].achieved.cp_onboarding, 1.0);
        assert_eq!(dash.rms[0].achieved.meetings, 0.0);
    }

    #[test]
    fn active_cp_counts_distinct_partners_with_sales() {
        let snap = snapshot(json!({
            "rms": [{"id": 1, "name": "Asha"}, {"id": 2, "name": "Ravi"}],
            "sales": [
                {"rm_id": 1, "cp_id": 5, "sale_amount": 10, "sale_date": "2026-03-02"},
                {"rm_id": "1", "cp_id": "5", "sale_amount": 10, "sale_date": "2026-03-03"},
                {"rm_id": 1, "cp_id": 6, "sale_amount": "15", "sale_date": "2026-03-04"},
                {"rm_id": 1, "sale_amount": 5, "sale_date": "2026-03-04"},
                {"rm_id": 2, "cp_id": 5, "sale_amount": null, "sale_date": "2026-03-05"}
            ]
        }));
        let dash = compute_dashboard(&snap, Range::Month, sunday(), &KpiOptions::default());
        let asha = dash.rms.iter().find(|r| r.name == "Asha").unwrap();
        let ravi = dash.rms.iter().find(|r| r.name == "Ravi").unwrap();
        assert_eq!(asha.achieved.active_cp, 2.0);
        assert_eq!(asha.achieved.revenue, 40.0);
        assert_eq!(ravi.achieved.active_cp, 1.0);
        assert_eq!(ravi.achieved.revenue, 0.0);
        assert_eq!(dash.team.achieved.active_cp, 3.0);
    }

    #[test]
    fn adding_a_sale_never_decreases_revenue_or_active_cp() {
        let base = week_example();
        let before = compute_dashboard(&base, Range::Week, sunday(), &KpiOptions::default());

        let mut more = base.clone();
        more.sales.push(
            serde_json::from_value(json!({"rm_id": 1, "cp_id": 11, "sale_amount": 0, "sale_date": "2026-03-14"}))
                .unwrap(),
        );
        let after = compute_dashboard(&more, Range::Week, sunday(), &KpiOptions::default());

        assert!(after.rms[0].achieved.revenue >= before.rms[0].achieved.revenue);
        assert!(after.rms[0].achieved.active_cp >= before.rms[0].achieved.active_cp);
    }

    #[test]
    fn same_inputs_same_output() {
        let snap = week_example();
        let a = compute_dashboard(&snap, Range::Week, sunday(), &KpiOptions::default());
        let b = compute_dashboard(&snap, Range::Week, sunday(), &KpiOptions::default());
        assert_eq!(a, b);
    }

    #[test]
    fn rm_without_target_is_never_achieved() {
        let snap = snapshot(json!({
            "rms": [{"id": 1, "name": "Asha"}],
            "channel_partners": [{"id": 1, "rm_id": 1, "cp_name": "A", "onboard_date": "2026-03-10"}],
            "meetings": [{"rm_id": 1, "cp_id": 1, "meeting_date": "2026-03-10T11:00:00", "outcome": "deal_win"}],
            "sales": [{"rm_id": 1, "cp_id": 1, "sale_amount": 900000, "sale_date": "2026-03-10"}],
            "targets": [{"rm_id": 1, "period": "february-2026", "revenue_target": 1}]
        }));
        let dash = compute_dashboard(&snap, Range::Month, sunday(), &KpiOptions::default());
        let rm = &dash.rms[0];
        assert!(!rm.has_target);
        for p in rm.progress.iter() {
            assert_eq!(p.percentage, 0);
        }
        assert_eq!(rm.performance_status, PerformanceStatus::OffTrack);
        assert_eq!(rm.outcomes.deal_win, 1);
    }

    #[test]
    fn ranks_top_performer_and_attention_list() {
        let snap = snapshot(json!({
            "rms": [{"id": 1, "name": "Low"}, {"id": 2, "name": "High"}],
            "meetings": [
                {"rm_id": 1, "meeting_date": "2026-03-02"},
                {"rm_id": 1, "meeting_date": "2026-03-03"},
                {"rm_id": 1, "meeting_date": "2026-03-04"},
                {"rm_id": 1, "meeting_date": "2026-03-05"},
                {"rm_id": 2, "meeting_date": "2026-03-02"},
                {"rm_id": 2, "meeting_date": "2026-03-03"},
                {"rm_id": 2, "meeting_date": "2026-03-04"},
                {"rm_id": 2, "meeting_date": "2026-03-05"},
                {"rm_id": 2, "meeting_date": "2026-03-06"},
                {"rm_id": 2, "meeting_date": "2026-03-07"},
                {"rm_id": 2, "meeting_date": "2026-03-08"},
                {"rm_id": 2, "meeting_date": "2026-03-09"},
                {"rm_id": 2, "meeting_date": "2026-03-10"}
            ],
            "sales": [
                {"rm_id": 1, "cp_id": 1, "sale_amount": 400, "sale_date": "2026-03-02"},
                {"rm_id": 2, "cp_id": 2, "sale_amount": 900, "sale_date": "2026-03-02"}
            ],
            "channel_partners": [
                {"rm_id": 1, "onboard_date": "2026-03-02"},
                {"rm_id": 1, "onboard_date": "2026-03-02"},
                {"rm_id": 1, "onboard_date": "2026-03-02"},
                {"rm_id": 1, "onboard_date": "2026-03-02"},
                {"rm_id": 2, "onboard_date": "2026-03-02"},
                {"rm_id": 2, "onboard_date": "2026-03-02"},
                {"rm_id": 2, "onboard_date": "2026-03-02"},
                {"rm_id": 2, "onboard_date": "2026-03-02"},
                {"rm_id": 2, "onboard_date": "2026-03-02"},
                {"rm_id": 2, "onboard_date": "2026-03-02"},
                {"rm_id": 2, "onboard_date": "2026-03-02"},
                {"rm_id": 2, "onboard_date": "2026-03-02"},
                {"rm_id": 2, "onboard_date": "2026-03-02"}
            ],
            "targets": [
                {"rm_id": 1, "period": "march-2026", "cp_onboarding_target": 10, "active_cp_target": 1,
                 "meetings_target": 10, "revenue_target": 1000},
                {"rm_id": 2, "period": "march-2026", "cp_onboarding_target": 10, "active_cp_target": 1,
                 "meetings_target": 10, "revenue_target": 1000}
            ]
        }));
        let dash = compute_dashboard(&snap, Range::Month, sunday(), &KpiOptions::default());

        // High: 90 + 100 + 90 + 90 = 370 / 4 = 92.5; Low: 40 + 100 + 40 + 40 = 55.
        let top = dash.top_performer.as_ref().unwrap();
        assert_eq!(top.name, "High");
        assert_eq!(top.avg_percentage, 92.5);
        assert_eq!(top.performance_status, PerformanceStatus::AtRisk);
        assert_eq!(dash.rms[1].avg_percentage, 55.0);
        assert!(dash.needs_attention.is_empty());

        // Team targets are summed, not scaled by RM count.
        assert_eq!(dash.team.target.revenue, 2000.0);
        assert_eq!(dash.team.achieved.revenue, 1300.0);
        assert_eq!(dash.team.progress.revenue.percentage, 65);
        assert_eq!(dash.team.rm_count, 2);
        let recommended: Vec<Metric> = dash.recommendations.iter().map(|r| r.metric).collect();
        assert_eq!(recommended, vec![Metric::CpOnboarding, Metric::Meetings, Metric::Revenue]);
    }

    #[test]
    fn attention_list_holds_rms_below_fifty() {
        let snap = snapshot(json!({
            "rms": [{"id": 1, "name": "Ninety"}, {"id": 2, "name": "Forty"}],
            "sales": [
                {"rm_id": 1, "cp_id": 1, "sale_amount": 260, "sale_date": "2026-03-02"},
                {"rm_id": 2, "cp_id": 2, "sale_amount": 60, "sale_date": "2026-03-02"}
            ],
            "targets": [
                {"rm_id": 1, "period": "march-2026", "revenue_target": 100, "active_cp_target": 1,
                 "cp_onboarding_target": 0, "meetings_target": 0},
                {"rm_id": 2, "period": "march-2026", "revenue_target": 100, "active_cp_target": 1,
                 "cp_onboarding_target": 0, "meetings_target": 0}
            ]
        }));
        // Ninety: (0 + 100 + 0 + 260) / 4 = 90; Forty: (0 + 100 + 0 + 60) / 4 = 40.
        let dash = compute_dashboard(&snap, Range::Month, sunday(), &KpiOptions::default());
        assert_eq!(dash.top_performer.as_ref().unwrap().name, "Ninety");
        assert_eq!(dash.top_performer.as_ref().unwrap().avg_percentage, 90.0);
        assert_eq!(dash.needs_attention.len(), 1);
        assert_eq!(dash.needs_attention[0].name, "Forty");
        assert_eq!(dash.needs_attention[0].avg_percentage, 40.0);
    }

    #[test]
    fn empty_snapshot_yields_empty_dashboard() {
        let dash = compute_dashboard(&CrmSnapshot::default(), Range::Today, sunday(), &KpiOptions::default());
        assert!(dash.rms.is_empty());
        assert!(dash.top_performer.is_none());
        assert!(dash.needs_attention.is_empty());
        assert!(dash.recommendations.is_empty());
        assert_eq!(dash.team.avg_percentage, 0.0);
    }

    #[test]
    fn rm_dashboard_finds_by_canonical_id() {
        let snap = week_example();
        let opts = KpiOptions::default();
        let p = rm_dashboard(&snap, &EntityId::from(1), Range::Week, sunday(), &opts).unwrap();
        assert_eq!(p.achieved.revenue, 50_000.0);
        assert!(rm_dashboard(&snap, &EntityId::from("99"), Range::Week, sunday(), &opts).is_none());
    }

    #[test]
    fn timestamps_are_read_in_the_configured_offset() {
        // 2026-03-08T20:00Z is already Monday 01:30 in UTC+05:30.
        let snap = snapshot(json!({
            "rms": [{"id": 1, "name": "Asha"}],
            "meetings": [{"rm_id": 1, "meeting_date": "2026-03-08T20:00:00Z"}]
        }));
        let utc = compute_dashboard(&snap, Range::Week, sunday(), &KpiOptions::default());
        assert_eq!(utc.rms[0].achieved.meetings, 0.0);

        let ist = KpiOptions {
            utc_offset: FixedOffset::east_opt(330 * 60).unwrap(),
            ..KpiOptions::default()
        };
        let local = compute_dashboard(&snap, Range::Week, sunday(), &ist);
        assert_eq!(local.rms[0].achieved.meetings, 1.0);
    }
}

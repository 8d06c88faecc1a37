use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crm_kpi_core::domain::{EntityId, Target};
use crm_kpi_core::kpi::{self, KpiOptions};
use crm_kpi_core::store::targets::upsert_target;
use crm_kpi_core::store::{CrmStore, HttpJsonStore, MemoryStore};
use crm_kpi_core::time::{self, Range};

#[derive(Debug, Parser)]
#[command(name = "crm_kpi_worker")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute the KPI dashboard and print it as JSON.
    Report(ReportArgs),
    /// Create or update an RM's target row for a period.
    SetTarget(SetTargetArgs),
}

#[derive(Debug, Args)]
struct ReportArgs {
    /// today, week or month.
    #[arg(long, default_value = "month")]
    range: String,

    /// Evaluation time (YYYY-MM-DD or ISO timestamp). Defaults to now.
    #[arg(long)]
    now: Option<String>,

    /// Only report this RM.
    #[arg(long)]
    rm_id: Option<String>,

    /// Read a json-server db.json instead of calling CRM_STORE_BASE_URL.
    #[arg(long)]
    db_file: Option<PathBuf>,

    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Args)]
struct SetTargetArgs {
    #[arg(long)]
    rm_id: String,

    /// Period key such as march-2026. Defaults to the current month.
    #[arg(long)]
    period: Option<String>,

    #[arg(long, default_value_t = 0.0)]
    cp_onboarding: f64,

    #[arg(long, default_value_t = 0.0)]
    active_cp: f64,

    #[arg(long, default_value_t = 0.0)]
    meetings: f64,

    #[arg(long, default_value_t = 0.0)]
    revenue: f64,

    /// Print the row that would be written without touching the store.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = crm_kpi_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let cli = Cli::parse();
    let opts = KpiOptions::from_env()?;

    let res = match cli.command {
        Command::Report(args) => report(&settings, &opts, args).await,
        Command::SetTarget(args) => set_target(&settings, &opts, args).await,
    };

    if let Err(err) = &res {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %err, "worker run failed");
    }
    res
}

fn open_store(
    settings: &crm_kpi_core::config::Settings,
    db_file: Option<&PathBuf>,
) -> anyhow::Result<Box<dyn CrmStore>> {
    match db_file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(Box::new(MemoryStore::from_db_json(&text)?))
        }
        None => Ok(Box::new(HttpJsonStore::from_settings(settings)?)),
    }
}

async fn report(
    settings: &crm_kpi_core::config::Settings,
    opts: &KpiOptions,
    args: ReportArgs,
) -> anyhow::Result<()> {
    let range: Range = args.range.parse()?;
    let now = time::period::resolve_now(args.now.as_deref(), chrono::Utc::now(), opts.utc_offset)?;

    let store = open_store(settings, args.db_file.as_ref())?;
    let snapshot = store.fetch_snapshot().await?;

    let out = match args.rm_id.as_deref() {
        Some(rm_id) => {
            let rm_id = EntityId::new(rm_id);
            let perf = kpi::rm_dashboard(&snapshot, &rm_id, range, now, opts)
                .with_context(|| format!("no RM with id {rm_id}"))?;
            serde_json::to_value(perf)?
        }
        None => {
            let dashboard = kpi::compute_dashboard(&snapshot, range, now, opts);
            tracing::info!(
                %range,
                %now,
                period_key = %dashboard.period_key,
                rms = dashboard.rms.len(),
                team_avg = dashboard.team.avg_percentage,
                needs_attention = dashboard.needs_attention.len(),
                "computed KPI dashboard"
            );
            serde_json::to_value(dashboard)?
        }
    };

    let text = if args.pretty {
        serde_json::to_string_pretty(&out)?
    } else {
        serde_json::to_string(&out)?
    };
    println!("{text}");
    Ok(())
}

async fn set_target(
    settings: &crm_kpi_core::config::Settings,
    opts: &KpiOptions,
    args: SetTargetArgs,
) -> anyhow::Result<()> {
    for (name, v) in [
        ("cp_onboarding", args.cp_onboarding),
        ("active_cp", args.active_cp),
        ("meetings", args.meetings),
        ("revenue", args.revenue),
    ] {
        anyhow::ensure!(v.is_finite() && v >= 0.0, "{name} target must be >= 0 (got {v})");
    }

    let period = match args.period {
        Some(p) => p,
        None => {
            let now = time::period::resolve_now(None, chrono::Utc::now(), opts.utc_offset)?;
            time::period_key(now)
        }
    };

    let target = Target {
        id: None,
        rm_id: Some(EntityId::new(&args.rm_id)),
        period,
        cp_onboarding_target: args.cp_onboarding,
        active_cp_target: args.active_cp,
        meetings_target: args.meetings,
        revenue_target: args.revenue,
    };

    if args.dry_run {
        tracing::info!(rm_id = %args.rm_id, period = %target.period, dry_run = true, "target not written");
        println!("{}", serde_json::to_string(&target)?);
        return Ok(());
    }

    let store = open_store(settings, None)?;
    let (outcome, stored) = upsert_target(store.as_ref(), &target).await?;
    println!(
        "{}",
        serde_json::json!({ "outcome": outcome, "target": stored })
    );
    Ok(())
}

fn init_sentry(settings: &crm_kpi_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

//! Demo CLI: runs a synthetic EPS factory scenario through the scheduling
//! engine end to end and prints the resulting KPIs.
//!
//! Usage: `eps-scheduler-demo [small|large]`

use eps_scheduler::calendar::{Calendar, CalendarConfig};
use eps_scheduler::demo_data::{self, DemoSize};
use eps_scheduler::engine::{Engine, EngineConfig};
use eps_scheduler::mmo_synthesis;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let size = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<DemoSize>().ok())
        .unwrap_or(DemoSize::Small);

    tracing::info!(size = size.as_str(), "generating demo dataset");
    let dataset = demo_data::generate(size);

    let (mmos, warnings) = mmo_synthesis::synthesize(
        &dataset.orders,
        &dataset.products,
        &dataset.bom,
        &dataset.mold_calcs,
        &[],
    );
    for warning in &warnings {
        tracing::warn!(%warning, "mmo synthesis warning");
    }
    tracing::info!(mmo_count = mmos.len(), "synthesized manufacturing orders");

    let calendar = Calendar::new(dataset.calendar_days, CalendarConfig::default());
    let engine = Engine::new(dataset.mold_calcs, calendar, dataset.downtimes, EngineConfig::default());

    let schedule_from = dataset
        .orders
        .iter()
        .map(|o| o.created_at)
        .min()
        .unwrap_or_else(|| chrono::NaiveDate::from_ymd_opt(2025, 12, 1).unwrap().and_hms_opt(0, 0, 0).unwrap());

    let result = engine.run(mmos, Vec::new(), schedule_from);

    println!("schedule run: {}", result.message);
    println!(
        "scheduled {}/{} mmo(s), {} on time, {} late ({:.1} total lateness days)",
        result.scheduled_mos.len(),
        result.total_mos,
        result.on_time_count,
        result.late_count,
        result.total_lateness_days
    );
    println!("produced {} block(s), {} daily sub-block(s)", result.blocks.len(), result.daily_blocks.len());

    if !result.failed_mos.is_empty() {
        println!("unscheduled mmo(s): {}", result.failed_mos.join(", "));
    }
    for report in &result.delay_reports {
        println!(
            "  late: mmo={} machine={} due={} end={} lateness_days={:.2}",
            report.mmo_id, report.machine_id, report.due_date, report.end, report.lateness_days
        );
    }
}

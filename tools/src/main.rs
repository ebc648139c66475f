//! campaign-runner: headless geoscape campaign runner.
//!
//! Usage:
//!   campaign-runner --seed 12345 --days 90 --db run.db
//!   campaign-runner --seed 7 --lapse one_day --campaign main --quiet
//!   campaign-runner --seed 7 --days 365 --snapshot-out save.json

mod geoscape;

use anyhow::{bail, Context, Result};
use geoscape::{ConsoleSink, DemoGeoscape};
use geoscape_core::{
    clock::TimeLapse,
    command::PlayerCommand,
    config::CampaignConfig,
    engine::CampaignEngine,
    store::SimStore,
};
use std::env;

/// Frames to run before giving up on reaching the target day.
const MAX_FRAMES: u64 = 5_000_000;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let days = parse_arg(&args, "--days", 60u32);
    let frame = parse_arg(&args, "--frame", 0.1f64);
    let quiet = args.iter().any(|a| a == "--quiet");
    let db = str_arg(&args, "--db", ":memory:");
    let data_dir = str_arg(&args, "--data-dir", "./data");
    let campaign = str_arg(&args, "--campaign", "main");
    let lapse_name = str_arg(&args, "--lapse", "one_hour");
    let snapshot_out = args
        .windows(2)
        .find(|w| w[0] == "--snapshot-out")
        .map(|w| w[1].as_str());

    let lapse = TimeLapse::parse(lapse_name)
        .with_context(|| format!("unknown time lapse '{lapse_name}'"))?;
    if lapse.scale() <= 0.0 {
        bail!("time lapse '{lapse_name}' never advances the campaign");
    }

    println!("Geoscape campaign-runner");
    println!("  seed:      {seed}");
    println!("  days:      {days}");
    println!("  lapse:     {}", lapse.label());
    println!("  campaign:  {campaign}");
    println!("  db:        {db}");
    println!("  data_dir:  {data_dir}");
    println!();

    let mut config = CampaignConfig::load(data_dir, campaign)?;
    config.initial_lapse = lapse;

    let store = SimStore::open(db)?;
    store.migrate()?;

    let run_id = format!("run-{}", uuid::Uuid::new_v4());
    let started_at = chrono::Utc::now().to_rfc3339();
    store.insert_run(&run_id, seed, &config.id, env!("CARGO_PKG_VERSION"), &started_at)?;

    let mut engine = CampaignEngine::with_store(
        run_id.clone(),
        seed,
        config,
        Box::new(DemoGeoscape::new()),
        store,
    )?;
    engine.set_sink(Box::new(ConsoleSink::new(quiet)));

    let target_day = engine.state().date().day + days;
    let mut frames = 0u64;
    let mut pauses = 0u64;
    while engine.state().date().day < target_day && !engine.state().is_over() {
        if frames >= MAX_FRAMES {
            log::warn!("run={run_id} frame cap reached at {}", engine.state().date());
            break;
        }
        frames += 1;

        let report = engine.advance(frame);
        if report.time_stopped {
            // Nobody is at the console; acknowledge and carry on.
            pauses += 1;
            engine.apply_command(PlayerCommand::Resume)?;
        }
    }

    engine.shutdown();
    print_summary(&engine, &run_id, frames, pauses)?;

    if let Some(path) = snapshot_out {
        let json = serde_json::to_string_pretty(&engine.snapshot())?;
        std::fs::write(path, json).with_context(|| format!("cannot write {path}"))?;
        println!();
        println!("Snapshot written to {path}");
    }
    Ok(())
}

fn print_summary(engine: &CampaignEngine, run_id: &str, frames: u64, pauses: u64) -> Result<()> {
    let state = engine.state();
    let calendar = state.date().to_calendar();

    println!();
    println!("=== RUN SUMMARY ===");
    println!("  run_id:           {run_id}");
    println!("  frames:           {frames}");
    println!("  time stops:       {pauses}");
    println!(
        "  final date:       {} {} {} (day {})",
        calendar.day,
        calendar.month_name(),
        calendar.year,
        state.date().day
    );
    println!("  credits:          {}", state.credits());
    println!("  bases:            {}", state.base_count());
    println!("  active missions:  {}", state.missions.active_count());
    println!("  missions spawned: {}", state.stats.missions_spawned);
    println!("  missions won:     {}", state.stats.missions_won);
    println!("  missions lost:    {}", state.stats.missions_lost);
    println!("  months closed:    {}", state.stats.months_closed);
    println!("  average XVI:      {:.1}%", state.average_xvi);
    match state.lost() {
        Some(reason) => println!("  outcome:          LOST ({})", reason.message()),
        None => println!("  outcome:          campaign continues"),
    }

    if let Some(store) = engine.store() {
        println!();
        println!("=== EVENT LOG ===");
        for event_type in [
            "mission_spawned",
            "mission_stage_changed",
            "mission_resolved",
            "happiness_changed",
            "budget_settled",
            "time_stopped",
            "hook_failed",
        ] {
            let count = store.event_count(run_id, event_type)?;
            println!("  {event_type:<22} {count}");
        }
    }

    println!();
    println!("=== NATIONS ===");
    for nation in &state.nations {
        println!(
            "  {:<16} happiness {:.2} | funding {:>8} | XVI {}%",
            nation.name,
            nation.happiness(),
            nation.funding(),
            nation.stats[0].xvi_infection
        );
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn str_arg<'a>(args: &'a [String], flag: &str, default: &'a str) -> &'a str {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
        .unwrap_or(default)
}

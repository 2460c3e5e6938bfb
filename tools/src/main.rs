//! report-runner: headless batch runner for one market comparison.
//!
//! Usage:
//!   report-runner --request ticket.json --loans lar.json
//!   report-runner --request ticket.json --loans lar.json --db run.db --json
//!
//! Defaults: --data-dir ./data, crosswalk from
//! <data-dir>/crosswalk/county_crosswalk.json, in-memory database.

use anyhow::{Context, Result};
use fairlend_core::{
    config::ReportConfig,
    crosswalk::{CrosswalkRow, CrosswalkTable},
    engine::{MarketReport, ReportEngine, ReportRequest},
    loan::LoanRecord,
    store::ReportStore,
};
use std::env;
use uuid::Uuid;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let data_dir = arg_value(&args, "--data-dir").unwrap_or("./data");
    let db = arg_value(&args, "--db").unwrap_or(":memory:");
    let json_out = args.iter().any(|a| a == "--json");
    let request_path = arg_value(&args, "--request").context("--request <file> is required")?;
    let loans_path = arg_value(&args, "--loans").context("--loans <file> is required")?;
    let default_crosswalk = format!("{data_dir}/crosswalk/county_crosswalk.json");
    let crosswalk_path = arg_value(&args, "--crosswalk").unwrap_or(&default_crosswalk);

    let config = ReportConfig::load(data_dir)?;
    let request: ReportRequest = read_json(request_path)?;
    let crosswalk_rows: Vec<CrosswalkRow> = read_json(crosswalk_path)?;
    let loans: Vec<LoanRecord> = read_json(loans_path)?;

    if !json_out {
        println!("fair-lending report-runner");
        println!("  data_dir:   {data_dir}");
        println!("  crosswalk:  {crosswalk_path}");
        println!("  loans:      {loans_path} ({} rows)", loans.len());
        println!("  db:         {db}");
        println!("  subject:    {}", request.subject_lender);
        println!();
    }

    let store = ReportStore::open(db)?;
    store.migrate()?;
    store.insert_crosswalk_rows(&crosswalk_rows)?;
    store.insert_loans(&loans)?;
    let crosswalk = CrosswalkTable::from_rows(store.load_crosswalk_rows()?)?;

    let run_id = format!("run-{}", Uuid::new_v4());
    store.insert_run(&run_id, &request.subject_lender, env!("CARGO_PKG_VERSION"))?;

    let mut engine = ReportEngine::new(run_id, config, crosswalk, store);
    let report = engine.run(&request)?;
    for county in &report.unresolved {
        log::warn!(
            "run={} runner: '{}, {}' needs manual correction: {}",
            report.run_id, county.county_name, county.state_name, county.reason
        );
    }
    log::info!(
        "run={} runner: {} markets written ({} loans)",
        report.run_id,
        report.markets.len(),
        report.loans_fetched
    );

    if json_out {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn print_summary(report: &MarketReport) {
    println!("=== RUN SUMMARY ===");
    println!("  run_id:      {}", report.run_id);
    println!("  generated:   {}", report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  counties:    {} resolved, {} unresolved", report.resolved.len(), report.unresolved.len());
    println!("  loans:       {}", report.loans_fetched);

    if !report.unresolved.is_empty() {
        println!();
        println!("=== COUNTIES NEEDING MANUAL CORRECTION ===");
        for county in &report.unresolved {
            println!("  {}, {}: {}", county.county_name, county.state_name, county.reason);
        }
    }

    for market in &report.markets {
        println!();
        println!(
            "=== {} {} ({}) | peers: {} | band: [{:.1}, {:.1}] ===",
            market.market.cbsa_code,
            market.cbsa_name,
            market.market.year,
            market.cohort.len(),
            market.cohort.volume_lower_bound,
            market.cohort.volume_upper_bound
        );
        for m in &market.metrics {
            let flag = match m.significant {
                Some(true)  => "*",
                Some(false) => "",
                None        => "?",
            };
            println!(
                "  {:<18} subject {:>7}%  peer {:>7}%  gap {:>7}{flag}",
                m.metric.label(),
                m.subject.to_string(),
                m.peer.to_string(),
                m.gap.to_string()
            );
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<T> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Cannot read {path}"))?;
    serde_json::from_str(&content).with_context(|| format!("Cannot parse {path}"))
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

use std::error::Error;

use clap::Parser;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

mod config;
mod draw;
mod sim;

use config::{load_access_records, Config};

pub type Key = u64;

#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub struct AccessRecord {
    #[allow(dead_code)]
    timestamp: u64,
    #[allow(dead_code)]
    command: u8,
    key: Key,
    size: u32,
    #[allow(dead_code)]
    ttl: u32,
}

fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::load(Config::parse())?;

    let level: Level = config.log_level.parse()?;
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let access_records = load_access_records(&config)?;
    if access_records.is_empty() {
        return Err(format!("trace {} has no records", config.trace.display()).into());
    }
    info!(
        records = access_records.len(),
        trace = %config.trace.display(),
        "loaded trace"
    );
    debug!("First access record: {:?}", access_records[0]);

    let mut results = Vec::with_capacity(config.policies.len());
    for policy in &config.policies {
        let result = sim::miss_ratio_curve(
            &access_records,
            *policy,
            config.cache_size,
            config.points,
            config.cardinality,
            config.on_update,
        )?;
        for (cache_size, miss_ratio) in &result.points {
            info!(policy = %result.label, cache_size, miss_ratio, "miss ratio");
        }
        results.push(result);
    }

    draw::draw_lines(&results, &config.output)?;
    info!(output = %config.output.display(), "wrote miss ratio curve");

    Ok(())
}

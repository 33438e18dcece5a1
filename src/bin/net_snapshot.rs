use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use rscontrol::models::DEFAULT_SNAPSHOT_PATH;
use rscontrol::services::current_network_counters;

/// Record per-interface network counters for `rscontrol status hardware`.
///
/// Meant to run from cron, e.g. `0 * * * * rscontrol-net-snapshot`.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct SnapshotArgs {
    /// Snapshot file to overwrite
    #[arg(short, long, env = "RSCONTROL_NET_SNAPSHOT", default_value = DEFAULT_SNAPSHOT_PATH)]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = SnapshotArgs::parse();
    let snapshot = current_network_counters();

    snapshot
        .save(&args.output)
        .with_context(|| format!("Failed to write network snapshot {}", args.output.display()))?;

    log::info!(
        "✓ Saved counters for {} interfaces to {}",
        snapshot.interfaces.len(),
        args.output.display()
    );
    Ok(())
}

//! vinhunt CLI: run a search bot, or manage the shared work table.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use vinhunt::config::Config;
use vinhunt::config::secrets::ExposeSecret;
use vinhunt::config::targets::Target;
use vinhunt::db::Db;
use vinhunt::lookup::CarfaxChecksClient;
use vinhunt::model::work::{is_sequence, sequence_range};
use vinhunt::search::{PrefixOrder, RunOutcome, SearchConfig, Searcher};
use vinhunt::telemetry::{TelemetryConfig, init_telemetry};
use vinhunt::vin::{Vin, add_check_digit};

#[derive(Parser)]
#[command(name = "vinhunt", about = "Cooperative VIN search bots")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one search bot until the queue is empty or the lookup service fails
    Run {
        /// Instance number, appended to the bot name
        instance: String,
        /// Target name from the targets file
        target: String,
        /// Search sequentially upward from this sequence instead of at random
        #[arg(value_parser = sequence_arg)]
        start_sequence: Option<String>,
    },
    /// Work table operations
    Work {
        #[command(subcommand)]
        action: WorkAction,
    },
    /// Print a candidate VIN with its check digit corrected
    Vin {
        /// 17-character candidate
        candidate: String,
    },
}

#[derive(Subcommand)]
enum WorkAction {
    /// Insert unclaimed rows for a range of sequence numbers
    Seed {
        target: String,
        /// First sequence; its width sets the zero padding
        from: String,
        /// Last sequence, inclusive
        to: String,
    },
    /// Clear claims left behind by a bot that died mid-search
    Release {
        target: String,
        /// Full bot identity, e.g. rapidapi_carfax-checks_1
        bot: String,
    },
    /// Show row counts for a target
    Stats { target: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            instance,
            target,
            start_sequence,
        } => cmd_run(instance, target, start_sequence).await,
        Command::Work { action } => {
            let config = Config::from_env()?;
            match action {
                WorkAction::Seed { target, from, to } => {
                    cmd_work_seed(&config, &target, &from, &to).await
                }
                WorkAction::Release { target, bot } => {
                    cmd_work_release(&config, &target, &bot).await
                }
                WorkAction::Stats { target } => cmd_work_stats(&config, &target).await,
            }
        }
        Command::Vin { candidate } => cmd_vin(&candidate),
    }
}

fn sequence_arg(raw: &str) -> Result<String, String> {
    if is_sequence(raw) {
        Ok(raw.to_string())
    } else {
        Err(format!("sequence must be digits only, got {raw:?}"))
    }
}

fn cmd_vin(candidate: &str) -> anyhow::Result<()> {
    let vin = add_check_digit(candidate)?;
    if Vin::is_valid(candidate) {
        println!("{vin} (check digit {} already correct)", vin.check_digit());
    } else {
        println!("{vin} (check digit corrected to {})", vin.check_digit());
    }
    Ok(())
}

async fn open_target(config: &Config, name: &str) -> anyhow::Result<(Target, Db)> {
    let target = Target::load(&config.targets_file, name)?;
    let db = Db::connect(config.database_url.expose_secret(), &target.table).await?;
    db.init_schema().await?;
    Ok((target, db))
}

async fn cmd_run(
    instance: String,
    target_name: String,
    start_sequence: Option<String>,
) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let target = Target::load(&config.targets_file, &target_name)?;
    let bot = config.bot_identity(&instance);

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "vinhunt".to_string(),
        log_level: config.log_level.clone(),
        log_file: Some(config.log_file(&target.table, &bot)),
    })?;

    let db = Db::connect(config.database_url.expose_secret(), &target.table).await?;
    db.init_schema().await?;
    let lookup = CarfaxChecksClient::new(&config.lookup())?;

    let searcher = Searcher::new(
        Arc::new(db),
        Arc::new(lookup),
        SearchConfig {
            bot,
            item_type: target.item_type.clone(),
            start_sequence,
            delay_secs: target.delay_secs.clone(),
        },
    );

    let report = searcher.run(PrefixOrder::new(target.prefixes)).await;
    let summary = report.summary;
    match report.outcome {
        RunOutcome::Complete => {
            println!(
                "Complete: {} item(s), {} found, {} lookup(s)",
                summary.items, summary.found, summary.lookups
            );
            Ok(())
        }
        RunOutcome::Aborted { item, vin, error } => {
            anyhow::bail!("lookup failed on item {item} ({vin}), claim released: {error}")
        }
        RunOutcome::InvalidCandidates { item, sequence } => anyhow::bail!(
            "no prefix of target {target_name} makes a valid VIN with sequence {sequence} \
             (item {item}), claim released"
        ),
        RunOutcome::QueueUnavailable(e) => anyhow::bail!("work queue unavailable: {e}"),
    }
}

async fn cmd_work_seed(config: &Config, target: &str, from: &str, to: &str) -> anyhow::Result<()> {
    let sequences = sequence_range(from, to);
    if sequences.is_empty() {
        anyhow::bail!("invalid sequence range {from}..={to}");
    }

    let (target, db) = open_target(config, target).await?;
    let inserted = db.seed_work(&target.item_type, &sequences).await?;
    println!(
        "Seeded {inserted} of {} sequence(s) into {} (type {})",
        sequences.len(),
        target.table,
        target.item_type
    );
    Ok(())
}

async fn cmd_work_release(config: &Config, target: &str, bot: &str) -> anyhow::Result<()> {
    let (target, db) = open_target(config, target).await?;
    let released = db.release_claims(bot).await?;
    println!("Released {released} claim(s) held by {bot} in {}", target.table);
    Ok(())
}

async fn cmd_work_stats(config: &Config, target: &str) -> anyhow::Result<()> {
    let (target, db) = open_target(config, target).await?;
    let stats = db.queue_stats(&target.item_type).await?;

    println!("Target:     {} ({} / {})", target.name, target.table, target.item_type);
    println!("Unclaimed:  {}", stats.unclaimed);
    println!("Claimed:    {}", stats.claimed);
    println!("Completed:  {}", stats.completed);
    println!("Found:      {}", stats.found);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_accepts_numeric_start_sequence() {
        let cli = Cli::try_parse_from(["vinhunt", "run", "1", "2021", "000500"]).unwrap();
        match cli.command {
            Command::Run { start_sequence, .. } => {
                assert_eq!(start_sequence.as_deref(), Some("000500"));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn run_rejects_non_numeric_start_sequence() {
        let err = Cli::try_parse_from(["vinhunt", "run", "1", "2021", "50O0"])
            .err()
            .expect("should reject sequence");
        assert!(err.to_string().contains("digits only"), "{err}");
    }
}

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use chrono::{Duration, Utc};
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod aggregate;
mod config;
mod db;
mod models;
mod optimal;
mod report;
mod session;

use config::AnalysisConfig;
use models::{ActionRecord, PlayerOutcome, RunSummary, SessionRecord};

#[derive(Parser)]
#[command(name = "poker-time-patterns")]
#[command(about = "Temporal behavior analytics for poker players", long_about = None)]
struct Cli {
    /// JSON file overriding individual analysis thresholds
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a deterministic demo dataset
    Seed,
    /// Import actions and/or tilt events from CSV files
    #[command(group(
        ArgGroup::new("source")
            .args(["actions_csv", "tilt_csv"])
            .multiple(true)
            .required(true)
    ))]
    Import {
        #[arg(long)]
        actions_csv: Option<PathBuf>,
        #[arg(long)]
        tilt_csv: Option<PathBuf>,
    },
    /// Run the temporal analysis pass
    Analyze {
        /// Analyze a single player regardless of recent activity
        #[arg(long)]
        player: Option<String>,
        /// Activity window scoping which players get re-analyzed
        #[arg(long, default_value_t = 30)]
        since_days: i64,
    },
    /// Generate a markdown report from the stored aggregates
    Report {
        #[arg(long)]
        player: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let analysis_config = match &cli.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import {
            actions_csv,
            tilt_csv,
        } => {
            if let Some(path) = actions_csv {
                let inserted = db::import_actions_csv(&pool, &path).await?;
                println!("Inserted {inserted} actions from {}.", path.display());
            }
            if let Some(path) = tilt_csv {
                let inserted = db::import_tilt_csv(&pool, &path).await?;
                println!("Inserted {inserted} tilt events from {}.", path.display());
            }
        }
        Commands::Analyze { player, since_days } => {
            let summary =
                run_analysis(&pool, &analysis_config, player.as_deref(), since_days).await?;
            println!(
                "Analyzed {} players ({} skipped, {} failed), {} sessions written.",
                summary.analyzed, summary.skipped, summary.failed, summary.sessions_written
            );
        }
        Commands::Report { player, out } => {
            let optimal = db::fetch_optimal_times(&pool, &player).await?;
            let hourly = db::fetch_hourly(&pool, &player).await?;
            let sessions = db::fetch_recent_sessions(&pool, &player, 10).await?;
            let report = report::build_report(&player, optimal.as_ref(), &hourly, &sessions);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

/// One batch pass. Players are analyzed independently; a failure on one is
/// logged and counted, never fatal for the rest of the run.
async fn run_analysis(
    pool: &PgPool,
    config: &AnalysisConfig,
    player: Option<&str>,
    since_days: i64,
) -> anyhow::Result<RunSummary> {
    let players = match player {
        Some(player_id) => vec![player_id.to_string()],
        None => {
            let since = Utc::now().naive_utc() - Duration::days(since_days.max(1));
            db::active_players(pool, since, config.min_player_actions).await?
        }
    };

    info!(
        players = players.len(),
        min_actions = config.min_player_actions,
        "starting time pattern analysis"
    );
    let started = Instant::now();
    let mut summary = RunSummary::default();

    for player_id in &players {
        let player_started = Instant::now();
        let outcome = match analyze_player(pool, player_id, config).await {
            Ok(outcome) => outcome,
            Err(err) => PlayerOutcome::Failed {
                reason: format!("{err:#}"),
            },
        };

        match outcome {
            PlayerOutcome::Analyzed {
                sessions,
                hourly_buckets,
                weekday_buckets,
            } => {
                summary.analyzed += 1;
                summary.sessions_written += sessions;
                info!(
                    player = %player_id,
                    sessions, hourly_buckets, weekday_buckets,
                    "player analyzed"
                );
            }
            PlayerOutcome::Skipped { reason } => {
                summary.skipped += 1;
                info!(player = %player_id, reason = %reason, "player skipped");
            }
            PlayerOutcome::Failed { reason } => {
                summary.failed += 1;
                warn!(player = %player_id, reason = %reason, "player analysis failed");
            }
        }

        let elapsed = player_started.elapsed().as_secs_f64();
        if config.performance_alerts && elapsed > config.slow_player_warning_secs {
            warn!(player = %player_id, elapsed_secs = elapsed, "slow player analysis");
        }
    }

    let players_with_hourly = db::hourly_player_count(pool).await?;
    let total_sessions = db::session_count(pool).await?;
    info!(
        players_with_hourly,
        total_sessions,
        elapsed_secs = started.elapsed().as_secs_f64(),
        "time pattern analysis complete"
    );

    Ok(summary)
}

/// Full pipeline for one player: periodic rollups, then session detection,
/// then the optimal-time selection over what was just persisted.
async fn analyze_player(
    pool: &PgPool,
    player_id: &str,
    config: &AnalysisConfig,
) -> anyhow::Result<PlayerOutcome> {
    let actions = db::fetch_actions(pool, player_id).await?;
    if (actions.len() as i64) < config.min_player_actions {
        return Ok(PlayerOutcome::Skipped {
            reason: format!("only {} actions on record", actions.len()),
        });
    }

    let tilt_events = db::fetch_tilt_events(pool, player_id).await?;

    let hourly = aggregate::hourly_rollup(player_id, &actions, &tilt_events, config);
    db::replace_hourly(pool, player_id, &hourly).await?;

    let weekday = aggregate::weekday_rollup(player_id, &actions, &tilt_events, config);
    db::replace_weekday(pool, player_id, &weekday).await?;

    let sessions = detect_sessions(player_id, &actions, config);
    db::replace_sessions(pool, player_id, &sessions).await?;

    // The selector reads the bucket tables back from storage so it sees
    // exactly what this run persisted.
    let stored_hourly = db::fetch_hourly(pool, player_id).await?;
    let stored_weekday = db::fetch_weekday(pool, player_id).await?;
    let categories = aggregate::category_rollup(&actions, config.optimal_min_hands_category);
    let total_hands = aggregate::distinct_hand_count(&actions);
    let optimal = optimal::select_optimal_times(
        player_id,
        &stored_hourly,
        &stored_weekday,
        &categories,
        &sessions,
        total_hands,
        config,
    );
    db::upsert_optimal_times(pool, &optimal).await?;

    Ok(PlayerOutcome::Analyzed {
        sessions: sessions.len(),
        hourly_buckets: hourly.len(),
        weekday_buckets: weekday.len(),
    })
}

fn detect_sessions(
    player_id: &str,
    actions: &[ActionRecord],
    config: &AnalysisConfig,
) -> Vec<SessionRecord> {
    session::session_windows(actions, config.session_gap_minutes)
        .into_iter()
        .filter(|window| window.len() as i64 >= config.session_min_actions)
        .filter_map(|window| session::analyze_session(player_id, &actions[window], config))
        .collect()
}

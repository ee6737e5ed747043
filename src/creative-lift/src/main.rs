//! Creative Lift: creative performance analytics and conversion model
//! training CLI.
//!
//! `train` builds the analysis table from the three input CSVs, runs the
//! chronological train/tune/test workflow, and persists the model together
//! with its feature list. `score` applies a persisted pair to new sessions.
//! `report` computes the ROAS/CAC/payback/lift numbers the dashboard layer
//! renders.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use lift_core::config::AppConfig;
use lift_core::types::AnalysisRow;
use lift_dataset::{
    attribute_revenue, load_campaigns, load_orders, load_sessions, merge_sessions,
};
use lift_features::OneHotEncoder;
use lift_model::search::ParamSpace;
use lift_model::{load_pair, save_pair, train_conversion_model, TrainingReport};
use lift_reporting::{
    average_order_value, creative_summary, forecast_lift, payback_curve, CreativeSummary,
    LiftForecast, PaybackCurve,
};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "creative-lift")]
#[command(about = "Creative performance analytics and conversion model trainer")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the conversion model and persist the model/feature-list pair
    Train {
        /// Path to sessions.csv (overrides config)
        #[arg(long)]
        sessions: Option<PathBuf>,

        /// Path to campaigns.csv (overrides config)
        #[arg(long)]
        campaigns: Option<PathBuf>,

        /// Path to orders.csv (overrides config)
        #[arg(long)]
        orders: Option<PathBuf>,

        /// Output directory for artifacts and the training report
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Randomized search trial budget (overrides config)
        #[arg(long)]
        trials: Option<usize>,

        /// Search seed (overrides config)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Score sessions with a persisted model/feature-list pair
    Score {
        /// Directory holding the artifact pair
        #[arg(long)]
        artifacts: PathBuf,

        /// Path to sessions.csv (overrides config)
        #[arg(long)]
        sessions: Option<PathBuf>,

        /// Path to campaigns.csv (overrides config)
        #[arg(long)]
        campaigns: Option<PathBuf>,

        /// Output CSV of per-session conversion probabilities
        #[arg(long, default_value = "scores.csv")]
        output: PathBuf,
    },

    /// Compute creative ROAS/CAC, payback curves, and the lift forecast
    Report {
        /// Path to sessions.csv (overrides config)
        #[arg(long)]
        sessions: Option<PathBuf>,

        /// Path to campaigns.csv (overrides config)
        #[arg(long)]
        campaigns: Option<PathBuf>,

        /// Path to orders.csv (overrides config)
        #[arg(long)]
        orders: Option<PathBuf>,

        /// Artifact directory; enables the lift forecast when present
        #[arg(long)]
        artifacts: Option<PathBuf>,

        /// Budget increase to forecast, in percent
        #[arg(long, default_value_t = 25.0)]
        budget_increase_pct: f64,

        /// Output JSON document
        #[arg(long, default_value = "report.json")]
        output: PathBuf,
    },
}

#[derive(Serialize)]
struct ReportDocument {
    generated_at: DateTime<Utc>,
    creative: Vec<CreativeSummary>,
    payback: Vec<PaybackCurve>,
    lift: Option<LiftForecast>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "creative_lift=info,lift_model=info,lift_dataset=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    match cli.command {
        Commands::Train {
            sessions,
            campaigns,
            orders,
            out_dir,
            trials,
            seed,
        } => run_train(&config, sessions, campaigns, orders, out_dir, trials, seed),
        Commands::Score {
            artifacts,
            sessions,
            campaigns,
            output,
        } => run_score(&config, &artifacts, sessions, campaigns, &output),
        Commands::Report {
            sessions,
            campaigns,
            orders,
            artifacts,
            budget_increase_pct,
            output,
        } => run_report(
            &config,
            sessions,
            campaigns,
            orders,
            artifacts,
            budget_increase_pct,
            &output,
        ),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_train(
    config: &AppConfig,
    sessions: Option<PathBuf>,
    campaigns: Option<PathBuf>,
    orders: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    trials: Option<usize>,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let mut search_config = config.search.clone();
    if let Some(trials) = trials {
        search_config.trials = trials;
    }
    if let Some(seed) = seed {
        search_config.seed = seed;
    }
    let out_dir = out_dir.unwrap_or_else(|| PathBuf::from(&config.artifacts.output_dir));

    let mut rows = load_analysis_table(config, sessions, campaigns, orders, true)?;
    let (model, report) = train_conversion_model(
        &mut rows,
        &config.split,
        &search_config,
        &ParamSpace::default(),
    )?;

    let artifact = save_pair(&out_dir, &model, &report.feature_names)?;
    let report_path = out_dir.join("training_report.json");
    fs::write(&report_path, serde_json::to_vec_pretty(&report)?)
        .with_context(|| format!("writing {}", report_path.display()))?;

    info!(
        model_id = %artifact.model_id,
        report = %report_path.display(),
        "Training run complete"
    );
    print_training_summary(&report);
    Ok(())
}

fn run_score(
    config: &AppConfig,
    artifacts: &Path,
    sessions: Option<PathBuf>,
    campaigns: Option<PathBuf>,
    output: &Path,
) -> anyhow::Result<()> {
    let artifact = load_pair(artifacts)?;
    let rows = load_analysis_table(config, sessions, campaigns, None, false)?;

    let encoder = OneHotEncoder::fit(&rows);
    let (matrix, _) = encoder.transform(&rows)?;
    let scores = artifact.score(&matrix)?;

    let mut writer = csv::Writer::from_path(output)
        .with_context(|| format!("creating {}", output.display()))?;
    writer.write_record(["session_id", "conversion_probability"])?;
    for (row, score) in rows.iter().zip(scores.iter()) {
        let probability = format!("{score:.6}");
        writer.write_record([row.session_id.as_str(), probability.as_str()])?;
    }
    writer.flush()?;

    info!(
        sessions = rows.len(),
        output = %output.display(),
        "Scored sessions with persisted model"
    );
    Ok(())
}

fn run_report(
    config: &AppConfig,
    sessions: Option<PathBuf>,
    campaigns: Option<PathBuf>,
    orders: Option<PathBuf>,
    artifacts: Option<PathBuf>,
    budget_increase_pct: f64,
    output: &Path,
) -> anyhow::Result<()> {
    let sessions_path = sessions.unwrap_or_else(|| PathBuf::from(&config.data.sessions_path));
    let campaigns_path = campaigns.unwrap_or_else(|| PathBuf::from(&config.data.campaigns_path));
    let orders_path = orders.unwrap_or_else(|| PathBuf::from(&config.data.orders_path));

    let session_records = load_sessions(&sessions_path)?;
    let campaign_records = load_campaigns(&campaigns_path)?;
    let order_records = load_orders(&orders_path)?;
    let mut rows = merge_sessions(&session_records, &campaign_records);
    attribute_revenue(&mut rows, &order_records);

    let lift = match artifacts {
        Some(dir) => {
            let artifact = load_pair(&dir)?;
            let encoder = OneHotEncoder::fit(&rows);
            let (matrix, _) = encoder.transform(&rows)?;
            Some(forecast_lift(
                &artifact,
                &matrix,
                budget_increase_pct,
                average_order_value(&order_records),
            )?)
        }
        None => None,
    };

    let document = ReportDocument {
        generated_at: Utc::now(),
        creative: creative_summary(&rows),
        payback: campaign_records
            .iter()
            .map(|campaign| payback_curve(&rows, campaign))
            .collect(),
        lift,
    };

    fs::write(output, serde_json::to_vec_pretty(&document)?)
        .with_context(|| format!("writing {}", output.display()))?;
    info!(output = %output.display(), "Report written");
    Ok(())
}

/// Load, merge, and (when requested) revenue-attribute the analysis table.
fn load_analysis_table(
    config: &AppConfig,
    sessions: Option<PathBuf>,
    campaigns: Option<PathBuf>,
    orders: Option<PathBuf>,
    attribute: bool,
) -> anyhow::Result<Vec<AnalysisRow>> {
    let sessions_path =
        sessions.unwrap_or_else(|| PathBuf::from(&config.data.sessions_path));
    let campaigns_path =
        campaigns.unwrap_or_else(|| PathBuf::from(&config.data.campaigns_path));

    let session_records = load_sessions(&sessions_path)?;
    let campaign_records = load_campaigns(&campaigns_path)?;
    let mut rows = merge_sessions(&session_records, &campaign_records);

    if attribute {
        let orders_path = orders.unwrap_or_else(|| PathBuf::from(&config.data.orders_path));
        let order_records = load_orders(&orders_path)?;
        attribute_revenue(&mut rows, &order_records);
    }
    Ok(rows)
}

fn print_training_summary(report: &TrainingReport) {
    println!("Training complete");
    println!(
        "  Rows: {} (train {} / tune {} / test {})",
        report.rows_total, report.rows_train, report.rows_tune, report.rows_test
    );
    println!("  Best tune AUC: {:.4}", report.best_tune_auc);
    println!("  Test AUC:      {:.4}", report.test_auc);
    if report.low_quality {
        println!("  WARNING: held-out AUC is below 0.5; do not ship this model");
    }
    println!("  Trees: {}", report.final_trees);
    println!("  Top features:");
    for item in report.feature_importance.iter().take(10) {
        println!("    {:30} {:.4}", item.feature, item.importance);
    }
}

//! ChurnForge: customer churn prediction CLI
//!
//! This is the main entrypoint that wires configuration and logging, loads
//! the model once, and dispatches to prediction, session and analytics modes.

use anyhow::{Context, Result};
use churnforge::cli::{Cli, Command, CustomerArgs};
use churnforge::{
    data, export_submission, shell, viz, Classifier, ExportFormat, LogisticModel,
    PredictionSession, Shell,
};
use clap::Parser;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Command::Predict {
            customer,
            export,
            format,
        } => {
            let model = load_model(&cli.model)?;
            run_prediction_mode(&model, customer, export.as_deref(), *format)?;
        }
        Command::Session { export_dir } => {
            let model = load_model(&cli.model)?;
            let mut shell = Shell::new(&model, export_dir.clone());
            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            shell.run(stdin.lock(), &mut stdout)?;
        }
        Command::Dashboard { output_dir } => {
            run_dashboard(&cli.data, output_dir)?;
        }
        Command::Insights { output_dir } => {
            let model = load_model(&cli.model)?;
            run_insights(&model, &cli.data, output_dir)?;
        }
    }

    Ok(())
}

/// Load the model artifact; done once per process
fn load_model(path: &Path) -> Result<LogisticModel> {
    LogisticModel::load(path).context("Cannot serve predictions without a model")
}

/// Predict churn for one customer given on the command line
fn run_prediction_mode(
    model: &LogisticModel,
    customer: &CustomerArgs,
    export_dir: Option<&Path>,
    format: ExportFormat,
) -> Result<()> {
    println!("=== Prediction Mode ===");

    let mut session = PredictionSession::new(model);
    let submission = session
        .submit_form(customer.to_pairs())
        .context("Invalid customer record")?;

    print!("\n{}", shell::format_submission(&submission));

    if let Some(dir) = export_dir {
        let path = export_submission(&submission, dir, format)?;
        println!("\n✓ Result exported to: {}", path.display());
    }

    Ok(())
}

/// Print dataset statistics and render the dashboard charts
fn run_dashboard(data_path: &Path, output_dir: &Path) -> Result<()> {
    println!("=== Churn Dashboard ===");
    let start_time = Instant::now();

    let stats = data::load_stats(data_path)?;
    viz::print_dashboard_summary(&stats);

    let charts = viz::generate_dashboard_charts(&stats, output_dir)?;
    println!("\n✓ Charts generated");
    for chart in &charts {
        println!("  {}", chart.display());
    }

    info!(
        elapsed_secs = start_time.elapsed().as_secs_f64(),
        "Dashboard complete"
    );
    Ok(())
}

/// Feature importances from the model, profiles from the dataset and key insights
fn run_insights(model: &LogisticModel, data_path: &Path, output_dir: &Path) -> Result<()> {
    println!("=== Feature Importance & Insights ===");

    match model.feature_importances() {
        Some(importances) => {
            viz::print_importances(&importances);
            std::fs::create_dir_all(output_dir)?;
            let chart = output_dir.join("feature_importance.svg");
            viz::create_importance_chart(&importances, &chart)?;
            println!("\n✓ Importance chart saved to: {}", chart.display());
        }
        None => println!("\nFeature importance is not available for this model."),
    }

    match data::load_stats(data_path) {
        Ok(stats) => viz::print_profiles(&stats),
        Err(err) => warn!(error = %format!("{:#}", err), "Skipping customer profiles"),
    }

    viz::print_key_insights();

    Ok(())
}

//! `salesai` entry point

mod cli;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use salesai_config::{load_settings, Settings};
use salesai_core::{ActivityStore, Clock, SystemClock};
use salesai_forecast::{ModelStore, Predictor, TrainingPipeline};
use salesai_funnel::FunnelAnalyzer;
use salesai_hierarchy::{DetailOptions, HierarchyAggregator};
use salesai_persistence::{open_dataset, DemoOrganization, InMemoryStore};

use cli::{Cli, Commands};

/// Exit status for a missing agent, area manager or division head
const EXIT_NOT_FOUND: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<salesai_core::Error>() {
        Some(e) if e.is_not_found() => EXIT_NOT_FOUND,
        _ => 1,
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Priority: env vars > config/{env}.toml > config/default.toml > defaults
    let settings = match load_settings(cli.env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Tracing not yet initialized
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Settings::default()
        }
    };

    init_tracing(&settings);
    tracing::debug!(
        environment = ?settings.environment,
        config_env = cli.env.as_deref().unwrap_or("default"),
        "Configuration loaded"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let dataset_path = cli
        .dataset
        .clone()
        .unwrap_or_else(|| PathBuf::from(&settings.persistence.dataset_path));

    match cli.command {
        Commands::Train { test_fraction, seed } => {
            let store = load_store(&dataset_path)?;
            let pipeline = TrainingPipeline::new(
                store,
                clock,
                ModelStore::from_config(&settings.model),
                settings.training.clone(),
            );
            let trained = pipeline
                .train_model(
                    test_fraction.unwrap_or(settings.training.test_fraction),
                    seed.unwrap_or(settings.training.seed),
                )
                .await
                .context("training failed")?;

            eprintln!("{}", trained.report);
            print_json(&serde_json::json!({
                "model_id": trained.model.model_id,
                "artifact_path": pipeline.store().path(),
                "training_source": trained.model.training_source,
                "training_examples": trained.model.training_examples,
                "accuracy": trained.accuracy,
                "classification_report": trained.report,
                "feature_importances": trained.importances,
            }))
        }
        Commands::Predict { agent_id } => {
            let predictor = predictor(load_store(&dataset_path)?, &settings, clock);
            let prediction = predictor
                .predict_agent(&agent_id)
                .await
                .with_context(|| format!("prediction failed for agent {}", agent_id))?;
            print_json(&prediction)
        }
        Commands::PredictAll => {
            let predictor = predictor(load_store(&dataset_path)?, &settings, clock);
            let predictions = predictor.predict_all_agents().await.context("batch prediction failed")?;
            print_json(&predictions)
        }
        Commands::Insights { agent_id } => {
            let predictor = predictor(load_store(&dataset_path)?, &settings, clock);
            let insights = predictor
                .get_prediction_with_funnel_insights(&agent_id)
                .await
                .with_context(|| format!("insights failed for agent {}", agent_id))?;
            print_json(&insights)
        }
        Commands::Funnel { agent_id } => {
            let store: Arc<dyn ActivityStore> = load_store(&dataset_path)?;
            let analyzer = FunnelAnalyzer::new(store, settings.funnel.clone());
            let metrics = analyzer
                .get_funnel_metrics(&agent_id)
                .await
                .with_context(|| format!("funnel metrics failed for agent {}", agent_id))?;
            let analysis = analyzer.analyze_metrics(&metrics);
            print_json(&serde_json::json!({
                "metrics": metrics,
                "analysis": analysis,
            }))
        }
        Commands::Performance { agent_id } => {
            let aggregator = aggregator(load_store(&dataset_path)?, &settings, clock);
            match agent_id {
                Some(id) => print_json(&aggregator.get_agent_performance(&id).await?),
                None => print_json(&aggregator.get_all_agents_performance().await?),
            }
        }
        Commands::Area { manager_id, detail } => {
            let mut aggregator = aggregator(load_store(&dataset_path)?, &settings, clock);
            if detail {
                aggregator = aggregator.with_detail(DetailOptions::full());
            }
            let area = aggregator
                .get_area_manager_performance(&manager_id)
                .await
                .with_context(|| format!("roll-up failed for area manager {}", manager_id))?;
            print_json(&area)
        }
        Commands::Division { head_id } => {
            let aggregator = aggregator(load_store(&dataset_path)?, &settings, clock);
            let division = aggregator
                .get_division_head_performance(&head_id)
                .await
                .with_context(|| format!("roll-up failed for division head {}", head_id))?;
            print_json(&division)
        }
        Commands::SeedDemo { path, seed, months } => {
            let path = path.unwrap_or(dataset_path);
            let dataset = DemoOrganization::new(seed)
                .with_months(months)
                .generate(clock.today());
            dataset
                .save(&path)
                .with_context(|| format!("failed to write dataset to {}", path.display()))?;
            tracing::info!(path = %path.display(), seed, months, "Demo dataset written");
            print_json(&serde_json::json!({
                "path": path,
                "division_heads": dataset.division_heads.len(),
                "area_managers": dataset.area_managers.len(),
                "agents": dataset.agents.len(),
                "products": dataset.products.len(),
                "activities": dataset.activities.len(),
                "sales": dataset.sales.len(),
            }))
        }
    }
}

/// Console tracing on stderr; stdout carries command output
fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.observability.log_level.as_str().into());

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };
    subscriber.with(fmt_layer).init();
}

fn load_store(path: &Path) -> anyhow::Result<Arc<InMemoryStore>> {
    let store = open_dataset(path).with_context(|| {
        format!(
            "failed to open dataset {} (run `salesai seed-demo` to create one)",
            path.display()
        )
    })?;
    Ok(Arc::new(store))
}

fn predictor(store: Arc<InMemoryStore>, settings: &Settings, clock: Arc<dyn Clock>) -> Predictor {
    Predictor::new(
        store,
        ModelStore::from_config(&settings.model),
        clock,
        settings.funnel.clone(),
    )
}

fn aggregator(store: Arc<InMemoryStore>, settings: &Settings, clock: Arc<dyn Clock>) -> HierarchyAggregator {
    let predictor = Arc::new(predictor(store.clone(), settings, clock.clone()));
    HierarchyAggregator::new(store, predictor, clock, settings.performance.clone())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{}", rendered);
    Ok(())
}

//! Command-line argument parsing
//!
//! Keeps argument parsing separate from command execution.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sales target forecasting and funnel analysis
#[derive(Debug, Parser)]
#[command(name = "salesai")]
#[command(about = "Sales target forecasting, funnel analysis and team roll-ups", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration environment, loads `config/{env}.toml` over the defaults
    #[arg(long, global = true, env = "SALESAI_ENV")]
    pub env: Option<String>,

    /// Dataset snapshot to read (overrides `persistence.dataset_path`)
    #[arg(long, global = true)]
    pub dataset: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Train the forecast model and persist it
    Train {
        /// Holdout share (overrides `training.test_fraction`)
        #[arg(long)]
        test_fraction: Option<f64>,

        /// Split and forest seed (overrides `training.seed`)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Predict whether one agent hits this month's target
    Predict { agent_id: String },

    /// Predict every agent, skipping the ones that fail
    PredictAll,

    /// Prediction combined with funnel metrics and recommendations
    Insights { agent_id: String },

    /// Lifetime conversion funnel and stage analysis for one agent
    Funnel { agent_id: String },

    /// Current-month scorecard for one agent, or every agent when omitted
    Performance { agent_id: Option<String> },

    /// Area manager roll-up
    Area {
        manager_id: String,

        /// Attach funnel, recent history and top product per agent
        #[arg(long)]
        detail: bool,
    },

    /// Division head roll-up
    Division { head_id: String },

    /// Write a seeded demo dataset snapshot
    SeedDemo {
        /// Output path (defaults to `persistence.dataset_path`)
        path: Option<PathBuf>,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Trailing months of history, the current one included
        #[arg(long, default_value_t = 6)]
        months: u32,
    },
}

//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::{
    estimate::EstimateArgs, phase2::Phase2Args, simulate::SimulateArgs, timeline::TimelineArgs,
};

#[derive(Parser, Debug)]
#[command(name = "risk-survey")]
#[command(about = "Two-phase adaptive risk-preference survey", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (YAML, or JSON with a .json extension)
    #[arg(short, long, global = true, env = "RISK_SURVEY_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build and print the practice and Phase 1 timelines
    Timeline(TimelineArgs),

    /// Estimate alpha from recorded Phase 1 choices
    Estimate(EstimateArgs),

    /// Generate the personalized Phase 2 trials for an alpha
    Phase2(Phase2Args),

    /// Run a full session with a simulated participant
    Simulate(SimulateArgs),
}

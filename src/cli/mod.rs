//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Datamove using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Datamove - batch record export tool
#[derive(Parser, Debug)]
#[command(name = "datamove")]
#[command(version, about, long_about = None)]
#[command(author = "Datamove Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "datamove.toml", env = "DATAMOVE_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "DATAMOVE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a job against a directory of records
    Run(commands::run::RunArgs),

    /// List the properties a job accepts
    Properties(commands::properties::PropertiesArgs),

    /// Validate configuration file and job properties
    ValidateConfig(commands::validate::ValidateArgs),
}

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use super::commands::{
    check::CheckArgs, generate::GenerateArgs, serve::ServeArgs, test_suite::TestSuiteArgs,
};

#[derive(Parser, Debug)]
#[command(
    name = "agent-forge",
    version,
    about = "Agent Forge - Generate Google ADK agents with Pipedream tools from a JSON spec",
    long_about = "Agent Forge turns an agent specification into a complete, validated Python \
                  agent project using an LLM, either from the command line or as an HTTP service."
)]
pub struct Cli {
    /// Log level (RUST_LOG takes precedence)
    #[arg(long, value_enum, default_value = "INFO", global = true, ignore_case = true)]
    pub log_level: LogLevel,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the generation pipeline on an input document
    #[command(about = "Generate an agent project from an input JSON document")]
    Generate(GenerateArgs),

    /// Start the HTTP service
    #[command(about = "Serve the generation pipeline over HTTP")]
    Serve(ServeArgs),

    /// Validate an already generated agent directory
    #[command(about = "Run the validator suite over a generated agent directory")]
    Check(CheckArgs),

    /// Generate and audit every agent listed in a suite file
    #[command(about = "Generate a batch of agents and report which pass validation")]
    TestSuite(TestSuiteArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Directive understood by `EnvFilter`
    pub fn filter(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

//! `dsta`: inspect the campaign agents, export their tool definitions for a
//! host runtime and invoke single tools against the live APIs.

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dsta_core::config::{AppConfig, LoadOptions};

use bootstrap::AuthSource;
use commands::call::OutputStyle;
use commands::reconcile::ReconcileArgs;
use commands::CommandResult;
pub use error::CliError;

#[derive(Debug, Parser)]
#[command(
    name = "dsta",
    version,
    about = "Campaign agent tools for Google Ads and Search Ads 360",
    after_help = "Examples:\n  dsta agents show decision_agent\n  dsta tools --agent sa360_agent --json\n  dsta call get_external_signal --input '{\"api_name\":\"pollen\",\"lat\":48.85,\"lng\":2.35}'\n  dsta reconcile --campaign-id 111 --customer-id 1234567890 --sheet-id ID --sheet-name Campaigns"
)]
pub struct Cli {
    /// Config file (default: ./dsta.toml, then ./config/dsta.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level or filter directive, e.g. "debug" or "dsta_tools=trace,info"
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the built-in agents
    Agents {
        #[command(subcommand)]
        action: Option<AgentsCommand>,
    },
    /// List tools, or export their definitions as JSON
    Tools {
        /// Only the tools this agent is given
        #[arg(long)]
        agent: Option<String>,
        /// Emit the tool definitions as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run one tool against the live APIs
    Call {
        tool: String,
        /// JSON object input, or "-" to read it from stdin
        #[arg(long)]
        input: Option<String>,
        /// No ANSI colors
        #[arg(long, conflicts_with = "raw")]
        plain: bool,
        /// Print the full result without truncation
        #[arg(long)]
        raw: bool,
    },
    /// Compare an SA360 campaign's sheet row with the live campaign
    Reconcile {
        #[arg(long)]
        campaign_id: String,
        #[arg(long)]
        customer_id: String,
        #[arg(long)]
        sheet_id: String,
        #[arg(long)]
        sheet_name: String,
    },
    /// Print the effective configuration with secrets redacted
    Config,
}

#[derive(Debug, Subcommand)]
pub enum AgentsCommand {
    /// Model, instruction and tools of one agent
    Show { name: String },
}

/// Load configuration for the parsed arguments.
pub fn load_config(cli: &Cli) -> Result<AppConfig, CliError> {
    Ok(AppConfig::load(LoadOptions {
        config_path: cli.config.clone(),
        require_file: cli.config.is_some(),
        log_level: cli.log_level.clone(),
    })?)
}

/// Run a command against an already-loaded configuration.
pub async fn execute(config: &AppConfig, command: Command, auth: &AuthSource) -> CommandResult {
    let result = match command {
        Command::Agents { action: None } => Ok(commands::agents::list(config)),
        Command::Agents {
            action: Some(AgentsCommand::Show { name }),
        } => commands::agents::show(config, &name),
        Command::Tools { agent, json } => commands::tools::run(config, agent.as_deref(), json),
        Command::Call {
            tool,
            input,
            plain,
            raw,
        } => {
            let style = match (plain, raw) {
                (_, true) => OutputStyle::Raw,
                (true, false) => OutputStyle::Plain,
                (false, false) => OutputStyle::Ansi,
            };
            match commands::call::parse_input(input.as_deref(), std::io::stdin()) {
                Ok(input) => commands::call::run(config, &tool, input, style, auth).await,
                Err(err) => Err(err),
            }
        }
        Command::Reconcile {
            campaign_id,
            customer_id,
            sheet_id,
            sheet_name,
        } => {
            let args = ReconcileArgs {
                campaign_id,
                customer_id,
                sheet_id,
                sheet_name,
            };
            commands::reconcile::run(config, &args, auth).await
        }
        Command::Config => Ok(commands::config::run(config)),
    };
    result.into()
}

/// Parse arguments, load config, initialize logging and run.
pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::from(err.exit_code());
        }
    };
    logging::init(&config.logging);

    let result = execute(&config, cli.command, &AuthSource::from_env()).await;
    if result.is_error {
        eprintln!("{}", result.output);
    } else if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}

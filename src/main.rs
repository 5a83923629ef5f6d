use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use aws_sso_mcp::config::Settings;
use aws_sso_mcp::config_locations::{ConfigCatalog, SystemCatalog};
use aws_sso_mcp::constants::{LOG_ENV_VAR, SERVER_NAME_ENV_VAR};
use aws_sso_mcp::env::SystemEnv;
use aws_sso_mcp::refresh::SsoRefresher;
use aws_sso_mcp::{aws_profiles, logging, mcp, VERSION};

#[derive(Parser)]
#[command(name = "aws-sso-mcp")]
#[command(about = "MCP server that refreshes expired AWS SSO tokens via `aws sso login`")]
#[command(version = VERSION)]
struct Cli {
    /// Log filter, e.g. `debug` or `aws_sso_mcp=trace`
    #[arg(long, global = true, env = LOG_ENV_VAR)]
    log_level: Option<String>,

    /// This server's name in MCP client configs, used when a refresh names no server
    #[arg(long, global = true, env = SERVER_NAME_ENV_VAR)]
    server_name: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP over stdio (default)
    Serve,

    /// Run the SSO login once and print the result as JSON
    Refresh {
        /// AWS profile to refresh
        #[arg(long)]
        profile: Option<String>,
        /// MCP server whose config declares the profile
        #[arg(long)]
        server: Option<String>,
    },

    /// List the MCP config files searched for server profiles, in order
    Locations,

    /// List profiles from the AWS config file
    Profiles,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let settings = Settings::new(cli.server_name, cli.log_level);
    logging::init(&settings.log_filter);

    if let Err(e) = run(cli.command, settings).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(command: Option<Commands>, settings: Settings) -> Result<()> {
    match command.unwrap_or(Commands::Serve) {
        Commands::Serve => mcp::run_server(settings.default_server).await,
        Commands::Refresh { profile, server } => {
            let refresher = SsoRefresher::system().with_default_server(settings.default_server);
            let result = refresher.refresh(profile, server).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.success {
                std::process::exit(2);
            }
            Ok(())
        }
        Commands::Locations => {
            let catalog = SystemCatalog::new(Arc::new(SystemEnv));
            for location in catalog.locations() {
                let marker = if location.path.is_file() { "*" } else { " " };
                println!("{marker} {:<15} {}", location.client, location.path.display());
            }
            Ok(())
        }
        Commands::Profiles => {
            let profiles = aws_profiles::list_aws_profiles(&SystemEnv).await?;
            println!("{}", serde_json::to_string_pretty(&profiles)?);
            Ok(())
        }
        Commands::Version => {
            println!("aws-sso-mcp v{}", VERSION);
            Ok(())
        }
    }
}

/// Marquee Agent - digital signage player
use clap::{Parser, Subcommand};
use marquee_agent::{Agent, AgentConfig};
use marquee_playback::LogRenderer;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str =
    "marquee_agent=info,marquee_sync=info,marquee_telemetry=info,marquee_playback=info";

#[derive(Parser)]
#[command(name = "marquee-agent")]
#[command(about = "Marquee digital signage player agent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the player (default)
    Run {
        /// Configuration file path
        #[arg(short, long, default_value = "player.json")]
        config: PathBuf,
    },
    /// Register this device with the Player API
    Register {
        /// Configuration file path
        #[arg(short, long, default_value = "player.json")]
        config: PathBuf,
        /// Discard the persisted identity and register again
        #[arg(long)]
        force: bool,
    },
    /// Show persisted identity, playlist and queue depths
    Status {
        /// Configuration file path
        #[arg(short, long, default_value = "player.json")]
        config: PathBuf,
    },
    /// Deliver queued telemetry once and exit
    Flush {
        /// Configuration file path
        #[arg(short, long, default_value = "player.json")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run {
        config: PathBuf::from("player.json"),
    }) {
        Commands::Run { config } => {
            let agent = Agent::new(AgentConfig::load(&config)?)?;
            agent.run(Arc::new(LogRenderer)).await?;
        }
        Commands::Register { config, force } => {
            let agent = Agent::new(AgentConfig::load(&config)?)?;
            let identity = agent.register(force).await?;
            println!("Registered as {} (screen {})", identity.player_id, identity.screen_id);
        }
        Commands::Status { config } => {
            let agent = Agent::new(AgentConfig::load(&config)?)?;
            println!("{}", agent.status().await);
        }
        Commands::Flush { config } => {
            let agent = Agent::new(AgentConfig::load(&config)?)?;
            let report = agent.flush().await?;
            println!(
                "Delivered {} of {} queued events ({} failed)",
                report.delivered, report.attempted, report.failed
            );
        }
    }

    Ok(())
}

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use revendorbot::bot::Bot;
use revendorbot::config::AppConfig;
use revendorbot::platform::github::GitHubPlatform;
use revendorbot::platform::Platform;
use revendorbot::workspace::command::{CommandRunner, ProcessRunner};

#[derive(Parser)]
#[command(
    name = "revendorbot",
    about = "Keeps vendor/ in sync with go.mod and go.sum on GitHub"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Handle a single delivery whose payload is read from stdin
    Handle {
        /// Value of the X-GitHub-Event header
        event_type: String,
        /// Value of the X-GitHub-Delivery header
        delivery_id: String,
    },
    /// Listen for webhook deliveries over HTTP
    Serve,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = AppConfig::load(cli.config.as_deref())?;

    let platform: Arc<dyn Platform> = Arc::new(GitHubPlatform::new(&config.github)?);
    let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner);

    match cli.command {
        Command::Handle {
            event_type,
            delivery_id,
        } => {
            let bot = Bot::new(platform, runner, &config.revendor);

            let mut payload = Vec::new();
            tokio::io::stdin().read_to_end(&mut payload).await?;

            bot.handle(&event_type, &delivery_id, &payload).await?;
        }
        Command::Serve => {
            tracing::info!(
                host = %config.server.host,
                port = %config.server.port,
                "Starting revendorbot listener"
            );
            revendorbot::server::serve(config, platform, runner).await?;
        }
    }

    Ok(())
}

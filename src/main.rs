use clap::{Parser, Subcommand};
use nu_ansi_term::Color;

use wayfarer::agents;
use wayfarer::config;
use wayfarer::orchestrator::Orchestrator;
use wayfarer::repl::Repl;

#[derive(Parser)]
#[command(name = "wayfarer", version, about = "Conversational multi-agent trip planner")]
struct Cli {
    /// Info-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Debug-level logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive trip-planning chat (default)
    Chat,

    /// Run the full six-agent planning pipeline for one request
    Plan {
        /// The trip request, e.g. "from Delhi to Manali on 01/09/2025 to 03/09/2025"
        prompt: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        tracing::Level::DEBUG
    } else if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting wayfarer version {}", env!("CARGO_PKG_VERSION"));

    let config = config::load_config()?;

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => {
            let orchestrator = Orchestrator::from_config(&config)?;
            Repl::new(orchestrator).run().await?;
        }
        Command::Plan { prompt } => {
            let prompt = prompt.join(" ");
            if prompt.trim().is_empty() {
                anyhow::bail!("plan needs a trip request, e.g.: wayfarer plan \"from Delhi to Manali ...\"");
            }

            let orchestrator = Orchestrator::from_config(&config)?;
            let plan = orchestrator.plan_trip(&prompt).await?;

            for (name, output) in &plan.stages {
                let title = agents::find(name).map_or(*name, |spec| spec.role);
                println!("{}", Color::Cyan.bold().paint(format!("== {title} ==")));
                println!("{}\n", output.raw);
            }

            println!(
                "{}",
                Color::DarkGray.paint(format!(
                    "context: {}",
                    orchestrator.context_summary().await
                ))
            );
        }
    }

    Ok(())
}

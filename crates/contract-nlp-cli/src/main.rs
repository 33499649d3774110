mod display;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use contract_nlp_core::EngineConfig;
use contract_nlp_engine::NlpService;

#[derive(Parser)]
#[command(name = "contract-nlp", version, about = "Natural-language front end for contract queries")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine config (YAML)
    #[arg(long, global = true, env = "CONTRACT_NLP_CONFIG")]
    config: Option<PathBuf>,

    /// Override the creation-session inactivity timeout
    #[arg(long, global = true, env = "CONTRACT_NLP_SESSION_TIMEOUT_SECS")]
    session_timeout_secs: Option<u64>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify one utterance
    Classify {
        /// The utterance; words are joined with spaces
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Interactive session; creation dialogues are tracked across lines
    Chat {
        /// Session id (a random one by default)
        #[arg(long)]
        session: Option<String>,
    },
    /// Show the contract-creation attribute table
    Attributes,
}

fn load_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(secs) = cli.session_timeout_secs {
        config.session_timeout_secs = secs;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("contract-nlp v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let service = NlpService::new(config).context("starting nlp service")?;

    match &cli.command {
        Commands::Classify { text } => {
            let result = service.classify(&text.join(" "));
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                display::print_query(&result);
            }
        }
        Commands::Chat { session } => {
            let session_id = session
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            service.start_sweeper();
            chat(&service, &session_id, cli.json).await?;
            service.shutdown().await;
        }
        Commands::Attributes => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&service.attributes())?);
            } else {
                display::print_attributes(&service.attribute_summary(), &service.attributes());
            }
        }
    }
    Ok(())
}

async fn chat(service: &NlpService, session_id: &str, json: bool) -> anyhow::Result<()> {
    tracing::info!(session_id, "chat started");
    println!("session {session_id}; commands: :info, :clear, :weights, :quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let line = line.trim();
        match line {
            "" => continue,
            ":quit" | ":q" => break,
            ":info" => {
                let info = service
                    .session_info(session_id)
                    .unwrap_or_else(|| format!("No active contract creation session found for: {session_id}"));
                println!("{info}");
            }
            ":clear" => {
                service.clear_session(session_id);
                println!("session cleared");
            }
            ":weights" => {
                for (feature, weight) in service.feature_weights() {
                    println!("  {:<26} {weight:.4}", feature.as_str());
                }
            }
            _ => {
                let turn = service.handle_turn(line, session_id);
                if json {
                    println!("{}", serde_json::to_string_pretty(&turn)?);
                } else {
                    display::print_turn(&turn);
                }
            }
        }
    }
    Ok(())
}

//! Command-line client for the fragments store.

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::{Args, Parser, Subcommand};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use fragments_core::config::AppConfig;
use fragments_convert::ConversionEngine;
use fragments_core::{FragmentId, MediaType, OwnerId};
use fragments_service::FragmentService;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fragmentctl")]
#[command(about = "Store, fetch and convert text and image fragments")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(long, global = true, env = "FRAGMENTS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct OwnerArgs {
    /// Owner every operation is scoped to
    #[arg(long, env = "FRAGMENTS_OWNER")]
    owner: String,
}

impl OwnerArgs {
    fn owner_id(&self) -> OwnerId {
        OwnerId::from(self.owner.as_str())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a fragment, optionally with data
    Create {
        /// Content-Type of the fragment
        #[arg(long = "type")]
        fragment_type: String,
        /// Read data from FILE ("-" for stdin). Omit to create an empty fragment.
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
        #[command(flatten)]
        owner: OwnerArgs,
    },
    /// Replace a fragment's data; the type must match the stored type
    Update {
        id: String,
        /// Content-Type of the new data
        #[arg(long = "type")]
        fragment_type: String,
        /// Read data from FILE ("-" or omitted for stdin)
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
        #[command(flatten)]
        owner: OwnerArgs,
    },
    /// Show a fragment's metadata
    Info {
        id: String,
        #[command(flatten)]
        owner: OwnerArgs,
    },
    /// Fetch a fragment's data, converted when an extension is given (<id>.<ext>)
    Get {
        reference: String,
        /// Write to FILE instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
        #[command(flatten)]
        owner: OwnerArgs,
    },
    /// List the owner's fragments
    List {
        /// Print full records instead of ids
        #[arg(long, default_value_t = false)]
        expand: bool,
        #[command(flatten)]
        owner: OwnerArgs,
    },
    /// Delete a fragment and its data
    Delete {
        id: String,
        #[command(flatten)]
        owner: OwnerArgs,
    },
    /// List the types a fragment of the given type can be fetched as
    Formats {
        #[arg(long = "type")]
        fragment_type: String,
    },
    /// Check that storage is usable
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries command output only.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Cli { config, command } = Cli::parse();

    let config = load_config(config.as_deref())?;
    let service = fragments_service::from_config(&config)
        .await
        .context("failed to initialize fragment service")?;

    match command {
        Commands::Create {
            fragment_type,
            input,
            owner,
        } => handle_create(&service, &owner, &fragment_type, input.as_deref()).await,
        Commands::Update {
            id,
            fragment_type,
            input,
            owner,
        } => handle_update(&service, &owner, &id, &fragment_type, input.as_deref()).await,
        Commands::Info { id, owner } => {
            let record = service
                .get_by_id(&owner.owner_id(), &FragmentId::from(id.as_str()))
                .await?;
            print_json(&record)
        }
        Commands::Get {
            reference,
            output,
            owner,
        } => handle_get(&service, &owner, &reference, output.as_deref()).await,
        Commands::List { expand, owner } => {
            let fragments = service.list(&owner.owner_id(), expand).await?;
            print_json(&fragments)
        }
        Commands::Delete { id, owner } => {
            service
                .delete(&owner.owner_id(), &FragmentId::from(id.as_str()))
                .await?;
            eprintln!("Deleted fragment {id}");
            Ok(())
        }
        Commands::Formats { fragment_type } => {
            let media_type = MediaType::parse(&fragment_type)
                .with_context(|| format!("unsupported fragment type: {fragment_type}"))?;
            let targets: Vec<&str> = ConversionEngine::targets(media_type)
                .into_iter()
                .map(MediaType::essence)
                .collect();
            print_json(&targets)
        }
        Commands::Health => {
            service
                .health_check()
                .await
                .context("storage health check failed")?;
            println!("Status: ok");
            println!("Backend: {}", service.backend().backend_name());
            Ok(())
        }
    }
}

/// Optional TOML file merged with `FRAGMENTS_` environment variables.
///
/// With neither present the defaults apply.
fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut figment = Figment::new();

    if let Some(path) = path {
        if !path.exists() {
            anyhow::bail!("config file not found: {}", path.display());
        }
        tracing::debug!(config_path = %path.display(), "loading configuration from file");
        figment = figment.merge(Toml::file(path));
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("FRAGMENTS_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    config
        .validate()
        .map_err(|e| anyhow::anyhow!(e))
        .context("invalid configuration")?;
    Ok(config)
}

async fn handle_create(
    service: &FragmentService,
    owner: &OwnerArgs,
    fragment_type: &str,
    input: Option<&Path>,
) -> Result<()> {
    let owner = owner.owner_id();
    let record = match input {
        Some(path) => {
            let data = read_input(Some(path)).await?;
            service.create_with_data(&owner, fragment_type, data).await?
        }
        None => service.create(&owner, fragment_type).await?,
    };
    print_json(&record)
}

async fn handle_update(
    service: &FragmentService,
    owner: &OwnerArgs,
    id: &str,
    fragment_type: &str,
    input: Option<&Path>,
) -> Result<()> {
    let data = read_input(input).await?;
    let record = service
        .update(
            &owner.owner_id(),
            &FragmentId::from(id),
            fragment_type,
            data,
        )
        .await?;
    print_json(&record)
}

async fn handle_get(
    service: &FragmentService,
    owner: &OwnerArgs,
    reference: &str,
    output: Option<&Path>,
) -> Result<()> {
    let rep = service.fetch(&owner.owner_id(), reference).await?;
    tracing::debug!(content_type = %rep.content_type, size = rep.data.len(), "fetched fragment");

    match output {
        Some(path) => tokio::fs::write(path, &rep.data)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&rep.data).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

/// Read fragment data from a file, or stdin for `-` or no path.
async fn read_input(path: Option<&Path>) -> Result<Bytes> {
    match path {
        Some(path) if path != Path::new("-") => {
            let data = tokio::fs::read(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(Bytes::from(data))
        }
        _ => {
            let mut buf = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut buf)
                .await
                .context("failed to read stdin")?;
            Ok(Bytes::from(buf))
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

mod cli;

use mediahub::{
    config::{self, WorkerConfig},
    server,
    worker::{DispatcherClient, SpriteTransform, WorkerLoop},
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, DispatcherArgs};
use std::path::{Path, PathBuf};

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config::validate_config(&config)?;

    tracing::info!("Starting mediahub dispatcher");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    server::start_server(config, config_path.map(Path::to_path_buf)).await
}

/// Worker settings from the config file with CLI flags and environment
/// variables layered on top.
fn worker_config(
    base: WorkerConfig,
    dispatcher: DispatcherArgs,
    poll_interval: Option<u64>,
) -> Result<WorkerConfig> {
    let mut worker = base;
    if let Some(api_url) = dispatcher.api_url {
        worker.api_url = api_url;
    }
    if let Some(token) = dispatcher.token {
        worker.auth_token = token;
    }
    if let Some(secs) = poll_interval {
        worker.poll_interval_secs = secs;
    }
    config::validate_worker(&worker)?;
    Ok(worker)
}

async fn run_worker(
    dispatcher: DispatcherArgs,
    poll_interval: Option<u64>,
    ffmpeg: Option<PathBuf>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let settings = worker_config(config.worker, dispatcher, poll_interval)?;

    let ffmpeg = ffmpeg.or(config.tools.ffmpeg_path);
    let transform = SpriteTransform::locate(ffmpeg.as_deref())
        .context("ffmpeg is required to run a worker")?;

    let client = DispatcherClient::new(
        &settings.api_url,
        &settings.auth_token,
        settings.request_timeout(),
    );

    tracing::info!(api_url = %client.base_url(), "Starting mediahub worker");
    let worker = WorkerLoop::new(client, transform, settings.poll_interval());

    tokio::select! {
        result = worker.run() => match result {
            Ok(never) => match never {},
            Err(e) => Err(e.into()),
        },
        _ = server::shutdown_signal() => {
            tracing::info!("Worker stopped");
            Ok(())
        }
    }
}

async fn enqueue(path: PathBuf, dispatcher: DispatcherArgs, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let settings = worker_config(config.worker, dispatcher, None)?;

    let client = DispatcherClient::new(
        &settings.api_url,
        &settings.auth_token,
        settings.request_timeout(),
    );
    let job = client
        .enqueue(&path)
        .await
        .with_context(|| format!("Failed to queue {:?} on {}", path, client.base_url()))?;

    println!("Queued job {} for {}", job.id, job.input_path.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mediahub=trace,mediahub_av=trace,tower_http=debug".to_string()
        } else {
            "mediahub=debug,mediahub_av=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Serve { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Worker {
            dispatcher,
            poll_interval,
            ffmpeg,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_worker(
                dispatcher,
                poll_interval,
                ffmpeg,
                cli.config.as_deref(),
            ))
        }
        Commands::Sprite { input } => make_sprite(&input, cli.config.as_deref()),
        Commands::Enqueue { path, dispatcher } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(enqueue(path, dispatcher, cli.config.as_deref()))
        }
        Commands::Openapi { out_dir } => {
            let (json, yaml) = server::openapi::export(&out_dir)?;
            println!("{}", json.display());
            println!("{}", yaml.display());
            Ok(())
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate { file } => {
            let path = file.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("mediahub {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn make_sprite(input: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    tracing::info!("Generating sprite sheet for {:?}", input);
    let generator = mediahub_av::SpriteGenerator::new(config.tools.ffmpeg_path.as_deref())?;
    let output = generator
        .generate(input)
        .with_context(|| format!("Failed to generate sprite for {:?}", input))?;

    println!("{}", output.display());
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    println!("Checking external tools...\n");

    let tools = mediahub_av::check_tools(config.tools.ffmpeg_path.as_deref());
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Workers cannot generate sprites without ffmpeg.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Artifact dir: {}", config.server.artifact_dir.display());
            println!(
                "  Lease: {}s, max attempts {}",
                config.dispatcher.lease_secs, config.dispatcher.max_attempts
            );
            println!(
                "  Worker: {} (poll every {}s)",
                config.worker.api_url, config.worker.poll_interval_secs
            );
            println!("  Catalog entries: {}", config.catalog.len());
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Worker: {}", config.worker.api_url);
        }
    }

    Ok(())
}

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediahub")]
#[command(author, version, about = "Media cataloging backend with a sprite-sheet job pipeline")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where to find the dispatcher. Unset values fall back to the config file.
#[derive(Args, Debug, Clone)]
pub struct DispatcherArgs {
    /// Dispatcher base URL
    #[arg(long, env = "API_URL")]
    pub api_url: Option<String>,

    /// Shared token sent as X-Auth
    #[arg(long, env = "API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the job dispatcher API
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run a worker that pulls jobs and generates sprite sheets
    Worker {
        #[command(flatten)]
        dispatcher: DispatcherArgs,

        /// Seconds to wait after an empty queue or a connection failure
        #[arg(long, env = "POLL_INTERVAL_SECS")]
        poll_interval: Option<u64>,

        /// Path to the ffmpeg binary
        #[arg(long)]
        ffmpeg: Option<PathBuf>,
    },

    /// Generate the sprite sheet for a single file
    Sprite {
        /// Input video
        #[arg(required = true)]
        input: PathBuf,
    },

    /// Queue a file on a running dispatcher
    Enqueue {
        /// Input video path as seen by the workers
        #[arg(required = true)]
        path: PathBuf,

        #[command(flatten)]
        dispatcher: DispatcherArgs,
    },

    /// Write the API description as openapi.json and openapi.yaml
    Openapi {
        /// Directory to write into
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses --config or defaults if not specified)
        file: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

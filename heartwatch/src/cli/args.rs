//! CLI argument definitions.
//!
//! Every serve option can also come from the environment.

use std::net::IpAddr;

use clap::{Args, Parser, Subcommand};

use crate::logging::LogFormat;

/// Heartwatch - mark chat notifications disconnected when client heartbeats stop
#[derive(Parser, Debug)]
#[command(name = "heartwatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the heartbeat service
    Serve(ServeArgs),

    /// Encrypt a webhook URL into a secret store row
    Seal {
        /// Webhook URL to seal
        url: String,

        #[command(flatten)]
        key: KeyArgs,
    },

    /// Decrypt a sealed webhook blob
    Open {
        /// Base64 blob as stored in the secret store
        blob: String,

        #[command(flatten)]
        key: KeyArgs,
    },

    /// Show how a target reference would be resolved
    VaultId {
        /// Webhook URL or vault reference
        reference: String,
    },
}

/// Encryption key shared by the secret store writer and this service.
#[derive(Args, Debug, Clone)]
pub struct KeyArgs {
    /// Secret the AES-256 key is derived from
    #[arg(long, env = "ENCRYPTION_KEY", hide_env_values = true)]
    pub encryption_key: Option<String>,
}

/// Options for the `serve` command.
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    // === Listener ===
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    // === Heartbeats ===
    /// Silence after which a session is considered disconnected
    #[arg(long, env = "HEARTBEAT_TIMEOUT_MS", default_value_t = 15_000)]
    pub heartbeat_timeout_ms: u64,

    /// Time between sweeps (defaults to a third of the timeout)
    #[arg(long, env = "SWEEP_INTERVAL_MS")]
    pub sweep_interval_ms: Option<u64>,

    /// Maximum disconnect patches in flight at once
    #[arg(long, env = "MAX_CONCURRENT_PATCHES", default_value_t = 8)]
    pub max_concurrent_patches: usize,

    /// Timeout for every outbound HTTP request
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value_t = 10_000)]
    pub request_timeout_ms: u64,

    // === Secret store ===
    /// Supabase project URL holding the `webhooks` table
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// Supabase service role key
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    pub supabase_service_role_key: Option<String>,

    /// Secret the AES-256 key is derived from
    #[arg(long, env = "ENCRYPTION_KEY", hide_env_values = true)]
    pub encryption_key: Option<String>,

    // === Patch proxy ===
    /// Send patches through this signed proxy instead of the webhook
    #[arg(long, env = "PATCH_PROXY_URL")]
    pub patch_proxy_url: Option<String>,

    /// Shared secret for proxy request signatures
    #[arg(long, env = "PATCH_PROXY_SECRET", hide_env_values = true)]
    pub patch_proxy_secret: Option<String>,
}

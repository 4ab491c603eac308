//! CLI command execution.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde_json::json;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::Config;
use crate::notify::{
    NotificationTransport, Patcher, RequestSigner, SignedProxyTransport, WebhookTransport,
};
use crate::server::{self, AppState};
use crate::store::SessionStore;
use crate::sweeper::{Clock, Sweeper, SystemClock};
use crate::vault::{
    is_direct_webhook, Resolver, SecretStore, SupabaseStore, UnconfiguredStore, VaultCipher,
    VaultId, DEFAULT_ENCRYPTION_KEY,
};

use super::args::{Cli, Commands, KeyArgs, ServeArgs};

/// Execute the parsed CLI command.
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve(args) => serve(args).await,
        Commands::Seal { url, key } => seal(&url, &key),
        Commands::Open { blob, key } => open(&blob, &key),
        Commands::VaultId { reference } => {
            describe_reference(&reference);
            Ok(())
        }
    }
}

fn cipher_from(key: &KeyArgs) -> VaultCipher {
    let secret = key
        .encryption_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| {
            warn!("ENCRYPTION_KEY not set, using the placeholder key");
            DEFAULT_ENCRYPTION_KEY
        });
    VaultCipher::from_secret(secret)
}

/// Wire the store, sweeper and ingress API together and run until Ctrl-C.
async fn serve(args: ServeArgs) -> Result<()> {
    let config = Config::from_args(args).context("Invalid configuration")?;

    if config.placeholder_key {
        warn!("ENCRYPTION_KEY not set, vault references will use the placeholder key");
    }

    let client = Client::builder()
        .timeout(config.request_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let secret_store: Arc<dyn SecretStore> = match config.secret_store {
        Some(store) => Arc::new(SupabaseStore::new(
            client.clone(),
            store.url,
            store.service_key,
        )),
        None => {
            warn!("Supabase is not configured, only direct webhook URLs can be patched");
            Arc::new(UnconfiguredStore)
        }
    };
    let resolver = Resolver::new(
        secret_store,
        VaultCipher::from_secret(config.encryption_key.expose_secret()),
    );

    let transport: Arc<dyn NotificationTransport> = match config.proxy {
        Some(proxy) => {
            info!(proxy = %proxy.url, "patching through signed proxy");
            let signer = RequestSigner::new(&proxy.secret);
            Arc::new(SignedProxyTransport::new(client, proxy.url, signer))
        }
        None => Arc::new(WebhookTransport::new(client)),
    };

    let store = Arc::new(SessionStore::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let sweeper = Sweeper::new(
        store.clone(),
        Arc::new(Patcher::new(resolver, transport)),
        clock.clone(),
        config.sweep,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper_task = sweeper.spawn(shutdown_rx.clone());

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown requested");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for Ctrl-C, running until killed");
                // Dropping the sender would stop the sweeper.
                std::future::pending::<()>().await;
            }
        }
    });

    let mut server_shutdown = shutdown_rx;
    server::start_server(config.addr, AppState { store, clock }, async move {
        while !*server_shutdown.borrow_and_update() {
            if server_shutdown.changed().await.is_err() {
                break;
            }
        }
    })
    .await?;

    sweeper_task.await.context("Sweeper task failed")?;
    Ok(())
}

/// Print a secret store row for `url`.
fn seal(url: &str, key: &KeyArgs) -> Result<()> {
    let blob = cipher_from(key)
        .seal(url)
        .map_err(|_| anyhow!("Failed to encrypt webhook URL"))?;
    let id = format!("wh_{}", hex::encode(rand::random::<[u8; 8]>()));

    let row = json!({ "id": id, "webhook_enc": blob });
    println!("{}", serde_json::to_string_pretty(&row)?);
    Ok(())
}

fn open(blob: &str, key: &KeyArgs) -> Result<()> {
    let url = cipher_from(key)
        .open(blob)
        .context("Failed to decrypt blob")?;
    println!("{url}");
    Ok(())
}

fn describe_reference(reference: &str) {
    if is_direct_webhook(reference) {
        println!("direct webhook URL (no lookup)");
    } else if let Some(id) = VaultId::extract(reference) {
        println!("vault id: {id}");
    } else {
        println!("no vault id found");
    }
}

//! Runtime configuration for the `serve` command.

use std::net::SocketAddr;
use std::time::Duration;

use secrecy::SecretString;

use crate::cli::ServeArgs;
use crate::error::ConfigError;
use crate::sweeper::SweepSettings;
use crate::vault::DEFAULT_ENCRYPTION_KEY;

/// Where sealed webhooks are looked up.
#[derive(Debug)]
pub struct SecretStoreConfig {
    pub url: String,
    pub service_key: SecretString,
}

/// Signed proxy for the patch call.
#[derive(Debug)]
pub struct ProxyConfig {
    pub url: String,
    pub secret: SecretString,
}

/// Validated service configuration.
#[derive(Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub sweep: SweepSettings,
    pub request_timeout: Duration,
    pub encryption_key: SecretString,
    /// Whether `encryption_key` is the built-in placeholder.
    pub placeholder_key: bool,
    pub secret_store: Option<SecretStoreConfig>,
    pub proxy: Option<ProxyConfig>,
}

impl Config {
    /// Build and validate from parsed arguments.
    pub fn from_args(args: ServeArgs) -> Result<Self, ConfigError> {
        if args.heartbeat_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        let timeout = Duration::from_millis(args.heartbeat_timeout_ms);

        let interval = args
            .sweep_interval_ms
            .map_or(timeout / 3, Duration::from_millis);
        if interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if interval >= timeout {
            return Err(ConfigError::IntervalTooLong {
                interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
                timeout_ms: args.heartbeat_timeout_ms,
            });
        }
        if args.max_concurrent_patches == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if args.request_timeout_ms == 0 {
            return Err(ConfigError::ZeroRequestTimeout);
        }

        let proxy = match args.patch_proxy_url.filter(|u| !u.is_empty()) {
            Some(url) => {
                let secret = args
                    .patch_proxy_secret
                    .filter(|s| !s.is_empty())
                    .ok_or(ConfigError::MissingProxySecret)?;
                Some(ProxyConfig {
                    url,
                    secret: SecretString::from(secret),
                })
            }
            None => None,
        };

        let secret_store = match (args.supabase_url, args.supabase_service_role_key) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => {
                Some(SecretStoreConfig {
                    url,
                    service_key: SecretString::from(key),
                })
            }
            _ => None,
        };

        let key = args
            .encryption_key
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| DEFAULT_ENCRYPTION_KEY.to_string());

        Ok(Self {
            addr: SocketAddr::new(args.bind, args.port),
            sweep: SweepSettings {
                timeout,
                interval,
                max_concurrent: args.max_concurrent_patches,
            },
            request_timeout: Duration::from_millis(args.request_timeout_ms),
            placeholder_key: key == DEFAULT_ENCRYPTION_KEY,
            encryption_key: SecretString::from(key),
            secret_store,
            proxy,
        })
    }
}

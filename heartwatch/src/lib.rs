//! Heartwatch - heartbeat tracking for chat-posted session notifications.
//!
//! Clients register a session together with the webhook message announcing
//! it, then keep it alive with pings. When pings stop for longer than the
//! heartbeat timeout, the sweeper rewrites that message to show the session
//! as disconnected and forgets the session.
//!
//! Architecture:
//! - `server` accepts registrations and pings (axum)
//! - `store` holds sessions in memory behind one lock
//! - `sweeper` expires silent sessions on a fixed interval
//! - `vault` resolves webhook references, decrypting sealed ones
//! - `notify` patches the message through the webhook or a signed proxy

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod notify;
pub mod server;
pub mod store;
pub mod sweeper;
pub mod vault;

//! Serve command - Run the HTTP form server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use docfill_server::config::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_REQUEST_TIMEOUT_SECS};
use docfill_server::ServerConfig;
use tracing::info;

use super::GlobalArgs;

#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind (IPv4 or IPv6 literal)
    #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// JSON translation table replacing the built-in one
    #[arg(long, env = "DOCFILL_TRANSLATIONS")]
    translations: Option<PathBuf>,

    /// Request timeout in seconds, conversion included
    #[arg(long, env = "DOCFILL_REQUEST_TIMEOUT", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    request_timeout: u64,
}

impl ServeArgs {
    fn server_config(&self) -> ServerConfig {
        let mut config = ServerConfig::new()
            .host(&self.host)
            .port(self.port)
            .request_timeout(Duration::from_secs(self.request_timeout));
        if let Some(path) = &self.translations {
            config = config.translations(path);
        }
        config
    }
}

pub async fn execute(global: &GlobalArgs, args: ServeArgs) -> Result<()> {
    let config = args.server_config();
    let addr = config
        .socket_addr()
        .with_context(|| format!("Invalid argument --host {}", args.host))?;
    info!(
        "Serving templates from {:?} on {}",
        global.templates_dir, addr
    );

    let service = Arc::new(global.service());
    docfill_server::serve(config, service)
        .await
        .context("Server failed")?;

    Ok(())
}

//! Serve command - run the HTTP proxy

use crate::cli::args::ServeArgs;
use crate::config::Config;
use crate::error::{ProxyError, ProxyResult};
use crate::server::{self, AppState};
use std::net::{IpAddr, SocketAddr};
use tracing::info;

/// Execute the serve command
pub async fn execute(args: ServeArgs, config: &Config) -> ProxyResult<()> {
    let addr = listen_addr(&args, config)?;

    info!(
        runtime_url = %config.upstream.runtime_url,
        bundle_url = %config.upstream.bundle_url,
        strict_status = config.upstream.strict_status,
        "Upstream configured"
    );

    server::serve(addr, AppState::from_config(config)).await
}

/// Resolve the listen address: flag or env first, then config
fn listen_addr(args: &ServeArgs, config: &Config) -> ProxyResult<SocketAddr> {
    let host = args.host.as_deref().unwrap_or(&config.server.host);
    let port = args.port.unwrap_or(config.server.port);

    let ip: IpAddr = host
        .parse()
        .map_err(|_| ProxyError::InvalidAddress(host.to_string()))?;
    Ok(SocketAddr::new(ip, port))
}

/// Aegis Gateway - Authentication Gateway
///
/// Verifies externally-issued identity tokens, mints short-lived access and
/// longer-lived refresh tokens, tracks per-device sessions, and applies
/// attempt tracking with account lockout.

mod accounts;
mod api;
mod attempts;
mod auth;
mod config;
mod context;
mod db;
mod error;
mod gateway;
mod identity;
mod jobs;
mod mailer;
mod metrics;
mod rate_limit;
mod server;
mod sessions;
mod tokens;
mod validation;

use config::GatewayConfig;
use context::AppContext;
use error::GatewayResult;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> GatewayResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aegis_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    print_banner();

    // Load configuration
    let config = GatewayConfig::from_env()?;

    // Create application context
    let ctx = AppContext::new(config).await?;
    let ctx = Arc::new(ctx);

    // Start background jobs
    let scheduler = Arc::new(jobs::JobScheduler::new(Arc::clone(&ctx)));
    scheduler.start();

    // Start server
    server::serve((*ctx).clone()).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    ___              _          ______      __
   /   | ___  ____ _(_)____    / ____/___ _/ /____ _      ______ ___  __
  / /| |/ _ \/ __ `/ / ___/   / / __/ __ `/ __/ _ \ | /| / / __ `/ / / /
 / ___ /  __/ /_/ / (__  )   / /_/ / /_/ / /_/  __/ |/ |/ / /_/ / /_/ /
/_/  |_\___/\__, /_/____/    \____/\__,_/\__/\___/|__/|__/\__,_/\__, /
           /____/                                              /____/

        Authentication Gateway v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}

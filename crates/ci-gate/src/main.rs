//! CI gate daemon
//!
//! Webhook-driven gatekeeper between GitHub pull requests and Buildkite.
//! Configuration comes entirely from the environment; a misconfigured
//! process exits before binding the listen socket.

mod automerge;
mod context;
mod events;
mod handlers;
mod labels;
mod public_log;
mod server;
mod signature;
mod sweeper;
#[cfg(test)]
mod test_support;
mod trigger;
mod trust;
mod views;

use anyhow::Context as _;
use buildkite_client::BuildkiteClient;
use ci_gate_config::Config;
use context::AppContext;
use gh_client::OctocrabClient;
use log::{error, info};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("configuration error: {}", err);
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let github = Arc::new(
        OctocrabClient::from_token(config.github_token.clone())
            .context("building GitHub client")?,
    );
    let buildkite = Arc::new(
        BuildkiteClient::new(&config.buildkite_token, &config.buildkite_org)
            .context("building Buildkite client")?,
    );

    let port = config.port;
    let ctx = AppContext::new(config, github, buildkite);
    let app = server::router(ctx);

    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("binding port {port}"))?;
    info!("listening on port {}", port);

    axum::serve(listener, app).await.context("serving HTTP")
}

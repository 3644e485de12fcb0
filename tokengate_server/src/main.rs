use anyhow::Context;
use clap::Parser;
use tokengate::jwt::Validation;
use tokengate_authority::{KeyStore, Verifier};
use tokengate_server::config::Config;
use tokengate_server::http;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    tracing::info!(
        issuer = %config.issuer,
        audience = %config.audience,
        jwks.url = %config.jwks_url(),
        jwks.ttl_secs = config.jwks_ttl_secs,
        "starting token validation service"
    );

    let keys = KeyStore::remote(config.jwks_url(), config.jwks_ttl(), config.jwks_timeout())
        .context("building the JWKS key store")?;

    // Warm the cache. Failure is tolerated: the first lookup retries, and
    // until then every token is rejected as unverifiable.
    if let Err(err) = keys.refresh().await {
        let error: &dyn std::error::Error = &err;
        tracing::warn!(error, "initial JWKS fetch failed");
    }

    let validation =
        Validation::new(config.issuer.clone(), config.audience.clone()).with_leeway(config.leeway());
    let app = http::router(Verifier::new(keys, validation));

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("binding {}", config.listen))?;
    tracing::info!(listen = %config.listen, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received; draining");
}

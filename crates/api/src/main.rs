use anyhow::Context;

use obraledger_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    obraledger_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    if config.dev_secret {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }
    if config.admin_emails.is_empty() {
        tracing::warn!("OBRALEDGER_ADMIN_EMAILS is empty; nobody can administer companies");
    }

    let app = obraledger_api::app::build_app(&config)
        .await
        .context("failed to initialise the ledger store")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}

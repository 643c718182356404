use anyhow::{Context, Result};
use catmini::integration::{AppConfig, Services};
use catmini::ui::{AppState, Assets};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catmini=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CatMini");

    if let Err(e) = run() {
        error!("{:#}", e);
        eprintln!("CatMini could not start: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn run() -> Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    config.validate().context("validating configuration")?;

    let assets = Assets::load(config.assets_dir.as_deref()).context("loading assets")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("catmini-answers")
        .enable_all()
        .build()
        .context("starting async runtime")?;

    let services = Services::start(&config, runtime.handle().clone()).context("starting services")?;
    let state = AppState::new(services, assets.frame_count(), config.avatar.frame_interval());

    catmini::ui::run(state, assets).map_err(|e| anyhow::anyhow!("UI error: {}", e))?;

    runtime.shutdown_timeout(std::time::Duration::from_secs(1));
    info!("CatMini closed");
    Ok(())
}

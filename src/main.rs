#[macro_use]
extern crate rocket;

use meta_dashboard_api::aggregates::Dashboard;
use meta_dashboard_api::build_rocket;
use meta_dashboard_api::config::Config;
use meta_dashboard_api::tasks::attach_refresh;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[launch]
async fn rocket() -> rocket::Rocket<rocket::Build> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,meta_dashboard_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(
        graph_root = %config.graph_root(),
        cache_dir = %config.cache_dir.display(),
        upload_dir = %config.upload_dir.display(),
        max_pages = config.max_pages,
        "configuration loaded"
    );

    let dashboard = Arc::new(Dashboard::from_config(&config));
    let rocket = build_rocket(dashboard.clone());

    attach_refresh(rocket, dashboard, config.refresh_cron.as_deref()).await
}

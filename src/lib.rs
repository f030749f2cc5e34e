#[macro_use]
extern crate rocket;

pub mod aggregates;
pub mod breakdowns;
pub mod cache;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod google_ads;
pub mod graph_api;
pub mod models;
pub mod pagination;
pub mod shaping;
pub mod tasks;

use std::sync::Arc;

use aggregates::Dashboard;

/// Rocket instance with every dashboard route mounted at `/`.
pub fn build_rocket(dashboard: Arc<Dashboard>) -> rocket::Rocket<rocket::Build> {
    rocket::build()
        .manage(dashboard)
        .mount("/", endpoints::routes())
        .register("/", catchers![endpoints::default_catcher])
}

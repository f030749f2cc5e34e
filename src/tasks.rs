use rocket::{Build, Rocket};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::aggregates::Dashboard;

/// Registers a cron job that re-runs the Meta Ads fetch and overwrites its snapshot.
pub async fn schedule_refresh(
    scheduler: &JobScheduler,
    dashboard: Arc<Dashboard>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |job_id, _scheduler| {
        let dashboard = dashboard.clone();
        Box::pin(async move {
            refresh_meta_ads(&dashboard, &job_id.to_string()).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduled meta ads refresh");
    Ok(())
}

pub async fn refresh_meta_ads(dashboard: &Dashboard, job_id: &str) {
    match dashboard.refresh_meta_ads().await {
        Ok(aggregate) => {
            let ads = aggregate["ads_data"].as_array().map_or(0, Vec::len);
            tracing::info!(job_id, ads, "meta ads snapshot refreshed");
        }
        Err(e) => tracing::error!(job_id, error = %e, "scheduled meta ads refresh failed"),
    }
}

/// Starts a scheduler running the refresh job when `cron` is set and hands it to
/// Rocket as managed state. Without a schedule the instance is returned as is.
pub async fn attach_refresh(
    rocket: Rocket<Build>,
    dashboard: Arc<Dashboard>,
    cron: Option<&str>,
) -> Rocket<Build> {
    let Some(cron) = cron else {
        return rocket;
    };

    match start_refresh(dashboard, cron).await {
        Ok(scheduler) => rocket.manage(Arc::new(scheduler)),
        Err(e) => {
            tracing::error!(cron, error = %e, "failed to schedule meta ads refresh");
            rocket
        }
    }
}

async fn start_refresh(
    dashboard: Arc<Dashboard>,
    cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    schedule_refresh(&scheduler, dashboard, cron).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

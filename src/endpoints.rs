use rocket::Request;
use rocket::State;
use rocket::http::Status;
use rocket::serde::json::Json;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::aggregates::{
    Dashboard, FACEBOOK_POSTS_CACHE, FACEBOOK_REELS_CACHE, INSTA_ADS_CACHE, INSTAGRAM_CACHE,
    META_ADS_CACHE,
};
use crate::error::AppError;
use crate::google_ads::CsvRow;

type JsonResult = Result<Json<Value>, AppError>;

#[get("/meta-ads")]
pub async fn meta_ads(dashboard: &State<Arc<Dashboard>>) -> JsonResult {
    dashboard.refresh_meta_ads().await.map(Json)
}

#[get("/saved-meta-ads")]
pub fn saved_meta_ads(dashboard: &State<Arc<Dashboard>>) -> JsonResult {
    dashboard.saved(META_ADS_CACHE).map(Json)
}

#[get("/insta-ads")]
pub async fn insta_ads(dashboard: &State<Arc<Dashboard>>) -> JsonResult {
    dashboard.refresh_insta_ads().await.map(Json)
}

#[get("/saved-insta-ads")]
pub fn saved_insta_ads(dashboard: &State<Arc<Dashboard>>) -> JsonResult {
    dashboard.saved(INSTA_ADS_CACHE).map(Json)
}

#[get("/facebook")]
pub async fn facebook(dashboard: &State<Arc<Dashboard>>) -> JsonResult {
    dashboard.refresh_facebook_posts().await.map(Json)
}

#[get("/saved-facebook")]
pub fn saved_facebook(dashboard: &State<Arc<Dashboard>>) -> JsonResult {
    dashboard.saved(FACEBOOK_POSTS_CACHE).map(Json)
}

#[get("/facebook/reels")]
pub async fn facebook_reels(dashboard: &State<Arc<Dashboard>>) -> JsonResult {
    dashboard.refresh_facebook_reels().await.map(Json)
}

#[get("/saved-facebook-reels")]
pub fn saved_facebook_reels(dashboard: &State<Arc<Dashboard>>) -> JsonResult {
    dashboard.saved(FACEBOOK_REELS_CACHE).map(Json)
}

#[get("/instagram")]
pub async fn instagram(dashboard: &State<Arc<Dashboard>>) -> JsonResult {
    dashboard.refresh_instagram().await.map(Json)
}

#[get("/saved-instagram")]
pub fn saved_instagram(dashboard: &State<Arc<Dashboard>>) -> JsonResult {
    dashboard.saved(INSTAGRAM_CACHE).map(Json)
}

#[get("/google-ads")]
pub fn google_ads(dashboard: &State<Arc<Dashboard>>) -> Result<Json<Vec<CsvRow>>, AppError> {
    dashboard.google_ads().map(Json)
}

#[get("/campaign-data")]
pub fn campaign_data(dashboard: &State<Arc<Dashboard>>) -> Result<Json<Vec<CsvRow>>, AppError> {
    dashboard.campaign_data().map(Json)
}

#[catch(default)]
pub fn default_catcher(status: Status, request: &Request<'_>) -> (Status, Json<Value>) {
    let body = json!({
        "error": status.reason().unwrap_or("Unknown Error"),
        "path": request.uri().path().to_string(),
    });
    (status, Json(body))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        meta_ads,
        saved_meta_ads,
        insta_ads,
        saved_insta_ads,
        facebook,
        saved_facebook,
        facebook_reels,
        saved_facebook_reels,
        instagram,
        saved_instagram,
        google_ads,
        campaign_data,
    ]
}

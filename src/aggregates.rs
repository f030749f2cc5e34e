use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use crate::breakdowns::{aggregate_breakdowns, aggregate_breakdowns_for_platform};
use crate::cache::{AggregateCache, FileCache};
use crate::config::Config;
use crate::error::AppError;
use crate::google_ads::{self, CsvRow};
use crate::graph_api::{GraphClient, GraphTransport, HttpTransport};
use crate::models::{
    Ad, AdsAggregate, BreakdownInsights, InstagramFeed, PostsAggregate, ReelsAggregate,
};
use crate::pagination::CursorStyle;
use crate::shaping::{
    ad_from_raw, attach_insights, campaign_duration, metric_values, shape_instagram_post,
    shape_posts, shape_reel,
};

pub const META_ADS_CACHE: &str = "meta_ads";
pub const INSTA_ADS_CACHE: &str = "insta_ads";
pub const FACEBOOK_POSTS_CACHE: &str = "facebook_posts";
pub const FACEBOOK_REELS_CACHE: &str = "facebook_reels";
pub const INSTAGRAM_CACHE: &str = "instagram";

const AD_FIELDS: &str = "id,name,adset_id,campaign_id,status";
const AD_INSIGHT_FIELDS: &str =
    "campaign_name,reach,impressions,spend,clicks,frequency,cpm,cpc,ctr";
const INSTAGRAM_AD_INSIGHT_FIELDS: &str = "account_id,account_name,ad_id,ad_name,adset_id,\
    adset_name,campaign_id,campaign_name,clicks,cpc,cpm,cpp,ctr,date_start,date_stop,\
    engagement_rate_ranking,frequency,impressions,inline_link_clicks,inline_post_engagement,\
    objective,quality_ranking,reach,social_spend,spend,unique_clicks,unique_ctr,\
    video_p100_watched_actions,video_p25_watched_actions,video_p50_watched_actions,\
    video_p75_watched_actions,video_p95_watched_actions";
const INSTAGRAM_AD_BREAKDOWNS: &str = "age,gender,device_platform,region";
const POST_FIELDS: &str = "id,message,created_time,permalink_url,attachments{media,type},\
    likes.summary(true),comments.summary(true),shares,reactions.summary(true)";
const REEL_FIELDS: &str = "id,description,created_time,permalink_url,thumbnails{uri,is_preferred},\
    likes.summary(true),comments.summary(true),reactions.summary(true)";
const INSTAGRAM_MEDIA_FIELDS: &str = "id,caption,shares_count,comments_count,like_count,media_type,\
    media_url,thumbnail_url,timestamp,permalink,children{id,media_type,media_url,thumbnail_url}";
const INSTAGRAM_MEDIA_METRICS: &str = "engagement,likes,comments,reactions,shares";
const INSTAGRAM_ACCOUNT_METRICS: &str = "follower_count,reach";

fn fetched_at() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Which ids the dashboard reads from.
#[derive(Debug, Clone)]
pub struct Accounts {
    pub page_id: String,
    pub instagram_page_id: Option<String>,
    pub ad_account_id: String,
}

impl Accounts {
    pub fn from_config(config: &Config) -> Self {
        Self {
            page_id: config.page_id.clone(),
            instagram_page_id: config.instagram_page_id.clone(),
            ad_account_id: config.ad_account_id.clone(),
        }
    }

    /// Ad account node, `act_`-prefixed as the Marketing API expects.
    pub fn ad_account_node(&self) -> String {
        if self.ad_account_id.starts_with("act_") {
            self.ad_account_id.clone()
        } else {
            format!("act_{}", self.ad_account_id)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdsReport {
    AllPlatforms,
    InstagramOnly,
}

/// Builds the dashboard aggregates and keeps their last snapshot in the cache.
pub struct Dashboard {
    graph: GraphClient,
    cache: Arc<dyn AggregateCache>,
    accounts: Accounts,
    upload_dir: PathBuf,
}

impl Dashboard {
    pub fn new(
        graph: GraphClient,
        cache: Arc<dyn AggregateCache>,
        accounts: Accounts,
        upload_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            graph,
            cache,
            accounts,
            upload_dir: upload_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let transport: Arc<dyn GraphTransport> = Arc::new(HttpTransport::new());
        Self::new(
            GraphClient::from_config(transport, config),
            Arc::new(FileCache::new(config.cache_dir.clone())),
            Accounts::from_config(config),
            config.upload_dir.clone(),
        )
    }

    /// Replays the last snapshot saved under `name`.
    pub fn saved(&self, name: &str) -> Result<Value, AppError> {
        tracing::info!(aggregate = name, "serving saved aggregate");
        Ok(self.cache.load(name)?)
    }

    /// Stores a fresh aggregate and returns it as JSON. A failed write is
    /// logged; the live data is still returned.
    fn store<T: Serialize>(&self, name: &str, aggregate: &T) -> Result<Value, AppError> {
        let value = serde_json::to_value(aggregate)?;
        if let Err(e) = self.cache.save(name, &value) {
            tracing::error!(aggregate = name, error = %e, "failed to save aggregate");
        }
        Ok(value)
    }

    // Ads

    async fn list_ads(&self) -> Result<Vec<Value>, AppError> {
        let path = format!("{}/ads", self.accounts.ad_account_node());
        let ads = self
            .graph
            .get_edge(&path, &[("fields", AD_FIELDS)], CursorStyle::NextUrl)
            .await
            .map_err(|e| e.into_app("Failed to fetch Ads"))?;

        if ads.is_empty() {
            return Err(AppError::NotFound("No ads found in the Ad Account".to_string()));
        }
        tracing::info!(ads = ads.len(), "ads listed");
        Ok(ads)
    }

    async fn ad_campaign_duration(&self, ad: &Ad) -> String {
        match &ad.campaign_id {
            Some(campaign_id) => campaign_duration(
                self.graph
                    .get_node(campaign_id, &[("fields", "start_time,stop_time")])
                    .await,
            ),
            None => "No campaign ID available".to_string(),
        }
    }

    async fn ads_report(&self, report: AdsReport) -> Result<AdsAggregate, AppError> {
        let raw_ads = self.list_ads().await?;
        let account = self.accounts.ad_account_node();

        // Account-wide, so one pass is shared by every ad in the report.
        let breakdowns: BreakdownInsights = match report {
            AdsReport::AllPlatforms => aggregate_breakdowns(&self.graph, &account).await,
            AdsReport::InstagramOnly => {
                aggregate_breakdowns_for_platform(&self.graph, &account, "instagram").await
            }
        };

        let mut ads_data = Vec::with_capacity(raw_ads.len());
        for raw in &raw_ads {
            let mut ad = ad_from_raw(raw);
            let insights_path = format!("{}/insights", ad.id);

            match report {
                AdsReport::AllPlatforms => {
                    ad.campaign_duration = Some(self.ad_campaign_duration(&ad).await);
                    let params = [
                        ("fields", AD_INSIGHT_FIELDS),
                        ("breakdowns", "publisher_platform"),
                    ];
                    let fetched = self
                        .graph
                        .get_edge(&insights_path, &params, CursorStyle::NextUrl)
                        .await;
                    attach_insights(&mut ad, fetched, true);
                }
                AdsReport::InstagramOnly => {
                    let params = [
                        ("fields", INSTAGRAM_AD_INSIGHT_FIELDS),
                        ("breakdowns", INSTAGRAM_AD_BREAKDOWNS),
                        ("publisher_platform", "instagram"),
                    ];
                    let fetched = self
                        .graph
                        .get_edge(&insights_path, &params, CursorStyle::NextUrl)
                        .await;
                    attach_insights(&mut ad, fetched, false);
                }
            }

            ad.breakdown_insights = Some(breakdowns.clone());
            ads_data.push(ad);
        }

        Ok(AdsAggregate {
            ads_data,
            fetched_at: fetched_at(),
        })
    }

    pub async fn fetch_meta_ads(&self) -> Result<AdsAggregate, AppError> {
        self.ads_report(AdsReport::AllPlatforms).await
    }

    pub async fn fetch_insta_ads(&self) -> Result<AdsAggregate, AppError> {
        self.ads_report(AdsReport::InstagramOnly).await
    }

    pub async fn refresh_meta_ads(&self) -> Result<Value, AppError> {
        let aggregate = self.fetch_meta_ads().await?;
        self.store(META_ADS_CACHE, &aggregate)
    }

    pub async fn refresh_insta_ads(&self) -> Result<Value, AppError> {
        let aggregate = self.fetch_insta_ads().await?;
        self.store(INSTA_ADS_CACHE, &aggregate)
    }

    // Facebook page

    pub async fn fetch_facebook_posts(&self) -> Result<PostsAggregate, AppError> {
        let path = format!("{}/published_posts", self.accounts.page_id);
        let raw = self
            .graph
            .get_edge(&path, &[("fields", POST_FIELDS)], CursorStyle::NextUrl)
            .await
            .map_err(|e| e.into_app("Failed to fetch data"))?;

        Ok(PostsAggregate {
            posts: shape_posts(&raw),
            fetched_at: fetched_at(),
        })
    }

    pub async fn refresh_facebook_posts(&self) -> Result<Value, AppError> {
        let aggregate = self.fetch_facebook_posts().await?;
        self.store(FACEBOOK_POSTS_CACHE, &aggregate)
    }

    pub async fn fetch_facebook_reels(&self) -> Result<ReelsAggregate, AppError> {
        let path = format!("{}/video_reels", self.accounts.page_id);
        let raw = self
            .graph
            .get_edge(&path, &[("fields", REEL_FIELDS)], CursorStyle::NextUrl)
            .await
            .map_err(|e| e.into_app("Failed to fetch reels"))?;

        Ok(ReelsAggregate {
            reels: raw.iter().map(shape_reel).collect(),
            fetched_at: fetched_at(),
        })
    }

    pub async fn refresh_facebook_reels(&self) -> Result<Value, AppError> {
        let aggregate = self.fetch_facebook_reels().await?;
        self.store(FACEBOOK_REELS_CACHE, &aggregate)
    }

    // Instagram

    async fn instagram_account_id(&self) -> Result<String, AppError> {
        let page = self
            .accounts
            .instagram_page_id
            .as_deref()
            .unwrap_or(&self.accounts.page_id);
        let node = self
            .graph
            .get_node(page, &[("fields", "instagram_business_account")])
            .await
            .map_err(|e| e.into_app("Failed to fetch Instagram Business Account"))?;

        node.pointer("/instagram_business_account/id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AppError::NotFound("Instagram Business Account not found".to_string()))
    }

    pub async fn fetch_instagram(&self) -> Result<InstagramFeed, AppError> {
        let account_id = self.instagram_account_id().await?;

        let media = self
            .graph
            .get_edge(
                &format!("{}/media", account_id),
                &[("fields", INSTAGRAM_MEDIA_FIELDS)],
                CursorStyle::NextUrl,
            )
            .await
            .map_err(|e| e.into_app("Failed to fetch Instagram posts"))?;

        let mut posts = Vec::with_capacity(media.len());
        for raw in &media {
            let id = raw.get("id").and_then(Value::as_str).unwrap_or_default();
            let metrics = match self
                .graph
                .get_node(
                    &format!("{}/insights", id),
                    &[("metric", INSTAGRAM_MEDIA_METRICS)],
                )
                .await
            {
                Ok(payload) => Some(metric_values(
                    payload
                        .get("data")
                        .and_then(Value::as_array)
                        .map(Vec::as_slice)
                        .unwrap_or_default(),
                )),
                Err(e) => {
                    tracing::warn!(media_id = id, error = %e, "media insights unavailable");
                    None
                }
            };
            posts.push(shape_instagram_post(raw, metrics.as_ref()));
        }

        let account_insights = self
            .graph
            .get_node(
                &format!("{}/insights", account_id),
                &[("metric", INSTAGRAM_ACCOUNT_METRICS), ("period", "day")],
            )
            .await
            .map_err(|e| e.into_app("Failed to fetch Instagram insights"))?;
        let insights = metric_values(
            account_insights
                .get("data")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default(),
        );

        Ok(InstagramFeed {
            instagram_business_account_id: account_id,
            insights,
            posts,
            fetched_at: fetched_at(),
        })
    }

    pub async fn refresh_instagram(&self) -> Result<Value, AppError> {
        let feed = self.fetch_instagram().await?;
        self.store(INSTAGRAM_CACHE, &feed)
    }

    // Google Ads exports

    pub fn google_ads(&self) -> Result<Vec<CsvRow>, AppError> {
        google_ads::load_report(&self.upload_dir.join(google_ads::GOOGLE_ADS_CSV))
    }

    pub fn campaign_data(&self) -> Result<Vec<CsvRow>, AppError> {
        google_ads::load_report(&self.upload_dir.join(google_ads::CAMPAIGN_CSV))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ad_account_node_adds_prefix_once() {
        let mut accounts = Accounts {
            page_id: "p".to_string(),
            instagram_page_id: None,
            ad_account_id: "123".to_string(),
        };
        assert_eq!(accounts.ad_account_node(), "act_123");

        accounts.ad_account_id = "act_123".to_string();
        assert_eq!(accounts.ad_account_node(), "act_123");
    }
}

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One metrics row as returned by an insights edge, kept verbatim.
pub type Insight = Map<String, Value>;

pub type InsightsByPlatform = BTreeMap<String, Vec<Insight>>;

pub type BreakdownInsights = BTreeMap<String, BreakdownResult>;

// Ads

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdInsights {
    Rows(Vec<Insight>),
    /// "No insights available" or the upstream failure text.
    Note(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BreakdownResult {
    Rows(Vec<Insight>),
    Error { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ad {
    pub id: String,
    pub name: String,
    pub adset_id: Option<String>,
    pub campaign_id: Option<String>,
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_duration: Option<String>,
    pub insights: AdInsights,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insights_by_platform: Option<InsightsByPlatform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown_insights: Option<BreakdownInsights>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdsAggregate {
    pub ads_data: Vec<Ad>,
    pub fetched_at: String,
}

// Facebook page content

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacebookPost {
    pub id: String,
    pub message: String,
    pub created_time: Option<String>,
    pub permalink_url: Option<String>,
    pub media_type: Option<String>,
    pub image_url: Option<String>,
    pub likes_count: u64,
    pub comments_count: u64,
    pub shares_count: u64,
    pub reactions_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reel {
    pub id: String,
    pub description: Option<String>,
    pub created_time: Option<String>,
    pub permalink_url: Option<String>,
    pub thumbnail: Option<String>,
    pub likes_count: u64,
    pub comments_count: u64,
    pub shares_count: u64,
    pub reactions_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostsAggregate {
    pub posts: Vec<FacebookPost>,
    pub fetched_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReelsAggregate {
    pub reels: Vec<Reel>,
    pub fetched_at: String,
}

// Instagram

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstagramPost {
    pub id: String,
    pub created_time: Option<String>,
    pub media_type: Option<String>,
    pub image_tag: String,
    pub image_url: Option<String>,
    pub message: String,
    pub likes_count: u64,
    pub comments_count: u64,
    pub shares_count: u64,
    pub permalink_url: Option<String>,
    pub thumbnail_url: Option<String>,
    // Counters below come from the per-media insights edge.
    #[serde(rename = "likes_counts")]
    pub insight_likes: u64,
    #[serde(rename = "comments_counts")]
    pub insight_comments: u64,
    #[serde(rename = "shares_counts")]
    pub insight_shares: u64,
    pub reactions_count: u64,
    pub engagement: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstagramFeed {
    pub instagram_business_account_id: String,
    pub insights: Map<String, Value>,
    pub posts: Vec<InstagramPost>,
    pub fetched_at: String,
}

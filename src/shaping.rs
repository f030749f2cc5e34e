//! Re-keys raw Graph API records into the shapes the dashboard reads.
//!
//! Every lookup here is defensive: missing or oddly typed fields become
//! `None` or `0`, never an error.

use serde_json::{Map, Value};

use crate::breakdowns::into_insights;
use crate::error::FetchError;
use crate::models::{
    Ad, AdInsights, FacebookPost, Insight, InsightsByPlatform, InstagramPost, Reel,
};

pub const NO_INSIGHTS: &str = "No insights available";
pub const UNKNOWN_PLATFORM: &str = "unknown";

fn str_at(value: &Value, pointer: &str) -> Option<String> {
    match value.pointer(pointer)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Counter at `pointer`, accepting numbers or numeric strings, else 0.
fn count_at(value: &Value, pointer: &str) -> u64 {
    match value.pointer(pointer) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

// Ads

pub fn ad_from_raw(raw: &Value) -> Ad {
    Ad {
        id: str_at(raw, "/id").unwrap_or_default(),
        name: str_at(raw, "/name").unwrap_or_default(),
        adset_id: str_at(raw, "/adset_id"),
        campaign_id: str_at(raw, "/campaign_id"),
        status: str_at(raw, "/status"),
        campaign_duration: None,
        insights: AdInsights::Note(NO_INSIGHTS.to_string()),
        insights_by_platform: None,
        breakdown_insights: None,
    }
}

pub fn group_by_platform(insights: &[Insight]) -> InsightsByPlatform {
    let mut grouped = InsightsByPlatform::new();
    for insight in insights {
        let platform = insight
            .get("publisher_platform")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_PLATFORM);
        grouped
            .entry(platform.to_string())
            .or_default()
            .push(insight.clone());
    }
    grouped
}

/// Attaches an ad's insight rows, or records why there are none.
///
/// `group` controls whether `insights_by_platform` is filled; the
/// Instagram-only report skips it since every row shares one platform.
pub fn attach_insights(ad: &mut Ad, fetched: Result<Vec<Value>, FetchError>, group: bool) {
    match fetched {
        Ok(records) => {
            let rows = into_insights(records);
            if rows.is_empty() {
                ad.insights = AdInsights::Note(NO_INSIGHTS.to_string());
                return;
            }
            if group {
                ad.insights_by_platform = Some(group_by_platform(&rows));
            }
            ad.insights = AdInsights::Rows(rows);
        }
        Err(e) => {
            tracing::warn!(ad_id = %ad.id, error = %e, "insights fetch failed");
            ad.insights = AdInsights::Note(format!("Failed to fetch insights: {}", e));
        }
    }
}

pub fn campaign_duration(fetched: Result<Value, FetchError>) -> String {
    let Ok(campaign) = fetched else {
        return "Failed to fetch campaign details".to_string();
    };
    let start = campaign
        .get("start_time")
        .map_or(Some("Unknown".to_string()), |v| v.as_str().map(str::to_string));
    let stop = campaign
        .get("stop_time")
        .map_or(Some("Ongoing".to_string()), |v| v.as_str().map(str::to_string));

    match (start, stop) {
        (Some(start), Some(stop)) if !start.is_empty() && !stop.is_empty() => {
            format!("{} to {}", start, stop)
        }
        (start, _) => format!(
            "Started on {} (Ongoing)",
            start.filter(|start| !start.is_empty()).as_deref().unwrap_or("Unknown")
        ),
    }
}

// Facebook posts

/// Image of the first attachment: `media.image.src`, else `media.source`.
pub fn attachment_image(post: &Value) -> Option<String> {
    let media = post.pointer("/attachments/data/0/media")?;
    str_at(media, "/image/src").or_else(|| str_at(media, "/source"))
}

/// `None` for posts without message text; those are left out of the feed.
pub fn shape_post(raw: &Value) -> Option<FacebookPost> {
    let message = raw
        .get("message")
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())?;

    Some(FacebookPost {
        id: str_at(raw, "/id").unwrap_or_default(),
        message: message.to_string(),
        created_time: str_at(raw, "/created_time"),
        permalink_url: str_at(raw, "/permalink_url"),
        media_type: str_at(raw, "/attachments/data/0/type"),
        image_url: attachment_image(raw),
        likes_count: count_at(raw, "/likes/summary/total_count"),
        comments_count: count_at(raw, "/comments/summary/total_count"),
        shares_count: count_at(raw, "/shares/count"),
        reactions_count: count_at(raw, "/reactions/summary/total_count"),
    })
}

pub fn shape_posts(raw: &[Value]) -> Vec<FacebookPost> {
    let posts: Vec<FacebookPost> = raw.iter().filter_map(shape_post).collect();
    if posts.len() < raw.len() {
        tracing::debug!(dropped = raw.len() - posts.len(), "skipped posts without message");
    }
    posts
}

// Reels

/// Middle thumbnail (index `len / 2`); entries may be `{ "uri": .. }` or bare strings.
pub fn center_thumbnail(thumbnails: &[Value]) -> Option<String> {
    let center = thumbnails.get(thumbnails.len() / 2)?;
    match center {
        Value::String(uri) => Some(uri.clone()),
        other => str_at(other, "/uri"),
    }
}

pub fn shape_reel(raw: &Value) -> Reel {
    let thumbnails = raw
        .pointer("/thumbnails/data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    Reel {
        id: str_at(raw, "/id").unwrap_or_default(),
        description: str_at(raw, "/description"),
        created_time: str_at(raw, "/created_time"),
        permalink_url: str_at(raw, "/permalink_url"),
        thumbnail: center_thumbnail(thumbnails),
        likes_count: count_at(raw, "/likes/summary/total_count"),
        comments_count: count_at(raw, "/comments/summary/total_count"),
        shares_count: count_at(raw, "/shares/count"),
        reactions_count: count_at(raw, "/reactions/summary/total_count"),
    }
}

// Instagram

/// Flattens an insights `data` list into `name -> values[0].value`.
pub fn metric_values(data: &[Value]) -> Map<String, Value> {
    data.iter()
        .filter_map(|item| {
            let name = item.get("name")?.as_str()?;
            let value = item.pointer("/values/0/value")?;
            Some((name.to_string(), value.clone()))
        })
        .collect()
}

fn metric(metrics: &Map<String, Value>, names: &[&str]) -> u64 {
    names
        .iter()
        .find_map(|name| metrics.get(*name).and_then(Value::as_u64))
        .unwrap_or(0)
}

/// `metrics` is `None` when the per-media insights call failed; counters are then 0.
pub fn shape_instagram_post(raw: &Value, metrics: Option<&Map<String, Value>>) -> InstagramPost {
    let media_type = str_at(raw, "/media_type");
    let media_url = str_at(raw, "/media_url");

    let thumbnail_url = match media_type.as_deref() {
        Some("VIDEO") => str_at(raw, "/thumbnail_url"),
        Some("CAROUSEL_ALBUM") => raw.pointer("/children/data/0").and_then(|child| {
            str_at(child, "/thumbnail_url").or_else(|| str_at(child, "/media_url"))
        }),
        _ => None,
    };

    let empty = Map::new();
    let metrics = metrics.unwrap_or(&empty);

    InstagramPost {
        id: str_at(raw, "/id").unwrap_or_default(),
        created_time: str_at(raw, "/timestamp"),
        image_tag: format!(
            r#"<img src="{}" alt="Post Image">"#,
            media_url.as_deref().unwrap_or_default()
        ),
        image_url: media_url,
        media_type,
        message: str_at(raw, "/caption").unwrap_or_else(|| "No caption".to_string()),
        likes_count: count_at(raw, "/like_count"),
        comments_count: count_at(raw, "/comments_count"),
        shares_count: count_at(raw, "/shares_count"),
        permalink_url: str_at(raw, "/permalink"),
        thumbnail_url,
        insight_likes: metric(metrics, &["likes", "like_count"]),
        insight_comments: metric(metrics, &["comments"]),
        insight_shares: metric(metrics, &["shares"]),
        reactions_count: metric(metrics, &["reactions"]),
        engagement: metric(metrics, &["engagement"]),
    }
}

use serde_json::Value;

use crate::graph_api::GraphClient;
use crate::models::{BreakdownInsights, BreakdownResult, Insight};
use crate::pagination::CursorStyle;

pub const BREAKDOWN_FIELDS: &str = "reach,impressions,clicks";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakdownDimension {
    Age,
    Region,
    Gender,
    DevicePlatform,
}

impl BreakdownDimension {
    pub const ALL: [BreakdownDimension; 4] = [
        BreakdownDimension::Age,
        BreakdownDimension::Region,
        BreakdownDimension::Gender,
        BreakdownDimension::DevicePlatform,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BreakdownDimension::Age => "age",
            BreakdownDimension::Region => "region",
            BreakdownDimension::Gender => "gender",
            BreakdownDimension::DevicePlatform => "device_platform",
        }
    }
}

/// Keeps object records; anything else in `data` is skipped.
pub fn into_insights(records: Vec<Value>) -> Vec<Insight> {
    records
        .into_iter()
        .filter_map(|record| match record {
            Value::Object(row) => Some(row),
            other => {
                tracing::debug!(record = %other, "skipping non-object insight row");
                None
            }
        })
        .collect()
}

/// Account-wide insights split along each demographic dimension.
///
/// Dimensions are fetched one after another and independently: a failed
/// dimension holds `{"error": ...}` while the rest still populate.
pub async fn aggregate_breakdowns(client: &GraphClient, account_node: &str) -> BreakdownInsights {
    collect(client, account_node, None).await
}

/// Same as [`aggregate_breakdowns`], keeping only rows attributed to `platform`.
pub async fn aggregate_breakdowns_for_platform(
    client: &GraphClient,
    account_node: &str,
    platform: &str,
) -> BreakdownInsights {
    collect(client, account_node, Some(platform)).await
}

async fn collect(
    client: &GraphClient,
    account_node: &str,
    platform: Option<&str>,
) -> BreakdownInsights {
    let path = format!("{}/insights", account_node);
    let mut breakdowns = BreakdownInsights::new();

    for dimension in BreakdownDimension::ALL {
        let params = [
            ("fields", BREAKDOWN_FIELDS),
            ("date_preset", "maximum"),
            ("breakdowns", dimension.as_str()),
        ];

        let result = match client.get_edge(&path, &params, CursorStyle::AfterCursor).await {
            Ok(records) => {
                let mut rows = into_insights(records);
                if let Some(platform) = platform {
                    rows.retain(|row| {
                        row.get("publisher_platform").and_then(Value::as_str) == Some(platform)
                    });
                }
                tracing::debug!(
                    dimension = dimension.as_str(),
                    rows = rows.len(),
                    "breakdown fetched"
                );
                BreakdownResult::Rows(rows)
            }
            Err(e) => {
                tracing::warn!(
                    dimension = dimension.as_str(),
                    error = %e,
                    "breakdown fetch failed"
                );
                BreakdownResult::Error {
                    error: e.to_string(),
                }
            }
        };

        breakdowns.insert(dimension.as_str().to_string(), result);
    }

    breakdowns
}

use serde_json::Value;

use crate::error::FetchError;
use crate::graph_api::{GraphTransport, QueryParams};

/// How the upstream points at the following page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStyle {
    /// `paging.next` is an absolute URL that already carries the query.
    NextUrl,
    /// Re-request the same URL with `after=<paging.cursors.after>`.
    AfterCursor,
}

#[derive(Debug, PartialEq)]
enum NextPage {
    Url(String),
    After(String),
}

fn next_page(payload: &Value, style: CursorStyle) -> Option<NextPage> {
    let next = payload.pointer("/paging/next").and_then(Value::as_str)?;
    match style {
        CursorStyle::NextUrl => Some(NextPage::Url(next.to_string())),
        CursorStyle::AfterCursor => {
            let after = payload.pointer("/paging/cursors/after").and_then(Value::as_str);
            if after.is_none() {
                tracing::warn!("paging.next present without paging.cursors.after, stopping");
            }
            after.map(|cursor| NextPage::After(cursor.to_string()))
        }
    }
}

fn set_param(params: &mut QueryParams, key: &str, value: String) {
    match params.iter_mut().find(|(k, _)| k == key) {
        Some((_, existing)) => *existing = value,
        None => params.push((key.to_string(), value)),
    }
}

/// Fetches `base_url` and every following page, concatenating `data` in page order.
///
/// Stops at the first page without `paging.next`. A non-success status or a
/// payload without a `data` array ends the walk with an error; records from
/// earlier pages are discarded with it. More than `max_pages` pages is
/// reported as [`FetchError::LimitExceeded`].
pub async fn fetch_all(
    transport: &dyn GraphTransport,
    base_url: &str,
    mut params: QueryParams,
    style: CursorStyle,
    max_pages: usize,
) -> Result<Vec<Value>, FetchError> {
    let mut url = base_url.to_string();
    let mut records = Vec::new();
    let mut pages = 0;

    loop {
        if pages == max_pages {
            tracing::warn!(%base_url, max_pages, "pagination limit reached");
            return Err(FetchError::LimitExceeded(max_pages));
        }
        pages += 1;

        let response = transport.get(&url, &params).await?;
        if !response.is_success() {
            return Err(FetchError::Upstream {
                status: response.status,
                details: response.body,
            });
        }

        let mut payload = response.json()?;
        let next = next_page(&payload, style);
        match payload.get_mut("data").map(Value::take) {
            Some(Value::Array(page)) => records.extend(page),
            _ => return Err(FetchError::MissingData),
        }

        match next {
            Some(NextPage::Url(next_url)) => {
                url = next_url;
                params.clear();
            }
            Some(NextPage::After(cursor)) => set_param(&mut params, "after", cursor),
            None => break,
        }
    }

    tracing::debug!(%base_url, pages, records = records.len(), "pagination finished");
    Ok(records)
}

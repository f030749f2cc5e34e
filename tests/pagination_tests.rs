use meta_dashboard_api::error::FetchError;
use meta_dashboard_api::pagination::CursorStyle;
use rstest::rstest;
use serde_json::json;
use std::sync::Arc;

use test_utils::{
    ROOT, ScriptedTransport, error_page, graph_client, page, page_with_cursor, page_with_next,
};

fn next_url(n: usize) -> String {
    format!("{}/act_1/ads?page={}", ROOT, n)
}

/// Script `pages` pages of two records each, linked by absolute `next` URLs.
fn linked_pages(pages: usize) -> ScriptedTransport {
    let mut transport = ScriptedTransport::new();
    for n in 1..pages {
        let data = json!([{ "id": format!("{}a", n + 1) }, { "id": format!("{}b", n + 1) }]);
        let response = if n + 1 < pages {
            page_with_next(data, &next_url(n + 1))
        } else {
            page(data)
        };
        transport = transport.on(&format!("page={}", n), &[], vec![response]);
    }
    let first = json!([{ "id": "1a" }, { "id": "1b" }]);
    let first = if pages > 1 {
        page_with_next(first, &next_url(1))
    } else {
        page(first)
    };
    transport.on("act_1/ads", &[], vec![first])
}

#[rstest]
#[case::single_page(1)]
#[case::two_pages(2)]
#[case::five_pages(5)]
#[tokio::test]
async fn test_concatenates_pages_in_order(#[case] pages: usize) {
    let transport = Arc::new(linked_pages(pages));
    let client = graph_client(transport.clone(), 10);

    let records = client
        .get_edge("act_1/ads", &[("fields", "id")], CursorStyle::NextUrl)
        .await
        .expect("pagination should succeed");

    let ids: Vec<String> = records
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect();
    let expected: Vec<String> = (1..=pages)
        .flat_map(|n| [format!("{}a", n), format!("{}b", n)])
        .collect();
    assert_eq!(ids, expected);
    assert_eq!(transport.calls().len(), pages, "stops at the first page without next");
}

#[tokio::test]
async fn test_next_url_is_followed_without_resending_params() {
    let transport = Arc::new(linked_pages(2));
    let client = graph_client(transport.clone(), 10);

    client
        .get_edge("act_1/ads", &[("fields", "id")], CursorStyle::NextUrl)
        .await
        .unwrap();

    let calls = transport.calls();
    assert!(calls[0].1.contains(&("access_token".to_string(), "test-token".to_string())));
    assert_eq!(calls[1].0, next_url(1));
    assert!(calls[1].1.is_empty());
}

#[tokio::test]
async fn test_after_cursor_keeps_base_url_and_sets_after() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .on("act_1/insights", &[("after", "c2")], vec![page(json!([{ "age": "25-34" }]))])
            .on(
                "act_1/insights",
                &[("after", "c1")],
                vec![page_with_cursor(json!([{ "age": "18-24" }]), "c2")],
            )
            .on(
                "act_1/insights",
                &[],
                vec![page_with_cursor(json!([{ "age": "13-17" }]), "c1")],
            ),
    );
    let client = graph_client(transport.clone(), 10);

    let records = client
        .get_edge("act_1/insights", &[("breakdowns", "age")], CursorStyle::AfterCursor)
        .await
        .unwrap();

    assert_eq!(
        records,
        vec![json!({ "age": "13-17" }), json!({ "age": "18-24" }), json!({ "age": "25-34" })]
    );
    let calls = transport.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|(url, _)| url == &format!("{}/act_1/insights", ROOT)));
    let afters: Vec<usize> = calls
        .iter()
        .map(|(_, params)| params.iter().filter(|(k, _)| k == "after").count())
        .collect();
    assert_eq!(afters, vec![0, 1, 1], "after is replaced, never duplicated");
}

#[tokio::test]
async fn test_upstream_failure_carries_status_and_body() {
    let transport = Arc::new(ScriptedTransport::new().on(
        "act_1/ads",
        &[],
        vec![error_page(400, "Invalid OAuth access token")],
    ));
    let client = graph_client(transport, 10);

    let err = client
        .get_edge("act_1/ads", &[], CursorStyle::NextUrl)
        .await
        .unwrap_err();

    match err {
        FetchError::Upstream { status, details } => {
            assert_eq!(status, 400);
            assert!(details.contains("Invalid OAuth access token"));
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failure_on_later_page_stops_the_walk() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .on("page=1", &[], vec![error_page(500, "temporarily unavailable")])
            .on("act_1/ads", &[], vec![page_with_next(json!([{ "id": "1" }]), &next_url(1))]),
    );
    let client = graph_client(transport.clone(), 10);

    let err = client
        .get_edge("act_1/ads", &[], CursorStyle::NextUrl)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Upstream { status: 500, .. }));
    assert_eq!(transport.calls().len(), 2);
}

#[tokio::test]
async fn test_payload_without_data_is_an_error() {
    let transport = Arc::new(ScriptedTransport::new().on(
        "act_1/ads",
        &[],
        vec![test_utils::object(json!({ "paging": {} }))],
    ));
    let client = graph_client(transport, 10);

    let err = client
        .get_edge("act_1/ads", &[], CursorStyle::NextUrl)
        .await
        .unwrap_err();

    assert_eq!(err, FetchError::MissingData);
}

#[tokio::test]
async fn test_endless_upstream_hits_page_limit() {
    // Every page points at itself.
    let looping = page_with_next(json!([{ "id": "x" }]), &format!("{}/act_1/ads?loop=1", ROOT));
    let transport = Arc::new(ScriptedTransport::new().on("act_1/ads", &[], vec![looping]));
    let client = graph_client(transport.clone(), 3);

    let err = client
        .get_edge("act_1/ads", &[], CursorStyle::NextUrl)
        .await
        .unwrap_err();

    assert_eq!(err, FetchError::LimitExceeded(3));
    assert_eq!(transport.calls().len(), 3);
}

#[tokio::test]
async fn test_exactly_max_pages_is_allowed() {
    let transport = Arc::new(linked_pages(3));
    let client = graph_client(transport, 3);

    let records = client
        .get_edge("act_1/ads", &[], CursorStyle::NextUrl)
        .await
        .expect("three pages fit a limit of three");

    assert_eq!(records.len(), 6);
}

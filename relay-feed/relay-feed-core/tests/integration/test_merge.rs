use relay_feed_core::{
    MergeError, NodeKey, merge_connections, merge_connections_backward,
};
use relay_feed_test_utils::{
    assert_error_msg, expect_eq,
    fixtures::{connection, nest_at, response_at},
    init_test_tracing,
    json_utils::{edge_cursors, edge_ids, json_at},
};
use serde_json::json;

use crate::path;

#[test]
fn scenario_a_appends_next_page() {
    let old = json!({
        "edges": [{ "cursor": "1", "node": { "id": "a" } }],
        "pageInfo": { "endCursor": "1", "hasNextPage": true }
    });
    let new = json!({
        "edges": [{ "cursor": "2", "node": { "id": "b" } }],
        "pageInfo": { "endCursor": "2", "hasNextPage": false }
    });

    expect_eq!(
        actual = merge_connections(Some(&old), new, &path(""), &NodeKey::default()).unwrap(),
        expected = json!({
            "edges": [
                { "cursor": "1", "node": { "id": "a" } },
                { "cursor": "2", "node": { "id": "b" } }
            ],
            "pageInfo": { "endCursor": "2", "hasNextPage": false }
        }),
    );
}

#[test]
fn scenario_b_overlapping_page_is_deduplicated() {
    init_test_tracing();
    let path = path("article.responses");
    let old = response_at("article.responses", &["a", "b"], true);
    let new = response_at("article.responses", &["b", "c"], true);

    let merged = merge_connections(Some(&old), new, &path, &NodeKey::default()).unwrap();

    expect_eq!(
        actual = edge_ids(&merged, "article.responses"),
        expected = vec!["a", "b", "c"],
    );
    // `b` keeps the cursor it was first seen with
    expect_eq!(
        actual = edge_cursors(&merged, "article.responses"),
        expected = vec!["cursor-a", "cursor-b", "cursor-c"],
    );
}

#[test]
fn scenario_c_first_page_is_passed_through() {
    let new = json!({
        "article": {
            "id": "article-1",
            "responseCount": 12,
            "live": true,
            "responses": connection(&["a"], true)
        }
    });

    expect_eq!(
        actual = merge_connections(None, new.clone(), &path("article.responses"), &NodeKey::default())
            .unwrap(),
        expected = new,
    );
}

#[test]
fn sibling_fields_come_from_new_response() {
    let old = json!({
        "article": {
            "responseCount": 2,
            "responses": { "totalCount": 2, "edges": [], "pageInfo": { "hasNextPage": true } }
        },
        "viewer": { "id": "old-viewer" }
    });
    let new = json!({
        "article": {
            "responseCount": 3,
            "responses": connection(&["x"], false)
        },
        "viewer": { "id": "new-viewer" }
    });
    let mut expected_connection = connection(&["x"], false);
    expected_connection["totalCount"] = json!(3);
    let mut new_with_total = new.clone();
    new_with_total["article"]["responses"]["totalCount"] = json!(3);

    let merged = merge_connections(
        Some(&old),
        new_with_total,
        &path("article.responses"),
        &NodeKey::default(),
    )
    .unwrap();

    expect_eq!(actual = &merged["article"]["responseCount"], expected = &json!(3));
    expect_eq!(actual = &merged["viewer"]["id"], expected = &json!("new-viewer"));
    expect_eq!(
        actual = &merged["article"]["responses"],
        expected = &expected_connection
    );
}

#[test]
fn page_info_is_taken_from_new_page() {
    let old = response_at("node.commentedArticles", &["a", "b"], true);
    let new = response_at("node.commentedArticles", &["c"], false);
    let expected_page_info = json_at(&new, "node.commentedArticles.pageInfo").clone();

    let merged = merge_connections(
        Some(&old),
        new,
        &path("node.commentedArticles"),
        &NodeKey::default(),
    )
    .unwrap();

    expect_eq!(
        actual = json_at(&merged, "node.commentedArticles.pageInfo"),
        expected = &expected_page_info,
    );
}

#[test]
fn remerging_the_same_page_changes_nothing() {
    let path = path("viewer.wallet.transactions");
    let key = NodeKey::default();
    let a = response_at("viewer.wallet.transactions", &["t1", "t2"], true);
    let b = response_at("viewer.wallet.transactions", &["t3", "t4"], true);

    let once = merge_connections(Some(&a), b.clone(), &path, &key).unwrap();
    let twice = merge_connections(Some(&once), b, &path, &key).unwrap();

    expect_eq!(actual = twice, expected = once);
}

#[test]
fn merge_is_deterministic_and_keeps_old_input_intact() {
    let path = path("search.articles");
    let key = NodeKey::default();
    let old = response_at("search.articles", &["a", "b", "c"], true);
    let old_before = old.clone();
    let new = response_at("search.articles", &["c", "d", "a", "e"], true);

    let first = merge_connections(Some(&old), new.clone(), &path, &key).unwrap();
    let second = merge_connections(Some(&old), new, &path, &key).unwrap();

    expect_eq!(actual = &first, expected = &second);
    expect_eq!(actual = old, expected = old_before);
    expect_eq!(
        actual = edge_ids(&first, "search.articles"),
        expected = vec!["a", "b", "c", "d", "e"],
    );
}

#[test]
fn repeats_inside_the_new_page_are_dropped() {
    let old = response_at("feed", &["a"], true);
    let new = nest_at(
        "feed",
        json!({
            "edges": [
                { "cursor": "2", "node": { "id": "b" } },
                { "cursor": "3", "node": { "id": "b" } },
                { "cursor": "4", "node": { "id": "c" } }
            ],
            "pageInfo": { "endCursor": "4", "hasNextPage": false }
        }),
    );

    let merged = merge_connections(Some(&old), new, &path("feed"), &NodeKey::default()).unwrap();

    expect_eq!(actual = edge_ids(&merged, "feed"), expected = vec!["a", "b", "c"]);
    expect_eq!(
        actual = edge_cursors(&merged, "feed"),
        expected = vec!["cursor-a", "2", "4"],
    );
}

#[test]
fn nodes_without_key_are_never_duplicates() {
    let old = json!({
        "edges": [{ "cursor": "1", "node": { "title": "untitled" } }],
        "pageInfo": { "hasNextPage": true }
    });
    let new = json!({
        "edges": [{ "cursor": "2", "node": { "title": "untitled" } }],
        "pageInfo": { "hasNextPage": false }
    });

    let merged = merge_connections(Some(&old), new, &path(""), &NodeKey::default()).unwrap();

    expect_eq!(
        actual = edge_cursors(&merged, ""),
        expected = vec!["1", "2"],
    );
}

#[test]
fn whole_node_identity() {
    let old = json!({
        "edges": [{ "cursor": "1", "node": { "tag": "rust", "count": 1 } }],
        "pageInfo": { "hasNextPage": true }
    });
    let new = json!({
        "edges": [
            { "cursor": "2", "node": { "count": 1, "tag": "rust" } },
            { "cursor": "3", "node": { "tag": "rust", "count": 2 } }
        ],
        "pageInfo": { "hasNextPage": false }
    });

    let merged = merge_connections(Some(&old), new, &path(""), &NodeKey::Whole).unwrap();

    expect_eq!(actual = edge_cursors(&merged, ""), expected = vec!["1", "3"]);
}

#[test]
fn custom_identity_field() {
    let old = json!({
        "edges": [{ "cursor": "1", "node": { "id": "x", "uuid": "u1" } }],
        "pageInfo": { "hasNextPage": true }
    });
    let new = json!({
        "edges": [{ "cursor": "2", "node": { "id": "y", "uuid": "u1" } }],
        "pageInfo": { "hasNextPage": false }
    });

    let merged =
        merge_connections(Some(&old), new, &path(""), &NodeKey::field("uuid")).unwrap();

    expect_eq!(actual = edge_cursors(&merged, ""), expected = vec!["1"]);
}

#[test]
fn null_previous_connection_counts_as_first_page() {
    let old = json!({ "node": { "commentedArticles": null } });
    let new = response_at("node.commentedArticles", &["a"], false);

    expect_eq!(
        actual = merge_connections(
            Some(&old),
            new.clone(),
            &path("node.commentedArticles"),
            &NodeKey::default()
        )
        .unwrap(),
        expected = new,
    );
}

#[test]
fn connection_inside_array() {
    let old = json!({ "search": [{ "results": connection(&["a"], true) }] });
    let new = json!({ "search": [{ "results": connection(&["b"], false) }] });

    let merged =
        merge_connections(Some(&old), new, &path("search.0.results"), &NodeKey::default())
            .unwrap();

    expect_eq!(
        actual = edge_ids(&merged, "search.0.results"),
        expected = vec!["a", "b"],
    );
}

#[test]
fn path_not_found_in_new_response() {
    let new = json!({ "article": { "id": "1" } });

    assert_error_msg!(
        merge_connections(None, new, &path("article.responses"), &NodeKey::default()),
        "Path `article.responses` does not resolve to an object"
    );
}

#[test]
fn path_not_found_in_old_response() {
    let old = json!({ "viewer": {} });
    let new = response_at("viewer.wallet.transactions", &["t1"], false);

    assert_eq!(
        Err(MergeError::PathNotFound {
            path: "viewer.wallet.transactions".into()
        }),
        merge_connections(
            Some(&old),
            new,
            &path("viewer.wallet.transactions"),
            &NodeKey::default()
        )
    );
}

#[test]
fn path_through_scalar_is_not_found() {
    let new = json!({ "article": "not an object" });

    assert!(matches!(
        merge_connections(None, new, &path("article.responses"), &NodeKey::default()),
        Err(MergeError::PathNotFound { .. })
    ));
}

#[test]
fn shape_mismatch_is_reported() {
    let new = json!({ "article": { "responses": { "nodes": [] } } });

    assert_error_msg!(
        merge_connections(None, new, &path("article.responses"), &NodeKey::default()),
        "Value at `article.responses` is not a connection: missing `edges`"
    );

    let old = json!({ "article": { "responses": { "edges": [], "pageInfo": null } } });
    let new = response_at("article.responses", &["a"], false);

    assert_error_msg!(
        merge_connections(Some(&old), new, &path("article.responses"), &NodeKey::default()),
        "Value at `article.responses` is not a connection: `pageInfo` is not an object"
    );
}

#[test]
fn backward_merge_prepends_older_page() {
    let old = json!({
        "edges": [
            { "cursor": "3", "node": { "id": "c" } },
            { "cursor": "4", "node": { "id": "d" } }
        ],
        "pageInfo": {
            "startCursor": "3",
            "endCursor": "4",
            "hasNextPage": false,
            "hasPreviousPage": true
        }
    });
    let new = json!({
        "edges": [
            { "cursor": "1", "node": { "id": "a" } },
            { "cursor": "2", "node": { "id": "b" } },
            { "cursor": "3", "node": { "id": "c" } }
        ],
        "pageInfo": {
            "startCursor": "1",
            "endCursor": "3",
            "hasNextPage": true,
            "hasPreviousPage": false
        }
    });

    let merged =
        merge_connections_backward(Some(&old), new, &path(""), &NodeKey::default()).unwrap();

    expect_eq!(actual = edge_ids(&merged, ""), expected = vec!["a", "b", "c", "d"]);
    expect_eq!(
        actual = &merged["pageInfo"],
        expected = &json!({
            "startCursor": "1",
            "endCursor": "4",
            "hasNextPage": false,
            "hasPreviousPage": false
        }),
    );
}

//! Catalog filters on list endpoints and the client lookups and queries resources declare.

mod support;

use axum::http::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use support::*;

fn countries(store: &MemoryStore, n: usize) {
    let rows = (0..n)
        .map(|i| json!({ "name": format!("Country {:02}", i), "iso_code": format!("C{}", i) }))
        .collect();
    store.seed(&resource("countries"), rows);
}

fn products() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.seed(
        &resource("products"),
        vec![
            json!({ "name": "Red Wine", "slug": "red-wine", "description": "Malbec", "price": 18.5,
                    "category_id": 2, "is_featured": true }),
            json!({ "name": "White Wine", "slug": "white-wine", "description": "Dry", "price": 12,
                    "category_id": 2, "is_featured": false }),
            json!({ "name": "Cheese Board", "slug": "cheese-board", "description": "Goes with wine",
                    "price": 30, "category_id": 5, "is_featured": true }),
            json!({ "name": "Old Stock", "slug": "old-stock", "description": "Wine from last year",
                    "price": 15, "category_id": 2, "is_featured": true, "is_active": false }),
        ],
    );
    store
}

fn names(body: &Value) -> Vec<&str> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["name"].as_str().unwrap())
        .collect()
}

// -- Equality filters ------------------------------------------------------------

#[tokio::test]
async fn filterable_column_narrows_the_page_and_stays_in_links() {
    let store = Arc::new(MemoryStore::new());
    countries(&store, 5);
    let (status, _, body) = call(app(store), get("/api/client/countries?iso_code=C1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["totalItems"], 1);
    assert_eq!(names(&body), vec!["Country 01"]);
    assert_eq!(body["links"]["self"], "/api/client/countries?iso_code=C1&page=1&perPage=10");
}

#[tokio::test]
async fn repeated_filter_matches_any_value() {
    let store = Arc::new(MemoryStore::new());
    countries(&store, 5);
    let (_, _, body) = call(
        app(store),
        get("/api/admin/countries?iso_code=C1&iso_code=C3&perPage=1&sortBy=name"),
    )
    .await;
    assert_eq!(body["pagination"]["totalItems"], 2);
    assert_eq!(names(&body), vec!["Country 01"]);
    assert_eq!(
        body["links"]["next"],
        "/api/admin/countries?iso_code=C1&iso_code=C3&sortBy=name&page=2&perPage=1"
    );
}

#[tokio::test]
async fn parameters_outside_the_allow_list_do_not_filter() {
    let store = Arc::new(MemoryStore::new());
    countries(&store, 3);
    let (_, _, body) = call(app(store), get("/api/admin/countries?created_at=nope&q=zzz")).await;
    assert_eq!(body["pagination"]["totalItems"], 3);
}

#[tokio::test]
async fn full_list_honours_filters() {
    let store = Arc::new(MemoryStore::new());
    countries(&store, 4);
    let (_, _, body) = call(app(store), get("/api/admin/countries/all?iso_code=C2")).await;
    assert_eq!(body["meta"]["count"], 1);
}

// -- Product queries --------------------------------------------------------------

#[tokio::test]
async fn featured_lists_active_flagged_rows() {
    let (status, _, body) = call(app(products()), get("/api/client/products/featured?sortBy=name&order=asc")).await;
    assert_eq!(status, StatusCode::OK);
    assert_envelope(&body);
    assert_eq!(names(&body), vec!["Cheese Board", "Red Wine"]);
    assert_eq!(body["pagination"]["totalItems"], 2);
}

#[tokio::test]
async fn count_reports_active_rows() {
    let (status, _, body) = call(app(products()), get("/api/client/products/count")).await;
    assert_eq!(status, StatusCode::OK);
    assert_envelope(&body);
    assert_eq!(body["data"], json!({ "count": 3 }));

    let (_, _, body) = call(app(products()), get("/api/client/products/count?category_id=2")).await;
    assert_eq!(body["data"]["count"], 2);
}

#[tokio::test]
async fn search_matches_any_searchable_column() {
    let (status, _, body) = call(
        app(products()),
        get("/api/client/products/search?query=WINE&sortBy=name&order=ASC"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Cheese Board", "Red Wine", "White Wine"]);
    assert_eq!(
        body["links"]["self"],
        "/api/client/products/search?query=WINE&sortBy=name&order=ASC&page=1&perPage=10"
    );
}

#[tokio::test]
async fn search_without_text_is_bad_request() {
    for uri in ["/api/client/products/search", "/api/client/products/search?query=%20%20"] {
        let (status, _, body) = call(app(products()), get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_envelope(&body);
        assert_eq!(body["message"], "Query parameter 'query' is required");
    }
}

#[tokio::test]
async fn category_route_lists_related_rows() {
    let (status, _, body) = call(app(products()), get("/api/client/products/category/2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["totalItems"], 2);
    assert!(names(&body).iter().all(|n| n.ends_with("Wine")));
}

#[tokio::test]
async fn price_range_is_inclusive() {
    let (status, _, body) = call(
        app(products()),
        get("/api/client/products/price-range?minPrice=12&maxPrice=18.5&sortBy=price&order=ASC"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["White Wine", "Red Wine"]);

    let (_, _, body) = call(app(products()), get("/api/client/products/price-range?minPrice=20")).await;
    assert_eq!(names(&body), vec!["Cheese Board"]);
}

#[tokio::test]
async fn malformed_price_range_is_bad_request() {
    for (uri, message) in [
        ("/api/client/products/price-range", "'minPrice' or 'maxPrice' is required"),
        ("/api/client/products/price-range?minPrice=cheap", "'minPrice' must be a number, got 'cheap'"),
        (
            "/api/client/products/price-range?minPrice=30&maxPrice=10",
            "'minPrice' cannot be greater than 'maxPrice'",
        ),
    ] {
        let (status, _, body) = call(app(products()), get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["errorCode"], "BAD_REQUEST");
        assert_eq!(body["message"], message);
    }
}

#[tokio::test]
async fn products_are_read_by_slug_on_the_client_mount() {
    let (status, _, body) = call(app(products()), get("/api/client/products/red-wine")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Red Wine");

    let (status, _, body) = call(app(products()), get("/api/client/products/old-stock")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Products record old-stock not found");
}

// -- Natural keys ---------------------------------------------------------------

#[tokio::test]
async fn payment_method_lookup_by_key() {
    let store = Arc::new(MemoryStore::new());
    store.seed(
        &resource("payment_methods"),
        vec![
            json!({ "name": "Card", "method_key": "card" }),
            json!({ "name": "Cash", "method_key": "cash", "is_active": false }),
        ],
    );
    let (status, _, body) = call(app(store.clone()), get("/api/client/payment-methods/key/card")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Card");

    let (status, _, body) = call(app(store), get("/api/client/payment-methods/key/cash")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errorCode"], "NOT_FOUND");
}

#[tokio::test]
async fn payment_status_is_read_by_status_key() {
    let store = Arc::new(MemoryStore::new());
    store.seed(
        &resource("payment_statuses"),
        vec![json!({ "name": "Approved", "status_key": "approved" })],
    );
    let (status, _, body) = call(app(store), get("/api/client/payment-statuses/approved")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status_key"], "approved");
}

#[tokio::test]
async fn payment_channels_by_method() {
    let store = Arc::new(MemoryStore::new());
    store.seed(
        &resource("payment_channels"),
        vec![
            json!({ "name": "Visa", "payment_method_id": 1 }),
            json!({ "name": "Nequi", "payment_method_id": 2 }),
            json!({ "name": "Mastercard", "payment_method_id": 1 }),
        ],
    );
    let (status, _, body) = call(app(store), get("/api/client/payment-channels/by-method/1?sortBy=name")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Mastercard", "Visa"]);
}

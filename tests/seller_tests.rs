use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lotwise_client::auth::{Session, User};
use lotwise_client::error::{Error, ValidationError};
use lotwise_client::seller::NewAuctionDraft;
use lotwise_client::Lotwise;

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()
}

fn signed_in_seller(marketplace: &Lotwise) {
    let user = User {
        id: "seller-1".to_string(),
        email: Some("seller@example.com".to_string()),
        email_confirmed_at: None,
        last_sign_in_at: None,
        created_at: "2026-08-01T00:00:00Z".to_string(),
        updated_at: None,
        role: Some("authenticated".to_string()),
        user_metadata: Default::default(),
    };
    marketplace.auth().set_session(Session::new(
        "seller_access_token".to_string(),
        "seller_refresh_token".to_string(),
        3600,
        Some(user),
    ));
}

fn draft() -> NewAuctionDraft {
    NewAuctionDraft {
        title: "Mid-century chair".to_string(),
        description: "Teak, reupholstered".to_string(),
        starting_bid: 1000,
        bid_increment: Some(100),
        reserve_price: Some(2000),
        buy_now_price: Some(5000),
        start_date: None,
        end_date: now() + Duration::days(7),
    }
}

fn stored_item(status: &str) -> serde_json::Value {
    json!({
        "id": 42,
        "seller_id": "seller-1",
        "title": "Mid-century chair",
        "description": "Teak, reupholstered",
        "starting_bid": 1000,
        "bid_increment": 100,
        "reserve_price": 2000,
        "buy_now_price": 5000,
        "image_url": null,
        "start_date": null,
        "end_date": "2026-08-08T12:00:00Z",
        "status": status,
        "created_at": "2026-08-01T12:00:00Z"
    })
}

#[tokio::test]
async fn creating_a_draft_writes_it_with_the_seller_tagged() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/auction_items"))
        .and(header("Authorization", "Bearer seller_access_token"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([stored_item("draft")])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let marketplace = Lotwise::new(&mock_server.uri(), "test_anon_key");
    signed_in_seller(&marketplace);
    let seller = marketplace.seller().unwrap();

    let item = seller.create_auction(&draft(), now()).await.unwrap();
    assert_eq!(item.id, 42);
    assert_eq!(item.seller_id, "seller-1");
}

#[tokio::test]
async fn an_invalid_draft_never_reaches_the_network() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/auction_items"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let marketplace = Lotwise::new(&mock_server.uri(), "test_anon_key");
    signed_in_seller(&marketplace);
    let seller = marketplace.seller().unwrap();

    // buy-now at the starting bid violates the listing invariant
    let mut bad = draft();
    bad.buy_now_price = Some(1000);

    let err = seller.create_auction(&bad, now()).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::Listing(_))
    ));
}

#[tokio::test]
async fn publishing_moves_a_draft_to_active() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/auction_items"))
        .and(query_param("id", "eq.42"))
        .and(query_param("seller_id", "eq.seller-1"))
        .and(query_param("status", "eq.draft"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([stored_item("active")])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let marketplace = Lotwise::new(&mock_server.uri(), "test_anon_key");
    signed_in_seller(&marketplace);
    let seller = marketplace.seller().unwrap();

    let item = seller.publish(42).await.unwrap();
    assert_eq!(
        item.status,
        lotwise_client::model::AuctionStatus::Active
    );
}

#[tokio::test]
async fn publishing_someone_elses_listing_updates_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/auction_items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let marketplace = Lotwise::new(&mock_server.uri(), "test_anon_key");
    signed_in_seller(&marketplace);
    let seller = marketplace.seller().unwrap();

    let err = seller.publish(7).await.unwrap_err();
    assert!(matches!(err, Error::Data(_)));
}

use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lotwise_client::auth::{Principal, Session, User};
use lotwise_client::bidding::BidSession;
use lotwise_client::error::{Error, ValidationError};
use lotwise_client::model::{AuctionItem, AuctionStatus};
use lotwise_client::Lotwise;

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()
}

fn item() -> AuctionItem {
    AuctionItem {
        id: 42,
        seller_id: "seller-1".to_string(),
        title: "Turntable".to_string(),
        description: String::new(),
        starting_bid: 1000,
        bid_increment: Some(100),
        reserve_price: None,
        buy_now_price: None,
        image_url: None,
        start_date: None,
        end_date: now() + Duration::days(2),
        status: AuctionStatus::Active,
        created_at: now(),
    }
}

fn signed_in(marketplace: &Lotwise, user_id: &str) {
    let user = User {
        id: user_id.to_string(),
        email: Some(format!("{}@example.com", user_id)),
        email_confirmed_at: None,
        last_sign_in_at: None,
        created_at: "2026-08-01T00:00:00Z".to_string(),
        updated_at: None,
        role: Some("authenticated".to_string()),
        user_metadata: Default::default(),
    };
    marketplace.auth().set_session(Session::new(
        "test_access_token".to_string(),
        "test_refresh_token".to_string(),
        3600,
        Some(user),
    ));
}

#[tokio::test]
async fn an_accepted_bid_is_written_once_and_merged() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/bids"))
        .and(header("Authorization", "Bearer test_access_token"))
        .and(body_json(json!({
            "auction_item_id": 42,
            "bidder_id": "bidder-a",
            "bid_amount": 1000
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": 7,
            "auction_item_id": 42,
            "bidder_id": "bidder-a",
            "bid_amount": 1000,
            "created_at": "2026-08-01T12:00:05Z"
        }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let marketplace = Lotwise::new(&mock_server.uri(), "test_anon_key");
    signed_in(&marketplace, "bidder-a");
    let store = marketplace.bids().unwrap();

    let principal = Principal {
        id: "bidder-a".to_string(),
        email: None,
    };
    let mut session = BidSession::new(item(), vec![], Some(principal));
    assert_eq!(session.minimum_bid(), 1000);

    let bid = session.submit_at(1000, &store, now()).await.unwrap();

    assert_eq!(bid.id, 7);
    assert_eq!(session.current_bid(), 1000);
    assert_eq!(session.minimum_bid(), 1100);
    assert!(session.is_highest_bidder());
}

#[tokio::test]
async fn a_below_minimum_bid_never_reaches_the_network() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/bids"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let marketplace = Lotwise::new(&mock_server.uri(), "test_anon_key");
    signed_in(&marketplace, "bidder-a");
    let store = marketplace.bids().unwrap();

    let principal = Principal {
        id: "bidder-a".to_string(),
        email: None,
    };
    let mut session = BidSession::new(item(), vec![], Some(principal));

    let err = session.submit_at(900, &store, now()).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::BelowMinimum { .. })
    ));
    assert!(session.ledger().is_empty());

    // Dropping the mock server verifies the expect(0) assertion
}

#[tokio::test]
async fn a_server_rejection_surfaces_and_leaves_state_alone() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/bids"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "bid below current minimum"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let marketplace = Lotwise::new(&mock_server.uri(), "test_anon_key");
    signed_in(&marketplace, "bidder-a");
    let store = marketplace.bids().unwrap();

    let principal = Principal {
        id: "bidder-a".to_string(),
        email: None,
    };
    let mut session = BidSession::new(item(), vec![], Some(principal));

    let err = session.submit_at(1200, &store, now()).await.unwrap_err();
    assert!(matches!(err, Error::Data(_)));
    assert!(session.ledger().is_empty());
    assert!(!session.is_submitting());
}

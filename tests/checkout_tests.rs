use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lotwise_client::auth::Principal;
use lotwise_client::cart::Cart;
use lotwise_client::error::{Error, ValidationError};
use lotwise_client::model::{AuctionItem, AuctionStatus, DeclutterListing, ListingStatus, OrderStatus};
use lotwise_client::Lotwise;

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()
}

fn buyer() -> Principal {
    Principal {
        id: "buyer-1".to_string(),
        email: None,
    }
}

fn listing(id: i64, price: i64, quantity: i64) -> DeclutterListing {
    DeclutterListing {
        id,
        seller_id: "seller-1".to_string(),
        title: format!("Listing {}", id),
        description: String::new(),
        price,
        quantity_available: quantity,
        image_url: None,
        status: ListingStatus::Active,
        created_at: now(),
    }
}

fn order_row() -> serde_json::Value {
    json!({
        "id": 501,
        "buyer_id": "buyer-1",
        "total": 2200,
        "status": "pending",
        "created_at": "2026-08-01T12:00:30Z",
        "lines": [
            {"listing_id": 1, "quantity": 2, "unit_price": 500},
            {"listing_id": 2, "quantity": 1, "unit_price": 1200}
        ]
    })
}

#[tokio::test]
async fn checkout_invokes_the_order_function_with_the_cart_lines() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/functions/v1/process-order"))
        .and(header("Authorization", "Bearer buyer_access_token"))
        .and(body_json(json!({
            "buyer_id": "buyer-1",
            "lines": [
                {"listing_id": 1, "quantity": 2},
                {"listing_id": 2, "quantity": 1}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(order_row()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let marketplace = Lotwise::new(&mock_server.uri(), "test_anon_key");

    let mut cart = Cart::new();
    cart.add(&listing(1, 500, 10), 2).unwrap();
    cart.add(&listing(2, 1200, 5), 1).unwrap();

    let order = marketplace
        .checkout()
        .place_order(&cart, &buyer(), "buyer_access_token")
        .await
        .unwrap();

    assert_eq!(order.id, 501);
    assert_eq!(order.total, 2200);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.lines.len(), 2);
}

#[tokio::test]
async fn an_empty_cart_never_reaches_the_network() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/functions/v1/process-order"))
        .respond_with(ResponseTemplate::new(200).set_body_json(order_row()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let marketplace = Lotwise::new(&mock_server.uri(), "test_anon_key");

    let err = marketplace
        .checkout()
        .place_order(&Cart::new(), &buyer(), "buyer_access_token")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Validation(ValidationError::EmptyCart)
    ));
}

#[tokio::test]
async fn buy_now_settles_through_the_order_function() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/functions/v1/process-order"))
        .and(body_json(json!({
            "auction_item_id": 42,
            "buyer_id": "buyer-1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 502,
            "buyer_id": "buyer-1",
            "total": 5000,
            "status": "paid",
            "created_at": "2026-08-01T12:01:00Z"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let marketplace = Lotwise::new(&mock_server.uri(), "test_anon_key");

    let item = AuctionItem {
        id: 42,
        seller_id: "seller-1".to_string(),
        title: "Turntable".to_string(),
        description: String::new(),
        starting_bid: 1000,
        bid_increment: Some(100),
        reserve_price: None,
        buy_now_price: Some(5000),
        image_url: None,
        start_date: None,
        end_date: now() + Duration::days(2),
        status: AuctionStatus::Active,
        created_at: now(),
    };

    let order = marketplace
        .checkout()
        .buy_now(&item, &buyer(), "buyer_access_token", now())
        .await
        .unwrap();

    assert_eq!(order.id, 502);
    assert_eq!(order.status, OrderStatus::Paid);
}

#[tokio::test]
async fn buy_now_on_an_ended_auction_is_rejected_locally() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/functions/v1/process-order"))
        .respond_with(ResponseTemplate::new(200).set_body_json(order_row()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let marketplace = Lotwise::new(&mock_server.uri(), "test_anon_key");

    let item = AuctionItem {
        id: 42,
        seller_id: "seller-1".to_string(),
        title: "Turntable".to_string(),
        description: String::new(),
        starting_bid: 1000,
        bid_increment: Some(100),
        reserve_price: None,
        buy_now_price: Some(5000),
        image_url: None,
        start_date: None,
        end_date: now() - Duration::hours(1),
        status: AuctionStatus::Ended,
        created_at: now() - Duration::days(3),
    };

    let err = marketplace
        .checkout()
        .buy_now(&item, &buyer(), "buyer_access_token", now())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Validation(ValidationError::AuctionEnded)
    ));
}

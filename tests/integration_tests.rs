use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use cinema_booking::config::AppConfig;
use cinema_booking::db;
use cinema_booking::db::seed::{self, DemoCatalog};
use cinema_booking::handlers;
use cinema_booking::state::AppState;

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        booking_grace_hours: 24,
        pending_booking_ttl_minutes: 15,
        expiry_sweep_interval_secs: 0,
        order_code_attempts: 5,
        seed_demo_data: false,
    }
}

fn test_state() -> (Arc<AppState>, DemoCatalog) {
    let conn = db::init_db(":memory:").unwrap();
    let demo = seed::seed_demo(&conn).unwrap();
    (Arc::new(AppState::new(conn, test_config())), demo)
}

fn test_app(state: Arc<AppState>) -> Router {
    handlers::router(state)
}

async fn send(state: &Arc<AppState>, req: Request<Body>) -> (StatusCode, Value) {
    let res = test_app(state.clone()).oneshot(req).await.unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn with_json(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn booking_body(demo: &DemoCatalog, seats: &[&str]) -> Value {
    let seat_ids: Vec<String> = demo
        .seat_ids(seats)
        .iter()
        .map(|id| id.to_string())
        .collect();
    json!({ "schedule_id": demo.schedule.id, "seat_ids": seat_ids })
}

async fn book(state: &Arc<AppState>, demo: &DemoCatalog, token: &str, seats: &[&str]) -> Value {
    let (status, json) = send(
        state,
        with_json("POST", "/api/booking", Some(token), booking_body(demo, seats)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json
}

fn pay_body(booking: &Value, demo: &DemoCatalog, amount: Value) -> Value {
    json!({
        "booking_id": booking["id"],
        "payment_method_id": demo.payment_method.id,
        "amount": amount,
        "transaction_id": "TXN-42",
    })
}

async fn admin_cancel(state: &Arc<AppState>, demo: &DemoCatalog, booking: &Value) -> (StatusCode, Value) {
    let uri = format!("/api/admin/bookings/{}/cancel", booking["id"].as_str().unwrap());
    let req = Request::builder()
        .method("PUT")
        .uri(uri)
        .header("Authorization", format!("Bearer {}", demo.admin.token))
        .body(Body::empty())
        .unwrap();
    send(state, req).await
}

// ── Public Endpoints ──

#[tokio::test]
async fn test_health() {
    let (state, _) = test_state();

    let (status, json) = send(&state, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_payment_methods_lists_active_only() {
    let (state, _) = test_state();

    let (status, json) = send(&state, get("/api/payment-methods", None)).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Bank Transfer", "Credit Card", "E-Wallet"]);
}

#[tokio::test]
async fn test_schedule_seats_reflect_bookings() {
    let (state, demo) = test_state();
    let uri = format!("/api/schedules/{}/seats", demo.schedule.id);

    let (status, json) = send(&state, get(&uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    let seats = json["seats"].as_array().unwrap();
    assert_eq!(seats.len(), 10);
    assert!(seats.iter().all(|s| s["is_available"] == true));

    book(&state, &demo, &demo.customer.token, &["A1"]).await;

    let (_, json) = send(&state, get(&uri, None)).await;
    let seats = json["seats"].as_array().unwrap();
    assert_eq!(seats[0]["seat_number"], "A1");
    assert_eq!(seats[0]["is_available"], false);
    assert_eq!(seats[0]["in_service"], true);
    assert_eq!(seats[1]["is_available"], true);
}

#[tokio::test]
async fn test_schedule_seats_bad_ids() {
    let (state, _) = test_state();

    let (status, json) = send(&state, get("/api/schedules/nope/seats", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "validation");

    let uri = format!("/api/schedules/{}/seats", uuid::Uuid::new_v4());
    let (status, json) = send(&state, get(&uri, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["kind"], "not_found");
}

// ── Auth ──

#[tokio::test]
async fn test_booking_requires_session() {
    let (state, demo) = test_state();

    let (status, json) = send(
        &state,
        with_json("POST", "/api/booking", None, booking_body(&demo, &["A1"])),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["kind"], "unauthenticated");

    let (status, _) = send(
        &state,
        with_json(
            "POST",
            "/api/booking",
            Some("wrong-token"),
            booking_body(&demo, &["A1"]),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&state, get("/api/user/bookings", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_reject_customers() {
    let (state, demo) = test_state();
    let booking = book(&state, &demo, &demo.customer.token, &["A1"]).await;
    let uri = format!("/api/admin/bookings/{}", booking["id"].as_str().unwrap());

    let (status, json) = send(&state, get(&uri, Some(&demo.customer.token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["kind"], "unauthorized");

    let (status, _) = send(&state, get(&uri, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &state,
        with_json(
            "POST",
            "/api/admin/bookings/expire",
            Some(&demo.customer.token),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ── Booking ──

#[tokio::test]
async fn test_create_booking_three_seats() {
    let (state, demo) = test_state();

    let json = book(&state, &demo, &demo.customer.token, &["A1", "A2", "A3"]).await;

    assert_eq!(json["status"], "pending");
    assert_eq!(json["total_seats"], 3);
    assert_eq!(json["total_price"], "150000");
    assert_eq!(json["seat_numbers"], json!(["A1", "A2", "A3"]));
    assert_eq!(json["movie_title"], "The Long Night");
    assert_eq!(json["cinema_name"], "Grand Cinema");
    assert_eq!(json["hall_number"], 1);
    assert_eq!(json["show_time"], "19:30");
    assert_eq!(json["user_id"], json!(demo.customer.user.id));
    assert!(json["order_id"].as_str().unwrap().starts_with("BOOK-"));
    assert!(json.get("payment").is_none());
}

#[tokio::test]
async fn test_double_booking_conflicts() {
    let (state, demo) = test_state();
    book(&state, &demo, &demo.customer.token, &["A1"]).await;

    let (status, json) = send(
        &state,
        with_json(
            "POST",
            "/api/booking",
            Some(&demo.other_customer.token),
            booking_body(&demo, &["A1"]),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["kind"], "conflict");
    assert_eq!(json["error"], "seat A1 is already booked");
}

#[tokio::test]
async fn test_create_booking_validation() {
    let (state, demo) = test_state();
    let token = Some(demo.customer.token.as_str());

    let (status, json) = send(
        &state,
        with_json(
            "POST",
            "/api/booking",
            token,
            json!({ "schedule_id": demo.schedule.id, "seat_ids": [] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "validation");

    let (status, _) = send(
        &state,
        with_json("POST", "/api/booking", token, json!({ "seat_ids": "A1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &state,
        with_json(
            "POST",
            "/api/booking",
            token,
            json!({ "schedule_id": demo.schedule.id, "seat_ids": [demo.foreign_seat.id] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_user_bookings_are_paginated_and_private() {
    let (state, demo) = test_state();
    for seat in ["A1", "A2", "A3"] {
        book(&state, &demo, &demo.customer.token, &[seat]).await;
    }
    book(&state, &demo, &demo.other_customer.token, &["B1"]).await;

    let (status, json) = send(
        &state,
        get(
            "/api/user/bookings?page=1&per_page=2",
            Some(&demo.customer.token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
    assert_eq!(json["data"][0]["seat_numbers"], json!(["A3"]));
    assert_eq!(json["pagination"]["total"], 3);
    assert_eq!(json["pagination"]["page"], 1);
    assert_eq!(json["pagination"]["per_page"], 2);
    assert_eq!(json["pagination"]["total_pages"], 2);

    let (_, json) = send(
        &state,
        get("/api/user/bookings", Some(&demo.other_customer.token)),
    )
    .await;
    assert_eq!(json["pagination"]["total"], 1);
    assert_eq!(json["pagination"]["per_page"], 10);
    assert_eq!(json["data"][0]["seat_numbers"], json!(["B1"]));
}

#[tokio::test]
async fn test_user_bookings_bad_query() {
    let (state, demo) = test_state();
    book(&state, &demo, &demo.customer.token, &["A1"]).await;

    let (status, json) = send(
        &state,
        get("/api/user/bookings?page=abc", Some(&demo.customer.token)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "validation");
    assert!(json["error"].as_str().unwrap().contains("query string"));

    let (status, json) = send(
        &state,
        get(
            "/api/user/bookings?page=9223372036854775807",
            Some(&demo.customer.token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 0);
    assert_eq!(json["pagination"]["total"], 1);
}

// ── Payment ──

#[tokio::test]
async fn test_pay_confirms_booking() {
    let (state, demo) = test_state();
    let booking = book(&state, &demo, &demo.customer.token, &["A1", "A2", "A3"]).await;

    let (status, json) = send(
        &state,
        with_json(
            "POST",
            "/api/pay",
            Some(&demo.customer.token),
            pay_body(&booking, &demo, json!(150000)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["status"], "completed");
    assert_eq!(json["amount"], "150000");
    assert_eq!(json["transaction_id"], "TXN-42");
    assert_eq!(json["payment_method"]["name"], "Credit Card");

    let (_, json) = send(
        &state,
        get("/api/user/bookings", Some(&demo.customer.token)),
    )
    .await;
    assert_eq!(json["data"][0]["status"], "confirmed");
    assert_eq!(json["data"][0]["payment"]["status"], "completed");
}

#[tokio::test]
async fn test_pay_wrong_amount_is_rejected() {
    let (state, demo) = test_state();
    let booking = book(&state, &demo, &demo.customer.token, &["A1", "A2", "A3"]).await;

    let (status, json) = send(
        &state,
        with_json(
            "POST",
            "/api/pay",
            Some(&demo.customer.token),
            pay_body(&booking, &demo, json!("149999.99")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "validation");

    let (_, json) = send(
        &state,
        get("/api/user/bookings", Some(&demo.customer.token)),
    )
    .await;
    assert_eq!(json["data"][0]["status"], "pending");
    assert!(json["data"][0].get("payment").is_none());
}

#[tokio::test]
async fn test_pay_someone_elses_booking() {
    let (state, demo) = test_state();
    let booking = book(&state, &demo, &demo.customer.token, &["A1"]).await;

    let (status, _) = send(
        &state,
        with_json(
            "POST",
            "/api/pay",
            Some(&demo.other_customer.token),
            pay_body(&booking, &demo, json!(50000)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_pay_cancelled_booking() {
    let (state, demo) = test_state();
    let booking = book(&state, &demo, &demo.customer.token, &["A1"]).await;

    let (status, _) = admin_cancel(&state, &demo, &booking).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(
        &state,
        with_json(
            "POST",
            "/api/pay",
            Some(&demo.customer.token),
            pay_body(&booking, &demo, json!(50000)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["kind"], "invalid_state");
}

// ── Admin ──

#[tokio::test]
async fn test_admin_booking_detail() {
    let (state, demo) = test_state();
    let booking = book(&state, &demo, &demo.customer.token, &["B1", "B2"]).await;
    let uri = format!("/api/admin/bookings/{}", booking["id"].as_str().unwrap());

    let (status, json) = send(&state, get(&uri, Some(&demo.admin.token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["order_id"], booking["order_id"]);
    assert_eq!(json["total_price"], "100000");
    assert_eq!(json["seat_numbers"], json!(["B1", "B2"]));
    assert_eq!(json["schedule_details"]["price"], "50000");
    assert_eq!(json["schedule_details"]["movie_title"], "The Long Night");

    let uri = format!("/api/admin/bookings/{}", uuid::Uuid::new_v4());
    let (status, _) = send(&state, get(&uri, Some(&demo.admin.token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_frees_seat_and_is_not_repeatable() {
    let (state, demo) = test_state();
    let booking = book(&state, &demo, &demo.customer.token, &["A1"]).await;

    let (status, json) = admin_cancel(&state, &demo, &booking).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "cancelled");

    let (status, json) = admin_cancel(&state, &demo, &booking).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["kind"], "invalid_state");

    // A1 is bookable again.
    book(&state, &demo, &demo.other_customer.token, &["A1"]).await;
}

#[tokio::test]
async fn test_admin_expire_sweep() {
    let (state, demo) = test_state();
    let stale = book(&state, &demo, &demo.customer.token, &["A1"]).await;
    book(&state, &demo, &demo.customer.token, &["A2"]).await;

    {
        let conn = state.conn().unwrap();
        conn.execute(
            "UPDATE bookings SET created_at = datetime('now', '-1 hour') WHERE id = ?1",
            [stale["id"].as_str().unwrap()],
        )
        .unwrap();
    }

    let (status, json) = send(
        &state,
        with_json(
            "POST",
            "/api/admin/bookings/expire",
            Some(&demo.admin.token),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["expired"], 1);

    let uri = format!("/api/admin/bookings/{}", stale["id"].as_str().unwrap());
    let (_, json) = send(&state, get(&uri, Some(&demo.admin.token))).await;
    assert_eq!(json["status"], "expired");

    // The expired booking's seat is free again.
    book(&state, &demo, &demo.other_customer.token, &["A1"]).await;
}

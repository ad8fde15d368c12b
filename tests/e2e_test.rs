use axum::body::{Body, BodyDataStream};
use axum::http::{Request, StatusCode};
use barbershop_booking::api::{AppState, create_router};
use futures::StreamExt;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

mod common;

// ============================================================================
// E2Eテスト用のヘルパー関数
// ============================================================================

/// インメモリの依存を使うルーター。時計は店舗時刻で2024-01-15（月）08:00
async fn setup_app() -> (axum::Router, common::TestHarness) {
    let harness = common::harness_at(common::local(2024, 1, 15, 8, 0)).await;
    let app_state = Arc::new(AppState {
        service_deps: harness.deps.clone(),
    });
    (create_router(app_state), harness)
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn booking_request(time: &str) -> Value {
    json!({
        "barberId": 2,
        "date": "2024-01-15",
        "time": time,
        "serviceId": 1,
        "productIds": [2],
        "customerId": 3,
        "note": "Degradado bajo"
    })
}

// ============================================================================
// E2Eテスト: 正常系と異常系のフロー
// ============================================================================

#[tokio::test]
async fn test_e2e_health() {
    let (app, _) = setup_app().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_e2e_booking_flow() {
    let (app, _) = setup_app().await;

    // Step 1: 10:00を予約
    let (status, created) = send(&app, "POST", "/appointments", Some(booking_request("10:00"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], 1);
    assert_eq!(created["status"], "pending");
    assert_eq!(created["time"], "10:00");
    assert_eq!(created["serviceName"], "Corte de Cabello");
    assert_eq!(created["note"], "Degradado bajo");
    assert_eq!(created["quote"]["total"], 27000);
    assert!(created["calendarReference"].is_string());

    // Step 2: 同じ枠を再予約
    let (status, conflict) =
        send(&app, "POST", "/appointments", Some(booking_request("10:00"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(conflict["error"], "SLOT_UNAVAILABLE");
    assert_eq!(conflict["slot"]["barberId"], 2);
    assert_eq!(conflict["slot"]["time"], "10:00");

    // Step 3: グリッド上で予約済みになる
    let (status, grid) = send(&app, "GET", "/availability?barberId=2&weekStart=2024-01-15", None).await;
    assert_eq!(status, StatusCode::OK);
    let slots = grid.as_array().unwrap();
    assert_eq!(slots.len(), 77);
    assert_eq!(slots[1]["time"], "10:00");
    assert_eq!(slots[1]["status"], "booked");
    assert_eq!(slots[1]["appointmentId"], 1);
    assert_eq!(slots[0]["status"], "free");

    // Step 4: 確定、キャンセル、再キャンセル
    let (status, confirmed) = send(
        &app,
        "POST",
        "/appointments/1/status",
        Some(json!({ "status": "confirmed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["status"], "confirmed");

    for _ in 0..2 {
        let (status, cancelled) = send(&app, "POST", "/appointments/1/cancel", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cancelled["status"], "cancelled");
    }

    // Step 5: 一覧
    let (status, listed) = send(&app, "GET", "/appointments?customerId=3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, fetched) = send(&app, "GET", "/appointments/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["products"][0]["name"], "Aceite para Barba");
}

#[tokio::test]
async fn test_e2e_block_flow() {
    let (app, _) = setup_app().await;
    let slot = json!({ "barberId": 2, "date": "2024-01-16", "time": "12:00" });

    let mut block = slot.clone();
    block["reason"] = json!("Almuerzo");
    let (status, created) = send(&app, "POST", "/blocks", Some(block.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["reason"], "Almuerzo");

    let (status, duplicate) = send(&app, "POST", "/blocks", Some(block)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(duplicate["error"], "ALREADY_BLOCKED");

    let (status, listed) = send(&app, "GET", "/blocks?barberId=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "DELETE", "/blocks", Some(slot.clone())).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, missing) = send(&app, "DELETE", "/blocks", Some(slot)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["error"], "SLOT_NOT_BLOCKED");
}

#[tokio::test]
async fn test_e2e_unblock_elapsed_slot() {
    let (app, harness) = setup_app().await;
    let slot = json!({ "barberId": 2, "date": "2024-01-15", "time": "09:00" });

    let (status, _) = send(&app, "POST", "/blocks", Some(slot.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    harness.clock.set(common::local(2024, 1, 15, 9, 30));

    let (status, body) = send(&app, "DELETE", "/blocks", Some(slot)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "SLOT_IN_PAST");
}

#[tokio::test]
async fn test_e2e_promotions_and_quote() {
    let (app, _) = setup_app().await;

    let (status, base) = send(
        &app,
        "POST",
        "/promotions",
        Some(json!({
            "serviceId": 1,
            "discountPercentage": 20,
            "startsAt": "2024-01-01T00:00:00Z",
            "endsAt": "2024-01-31T23:59:59Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(base["active"], true);

    let (status, applicable) =
        send(&app, "GET", "/promotions/applicable?serviceId=1&productIds=", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(applicable["id"], base["id"]);

    let (status, none) = send(&app, "GET", "/promotions/applicable?serviceId=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(none.is_null());

    let (status, quote) = send(&app, "GET", "/pricing/quote?serviceId=1&productIds=1,3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["subtotal"], 33000);
    assert_eq!(quote["discount"], 3000);
    assert_eq!(quote["total"], 30000);

    let (status, bad) = send(&app, "GET", "/pricing/quote?serviceId=1&productIds=1,x", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(bad["error"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_e2e_error_mapping() {
    let (app, _) = setup_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/promotions",
        Some(json!({
            "serviceId": 1,
            "discountPercentage": 20,
            "startsAt": "2024-02-01T00:00:00Z",
            "endsAt": "2024-01-01T00:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "INVALID_RANGE");

    let (status, body) = send(&app, "GET", "/promotions/9", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");

    let (status, _) = send(&app, "POST", "/appointments/9/cancel", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/availability?barberId=2&weekStart=2024-01-08", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/appointments", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_e2e_malformed_input_uses_error_body() {
    let (app, _) = setup_app().await;

    let (status, body) =
        send(&app, "POST", "/appointments", Some(booking_request("11:30"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");
    assert!(body["message"].as_str().unwrap().contains("on the hour"));

    let mut missing_date = booking_request("11:00");
    missing_date.as_object_mut().unwrap().remove("date");
    let (status, body) = send(&app, "POST", "/appointments", Some(missing_date)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");

    let (status, body) = send(&app, "GET", "/appointments/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");

    let (status, body) = send(&app, "GET", "/availability?barberId=two", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");

    // 途中で予約は作成されていない
    let (_, listed) = send(&app, "GET", "/appointments?barberId=2", None).await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_e2e_promotion_update_and_delete() {
    let (app, _) = setup_app().await;

    let (status, created) = send(
        &app,
        "POST",
        "/promotions",
        Some(json!({
            "serviceId": 1,
            "discountPercentage": 20,
            "startsAt": "2024-01-01T00:00:00Z",
            "endsAt": "2024-01-31T23:59:59Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/promotions/{}", created["id"]);

    let (status, updated) = send(&app, "PATCH", &uri, Some(json!({ "active": false }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["active"], false);
    assert_eq!(updated["discountPercentage"], 20);

    let (_, quote) = send(&app, "GET", "/pricing/quote?serviceId=1", None).await;
    assert_eq!(quote["discount"], 0);

    let (status, body) = send(
        &app,
        "PATCH",
        &uri,
        Some(json!({ "endsAt": "2023-12-01T00:00:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "INVALID_RANGE");

    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

// ============================================================================
// 変更イベント
// ============================================================================

/// 次のSSEフレームの終わりまで読む。
async fn next_frame(stream: &mut BodyDataStream) -> String {
    let mut buffer = String::new();
    while !buffer.contains("\n\n") {
        let chunk = tokio::time::timeout(Duration::from_secs(2), stream.next())
            .await
            .expect("no event within 2s")
            .expect("event stream ended")
            .unwrap();
        buffer.push_str(std::str::from_utf8(&chunk).unwrap());
    }
    buffer
}

fn frame_field<'a>(frame: &'a str, name: &str) -> &'a str {
    frame
        .lines()
        .find_map(|line| line.strip_prefix(name)?.strip_prefix(':'))
        .map(str::trim)
        .expect("missing frame field")
}

#[tokio::test]
async fn test_e2e_events_are_filtered_by_barber() {
    let (app, _) = setup_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/events?barberId=2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );
    let mut stream = response.into_body().into_data_stream();

    let other_barber = json!({ "barberId": 4, "date": "2024-01-16", "time": "12:00" });
    let (status, _) = send(&app, "POST", "/blocks", Some(other_barber)).await;
    assert_eq!(status, StatusCode::CREATED);

    let own = json!({ "barberId": 2, "date": "2024-01-16", "time": "13:00", "reason": "Almuerzo" });
    let (status, block) = send(&app, "POST", "/blocks", Some(own)).await;
    assert_eq!(status, StatusCode::CREATED);

    let frame = next_frame(&mut stream).await;
    assert_eq!(frame_field(&frame, "event"), "SlotBlocked");
    let data: Value = serde_json::from_str(frame_field(&frame, "data")).unwrap();
    assert_eq!(data["type"], "SlotBlocked");
    assert_eq!(data["blockId"], block["id"]);
    assert_eq!(data["key"]["barberId"], 2);
    assert_eq!(data["key"]["time"], "13:00");
    assert_eq!(data["reason"], "Almuerzo");
}

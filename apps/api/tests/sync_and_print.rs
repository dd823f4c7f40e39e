mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{order, spawn_app, spawn_app_with_dead_printer};

#[tokio::test]
async fn offline_orders_are_synced_once() {
    let app = spawn_app().await;
    let admin = app.bootstrap_admin().await;
    let product = app.create_product(&admin, "ACE-1L", 10).await;
    let client = app.create_client(&admin).await;

    let mut first = order(&client, &product, 2);
    first["offlineId"] = json!("tablet-7-000001");
    let mut unnamed = order(&client, &product, 1);
    unnamed["offlineId"] = json!("  ");
    let mut oversold = order(&client, &product, 99);
    oversold["offlineId"] = json!("tablet-7-000002");
    let mut second = order(&client, &product, 1);
    second["offlineId"] = json!("tablet-7-000003");

    let response = app
        .post(
            "/api/orders/sync",
            &admin,
            json!({ "orders": [first.clone(), unnamed, oversold, first.clone(), second] }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.json());

    let body = response.json();
    let results = body["results"].as_array().expect("results");
    assert_eq!(results.len(), 5);

    assert_eq!(results[0]["status"], "CREATED");
    assert_eq!(results[0]["invoice"]["number"], "FA-0001");
    assert_eq!(results[1]["status"], "FAILED");
    assert!(results[1]["error"].is_string());
    assert_eq!(results[2]["status"], "FAILED");
    assert_eq!(results[2]["offlineId"], "tablet-7-000002");
    assert_eq!(results[3]["status"], "DUPLICATE");
    assert_eq!(results[3]["invoice"]["id"], results[0]["invoice"]["id"]);
    assert_eq!(results[4]["status"], "CREATED");
    assert_eq!(results[4]["invoice"]["number"], "FA-0002");

    // Replaying the whole batch later changes nothing.
    let replay = app
        .post("/api/orders/sync", &admin, json!({ "orders": [first] }))
        .await;
    assert_eq!(replay.json()["results"][0]["status"], "DUPLICATE");
    assert_eq!(app.stock_of(&admin, &product).await, 7);
}

#[tokio::test]
async fn posting_a_synced_order_again_returns_the_original() {
    let app = spawn_app().await;
    let admin = app.bootstrap_admin().await;
    let product = app.create_product(&admin, "ACE-1L", 10).await;
    let client = app.create_client(&admin).await;

    let mut body = order(&client, &product, 1);
    body["offlineId"] = json!("caja-2-000042");

    let created = app.post("/api/orders", &admin, body.clone()).await;
    assert_eq!(created.status, StatusCode::CREATED);

    let retried = app.post("/api/orders", &admin, body).await;
    assert_eq!(retried.status, StatusCode::OK);
    assert_eq!(retried.json()["duplicate"], true);
    assert!(retried.json()["print"].is_null());
    assert_eq!(retried.json()["invoice"]["id"], created.json()["invoice"]["id"]);
}

#[tokio::test]
async fn unreachable_print_helper_leaves_pending_ticket() {
    let app = spawn_app_with_dead_printer().await;
    let admin = app.bootstrap_admin().await;
    let product = app.create_product(&admin, "ACE-1L", 10).await;
    let client = app.create_client(&admin).await;

    let created = app.post("/api/orders", &admin, order(&client, &product, 1)).await;

    // The sale stands even though nothing printed.
    assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.json());
    let print = &created.json()["print"];
    assert_eq!(print["status"], "PENDING");
    let ticket_id = print["ticketId"].as_str().expect("ticket id").to_string();

    let pending = app.get("/api/print/pending", &admin).await;
    let tickets = pending.json();
    let tickets = tickets.as_array().expect("tickets");
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0]["id"], ticket_id.as_str());
    assert_eq!(tickets[0]["invoiceId"], created.json()["invoice"]["id"]);

    let done = app
        .post(&format!("/api/print/pending/{}/done", ticket_id), &admin, json!({}))
        .await;
    assert_eq!(done.status, StatusCode::OK);
    assert_eq!(done.json()["status"], "IMPRESO");

    let after = app.get("/api/print/pending", &admin).await;
    assert_eq!(after.json().as_array().map(Vec::len), Some(0));

    let twice = app
        .post(&format!("/api/print/pending/{}/done", ticket_id), &admin, json!({}))
        .await;
    assert_eq!(twice.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cash_closure_totals_payments_since_last_close() {
    let app = spawn_app().await;
    let admin = app.bootstrap_admin().await;
    let product = app.create_product(&admin, "ACE-1L", 10).await;
    let client = app.create_client(&admin).await;

    let mut body = order(&client, &product, 1);
    body["payments"] = json!([
        { "method": "EFECTIVO", "amountCents": 5_000 },
        { "method": "TARJETA_DEBITO", "amountCents": 7_100 },
    ]);
    assert_eq!(app.post("/api/orders", &admin, body).await.status, StatusCode::CREATED);

    let preview = app.get("/api/cash-closures/preview", &admin).await;
    assert_eq!(preview.status, StatusCode::OK, "{:?}", preview.json());
    assert_eq!(preview.json()["summary"]["cashCents"], 5_000);
    assert_eq!(preview.json()["summary"]["debitCents"], 7_100);

    let closed = app
        .post("/api/cash-closures", &admin, json!({ "countedCashCents": 4_900 }))
        .await;
    assert_eq!(closed.status, StatusCode::CREATED, "{:?}", closed.json());
    assert_eq!(closed.json()["totalCents"], 12_100);
    assert_eq!(closed.json()["differenceCents"], -100);

    let next = app.get("/api/cash-closures/preview", &admin).await;
    assert_eq!(next.json()["summary"]["totalCents"], 0);
}

//! API integration tests
//!
//! These run against a live server with the seed data from the migrations
//! applied (item 1 available, users 1 and 2 present). Start the server,
//! then: cargo test -- --ignored

use chrono::{Duration, Utc};
use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Check out item 1 to user 1 and return the created transaction
async fn checkout_item(client: &Client, item_id: i32, user_id: i32) -> Value {
    let due_date = Utc::now() + Duration::days(14);
    let response = client
        .post(format!("{}/transactions", BASE_URL))
        .json(&json!({
            "item_id": item_id,
            "user_id": user_id,
            "due_date": due_date.to_rfc3339(),
        }))
        .send()
        .await
        .expect("Failed to send checkout request");

    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse checkout response")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_list_items() {
    let client = Client::new();

    let response = client
        .get(format!("{}/items", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.is_array());
}

#[tokio::test]
#[ignore]
async fn test_get_missing_item() {
    let client = Client::new();

    let response = client
        .get(format!("{}/items/999999", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
#[ignore]
async fn test_checkout_and_return_flow() {
    let client = Client::new();

    let transaction = checkout_item(&client, 1, 1).await;
    let id = transaction["id"].as_i64().expect("No transaction id");
    assert_eq!(transaction["status"], "active");

    // A second checkout of the same item must conflict
    let due_date = Utc::now() + Duration::days(7);
    let response = client
        .post(format!("{}/transactions", BASE_URL))
        .json(&json!({
            "item_id": 1,
            "user_id": 2,
            "due_date": due_date.to_rfc3339(),
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "invalid_state");

    // No fee is due on an active, not-yet-overdue loan
    let response = client
        .get(format!("{}/transactions/{}/late-fee", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let preview: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(preview["days_overdue"], 0);

    // Return in good condition frees the item
    let response = client
        .post(format!("{}/transactions/{}/return", BASE_URL, id))
        .json(&json!({ "condition": "good" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let returned: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(returned["status"], "returned");
    assert!(returned["return_date"].is_string());
}

#[tokio::test]
#[ignore]
async fn test_checkout_with_past_due_date() {
    let client = Client::new();

    let due_date = Utc::now() - Duration::days(1);
    let response = client
        .post(format!("{}/transactions", BASE_URL))
        .json(&json!({
            "item_id": 1,
            "user_id": 1,
            "due_date": due_date.to_rfc3339(),
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "invalid_state");
}

#[tokio::test]
#[ignore]
async fn test_return_with_invalid_condition() {
    let client = Client::new();

    let transaction = checkout_item(&client, 2, 1).await;
    let id = transaction["id"].as_i64().expect("No transaction id");

    let response = client
        .post(format!("{}/transactions/{}/return", BASE_URL, id))
        .json(&json!({ "condition": "pristine" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "validation_error");

    // Clean up so the item is free for other tests
    let response = client
        .post(format!("{}/transactions/{}/cancel", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_cancel_already_returned_transaction() {
    let client = Client::new();

    let transaction = checkout_item(&client, 3, 1).await;
    let id = transaction["id"].as_i64().expect("No transaction id");

    let response = client
        .post(format!("{}/transactions/{}/return", BASE_URL, id))
        .json(&json!({ "condition": "excellent" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/transactions/{}/cancel", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "invalid_state");
}

#[tokio::test]
#[ignore]
async fn test_extend_due_date() {
    let client = Client::new();

    let transaction = checkout_item(&client, 4, 1).await;
    let id = transaction["id"].as_i64().expect("No transaction id");

    // Extending backwards is rejected
    let response = client
        .post(format!("{}/transactions/{}/extend", BASE_URL, id))
        .json(&json!({
            "new_due_date": (Utc::now() + Duration::days(1)).to_rfc3339(),
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    let response = client
        .post(format!("{}/transactions/{}/extend", BASE_URL, id))
        .json(&json!({
            "new_due_date": (Utc::now() + Duration::days(30)).to_rfc3339(),
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let extended: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(extended["status"], "active");

    client
        .post(format!("{}/transactions/{}/cancel", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send cleanup request");
}

#[tokio::test]
#[ignore]
async fn test_overdue_list() {
    let client = Client::new();

    let response = client
        .get(format!("{}/transactions/overdue", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.is_array());
}

#[tokio::test]
#[ignore]
async fn test_checkout_blocked_by_borrowers_overdue_loan() {
    let client = Client::new();

    // The seed data ships a loan past its due date for user 3; the sweep
    // flips it to overdue.
    let response = client
        .post(format!("{}/jobs/overdue-sweep", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let due_date = Utc::now() + Duration::days(7);
    let response = client
        .post(format!("{}/transactions", BASE_URL))
        .json(&json!({
            "item_id": 7,
            "user_id": 3,
            "due_date": due_date.to_rfc3339(),
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "policy_violation");
    assert!(body["message"]
        .as_str()
        .expect("No message in response")
        .contains("overdue item"));
}

#[tokio::test]
#[ignore]
async fn test_overdue_sweep_second_run_updates_nothing() {
    let client = Client::new();

    let response = client
        .post(format!("{}/jobs/overdue-sweep", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // With no time passing, every past-due loan is already overdue; the
    // second run must not count any transition again.
    let response = client
        .post(format!("{}/jobs/overdue-sweep", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["transactions_updated"], 0);
}

#[tokio::test]
#[ignore]
async fn test_overdue_sweep_trigger() {
    let client = Client::new();

    let response = client
        .post(format!("{}/jobs/overdue-sweep", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["transactions_updated"].is_number());
    assert!(body["notifications_sent"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_maintenance_lifecycle() {
    let client = Client::new();

    let response = client
        .post(format!("{}/maintenance", BASE_URL))
        .json(&json!({
            "item_id": 5,
            "priority": "high",
            "description": "Screen flickers under load",
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let request: Value = response.json().await.expect("Failed to parse response");
    let id = request["id"].as_i64().expect("No request id");
    assert_eq!(request["status"], "pending");
    assert_eq!(request["sla_hours"], 4);
    assert!(request["sla_due_date"].is_string());
    assert!(request["resolution_target"].is_string());

    // SLA countdown is exposed while the request is open
    let response = client
        .get(format!("{}/maintenance/{}/sla", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let sla: Value = response.json().await.expect("Failed to parse response");
    assert!(sla["time_remaining"]["formatted"].is_string());

    // Assign records the first response
    let response = client
        .post(format!("{}/maintenance/{}/assign", BASE_URL, id))
        .json(&json!({ "assigned_to": 2 }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let assigned: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(assigned["status"], "in_progress");
    assert!(assigned["first_response_at"].is_string());

    // Complete records the resolution
    let response = client
        .post(format!("{}/maintenance/{}/complete", BASE_URL, id))
        .json(&json!({
            "resolution_notes": "Replaced the display cable",
            "cost": 25.50,
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let completed: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(completed["status"], "completed");
    assert!(completed["resolved_at"].is_string());
}

#[tokio::test]
#[ignore]
async fn test_sweep_breach_reason_survives_later_assignment() {
    let client = Client::new();

    // The seed data ships a pending request on item 7 whose first-response
    // deadline has passed; the sweep breaches it first.
    let response = client
        .post(format!("{}/jobs/sla-sweep", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/maintenance?item_id=7", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let requests: Value = response.json().await.expect("Failed to parse response");
    let request = &requests[0];
    let id = request["id"].as_i64().expect("No request id");
    assert_eq!(request["sla_breached"], true);
    assert_eq!(request["sla_breach_reason"], "First response SLA exceeded");

    // Assigning afterwards records a (late) first response, but the reason
    // the sweep wrote must not be replaced.
    let response = client
        .post(format!("{}/maintenance/{}/assign", BASE_URL, id))
        .json(&json!({ "assigned_to": 2 }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/maintenance/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    let assigned: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(assigned["sla_breached"], true);
    assert_eq!(assigned["sla_breach_reason"], "First response SLA exceeded");
    assert!(assigned["first_response_at"].is_string());
}

#[tokio::test]
#[ignore]
async fn test_maintenance_invalid_priority() {
    let client = Client::new();

    let response = client
        .post(format!("{}/maintenance", BASE_URL))
        .json(&json!({
            "item_id": 5,
            "priority": "catastrophic",
            "description": "Nothing works",
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
#[ignore]
async fn test_maintenance_statistics() {
    let client = Client::new();

    let response = client
        .get(format!("{}/maintenance/statistics", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["total_requests"].is_number());
    assert!(body["pending"].is_number());
    assert!(body["total_cost"].is_string() || body["total_cost"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_sla_statistics() {
    let client = Client::new();

    let response = client
        .get(format!("{}/maintenance/sla/statistics", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["total_requests"].is_number());
    assert!(body["compliance_rate"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_sla_sweep_trigger() {
    let client = Client::new();

    let response = client
        .post(format!("{}/jobs/sla-sweep", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["newly_breached"].is_number());
}

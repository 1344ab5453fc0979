use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use payment_service::{AppState, routes, store::memory::MemoryDatabase};

fn app() -> (Router, MemoryDatabase) {
    let db = MemoryDatabase::new();
    (routes::router(AppState::new(db.clone())), db)
}

fn contact(name: &str, street: &str, account_number: &str) -> Value {
    json!({
        "name": name,
        "address": {
            "addressLine1": street,
            "addressLine2": "3",
            "postalCode": "532032",
            "countryCode": "CY"
        },
        "account": {
            "accountNumber": account_number,
            "bic": "BCYO12312"
        }
    })
}

fn payment(amount: f64) -> Value {
    json!({
        "amount": amount,
        "paymentCurrency": "EUR",
        "originator": contact("Test One", "Test One Str", "ASD123123"),
        "beneficiary": contact("Test Two", "Test Two Str", "ASD321321"),
        "chargesBearer": "Beneficiary",
        "details": "This is a necessary payment"
    })
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|value| value.to_str().unwrap().to_string());
    let body = response.into_body().collect().await.unwrap().to_bytes();

    (status, location, body.to_vec())
}

async fn post(app: &Router, uri: &str, body: &Value) -> (StatusCode, Option<String>, Value) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, location, body) = send(app, request).await;

    (status, location, serde_json::from_slice(&body).unwrap())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    let (status, _, body) = send(app, request).await;

    (status, body)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(app, uri).await;

    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn create_payment_returns_created_with_location() {
    let (app, db) = app();

    let (status, location, body) = post(&app, "/payment", &payment(388.50)).await;

    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_i64().unwrap();
    assert_eq!(location, Some(format!("/payment/{id}")));
    assert_eq!(body["amount"], json!(388.5));
    assert_eq!(body["chargesBearer"], "Beneficiary");
    assert_eq!(body["originator"]["name"], "Test One");
    assert_eq!(body["beneficiary"]["account"]["accountNumber"], "ASD321321");
    assert_eq!(body["originatorId"], body["originator"]["id"]);
    assert_eq!(db.contact_count().await, 2);
}

#[tokio::test]
async fn created_payment_is_fetched_by_location() {
    let (app, _db) = app();

    let (_, location, created) = post(&app, "/payment", &payment(388.50)).await;
    let (status, fetched) = get_json(&app, &location.unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn invalid_payment_returns_field_errors() {
    let (app, db) = app();
    let mut body = payment(388.50);
    body["paymentCurrency"] = json!("");
    body["beneficiary"]["address"]["countryCode"] = json!("");
    body.as_object_mut().unwrap().remove("chargesBearer");

    let (status, location, errors) = post(&app, "/payment", &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(location, None);
    assert_eq!(
        errors,
        json!({
            "errors": {
                "beneficiary.address.countryCode": ["Country Code is required"],
                "chargesBearer": ["Charges Bearer is required"],
                "paymentCurrency": ["Payment Currency is required"]
            }
        })
    );
    assert_eq!(db.contact_count().await, 0);
    assert_eq!(db.payment_count().await, 0);
}

#[tokio::test]
async fn unknown_payment_is_not_found_with_empty_body() {
    let (app, _db) = app();

    let (status, body) = get(&app, "/payment/999").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_empty());
}

#[tokio::test]
async fn empty_payment_list_is_an_empty_array() {
    let (app, _db) = app();

    let (status, body) = get_json(&app, "/payment").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn max_amount_filter_returns_smaller_payments() {
    let (app, _db) = app();
    for amount in [388.50, 389.00, 391.00] {
        post(&app, "/payment", &payment(amount)).await;
    }

    let (status, body) = get_json(&app, "/payment?maxAmount=390.00").await;

    assert_eq!(status, StatusCode::OK);
    let mut amounts: Vec<f64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|payment| payment["amount"].as_f64().unwrap())
        .collect();
    amounts.sort_by(f64::total_cmp);
    assert_eq!(amounts, vec![388.5, 389.0]);
}

#[tokio::test]
async fn id_filter_selects_listed_payments() {
    let (app, _db) = app();
    let (_, _, first) = post(&app, "/payment", &payment(10.0)).await;
    post(&app, "/payment", &payment(20.0)).await;
    let (_, _, third) = post(&app, "/payment", &payment(30.0)).await;

    let uri = format!("/payment?id={},{}", first["id"], third["id"]);
    let (status, body) = get_json(&app, &uri).await;

    assert_eq!(status, StatusCode::OK);
    let mut ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|payment| payment["id"].as_i64().unwrap())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![first["id"].as_i64().unwrap(), third["id"].as_i64().unwrap()]);
}

#[tokio::test]
async fn malformed_filter_is_rejected() {
    let (app, _db) = app();

    let (status, body) = get_json(&app, "/payment?id=abc").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_filter");
}

#[tokio::test]
async fn repeated_party_reuses_contact_and_overwrites_address() {
    let (app, db) = app();
    post(&app, "/payment", &payment(388.50)).await;

    let mut second = payment(12.00);
    second["originator"]["address"]["addressLine1"] = json!("New Str");
    second["originator"]["account"]["accountNumber"] = json!("IGNORED");
    let (status, _, body) = post(&app, "/payment", &second).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(db.contact_count().await, 2);
    assert_eq!(body["originator"]["address"]["addressLine1"], "New Str");
    assert_eq!(body["originator"]["account"]["accountNumber"], "ASD123123");
}

#[tokio::test]
async fn storage_failure_returns_bad_gateway() {
    let (app, db) = app();
    db.fail_payment_inserts(true);

    let (status, _, body) = post(&app, "/payment", &payment(388.50)).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "storage_error");
    assert_eq!(body["error"]["message"], "Something went wrong with storing data");
    assert_eq!(db.contact_count().await, 0);
}

#[tokio::test]
async fn contacts_are_created_listed_and_fetched() {
    let (app, _db) = app();

    let (status, location, created) =
        post(&app, "/contact", &contact("Test Three", "Test Three Str", "ASD44444")).await;
    assert_eq!(status, StatusCode::CREATED);
    let location = location.unwrap();
    assert_eq!(location, format!("/contact/{}", created["id"]));

    let (status, fetched) = get_json(&app, &location).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, list) = get_json(&app, "/contact").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([created]));
}

#[tokio::test]
async fn contact_without_account_is_rejected() {
    let (app, _db) = app();
    let mut body = contact("Test Three", "Test Three Str", "ASD44444");
    body.as_object_mut().unwrap().remove("account");

    let (status, _, errors) = post(&app, "/contact", &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(errors, json!({ "errors": { "account": ["Account is required"] } }));
}

#[tokio::test]
async fn health_reports_connected_store() {
    let (app, _db) = app();

    let (status, body) = get_json(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn null_required_fields_are_validation_errors() {
    let (app, db) = app();
    let mut body = payment(388.50);
    body["originator"]["name"] = Value::Null;
    body["details"] = Value::Null;
    body["amount"] = Value::Null;

    let (status, _, errors) = post(&app, "/payment", &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        errors,
        json!({
            "errors": {
                "amount": ["Amount is required"],
                "details": ["Details is required"],
                "originator.name": ["Name is required"]
            }
        })
    );
    assert_eq!(db.contact_count().await, 0);
}

#[tokio::test]
async fn null_contact_name_is_a_validation_error() {
    let (app, _db) = app();
    let mut body = contact("Test Three", "Test Three Str", "ASD44444");
    body["name"] = Value::Null;

    let (status, _, errors) = post(&app, "/contact", &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(errors, json!({ "errors": { "name": ["Name is required"] } }));
}

#[tokio::test]
async fn unknown_charges_bearer_is_a_bad_request() {
    let (app, db) = app();
    let mut body = payment(388.50);
    body["chargesBearer"] = json!("Nobody");

    let (status, _, errors) = post(&app, "/payment", &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(errors["error"]["code"], "invalid_body");
    assert_eq!(db.payment_count().await, 0);
}

#[tokio::test]
async fn date_filters_bound_creation_time() {
    let (app, _db) = app();
    let (_, _, cheap) = post(&app, "/payment", &payment(388.50)).await;
    let (_, _, dear) = post(&app, "/payment", &payment(400.00)).await;

    let ids = |body: Value| {
        let mut ids: Vec<i64> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|payment| payment["id"].as_i64().unwrap())
            .collect();
        ids.sort_unstable();
        ids
    };
    let cheap_id = cheap["id"].as_i64().unwrap();
    let dear_id = dear["id"].as_i64().unwrap();

    let (status, body) = get_json(&app, "/payment?from=2000-01-01&to=2999-12-31").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(body), vec![cheap_id, dear_id]);

    let (_, body) = get_json(&app, "/payment?from=2999-01-01").await;
    assert_eq!(body, json!([]));

    let (_, body) = get_json(&app, "/payment?to=2000-01-01").await;
    assert_eq!(body, json!([]));

    let created_at = cheap["createdAt"].as_str().unwrap();
    let (_, body) = get_json(&app, &format!("/payment?from={created_at}&to={created_at}")).await;
    assert!(ids(body).contains(&cheap_id));

    let (_, body) = get_json(&app, "/payment?from=2000-01-01&maxAmount=390.00").await;
    assert_eq!(ids(body), vec![cheap_id]);
}

//! Medicine endpoint integration tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{bearer, TestApp};

async fn pharmacy_id(app: &TestApp, name: &str) -> String {
    app.create_pharmacy(json!({ "name": name })).await["_id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_create_takes_owner_from_credential() {
    let app = TestApp::new();
    let owner = pharmacy_id(&app, "Medplus").await;
    let (name, value) = bearer(&app.token_for(&owner));

    let response = app
        .server
        .post("/api/v1/medicine")
        .add_header(name, value)
        .json(&json!({
            "name": "Aspirin",
            "description": "Pain relief",
            "price": "5",
            "stock": "10",
            "pharmacy": "someone-else"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["pharmacy"], owner.as_str());
    assert_eq!(body["name"], "Aspirin");
}

#[tokio::test]
async fn test_create_validates_required_fields() {
    let app = TestApp::new();
    let (name, value) = bearer(&app.token());

    let response = app
        .server
        .post("/api/v1/medicine")
        .add_header(name, value)
        .json(&json!({ "name": "Aspirin" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let details = response.json::<Value>()["error"]["details"].clone();
    let fields: Vec<&str> = details
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["description", "price", "stock"]);
    assert_eq!(app.store.count("medicines").await, 0);
}

#[tokio::test]
async fn test_reads_populate_pharmacy() {
    let app = TestApp::new();
    let owner = pharmacy_id(&app, "Medplus").await;
    let created = app.create_medicine(&owner, "Aspirin").await;
    let id = created["_id"].as_str().unwrap();

    let response = app.server.get(&format!("/api/v1/medicine/{}", id)).await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["pharmacy"]["_id"], owner.as_str());
    assert_eq!(body["pharmacy"]["name"], "Medplus");

    let list = app.server.get("/api/v1/medicine").await.json::<Vec<Value>>();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["pharmacy"]["name"], "Medplus");
}

#[tokio::test]
async fn test_deleted_pharmacy_populates_as_null() {
    let app = TestApp::new();
    let owner = pharmacy_id(&app, "Medplus").await;
    let created = app.create_medicine(&owner, "Aspirin").await;

    let (name, value) = bearer(&app.token());
    app.server
        .delete(&format!("/api/v1/pharmacies/{}", owner))
        .add_header(name, value)
        .await
        .assert_status_ok();

    let response = app
        .server
        .get(&format!("/api/v1/medicine/{}", created["_id"].as_str().unwrap()))
        .await;
    response.assert_status_ok();
    assert!(response.json::<Value>()["pharmacy"].is_null());
}

#[tokio::test]
async fn test_get_by_name_returns_empty_list() {
    let app = TestApp::new();

    let response = app.server.get("/api/v1/medicine/name/Unknown").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Vec<Value>>().len(), 0);
}

#[tokio::test]
async fn test_get_by_pharmacy() {
    let app = TestApp::new();
    let medplus = pharmacy_id(&app, "Medplus").await;
    let apollo = pharmacy_id(&app, "Apollo").await;
    app.create_medicine(&medplus, "Aspirin").await;
    app.create_medicine(&medplus, "Ibuprofen").await;
    app.create_medicine(&apollo, "Aspirin").await;

    let response = app
        .server
        .get(&format!("/api/v1/medicine/pharmacy/{}", medplus))
        .await;
    response.assert_status_ok();
    let names: Vec<String> = response
        .json::<Vec<Value>>()
        .iter()
        .map(|m| m["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Aspirin".to_string(), "Ibuprofen".to_string()]);

    app.server
        .get("/api/v1/medicine/pharmacy/nobody")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_by_id_returns_populated_medicine() {
    let app = TestApp::new();
    let owner = pharmacy_id(&app, "Medplus").await;
    let created = app.create_medicine(&owner, "Aspirin").await;
    let (name, value) = bearer(&app.token());

    let response = app
        .server
        .put(&format!("/api/v1/medicine/{}", created["_id"].as_str().unwrap()))
        .add_header(name, value)
        .json(&json!({ "stock": "3" }))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["stock"], "3");
    assert_eq!(body["name"], "Aspirin");
    assert_eq!(body["pharmacy"]["name"], "Medplus");
}

#[tokio::test]
async fn test_update_by_name_reports_matches() {
    let app = TestApp::new();
    let medplus = pharmacy_id(&app, "Medplus").await;
    let apollo = pharmacy_id(&app, "Apollo").await;
    app.create_medicine(&medplus, "Aspirin").await;
    app.create_medicine(&apollo, "Aspirin").await;
    let (name, value) = bearer(&app.token());

    let response = app
        .server
        .put("/api/v1/medicine/name/Aspirin")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "price": "6" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["matched"], 2);

    let prices: Vec<Value> = app
        .server
        .get("/api/v1/medicine/name/Aspirin")
        .await
        .json::<Vec<Value>>()
        .iter()
        .map(|m| m["price"].clone())
        .collect();
    assert_eq!(prices, vec![json!("6"), json!("6")]);

    app.server
        .put("/api/v1/medicine/name/Unknown")
        .add_header(name, value)
        .json(&json!({ "price": "6" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_by_id_and_by_name() {
    let app = TestApp::new();
    let owner = pharmacy_id(&app, "Medplus").await;
    let single = app.create_medicine(&owner, "Aspirin").await;
    app.create_medicine(&owner, "Ibuprofen").await;
    app.create_medicine(&owner, "Ibuprofen").await;
    let (name, value) = bearer(&app.token());

    let response = app
        .server
        .delete(&format!("/api/v1/medicine/{}", single["_id"].as_str().unwrap()))
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["message"], "Medicine deleted");

    let response = app
        .server
        .delete("/api/v1/medicine/name/Ibuprofen")
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["message"], "Medicines deleted");
    assert_eq!(app.store.count("medicines").await, 0);

    app.server
        .delete("/api/v1/medicine/name/Ibuprofen")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

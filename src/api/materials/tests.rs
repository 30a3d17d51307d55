use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::test_support::{self, region_json};

#[tokio::test]
async fn regions_round_trip_in_question_order() {
    let ctx = test_support::setup_test_context().await;
    let material_id = test_support::register_material(&ctx.app, "A1", 1, 3).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/materials/{material_id}/regions"),
            Some(json!({"regions": [region_json(9, 2), region_json(2, 1), region_json(5, 1)]})),
        ))
        .await
        .expect("save regions");

    let status = response.status();
    let saved = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {saved}");
    assert_eq!(saved["revision"], 1);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/materials/{material_id}/regions"),
            None,
        ))
        .await
        .expect("get regions");

    let body = test_support::read_json(response).await;
    let numbers: Vec<u64> = body["regions"]
        .as_array()
        .expect("regions")
        .iter()
        .map(|region| region["question_number"].as_u64().expect("number"))
        .collect();
    assert_eq!(numbers, vec![2, 5, 9]);
    assert_eq!(body["regions"][2]["page_number"], 2);
    assert_eq!(body, saved);
}

#[tokio::test]
async fn invalid_geometry_is_rejected_without_partial_write() {
    let ctx = test_support::setup_test_context().await;
    let material_id = test_support::register_material(&ctx.app, "A1", 1, 2).await;
    let uri = format!("/api/v1/materials/{material_id}/regions");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &uri,
            Some(json!({"regions": [region_json(1, 1)]})),
        ))
        .await
        .expect("save regions");
    assert_eq!(response.status(), StatusCode::OK);

    let mut flat = region_json(4, 1);
    flat["height"] = json!(0.0);
    let attempts = [
        json!({"regions": [region_json(3, 1), region_json(3, 2)]}),
        json!({"regions": [region_json(2, 3)]}),
        json!({"regions": [region_json(2, 1), flat]}),
        json!({"regions": [region_json(3_000_000_000, 1)]}),
    ];
    for payload in attempts {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::PUT, &uri, Some(payload)))
            .await
            .expect("save regions");
        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
        assert_eq!(body["status"], 400);
    }

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, &uri, None))
        .await
        .expect("get regions");
    let body = test_support::read_json(response).await;
    assert_eq!(body["revision"], 1);
    assert_eq!(body["regions"].as_array().expect("regions").len(), 1);
}

#[tokio::test]
async fn unknown_material_returns_404() {
    let ctx = test_support::setup_test_context().await;

    for (method, uri, body) in [
        (Method::GET, "/api/v1/materials/missing", None),
        (Method::GET, "/api/v1/materials/missing/regions", None),
        (Method::PUT, "/api/v1/materials/missing/regions", Some(json!({"regions": []}))),
        (Method::DELETE, "/api/v1/materials/missing/regions/1", None),
        (Method::DELETE, "/api/v1/materials/missing", None),
    ] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(method.clone(), uri, body))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method} {uri}");
    }
}

#[tokio::test]
async fn remove_region_and_material_detail() {
    let ctx = test_support::setup_test_context().await;
    let material_id = test_support::register_material(&ctx.app, "B2", 4, 2).await;

    ctx.app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/materials/{material_id}/regions"),
            Some(json!({"regions": [region_json(1, 1), region_json(2, 2)]})),
        ))
        .await
        .expect("save regions");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/materials/{material_id}/regions/1"),
            None,
        ))
        .await
        .expect("remove region");
    assert_eq!(response.status(), StatusCode::OK);
    let body = test_support::read_json(response).await;
    assert_eq!(body["revision"], 2);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/materials/{material_id}"),
            None,
        ))
        .await
        .expect("material detail");
    let detail = test_support::read_json(response).await;
    assert_eq!(detail["id"], material_id.as_str());
    assert_eq!(detail["class_name"], "B2");
    assert_eq!(detail["regions_revision"], 2);
    assert_eq!(detail["regions"].as_array().expect("regions").len(), 1);
    assert_eq!(detail["regions"][0]["question_number"], 2);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/materials/{material_id}/regions/zero"),
            None,
        ))
        .await
        .expect("bad question");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_validates_payload_and_delete_removes_material() {
    let ctx = test_support::setup_test_context().await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/materials",
            Some(json!({"class_name": "A1", "round_number": 1, "page_count": 0, "file_ref": "x"})),
        ))
        .await
        .expect("register");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let material_id = test_support::register_material(&ctx.app, "A1", 1, 1).await;
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/materials/{material_id}"),
            None,
        ))
        .await
        .expect("delete");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/classes/A1/rounds/1/material",
            None,
        ))
        .await
        .expect("round material");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

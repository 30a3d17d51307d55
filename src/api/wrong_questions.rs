use axum::{routing::post, Json, Router};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::schemas::note::{NormalizeRequest, NormalizeResponse};
use crate::services::wrong_list::AnswerSheet;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/normalize", post(normalize))
}

/// Applies checklist edits to either view of a wrong list and returns both.
async fn normalize(
    Json(payload): Json<NormalizeRequest>,
) -> Result<Json<NormalizeResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let mut sheet = match (payload.text.as_deref(), payload.check_state.as_deref()) {
        (Some(_), Some(_)) => {
            return Err(ApiError::BadRequest(
                "Provide either text or check_state, not both".to_string(),
            ));
        }
        (Some(text), None) => AnswerSheet::from_text(text, payload.total_questions),
        (None, Some(bits)) => AnswerSheet::from_check_state(bits, payload.total_questions),
        (None, None) => AnswerSheet::new(payload.total_questions),
    };

    if let Some(total) = payload.new_total_questions {
        sheet.set_total_questions(Some(total));
    }
    if let Some(checked) = payload.check_all {
        sheet.check_all(checked);
    }
    for question_number in payload.toggle {
        sheet.toggle(question_number);
    }

    Ok(Json(NormalizeResponse::from_sheet(&sheet)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn normalizes_free_text_into_both_views() {
        let ctx = test_support::setup_test_context().await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/wrong-questions/normalize",
                Some(json!({"text": "7, 3, 3, x, 12", "total_questions": 10})),
            ))
            .await
            .expect("normalize");

        assert_eq!(response.status(), StatusCode::OK);
        let body = test_support::read_json(response).await;
        assert_eq!(body["text"], "3, 7");
        assert_eq!(body["wrong_questions"], json!([3, 7]));
        assert_eq!(body["check_state"].as_array().expect("bits").len(), 10);
        assert_eq!(body["check_state"][2], true);
        assert_eq!(body["derived_score"], 8);
    }

    #[tokio::test]
    async fn checklist_edits_regenerate_text() {
        let ctx = test_support::setup_test_context().await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/wrong-questions/normalize",
                Some(json!({
                    "check_state": [true, false, true],
                    "toggle": [1, 2]
                })),
            ))
            .await
            .expect("normalize");

        let body = test_support::read_json(response).await;
        assert_eq!(body["text"], "2, 3");
        assert_eq!(body["check_state"].as_array().expect("bits").len(), 50);
        assert_eq!(body["derived_score"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn shrinking_total_drops_trailing_questions() {
        let ctx = test_support::setup_test_context().await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/wrong-questions/normalize",
                Some(json!({"text": "3, 7, 9", "total_questions": 10, "new_total_questions": 8})),
            ))
            .await
            .expect("normalize");

        let body = test_support::read_json(response).await;
        assert_eq!(body["text"], "3, 7");
        assert_eq!(body["check_state"].as_array().expect("bits").len(), 8);
        assert_eq!(body["derived_score"], 6);
    }

    #[tokio::test]
    async fn large_numbers_without_total_keep_default_checklist() {
        let ctx = test_support::setup_test_context().await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/wrong-questions/normalize",
                Some(json!({"text": "4000000000, 3", "check_all": false, "toggle": [70]})),
            ))
            .await
            .expect("normalize");

        assert_eq!(response.status(), StatusCode::OK);
        let body = test_support::read_json(response).await;
        assert_eq!(body["text"], "");
        assert_eq!(body["check_state"].as_array().expect("bits").len(), 50);

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/wrong-questions/normalize",
                Some(json!({"text": "4000000000, 3"})),
            ))
            .await
            .expect("normalize");

        let body = test_support::read_json(response).await;
        assert_eq!(body["text"], "3, 4000000000");
        assert_eq!(body["check_state"].as_array().expect("bits").len(), 50);
        assert_eq!(body["check_state"][2], true);
    }

    #[tokio::test]
    async fn rejects_both_views_at_once() {
        let ctx = test_support::setup_test_context().await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/wrong-questions/normalize",
                Some(json!({"text": "1", "check_state": [true]})),
            ))
            .await
            .expect("normalize");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

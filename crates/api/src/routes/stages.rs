//! Stage trigger endpoints.
//!
//! `POST /stages/{stage}/run` processes the stage's pending queue items and
//! returns one outcome per item. A call with nothing pending returns an empty
//! list.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use autobook_core::pipeline::{ItemOutcome, StageType};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::AppState;

/// Query parameters for a stage run.
#[derive(Debug, Default, Deserialize)]
pub struct RunQuery {
    /// Maximum number of items to process.
    pub limit: Option<usize>,
}

/// Response body of a stage run.
#[derive(Debug, Serialize)]
pub struct RunResponse {
    /// Stage that was run.
    pub stage: StageType,
    /// Outcome per processed item, in processing order.
    pub processed: Vec<ItemOutcome>,
}

/// Creates stage routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/stages/{stage}/run", post(run_stage))
}

/// POST /stages/{stage}/run - Process pending items of a stage.
async fn run_stage(
    State(state): State<AppState>,
    Path(stage): Path<String>,
    Query(query): Query<RunQuery>,
) -> Response {
    let stage = match stage.parse::<StageType>() {
        Ok(stage) => stage,
        Err(e) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "unknown_stage",
                    "message": e.to_string()
                })),
            )
                .into_response();
        }
    };

    match state.runner.run_stage(stage, query.limit).await {
        Ok(processed) => {
            info!(stage = %stage, items = processed.len(), "Stage run finished");
            (StatusCode::OK, Json(RunResponse { stage, processed })).into_response()
        }
        Err(e) => {
            error!(stage = %stage, error = %e, "Stage run aborted");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "pipeline_error",
                    "message": e.to_string()
                })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use autobook_core::pipeline::{
        ItemStatus, PipelineError, QueueItem, QueueStatus, RepositoryError, StageDetail,
    };
    use autobook_shared::types::{InvoiceId, QueueItemId};
    use axum::body::Body;
    use axum::http::{Method, Request};
    use chrono::Utc;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::{StageRunner, create_router};

    #[derive(Default)]
    struct FakeRunner {
        calls: Mutex<Vec<(StageType, Option<usize>)>>,
        outcomes: Vec<ItemOutcome>,
        fail: bool,
    }

    #[async_trait]
    impl StageRunner for FakeRunner {
        async fn run_stage(
            &self,
            stage: StageType,
            limit: Option<usize>,
        ) -> Result<Vec<ItemOutcome>, PipelineError> {
            self.calls.lock().unwrap().push((stage, limit));
            if self.fail {
                return Err(PipelineError::reference_data(
                    stage,
                    RepositoryError::new("connection reset"),
                ));
            }
            Ok(self.outcomes.clone())
        }
    }

    fn outcome() -> ItemOutcome {
        let item = QueueItem {
            id: QueueItemId::new(),
            invoice_id: InvoiceId::new(),
            stage: StageType::Ocr,
            status: QueueStatus::Pending,
            error_message: None,
            created_at: Utc::now(),
            finished_at: None,
        };
        ItemOutcome::done(&item, StageDetail::Extracted { chars: 42, pages: 2 })
    }

    async fn send(runner: Arc<FakeRunner>, method: Method, uri: &str) -> (StatusCode, Value) {
        let app = create_router(AppState::new(runner));
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn test_run_returns_outcomes() {
        let runner = Arc::new(FakeRunner {
            outcomes: vec![outcome()],
            ..FakeRunner::default()
        });

        let (status, body) =
            send(runner.clone(), Method::POST, "/api/v1/stages/ocr/run").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stage"], "ocr");
        assert_eq!(body["processed"][0]["status"], "done");
        assert_eq!(body["processed"][0]["detail"]["kind"], "extracted");
        assert_eq!(body["processed"][0]["detail"]["chars"], 42);
        assert!(body["processed"][0].get("message").is_none());
        assert_eq!(*runner.calls.lock().unwrap(), vec![(StageType::Ocr, None)]);
    }

    #[tokio::test]
    async fn test_run_with_nothing_pending_is_empty() {
        let runner = Arc::new(FakeRunner::default());

        let (status, body) = send(
            runner,
            Method::POST,
            "/api/v1/stages/account_prediction/run",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stage"], "account_prediction");
        assert_eq!(body["processed"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_limit_is_forwarded() {
        let runner = Arc::new(FakeRunner::default());

        let (status, _) = send(
            runner.clone(),
            Method::POST,
            "/api/v1/stages/supplier_prediction/run?limit=3",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            *runner.calls.lock().unwrap(),
            vec![(StageType::SupplierPrediction, Some(3))]
        );
    }

    #[tokio::test]
    async fn test_unknown_stage_is_not_found() {
        let runner = Arc::new(FakeRunner::default());

        let (status, body) =
            send(runner.clone(), Method::POST, "/api/v1/stages/booking/run").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "unknown_stage");
        assert_eq!(body["message"], "unknown stage: booking");
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_methods_rejected() {
        let runner = Arc::new(FakeRunner::default());

        let (status, _) = send(runner.clone(), Method::GET, "/api/v1/stages/ocr/run").await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_failure_is_server_error() {
        let runner = Arc::new(FakeRunner {
            fail: true,
            ..FakeRunner::default()
        });

        let (status, body) =
            send(runner, Method::POST, "/api/v1/stages/vat_prediction/run").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "pipeline_error");
        assert!(
            body["message"]
                .as_str()
                .unwrap()
                .contains("connection reset")
        );
    }

    #[tokio::test]
    async fn test_failed_item_carries_message() {
        let item = QueueItem {
            id: QueueItemId::new(),
            invoice_id: InvoiceId::new(),
            stage: StageType::VatPrediction,
            status: QueueStatus::Pending,
            error_message: None,
            created_at: Utc::now(),
            finished_at: None,
        };
        let runner = Arc::new(FakeRunner {
            outcomes: vec![ItemOutcome::failed(
                &item,
                ItemStatus::Error,
                "vat lines do not match payable amount".into(),
            )],
            ..FakeRunner::default()
        });

        let (_, body) = send(runner, Method::POST, "/api/v1/stages/vat_prediction/run").await;

        assert_eq!(body["processed"][0]["status"], "error");
        assert_eq!(
            body["processed"][0]["message"],
            "vat lines do not match payable amount"
        );
        assert!(body["processed"][0].get("detail").is_none());
    }
}

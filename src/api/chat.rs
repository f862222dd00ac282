//! Chat submission and polling endpoints

use crate::api::ApiError;
use crate::api::chat::schemas::{ChatRequest, TaskCreated, TaskStatusResponse};
use crate::core::tasks::TaskStatus;
use crate::core::traits::{ChatService, SubmitError};
use axum::extract::Path;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use di_axum::Inject;
use log::debug;
use uuid::Uuid;

pub fn router() -> Router {
    Router::new()
        .route("/chat", post(submit_chat))
        .route("/task_status/:task_id", get(task_status))
}

async fn submit_chat(
    Inject(chat_service): Inject<dyn ChatService>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskCreated>), ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let task_id = chat_service
        .submit(request.message.unwrap_or_default())
        .map_err(|e| match e {
            SubmitError::EmptyMessage => ApiError::bad_request(e.to_string()),
            SubmitError::Busy | SubmitError::Closed => {
                ApiError::new(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            }
        })?;

    Ok((StatusCode::ACCEPTED, Json(TaskCreated { task_id })))
}

async fn task_status(
    Inject(chat_service): Inject<dyn ChatService>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskStatusResponse>, ApiError> {
    let status = Uuid::parse_str(&task_id)
        .map(|task_id| chat_service.poll(task_id))
        .unwrap_or(TaskStatus::Unknown);

    match status {
        TaskStatus::Unknown => {
            debug!("poll for unknown task {task_id}");
            Err(ApiError::new(StatusCode::NOT_FOUND, "Invalid task ID"))
        }
        TaskStatus::Pending => Ok(Json(TaskStatusResponse::Pending)),
        TaskStatus::Done(response) => Ok(Json(TaskStatusResponse::Done { response })),
    }
}

pub mod schemas {
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Deserialize, Debug)]
    pub struct ChatRequest {
        pub message: Option<String>,
    }

    #[derive(Serialize, Debug)]
    pub struct TaskCreated {
        pub task_id: Uuid,
    }

    #[derive(Serialize, Debug, PartialEq, Eq)]
    #[serde(tag = "status", rename_all = "lowercase")]
    pub enum TaskStatusResponse {
        Pending,
        Done { response: String },
    }

}

// src/tasks.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::info;
use mongodb::bson::doc;
use serde_json::json;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::models::task::{
    sort_for_listing, CreateTaskRequest, TaskQuery, TaskResponse, TaskStatus,
    UpdateStatusRequest,
};
use crate::notifier::CompletionPayload;

/// POST /api/tasks
pub async fn create_task(
    data: web::Data<AppState>,
    payload: web::Json<CreateTaskRequest>,
) -> Result<HttpResponse, ApiError> {
    let new_task = payload
        .into_inner()
        .validate(Utc::now())
        .map_err(ApiError::Validation)?;

    let task = data
        .store
        .insert(new_task)
        .await
        .map_err(|e| ApiError::internal("Failed to create task", e))?;

    info!("Task created: {}", task.task_id);
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Task created successfully",
        "task": TaskResponse::new(task, Utc::now()),
    })))
}

/// GET /api/tasks?status=&assigneeEmail=&overdue=
pub async fn list_tasks(
    data: web::Data<AppState>,
    query: web::Query<TaskQuery>,
) -> Result<HttpResponse, ApiError> {
    let mut filter = doc! {};

    if let Some(status) = &query.status {
        let status = TaskStatus::parse(status)
            .ok_or_else(|| ApiError::InvalidArgument("Invalid status value".to_string()))?;
        filter.insert("status", status.as_str());
    }
    if let Some(email) = &query.assignee_email {
        filter.insert("assigneeEmail", email.trim().to_lowercase());
    }

    let mut tasks = data
        .store
        .find(filter)
        .await
        .map_err(|e| ApiError::internal("Failed to retrieve tasks", e))?;

    let now = Utc::now();
    if query.overdue.as_deref() == Some("true") {
        tasks.retain(|t| t.is_overdue(now));
    }
    sort_for_listing(&mut tasks);

    let tasks: Vec<TaskResponse> = tasks
        .into_iter()
        .map(|t| TaskResponse::new(t, now))
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": tasks.len(),
        "tasks": tasks,
    })))
}

/// PATCH /api/tasks/{task_id}/status
pub async fn update_task_status(
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, ApiError> {
    let task_id = path.into_inner();
    if Uuid::parse_str(&task_id).is_err() {
        return Err(ApiError::InvalidArgument("Invalid task ID".to_string()));
    }
    let status = TaskStatus::parse(&payload.status)
        .ok_or_else(|| ApiError::InvalidArgument("Invalid status value".to_string()))?;

    let task = data
        .store
        .update_status(&task_id, status)
        .await
        .map_err(|e| ApiError::internal("Failed to update task status", e))?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    info!("Task {} status set to {}", task.task_id, status.as_str());

    // Completion notification is dispatched on its own task so a slow or
    // failing webhook never delays or fails the response.
    if status == TaskStatus::Completed {
        let notifier = data.notifier.clone();
        let payload = CompletionPayload::from_task(&task);
        tokio::spawn(async move {
            notifier.notify_completion(&payload).await;
        });
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Status updated successfully",
        "task": TaskResponse::new(task, Utc::now()),
    })))
}

/// DELETE /api/tasks/{task_id}
pub async fn delete_task(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let task_id = path.into_inner();
    if Uuid::parse_str(&task_id).is_err() {
        return Err(ApiError::InvalidArgument("Invalid task ID".to_string()));
    }

    let deleted = data
        .store
        .delete(&task_id)
        .await
        .map_err(|e| ApiError::internal("Failed to delete task", e))?;
    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    info!("Task deleted: {}", task_id);
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Task deleted successfully",
    })))
}

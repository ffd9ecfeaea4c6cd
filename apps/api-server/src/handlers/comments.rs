//! Task comment endpoints.

use actix_web::{HttpResponse, web};

use tasktrack_core::domain::{CommentSummary, TaskId};
use tasktrack_shared::dto::{
    AddCommentRequest, CommentCreatedResponse, CommentResponse, UpdateCommentRequest,
};

use super::with_deadline;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn parse_comment_id(raw: &str) -> AppResult<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::BadRequest(format!("malformed comment id: {raw:?}")))
}

fn to_response(summary: CommentSummary) -> CommentResponse {
    CommentResponse {
        task_id: summary.task_id.get(),
        comment: summary.text,
        is_deleted: summary.is_deleted,
        at: summary.observed_at,
    }
}

/// List the comments of a task, most recent first.
///
/// GET /api/tasks/{task_id}/comments
pub async fn list_comments(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let task_id: TaskId = path.parse()?;

    let reader = &state.comment_reader;
    let comments = with_deadline(&state, |token| async move {
        reader.get_comments(task_id, &token).await
    })
    .await?;

    let body: Vec<CommentResponse> = comments.into_iter().map(to_response).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// POST /api/tasks/{task_id}/comments
pub async fn add_comment(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<AddCommentRequest>,
) -> AppResult<HttpResponse> {
    let task_id: TaskId = path.parse()?;
    let request = body.into_inner();

    let writer = &state.comment_writer;
    let id = with_deadline(&state, |token| async move {
        writer
            .add(task_id, request.author_id, &request.message, &token)
            .await
    })
    .await?;

    Ok(HttpResponse::Created().json(CommentCreatedResponse { id }))
}

/// PUT /api/comments/{comment_id}
pub async fn update_comment(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateCommentRequest>,
) -> AppResult<HttpResponse> {
    let comment_id = parse_comment_id(&path)?;
    let request = body.into_inner();

    let writer = &state.comment_writer;
    with_deadline(&state, |token| async move {
        writer.update(comment_id, &request.message, &token).await
    })
    .await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Soft-delete a comment.
///
/// DELETE /api/comments/{comment_id}
pub async fn delete_comment(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let comment_id = parse_comment_id(&path)?;

    let writer = &state.comment_writer;
    with_deadline(&state, |token| async move { writer.delete(comment_id, &token).await })
    .await?;

    Ok(HttpResponse::NoContent().finish())
}

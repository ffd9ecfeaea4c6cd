//! HTTP handlers and route configuration.

mod comments;
mod health;

use std::future::Future;

use actix_web::web;
use tokio_util::sync::CancellationToken;

use tasktrack_core::DomainError;

use crate::middleware::error::{AppError, AppResult};
use crate::middleware::rate_limit::RateLimitMiddleware;
use crate::state::AppState;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // Registered ahead of the scope so health checks are never throttled
    cfg.route("/api/health", web::get().to(health::health_check))
        .service(
            web::scope("/api")
                .wrap(RateLimitMiddleware)
                .service(
                    web::resource("/tasks/{task_id}/comments")
                        .route(web::get().to(comments::list_comments))
                        .route(web::post().to(comments::add_comment)),
                )
                .service(
                    web::resource("/comments/{comment_id}")
                        .route(web::put().to(comments::update_comment))
                        .route(web::delete().to(comments::delete_comment)),
                ),
        );
}

/// Run `work` under the request deadline with a token that is cancelled
/// when the deadline passes or the server shuts down.
pub(crate) async fn with_deadline<T, F, Fut>(state: &AppState, work: F) -> AppResult<T>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T, DomainError>>,
{
    let token = state.request_token();

    match tokio::time::timeout(state.request_timeout, work(token.clone())).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => {
            token.cancel();
            tracing::warn!(timeout = ?state.request_timeout, "Request deadline exceeded");
            Err(AppError::GatewayTimeout)
        }
    }
}

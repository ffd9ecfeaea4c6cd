//! Admission middleware - charges every identified request to the rate limiter.

use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::{HeaderName, HeaderValue},
    web,
};
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;

use tasktrack_core::ports::RateLimitResult;

use crate::middleware::error::AppError;
use crate::observability::RequestId;
use crate::state::AppState;

/// Admission middleware factory.
///
/// The limiter and the identity header are read from the `AppState`
/// registered as app data. Requests without the header are not throttled.
pub struct RateLimitMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
                let err = AppError::Internal("application state not registered".to_string());
                return Ok(reject(req, err));
            };

            let header = req
                .headers()
                .get(state.client_ip_header.as_str())
                .map(|v| v.to_str().map(str::to_owned));

            let key = match header {
                None => {
                    let res = service.call(req).await?;
                    return Ok(res.map_into_left_body());
                }
                Some(Ok(key)) => key,
                Some(Err(_)) => {
                    let err = AppError::BadRequest(format!(
                        "Header {} is not valid text",
                        state.client_ip_header
                    ));
                    return Ok(reject(req, err));
                }
            };

            let token = state.request_token();
            let admitted =
                tokio::time::timeout(state.request_timeout, state.rate_limiter.admit(&key, &token))
                    .await;

            let result = match admitted {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => {
                    tracing::error!(client = %key, error = %e, "Admission check failed");
                    return Ok(reject(req, e.into()));
                }
                Err(_) => {
                    token.cancel();
                    return Ok(reject(req, AppError::GatewayTimeout));
                }
            };

            if !result.is_allowed() {
                tracing::warn!(
                    client = %key,
                    count = ?result.count,
                    limit = result.limit,
                    "Rate limit exceeded"
                );
                let err = AppError::TooManyRequests {
                    limit: result.limit,
                    retry_after: result.window,
                };
                return Ok(reject(req, err));
            }

            let mut res = service.call(req).await?;
            insert_limit_headers(&mut res, &result);
            Ok(res.map_into_left_body())
        })
    }
}

fn reject<B>(req: ServiceRequest, err: AppError) -> ServiceResponse<EitherBody<B>> {
    let request_id = req.extensions().get::<RequestId>().cloned();
    let response = err.to_response(request_id.as_ref().map(RequestId::as_str));
    let (http_req, _payload) = req.into_parts();
    ServiceResponse::new(http_req, response).map_into_right_body()
}

fn insert_limit_headers<B>(res: &mut ServiceResponse<B>, result: &RateLimitResult) {
    let headers = res.headers_mut();
    headers.insert(
        HeaderName::from_static("x-ratelimit-limit"),
        HeaderValue::from(result.limit),
    );
    headers.insert(
        HeaderName::from_static("x-ratelimit-remaining"),
        HeaderValue::from(result.remaining),
    );
}

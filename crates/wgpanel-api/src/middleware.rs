use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::time::Instant;

use actix_web::body::{BodySize, MessageBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::web::Data;
use chrono::Utc;
use tracing::{Instrument, info, info_span, warn};

use crate::auth::SESSION_COOKIE;
use crate::session::SessionStore;

/// Access log. Each request runs inside a `request` span naming the operator
/// when the session cookie maps to a live session, and ends with one event
/// once the response is ready.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Transform = RequestLoggerMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerMiddleware { service }))
    }
}

pub struct RequestLoggerMiddleware<S> {
    service: S,
}

/// Session owner for logging only. Never removes or refreshes anything.
fn session_user(req: &ServiceRequest) -> Option<String> {
    let store = req.app_data::<Data<SessionStore>>()?;
    let cookie = req.cookie(SESSION_COOKIE)?;
    store.username_of(cookie.value(), Utc::now())
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(
        &self,
        ctx: &mut core::task::Context<'_>,
    ) -> core::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let peer = req
            .peer_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_owned());
        let user = session_user(&req);
        let span = info_span!(
            "request",
            peer = %peer,
            method = %req.method(),
            path = %req.path(),
            user = user.as_deref().unwrap_or("-"),
        );
        let request_size = req
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);

        let start = Instant::now();
        let fut = {
            let _entered = span.enter();
            self.service.call(req)
        };

        Box::pin(
            async move {
                let res = fut.await?;
                let elapsed_ms = start.elapsed().as_millis() as u64;
                let status = res.status().as_u16();
                let response_size = match res.response().body().size() {
                    BodySize::Sized(n) => n,
                    _ => 0,
                };

                if res.status().is_server_error() {
                    warn!(status, request_size, response_size, elapsed_ms, "request failed");
                } else {
                    info!(status, request_size, response_size, elapsed_ms, "request");
                }

                Ok(res)
            }
            .instrument(span),
        )
    }
}

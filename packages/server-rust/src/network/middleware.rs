//! Middleware pipeline for the HTTP surface.
//!
//! Layer ordering follows the outer-to-inner convention: the first layer
//! attached is the outermost (sees the request first and the response
//! last). The fixed order is trace id, then panic guard, then access
//! log, then CORS, with bearer authentication attached per-route on
//! private routes.

use std::any::Any;
use std::backtrace::Backtrace;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::extract::Request;
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use futures_util::FutureExt;
use tower::{Layer, Service};
use tower_http::cors::{AllowOrigin, Any as AnyOrigin, CorsLayer};
use tracing::Instrument;
use uuid::Uuid;

use crate::auth::AuthFacade;
use crate::error::ApiError;
use crate::network::context::RequestContext;

/// Response header carrying the request's trace id.
pub const TRACE_ID_HEADER: HeaderName = HeaderName::from_static("x-trace-id");

// ---------------------------------------------------------------------------
// TraceIdLayer
// ---------------------------------------------------------------------------

/// Outermost layer: assigns a v4 trace id to every request, stores it in
/// the typed [`RequestContext`] extension, echoes it as a response
/// header, and opens a tracing span so downstream log lines inherit the
/// id.
#[derive(Debug, Clone)]
pub struct TraceIdLayer;

impl<S> Layer<S> for TraceIdLayer {
    type Service = TraceIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TraceIdService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct TraceIdService<S> {
    inner: S,
}

impl<S> Service<Request> for TraceIdService<S>
where
    S: Service<Request, Response = Response> + Send,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let ctx = RequestContext::generate();
        let trace_id = ctx.trace_id();
        req.extensions_mut().insert(ctx);

        let span = tracing::info_span!("request", trace_id = %trace_id);
        let fut = self.inner.call(req);
        Box::pin(
            async move {
                let mut res = fut.await?;
                if let Ok(value) = HeaderValue::from_str(&trace_id.to_string()) {
                    res.headers_mut().insert(TRACE_ID_HEADER, value);
                }
                Ok(res)
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// PanicGuardLayer
// ---------------------------------------------------------------------------

/// Converts panics from anywhere deeper in the chain into the generic
/// internal-error response. This is the single panic boundary: a panic
/// in one request must never take down another.
#[derive(Debug, Clone)]
pub struct PanicGuardLayer;

impl<S> Layer<S> for PanicGuardLayer {
    type Service = PanicGuardService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PanicGuardService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct PanicGuardService<S> {
    inner: S,
}

impl<S> Service<Request> for PanicGuardService<S>
where
    S: Service<Request, Response = Response> + Send,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let trace_id = req
            .extensions()
            .get::<RequestContext>()
            .map_or_else(Uuid::nil, RequestContext::trace_id);

        // The inner call itself may panic before returning a future.
        let call = std::panic::catch_unwind(AssertUnwindSafe(|| self.inner.call(req)));
        Box::pin(async move {
            let fut = match call {
                Ok(fut) => fut,
                Err(panic) => return Ok(panic_response(trace_id, panic.as_ref())),
            };
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(result) => result,
                Err(panic) => Ok(panic_response(trace_id, panic.as_ref())),
            }
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn panic_response(trace_id: Uuid, panic: &(dyn Any + Send)) -> Response {
    let backtrace = Backtrace::force_capture();
    tracing::error!(
        %trace_id,
        panic = %panic_message(panic),
        backtrace = %backtrace,
        "recovered from panic"
    );
    ApiError::internal_generic().into_response()
}

// ---------------------------------------------------------------------------
// AccessLogLayer
// ---------------------------------------------------------------------------

/// Logs method and path at entry and status plus elapsed wall-clock time
/// at exit, tagged with the trace id.
#[derive(Debug, Clone)]
pub struct AccessLogLayer;

impl<S> Layer<S> for AccessLogLayer {
    type Service = AccessLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessLogService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct AccessLogService<S> {
    inner: S,
}

impl<S> Service<Request> for AccessLogService<S>
where
    S: Service<Request, Response = Response> + Send,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let trace_id = req
            .extensions()
            .get::<RequestContext>()
            .map_or_else(Uuid::nil, RequestContext::trace_id);
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        tracing::debug!(%trace_id, %method, %path, "request received");

        let fut = self.inner.call(req);
        Box::pin(async move {
            let start = Instant::now();
            let res = fut.await?;
            #[allow(clippy::cast_possible_truncation)]
            let elapsed_ms = start.elapsed().as_millis() as u64;
            tracing::debug!(
                %trace_id,
                %method,
                %path,
                status = res.status().as_u16(),
                elapsed_ms,
                "request completed"
            );
            Ok(res)
        })
    }
}

// ---------------------------------------------------------------------------
// AuthLayer
// ---------------------------------------------------------------------------

/// Bearer authentication for private routes.
///
/// A missing `Authorization` header or one without the `"Bearer "`
/// prefix is logged and treated as an empty token, which then fails
/// verification -- so all failure shapes produce the same 401 body. On
/// success the verified identity is attached to the request context
/// before the handler runs.
#[derive(Clone)]
pub struct AuthLayer {
    auth: Arc<AuthFacade>,
}

impl AuthLayer {
    #[must_use]
    pub fn new(auth: Arc<AuthFacade>) -> Self {
        Self { auth }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            auth: Arc::clone(&self.auth),
        }
    }
}

#[derive(Clone)]
pub struct AuthService<S> {
    inner: S,
    auth: Arc<AuthFacade>,
}

impl<S> Service<Request> for AuthService<S>
where
    S: Service<Request, Response = Response> + Send,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let ctx = req
            .extensions()
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(RequestContext::generate);
        let token = bearer_token(req.headers(), ctx.trace_id());

        match self.auth.verify_token(&token) {
            Ok(identity) => {
                req.extensions_mut().insert(ctx.with_identity(identity));
                let fut = self.inner.call(req);
                Box::pin(fut)
            }
            Err(err) => {
                let res = err.into_response();
                Box::pin(async move { Ok(res) })
            }
        }
    }
}

/// Extracts the bearer token from the `Authorization` header. Absence or
/// a wrong prefix yields the empty token.
fn bearer_token(headers: &HeaderMap, trace_id: Uuid) -> String {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        tracing::debug!(%trace_id, "missing Authorization header");
        return String::new();
    };
    let Ok(value) = value.to_str() else {
        tracing::debug!(%trace_id, "Authorization header is not valid UTF-8");
        return String::new();
    };
    match value.strip_prefix("Bearer ") {
        Some(token) => token.to_string(),
        None => {
            tracing::debug!(%trace_id, "Authorization header does not start with 'Bearer '");
            String::new()
        }
    }
}

// ---------------------------------------------------------------------------
// CORS
// ---------------------------------------------------------------------------

/// Builds the CORS layer from the configured list of allowed origins.
///
/// A wildcard `"*"` in the origins list allows any origin. Otherwise,
/// each origin string is parsed and added to an explicit allowlist.
#[must_use]
pub fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(AnyOrigin)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

// src/server/handler.rs
use crate::metrics::MetricsRegistry;
use hyper::{header, Body, Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::sync::Arc;
use tower::Service;

/// Answers third-party uptime checkers and serves prometheus text.
#[derive(Clone)]
pub struct LivenessHandler {
    message: Arc<str>,
    metrics_path: Arc<str>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl LivenessHandler {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into().into(),
            metrics_path: Arc::from("/metrics"),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, path: impl Into<String>, registry: Arc<MetricsRegistry>) -> Self {
        self.metrics_path = path.into().into();
        self.metrics = Some(registry);
        self
    }

    fn respond(&self, req: &Request<Body>) -> Response<Body> {
        let path = req.uri().path();
        let readable = matches!(*req.method(), Method::GET | Method::HEAD);

        if path == "/" {
            if !readable {
                return status_only(StatusCode::METHOD_NOT_ALLOWED);
            }
            return text(StatusCode::OK, "text/plain; charset=utf-8", self.message.to_string());
        }

        if let Some(registry) = &self.metrics {
            if path == &*self.metrics_path && readable {
                return text(
                    StatusCode::OK,
                    "text/plain; version=0.0.4",
                    registry.gather(),
                );
            }
        }

        text(StatusCode::NOT_FOUND, "text/plain; charset=utf-8", "Not Found")
    }
}

fn text(status: StatusCode, content_type: &'static str, body: impl Into<Body>) -> Response<Body> {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static(content_type),
    );
    response
}

fn status_only(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

impl Service<Request<Body>> for LivenessHandler {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = futures::future::Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        tracing::trace!(method = %req.method(), path = %req.uri().path(), "liveness request");
        futures::future::ready(Ok(self.respond(&req)))
    }
}

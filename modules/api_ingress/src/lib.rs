use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{middleware::from_fn, routing::get, Router};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};
use utoipa::OpenApi;

mod config;
pub mod contracts;
pub mod error;
pub mod model;
pub mod openapi;
pub mod request_id;
pub mod web;

pub use config::ApiIngressConfig;
pub use contracts::RestfulModule;
pub use error::AppError;
pub use model::Message;

/// HTTP host: owns the middleware stack, the health/info endpoints and the
/// OpenAPI document, and mounts every registered module under the base path.
#[derive(Debug, Clone, Default)]
pub struct ApiIngress {
    config: ApiIngressConfig,
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        Self { config }
    }

    /// Build the OpenAPI document for the host endpoints plus every module,
    /// with paths as served (base path included).
    pub fn build_openapi(
        &self,
        modules: &[Arc<dyn RestfulModule>],
    ) -> Result<utoipa::openapi::OpenApi> {
        let base_path = self.config.normalized_base_path()?;

        let mut doc = openapi::HostApiDoc::openapi();
        for module in modules {
            doc.merge(module.openapi());
        }
        openapi::prefix_paths(&mut doc, &base_path);

        tracing::info!(
            "Building OpenAPI: {} paths from {} modules",
            doc.paths.paths.len(),
            modules.len()
        );
        Ok(doc)
    }

    /// Build the HTTP router from the host endpoints and the given modules.
    pub fn build_router(&self, modules: &[Arc<dyn RestfulModule>]) -> Result<Router> {
        let base_path = self.config.normalized_base_path()?;

        let mut api = Router::new()
            .route("/health", get(web::health_check))
            .route("/info", get(web::info));

        for module in modules {
            api = module
                .register_rest(api)
                .with_context(|| format!("module '{}' failed to register routes", module.name()))?;
            tracing::debug!(module = module.name(), "Registered module routes");
        }

        if self.config.enable_docs {
            // Build once, serve as static JSON (no per-request work)
            let openapi_value = Arc::new(serde_json::to_value(self.build_openapi(modules)?)?);
            let spec_url = format!("{base_path}/openapi.json");

            api = api
                .route(
                    "/openapi.json",
                    get(move || {
                        let v = openapi_value.clone();
                        async move {
                            ([(header::CACHE_CONTROL, "no-store")], axum::Json((*v).clone()))
                                .into_response()
                        }
                    }),
                )
                .route("/docs", get(move || async move { web::docs_page(&spec_url) }));
        }

        let mut router = if base_path.is_empty() {
            api
        } else {
            Router::new().nest(&base_path, api)
        };

        // Layers wrap everything added before them, so the last one is outermost:
        // SetRequestId -> PropagateRequestId -> Trace -> push_req_id_to_extensions
        // -> Timeout -> CORS -> BodyLimit -> handler
        router = router.layer(RequestBodyLimitLayer::new(self.config.body_limit_bytes));

        if self.config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        router = router.layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(self.config.request_timeout_secs),
        ));

        router = router.layer(from_fn(request_id::push_req_id_to_extensions));
        router = router.layer(request_id::create_trace_layer());

        let x_request_id = request_id::header();
        router = router.layer(PropagateRequestIdLayer::new(x_request_id.clone()));
        router = router.layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId));

        Ok(router)
    }
}

/// Bind `bind_addr` and serve `router` until `shutdown` resolves.
pub async fn serve<F>(router: Router, bind_addr: &str, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address '{bind_addr}'"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    serve_listener(listener, router, shutdown).await
}

/// Serve on an already-bound listener with graceful shutdown.
pub async fn serve_listener<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::info!("HTTP server bound on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("HTTP server shutting down gracefully");
        })
        .await
        .context("HTTP server failed")
}

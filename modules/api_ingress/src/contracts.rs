use axum::Router;

/// A module that contributes REST routes to the host router.
pub trait RestfulModule: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Add this module's routes to `router`; paths are relative to the host base path.
    fn register_rest(&self, router: Router) -> anyhow::Result<Router>;

    /// OpenAPI fragment describing the routes added by `register_rest`.
    fn openapi(&self) -> utoipa::openapi::OpenApi;
}

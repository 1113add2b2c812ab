use utoipa::OpenApi;

use crate::error::ErrorBody;
use crate::model::Message;

/// Host-level part of the OpenAPI document; modules contribute the rest.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Users Server API",
        version = "1.0.0",
        description = "Health/info endpoints and an in-memory user directory"
    ),
    paths(crate::web::health_check, crate::web::info),
    components(schemas(Message, ErrorBody)),
    tags((name = "system", description = "Service health and information"))
)]
pub struct HostApiDoc;

/// Prefix every path of `doc` with `base_path` ("" leaves it unchanged).
pub fn prefix_paths(doc: &mut utoipa::openapi::OpenApi, base_path: &str) {
    if base_path.is_empty() {
        return;
    }
    let paths = std::mem::take(&mut doc.paths.paths);
    doc.paths.paths = paths
        .into_iter()
        .map(|(path, item)| (format!("{base_path}{path}"), item))
        .collect();
}

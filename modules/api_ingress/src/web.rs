use axum::response::{Html, Json};

use crate::model::Message;

pub const HEALTH_MESSAGE: &str = "Backend is running!";
pub const INFO_MESSAGE: &str = "Docker Assignment Backend API";
pub const INFO_DETAIL: &str = "Version 1.0.0 - Running on Rust with axum";

/// Local wall-clock time without offset, e.g. `2025-03-01T10:15:30.123456`.
pub fn local_timestamp() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.f")
        .to_string()
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses((status = 200, description = "Service is running", body = Message))
)]
pub async fn health_check() -> Json<Message> {
    Json(Message::new(HEALTH_MESSAGE, local_timestamp()))
}

/// Service name and version
#[utoipa::path(
    get,
    path = "/info",
    tag = "system",
    responses((status = 200, description = "Service description", body = Message))
)]
pub async fn info() -> Json<Message> {
    Json(Message::new(INFO_MESSAGE, INFO_DETAIL))
}

/// Stoplight Elements page rendering the OpenAPI document at `spec_url`.
pub fn docs_page(spec_url: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8"/>
  <title>API Docs</title>
  <script src="https://unpkg.com/@stoplight/elements@latest/web-components.min.js"></script>
  <link rel="stylesheet" href="https://unpkg.com/@stoplight/elements@latest/styles.min.css">
</head>
<body>
  <elements-api apiDescriptionUrl="{spec_url}" router="hash" layout="sidebar"></elements-api>
</body>
</html>"#
    ))
}

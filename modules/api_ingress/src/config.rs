use serde::{Deserialize, Serialize};

/// HTTP host configuration, read from the `api_ingress` entry of the module bag.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ApiIngressConfig {
    /// Prefix every route is mounted under ("" mounts at the root).
    pub base_path: String,
    /// Serve `{base_path}/openapi.json` and `{base_path}/docs`.
    pub enable_docs: bool,
    /// Permissive CORS: any origin, method and header.
    pub cors_enabled: bool,
    pub request_timeout_secs: u64,
    pub body_limit_bytes: usize,
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            base_path: "/api".to_string(),
            enable_docs: true,
            cors_enabled: true,
            request_timeout_secs: 30,
            body_limit_bytes: 16 * 1024 * 1024,
        }
    }
}

impl ApiIngressConfig {
    /// `base_path` without a trailing slash; "" for the root.
    pub fn normalized_base_path(&self) -> anyhow::Result<String> {
        let trimmed = self.base_path.trim().trim_end_matches('/');
        if !trimmed.is_empty() && !trimmed.starts_with('/') {
            anyhow::bail!("base_path must start with '/' (got '{}')", self.base_path);
        }
        Ok(trimmed.to_string())
    }
}

//! Per-source extraction strategies
//!
//! Each strategy fills in the evidence fields it knows
//! about. Every remote call is independent: one failing field never stops
//! the others.

pub mod bitbucket;
pub mod generic;
pub mod github;
pub mod gitlab;
pub mod pypi;
pub mod sourceforge;

use crate::config::EnricherConfig;
use crate::error::EnrichError;
use crate::render::PageRenderer;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;

/// Shared handles passed to every strategy
pub struct SourceContext<'a> {
    /// HTTP client (timeout and user agent already applied)
    pub client: &'a Client,
    /// Endpoints and credentials
    pub config: &'a EnricherConfig,
    /// Renderer for pages that need a browser
    pub renderer: &'a dyn PageRenderer,
}

/// Send `request` and decode a JSON body, failing on non-success status
pub(crate) async fn send_json(request: RequestBuilder, url: &str) -> Result<Value, EnrichError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(EnrichError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.json::<Value>().await?)
}

/// `None` for JSON null, the value otherwise
pub(crate) fn non_null(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        other => Some(other),
    }
}

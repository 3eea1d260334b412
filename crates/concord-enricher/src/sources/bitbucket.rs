//! Bitbucket repositories

use super::{send_json, SourceContext};
use crate::error::EnrichError;
use concord_domain::Fetch;
use serde_json::Value;
use tracing::debug;

/// Conventional README names, probed in this order
pub const README_CANDIDATES: &[&str] = &[
    "README.md",
    "README.rst",
    "README.txt",
    "readme.md",
    "readme.rst",
    "readme.txt",
];

/// Repository metadata and the first README found on the default branch
///
/// The README is only probed once metadata was retrieved.
pub async fn fetch(ctx: &SourceContext<'_>, user: &str, repo: &str) -> (Fetch<Value>, Fetch<String>) {
    let url = format!(
        "{}/repositories/{}/{}",
        ctx.config.bitbucket_api_base.trim_end_matches('/'),
        user,
        repo
    );
    let metadata = match send_json(ctx.client.get(&url), &url).await {
        Ok(metadata) => metadata,
        Err(e) => return (Fetch::Failed(e.to_string()), Fetch::Absent),
    };

    let branch = default_branch(&metadata);
    let readme = probe_readme(ctx, user, repo, &branch).await.into();
    (Fetch::Found(metadata), readme)
}

/// Default branch reported by the API, `master` when absent
pub fn default_branch(metadata: &Value) -> String {
    metadata["mainbranch"]["name"]
        .as_str()
        .or_else(|| metadata["main_branch"].as_str())
        .filter(|b| !b.is_empty())
        .unwrap_or("master")
        .to_string()
}

async fn probe_readme(
    ctx: &SourceContext<'_>,
    user: &str,
    repo: &str,
    branch: &str,
) -> Result<Option<String>, EnrichError> {
    let base = ctx.config.bitbucket_raw_base.trim_end_matches('/');
    for filename in README_CANDIDATES {
        let url = format!("{}/{}/{}/raw/{}/{}", base, user, repo, branch, filename);
        let response = ctx.client.get(&url).send().await?;
        if !response.status().is_success() {
            continue;
        }
        let text = response.text().await?;
        if !text.trim().is_empty() {
            debug!("README found at {}", url);
            return Ok(Some(text));
        }
    }
    debug!("No README found for {}/{} on {}", user, repo, branch);
    Ok(None)
}

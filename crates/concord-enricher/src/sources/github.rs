//! GitHub repositories
//!
//! Metadata and file contents come from a metadata service keyed by
//! owner/repo; the root listing comes from the GitHub REST API.

use super::{non_null, send_json, SourceContext};
use crate::error::EnrichError;
use concord_domain::Fetch;
use serde_json::Value;
use tracing::debug;

/// Repository metadata and README text for `owner/repo`
pub async fn fetch(ctx: &SourceContext<'_>, owner: &str, repo: &str) -> (Fetch<Value>, Fetch<String>) {
    let (metadata, readme) = tokio::join!(
        fetch_metadata(ctx, owner, repo),
        fetch_readme(ctx, owner, repo)
    );
    (metadata.into(), readme.into())
}

fn user_token<'a>(ctx: &'a SourceContext<'_>) -> &'a str {
    ctx.config.github_token.as_deref().unwrap_or("")
}

async fn fetch_metadata(
    ctx: &SourceContext<'_>,
    owner: &str,
    repo: &str,
) -> Result<Option<Value>, EnrichError> {
    debug!("Fetching GitHub metadata for {}/{}", owner, repo);
    let url = &ctx.config.github_metadata_url;
    let request = ctx.client.post(url).form(&[
        ("owner", owner),
        ("repo", repo),
        ("userToken", user_token(ctx)),
        ("prepare", "false"),
    ]);
    let mut body = send_json(request, url).await?;
    Ok(body.get_mut("data").map(Value::take).and_then(non_null))
}

async fn fetch_readme(
    ctx: &SourceContext<'_>,
    owner: &str,
    repo: &str,
) -> Result<Option<String>, EnrichError> {
    let listing_url = format!(
        "{}/repos/{}/{}/contents/",
        ctx.config.github_api_base.trim_end_matches('/'),
        owner,
        repo
    );
    let mut request = ctx
        .client
        .get(&listing_url)
        .header("Accept", "application/vnd.github+json");
    if let Some(token) = &ctx.config.github_token {
        request = request.bearer_auth(token);
    }
    let listing = send_json(request, &listing_url).await?;

    let Some(path) = select_readme(&listing) else {
        debug!("No README in root of {}/{}", owner, repo);
        return Ok(None);
    };

    let url = &ctx.config.github_content_url;
    let request = ctx.client.post(url).form(&[
        ("owner", owner),
        ("repo", repo),
        ("path", path.as_str()),
        ("userToken", user_token(ctx)),
    ]);
    let body = send_json(request, url).await?;
    Ok(body["content"]
        .as_str()
        .filter(|content| !content.trim().is_empty())
        .map(str::to_string))
}

/// Path of the first root file whose name starts with `readme` (any case)
pub fn select_readme(listing: &Value) -> Option<String> {
    listing.as_array()?.iter().find_map(|item| {
        let is_file = item["type"].as_str() == Some("file");
        let name = item["name"].as_str()?;
        if is_file && name.to_lowercase().starts_with("readme") {
            Some(item["path"].as_str().unwrap_or(name).to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_select_readme_first_match_case_insensitive() {
        let listing = json!([
            {"name": "src", "path": "src", "type": "dir"},
            {"name": "ReadMe.rst", "path": "ReadMe.rst", "type": "file"},
            {"name": "README.md", "path": "README.md", "type": "file"}
        ]);
        assert_eq!(select_readme(&listing), Some("ReadMe.rst".to_string()));
    }

    #[test]
    fn test_select_readme_ignores_directories() {
        let listing = json!([
            {"name": "readme", "path": "readme", "type": "dir"},
            {"name": "setup.py", "path": "setup.py", "type": "file"}
        ]);
        assert_eq!(select_readme(&listing), None);
    }

    #[test]
    fn test_select_readme_non_array() {
        assert_eq!(select_readme(&json!({"message": "Not Found"})), None);
    }
}

//! GitLab projects

use super::{send_json, SourceContext};
use crate::error::EnrichError;
use concord_domain::Fetch;
use serde_json::Value;
use tracing::debug;

/// Project metadata and, when the project exposes one, its README
pub async fn fetch(ctx: &SourceContext<'_>, project_path: &str) -> (Fetch<Value>, Fetch<String>) {
    let encoded = urlencoding::encode(project_path).into_owned();

    let metadata = match fetch_metadata(ctx, &encoded).await {
        Ok(metadata) => metadata,
        Err(e) => return (Fetch::Failed(e.to_string()), Fetch::Absent),
    };

    let readme = match metadata["readme_url"].as_str().and_then(readme_location) {
        Some((branch, file)) => fetch_raw_file(ctx, &encoded, &branch, &file).await.into(),
        None => {
            debug!("GitLab project {} exposes no README", project_path);
            Fetch::Absent
        }
    };

    (Fetch::Found(metadata), readme)
}

fn with_token(ctx: &SourceContext<'_>, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match &ctx.config.gitlab_token {
        Some(token) => request.header("PRIVATE-TOKEN", token),
        None => request,
    }
}

async fn fetch_metadata(ctx: &SourceContext<'_>, encoded: &str) -> Result<Value, EnrichError> {
    let url = format!(
        "{}/projects/{}",
        ctx.config.gitlab_api_base.trim_end_matches('/'),
        encoded
    );
    send_json(with_token(ctx, ctx.client.get(&url)), &url).await
}

async fn fetch_raw_file(
    ctx: &SourceContext<'_>,
    encoded: &str,
    branch: &str,
    file: &str,
) -> Result<Option<String>, EnrichError> {
    let url = format!(
        "{}/projects/{}/repository/files/{}/raw",
        ctx.config.gitlab_api_base.trim_end_matches('/'),
        encoded,
        urlencoding::encode(file)
    );
    let request = with_token(ctx, ctx.client.get(&url).query(&[("ref", branch)]));
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(EnrichError::Status {
            url,
            status: status.as_u16(),
        });
    }
    let text = response.text().await?;
    Ok((!text.trim().is_empty()).then_some(text))
}

/// `(branch, file)` from a readme URL such as
/// `https://gitlab.com/group/project/-/blob/main/README.md`
pub fn readme_location(readme_url: &str) -> Option<(String, String)> {
    let mut parts = readme_url.trim_end_matches('/').rsplit('/');
    let file = parts.next().filter(|f| !f.is_empty())?;
    let branch = parts.next().filter(|b| !b.is_empty())?;
    Some((branch.to_string(), file.to_string()))
}

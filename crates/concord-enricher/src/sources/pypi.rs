//! PyPI packages

use super::{send_json, SourceContext};
use concord_domain::Fetch;
use serde_json::{Map, Value};

/// Package metadata for `package`
pub async fn fetch(ctx: &SourceContext<'_>, package: &str) -> Fetch<Value> {
    let url = format!(
        "{}/{}/json",
        ctx.config.pypi_api_base.trim_end_matches('/'),
        package
    );
    match send_json(ctx.client.get(&url), &url).await {
        Ok(body) => Fetch::Found(flatten(body)),
        Err(e) => Fetch::Failed(e.to_string()),
    }
}

/// The package `info` object without null fields, plus `releases` as the
/// list of release version strings
pub fn flatten(body: Value) -> Value {
    let Value::Object(mut body) = body else {
        return Value::Object(Map::new());
    };

    let mut info = match body.remove("info") {
        Some(Value::Object(info)) => info,
        _ => Map::new(),
    };
    info.retain(|_, value| !value.is_null());

    let releases: Vec<Value> = match body.remove("releases") {
        Some(Value::Object(releases)) => releases.into_iter().map(|(v, _)| Value::String(v)).collect(),
        _ => Vec::new(),
    };
    info.insert("releases".to_string(), Value::Array(releases));

    Value::Object(info)
}
